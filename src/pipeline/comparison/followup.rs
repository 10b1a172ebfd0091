use super::prompts::compose_followup_prompt;
use crate::models::{Candidate, Followup};
use crate::pipeline::safety::language_policy::LanguagePolicyFilter;
use crate::vision::VisionModel;

/// Deterministic message used without a model or when the model fails.
pub fn default_followup(analysis: &str) -> String {
    let excerpt: String = analysis.chars().take(150).collect();
    format!(
        "A candidate difference was identified in this area. The analysis indicates: {excerpt}. \
         Could you please confirm or provide additional context about this area?"
    )
}

/// Compose the tenant message for `candidates[index]`. The result always
/// passes through the language policy.
pub fn compose_followup(
    model: Option<&dyn VisionModel>,
    policy: &LanguagePolicyFilter,
    room: &str,
    index: usize,
    candidate: &Candidate,
) -> Followup {
    let raw = model
        .and_then(|m| match m.chat(&compose_followup_prompt(room, candidate)) {
            Ok(reply) if !reply.trim().is_empty() => Some(reply.trim().to_string()),
            Ok(_) => {
                tracing::warn!(candidate = index, "Empty follow-up reply, using default");
                None
            }
            Err(e) => {
                tracing::warn!(candidate = index, error = %e, "Follow-up composition failed, using default");
                None
            }
        })
        .unwrap_or_else(|| default_followup(&candidate.analysis));

    let message = policy.apply(&raw);
    if !policy.is_hedged(&message) {
        tracing::debug!(candidate = index, "Follow-up carries no hedging phrase");
    }

    Followup {
        candidate_index: index,
        message,
        needs_closeup: candidate.needs_closeup,
    }
}
