use regex::{NoExpand, Regex, RegexBuilder};

use super::PolicyError;
use crate::config::LanguagePolicyConfig;

/// One forbidden phrase, matched literally and case-insensitively.
struct PolicyRule {
    term: String,
    pattern: Regex,
}

/// Rewrites fault-implying phrases to a neutral replacement.
///
/// Terms are applied one after another, in configured order, over the whole
/// text. Matching is plain substring matching: no word boundaries and no
/// sentence awareness. The replacement must not itself contain a forbidden
/// term; with that contract the rewrite is idempotent.
pub struct LanguagePolicyFilter {
    rules: Vec<PolicyRule>,
    replacement: String,
    hedging: Vec<String>,
}

impl LanguagePolicyFilter {
    pub fn new(config: &LanguagePolicyConfig) -> Result<Self, PolicyError> {
        let mut rules = Vec::with_capacity(config.forbidden.len());
        for term in &config.forbidden {
            if term.trim().is_empty() {
                tracing::warn!("Skipping empty forbidden term in language policy");
                continue;
            }
            let pattern = RegexBuilder::new(&regex::escape(term))
                .case_insensitive(true)
                .build()
                .map_err(|source| PolicyError::InvalidTerm {
                    term: term.clone(),
                    source,
                })?;
            rules.push(PolicyRule {
                term: term.clone(),
                pattern,
            });
        }

        Ok(Self {
            rules,
            replacement: config.replacement.clone(),
            hedging: config
                .required_hedging
                .iter()
                .map(|h| h.to_lowercase())
                .collect(),
        })
    }

    /// Rewrite every forbidden phrase in `text`.
    pub fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        for rule in &self.rules {
            if rule.pattern.is_match(&out) {
                tracing::debug!(term = %rule.term, "Language policy rewrite");
                out = rule
                    .pattern
                    .replace_all(&out, NoExpand(&self.replacement))
                    .into_owned();
            }
        }
        out
    }

    pub fn contains_forbidden(&self, text: &str) -> bool {
        self.rules.iter().any(|r| r.pattern.is_match(text))
    }

    /// Whether `text` carries at least one hedging phrase.
    pub fn is_hedged(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.hedging.iter().any(|h| lower.contains(h.as_str()))
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }
}
