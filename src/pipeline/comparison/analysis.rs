use std::path::Path;

use serde_json::Value;

use super::prompts::analyze_candidate_prompt;
use crate::models::{DiffRegion, ReasonCode};
use crate::vision::response::{extract_json, truncate_chars};
use crate::vision::VisionModel;

const OFFLINE_ANALYSIS: &str = "Possible change detected by structural comparison";
const UNAVAILABLE_ANALYSIS: &str = "Automated analysis unavailable. Manual review recommended";
/// Ceiling on confidence derived from pixel dissimilarity alone.
const OFFLINE_CONFIDENCE_CAP: f64 = 0.9;

/// What the model (or the fallback) said about one region.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateAnalysis {
    pub analysis: String,
    pub confidence: f64,
    pub reason_codes: Vec<ReasonCode>,
    pub needs_closeup: bool,
}

impl CandidateAnalysis {
    /// No model configured: confidence scales with the local dissimilarity.
    pub fn offline(region: &DiffRegion) -> Self {
        Self {
            analysis: OFFLINE_ANALYSIS.to_string(),
            confidence: (region.ssim_delta * 2.0).min(OFFLINE_CONFIDENCE_CAP),
            reason_codes: vec![ReasonCode::Other],
            needs_closeup: true,
        }
    }

    /// The model call failed.
    pub fn unavailable(region: &DiffRegion) -> Self {
        Self {
            analysis: UNAVAILABLE_ANALYSIS.to_string(),
            confidence: region.ssim_delta,
            reason_codes: vec![ReasonCode::Other],
            needs_closeup: true,
        }
    }

    /// Read a model reply. Anything missing or malformed gets the
    /// conservative value: dissimilarity as confidence, `other`, close-up.
    pub fn parse(reply: &str, region: &DiffRegion) -> Self {
        let fallback_text = || truncate_chars(reply.trim(), 200);
        let Some(Value::Object(obj)) = extract_json(reply) else {
            tracing::warn!("Candidate analysis was not a JSON object");
            return Self {
                analysis: fallback_text(),
                confidence: region.ssim_delta,
                reason_codes: vec![ReasonCode::Other],
                needs_closeup: true,
            };
        };

        let analysis = obj
            .get("analysis")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(fallback_text);

        let confidence = obj
            .get("confidence")
            .and_then(read_number)
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0))
            .unwrap_or(region.ssim_delta);

        Self {
            analysis,
            confidence,
            reason_codes: read_reason_codes(obj.get("reason_codes")),
            needs_closeup: obj.get("needs_closeup").and_then(Value::as_bool).unwrap_or(true),
        }
    }
}

fn read_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Known codes in reply order, unknown ones folded into `other`, no repeats.
fn read_reason_codes(value: Option<&Value>) -> Vec<ReasonCode> {
    let raw: Vec<&str> = match value {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        Some(Value::String(s)) => vec![s.as_str()],
        _ => Vec::new(),
    };
    let mut codes = Vec::new();
    for code in raw.into_iter().map(ReasonCode::from_model) {
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    if codes.is_empty() {
        codes.push(ReasonCode::Other);
    }
    codes
}

/// Ask the model about one region. Uses the side-by-side crop when there is
/// one, otherwise sends both full photos.
pub fn analyze_region(
    model: &dyn VisionModel,
    region: &DiffRegion,
    crop: Option<&Path>,
    room: &str,
) -> CandidateAnalysis {
    let prompt = analyze_candidate_prompt(room, region.bbox);
    let reply = match crop {
        Some(path) => model.analyze_image(path, &prompt),
        None => model.analyze_images(
            &[region.move_in_path.clone(), region.move_out_path.clone()],
            &prompt,
        ),
    };
    match reply {
        Ok(text) => CandidateAnalysis::parse(&text, region),
        Err(e) => {
            tracing::error!(
                move_in = %region.move_in_id,
                move_out = %region.move_out_id,
                error = %e,
                "Candidate analysis failed"
            );
            CandidateAnalysis::unavailable(region)
        }
    }
}
