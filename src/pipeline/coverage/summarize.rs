use std::collections::BTreeSet;

use serde_json::Value;

use super::prompts::summarize_view_prompt;
use crate::models::{InspectionImage, SceneSummary};
use crate::vision::response::{extract_json, string_array, truncate_chars};
use crate::vision::VisionModel;

/// Areas a guided shooting position usually captures.
pub fn hint_areas(hint: &str) -> &'static [&'static str] {
    match hint {
        "center-from-door" => &["wall-far", "floor", "door"],
        "center-opposite-wall" => &["wall-near", "door", "floor"],
        "corner-left-near" => &["wall-left", "wall-near", "corner-left-near"],
        "corner-right-near" => &["wall-right", "wall-near", "corner-right-near"],
        "corner-left-far" => &["wall-left", "wall-far", "corner-left-far"],
        "corner-right-far" => &["wall-right", "wall-far", "corner-right-far"],
        "ceiling" => &["ceiling"],
        "floor" => &["floor"],
        _ => &[],
    }
}

/// Summary derived only from the orientation hint.
pub fn hint_summary(image: &InspectionImage, quality_notes: String) -> SceneSummary {
    SceneSummary {
        image_id: image.id.clone(),
        visible_surfaces: BTreeSet::new(),
        fixtures: BTreeSet::new(),
        coverage_areas: hint_areas(image.hint().unwrap_or_default())
            .iter()
            .map(|s| s.to_string())
            .collect(),
        quality_notes,
    }
}

/// Summary used when no vision model is configured.
pub fn offline_summary(image: &InspectionImage) -> SceneSummary {
    let notes = format!(
        "Auto-generated from orientation: {}",
        image.hint().unwrap_or_default()
    );
    hint_summary(image, notes)
}

/// Parse a scene-summary reply. `None` when the reply holds no JSON object.
pub fn parse_summary(image_id: &str, reply: &str) -> Option<SceneSummary> {
    let value = extract_json(reply)?;
    if !value.is_object() {
        return None;
    }
    let set = |field: &str| -> BTreeSet<String> { string_array(&value, field).into_iter().collect() };
    Some(SceneSummary {
        image_id: image_id.to_string(),
        visible_surfaces: set("visible_surfaces"),
        fixtures: set("fixtures"),
        coverage_areas: set("coverage_areas"),
        quality_notes: value
            .get("quality_notes")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    })
}

/// Ask the model to describe one photo, falling back to the hint on any failure.
pub fn summarize_with_model(model: &dyn VisionModel, image: &InspectionImage, room: &str) -> SceneSummary {
    let prompt = summarize_view_prompt(room, image.hint());
    match model.analyze_image(&image.file_path, &prompt) {
        Ok(reply) => parse_summary(&image.id, &reply).unwrap_or_else(|| {
            tracing::warn!(image_id = %image.id, "Scene summary was not JSON, using orientation hint");
            hint_summary(image, truncate_chars(&reply, 200))
        }),
        Err(e) => {
            tracing::error!(image_id = %image.id, error = %e, "Scene summary failed, using orientation hint");
            hint_summary(image, format!("Vision model error: {}", truncate_chars(&e.to_string(), 100)))
        }
    }
}

/// Parse a next-shot reply: a JSON array of strings, else one instruction
/// per non-empty line with list markers stripped.
pub fn parse_instructions(reply: &str) -> Vec<String> {
    if let Some(Value::Array(items)) = extract_json(reply) {
        return items
            .iter()
            .map(|v| match v {
                Value::String(s) => s.trim().to_string(),
                other => other.to_string(),
            })
            .filter(|s| !s.is_empty())
            .collect();
    }
    reply
        .lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || ".-)* ".contains(c))
                .trim()
                .to_string()
        })
        .filter(|line| !line.is_empty())
        .collect()
}

/// Deterministic instructions for up to three missing areas.
pub fn basic_instructions(missing: &[String]) -> Vec<String> {
    missing
        .iter()
        .take(3)
        .map(|area| format!("Take a photo showing the {area} area"))
        .collect()
}
