use crate::models::CoverageResult;

pub fn summarize_view_prompt(room: &str, orientation_hint: Option<&str>) -> String {
    format!(
        r#"You are analyzing a property walkthrough photo of a {room}.
Orientation hint: {hint}

Describe what surfaces, fixtures, and areas are visible in this image.
Be specific about:
- Which walls are visible (left, right, far, near)
- Floor and ceiling visibility
- Windows, doors, outlets visible
- Fixtures and appliances visible
- Any corners visible

Respond as a JSON object:
{{
  "visible_surfaces": ["list of surfaces/areas visible"],
  "fixtures": ["list of fixtures/appliances visible"],
  "coverage_areas": ["list from: wall-left, wall-right, wall-far, wall-near, floor, ceiling, corner-left-near, corner-right-near, corner-left-far, corner-right-far, door, window"],
  "quality_notes": "any notes about visibility/obstructions"
}}"#,
        hint = orientation_hint.unwrap_or("unknown"),
    )
}

pub fn next_shots_prompt(room: &str, coverage: &CoverageResult) -> String {
    let covered = coverage
        .covered
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Based on the coverage analysis of a {room}:\n\
         \n\
         Currently covered areas: {covered}\n\
         Missing areas: {missing}\n\
         Coverage: {pct}%\n\
         \n\
         Provide 1-3 specific instructions for additional photos to improve coverage.\n\
         Each instruction should describe:\n\
         1. Where to stand\n\
         2. What direction to point the camera\n\
         3. What the photo should capture\n\
         \n\
         Be concise and actionable. Respond as a JSON array of instruction strings.",
        missing = coverage.missing.join(", "),
        pct = coverage.coverage_pct,
    )
}
