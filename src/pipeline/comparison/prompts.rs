use crate::models::{BoundingBox, Candidate, ReasonCode};

fn reason_code_list() -> String {
    ReasonCode::ALL
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn analyze_candidate_prompt(room: &str, bbox: BoundingBox) -> String {
    format!(
        r#"You are analyzing a candidate difference between move-in and move-out photos of a {room} in a rental property.

The highlighted region shows a possible area of change.

IMPORTANT LANGUAGE POLICY:
- NEVER say "damage confirmed", "damage detected", "tenant caused", "fault", or "liable"
- Use "candidate difference", "possible change", "appears to show", "may indicate"
- You are identifying areas that MAY warrant further review, not making determinations

Move-in image is on the left, move-out image is on the right.
The region of interest is at approximately ({x}, {y}) with size ({w}x{h}).

Analyze the highlighted region and provide:
1. What appears to be different between the two images in this region
2. Your confidence (0.0 to 1.0) that this represents a genuine change
3. Reason codes from: [{codes}]
4. Whether a close-up photo would help clarify

Respond as JSON:
{{
  "analysis": "description of the candidate difference",
  "confidence": 0.7,
  "reason_codes": ["scuff", "wear"],
  "needs_closeup": true
}}"#,
        x = bbox.x,
        y = bbox.y,
        w = bbox.w,
        h = bbox.h,
        codes = reason_code_list(),
    )
}

pub fn compose_followup_prompt(room: &str, candidate: &Candidate) -> String {
    let codes = candidate
        .reason_codes
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Compose a brief, neutral follow-up message for the tenant about a candidate difference found in the {room}.\n\
         \n\
         Analysis: {analysis}\n\
         Confidence: {confidence}\n\
         Reason codes: {codes}\n\
         \n\
         IMPORTANT: Use cautious, neutral language. Never imply fault or confirmed damage.\n\
         The message should:\n\
         1. Describe what was observed using \"candidate difference\" / \"appears to\" / \"may indicate\"\n\
         2. Ask if the tenant can confirm or provide context\n\
         3. If helpful, request a close-up photo of the area\n\
         \n\
         Keep it under 3 sentences. Be professional and fair.",
        analysis = candidate.analysis,
        confidence = candidate.confidence,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analyze_prompt_has_region_and_codes() {
        let prompt = analyze_candidate_prompt("Kitchen", BoundingBox { x: 12, y: 34, w: 56, h: 78 });
        assert!(prompt.contains("photos of a Kitchen"));
        assert!(prompt.contains("(12, 34) with size (56x78)"));
        assert!(prompt.contains("[scuff, stain, hole, crack, discoloration, missing_item, added_item, wear, other]"));
        assert!(prompt.contains("\"needs_closeup\": true"));
    }

    #[test]
    fn followup_prompt_lists_codes() {
        let candidate = Candidate {
            region: BoundingBox { x: 0, y: 0, w: 1, h: 1 },
            confidence: 0.7,
            reason_codes: vec![ReasonCode::Scuff, ReasonCode::Wear],
            analysis: "Marks appear near the baseboard".into(),
            needs_closeup: true,
            crop_path: None,
            move_in_id: "a".into(),
            move_out_id: "b".into(),
        };
        let prompt = compose_followup_prompt("Hallway", &candidate);
        assert!(prompt.contains("found in the Hallway."));
        assert!(prompt.contains("Confidence: 0.7\n"));
        assert!(prompt.contains("Reason codes: scuff, wear\n"));
    }
}
