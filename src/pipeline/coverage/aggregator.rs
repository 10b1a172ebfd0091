use std::collections::BTreeSet;

use crate::models::{CoverageResult, SceneSummary};

const BASE_WALLS: [&str; 7] = [
    "wall-left",
    "wall-right",
    "wall-far",
    "wall-near",
    "floor",
    "ceiling",
    "door",
];

/// Room checklists, searched in this order for substring matches.
static ROOM_CHECKLISTS: &[(&str, &[&str])] = &[
    ("default", &BASE_WALLS),
    (
        "Living Room",
        &["wall-left", "wall-right", "wall-far", "wall-near", "floor", "ceiling", "door", "window"],
    ),
    (
        "Kitchen",
        &[
            "wall-left", "wall-right", "wall-far", "wall-near", "floor", "ceiling", "door",
            "countertop", "appliances",
        ],
    ),
    (
        "Bedroom",
        &[
            "wall-left", "wall-right", "wall-far", "wall-near", "floor", "ceiling", "door",
            "window", "closet",
        ],
    ),
    (
        "Bathroom",
        &[
            "wall-left", "wall-right", "wall-far", "wall-near", "floor", "ceiling", "door",
            "fixtures", "mirror",
        ],
    ),
    ("Hallway", &["wall-left", "wall-right", "floor", "ceiling", "door"]),
];

/// Free-text keywords that imply a checklist item.
const KEYWORD_RULES: &[(&[&str], &str)] = &[
    (&["counter"], "countertop"),
    (&["appliance", "stove", "fridge"], "appliances"),
    (&["closet"], "closet"),
    (&["mirror"], "mirror"),
    (&["fixture", "sink", "toilet", "tub"], "fixtures"),
];

/// Resolve a room name to its checklist: exact name, then the first
/// checklist key contained in the name (case-insensitive), then default.
pub fn checklist_for(room: &str) -> Vec<String> {
    let lower = room.to_lowercase();
    let items = ROOM_CHECKLISTS
        .iter()
        .find(|(key, _)| *key == room)
        .or_else(|| {
            ROOM_CHECKLISTS
                .iter()
                .find(|(key, _)| lower.contains(&key.to_lowercase()))
        })
        .map_or(ROOM_CHECKLISTS[0].1, |(_, items)| *items);
    items.iter().map(|s| s.to_string()).collect()
}

/// Map scene summaries onto the room checklist.
///
/// Pure: the same summaries and room always produce the same result.
pub fn aggregate(summaries: &[SceneSummary], room: &str) -> CoverageResult {
    let checklist = checklist_for(room);
    let mut matched: BTreeSet<String> = BTreeSet::new();

    for summary in summaries {
        for area in &summary.coverage_areas {
            let area = area.trim().to_lowercase();
            if area.is_empty() {
                continue;
            }
            if let Some(item) = checklist
                .iter()
                .find(|item| area.contains(item.as_str()) || item.contains(area.as_str()))
            {
                matched.insert(item.clone());
            }
            for (keywords, item) in KEYWORD_RULES {
                if keywords.iter().any(|k| area.contains(k)) {
                    matched.insert(item.to_string());
                }
            }
        }
    }

    for summary in summaries {
        for surface in &summary.visible_surfaces {
            let surface = surface.to_lowercase();
            for item in &checklist {
                let stem = item.split('-').next().unwrap_or(item);
                if surface.contains(item.as_str()) || surface.starts_with(stem) {
                    matched.insert(item.clone());
                }
            }
        }
    }

    let covered: BTreeSet<String> = matched
        .into_iter()
        .filter(|item| checklist.contains(item))
        .collect();
    let missing: Vec<String> = checklist
        .iter()
        .filter(|item| !covered.contains(*item))
        .cloned()
        .collect();
    let coverage_pct = if checklist.is_empty() {
        100.0
    } else {
        round1(covered.len() as f64 / checklist.len() as f64 * 100.0)
    };

    CoverageResult {
        coverage_pct,
        covered,
        missing,
        checklist,
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(areas: &[&str]) -> SceneSummary {
        SceneSummary {
            image_id: "img".into(),
            coverage_areas: areas.iter().map(|s| s.to_string()).collect(),
            ..SceneSummary::default()
        }
    }

    #[test]
    fn checklist_exact_match() {
        assert_eq!(checklist_for("Kitchen").len(), 9);
        assert_eq!(checklist_for("Hallway").len(), 5);
    }

    #[test]
    fn checklist_substring_match_case_insensitive() {
        let list = checklist_for("master bedroom");
        assert!(list.contains(&"closet".to_string()));
    }

    #[test]
    fn checklist_unknown_room_uses_default() {
        assert_eq!(checklist_for("Garage"), BASE_WALLS.map(String::from).to_vec());
    }

    #[test]
    fn all_seven_areas_is_full_coverage() {
        let result = aggregate(&[summary(&BASE_WALLS)], "Garage");
        assert_eq!(result.coverage_pct, 100.0);
        assert!(result.missing.is_empty());
        assert_eq!(result.covered.len(), 7);
    }

    #[test]
    fn single_wall_is_partial_coverage() {
        let result = aggregate(&[summary(&["wall-left"])], "Garage");
        assert_eq!(result.coverage_pct, 14.3);
        assert_eq!(
            result.missing,
            vec!["wall-right", "wall-far", "wall-near", "floor", "ceiling", "door"]
        );
    }

    #[test]
    fn aggregation_is_idempotent() {
        let summaries = vec![
            summary(&["Wall-Left ", "floor", "kitchen sink"]),
            SceneSummary {
                image_id: "b".into(),
                visible_surfaces: ["ceiling tiles".to_string()].into(),
                ..SceneSummary::default()
            },
        ];
        let first = aggregate(&summaries, "Bathroom");
        for _ in 0..5 {
            assert_eq!(aggregate(&summaries, "Bathroom"), first);
        }
    }

    #[test]
    fn keyword_rules_recover_fixtures() {
        let result = aggregate(&[summary(&["bathtub", "vanity mirror"])], "Bathroom");
        assert!(result.covered.contains("fixtures"));
        assert!(result.covered.contains("mirror"));
    }

    #[test]
    fn items_outside_checklist_are_dropped() {
        let result = aggregate(&[summary(&["stove", "closet"])], "Hallway");
        assert!(result.covered.is_empty());
        assert_eq!(result.coverage_pct, 0.0);
    }

    #[test]
    fn visible_surface_stem_matches() {
        let summaries = vec![SceneSummary {
            image_id: "a".into(),
            visible_surfaces: ["floor boards".to_string(), "door frame".to_string()].into(),
            ..SceneSummary::default()
        }];
        let result = aggregate(&summaries, "Hallway");
        assert!(result.covered.contains("floor"));
        assert!(result.covered.contains("door"));
    }

    #[test]
    fn empty_area_strings_are_ignored() {
        let result = aggregate(&[summary(&["", "   "])], "Garage");
        assert!(result.covered.is_empty());
    }

    #[test]
    fn corner_area_does_not_cover_wall() {
        let result = aggregate(&[summary(&["corner-left-near"])], "Garage");
        assert!(result.covered.is_empty());
    }

    #[test]
    fn covered_is_sorted() {
        let result = aggregate(&[summary(&["floor", "ceiling", "door"])], "Garage");
        let covered: Vec<_> = result.covered.iter().cloned().collect();
        assert_eq!(covered, vec!["ceiling", "door", "floor"]);
    }

    #[test]
    fn no_summaries_is_zero() {
        let result = aggregate(&[], "Kitchen");
        assert_eq!(result.coverage_pct, 0.0);
        assert_eq!(result.missing.len(), 9);
    }
}
