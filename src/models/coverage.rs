use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// What one photo shows. Produced once per image, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SceneSummary {
    pub image_id: String,
    #[serde(default)]
    pub visible_surfaces: BTreeSet<String>,
    #[serde(default)]
    pub fixtures: BTreeSet<String>,
    #[serde(default)]
    pub coverage_areas: BTreeSet<String>,
    #[serde(default)]
    pub quality_notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageResult {
    /// 0-100, one decimal place.
    pub coverage_pct: f64,
    pub covered: BTreeSet<String>,
    /// In checklist order.
    pub missing: Vec<String>,
    pub checklist: Vec<String>,
}

/// Coverage review output handed to the caller for persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverageReport {
    pub coverage: CoverageResult,
    pub complete: bool,
    /// Next-shot instructions. Never empty when `complete` is false.
    pub instructions: Vec<String>,
    pub summaries: Vec<SceneSummary>,
}
