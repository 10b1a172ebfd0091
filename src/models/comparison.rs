use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::ReasonCode;

/// Orientation recorded on pairs that matched by capture order only.
pub const SEQ_MATCH: &str = "seq_match";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImagePair {
    pub move_in_id: String,
    pub move_in_path: PathBuf,
    pub move_out_id: String,
    pub move_out_path: PathBuf,
    /// Shared orientation hint, or `seq_match`.
    pub orientation: String,
}

/// Pixel bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffRegion {
    #[serde(flatten)]
    pub bbox: BoundingBox,
    pub area: f64,
    /// Mean dissimilarity inside the box / 255.
    pub ssim_delta: f64,
    pub pair_orientation: String,
    pub move_in_id: String,
    pub move_out_id: String,
    pub move_in_path: PathBuf,
    pub move_out_path: PathBuf,
    /// Whole-pair structural similarity.
    pub ssim_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub region: BoundingBox,
    pub confidence: f64,
    pub reason_codes: Vec<ReasonCode>,
    pub analysis: String,
    pub needs_closeup: bool,
    pub crop_path: Option<PathBuf>,
    pub move_in_id: String,
    pub move_out_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Followup {
    pub candidate_index: usize,
    pub message: String,
    pub needs_closeup: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub comparison_id: String,
    pub pairs: Vec<ImagePair>,
    pub regions: Vec<DiffRegion>,
    pub candidates: Vec<Candidate>,
    /// `followups[i]` belongs to `candidates[i]`.
    pub followups: Vec<Followup>,
}
