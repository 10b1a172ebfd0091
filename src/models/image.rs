use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One photo as handed to a pipeline by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionImage {
    pub id: String,
    pub file_path: PathBuf,
    /// Guided position the photographer was asked to shoot from, if any.
    #[serde(default)]
    pub orientation_hint: Option<String>,
    /// Capture order within its set.
    #[serde(default)]
    pub seq: u32,
}

impl InspectionImage {
    pub fn new(id: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            file_path: file_path.into(),
            orientation_hint: None,
            seq: 0,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.orientation_hint = Some(hint.into());
        self
    }

    pub fn with_seq(mut self, seq: u32) -> Self {
        self.seq = seq;
        self
    }

    /// Non-empty, trimmed orientation hint.
    pub fn hint(&self) -> Option<&str> {
        self.orientation_hint
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
    }
}

/// All photos from one room capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureManifest {
    pub capture_id: String,
    pub room: String,
    pub images: Vec<InspectionImage>,
}

/// A move-in / move-out photo set for one room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    pub comparison_id: String,
    pub room: String,
    pub move_in: Vec<InspectionImage>,
    pub move_out: Vec<InspectionImage>,
}
