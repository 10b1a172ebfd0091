use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::enums::{GateStatus, ModelVerdict, QualityMetric, QualityStatus};

/// Scores and gate status for one photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetrics {
    pub image_id: String,
    pub file_path: PathBuf,
    /// Laplacian variance, higher = sharper.
    pub blur_score: f64,
    /// Mean luminance 0-255.
    pub darkness_score: f64,
    /// Mean Sobel gradient magnitude.
    pub sharpness_score: f64,
    pub status: QualityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_verdict: Option<ModelVerdict>,
}

impl ImageMetrics {
    pub fn score(&self, metric: QualityMetric) -> f64 {
        match metric {
            QualityMetric::Blur => self.blur_score,
            QualityMetric::Darkness => self.darkness_score,
            QualityMetric::Sharpness => self.sharpness_score,
        }
    }
}

/// Why a photo was rejected, with a tip the photographer can act on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectionReason {
    pub metric: QualityMetric,
    pub score: f64,
    pub threshold: f64,
    pub message: String,
    pub tip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageQualityReport {
    #[serde(flatten)]
    pub metrics: ImageMetrics,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<RejectionReason>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityGateResult {
    pub overall_status: GateStatus,
    pub images: Vec<ImageQualityReport>,
}

impl QualityGateResult {
    pub fn passed(&self) -> bool {
        self.overall_status == GateStatus::Passed
    }

    pub fn rejected(&self) -> impl Iterator<Item = &ImageQualityReport> {
        self.images
            .iter()
            .filter(|r| r.metrics.status == QualityStatus::Rejected)
    }
}
