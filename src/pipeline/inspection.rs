//! Capture orchestration: quality gate, then coverage review, then a final
//! capture status. Stage results go out through an observer callback so a
//! caller can push progress to clients.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::comparison::ComparisonPipeline;
use super::coverage::CoverageReviewPipeline;
use super::quality::QualityGatePipeline;
use super::safety::LanguagePolicyFilter;
use super::{CancelFlag, PipelineError};
use crate::config::InspectionConfig;
use crate::models::{
    CaptureManifest, CaptureStatus, ComparisonInput, ComparisonResult, CoverageReport, InspectionImage,
    QualityGateResult,
};
use crate::vision::VisionProvider;

/// Intermediate result emitted at a stage boundary.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum InspectionEvent {
    #[serde(rename = "quality_update")]
    Quality(QualityGateResult),
    #[serde(rename = "coverage_update")]
    Coverage(CoverageReport),
    #[serde(rename = "comparison_update")]
    Comparison(ComparisonResult),
}

#[derive(Debug, Clone, Serialize)]
pub struct CaptureOutcome {
    pub capture_id: String,
    pub status: CaptureStatus,
    pub quality: QualityGateResult,
    /// Absent when the quality gate failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coverage: Option<CoverageReport>,
    pub completed_at: DateTime<Utc>,
}

/// True when every required guided position appears among the image hints.
pub fn required_positions_captured(images: &[InspectionImage], required: &[String]) -> bool {
    let captured: BTreeSet<&str> = images.iter().filter_map(InspectionImage::hint).collect();
    required.iter().all(|pos| captured.contains(pos.as_str()))
}

/// Quality gate, then (if it passed) coverage review.
///
/// Status: `failed` if the gate failed; `passed` if coverage is complete or
/// every required position was shot; `needs_coverage` otherwise.
pub fn run_capture_pipeline(
    config: &InspectionConfig,
    vision: &VisionProvider,
    cancel: &CancelFlag,
    manifest: &CaptureManifest,
    observer: &mut dyn FnMut(InspectionEvent),
) -> Result<CaptureOutcome, PipelineError> {
    let _span = tracing::info_span!(
        "capture",
        capture_id = %manifest.capture_id,
        room = %manifest.room,
        provider = vision.model().map(|m| m.name()).unwrap_or("none"),
    )
    .entered();

    let quality = QualityGatePipeline::new(&config.quality_gate, vision, cancel).run(&manifest.images)?;
    observer(InspectionEvent::Quality(quality.clone()));

    if !quality.passed() {
        tracing::info!(rejected = quality.rejected().count(), "Capture failed quality gate");
        return Ok(CaptureOutcome {
            capture_id: manifest.capture_id.clone(),
            status: CaptureStatus::Failed,
            quality,
            coverage: None,
            completed_at: Utc::now(),
        });
    }

    let coverage =
        CoverageReviewPipeline::new(&config.coverage, vision, cancel).run(&manifest.room, &manifest.images)?;
    observer(InspectionEvent::Coverage(coverage.clone()));

    let all_required = required_positions_captured(&manifest.images, &config.coverage.required_positions);
    let status = if coverage.complete || all_required {
        CaptureStatus::Passed
    } else {
        CaptureStatus::NeedsCoverage
    };
    tracing::info!(
        status = %status,
        coverage_pct = coverage.coverage.coverage_pct,
        all_required,
        "Capture reviewed"
    );

    Ok(CaptureOutcome {
        capture_id: manifest.capture_id.clone(),
        status,
        quality,
        coverage: Some(coverage),
        completed_at: Utc::now(),
    })
}

pub fn run_comparison_pipeline(
    config: &InspectionConfig,
    vision: &VisionProvider,
    cancel: &CancelFlag,
    input: &ComparisonInput,
    observer: &mut dyn FnMut(InspectionEvent),
) -> Result<ComparisonResult, PipelineError> {
    let policy = LanguagePolicyFilter::new(&config.language_policy)?;
    let result = ComparisonPipeline::new(&config.comparison, &policy, vision, cancel).run(input)?;
    observer(InspectionEvent::Comparison(result.clone()));
    Ok(result)
}

// ═══════════════════════════════════════════════════════════
// Async wrappers
// ═══════════════════════════════════════════════════════════

/// Runs [`run_capture_pipeline`] on the blocking thread pool.
pub async fn run_capture_pipeline_async<F>(
    config: InspectionConfig,
    vision: VisionProvider,
    cancel: CancelFlag,
    manifest: CaptureManifest,
    mut observer: F,
) -> Result<CaptureOutcome, PipelineError>
where
    F: FnMut(InspectionEvent) + Send + 'static,
{
    tokio::task::spawn_blocking(move || run_capture_pipeline(&config, &vision, &cancel, &manifest, &mut observer))
        .await
        .map_err(|e| PipelineError::Join(e.to_string()))?
}

/// Runs [`run_comparison_pipeline`] on the blocking thread pool.
pub async fn run_comparison_pipeline_async<F>(
    config: InspectionConfig,
    vision: VisionProvider,
    cancel: CancelFlag,
    input: ComparisonInput,
    mut observer: F,
) -> Result<ComparisonResult, PipelineError>
where
    F: FnMut(InspectionEvent) + Send + 'static,
{
    tokio::task::spawn_blocking(move || run_comparison_pipeline(&config, &vision, &cancel, &input, &mut observer))
        .await
        .map_err(|e| PipelineError::Join(e.to_string()))?
}
