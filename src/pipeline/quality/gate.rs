use std::sync::LazyLock;

use regex::Regex;

use super::classifier::{classify, rejection_reasons};
use super::prompts::borderline_judge_prompt;
use super::scorer::{score_image, MetricScores};
use crate::config::QualityGateConfig;
use crate::models::{
    GateStatus, ImageMetrics, ImageQualityReport, InspectionImage, ModelVerdict,
    QualityGateResult, QualityStatus,
};
use crate::pipeline::{CancelFlag, PipelineError};
use crate::vision::{VisionModel, VisionProvider};

static ACCEPT_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\baccept(?:ed)?\b").expect("static regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityStage {
    Scoring,
    Classifying,
    ModelJudge,
    Finalize,
    Done,
}

/// State threaded through one quality gate run.
#[derive(Debug, Clone, Default)]
pub struct QualityContext {
    pub images: Vec<InspectionImage>,
    pub metrics: Vec<ImageMetrics>,
    pub overall_status: Option<GateStatus>,
}

impl QualityContext {
    pub fn new(images: Vec<InspectionImage>) -> Self {
        Self {
            images,
            ..Self::default()
        }
    }
}

pub fn has_borderline(ctx: &QualityContext) -> bool {
    ctx.metrics
        .iter()
        .any(|m| m.status == QualityStatus::Borderline)
}

/// `ACCEPT` (as a word) anywhere in the reply accepts; anything else rejects.
pub fn parse_verdict(reply: &str) -> QualityStatus {
    if ACCEPT_WORD.is_match(reply) {
        QualityStatus::Accepted
    } else {
        QualityStatus::Rejected
    }
}

pub struct QualityGatePipeline<'a> {
    config: &'a QualityGateConfig,
    vision: &'a VisionProvider,
    cancel: &'a CancelFlag,
}

impl<'a> QualityGatePipeline<'a> {
    pub fn new(config: &'a QualityGateConfig, vision: &'a VisionProvider, cancel: &'a CancelFlag) -> Self {
        Self {
            config,
            vision,
            cancel,
        }
    }

    /// Run every stage and roll up the result.
    pub fn run(&self, images: &[InspectionImage]) -> Result<QualityGateResult, PipelineError> {
        if images.is_empty() {
            return Err(PipelineError::InvalidInput("quality gate needs at least one image".into()));
        }
        let _span = tracing::info_span!("quality_gate", images = images.len()).entered();
        let start = std::time::Instant::now();

        let mut stage = QualityStage::Scoring;
        let mut ctx = QualityContext::new(images.to_vec());
        while stage != QualityStage::Done {
            self.cancel.check()?;
            (stage, ctx) = self.advance(stage, ctx)?;
        }

        let result = self.into_result(ctx);
        tracing::info!(
            overall_status = %result.overall_status,
            rejected = result.rejected().count(),
            elapsed_ms = %start.elapsed().as_millis(),
            "Quality gate complete"
        );
        Ok(result)
    }

    /// Execute one stage and return the next.
    pub fn advance(
        &self,
        stage: QualityStage,
        mut ctx: QualityContext,
    ) -> Result<(QualityStage, QualityContext), PipelineError> {
        let next = match stage {
            QualityStage::Scoring => {
                ctx.metrics = ctx.images.iter().map(score_image).collect();
                QualityStage::Classifying
            }
            QualityStage::Classifying => {
                for m in &mut ctx.metrics {
                    m.status = classify(&MetricScores::from(&*m), self.config);
                }
                if has_borderline(&ctx) {
                    QualityStage::ModelJudge
                } else {
                    QualityStage::Finalize
                }
            }
            QualityStage::ModelJudge => {
                self.judge_borderline(&mut ctx.metrics)?;
                QualityStage::Finalize
            }
            QualityStage::Finalize => {
                let any_rejected = ctx
                    .metrics
                    .iter()
                    .any(|m| m.status == QualityStatus::Rejected);
                ctx.overall_status = Some(if any_rejected {
                    GateStatus::Failed
                } else {
                    GateStatus::Passed
                });
                QualityStage::Done
            }
            QualityStage::Done => QualityStage::Done,
        };
        Ok((next, ctx))
    }

    fn judge_borderline(&self, metrics: &mut [ImageMetrics]) -> Result<(), PipelineError> {
        let Some(model) = self.vision.model() else {
            tracing::warn!("No vision model configured, accepting borderline images");
            for m in metrics.iter_mut().filter(|m| m.status == QualityStatus::Borderline) {
                m.status = QualityStatus::Accepted;
                m.model_verdict = Some(ModelVerdict::AcceptedNoModel);
            }
            return Ok(());
        };

        for m in metrics.iter_mut().filter(|m| m.status == QualityStatus::Borderline) {
            self.cancel.check()?;
            let (status, verdict) = self.judge_one(model, m);
            m.status = status;
            m.model_verdict = Some(verdict);
        }
        Ok(())
    }

    fn judge_one(&self, model: &dyn VisionModel, m: &ImageMetrics) -> (QualityStatus, ModelVerdict) {
        let prompt = borderline_judge_prompt(m, self.config);
        match model.analyze_image(&m.file_path, &prompt) {
            Ok(reply) => {
                let status = parse_verdict(&reply);
                tracing::info!(image_id = %m.image_id, model = %model.name(), %status, "Borderline image judged");
                let verdict = if status == QualityStatus::Accepted {
                    ModelVerdict::Accepted
                } else {
                    ModelVerdict::Rejected
                };
                (status, verdict)
            }
            Err(e) => {
                tracing::error!(image_id = %m.image_id, error = %e, "Borderline judge failed, accepting");
                (QualityStatus::Accepted, ModelVerdict::AcceptedOnError)
            }
        }
    }

    fn into_result(&self, ctx: QualityContext) -> QualityGateResult {
        let images = ctx
            .metrics
            .into_iter()
            .map(|metrics| {
                let reasons = if metrics.status == QualityStatus::Rejected {
                    rejection_reasons(&MetricScores::from(&metrics), self.config)
                } else {
                    Vec::new()
                };
                ImageQualityReport { metrics, reasons }
            })
            .collect();

        QualityGateResult {
            overall_status: ctx.overall_status.unwrap_or(GateStatus::Failed),
            images,
        }
    }
}
