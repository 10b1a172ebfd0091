use super::aggregator::aggregate;
use super::prompts::next_shots_prompt;
use super::summarize::{basic_instructions, offline_summary, parse_instructions, summarize_with_model};
use crate::config::CoverageConfig;
use crate::models::{CoverageReport, CoverageResult, InspectionImage, SceneSummary};
use crate::pipeline::{CancelFlag, PipelineError};
use crate::vision::VisionProvider;

/// Used only if both the model and the missing-area list come up empty.
const GENERIC_INSTRUCTION: &str =
    "Take additional photos from the remaining guided positions so every wall, the floor and the ceiling are visible";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageStage {
    Summarize,
    Aggregate,
    Decide,
    Complete,
    GenerateInstructions,
    Done,
}

#[derive(Debug, Clone, Default)]
pub struct CoverageContext {
    pub room: String,
    pub images: Vec<InspectionImage>,
    pub summaries: Vec<SceneSummary>,
    pub coverage: Option<CoverageResult>,
    pub complete: bool,
    pub instructions: Vec<String>,
}

impl CoverageContext {
    pub fn new(room: &str, images: Vec<InspectionImage>) -> Self {
        Self {
            room: room.to_string(),
            images,
            ..Self::default()
        }
    }

    fn coverage_pct(&self) -> f64 {
        self.coverage.as_ref().map_or(0.0, |c| c.coverage_pct)
    }
}

pub fn meets_minimum(ctx: &CoverageContext, min_coverage_pct: f64) -> bool {
    ctx.coverage_pct() >= min_coverage_pct
}

pub struct CoverageReviewPipeline<'a> {
    config: &'a CoverageConfig,
    vision: &'a VisionProvider,
    cancel: &'a CancelFlag,
}

impl<'a> CoverageReviewPipeline<'a> {
    pub fn new(config: &'a CoverageConfig, vision: &'a VisionProvider, cancel: &'a CancelFlag) -> Self {
        Self {
            config,
            vision,
            cancel,
        }
    }

    pub fn run(&self, room: &str, images: &[InspectionImage]) -> Result<CoverageReport, PipelineError> {
        if images.is_empty() {
            return Err(PipelineError::InvalidInput("coverage review needs at least one image".into()));
        }
        let _span = tracing::info_span!("coverage_review", room = %room, images = images.len()).entered();
        let start = std::time::Instant::now();

        let mut stage = CoverageStage::Summarize;
        let mut ctx = CoverageContext::new(room, images.to_vec());
        while stage != CoverageStage::Done {
            self.cancel.check()?;
            (stage, ctx) = self.advance(stage, ctx)?;
        }

        let coverage = ctx.coverage.unwrap_or_else(|| aggregate(&ctx.summaries, &ctx.room));
        tracing::info!(
            coverage_pct = coverage.coverage_pct,
            complete = ctx.complete,
            missing = coverage.missing.len(),
            elapsed_ms = %start.elapsed().as_millis(),
            "Coverage review complete"
        );
        Ok(CoverageReport {
            coverage,
            complete: ctx.complete,
            instructions: ctx.instructions,
            summaries: ctx.summaries,
        })
    }

    pub fn advance(
        &self,
        stage: CoverageStage,
        mut ctx: CoverageContext,
    ) -> Result<(CoverageStage, CoverageContext), PipelineError> {
        let next = match stage {
            CoverageStage::Summarize => {
                ctx.summaries = self.summarize(&ctx)?;
                CoverageStage::Aggregate
            }
            CoverageStage::Aggregate => {
                ctx.coverage = Some(aggregate(&ctx.summaries, &ctx.room));
                CoverageStage::Decide
            }
            CoverageStage::Decide => {
                if meets_minimum(&ctx, self.config.min_coverage_pct) {
                    CoverageStage::Complete
                } else {
                    CoverageStage::GenerateInstructions
                }
            }
            CoverageStage::Complete => {
                ctx.complete = true;
                ctx.instructions.clear();
                CoverageStage::Done
            }
            CoverageStage::GenerateInstructions => {
                ctx.complete = false;
                ctx.instructions = self.instructions(&ctx)?;
                CoverageStage::Done
            }
            CoverageStage::Done => CoverageStage::Done,
        };
        Ok((next, ctx))
    }

    fn summarize(&self, ctx: &CoverageContext) -> Result<Vec<SceneSummary>, PipelineError> {
        let Some(model) = self.vision.model() else {
            tracing::warn!("No vision model configured, using orientation-based summaries");
            return Ok(ctx.images.iter().map(offline_summary).collect());
        };

        let mut summaries = Vec::with_capacity(ctx.images.len());
        for image in &ctx.images {
            self.cancel.check()?;
            summaries.push(summarize_with_model(model, image, &ctx.room));
        }
        Ok(summaries)
    }

    fn instructions(&self, ctx: &CoverageContext) -> Result<Vec<String>, PipelineError> {
        let missing = ctx.coverage.as_ref().map(|c| c.missing.as_slice()).unwrap_or_default();
        let mut basic = basic_instructions(missing);
        if basic.is_empty() {
            basic.push(GENERIC_INSTRUCTION.to_string());
        }

        let (Some(model), Some(coverage)) = (self.vision.model(), ctx.coverage.as_ref()) else {
            return Ok(basic);
        };

        self.cancel.check()?;
        match model.chat(&next_shots_prompt(&ctx.room, coverage)) {
            Ok(reply) => {
                let parsed = parse_instructions(&reply);
                if parsed.is_empty() {
                    tracing::warn!("Next-shot reply had no instructions, using basic ones");
                    Ok(basic)
                } else {
                    Ok(parsed)
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Next-shot instructions failed, using basic ones");
                Ok(basic)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::{MockOp, MockVisionModel};
    use std::sync::Arc;

    fn images(hints: &[&str]) -> Vec<InspectionImage> {
        hints
            .iter()
            .enumerate()
            .map(|(i, h)| {
                InspectionImage::new(format!("img-{i}"), format!("/tmp/walkthru-none-{i}.jpg"))
                    .with_hint(*h)
                    .with_seq(i as u32)
            })
            .collect()
    }

    fn all_positions() -> Vec<InspectionImage> {
        images(&[
            "center-from-door",
            "center-opposite-wall",
            "corner-left-near",
            "corner-right-near",
            "corner-left-far",
            "corner-right-far",
            "ceiling",
            "floor",
        ])
    }

    #[test]
    fn full_guided_set_is_complete_offline() {
        let config = CoverageConfig::default();
        let vision = VisionProvider::Unavailable;
        let cancel = CancelFlag::new();
        let report = CoverageReviewPipeline::new(&config, &vision, &cancel)
            .run("Living Room", &all_positions())
            .unwrap();
        // Living Room also wants a window, which no hint produces: 7/8.
        assert_eq!(report.coverage.coverage_pct, 87.5);
        assert!(report.complete);
        assert!(report.instructions.is_empty());
        assert_eq!(report.summaries.len(), 8);
    }

    #[test]
    fn partial_set_gets_basic_instructions_offline() {
        let config = CoverageConfig::default();
        let vision = VisionProvider::Unavailable;
        let cancel = CancelFlag::new();
        let report = CoverageReviewPipeline::new(&config, &vision, &cancel)
            .run("Garage", &images(&["ceiling"]))
            .unwrap();
        assert!(!report.complete);
        assert_eq!(report.coverage.coverage_pct, 14.3);
        assert_eq!(
            report.instructions,
            vec![
                "Take a photo showing the wall-left area",
                "Take a photo showing the wall-right area",
                "Take a photo showing the wall-far area",
            ]
        );
    }

    #[test]
    fn model_summaries_and_instructions_are_used() {
        let mock = Arc::new(
            MockVisionModel::new("")
                .with_image_reply(r#"{"coverage_areas": ["wall-left", "floor"], "visible_surfaces": [], "fixtures": [], "quality_notes": ""}"#)
                .with_chat_reply(r#"["Stand in the doorway and shoot the far wall"]"#),
        );
        let vision = VisionProvider::Available(mock.clone());
        let config = CoverageConfig::default();
        let cancel = CancelFlag::new();

        let report = CoverageReviewPipeline::new(&config, &vision, &cancel)
            .run("Garage", &images(&["ceiling"]))
            .unwrap();
        assert!(report.coverage.covered.contains("wall-left"));
        assert!(!report.coverage.covered.contains("ceiling"));
        assert_eq!(report.instructions, vec!["Stand in the doorway and shoot the far wall"]);

        let ops: Vec<MockOp> = mock.calls().iter().map(|c| c.op).collect();
        assert_eq!(ops, vec![MockOp::AnalyzeImage, MockOp::Chat]);
    }

    #[test]
    fn instruction_failure_keeps_basic_instructions() {
        let mock = MockVisionModel::new("").with_image_reply("not json").with_chat_failure();
        let vision = VisionProvider::available(mock);
        let config = CoverageConfig::default();
        let cancel = CancelFlag::new();

        let report = CoverageReviewPipeline::new(&config, &vision, &cancel)
            .run("Garage", &images(&["floor"]))
            .unwrap();
        assert!(!report.complete);
        assert!(!report.instructions.is_empty());
        assert!(report.instructions[0].starts_with("Take a photo showing"));
    }

    #[test]
    fn blank_instruction_reply_keeps_basic_instructions() {
        let mock = MockVisionModel::new("").with_image_failure().with_chat_reply("   ");
        let vision = VisionProvider::available(mock);
        let config = CoverageConfig::default();
        let cancel = CancelFlag::new();

        let report = CoverageReviewPipeline::new(&config, &vision, &cancel)
            .run("Garage", &images(&["floor"]))
            .unwrap();
        assert!(!report.instructions.is_empty());
    }

    #[test]
    fn complete_with_zero_minimum() {
        let config = CoverageConfig {
            min_coverage_pct: 0.0,
            ..CoverageConfig::default()
        };
        let vision = VisionProvider::Unavailable;
        let cancel = CancelFlag::new();
        let report = CoverageReviewPipeline::new(&config, &vision, &cancel)
            .run("Garage", &images(&["sideways"]))
            .unwrap();
        assert!(report.complete);
        assert_eq!(report.coverage.coverage_pct, 0.0);
    }

    #[test]
    fn empty_images_rejected() {
        let config = CoverageConfig::default();
        let vision = VisionProvider::Unavailable;
        let cancel = CancelFlag::new();
        let err = CoverageReviewPipeline::new(&config, &vision, &cancel)
            .run("Garage", &[])
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[test]
    fn cancellation_stops_run() {
        let config = CoverageConfig::default();
        let vision = VisionProvider::Unavailable;
        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = CoverageReviewPipeline::new(&config, &vision, &cancel)
            .run("Garage", &images(&["floor"]))
            .unwrap_err();
        assert!(matches!(err, PipelineError::Cancelled));
    }
}
