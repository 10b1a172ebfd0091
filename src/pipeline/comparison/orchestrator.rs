use std::path::PathBuf;

use super::analysis::{analyze_region, CandidateAnalysis};
use super::crop::save_candidate_crop;
use super::diff::diff_pair;
use super::followup::compose_followup;
use super::pairing::pair_images;
use super::regions::extract_regions;
use crate::config::ComparisonConfig;
use crate::models::{Candidate, ComparisonInput, ComparisonResult, DiffRegion, Followup, ImagePair};
use crate::pipeline::safety::language_policy::LanguagePolicyFilter;
use crate::pipeline::{CancelFlag, PipelineError};
use crate::vision::VisionProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonStage {
    Pair,
    /// Exposure normalization happens per pair inside `StructuralDiff`.
    Normalize,
    StructuralDiff,
    AnalyzeCandidates,
    LanguagePolicy,
    ComposeFollowups,
    Done,
}

#[derive(Debug, Clone)]
pub struct ComparisonContext {
    pub input: ComparisonInput,
    pub pairs: Vec<ImagePair>,
    pub regions: Vec<DiffRegion>,
    pub candidates: Vec<Candidate>,
    pub followups: Vec<Followup>,
}

impl ComparisonContext {
    pub fn new(input: ComparisonInput) -> Self {
        Self {
            input,
            pairs: Vec::new(),
            regions: Vec::new(),
            candidates: Vec::new(),
            followups: Vec::new(),
        }
    }
}

pub struct ComparisonPipeline<'a> {
    config: &'a ComparisonConfig,
    policy: &'a LanguagePolicyFilter,
    vision: &'a VisionProvider,
    cancel: &'a CancelFlag,
}

impl<'a> ComparisonPipeline<'a> {
    pub fn new(
        config: &'a ComparisonConfig,
        policy: &'a LanguagePolicyFilter,
        vision: &'a VisionProvider,
        cancel: &'a CancelFlag,
    ) -> Self {
        Self {
            config,
            policy,
            vision,
            cancel,
        }
    }

    pub fn run(&self, input: &ComparisonInput) -> Result<ComparisonResult, PipelineError> {
        if input.move_in.is_empty() && input.move_out.is_empty() {
            return Err(PipelineError::InvalidInput("comparison has no images".into()));
        }
        let _span = tracing::info_span!(
            "comparison",
            comparison_id = %input.comparison_id,
            room = %input.room,
            move_in = input.move_in.len(),
            move_out = input.move_out.len(),
        )
        .entered();
        let start = std::time::Instant::now();

        let mut stage = ComparisonStage::Pair;
        let mut ctx = ComparisonContext::new(input.clone());
        while stage != ComparisonStage::Done {
            self.cancel.check()?;
            (stage, ctx) = self.advance(stage, ctx)?;
        }

        tracing::info!(
            pairs = ctx.pairs.len(),
            regions = ctx.regions.len(),
            candidates = ctx.candidates.len(),
            elapsed_ms = %start.elapsed().as_millis(),
            "Comparison complete"
        );
        Ok(ComparisonResult {
            comparison_id: ctx.input.comparison_id,
            pairs: ctx.pairs,
            regions: ctx.regions,
            candidates: ctx.candidates,
            followups: ctx.followups,
        })
    }

    pub fn advance(
        &self,
        stage: ComparisonStage,
        mut ctx: ComparisonContext,
    ) -> Result<(ComparisonStage, ComparisonContext), PipelineError> {
        let next = match stage {
            ComparisonStage::Pair => {
                ctx.pairs = pair_images(&ctx.input.move_in, &ctx.input.move_out);
                tracing::debug!(pairs = ctx.pairs.len(), "Images paired");
                ComparisonStage::Normalize
            }
            ComparisonStage::Normalize => ComparisonStage::StructuralDiff,
            ComparisonStage::StructuralDiff => {
                ctx.regions = self.diff_regions(&ctx.pairs)?;
                ComparisonStage::AnalyzeCandidates
            }
            ComparisonStage::AnalyzeCandidates => {
                ctx.candidates = self.analyze(&ctx)?;
                ComparisonStage::LanguagePolicy
            }
            ComparisonStage::LanguagePolicy => {
                for candidate in &mut ctx.candidates {
                    candidate.analysis = self.policy.apply(&candidate.analysis);
                }
                ComparisonStage::ComposeFollowups
            }
            ComparisonStage::ComposeFollowups => {
                ctx.followups = self.followups(&ctx)?;
                ComparisonStage::Done
            }
            ComparisonStage::Done => ComparisonStage::Done,
        };
        Ok((next, ctx))
    }

    /// Regions of every pair, largest first, capped before any model call.
    fn diff_regions(&self, pairs: &[ImagePair]) -> Result<Vec<DiffRegion>, PipelineError> {
        let mut regions = Vec::new();
        for pair in pairs {
            self.cancel.check()?;
            let diff = match diff_pair(pair) {
                Ok(diff) => diff,
                Err(e) => {
                    tracing::error!(
                        move_in = %pair.move_in_id,
                        move_out = %pair.move_out_id,
                        error = %e,
                        "Structural diff failed, skipping pair"
                    );
                    continue;
                }
            };
            let found = extract_regions(
                &diff.diff_map,
                self.config.structural_diff_threshold,
                self.config.min_region_area,
            );
            tracing::debug!(
                move_in = %pair.move_in_id,
                move_out = %pair.move_out_id,
                ssim = diff.score,
                regions = found.len(),
                "Pair diffed"
            );
            regions.extend(found.into_iter().map(|raw| DiffRegion {
                bbox: raw.bbox,
                area: raw.area,
                ssim_delta: raw.ssim_delta,
                pair_orientation: pair.orientation.clone(),
                move_in_id: pair.move_in_id.clone(),
                move_out_id: pair.move_out_id.clone(),
                move_in_path: pair.move_in_path.clone(),
                move_out_path: pair.move_out_path.clone(),
                ssim_score: diff.score,
            }));
        }

        regions.sort_by(|a, b| b.area.total_cmp(&a.area));
        if regions.len() > self.config.max_candidates_per_room {
            tracing::info!(
                found = regions.len(),
                kept = self.config.max_candidates_per_room,
                "Capping diff regions"
            );
            regions.truncate(self.config.max_candidates_per_room);
        }
        Ok(regions)
    }

    fn analyze(&self, ctx: &ComparisonContext) -> Result<Vec<Candidate>, PipelineError> {
        let model = self.vision.model();
        if model.is_none() {
            tracing::warn!("No vision model configured, scoring regions by dissimilarity only");
        }

        let mut candidates = Vec::new();
        for (index, region) in ctx.regions.iter().enumerate() {
            let crop = self.crop(region, &ctx.input.comparison_id, index);
            let result = match model {
                Some(model) => {
                    self.cancel.check()?;
                    analyze_region(model, region, crop.as_deref(), &ctx.input.room)
                }
                None => CandidateAnalysis::offline(region),
            };

            if result.confidence < self.config.min_candidate_confidence {
                tracing::debug!(
                    region = index,
                    confidence = result.confidence,
                    min = self.config.min_candidate_confidence,
                    "Region below confidence threshold"
                );
                continue;
            }
            candidates.push(Candidate {
                region: region.bbox,
                confidence: result.confidence,
                reason_codes: result.reason_codes,
                analysis: result.analysis,
                needs_closeup: result.needs_closeup,
                crop_path: crop,
                move_in_id: region.move_in_id.clone(),
                move_out_id: region.move_out_id.clone(),
            });
        }
        Ok(candidates)
    }

    fn crop(&self, region: &DiffRegion, comparison_id: &str, index: usize) -> Option<PathBuf> {
        match save_candidate_crop(region, &self.config.crop_dir, comparison_id, index) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(region = index, error = %e, "Candidate crop failed");
                None
            }
        }
    }

    fn followups(&self, ctx: &ComparisonContext) -> Result<Vec<Followup>, PipelineError> {
        let model = self.vision.model();
        let mut followups = Vec::with_capacity(ctx.candidates.len());
        for (index, candidate) in ctx.candidates.iter().enumerate() {
            if model.is_some() {
                self.cancel.check()?;
            }
            followups.push(compose_followup(model, self.policy, &ctx.input.room, index, candidate));
        }
        Ok(followups)
    }
}
