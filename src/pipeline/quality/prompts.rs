use crate::config::QualityGateConfig;
use crate::models::ImageMetrics;

/// Prompt for a second opinion on a borderline photo.
pub fn borderline_judge_prompt(metrics: &ImageMetrics, config: &QualityGateConfig) -> String {
    format!(
        "You are a quality inspector for property walkthrough photos.\n\
         \n\
         This image has borderline quality metrics:\n\
         - Blur score: {:.1} (threshold: {:.1})\n\
         - Darkness score: {:.1} (threshold: {:.1})\n\
         - Sharpness score: {:.1} (threshold: {:.1})\n\
         \n\
         Examine the image and decide whether it is usable for documenting property condition.\n\
         Can you clearly see the surfaces, fixtures, and overall condition of the area?\n\
         \n\
         Respond with exactly one word: ACCEPT or REJECT",
        metrics.blur_score,
        config.blur_threshold,
        metrics.darkness_score,
        config.darkness_threshold,
        metrics.sharpness_score,
        config.sharpness_threshold,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QualityStatus;

    #[test]
    fn prompt_embeds_scores_and_thresholds() {
        let metrics = ImageMetrics {
            image_id: "a".into(),
            file_path: "a.jpg".into(),
            blur_score: 91.234,
            darkness_score: 55.0,
            sharpness_score: 60.0,
            status: QualityStatus::Borderline,
            model_verdict: None,
        };
        let prompt = borderline_judge_prompt(&metrics, &QualityGateConfig::default());
        assert!(prompt.contains("Blur score: 91.2 (threshold: 100.0)"));
        assert!(prompt.contains("Darkness score: 55.0 (threshold: 40.0)"));
        assert!(prompt.ends_with("ACCEPT or REJECT"));
    }
}
