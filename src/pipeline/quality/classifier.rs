use super::scorer::MetricScores;
use crate::config::QualityGateConfig;
use crate::models::{QualityMetric, QualityStatus, RejectionReason};

const METRICS: [QualityMetric; 3] = [
    QualityMetric::Blur,
    QualityMetric::Darkness,
    QualityMetric::Sharpness,
];

pub fn threshold_for(config: &QualityGateConfig, metric: QualityMetric) -> f64 {
    match metric {
        QualityMetric::Blur => config.blur_threshold,
        QualityMetric::Darkness => config.darkness_threshold,
        QualityMetric::Sharpness => config.sharpness_threshold,
    }
}

/// Threshold with a borderline band.
///
/// Any measure below `threshold - margin` rejects outright. All measures at or
/// above threshold accept. Anything else is borderline.
pub fn classify(scores: &MetricScores, config: &QualityGateConfig) -> QualityStatus {
    let margin = config.borderline_margin;

    if METRICS
        .iter()
        .any(|&m| scores.get(m) < threshold_for(config, m) - margin)
    {
        return QualityStatus::Rejected;
    }

    if METRICS
        .iter()
        .all(|&m| scores.get(m) >= threshold_for(config, m))
    {
        return QualityStatus::Accepted;
    }

    QualityStatus::Borderline
}

/// One reason per measure below its threshold.
pub fn rejection_reasons(scores: &MetricScores, config: &QualityGateConfig) -> Vec<RejectionReason> {
    METRICS
        .iter()
        .filter_map(|&metric| {
            let score = scores.get(metric);
            let threshold = threshold_for(config, metric);
            if score >= threshold {
                return None;
            }
            let (message, tip) = explain(metric);
            Some(RejectionReason {
                metric,
                score,
                threshold,
                message: message.to_string(),
                tip: tip.to_string(),
            })
        })
        .collect()
}

fn explain(metric: QualityMetric) -> (&'static str, &'static str) {
    match metric {
        QualityMetric::Blur => (
            "Photo is blurry",
            "Hold the phone steady with both hands and tap the screen to focus before shooting.",
        ),
        QualityMetric::Darkness => (
            "Photo is too dark",
            "Turn on the room lights or open the blinds, and avoid shooting toward a bright window.",
        ),
        QualityMetric::Sharpness => (
            "Photo lacks fine detail",
            "Wipe the camera lens and step a little closer to the surfaces you are documenting.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(blur: f64, darkness: f64, sharpness: f64) -> MetricScores {
        MetricScores {
            blur,
            darkness,
            sharpness,
        }
    }

    fn config() -> QualityGateConfig {
        QualityGateConfig::default()
    }

    #[test]
    fn clear_pass_is_accepted() {
        assert_eq!(classify(&scores(200.0, 100.0, 80.0), &config()), QualityStatus::Accepted);
    }

    #[test]
    fn blur_hard_fail_is_rejected() {
        assert_eq!(classify(&scores(10.0, 100.0, 80.0), &config()), QualityStatus::Rejected);
    }

    #[test]
    fn blur_in_band_is_borderline() {
        assert_eq!(classify(&scores(90.0, 100.0, 80.0), &config()), QualityStatus::Borderline);
    }

    #[test]
    fn exactly_at_threshold_is_accepted() {
        assert_eq!(classify(&scores(100.0, 40.0, 50.0), &config()), QualityStatus::Accepted);
    }

    #[test]
    fn exactly_at_band_floor_is_borderline() {
        assert_eq!(classify(&scores(80.0, 40.0, 50.0), &config()), QualityStatus::Borderline);
    }

    #[test]
    fn hard_fail_wins_over_other_passes() {
        // Very dark but otherwise excellent.
        assert_eq!(classify(&scores(5000.0, 5.0, 300.0), &config()), QualityStatus::Rejected);
    }

    #[test]
    fn dropping_any_metric_below_band_rejects() {
        let cfg = config();
        let accepted = scores(200.0, 100.0, 80.0);
        for metric in METRICS {
            let floor = threshold_for(&cfg, metric) - cfg.borderline_margin;
            for below in [floor - 0.001, floor - 1.0, floor - 50.0, 0.0] {
                if below >= floor {
                    continue;
                }
                let mut s = accepted;
                match metric {
                    QualityMetric::Blur => s.blur = below,
                    QualityMetric::Darkness => s.darkness = below,
                    QualityMetric::Sharpness => s.sharpness = below,
                }
                assert_eq!(
                    classify(&s, &cfg),
                    QualityStatus::Rejected,
                    "{metric} at {below}"
                );
            }
        }
    }

    #[test]
    fn reasons_one_per_failing_metric() {
        let reasons = rejection_reasons(&scores(10.0, 10.0, 80.0), &config());
        assert_eq!(reasons.len(), 2);
        assert_eq!(reasons[0].metric, QualityMetric::Blur);
        assert_eq!(reasons[0].threshold, 100.0);
        assert_eq!(reasons[1].metric, QualityMetric::Darkness);
        assert!(reasons.iter().all(|r| !r.tip.is_empty()));
    }

    #[test]
    fn no_reasons_when_all_pass() {
        assert!(rejection_reasons(&scores(200.0, 100.0, 80.0), &config()).is_empty());
    }
}
