use std::path::Path;

use image::RgbImage;

use crate::models::{ImageMetrics, InspectionImage, QualityMetric, QualityStatus};
use crate::pipeline::imaging::{
    laplacian_variance, load_rgb, mean_gradient_magnitude, mean_luminance, rgb_to_gray,
    ImagingError,
};

/// Raw quality measures for one photo.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MetricScores {
    pub blur: f64,
    pub darkness: f64,
    pub sharpness: f64,
}

impl MetricScores {
    pub fn get(&self, metric: QualityMetric) -> f64 {
        match metric {
            QualityMetric::Blur => self.blur,
            QualityMetric::Darkness => self.darkness,
            QualityMetric::Sharpness => self.sharpness,
        }
    }
}

impl From<&ImageMetrics> for MetricScores {
    fn from(m: &ImageMetrics) -> Self {
        Self {
            blur: m.blur_score,
            darkness: m.darkness_score,
            sharpness: m.sharpness_score,
        }
    }
}

/// Compute all three measures on decoded pixels.
pub fn measure(rgb: &RgbImage) -> MetricScores {
    let gray = rgb_to_gray(rgb);
    MetricScores {
        blur: laplacian_variance(&gray),
        darkness: mean_luminance(&gray),
        sharpness: mean_gradient_magnitude(&gray),
    }
}

pub fn measure_file(path: &Path) -> Result<MetricScores, ImagingError> {
    Ok(measure(&load_rgb(path)?))
}

/// Score one photo. An unreadable photo scores 0.0 on every measure.
pub fn score_image(image: &InspectionImage) -> ImageMetrics {
    let scores = match measure_file(&image.file_path) {
        Ok(scores) => scores,
        Err(e) => {
            tracing::error!(image_id = %image.id, error = %e, "Quality metrics failed, scoring as zero");
            MetricScores::default()
        }
    };

    tracing::debug!(
        image_id = %image.id,
        blur = scores.blur,
        darkness = scores.darkness,
        sharpness = scores.sharpness,
        "Scored image"
    );

    ImageMetrics {
        image_id: image.id.clone(),
        file_path: image.file_path.clone(),
        blur_score: scores.blur,
        darkness_score: scores.darkness,
        sharpness_score: scores.sharpness,
        status: QualityStatus::Pending,
        model_verdict: None,
    }
}
