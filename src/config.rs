//! Inspection configuration.
//!
//! One `InspectionConfig` is built at process start (defaults, a JSON file, or
//! the file named by `WALKTHRU_CONFIG`) and passed by reference into every
//! pipeline entry point. Component logic never looks settings up on its own.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Walkthru";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV_VAR: &str = "WALKTHRU_CONFIG";

/// Get the application data directory (~/Walkthru/).
///
/// Falls back to the working directory when no home directory can be resolved.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default directory for side-by-side comparison crops.
pub fn default_crop_dir() -> PathBuf {
    app_data_dir().join("comparisons")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "walkthru_lib=info,walkthru=info,warn"
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Thresholds for the quality gate. Scores below `threshold - borderline_margin`
/// are hard failures; scores in `[threshold - margin, threshold)` are borderline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityGateConfig {
    pub blur_threshold: f64,
    pub darkness_threshold: f64,
    pub sharpness_threshold: f64,
    pub borderline_margin: f64,
}

impl Default for QualityGateConfig {
    fn default() -> Self {
        Self {
            blur_threshold: 100.0,
            darkness_threshold: 40.0,
            sharpness_threshold: 50.0,
            borderline_margin: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    /// Coverage percentage (0-100) at or above which a room is complete.
    pub min_coverage_pct: f64,
    /// Guided shooting positions offered to the photographer.
    pub guided_positions: Vec<String>,
    /// Positions that, once all captured, pass a capture regardless of coverage.
    pub required_positions: Vec<String>,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        let guided: Vec<String> = [
            "center-from-door",
            "center-opposite-wall",
            "corner-left-near",
            "corner-right-near",
            "corner-left-far",
            "corner-right-far",
            "ceiling",
            "floor",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let required = guided.iter().filter(|p| *p != "floor").cloned().collect();

        Self {
            min_coverage_pct: 80.0,
            guided_positions: guided,
            required_positions: required,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Dissimilarity cut (0-1) applied to the 8-bit diff map as `threshold * 255`.
    pub structural_diff_threshold: f64,
    pub min_candidate_confidence: f64,
    pub max_candidates_per_room: usize,
    /// Minimum contour area (pixels) for a diff region.
    pub min_region_area: f64,
    /// Where side-by-side crops are written, one subdirectory per comparison.
    pub crop_dir: PathBuf,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            structural_diff_threshold: 0.15,
            min_candidate_confidence: 0.3,
            max_candidates_per_room: 20,
            min_region_area: 500.0,
            crop_dir: default_crop_dir(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguagePolicyConfig {
    /// Phrases that imply fault or confirmed damage. Never include `replacement`.
    pub forbidden: Vec<String>,
    /// Phrases a neutral message is expected to carry.
    pub required_hedging: Vec<String>,
    pub replacement: String,
}

impl Default for LanguagePolicyConfig {
    fn default() -> Self {
        Self {
            forbidden: vec![
                "damage confirmed".into(),
                "damage detected".into(),
                "tenant caused".into(),
                "fault".into(),
                "liable".into(),
            ],
            required_hedging: vec![
                "candidate difference".into(),
                "possible".into(),
                "appears to".into(),
                "may indicate".into(),
            ],
            replacement: "candidate difference".into(),
        }
    }
}

/// Which vision-model backend to use. `None` is a supported, first-class setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisionProviderKind {
    #[default]
    None,
    Ollama,
    OpenAi,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub provider: VisionProviderKind,
    /// Base URL; empty means the provider's standard endpoint.
    pub base_url: String,
    /// Model name; empty means the provider's default model.
    pub model: String,
    /// Environment variable holding the API key (OpenAI-compatible providers).
    pub api_key_env: String,
    /// Per-request timeout. Must be finite and non-zero.
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            provider: VisionProviderKind::None,
            base_url: String::new(),
            model: String::new(),
            api_key_env: "OPENAI_API_KEY".into(),
            timeout_secs: 60,
        }
    }
}

/// Complete configuration surface for one process.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectionConfig {
    pub quality_gate: QualityGateConfig,
    pub coverage: CoverageConfig,
    pub comparison: ComparisonConfig,
    pub language_policy: LanguagePolicyConfig,
    pub vision: VisionConfig,
}

// ═══════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════

impl InspectionConfig {
    /// Load and validate a JSON config file. Missing fields take defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        tracing::info!(path = %path.display(), "Loaded inspection config");
        Ok(config)
    }

    /// Load from `WALKTHRU_CONFIG` if set, otherwise use defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::load(Path::new(path.trim())),
            _ => {
                tracing::debug!("{CONFIG_ENV_VAR} not set, using default config");
                Ok(Self::default())
            }
        }
    }

    /// Reject values no pipeline can work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let q = &self.quality_gate;
        non_negative("quality_gate.blur_threshold", q.blur_threshold)?;
        non_negative("quality_gate.darkness_threshold", q.darkness_threshold)?;
        non_negative("quality_gate.sharpness_threshold", q.sharpness_threshold)?;
        non_negative("quality_gate.borderline_margin", q.borderline_margin)?;

        let pct = self.coverage.min_coverage_pct;
        if !(0.0..=100.0).contains(&pct) {
            return Err(ConfigError::Invalid {
                field: "coverage.min_coverage_pct",
                reason: format!("{pct} is outside 0-100"),
            });
        }

        let c = &self.comparison;
        unit_interval("comparison.structural_diff_threshold", c.structural_diff_threshold)?;
        unit_interval("comparison.min_candidate_confidence", c.min_candidate_confidence)?;
        non_negative("comparison.min_region_area", c.min_region_area)?;
        if c.max_candidates_per_room == 0 {
            return Err(ConfigError::Invalid {
                field: "comparison.max_candidates_per_room",
                reason: "must be at least 1".into(),
            });
        }

        if self.language_policy.replacement.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "language_policy.replacement",
                reason: "must not be empty".into(),
            });
        }

        if self.vision.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "vision.timeout_secs",
                reason: "model calls need a finite, non-zero timeout".into(),
            });
        }

        Ok(())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} must be a finite, non-negative number"),
        })
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{value} is outside 0-1"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        InspectionConfig::default().validate().unwrap();
    }

    #[test]
    fn default_thresholds() {
        let config = InspectionConfig::default();
        assert_eq!(config.quality_gate.blur_threshold, 100.0);
        assert_eq!(config.quality_gate.darkness_threshold, 40.0);
        assert_eq!(config.quality_gate.sharpness_threshold, 50.0);
        assert_eq!(config.quality_gate.borderline_margin, 20.0);
        assert_eq!(config.coverage.min_coverage_pct, 80.0);
        assert_eq!(config.comparison.max_candidates_per_room, 20);
        assert_eq!(config.vision.provider, VisionProviderKind::None);
    }

    #[test]
    fn required_positions_exclude_floor() {
        let coverage = CoverageConfig::default();
        assert_eq!(coverage.guided_positions.len(), 8);
        assert_eq!(coverage.required_positions.len(), 7);
        assert!(!coverage.required_positions.iter().any(|p| p == "floor"));
    }

    #[test]
    fn replacement_is_not_forbidden() {
        let policy = LanguagePolicyConfig::default();
        assert!(!policy
            .forbidden
            .iter()
            .any(|f| f.eq_ignore_ascii_case(&policy.replacement)));
    }

    #[test]
    fn load_partial_json_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"quality_gate": {{"blur_threshold": 80.0}}, "vision": {{"provider": "ollama"}}}}"#
        )
        .unwrap();

        let config = InspectionConfig::load(file.path()).unwrap();
        assert_eq!(config.quality_gate.blur_threshold, 80.0);
        assert_eq!(config.quality_gate.darkness_threshold, 40.0);
        assert_eq!(config.vision.provider, VisionProviderKind::Ollama);
        assert_eq!(config.vision.timeout_secs, 60);
    }

    #[test]
    fn load_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        let err = InspectionConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = InspectionConfig::load(Path::new("/nonexistent/walkthru.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn zero_timeout_rejected() {
        let mut config = InspectionConfig::default();
        config.vision.timeout_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("vision.timeout_secs"));
    }

    #[test]
    fn coverage_pct_out_of_range_rejected() {
        let mut config = InspectionConfig::default();
        config.coverage.min_coverage_pct = 120.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn diff_threshold_out_of_range_rejected() {
        let mut config = InspectionConfig::default();
        config.comparison.structural_diff_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn negative_margin_rejected() {
        let mut config = InspectionConfig::default();
        config.quality_gate.borderline_margin = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_candidate_cap_rejected() {
        let mut config = InspectionConfig::default();
        config.comparison.max_candidates_per_room = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn provider_kind_serializes_snake_case() {
        let json = serde_json::to_string(&VisionProviderKind::OpenAi).unwrap();
        assert_eq!(json, "\"open_ai\"");
    }

    #[test]
    fn crop_dir_under_app_data() {
        assert!(default_crop_dir().starts_with(app_data_dir()));
        assert!(default_crop_dir().ends_with("comparisons"));
    }
}
