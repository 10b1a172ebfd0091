//! Vision-model capability contract.
//!
//! Pipelines talk to a model only through [`VisionModel`]. Whether a model is
//! configured at all is carried by [`VisionProvider`], so "not configured" is a
//! variant every call site matches on, never an error to catch. Call failures
//! (timeouts, HTTP errors, bad bodies) are [`VisionError`]s.

pub mod mock;
pub mod ollama;
pub mod openai;
pub mod response;
pub mod types;

pub use mock::*;
pub use ollama::OllamaVisionModel;
pub use openai::OpenAiVisionModel;
pub use response::extract_json;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine as _;
use thiserror::Error;

use crate::config::{VisionConfig, VisionProviderKind};

/// Maximum raw image size sent to a model (base64 grows it by a third).
pub const MAX_IMAGE_BYTES: usize = 15 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("Vision model endpoint not reachable at {0}")]
    NotReachable(String),

    #[error("Vision model returned an error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP client setup failed: {0}")]
    HttpClient(String),

    #[error("Could not read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image too large ({0} bytes)")]
    ImageTooLarge(usize),

    #[error("Malformed model response: {0}")]
    ResponseParsing(String),

    #[error("Model returned an empty response")]
    EmptyResponse,
}

impl VisionError {
    /// Classify a reqwest failure the way every client reports it.
    pub(crate) fn from_reqwest(err: reqwest::Error, base_url: &str, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            VisionError::Timeout(timeout_secs)
        } else if err.is_connect() {
            VisionError::NotReachable(base_url.to_string())
        } else {
            VisionError::Network(err.to_string())
        }
    }
}

/// The three operations pipelines may ask of a vision-capable model.
pub trait VisionModel: Send + Sync {
    /// Provider/model label for logs.
    fn name(&self) -> &str;

    fn analyze_image(&self, image: &Path, prompt: &str) -> Result<String, VisionError>;

    fn analyze_images(&self, images: &[PathBuf], prompt: &str) -> Result<String, VisionError>;

    fn chat(&self, prompt: &str) -> Result<String, VisionError>;
}

/// Configured model, or the explicit absence of one.
#[derive(Clone, Default)]
pub enum VisionProvider {
    #[default]
    Unavailable,
    Available(Arc<dyn VisionModel>),
}

impl VisionProvider {
    pub fn available(model: impl VisionModel + 'static) -> Self {
        Self::Available(Arc::new(model))
    }

    pub fn model(&self) -> Option<&dyn VisionModel> {
        match self {
            Self::Available(model) => Some(model.as_ref()),
            Self::Unavailable => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }

    /// Build the provider named in config.
    ///
    /// An OpenAI-compatible provider whose API key variable is unset resolves to
    /// `Unavailable`, the same as configuring no provider.
    pub fn from_config(config: &VisionConfig) -> Result<Self, VisionError> {
        match config.provider {
            VisionProviderKind::None => Ok(Self::Unavailable),
            VisionProviderKind::Ollama => {
                let model = OllamaVisionModel::new(
                    non_empty(&config.base_url).unwrap_or(ollama::DEFAULT_BASE_URL),
                    non_empty(&config.model).unwrap_or(ollama::DEFAULT_MODEL),
                    config.timeout_secs,
                )?;
                tracing::info!(model = %model.name(), "Vision provider: ollama");
                Ok(Self::available(model))
            }
            VisionProviderKind::OpenAi => {
                let key = match std::env::var(&config.api_key_env) {
                    Ok(key) if !key.trim().is_empty() => key,
                    _ => {
                        tracing::warn!(
                            env = %config.api_key_env,
                            "OpenAI-compatible provider configured but API key is not set; running without a vision model"
                        );
                        return Ok(Self::Unavailable);
                    }
                };
                let model = OpenAiVisionModel::new(
                    non_empty(&config.base_url).unwrap_or(openai::DEFAULT_BASE_URL),
                    non_empty(&config.model).unwrap_or(openai::DEFAULT_MODEL),
                    key.trim(),
                    config.timeout_secs,
                )?;
                tracing::info!(model = %model.name(), "Vision provider: openai-compatible");
                Ok(Self::available(model))
            }
        }
    }
}

impl fmt::Debug for VisionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => f.write_str("VisionProvider::Unavailable"),
            Self::Available(model) => write!(f, "VisionProvider::Available({})", model.name()),
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Read an image from disk and base64-encode it for a request body.
pub(crate) fn encode_image_file(path: &Path) -> Result<String, VisionError> {
    let bytes = std::fs::read(path).map_err(|source| VisionError::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(VisionError::ImageTooLarge(bytes.len()));
    }
    Ok(base64::engine::general_purpose::STANDARD.encode(&bytes))
}

pub(crate) fn build_http_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, VisionError> {
    reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| VisionError::HttpClient(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_provider_is_unavailable() {
        let provider = VisionProvider::default();
        assert!(!provider.is_available());
        assert!(provider.model().is_none());
    }

    #[test]
    fn none_kind_builds_unavailable() {
        let provider = VisionProvider::from_config(&VisionConfig::default()).unwrap();
        assert!(!provider.is_available());
    }

    #[test]
    fn ollama_kind_builds_available() {
        let config = VisionConfig {
            provider: VisionProviderKind::Ollama,
            ..VisionConfig::default()
        };
        let provider = VisionProvider::from_config(&config).unwrap();
        assert!(provider.is_available());
        assert!(format!("{provider:?}").contains(ollama::DEFAULT_MODEL));
    }

    #[test]
    fn openai_without_key_is_unavailable() {
        let config = VisionConfig {
            provider: VisionProviderKind::OpenAi,
            api_key_env: "WALKTHRU_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..VisionConfig::default()
        };
        let provider = VisionProvider::from_config(&config).unwrap();
        assert!(!provider.is_available());
    }

    #[test]
    fn available_exposes_model() {
        let provider = VisionProvider::available(MockVisionModel::new("ok"));
        assert_eq!(provider.model().unwrap().chat("hi").unwrap(), "ok");
    }

    #[test]
    fn encode_missing_file_is_image_read_error() {
        let err = encode_image_file(Path::new("/nonexistent/photo.jpg")).unwrap_err();
        assert!(matches!(err, VisionError::ImageRead { .. }));
    }

    #[test]
    fn encode_file_is_base64() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.bin");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(encode_image_file(&path).unwrap(), "YWJj");
    }
}
