use std::path::{Path, PathBuf};

use super::types::{
    VisionChatMessage, VisionChatRequest, VisionChatResponse, VisionGenerationOptions,
};
use super::{build_http_client, encode_image_file, VisionError, VisionModel};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llava";

/// Ollama HTTP client for local vision inference via `/api/chat`.
pub struct OllamaVisionModel {
    base_url: String,
    model: String,
    label: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OllamaVisionModel {
    pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self, VisionError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            label: format!("ollama:{model}"),
            client: build_http_client(timeout_secs)?,
            timeout_secs,
        })
    }

    fn send(&self, prompt: &str, images: Option<Vec<String>>) -> Result<String, VisionError> {
        let url = format!("{}/api/chat", self.base_url);
        let image_count = images.as_ref().map_or(0, Vec::len);
        let body = VisionChatRequest {
            model: self.model.clone(),
            messages: vec![VisionChatMessage {
                role: "user".into(),
                content: prompt.to_string(),
                images,
            }],
            stream: false,
            options: Some(VisionGenerationOptions::default()),
        };

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .map_err(|e| VisionError::from_reqwest(e, &self.base_url, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(VisionError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: VisionChatResponse = response
            .json()
            .map_err(|e| VisionError::ResponseParsing(e.to_string()))?;

        tracing::debug!(
            model = %self.model,
            images = image_count,
            elapsed_ms = %start.elapsed().as_millis(),
            response_len = parsed.message.content.len(),
            "Ollama chat complete"
        );

        if parsed.message.content.trim().is_empty() {
            return Err(VisionError::EmptyResponse);
        }
        Ok(parsed.message.content)
    }
}

impl VisionModel for OllamaVisionModel {
    fn name(&self) -> &str {
        &self.label
    }

    fn analyze_image(&self, image: &Path, prompt: &str) -> Result<String, VisionError> {
        let encoded = encode_image_file(image)?;
        self.send(prompt, Some(vec![encoded]))
    }

    fn analyze_images(&self, images: &[PathBuf], prompt: &str) -> Result<String, VisionError> {
        let encoded = images
            .iter()
            .map(|p| encode_image_file(p))
            .collect::<Result<Vec<_>, _>>()?;
        self.send(prompt, Some(encoded))
    }

    fn chat(&self, prompt: &str) -> Result<String, VisionError> {
        self.send(prompt, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructor_trims_trailing_slash() {
        let client = OllamaVisionModel::new("http://localhost:11434/", "llava", 60).unwrap();
        assert_eq!(client.base_url, "http://localhost:11434");
        assert_eq!(client.timeout_secs, 60);
    }

    #[test]
    fn unreadable_image_fails_before_network() {
        let client = OllamaVisionModel::new("http://127.0.0.1:9", "llava", 1).unwrap();
        let err = client
            .analyze_image(Path::new("/nonexistent/x.jpg"), "describe")
            .unwrap_err();
        assert!(matches!(err, VisionError::ImageRead { .. }));
    }
}
