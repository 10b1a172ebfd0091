use std::path::{Path, PathBuf};

use super::types::{CompletionMessage, CompletionRequest, CompletionResponse, ContentPart, ImageUrl};
use super::{build_http_client, encode_image_file, VisionError, VisionModel};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const MAX_TOKENS: u32 = 1024;

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiVisionModel {
    base_url: String,
    model: String,
    label: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl OpenAiVisionModel {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout_secs: u64,
    ) -> Result<Self, VisionError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            label: format!("openai:{model}"),
            api_key: api_key.to_string(),
            client: build_http_client(timeout_secs)?,
            timeout_secs,
        })
    }

    fn send(&self, content: Vec<ContentPart>) -> Result<String, VisionError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: self.model.clone(),
            messages: vec![CompletionMessage {
                role: "user".into(),
                content,
            }],
            temperature: 0.1,
            max_tokens: MAX_TOKENS,
        };

        let start = std::time::Instant::now();
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
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

        let parsed: CompletionResponse = response
            .json()
            .map_err(|e| VisionError::ResponseParsing(e.to_string()))?;

        tracing::debug!(
            model = %self.model,
            elapsed_ms = %start.elapsed().as_millis(),
            "Chat completion complete"
        );

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(VisionError::EmptyResponse)
    }
}

fn image_part(path: &Path) -> Result<ContentPart, VisionError> {
    let encoded = encode_image_file(path)?;
    Ok(ContentPart::ImageUrl {
        image_url: ImageUrl {
            url: format!("data:{};base64,{encoded}", mime_for(path)),
        },
    })
}

fn mime_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

impl VisionModel for OpenAiVisionModel {
    fn name(&self) -> &str {
        &self.label
    }

    fn analyze_image(&self, image: &Path, prompt: &str) -> Result<String, VisionError> {
        self.send(vec![
            ContentPart::Text {
                text: prompt.to_string(),
            },
            image_part(image)?,
        ])
    }

    fn analyze_images(&self, images: &[PathBuf], prompt: &str) -> Result<String, VisionError> {
        let mut parts = vec![ContentPart::Text {
            text: prompt.to_string(),
        }];
        for path in images {
            parts.push(image_part(path)?);
        }
        self.send(parts)
    }

    fn chat(&self, prompt: &str) -> Result<String, VisionError> {
        self.send(vec![ContentPart::Text {
            text: prompt.to_string(),
        }])
    }
}
