//! Wire types for the vision endpoints.

use serde::{Deserialize, Serialize};

// ──────────────────────────────────────────────
// Ollama /api/chat
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct VisionChatRequest {
    pub model: String,
    pub messages: Vec<VisionChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<VisionGenerationOptions>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VisionChatMessage {
    pub role: String,
    pub content: String,
    /// Base64-encoded images (only for user messages).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

/// Generation options for inspection prompts (low temperature, short replies).
#[derive(Debug, Clone, Serialize)]
pub struct VisionGenerationOptions {
    pub temperature: f32,
    pub num_predict: i32,
}

impl Default for VisionGenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            num_predict: 1024,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct VisionChatResponse {
    pub message: VisionChatResponseMessage,
}

#[derive(Debug, Deserialize)]
pub struct VisionChatResponseMessage {
    #[serde(default)]
    pub content: String,
}

// ──────────────────────────────────────────────
// OpenAI-compatible /chat/completions
// ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<CompletionMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}
