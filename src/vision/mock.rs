use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{VisionError, VisionModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOp {
    AnalyzeImage,
    AnalyzeImages,
    Chat,
}

#[derive(Debug, Clone)]
pub struct MockCall {
    pub op: MockOp,
    pub prompt: String,
    pub images: Vec<PathBuf>,
}

/// Scriptable vision model for tests and offline runs.
///
/// Replies come from, in order: the queued script, the per-operation reply,
/// then the default reply. Every call is recorded.
pub struct MockVisionModel {
    default_reply: String,
    image_reply: Option<String>,
    chat_reply: Option<String>,
    fail_images: bool,
    fail_chat: bool,
    script: Mutex<VecDeque<Result<String, String>>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockVisionModel {
    pub fn new(reply: &str) -> Self {
        Self {
            default_reply: reply.to_string(),
            image_reply: None,
            chat_reply: None,
            fail_images: false,
            fail_chat: false,
            script: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call times out.
    pub fn failing() -> Self {
        Self::new("").with_image_failure().with_chat_failure()
    }

    pub fn with_image_reply(mut self, reply: &str) -> Self {
        self.image_reply = Some(reply.to_string());
        self
    }

    pub fn with_chat_reply(mut self, reply: &str) -> Self {
        self.chat_reply = Some(reply.to_string());
        self
    }

    pub fn with_image_failure(mut self) -> Self {
        self.fail_images = true;
        self
    }

    pub fn with_chat_failure(mut self) -> Self {
        self.fail_chat = true;
        self
    }

    /// Queue replies consumed one per call, before any other rule. `Err` is a network failure.
    pub fn with_script(mut self, replies: Vec<Result<&str, &str>>) -> Self {
        if let Ok(script) = self.script.get_mut() {
            script.extend(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string)),
            );
        }
        self
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    fn respond(&self, op: MockOp, prompt: &str, images: &[PathBuf]) -> Result<String, VisionError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(MockCall {
                op,
                prompt: prompt.to_string(),
                images: images.to_vec(),
            });
        }

        if let Some(next) = self.script.lock().ok().and_then(|mut s| s.pop_front()) {
            return next.map_err(VisionError::Network);
        }

        let (fail, reply) = match op {
            MockOp::Chat => (self.fail_chat, self.chat_reply.as_ref()),
            MockOp::AnalyzeImage | MockOp::AnalyzeImages => {
                (self.fail_images, self.image_reply.as_ref())
            }
        };
        if fail {
            return Err(VisionError::Timeout(0));
        }
        Ok(reply.unwrap_or(&self.default_reply).clone())
    }
}

impl VisionModel for MockVisionModel {
    fn name(&self) -> &str {
        "mock"
    }

    fn analyze_image(&self, image: &Path, prompt: &str) -> Result<String, VisionError> {
        self.respond(MockOp::AnalyzeImage, prompt, &[image.to_path_buf()])
    }

    fn analyze_images(&self, images: &[PathBuf], prompt: &str) -> Result<String, VisionError> {
        self.respond(MockOp::AnalyzeImages, prompt, images)
    }

    fn chat(&self, prompt: &str) -> Result<String, VisionError> {
        self.respond(MockOp::Chat, prompt, &[])
    }
}
