pub mod comparison;
pub mod coverage;
pub mod imaging;
pub mod inspection;
pub mod quality;
pub mod safety;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::config::ConfigError;
use crate::vision::VisionError;
use safety::PolicyError;

/// Pipeline-level failures. Per-image and per-region problems never become one
/// of these; they are logged and replaced by their documented fallback.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Pipeline run was cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Language policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Vision provider error: {0}")]
    Vision(#[from] VisionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Join(String),
}

/// Cooperative cancellation shared between a caller and a running pipeline.
///
/// Checked between stages and before every model call.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once `cancel` has been called.
    pub fn check(&self) -> Result<(), PipelineError> {
        if self.is_cancelled() {
            Err(PipelineError::Cancelled)
        } else {
            Ok(())
        }
    }
}
