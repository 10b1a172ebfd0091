//! Move-in / move-out comparison: pair photos, diff each pair structurally,
//! extract candidate regions, have the model describe them, and compose
//! neutral follow-up messages.

pub mod analysis;
pub mod crop;
pub mod diff;
pub mod followup;
pub mod orchestrator;
pub mod pairing;
pub mod prompts;
pub mod regions;

pub use analysis::*;
pub use crop::*;
pub use diff::*;
pub use followup::*;
pub use orchestrator::*;
pub use pairing::*;
pub use regions::*;

use thiserror::Error;

use crate::pipeline::imaging::ImagingError;

#[derive(Error, Debug)]
pub enum DiffError {
    #[error(transparent)]
    Imaging(#[from] ImagingError),

    #[error("Images too small to compare ({width}x{height}, need at least {min}x{min})")]
    TooSmall { width: u32, height: u32, min: u32 },

    #[error("Image sizes differ: {0:?} vs {1:?}")]
    DimensionMismatch((u32, u32), (u32, u32)),
}
