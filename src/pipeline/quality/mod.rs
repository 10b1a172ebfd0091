//! Quality gate: score each photo, classify against thresholds with a
//! borderline band, escalate borderline photos to the vision model, roll up.

pub mod classifier;
pub mod gate;
pub mod prompts;
pub mod scorer;

pub use classifier::*;
pub use gate::*;
pub use scorer::*;
