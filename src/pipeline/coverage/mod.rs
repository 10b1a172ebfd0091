//! Coverage review: describe each photo, map the descriptions onto the room
//! checklist, and ask for more shots when coverage falls short.

pub mod aggregator;
pub mod prompts;
pub mod review;
pub mod summarize;

pub use aggregator::*;
pub use review::*;
pub use summarize::*;
