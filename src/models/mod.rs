pub mod comparison;
pub mod coverage;
pub mod enums;
pub mod image;
pub mod quality;

pub use comparison::*;
pub use coverage::*;
pub use enums::*;
pub use image::*;
pub use quality::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Invalid value for {field}: {value}")]
    InvalidEnum { field: String, value: String },
}
