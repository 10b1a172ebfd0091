pub mod language_policy;

pub use language_policy::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Forbidden term {term:?} could not be compiled: {source}")]
    InvalidTerm {
        term: String,
        #[source]
        source: regex::Error,
    },
}
