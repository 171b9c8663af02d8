//! Error types for the eolwatch-discover crate.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscoverError {
    #[error("Invalid CIDR {input:?}: {reason}")]
    InvalidCidr { input: String, reason: String },

    #[error("Only IPv4 ranges can be scanned, got {0}")]
    UnsupportedFamily(String),

    #[error("Artifact error: {0}")]
    Artifact(#[from] eolwatch_core::EolwatchError),
}

pub type Result<T> = std::result::Result<T, DiscoverError>;
