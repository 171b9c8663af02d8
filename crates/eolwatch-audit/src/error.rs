//! Error types for the eolwatch-audit crate.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Missing required input: {0}")]
    MissingInput(&'static str),

    #[error("CSV file not found: {}", .0.display())]
    CsvNotFound(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Catalog error: {0}")]
    Catalog(#[from] eolwatch_catalog::CatalogError),

    #[error("Scan error: {0}")]
    Discover(#[from] eolwatch_discover::error::DiscoverError),

    #[error(transparent)]
    Core(#[from] eolwatch_core::EolwatchError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Report rendering failed")]
    Render(#[from] std::fmt::Error),
}

pub type Result<T> = std::result::Result<T, AuditError>;
