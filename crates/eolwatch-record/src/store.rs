//! Result storage: a trait plus a JSON file implementation.
//!
//! Results are written as one pretty-printed JSON file per run:
//! ```text
//! {root}/
//!   obsolescence_20260212_120000_1a2b3c4d.json
//! ```
//! Each file carries the result plus its `exit_code`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use eolwatch_core::fsio;

use crate::{AuditResult, RunId};

/// Errors that can occur while persisting results.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Audit result {0} is still open (no end timestamp)")]
    NotClosed(RunId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Write error: {0}")]
    Write(#[from] eolwatch_core::EolwatchError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Trait for result persistence backends.
pub trait ResultStore {
    /// Persist a closed result, returning where it was written.
    fn save(&self, result: &AuditResult) -> Result<PathBuf, StoreError>;

    /// Read a previously saved result back.
    fn load(&self, path: &Path) -> Result<AuditResult, StoreError>;
}

/// On-disk shape: the result with its exit code alongside.
#[derive(Serialize, Deserialize)]
struct PersistedResult {
    #[serde(flatten)]
    result: AuditResult,
    exit_code: u8,
}

/// Directory-backed JSON result store.
pub struct JsonResultStore {
    root: PathBuf,
}

impl JsonResultStore {
    /// Create a store rooted at `root`. The directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn result_path(&self, result: &AuditResult) -> PathBuf {
        let stamp = result.started_at.format("%Y%m%d_%H%M%S");
        self.root.join(format!(
            "{}_{}_{}.json",
            result.module,
            stamp,
            result.id.short()
        ))
    }
}

impl ResultStore for JsonResultStore {
    fn save(&self, result: &AuditResult) -> Result<PathBuf, StoreError> {
        if !result.is_closed() {
            return Err(StoreError::NotClosed(result.id));
        }

        let path = self.result_path(result);
        let persisted = PersistedResult {
            result: result.clone(),
            exit_code: result.exit_code(),
        };
        fsio::write_json_atomic(&path, &persisted)?;

        tracing::debug!(
            run_id = %result.id,
            path = %path.display(),
            "Audit result saved"
        );

        Ok(path)
    }

    fn load(&self, path: &Path) -> Result<AuditResult, StoreError> {
        let json = fs::read_to_string(path)?;
        let persisted: PersistedResult = serde_json::from_str(&json)?;
        Ok(persisted.result)
    }
}
