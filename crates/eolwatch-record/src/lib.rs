//! eolwatch-record: Audit result lifecycle and persistence.
//!
//! Every audit action produces exactly one [`AuditResult`]. Results are
//! opened through an [`session::AuditSession`], closed with an end
//! timestamp before leaving the orchestrator, and persisted as JSON by a
//! [`store::ResultStore`].

pub mod session;
pub mod store;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Core Types ───────────────────────────────────────────────────

/// Unique identifier for an audit run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex characters, used in file names.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Outcome of an audit action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditStatus {
    Success,
    Warning,
    Error,
    Unknown,
}

impl AuditStatus {
    /// Process exit code for this status.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Warning => 1,
            Self::Error => 2,
            Self::Unknown => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The record handed to the reporting boundary for one audit action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditResult {
    /// Unique run identifier.
    pub id: RunId,
    /// Producing module (e.g. "obsolescence").
    pub module: String,
    pub status: AuditStatus,
    /// One-line human readable outcome.
    pub summary: String,
    /// Structured, action-specific details.
    pub details: serde_json::Value,
    /// Named artifact paths written during the run.
    pub artifacts: BTreeMap<String, String>,
    pub started_at: DateTime<Utc>,
    /// Set when the run is closed.
    pub ended_at: Option<DateTime<Utc>>,
}

impl AuditResult {
    pub fn is_closed(&self) -> bool {
        self.ended_at.is_some()
    }

    pub fn exit_code(&self) -> u8 {
        self.status.exit_code()
    }

    /// Wall-clock duration, once closed.
    pub fn duration_ms(&self) -> Option<i64> {
        self.ended_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}
