//! Builder-style recorder for one audit action.
//!
//! ```
//! # use eolwatch_record::session::AuditSession;
//! # use eolwatch_record::AuditStatus;
//! let mut session = AuditSession::new("obsolescence", "scan_range");
//! session.set_detail("cidr", serde_json::json!("192.168.10.0/24"));
//! session.add_artifact("inventory_json", "reports/audit/inventory.json");
//! let result = session.finish(AuditStatus::Success, "Scan complete: 3 host(s) found");
//! assert!(result.is_closed());
//! ```

use std::collections::BTreeMap;

use chrono::Utc;

use crate::{AuditResult, AuditStatus, RunId};

/// An open audit result. Consumed by [`AuditSession::finish`] or
/// [`AuditSession::fail`], so a result cannot leave without an end time.
pub struct AuditSession {
    result: AuditResult,
}

impl AuditSession {
    /// Start a session; `details` begins as `{"action": action}`.
    pub fn new(module: &str, action: &str) -> Self {
        Self {
            result: AuditResult {
                id: RunId::new(),
                module: module.to_string(),
                status: AuditStatus::Unknown,
                summary: String::new(),
                details: serde_json::json!({ "action": action }),
                artifacts: BTreeMap::new(),
                started_at: Utc::now(),
                ended_at: None,
            },
        }
    }

    pub fn id(&self) -> RunId {
        self.result.id
    }

    /// Set a top-level key in the details object.
    pub fn set_detail(&mut self, key: &str, value: serde_json::Value) {
        if let Some(map) = self.result.details.as_object_mut() {
            map.insert(key.to_string(), value);
        }
    }

    /// Record an artifact written during the run.
    pub fn add_artifact(&mut self, name: &str, path: impl Into<String>) {
        self.result.artifacts.insert(name.to_string(), path.into());
    }

    /// Close the session with the given status.
    pub fn finish(mut self, status: AuditStatus, summary: impl Into<String>) -> AuditResult {
        self.result.status = status;
        self.result.summary = summary.into();
        self.result.ended_at = Some(Utc::now());

        tracing::info!(
            run_id = %self.result.id,
            module = %self.result.module,
            status = %status,
            duration_ms = self.result.duration_ms(),
            summary = %self.result.summary,
            "Audit action finished"
        );

        self.result
    }

    /// Close the session as ERROR, keeping the failure message in details.
    pub fn fail(mut self, error: impl std::fmt::Display) -> AuditResult {
        let message = error.to_string();
        self.set_detail("error", serde_json::Value::String(message.clone()));
        self.finish(AuditStatus::Error, message)
    }
}
