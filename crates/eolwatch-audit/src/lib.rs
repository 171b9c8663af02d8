//! eolwatch-audit: Obsolescence audit orchestration.
//!
//! Ties the prober, the EOL catalog and the CSV component inventory
//! together into three audit actions, each closed into an
//! [`eolwatch_record::AuditResult`].

pub mod config;
pub mod engine;
pub mod error;
pub mod escape;
pub mod importer;
pub mod report;

pub use config::AuditConfig;
pub use engine::{startup_failure, AuditAction, AuditEngine};
pub use error::AuditError;
