//! Configuration for the audit orchestrator.

use serde::Deserialize;

use eolwatch_catalog::CatalogConfig;
use eolwatch_core::config::{layered, section};
use eolwatch_discover::config::ScanConfig;

use crate::error::Result;

/// Full configuration, one struct per section.
#[derive(Debug, Clone, Default)]
pub struct AuditConfig {
    pub scan: ScanConfig,
    pub catalog: CatalogConfig,
    pub audit: AuditSettings,
}

impl AuditConfig {
    /// Load `<file_prefix>.{toml,yaml,json}` and `EOLWATCH__*` overrides.
    /// Absent sections keep their defaults.
    pub fn load(file_prefix: &str) -> Result<Self> {
        let cfg = layered(file_prefix)?;
        let config = Self {
            scan: section(&cfg, "scan"),
            catalog: section(&cfg, "catalog"),
            audit: section(&cfg, "audit"),
        };
        tracing::debug!(
            report_dir = %config.audit.report_dir,
            soon_days = config.audit.soon_days,
            base_url = %config.catalog.base_url,
            "Configuration loaded"
        );
        Ok(config)
    }
}

/// The `[audit]` section.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AuditSettings {
    /// Days ahead of an EOL date that count as SOON.
    #[serde(default = "default_soon_days")]
    pub soon_days: u32,

    /// Where inventory and report artifacts are written.
    #[serde(default = "default_report_dir")]
    pub report_dir: String,

    /// Where closed results are persisted.
    #[serde(default = "default_results_dir")]
    pub results_dir: String,

    /// Range used by the CLI when `--cidr` is omitted.
    #[serde(default = "default_scan_cidr")]
    pub scan_cidr: String,

    /// Component inventory used by the CLI when `--csv` is omitted.
    #[serde(default = "default_components_csv")]
    pub components_csv: String,
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self {
            soon_days: default_soon_days(),
            report_dir: default_report_dir(),
            results_dir: default_results_dir(),
            scan_cidr: default_scan_cidr(),
            components_csv: default_components_csv(),
        }
    }
}

fn default_soon_days() -> u32 {
    eolwatch_catalog::DEFAULT_SOON_DAYS
}

fn default_report_dir() -> String {
    "reports/audit".to_string()
}

fn default_results_dir() -> String {
    "reports/json".to_string()
}

fn default_scan_cidr() -> String {
    "192.168.10.0/24".to_string()
}

fn default_components_csv() -> String {
    "inputs/components.csv".to_string()
}
