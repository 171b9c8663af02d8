//! Audit orchestrator.
//!
//! Each action opens an [`AuditSession`], runs to completion or to its first
//! error, and always returns a closed [`AuditResult`]. Failures never escape
//! as `Err`: they become ERROR results carrying the message.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use serde_json::json;

use eolwatch_catalog::{classify, match_cycle, CatalogClient, CycleRecord};
use eolwatch_core::types::{ClassifiedComponent, SupportStatus};
use eolwatch_discover::{inventory, prober};
use eolwatch_record::session::AuditSession;
use eolwatch_record::{AuditResult, AuditStatus};

use crate::config::AuditConfig;
use crate::error::{AuditError, Result};
use crate::importer;
use crate::report::{self, ReportInput};

/// Module name recorded in every result.
pub const MODULE_NAME: &str = "obsolescence";

/// A requested audit action with its raw arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditAction {
    ScanRange {
        cidr: Option<String>,
    },
    ListVersionsEol {
        product: Option<String>,
    },
    CsvToReport {
        csv_path: Option<PathBuf>,
        do_scan: bool,
        cidr: Option<String>,
    },
}

impl AuditAction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ScanRange { .. } => "scan_range",
            Self::ListVersionsEol { .. } => "list_versions_eol",
            Self::CsvToReport { .. } => "csv_to_report",
        }
    }
}

/// One catalog cycle with its classification, as listed by
/// `list_versions_eol`.
#[derive(Serialize)]
struct CycleStatusRow<'a> {
    #[serde(flatten)]
    cycle: &'a CycleRecord,
    support_status: SupportStatus,
    eol_date: Option<String>,
}

type Outcome = Result<(AuditStatus, String)>;

pub struct AuditEngine {
    config: AuditConfig,
    catalog: CatalogClient,
    today: Option<NaiveDate>,
}

impl AuditEngine {
    pub fn new(config: AuditConfig, catalog: CatalogClient) -> Self {
        Self {
            config,
            catalog,
            today: None,
        }
    }

    /// Engine with the production catalog client built from `config.catalog`.
    pub fn from_config(config: AuditConfig) -> Result<Self> {
        let catalog = CatalogClient::from_config(config.catalog.clone())?;
        Ok(Self::new(config, catalog))
    }

    /// Pin the reference date used for classification.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn report_dir(&self) -> &Path {
        Path::new(&self.config.audit.report_dir)
    }

    /// Run any action.
    pub async fn run(&mut self, action: AuditAction) -> AuditResult {
        tracing::info!(action = action.name(), "Running audit action");
        match action {
            AuditAction::ScanRange { cidr } => self.scan_range(cidr.as_deref()).await,
            AuditAction::ListVersionsEol { product } => self.list_versions_eol(product.as_deref()).await,
            AuditAction::CsvToReport {
                csv_path,
                do_scan,
                cidr,
            } => {
                self.csv_to_report(csv_path.as_deref(), do_scan, cidr.as_deref())
                    .await
            }
        }
    }

    // ── scan_range ──────────────────────────────────────────────────

    /// Probe `cidr` and write the inventory artifact.
    pub async fn scan_range(&self, cidr: Option<&str>) -> AuditResult {
        let mut session = AuditSession::new(MODULE_NAME, "scan_range");
        let outcome = self.scan_range_inner(&mut session, cidr).await;
        close(session, outcome)
    }

    async fn scan_range_inner(&self, session: &mut AuditSession, cidr: Option<&str>) -> Outcome {
        let cidr = non_empty(cidr).ok_or(AuditError::MissingInput("cidr"))?;
        session.set_detail("cidr", json!(cidr));

        let (hosts, stats) = prober::scan_range(cidr, &self.config.scan).await?;
        let run_tag = session.id().short();
        let path = inventory::write_inventory(self.report_dir(), &run_tag, &stats, &hosts)?;

        session.set_detail("stats", serde_json::to_value(&stats)?);
        session.set_detail("inventory", serde_json::to_value(&hosts)?);
        session.add_artifact("inventory_json", path.display().to_string());

        Ok(if hosts.is_empty() {
            (AuditStatus::Warning, "Scan complete: no host detected".to_string())
        } else {
            (
                AuditStatus::Success,
                format!("Scan complete: {} host(s) found", hosts.len()),
            )
        })
    }

    // ── list_versions_eol ───────────────────────────────────────────

    /// List every release cycle of `product` with its support status.
    pub async fn list_versions_eol(&mut self, product: Option<&str>) -> AuditResult {
        let mut session = AuditSession::new(MODULE_NAME, "list_versions_eol");
        let outcome = self.list_versions_inner(&mut session, product).await;
        close(session, outcome)
    }

    async fn list_versions_inner(&mut self, session: &mut AuditSession, product: Option<&str>) -> Outcome {
        let product = non_empty(product)
            .ok_or(AuditError::MissingInput("product"))?
            .to_lowercase();
        session.set_detail("product", json!(product));

        let (cycles, meta) = self.catalog.resolve(&product).await?;
        let today = self.today();
        let soon_days = self.config.audit.soon_days;

        let rows: Vec<CycleStatusRow<'_>> = cycles
            .iter()
            .map(|cycle| {
                let (support_status, eol_date) = classify(today, &cycle.eol, soon_days);
                CycleStatusRow {
                    cycle,
                    support_status,
                    eol_date,
                }
            })
            .collect();

        let any_due = rows
            .iter()
            .any(|r| matches!(r.support_status, SupportStatus::Soon | SupportStatus::Eol));

        session.set_detail("meta", serde_json::to_value(&meta)?);
        session.set_detail("soon_days", json!(soon_days));
        session.set_detail("rows", serde_json::to_value(&rows)?);

        Ok(if rows.is_empty() {
            (AuditStatus::Warning, format!("No EOL data for '{product}'"))
        } else {
            let status = if any_due {
                AuditStatus::Warning
            } else {
                AuditStatus::Success
            };
            (
                status,
                format!("EOL versions retrieved for '{product}' (mode {})", meta.api_mode),
            )
        })
    }

    // ── csv_to_report ───────────────────────────────────────────────

    /// Classify every component of the CSV inventory and write the report,
    /// optionally scanning `cidr` first.
    pub async fn csv_to_report(
        &mut self,
        csv_path: Option<&Path>,
        do_scan: bool,
        cidr: Option<&str>,
    ) -> AuditResult {
        let mut session = AuditSession::new(MODULE_NAME, "csv_to_report");
        let outcome = self
            .csv_to_report_inner(&mut session, csv_path, do_scan, cidr)
            .await;
        close(session, outcome)
    }

    async fn csv_to_report_inner(
        &mut self,
        session: &mut AuditSession,
        csv_path: Option<&Path>,
        do_scan: bool,
        cidr: Option<&str>,
    ) -> Outcome {
        let csv_path = csv_path
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(AuditError::MissingInput("csv_path"))?;
        session.set_detail("csv_path", json!(csv_path.display().to_string()));

        let cidr = if do_scan {
            Some(non_empty(cidr).ok_or(AuditError::MissingInput("cidr"))?)
        } else {
            None
        };
        let soon_days = self.config.audit.soon_days;
        session.set_detail("soon_days", json!(soon_days));

        let components = importer::read_components(csv_path)?;

        let (inventory, stats) = match cidr {
            Some(cidr) => {
                let (hosts, stats) = prober::scan_range(cidr, &self.config.scan).await?;
                (Some(hosts), Some(stats))
            }
            None => (None, None),
        };
        session.set_detail(
            "scan",
            json!({
                "enabled": do_scan,
                "stats": serde_json::to_value(&stats)?,
                "inventory_count": inventory.as_ref().map_or(0, Vec::len),
            }),
        );

        // One catalog lookup per distinct product, in first-seen order.
        let products: Vec<String> = {
            let mut seen = HashSet::new();
            components
                .iter()
                .filter(|c| seen.insert(c.product.as_str()))
                .map(|c| c.product.clone())
                .collect()
        };

        let mut cycles_by_product: HashMap<String, Vec<CycleRecord>> = HashMap::new();
        let mut sources = BTreeMap::new();
        let mut failed_products = BTreeMap::new();
        for product in products {
            match self.catalog.resolve(&product).await {
                Ok((cycles, meta)) => {
                    sources.insert(product.clone(), meta);
                    cycles_by_product.insert(product, cycles);
                }
                Err(e) => {
                    tracing::warn!(product = %product, error = %e, "Catalog lookup failed, components marked UNKNOWN");
                    failed_products.insert(product, e.to_string());
                }
            }
        }

        let today = self.today();
        let classified: Vec<ClassifiedComponent> = components
            .into_iter()
            .map(|component| {
                let matched = cycles_by_product
                    .get(&component.product)
                    .and_then(|cycles| match_cycle(cycles, &component.version));
                let (support_status, eol_date) = match matched {
                    Some(cycle) => classify(today, &cycle.eol, soon_days),
                    None => (SupportStatus::Unknown, None),
                };
                ClassifiedComponent {
                    component,
                    support_status,
                    eol_date,
                }
            })
            .collect();

        let report = report::build_report(ReportInput {
            generated_at: Utc::now(),
            soon_days,
            sources,
            failed_products,
            inventory,
            components: classified,
        });
        let run_tag = session.id().short();
        let (html_path, json_path) = report::write_report(self.report_dir(), &run_tag, &report)?;

        session.set_detail("meta_by_product", serde_json::to_value(&report.sources)?);
        if !report.failed_products.is_empty() {
            session.set_detail("failed_products", serde_json::to_value(&report.failed_products)?);
        }
        session.set_detail("components", serde_json::to_value(&report.components)?);
        session.set_detail(
            "report",
            json!({
                "counts": serde_json::to_value(report.counts)?,
                "report_path": html_path.display().to_string(),
                "json_path": json_path.display().to_string(),
            }),
        );
        session.add_artifact("audit_report_html", html_path.display().to_string());
        session.add_artifact("audit_report_json", json_path.display().to_string());

        let needs_attention = report
            .components
            .iter()
            .any(|c| c.support_status.needs_attention());
        Ok(if needs_attention {
            (
                AuditStatus::Warning,
                "Audit complete: EOL/SOON/UNKNOWN components detected".to_string(),
            )
        } else {
            (
                AuditStatus::Success,
                "Audit complete: no EOL/SOON component".to_string(),
            )
        })
    }
}

/// ERROR result for an action that never reached the engine, such as when
/// the configuration cannot be loaded.
pub fn startup_failure(action: &str, error: impl std::fmt::Display) -> AuditResult {
    let session = AuditSession::new(MODULE_NAME, action);
    tracing::error!(run_id = %session.id(), action, error = %error, "Audit action could not start");
    session.fail(error)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn close(session: AuditSession, outcome: Outcome) -> AuditResult {
    match outcome {
        Ok((status, summary)) => session.finish(status, summary),
        Err(e) => {
            tracing::error!(run_id = %session.id(), error = %e, "Audit action failed");
            session.fail(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_names() {
        assert_eq!(AuditAction::ScanRange { cidr: None }.name(), "scan_range");
        assert_eq!(
            AuditAction::ListVersionsEol { product: None }.name(),
            "list_versions_eol"
        );
        assert_eq!(
            AuditAction::CsvToReport {
                csv_path: None,
                do_scan: false,
                cidr: None
            }
            .name(),
            "csv_to_report"
        );
    }

    #[test]
    fn startup_failure_is_a_closed_error() {
        let result = startup_failure("scan_range", "Configuration error: invalid TOML");

        assert_eq!(result.status, AuditStatus::Error);
        assert_eq!(result.exit_code(), 2);
        assert!(result.is_closed());
        assert_eq!(result.module, MODULE_NAME);
        assert_eq!(result.details["action"], "scan_range");
        assert_eq!(result.details["error"], "Configuration error: invalid TOML");
        assert!(result.artifacts.is_empty());
    }

    #[test]
    fn blank_inputs_are_missing() {
        assert_eq!(non_empty(None), None);
        assert_eq!(non_empty(Some("   ")), None);
        assert_eq!(non_empty(Some(" 10.0.0.0/24 ")), Some("10.0.0.0/24"));
    }
}
