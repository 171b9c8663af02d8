//! CLI entry point for the eolwatch obsolescence audit.
//!
//! Logs go to stderr; stdout carries a one-line summary followed by the
//! result as JSON. The exit code mirrors the result status.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use eolwatch_audit::config::AuditSettings;
use eolwatch_audit::{startup_failure, AuditAction, AuditConfig, AuditEngine};
use eolwatch_core::config::DEFAULT_FILE_PREFIX;
use eolwatch_record::store::{JsonResultStore, ResultStore};
use eolwatch_record::AuditResult;

#[derive(Parser)]
#[command(name = "eolwatch")]
#[command(about = "Network inventory and end-of-life audit")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: eolwatch).
    #[arg(short, long, default_value = DEFAULT_FILE_PREFIX, global = true)]
    config: String,

    /// Days before an EOL date that count as SOON.
    #[arg(long, global = true)]
    soon_days: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// Probe an IPv4 range and write an inventory.
    Scan {
        /// Range to scan (default: audit.scan_cidr).
        #[arg(long)]
        cidr: Option<String>,
    },
    /// List a product's release cycles with their support status.
    Versions {
        /// Catalog product key, e.g. "mysql" or "windows-server".
        #[arg(long)]
        product: String,
    },
    /// Classify a CSV component inventory and write the HTML report.
    Report {
        /// Component CSV (default: audit.components_csv).
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Also scan the network and include the inventory.
        #[arg(long)]
        scan: bool,
        /// Range to scan with --scan (default: audit.scan_cidr).
        #[arg(long)]
        cidr: Option<String>,
    },
}

impl Command {
    fn action_name(&self) -> &'static str {
        match self {
            Self::Scan { .. } => "scan_range",
            Self::Versions { .. } => "list_versions_eol",
            Self::Report { .. } => "csv_to_report",
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();

    // A broken config still yields a persisted ERROR result and exit code 2.
    let (result, results_dir) = match AuditConfig::load(&cli.config) {
        Ok(config) => run(cli, config).await,
        Err(e) => (
            startup_failure(cli.command.action_name(), e),
            AuditSettings::default().results_dir,
        ),
    };

    let store = JsonResultStore::new(&results_dir);
    match store.save(&result) {
        Ok(path) => tracing::info!(path = %path.display(), "Result saved"),
        Err(e) => tracing::warn!(error = %e, "Failed to save result"),
    }

    println!("[{}] {}", result.status, result.summary);
    println!("{}", serde_json::to_string_pretty(&result)?);

    Ok(ExitCode::from(result.exit_code()))
}

/// Resolve CLI defaults from `config` and run the action.
/// Returns the result and the directory it should be saved under.
async fn run(cli: Cli, mut config: AuditConfig) -> (AuditResult, String) {
    if let Some(days) = cli.soon_days {
        config.audit.soon_days = days;
    }

    let action = match cli.command {
        Command::Scan { cidr } => AuditAction::ScanRange {
            cidr: Some(cidr.unwrap_or_else(|| config.audit.scan_cidr.clone())),
        },
        Command::Versions { product } => AuditAction::ListVersionsEol {
            product: Some(product),
        },
        Command::Report { csv, scan, cidr } => AuditAction::CsvToReport {
            csv_path: Some(csv.unwrap_or_else(|| PathBuf::from(&config.audit.components_csv))),
            do_scan: scan,
            cidr: scan.then(|| cidr.unwrap_or_else(|| config.audit.scan_cidr.clone())),
        },
    };

    let results_dir = config.audit.results_dir.clone();
    let result = match AuditEngine::from_config(config) {
        Ok(mut engine) => engine.run(action).await,
        Err(e) => startup_failure(action.name(), e),
    };
    (result, results_dir)
}
