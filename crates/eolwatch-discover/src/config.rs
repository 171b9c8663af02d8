//! Configuration for the eolwatch-discover prober.

use std::time::Duration;

use serde::Deserialize;

/// Probe settings.
///
/// Loaded from the `[scan]` section of `eolwatch.toml` or
/// `EOLWATCH__SCAN__` environment variables.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ScanConfig {
    /// TCP ports probed on every host.
    #[serde(default = "default_ports")]
    pub ports: Vec<u16>,

    /// Per-connection timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,

    /// Maximum hosts probed concurrently.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl ScanConfig {
    /// Connection timeout. Negative or non-finite values fall back to the default.
    pub fn timeout(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_timeout_secs()))
    }

    /// Worker count, never below one.
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ports: default_ports(),
            timeout_secs: default_timeout_secs(),
            workers: default_workers(),
        }
    }
}

fn default_ports() -> Vec<u16> {
    vec![22, 53, 80, 443, 389, 445, 3389, 3306]
}

fn default_timeout_secs() -> f64 {
    0.4
}

fn default_workers() -> usize {
    120
}
