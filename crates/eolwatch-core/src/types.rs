//! Core domain types shared by the scanner, catalog, and audit crates.

use std::collections::BTreeSet;
use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

// ── Inventory ─────────────────────────────────────────────────────

/// Best-guess operating system derived from a host's open ports.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OsGuess {
    #[serde(rename = "windows")]
    Windows,
    #[serde(rename = "windows-server (dc/dns probable)")]
    WindowsServer,
    #[serde(rename = "linux")]
    Linux,
    #[serde(rename = "unknown")]
    Unknown,
}

impl OsGuess {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::WindowsServer => "windows-server (dc/dns probable)",
            Self::Linux => "linux",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for OsGuess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A responsive host found by the prober. Only hosts with at least one
/// open port are ever constructed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HostProbe {
    pub ip: Ipv4Addr,
    pub open_ports: BTreeSet<u16>,
    pub os_guess: OsGuess,
}

impl HostProbe {
    /// Comma-separated port list, ascending.
    pub fn ports_display(&self) -> String {
        self.open_ports
            .iter()
            .map(u16::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }
}

// ── Components ────────────────────────────────────────────────────

/// A component declared in the CSV inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    /// Catalog product key, always lowercase.
    pub product: String,
    pub version: String,
}

/// Support status of a component or release cycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum SupportStatus {
    Ok,
    Soon,
    Eol,
    Unknown,
}

impl SupportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Soon => "SOON",
            Self::Eol => "EOL",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// SOON, EOL and UNKNOWN all need an operator's attention.
    pub fn needs_attention(&self) -> bool {
        !matches!(self, Self::Ok)
    }
}

impl fmt::Display for SupportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A component after cycle matching and status classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassifiedComponent {
    #[serde(flatten)]
    pub component: Component,
    pub support_status: SupportStatus,
    pub eol_date: Option<String>,
}

/// Per-status tallies, serialized with the status names as keys.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCounts {
    #[serde(rename = "OK")]
    pub ok: usize,
    #[serde(rename = "SOON")]
    pub soon: usize,
    #[serde(rename = "EOL")]
    pub eol: usize,
    #[serde(rename = "UNKNOWN")]
    pub unknown: usize,
}

impl StatusCounts {
    pub fn record(&mut self, status: SupportStatus) {
        match status {
            SupportStatus::Ok => self.ok += 1,
            SupportStatus::Soon => self.soon += 1,
            SupportStatus::Eol => self.eol += 1,
            SupportStatus::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.ok + self.soon + self.eol + self.unknown
    }
}

impl<'a> FromIterator<&'a SupportStatus> for StatusCounts {
    fn from_iter<I: IntoIterator<Item = &'a SupportStatus>>(iter: I) -> Self {
        let mut counts = Self::default();
        for status in iter {
            counts.record(*status);
        }
        counts
    }
}
