//! Inventory artifact: scan stats plus responsive hosts, written as JSON.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use eolwatch_core::fsio;
use eolwatch_core::types::HostProbe;

use crate::error::Result;

/// Summary of one range scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryStats {
    pub cidr: String,
    pub found_hosts: usize,
    pub ports_checked: Vec<u16>,
    pub timeout_s: f64,
    pub workers: usize,
}

#[derive(Serialize)]
struct InventoryFile<'a> {
    stats: &'a InventoryStats,
    inventory: &'a [HostProbe],
}

/// Write `inventory_<YYYYmmdd_HHMMSS>_<run_tag>.json` under `dir` and return
/// its path. `run_tag` keeps runs started in the same second apart.
pub fn write_inventory(
    dir: &Path,
    run_tag: &str,
    stats: &InventoryStats,
    hosts: &[HostProbe],
) -> Result<PathBuf> {
    let path = dir.join(format!(
        "inventory_{}_{run_tag}.json",
        Utc::now().format("%Y%m%d_%H%M%S")
    ));
    fsio::write_json_atomic(&path, &InventoryFile { stats, inventory: hosts })?;
    tracing::info!(path = %path.display(), hosts = hosts.len(), "Inventory written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use eolwatch_core::types::OsGuess;
    use std::collections::BTreeSet;
    use std::net::Ipv4Addr;

    #[test]
    fn inventory_file_layout() {
        let dir = tempfile::tempdir().unwrap();
        let stats = InventoryStats {
            cidr: "192.168.10.0/24".into(),
            found_hosts: 1,
            ports_checked: vec![22, 445],
            timeout_s: 0.4,
            workers: 120,
        };
        let hosts = vec![HostProbe {
            ip: Ipv4Addr::new(192, 168, 10, 10),
            open_ports: BTreeSet::from([445, 22]),
            os_guess: OsGuess::Windows,
        }];

        let path = write_inventory(&dir.path().join("audit"), "3f2a9c1d", &stats, &hosts).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("inventory_") && name.ends_with("_3f2a9c1d.json"));

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["stats"]["cidr"], "192.168.10.0/24");
        assert_eq!(value["stats"]["timeout_s"], 0.4);
        assert_eq!(value["inventory"][0]["ip"], "192.168.10.10");
        assert_eq!(value["inventory"][0]["open_ports"], serde_json::json!([22, 445]));
        assert_eq!(value["inventory"][0]["os_guess"], "windows");
    }

    #[test]
    fn runs_in_the_same_second_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let stats = InventoryStats {
            cidr: "10.0.0.0/30".into(),
            found_hosts: 0,
            ports_checked: vec![22],
            timeout_s: 0.4,
            workers: 1,
        };

        let first = write_inventory(dir.path(), "aaaaaaaa", &stats, &[]).unwrap();
        let second = write_inventory(dir.path(), "bbbbbbbb", &stats, &[]).unwrap();
        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
    }
}
