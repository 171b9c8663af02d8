//! TCP-connect host prober.
//!
//! Every usable address of the block becomes one task. Tasks are admitted
//! through a semaphore sized by `workers`; inside a task the ports are tried
//! one after another, each connect bounded by the configured timeout.
//! Results are merged in the join loop, so no shared state is locked.

use std::collections::BTreeSet;
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use ipnet::{IpNet, Ipv4Net};
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use eolwatch_core::types::HostProbe;

use crate::config::ScanConfig;
use crate::error::{DiscoverError, Result};
use crate::inventory::InventoryStats;
use crate::os_guess::guess_os;

/// Outcome of a single connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortOutcome {
    Open,
    /// Refused or timed out.
    Closed,
    /// Any other socket failure (unreachable network, permission, ...).
    Error(io::ErrorKind),
}

/// Parse an IPv4 block. Host bits are dropped and a bare address is a /32.
pub fn parse_cidr(input: &str) -> Result<Ipv4Net> {
    let trimmed = input.trim();
    let invalid = |reason: String| DiscoverError::InvalidCidr {
        input: input.to_string(),
        reason,
    };

    if trimmed.contains('/') {
        return match trimmed.parse::<IpNet>() {
            Ok(IpNet::V4(net)) => Ok(net.trunc()),
            Ok(IpNet::V6(net)) => Err(DiscoverError::UnsupportedFamily(net.to_string())),
            Err(e) => Err(invalid(e.to_string())),
        };
    }

    match trimmed.parse::<IpAddr>() {
        Ok(IpAddr::V4(addr)) => Ipv4Net::new(addr, 32).map_err(|e| invalid(e.to_string())),
        Ok(IpAddr::V6(addr)) => Err(DiscoverError::UnsupportedFamily(addr.to_string())),
        Err(e) => Err(invalid(e.to_string())),
    }
}

/// Attempt one TCP connection.
pub async fn probe_port(addr: SocketAddr, timeout: Duration) -> PortOutcome {
    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => PortOutcome::Open,
        Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => PortOutcome::Closed,
        Ok(Err(e)) => PortOutcome::Error(e.kind()),
        Err(_elapsed) => PortOutcome::Closed,
    }
}

/// Probe `ports` on `ip` sequentially. Returns `None` when nothing is open.
pub async fn probe_host(ip: Ipv4Addr, ports: &[u16], timeout: Duration) -> Option<HostProbe> {
    let mut open_ports = BTreeSet::new();

    for &port in ports {
        match probe_port(SocketAddr::new(IpAddr::V4(ip), port), timeout).await {
            PortOutcome::Open => {
                open_ports.insert(port);
            }
            PortOutcome::Closed => {}
            PortOutcome::Error(kind) => {
                tracing::trace!(ip = %ip, port, error = ?kind, "Probe failed");
            }
        }
    }

    if open_ports.is_empty() {
        return None;
    }

    let os_guess = guess_os(&open_ports);
    Some(HostProbe {
        ip,
        open_ports,
        os_guess,
    })
}

/// Probe every usable address of `cidr`.
///
/// Hosts without an open port are omitted; the rest are sorted by numeric
/// address.
pub async fn scan_range(cidr: &str, config: &ScanConfig) -> Result<(Vec<HostProbe>, InventoryStats)> {
    let net = parse_cidr(cidr)?;
    let timeout = config.timeout();
    let workers = config.effective_workers();
    let ports: Arc<[u16]> = config.ports.clone().into();
    let semaphore = Arc::new(Semaphore::new(workers));
    let start = Instant::now();

    tracing::info!(
        cidr = %net,
        ports = ?config.ports,
        workers,
        timeout_ms = timeout.as_millis(),
        "Starting range scan"
    );

    let mut tasks = JoinSet::new();
    let mut hosts = Vec::new();

    for ip in net.hosts() {
        let Ok(permit) = Arc::clone(&semaphore).acquire_owned().await else {
            break;
        };
        let ports = Arc::clone(&ports);
        tasks.spawn(async move {
            let _permit = permit;
            probe_host(ip, &ports, timeout).await
        });

        while let Some(joined) = tasks.try_join_next() {
            collect(joined, &mut hosts);
        }
    }

    while let Some(joined) = tasks.join_next().await {
        collect(joined, &mut hosts);
    }

    hosts.sort_by_key(|h| u32::from(h.ip));

    tracing::info!(
        cidr = %net,
        found_hosts = hosts.len(),
        duration_ms = start.elapsed().as_millis(),
        "Range scan complete"
    );

    let stats = InventoryStats {
        cidr: net.to_string(),
        found_hosts: hosts.len(),
        ports_checked: config.ports.clone(),
        timeout_s: timeout.as_secs_f64(),
        workers,
    };
    Ok((hosts, stats))
}

fn collect(joined: std::result::Result<Option<HostProbe>, tokio::task::JoinError>, hosts: &mut Vec<HostProbe>) {
    match joined {
        Ok(Some(host)) => {
            tracing::debug!(ip = %host.ip, ports = %host.ports_display(), os = %host.os_guess, "Host responded");
            hosts.push(host);
        }
        Ok(None) => {}
        Err(e) => tracing::error!(error = %e, "Host probe task panicked"),
    }
}
