//! Port-based OS heuristic.

use std::collections::BTreeSet;

use eolwatch_core::types::OsGuess;

const WINDOWS_PORTS: [u16; 3] = [3389, 445, 139];
const SERVER_PORTS: [u16; 2] = [53, 389];

/// Guess a host's OS from its open ports. First matching rule wins.
pub fn guess_os(open_ports: &BTreeSet<u16>) -> OsGuess {
    let any = |ports: &[u16]| ports.iter().any(|p| open_ports.contains(p));

    if any(&WINDOWS_PORTS) {
        OsGuess::Windows
    } else if any(&SERVER_PORTS) {
        OsGuess::WindowsServer
    } else if open_ports.contains(&22) {
        OsGuess::Linux
    } else {
        OsGuess::Unknown
    }
}
