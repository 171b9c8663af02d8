//! eolwatch-discover: Lightweight network inventory.
//!
//! Probes every usable address of an IPv4 block with plain TCP connects
//! against a small port set, guesses each responsive host's OS from its
//! open ports, and writes the inventory as a JSON artifact.

pub mod config;
pub mod error;
pub mod inventory;
pub mod os_guess;
pub mod prober;
