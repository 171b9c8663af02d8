//! eolwatch-core: Shared types, configuration, and error handling for eolwatch.
//!
//! This crate provides the foundational pieces used across all eolwatch crates:
//! - Domain types (host probes, components, support status)
//! - Layered configuration loading
//! - Atomic file writes for artifacts and caches
//! - Common error types

pub mod config;
pub mod error;
pub mod fsio;
pub mod types;

pub use error::EolwatchError;
