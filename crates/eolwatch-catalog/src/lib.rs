//! eolwatch-catalog: endoflife.date client for release cycles.
//!
//! This crate is the single owner of the catalog cache. Lookups go through
//! [`CatalogClient::resolve`], which consults the TTL cache, then the v1
//! product endpoint, then the legacy per-product endpoint.

pub mod cache;
pub mod client;
pub mod cycles;
pub mod status;
pub mod transport;

pub use cache::{CacheEntry, CatalogCache, FileCache, MemoryCache};
pub use client::{ApiMode, CatalogClient, CatalogConfig, CatalogError, CatalogMeta};
pub use cycles::{match_cycle, CycleRecord, EolField};
pub use status::{classify, DEFAULT_SOON_DAYS};
pub use transport::{CatalogTransport, HttpReply, ReqwestTransport};
