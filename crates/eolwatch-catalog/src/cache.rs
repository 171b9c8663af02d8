//! Catalog cache: a trait plus file and in-memory implementations.
//!
//! The file cache keeps every product in a single JSON map:
//! ```text
//! {
//!   "mysql": {
//!     "data": [ { "cycle": "8.0", "eol": "2026-04-30", ... } ],
//!     "fetched_at_iso": "2026-02-12T12:00:00Z",
//!     "source": "endoflife.date",
//!     "api_mode": "v0"
//!   }
//! }
//! ```
//! The file is read once when the cache is opened and rewritten atomically
//! after every successful fetch.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use eolwatch_core::fsio;

use crate::client::{ApiMode, CatalogError};

/// One cached catalog response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CacheEntry {
    /// Raw cycle objects, exactly as the catalog returned them.
    pub data: Vec<Value>,
    pub fetched_at_iso: String,
    pub source: String,
    pub api_mode: ApiMode,
}

impl CacheEntry {
    /// Fetch timestamp. RFC 3339 is expected; naive `YYYY-MM-DDTHH:MM:SS`
    /// stamps are read as UTC.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.fetched_at_iso.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    /// Whether the entry is still within `ttl` of its fetch time.
    /// Entries with an unreadable timestamp are never fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        match self.fetched_at() {
            Some(fetched) => now - fetched <= ttl,
            None => false,
        }
    }
}

/// Storage backend for catalog responses, keyed by product.
pub trait CatalogCache: Send {
    fn get(&self, product: &str) -> Option<CacheEntry>;

    /// Store or overwrite the entry for `product`.
    fn put(&mut self, product: &str, entry: CacheEntry) -> Result<(), CatalogError>;
}

/// Process-local cache, used when persistence is not wanted.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: BTreeMap<String, CacheEntry>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogCache for MemoryCache {
    fn get(&self, product: &str) -> Option<CacheEntry> {
        self.entries.get(product).cloned()
    }

    fn put(&mut self, product: &str, entry: CacheEntry) -> Result<(), CatalogError> {
        self.entries.insert(product.to_string(), entry);
        Ok(())
    }
}

/// JSON-file cache shared across runs.
#[derive(Debug)]
pub struct FileCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl FileCache {
    /// Open the cache at `path`. A missing, unreadable or corrupt file
    /// yields an empty cache; malformed entries are skipped individually.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        tracing::debug!(path = %path.display(), products = entries.len(), "Catalog cache opened");
        Self { path, entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CatalogCache for FileCache {
    fn get(&self, product: &str) -> Option<CacheEntry> {
        self.entries.get(product).cloned()
    }

    fn put(&mut self, product: &str, entry: CacheEntry) -> Result<(), CatalogError> {
        self.entries.insert(product.to_string(), entry);
        fsio::write_json_atomic(&self.path, &self.entries)
            .map_err(|e| CatalogError::Cache(e.to_string()))
    }
}

fn load_entries(path: &Path) -> BTreeMap<String, CacheEntry> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Catalog cache unreadable, ignoring");
            return BTreeMap::new();
        }
    };

    let raw: BTreeMap<String, Value> = match serde_json::from_str(&content) {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Catalog cache corrupt, ignoring");
            return BTreeMap::new();
        }
    };

    raw.into_iter()
        .filter_map(|(product, value)| match serde_json::from_value::<CacheEntry>(value) {
            Ok(entry) => Some((product, entry)),
            Err(e) => {
                tracing::debug!(product = %product, error = %e, "Skipping malformed cache entry");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(fetched_at_iso: &str) -> CacheEntry {
        CacheEntry {
            data: vec![json!({"cycle": "5.7", "eol": "2023-10-21"})],
            fetched_at_iso: fetched_at_iso.to_string(),
            source: "endoflife.date".to_string(),
            api_mode: ApiMode::V0,
        }
    }

    #[test]
    fn freshness_window() {
        let now = Utc::now();
        let fresh = entry(&(now - TimeDelta::hours(1)).to_rfc3339());
        let stale = entry(&(now - TimeDelta::hours(25)).to_rfc3339());

        assert!(fresh.is_fresh(now, TimeDelta::hours(24)));
        assert!(!stale.is_fresh(now, TimeDelta::hours(24)));
    }

    #[test]
    fn naive_timestamps_are_read_as_utc() {
        let e = entry("2026-02-12T12:00:00");
        let ts = e.fetched_at().unwrap();
        assert_eq!(ts.to_rfc3339(), "2026-02-12T12:00:00+00:00");
    }

    #[test]
    fn garbage_timestamp_is_never_fresh() {
        assert!(!entry("yesterday").is_fresh(Utc::now(), TimeDelta::hours(24)));
    }

    #[test]
    fn file_cache_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit/eol_cache.json");

        let mut cache = FileCache::open(&path);
        assert!(cache.is_empty());
        cache.put("mysql", entry("2026-02-12T12:00:00Z")).unwrap();

        let reopened = FileCache::open(&path);
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get("mysql").unwrap().api_mode, ApiMode::V0);
    }

    #[test]
    fn corrupt_file_is_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eol_cache.json");
        fs::write(&path, "{ not json").unwrap();

        let cache = FileCache::open(&path);
        assert!(cache.is_empty());
    }

    #[test]
    fn malformed_entries_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eol_cache.json");
        let content = json!({
            "mysql": {
                "data": [],
                "fetched_at_iso": "2026-02-12T12:00:00Z",
                "source": "endoflife.date",
                "api_mode": "v1"
            },
            "python": { "data": "oops" }
        });
        fs::write(&path, content.to_string()).unwrap();

        let cache = FileCache::open(&path);
        assert!(cache.get("mysql").is_some());
        assert!(cache.get("python").is_none());
    }

    #[test]
    fn cache_file_uses_wire_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eol_cache.json");
        let mut cache = FileCache::open(&path);
        cache.put("python", entry("2026-02-12T12:00:00Z")).unwrap();

        let value: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let python = &value["python"];
        assert_eq!(python["api_mode"], "v0");
        assert_eq!(python["source"], "endoflife.date");
        assert!(python["data"].is_array());
        assert!(python["fetched_at_iso"].is_string());
    }
}
