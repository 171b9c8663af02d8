//! Catalog client: cache lookup, v1 product endpoint, legacy fallback.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::cache::{CacheEntry, CatalogCache, FileCache};
use crate::cycles::CycleRecord;
use crate::transport::{CatalogTransport, ReqwestTransport};

/// Errors from catalog operations.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Invalid JSON from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid product name: {0:?}")]
    InvalidProduct(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Cache error: {0}")]
    Cache(String),
}

/// Which protocol generation produced a result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ApiMode {
    V1,
    V0,
    Cache,
}

impl fmt::Display for ApiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::V1 => "v1",
            Self::V0 => "v0",
            Self::Cache => "cache",
        })
    }
}

/// Provenance of a resolved product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogMeta {
    pub source: String,
    pub fetched_at_iso: String,
    pub api_mode: ApiMode,
    /// For cache hits, the generation that originally produced the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached_from: Option<ApiMode>,
}

/// Configuration for the catalog client.
///
/// Loaded from the `[catalog]` config section or `EOLWATCH__CATALOG__*`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// API root, without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Source label recorded in metadata and reports.
    #[serde(default = "default_source")]
    pub source: String,

    /// Location of the JSON cache file.
    #[serde(default = "default_cache_path")]
    pub cache_path: String,

    /// Cache validity window in hours.
    #[serde(default = "default_cache_ttl_hours")]
    pub cache_ttl_hours: u64,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://endoflife.date".to_string()
}

fn default_source() -> String {
    "endoflife.date".to_string()
}

fn default_cache_path() -> String {
    "reports/audit/eol_cache.json".to_string()
}

fn default_cache_ttl_hours() -> u64 {
    24
}

fn default_timeout_secs() -> u64 {
    8
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            source: default_source(),
            cache_path: default_cache_path(),
            cache_ttl_hours: default_cache_ttl_hours(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl CatalogConfig {
    fn root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    pub fn v1_url(&self, product: &str) -> String {
        format!("{}/api/v1/products/{product}/", self.root())
    }

    pub fn v0_url(&self, product: &str) -> String {
        format!("{}/api/{product}.json", self.root())
    }

    pub fn ttl(&self) -> TimeDelta {
        TimeDelta::try_hours(self.cache_ttl_hours as i64).unwrap_or(TimeDelta::MAX)
    }
}

/// Resolves products to release cycles.
///
/// Owns its cache exclusively. Requests are issued one at a time by the
/// caller, so no internal locking is needed.
pub struct CatalogClient {
    config: CatalogConfig,
    transport: Arc<dyn CatalogTransport>,
    cache: Box<dyn CatalogCache>,
}

impl CatalogClient {
    pub fn new(
        config: CatalogConfig,
        transport: Arc<dyn CatalogTransport>,
        cache: Box<dyn CatalogCache>,
    ) -> Self {
        Self {
            config,
            transport,
            cache,
        }
    }

    /// Production client: reqwest transport and the configured file cache.
    pub fn from_config(config: CatalogConfig) -> Result<Self, CatalogError> {
        let transport = ReqwestTransport::new(Duration::from_secs(config.timeout_secs))?;
        let cache = FileCache::open(&config.cache_path);
        Ok(Self::new(config, Arc::new(transport), Box::new(cache)))
    }

    /// Resolve `product` to its cycles.
    ///
    /// Order: fresh cache entry, then the v1 endpoint (accepted only as a
    /// 200 with a JSON list; any failure falls through), then the legacy
    /// endpoint, whose failure is returned to the caller.
    pub async fn resolve(
        &mut self,
        product: &str,
    ) -> Result<(Vec<CycleRecord>, CatalogMeta), CatalogError> {
        let product = normalize_product(product)?;

        if let Some(entry) = self.cache.get(&product) {
            if entry.is_fresh(Utc::now(), self.config.ttl()) {
                tracing::debug!(product = %product, "Catalog cache hit");
                let meta = CatalogMeta {
                    source: entry.source.clone(),
                    fetched_at_iso: entry.fetched_at_iso.clone(),
                    api_mode: ApiMode::Cache,
                    cached_from: Some(entry.api_mode),
                };
                return Ok((CycleRecord::from_raw_list(&entry.data), meta));
            }
            tracing::debug!(product = %product, "Catalog cache entry expired");
        }

        let fetched_at_iso = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);

        if let Some(data) = self.fetch_v1(&product).await {
            return Ok(self.store(&product, data, fetched_at_iso, ApiMode::V1));
        }

        let data = self.fetch_v0(&product).await?;
        Ok(self.store(&product, data, fetched_at_iso, ApiMode::V0))
    }

    async fn fetch_v1(&self, product: &str) -> Option<Vec<Value>> {
        let url = self.config.v1_url(product);
        let reply = match self.transport.get(&url).await {
            Ok(r) => r,
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "v1 request failed, falling back");
                return None;
            }
        };

        if reply.status != 200 {
            tracing::debug!(url = %url, status = reply.status, "v1 non-200, falling back");
            return None;
        }

        match serde_json::from_str::<Value>(&reply.body) {
            Ok(Value::Array(items)) => Some(items),
            Ok(_) => {
                tracing::debug!(url = %url, "v1 payload is not a list, falling back");
                None
            }
            Err(e) => {
                tracing::debug!(url = %url, error = %e, "v1 payload unparsable, falling back");
                None
            }
        }
    }

    async fn fetch_v0(&self, product: &str) -> Result<Vec<Value>, CatalogError> {
        let url = self.config.v0_url(product);
        let reply = self.transport.get(&url).await?;

        if !reply.is_success() {
            return Err(CatalogError::Status {
                url,
                status: reply.status,
            });
        }

        let payload: Value =
            serde_json::from_str(&reply.body).map_err(|source| CatalogError::Parse {
                url: url.clone(),
                source,
            })?;

        Ok(match payload {
            Value::Array(items) => items,
            _ => {
                tracing::warn!(url = %url, "Legacy payload is not a list, treating as empty");
                Vec::new()
            }
        })
    }

    /// Overwrite the cache entry and build the response.
    fn store(
        &mut self,
        product: &str,
        data: Vec<Value>,
        fetched_at_iso: String,
        api_mode: ApiMode,
    ) -> (Vec<CycleRecord>, CatalogMeta) {
        let cycles = CycleRecord::from_raw_list(&data);
        let meta = CatalogMeta {
            source: self.config.source.clone(),
            fetched_at_iso: fetched_at_iso.clone(),
            api_mode,
            cached_from: None,
        };

        let entry = CacheEntry {
            data,
            fetched_at_iso,
            source: self.config.source.clone(),
            api_mode,
        };
        if let Err(e) = self.cache.put(product, entry) {
            tracing::warn!(product = %product, error = %e, "Failed to write catalog cache");
        }

        tracing::info!(
            product = %product,
            api_mode = %api_mode,
            cycles = cycles.len(),
            "Catalog fetched"
        );

        (cycles, meta)
    }
}

/// Trim and lowercase a product key, rejecting anything that is not a
/// plain slug so it can be placed in a URL path.
fn normalize_product(product: &str) -> Result<String, CatalogError> {
    let key = product.trim().to_lowercase();
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '+'))
        && key != "."
        && key != "..";
    if valid {
        Ok(key)
    } else {
        Err(CatalogError::InvalidProduct(product.to_string()))
    }
}
