//! Bounded cache of decoded condition icons.
//!
//! Entries are keyed by the absolute icon URL and weighted by the byte size
//! of the fetched asset. Two caps apply at once (entry count and total byte
//! cost); both are folded into the cache weigher by giving every entry a
//! minimum weight of `max_bytes / max_entries`.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use image::RgbaImage;
use moka::{future::Cache, policy::EvictionPolicy};
use reqwest::Url;
use tracing::{debug, instrument, warn};

use crate::{
    WeatherError,
    config::{Config, IconCacheConfig},
    http::{AssetSource, HttpFetcher},
};

/// A decoded icon. Cloning is cheap; pixels are shared.
#[derive(Debug, Clone)]
pub struct Icon {
    pub url: String,
    pub image: Arc<RgbaImage>,
    /// Size of the encoded asset in bytes.
    pub cost: u32,
}

impl Icon {
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IconCacheStats {
    pub entries: u64,
    pub weighted_size: u64,
    pub hits: u64,
    pub misses: u64,
}

pub struct IconCache {
    base_url: String,
    source: Arc<dyn AssetSource>,
    cache: Cache<String, Icon>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl fmt::Debug for IconCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IconCache")
            .field("base_url", &self.base_url)
            .field("entries", &self.cache.entry_count())
            .field("hits", &self.hits.load(Ordering::Relaxed))
            .field("misses", &self.misses.load(Ordering::Relaxed))
            .finish()
    }
}

impl IconCache {
    /// `base_url` is the icon root, e.g. `https://openweathermap.org/img/wn`.
    pub fn new(base_url: &str, limits: IconCacheConfig, source: Arc<dyn AssetSource>) -> Self {
        let max_entries = limits.max_entries.max(1);
        let max_bytes = limits.max_bytes.max(1);
        let floor = u32::try_from(max_bytes.div_ceil(max_entries)).unwrap_or(u32::MAX);

        let cache = Cache::builder()
            .max_capacity(max_bytes)
            .eviction_policy(EvictionPolicy::lru())
            .weigher(move |_key: &String, icon: &Icon| -> u32 { icon.cost.max(floor) })
            .build();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            source,
            cache,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.icon_base_url, config.icon_cache, Arc::new(HttpFetcher::new()))
    }

    /// Resolve an icon code to a decoded image, fetching on a cache miss.
    ///
    /// Concurrent misses for the same code share a single fetch.
    #[instrument(skip(self))]
    pub async fn resolve(&self, icon_code: &str) -> Result<Icon, WeatherError> {
        let url = self.icon_url(icon_code)?;
        let key = url.to_string();

        if let Some(icon) = self.cache.get(&key).await {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "icon cache hit");
            return Ok(icon);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(key = %key, "icon cache miss");

        self.cache
            .try_get_with(key, self.load(url))
            .await
            .map_err(|e| (*e).clone())
    }

    /// Counters and sizes after pending evictions have been applied.
    pub async fn stats(&self) -> IconCacheStats {
        self.cache.run_pending_tasks().await;

        IconCacheStats {
            entries: self.cache.entry_count(),
            weighted_size: self.cache.weighted_size(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn icon_url(&self, icon_code: &str) -> Result<Url, WeatherError> {
        let code = icon_code.trim();
        if code.is_empty() {
            return Err(WeatherError::empty_icon_code());
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(WeatherError::InvalidAsset(format!("malformed icon code '{code}'")));
        }

        let raw = format!("{}/{code}@2x.png", self.base_url);
        let url = Url::parse(&raw)
            .map_err(|e| WeatherError::InvalidAsset(format!("malformed icon URL '{raw}': {e}")))?;

        if url.scheme() != "https" {
            return Err(WeatherError::InvalidAsset(format!("refusing insecure icon URL '{url}'")));
        }

        Ok(url)
    }

    async fn load(&self, url: Url) -> Result<Icon, WeatherError> {
        let bytes = self.source.fetch_asset(&url).await?;
        let cost = u32::try_from(bytes.len()).unwrap_or(u32::MAX);

        let image = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| WeatherError::Unknown(format!("icon decode task failed: {e}")))?
            .map_err(|e| {
                warn!(url = %url, error = %e, "icon bytes are not a decodable image");
                WeatherError::InvalidAsset(format!("undecodable image data: {e}"))
            })?
            .to_rgba8();

        debug!(url = %url, cost, "icon decoded");

        Ok(Icon { url: url.to_string(), image: Arc::new(image), cost })
    }
}
