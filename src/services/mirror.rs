//! Mirror resolution with a time-bounded cache.
//!
//! Each provider lists interchangeable base addresses. The first one that
//! answers with a success or redirect status is cached for the positive TTL.
//! When none answers, the first listed address is returned anyway and cached
//! for the short negative TTL, so searches degrade to "try anyway" instead of
//! being refused.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::services::cache::TtlCache;
use crate::services::error::ProviderError;
use crate::services::http::{is_reachable_status, Fetch};
use crate::services::metrics;

/// Snapshot of the cached choice for one provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorCacheEntry {
    pub provider_name: String,
    pub chosen_base_address: String,
    pub expires_at: Instant,
}

#[derive(Debug, Clone)]
pub struct MirrorSettings {
    pub ttl: Duration,
    pub negative_ttl: Duration,
    pub capacity: usize,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30 * 60),
            negative_ttl: Duration::from_secs(60),
            capacity: 64,
        }
    }
}

pub struct MirrorResolver {
    fetch: Arc<dyn Fetch>,
    mirrors: HashMap<String, Vec<String>>,
    cache: TtlCache<String, String>,
    settings: MirrorSettings,
}

impl MirrorResolver {
    pub fn new(fetch: Arc<dyn Fetch>, settings: MirrorSettings) -> Self {
        Self {
            fetch,
            mirrors: HashMap::new(),
            cache: TtlCache::new(settings.capacity),
            settings,
        }
    }

    /// Register a provider's candidate base addresses, in preference order
    pub fn register<I, S>(&mut self, provider: &str, bases: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let bases: Vec<String> = bases
            .into_iter()
            .map(|b| b.into().trim().trim_end_matches('/').to_string())
            .filter(|b| !b.is_empty())
            .collect();
        self.mirrors.insert(provider.to_string(), bases);
    }

    /// Current base address for `provider`.
    ///
    /// Errors only when the provider has no addresses configured; an outage
    /// of every mirror still yields the first address.
    pub async fn resolve_base(&self, provider: &str) -> Result<String, ProviderError> {
        let key = provider.to_string();
        if let Some(base) = self.cache.get(&key) {
            debug!(provider = provider, base = %base, "mirror cache hit");
            return Ok(base);
        }

        let bases = self
            .mirrors
            .get(provider)
            .filter(|bases| !bases.is_empty())
            .ok_or_else(|| ProviderError::NoReachableMirror(provider.to_string()))?;

        for base in bases {
            match self.fetch.probe(base).await {
                Ok(status) if is_reachable_status(status) => {
                    metrics::record_probe(provider, true);
                    info!(provider = provider, base = %base, status = status, "mirror selected");
                    self.cache.insert(key, base.clone(), self.settings.ttl);
                    return Ok(base.clone());
                }
                Ok(status) => {
                    metrics::record_probe(provider, false);
                    debug!(provider = provider, base = %base, status = status, "mirror rejected");
                }
                Err(e) => {
                    metrics::record_probe(provider, false);
                    debug!(provider = provider, base = %base, error = %e, "mirror probe failed");
                }
            }
        }

        let fallback = bases[0].clone();
        warn!(
            provider = provider,
            base = %fallback,
            "no mirror reachable, using first address unverified"
        );
        self.cache
            .insert(key, fallback.clone(), self.settings.negative_ttl);
        Ok(fallback)
    }

    /// Forget the cached choice, forcing a re-probe on next use
    pub fn invalidate(&self, provider: &str) {
        if self.cache.remove(&provider.to_string()).is_some() {
            info!(provider = provider, "mirror cache invalidated");
        }
    }

    pub fn cached(&self, provider: &str) -> Option<MirrorCacheEntry> {
        self.cache
            .get_entry(&provider.to_string())
            .map(|entry| MirrorCacheEntry {
                provider_name: provider.to_string(),
                chosen_base_address: entry.value,
                expires_at: entry.expires_at,
            })
    }

    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::http::testing::FakeFetch;

    fn resolver(fetch: Arc<FakeFetch>) -> MirrorResolver {
        let mut resolver = MirrorResolver::new(fetch, MirrorSettings::default());
        resolver.register(
            "hub",
            ["https://hub.one/", "https://hub.two", "https://hub.three"],
        );
        resolver
    }

    #[tokio::test(start_paused = true)]
    async fn test_picks_first_reachable_and_caches() {
        let fetch = Arc::new(
            FakeFetch::new()
                .status("https://hub.one", 521)
                .status("https://hub.two", 301)
                .status("https://hub.three", 200),
        );
        let resolver = resolver(fetch.clone());

        assert_eq!(resolver.resolve_base("hub").await.unwrap(), "https://hub.two");
        assert_eq!(resolver.resolve_base("hub").await.unwrap(), "https://hub.two");
        assert_eq!(fetch.probed(), vec!["https://hub.one", "https://hub.two"]);

        let entry = resolver.cached("hub").unwrap();
        assert_eq!(entry.chosen_base_address, "https://hub.two");
        assert_eq!(entry.expires_at, Instant::now() + Duration::from_secs(1800));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reprobes_after_expiry() {
        let fetch = Arc::new(FakeFetch::new().status("https://hub.one", 200));
        let resolver = resolver(fetch.clone());

        resolver.resolve_base("hub").await.unwrap();
        tokio::time::advance(Duration::from_secs(1801)).await;
        resolver.resolve_base("hub").await.unwrap();
        assert_eq!(fetch.probed().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_total_outage_falls_back_with_short_ttl() {
        let fetch = Arc::new(FakeFetch::new());
        let resolver = resolver(fetch.clone());

        assert_eq!(resolver.resolve_base("hub").await.unwrap(), "https://hub.one");
        assert_eq!(fetch.probed().len(), 3);

        let entry = resolver.cached("hub").unwrap();
        assert_eq!(entry.expires_at, Instant::now() + Duration::from_secs(60));

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(resolver.cached("hub").is_none());
        resolver.resolve_base("hub").await.unwrap();
        assert_eq!(fetch.probed().len(), 6);
    }

    #[tokio::test]
    async fn test_unknown_provider_is_an_error() {
        let resolver = resolver(Arc::new(FakeFetch::new()));
        let err = resolver.resolve_base("nope").await.unwrap_err();
        assert!(matches!(err, ProviderError::NoReachableMirror(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_reprobe() {
        let fetch = Arc::new(FakeFetch::new().status("https://hub.one", 200));
        let resolver = resolver(fetch.clone());
        resolver.resolve_base("hub").await.unwrap();
        resolver.invalidate("hub");
        assert_eq!(resolver.cached_count(), 0);
        resolver.resolve_base("hub").await.unwrap();
        assert_eq!(fetch.probed().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_resolutions_agree() {
        let fetch = Arc::new(FakeFetch::new().status("https://hub.three", 200));
        let resolver = Arc::new(resolver(fetch));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let resolver = resolver.clone();
                tokio::spawn(async move { resolver.resolve_base("hub").await.unwrap() })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), "https://hub.three");
        }
    }
}
