use std::env;
use std::time::Duration;

use crate::services::aggregator::AggregatorSettings;
use crate::services::mirror::MirrorSettings;
use crate::services::providers::search::SearchSettings;

/// Fallback layers in the order they are consulted
pub const LAYER_ORDER: &[&str] = &["manual", "primary-api", "identifier", "search", "backup"];

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,

    // Catalog (TMDB)
    pub tmdb_api_key: Option<String>,
    pub tmdb_api_base: String,
    pub catalog_cache_capacity: usize,
    pub catalog_cache_ttl_secs: u64,

    // Outbound HTTP
    pub user_agent: String,
    pub provider_timeout_ms: u64,
    pub probe_timeout_ms: u64,

    // Mirrors
    pub mirror_ttl_secs: u64,
    pub mirror_negative_ttl_secs: u64,
    pub mirror_cache_capacity: usize,

    // Resolution
    pub search_concurrency: usize,
    pub max_links: usize,
    pub max_candidates: usize,
    pub match_threshold: f64,
    pub disabled_layers: Vec<String>,

    // Provider tables
    pub providers_file: Option<String>,
    pub manual_links_file: Option<String>,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "10000".to_string())
                .parse()
                .unwrap_or(10000),

            // Catalog
            tmdb_api_key: env::var("TMDB_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            tmdb_api_base: env::var("TMDB_API_BASE")
                .unwrap_or_else(|_| "https://api.themoviedb.org/3".to_string()),
            catalog_cache_capacity: env::var("CATALOG_CACHE_CAPACITY")
                .unwrap_or_else(|_| "128".to_string())
                .parse()
                .unwrap_or(128),
            catalog_cache_ttl_secs: env::var("CATALOG_CACHE_TTL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .unwrap_or(3600), // 1 hour

            // Outbound HTTP - desktop browser profile, providers block bot agents
            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string()
            }),
            provider_timeout_ms: env::var("PROVIDER_TIMEOUT_MS")
                .unwrap_or_else(|_| "12000".to_string())
                .parse()
                .unwrap_or(12_000), // 12 seconds
            probe_timeout_ms: env::var("PROBE_TIMEOUT_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5_000),

            // Mirrors
            mirror_ttl_secs: env::var("MIRROR_TTL_SECS")
                .unwrap_or_else(|_| "1800".to_string())
                .parse()
                .unwrap_or(1800), // 30 minutes
            mirror_negative_ttl_secs: env::var("MIRROR_NEGATIVE_TTL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap_or(60),
            mirror_cache_capacity: env::var("MIRROR_CACHE_CAPACITY")
                .unwrap_or_else(|_| "64".to_string())
                .parse()
                .unwrap_or(64),

            // Resolution
            search_concurrency: env::var("SEARCH_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .unwrap_or(4),
            max_links: env::var("MAX_LINKS")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .unwrap_or(8),
            max_candidates: env::var("MAX_CANDIDATES")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .unwrap_or(20),
            match_threshold: env::var("MATCH_THRESHOLD")
                .unwrap_or_else(|_| "0.75".to_string())
                .parse()
                .unwrap_or(0.75),
            disabled_layers: env::var("DISABLED_LAYERS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),

            // Provider tables
            providers_file: env::var("PROVIDERS_FILE").ok().filter(|p| !p.trim().is_empty()),
            manual_links_file: env::var("MANUAL_LINKS_FILE")
                .ok()
                .filter(|p| !p.trim().is_empty()),
        }
    }

    pub fn layer_enabled(&self, layer: &str) -> bool {
        !self.disabled_layers.iter().any(|d| d == layer)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn aggregator_settings(&self) -> AggregatorSettings {
        AggregatorSettings {
            provider_timeout: self.provider_timeout(),
            max_links: self.max_links.max(1),
        }
    }

    pub fn mirror_settings(&self) -> MirrorSettings {
        MirrorSettings {
            ttl: Duration::from_secs(self.mirror_ttl_secs),
            negative_ttl: Duration::from_secs(self.mirror_negative_ttl_secs),
            capacity: self.mirror_cache_capacity.max(1),
        }
    }

    pub fn search_settings(&self) -> SearchSettings {
        SearchSettings {
            max_candidates: self.max_candidates.max(1),
            threshold: self.match_threshold,
        }
    }
}

/// Comma separated, trimmed, lower-cased, empties dropped
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}
