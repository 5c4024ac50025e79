//! Provider table and layer assembly.
//!
//! The table is read from `PROVIDERS_FILE` when set; otherwise the built-in
//! identifier and backup providers are used and the aggregation API and
//! search layers stay empty.

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use super::{
    AggregationApiConfig, AggregationApiProvider, EmbedStrategy, IdentifierProvider,
    IdentifierProviderConfig, LinkProvider, ManualOverrides, SearchProvider, SearchProviderConfig,
};
use crate::config::{Config, LAYER_ORDER};
use crate::services::aggregator::{Layer, LayerPolicy};
use crate::services::http::Fetch;
use crate::services::mirror::MirrorResolver;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub primary_api: Option<AggregationApiConfig>,
    pub identifier: Vec<IdentifierProviderConfig>,
    pub search: Vec<SearchProviderConfig>,
    pub backup: Vec<IdentifierProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            primary_api: None,
            identifier: vec![
                IdentifierProviderConfig {
                    name: "vidsrc.pro".to_string(),
                    movie_template: Some("https://vidsrc.pro/embed/movie/{id}".to_string()),
                    series_template: Some(
                        "https://vidsrc.pro/embed/tv/{id}/{season}-{episode}".to_string(),
                    ),
                    embed: EmbedStrategy::ServerTabs {
                        tab_selector: "div.server".to_string(),
                        hash_attr: "data-hash".to_string(),
                        source_api: "https://vidsrc.pro/rcp/{hash}".to_string(),
                    },
                },
                IdentifierProviderConfig {
                    name: "vidsrc.xyz".to_string(),
                    movie_template: Some("https://vidsrc.xyz/embed/movie?tmdb={id}".to_string()),
                    series_template: Some(
                        "https://vidsrc.xyz/embed/tv?tmdb={id}&season={season}&episode={episode}"
                            .to_string(),
                    ),
                    embed: EmbedStrategy::Direct,
                },
            ],
            search: Vec::new(),
            backup: vec![IdentifierProviderConfig {
                name: "2embed".to_string(),
                movie_template: Some("https://www.2embed.cc/embed/{id}".to_string()),
                series_template: Some(
                    "https://www.2embed.cc/embedtv/{id}&s={season}&e={episode}".to_string(),
                ),
                embed: EmbedStrategy::Direct,
            }],
        }
    }
}

impl ProvidersConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid providers table")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("reading providers from {}", path.display()))?;
        Self::from_json(&json)
    }
}

/// Build the ordered fallback layers and the mirror resolver they share.
/// Disabled and empty layers are left out.
pub fn build_layers(
    config: &Config,
    providers: &ProvidersConfig,
    manual: Option<ManualOverrides>,
    fetch: Arc<dyn Fetch>,
) -> (Vec<Layer>, Arc<MirrorResolver>) {
    let mut resolver = MirrorResolver::new(fetch.clone(), config.mirror_settings());
    if let Some(api) = &providers.primary_api {
        resolver.register(&api.name, api.mirrors.clone());
    }
    for search in &providers.search {
        resolver.register(&search.name, search.mirrors.clone());
    }
    let mirrors = Arc::new(resolver);

    let identifier = |c: &IdentifierProviderConfig| -> Arc<dyn LinkProvider> {
        Arc::new(IdentifierProvider::new(c.clone(), fetch.clone()))
    };

    let mut layers = Vec::new();
    for name in LAYER_ORDER {
        if !config.layer_enabled(name) {
            info!(layer = *name, "layer disabled");
            continue;
        }

        let layer = match *name {
            "manual" => {
                let mut layer = Layer::new(*name, LayerPolicy::FirstHit);
                if let Some(manual) = manual.clone().filter(|m| !m.is_empty()) {
                    layer = layer.with_provider(Arc::new(manual));
                }
                layer
            }
            "primary-api" => {
                let mut layer = Layer::new(*name, LayerPolicy::FirstHit);
                if let Some(api) = &providers.primary_api {
                    layer = layer.with_provider(Arc::new(AggregationApiProvider::new(
                        api.clone(),
                        fetch.clone(),
                        mirrors.clone(),
                    )));
                }
                layer
            }
            "identifier" => {
                let concurrency = providers.identifier.len().max(1);
                providers
                    .identifier
                    .iter()
                    .fold(Layer::new(*name, LayerPolicy::Gather { concurrency }), |layer, c| {
                        layer.with_provider(identifier(c))
                    })
            }
            "search" => providers.search.iter().fold(
                Layer::new(
                    *name,
                    LayerPolicy::Gather {
                        concurrency: config.search_concurrency.max(1),
                    },
                )
                .requires_title(),
                |layer, c| {
                    layer.with_provider(Arc::new(SearchProvider::new(
                        c.clone(),
                        fetch.clone(),
                        mirrors.clone(),
                        config.search_settings(),
                    )))
                },
            ),
            _ => providers
                .backup
                .iter()
                .fold(Layer::new(*name, LayerPolicy::FirstHit), |layer, c| {
                    layer.with_provider(identifier(c))
                }),
        };

        if layer.providers.is_empty() {
            continue;
        }
        info!(layer = *name, providers = layer.providers.len(), "layer ready");
        layers.push(layer);
    }

    (layers, mirrors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::http::testing::FakeFetch;
    use std::collections::HashMap;

    fn names(layers: &[Layer]) -> Vec<&str> {
        layers.iter().map(|l| l.name.as_str()).collect()
    }

    #[test]
    fn test_defaults_build_identifier_and_backup() {
        let mut config = Config::from_env();
        config.disabled_layers.clear();
        let (layers, _) = build_layers(
            &config,
            &ProvidersConfig::default(),
            None,
            Arc::new(FakeFetch::new()),
        );
        assert_eq!(names(&layers), vec!["identifier", "backup"]);
        assert_eq!(layers[0].providers[0].name(), "vidsrc.pro");
    }

    #[test]
    fn test_full_table_in_layer_order() {
        let providers = ProvidersConfig::from_json(
            r#"{
                "primary_api": {"mirrors": ["https://api.example"], "sub_providers": ["a"]},
                "search": [{"name": "hub", "mirrors": ["https://hub.example"], "allowed_hosts": ["s.example"]}],
                "backup": []
            }"#,
        )
        .unwrap();
        let manual = ManualOverrides::new(HashMap::from([("movie:1".to_string(), Vec::new())]));

        let mut config = Config::from_env();
        config.disabled_layers.clear();
        let (layers, _) =
            build_layers(&config, &providers, Some(manual), Arc::new(FakeFetch::new()));
        assert_eq!(names(&layers), vec!["manual", "primary-api", "identifier", "search"]);
        assert!(layers[3].requires_title);

        config.disabled_layers = vec!["search".to_string(), "manual".to_string()];
        let (layers, _) = build_layers(&config, &providers, None, Arc::new(FakeFetch::new()));
        assert_eq!(names(&layers), vec!["primary-api", "identifier"]);
    }
}
