//! Link aggregation across the ordered fallback layers.
//!
//! Layers run one after another and the first layer yielding any link wins;
//! later layers are never contacted. Inside a layer providers either run in
//! sequence until one answers (`FirstHit`) or concurrently with a bound
//! (`Gather`). Provider failures are logged and count as "no links".
//!
//! The winning layer's links are then deduplicated by URL, optionally
//! filtered by language, ranked, truncated and annotated. Dropping the
//! returned future cancels every in-flight provider call.

use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};
use url::Url;

use crate::models::{AudioLang, MediaIdentity, RequestOptions, ResolvedLink};
use crate::services::error::ResolveError;
use crate::services::language;
use crate::services::metrics;
use crate::services::providers::LinkProvider;

/// How providers inside one layer are consulted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerPolicy {
    /// In order, stop at the first provider with links
    FirstHit,
    /// All providers, at most `concurrency` in flight, results in provider order
    Gather { concurrency: usize },
}

pub struct Layer {
    pub name: String,
    pub policy: LayerPolicy,
    /// Skipped when the identity has no title to search for
    pub requires_title: bool,
    pub providers: Vec<Arc<dyn LinkProvider>>,
}

impl Layer {
    pub fn new(name: impl Into<String>, policy: LayerPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            requires_title: false,
            providers: Vec::new(),
        }
    }

    pub fn requires_title(mut self) -> Self {
        self.requires_title = true;
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn LinkProvider>) -> Self {
        self.providers.push(provider);
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AggregatorSettings {
    pub provider_timeout: Duration,
    pub max_links: usize,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(12),
            max_links: 8,
        }
    }
}

/// A link tagged with the global position of the provider that produced it
type Ranked = (usize, ResolvedLink);

pub struct Aggregator {
    layers: Vec<Layer>,
    settings: AggregatorSettings,
}

impl Aggregator {
    pub fn new(layers: Vec<Layer>, settings: AggregatorSettings) -> Self {
        Self { layers, settings }
    }

    pub fn layer_names(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.name.clone()).collect()
    }

    /// Ranked, deduplicated links for `identity`; empty when every layer
    /// came back empty
    pub async fn resolve(
        &self,
        identity: &MediaIdentity,
        options: &RequestOptions,
    ) -> Vec<ResolvedLink> {
        match self.try_resolve(identity, options).await {
            Ok(links) => links,
            Err(ResolveError::AllLayersExhausted) => Vec::new(),
        }
    }

    pub async fn try_resolve(
        &self,
        identity: &MediaIdentity,
        options: &RequestOptions,
    ) -> Result<Vec<ResolvedLink>, ResolveError> {
        let mut precedence = 0usize;

        for layer in &self.layers {
            let base = precedence;
            precedence += layer.providers.len();

            if layer.requires_title && identity.title.trim().is_empty() {
                debug!(layer = %layer.name, "no title to search for, skipping layer");
                continue;
            }

            let collected = self.run_layer(layer, base, identity, options).await;
            if collected.is_empty() {
                debug!(layer = %layer.name, "layer produced nothing");
                continue;
            }

            info!(
                layer = %layer.name,
                id = %identity.canonical_id,
                count = collected.len(),
                "layer produced links"
            );
            let links = finalize(collected, options, self.settings.max_links);
            metrics::record_resolve(!links.is_empty());
            return Ok(links);
        }

        info!(
            id = %identity.canonical_id,
            kind = %identity.media_kind,
            "all layers exhausted"
        );
        metrics::record_resolve(false);
        Err(ResolveError::AllLayersExhausted)
    }

    async fn run_layer(
        &self,
        layer: &Layer,
        base: usize,
        identity: &MediaIdentity,
        options: &RequestOptions,
    ) -> Vec<Ranked> {
        match layer.policy {
            LayerPolicy::FirstHit => {
                for (i, provider) in layer.providers.iter().enumerate() {
                    let links = self
                        .run_provider(provider.as_ref(), base + i, identity, options)
                        .await;
                    if !links.is_empty() {
                        return links;
                    }
                }
                Vec::new()
            }
            LayerPolicy::Gather { concurrency } => {
                // Futures are built up front so the stream holds no borrowing closure
                let calls: Vec<_> = layer
                    .providers
                    .iter()
                    .enumerate()
                    .map(|(i, provider)| {
                        self.run_provider(provider.as_ref(), base + i, identity, options)
                    })
                    .collect();

                stream::iter(calls)
                    .buffered(concurrency.max(1))
                    .collect::<Vec<_>>()
                    .await
                    .into_iter()
                    .flatten()
                    .collect()
            }
        }
    }

    async fn run_provider(
        &self,
        provider: &dyn LinkProvider,
        precedence: usize,
        identity: &MediaIdentity,
        options: &RequestOptions,
    ) -> Vec<Ranked> {
        let name = provider.name();
        let outcome = timeout(
            self.settings.provider_timeout,
            provider.fetch_links(identity, options),
        )
        .await;

        match outcome {
            Ok(Ok(links)) => {
                let links: Vec<Ranked> = links
                    .into_iter()
                    .filter(|link| is_absolute(&link.url))
                    .map(|link| (precedence, link))
                    .collect();
                let label = if links.is_empty() { "empty" } else { "links" };
                metrics::record_provider(name, label);
                debug!(provider = name, count = links.len(), "provider answered");
                links
            }
            Ok(Err(e)) if e.is_no_match() => {
                metrics::record_provider(name, "empty");
                debug!(provider = name, reason = %e, "provider had nothing");
                Vec::new()
            }
            Ok(Err(e)) => {
                metrics::record_provider(name, "error");
                warn!(provider = name, kind = e.kind(), error = %e, "provider failed");
                Vec::new()
            }
            Err(_) => {
                metrics::record_provider(name, "timeout");
                warn!(
                    provider = name,
                    timeout_ms = self.settings.provider_timeout.as_millis() as u64,
                    "provider timed out"
                );
                Vec::new()
            }
        }
    }
}

fn is_absolute(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Dedup, language filter, rank, truncate, annotate
fn finalize(
    collected: Vec<Ranked>,
    options: &RequestOptions,
    max_links: usize,
) -> Vec<ResolvedLink> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut ranked: Vec<Ranked> = collected
        .into_iter()
        .filter(|(_, link)| seen.insert(link.url.clone()))
        .collect();

    let requested = &options.requested_languages;
    if options.strict_language && !requested.is_empty() {
        ranked.retain(|(_, link)| link.audio_lang.satisfies(requested));
    }

    ranked.sort_by_key(|(precedence, link)| {
        let cam = link.release_type.map(|r| r.is_low_quality()).unwrap_or(false);
        (cam, link.quality_tier, *precedence)
    });
    ranked.truncate(max_links);

    let mut links: Vec<ResolvedLink> = ranked.into_iter().map(|(_, link)| link).collect();

    if options.want_dubbed
        && !requested.is_empty()
        && !links.iter().any(|l| l.audio_lang.satisfies(requested))
    {
        if let Some(original) = links
            .iter_mut()
            .find(|l| l.audio_lang == AudioLang::Original)
        {
            let names: Vec<String> = requested
                .iter()
                .map(|c| language::display_name(c))
                .collect();
            original.advisory_note = Some(format!(
                "No {} dub found, showing Original audio",
                names.join("/")
            ));
        }
    }

    links
}
