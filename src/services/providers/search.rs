//! Search-based providers.
//!
//! Query variants are submitted to the provider's search page one at a time.
//! Every listed result is scored; the running best is kept and the loop stops
//! early once a result clears the confidence threshold. The winner's landing
//! page is then scraped for embeds on allow-listed hosts.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::extract::{extract_embeds, host_of, parse_candidates, visible_text};
use super::LinkProvider;
use crate::models::{Candidate, MediaIdentity, RequestOptions, ResolvedLink};
use crate::services::classifier::AudioQualityClassifier;
use crate::services::error::ProviderError;
use crate::services::http::Fetch;
use crate::services::mirror::MirrorResolver;
use crate::services::query::build_variants;
use crate::services::scorer::{self, HIGH_CONFIDENCE};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchProviderConfig {
    pub name: String,
    /// Interchangeable base addresses, preferred first
    pub mirrors: Vec<String>,
    /// Appended to the base; `{query}` is replaced by the encoded variant
    #[serde(default = "default_search_path")]
    pub search_path: String,
    /// Elements holding (or being) a result anchor
    #[serde(default = "default_result_selector")]
    pub result_selector: String,
    /// Hosts whose iframes/links count as playable embeds
    pub allowed_hosts: Vec<String>,
}

fn default_search_path() -> String {
    "/?s={query}".to_string()
}

fn default_result_selector() -> String {
    "article h2 a, .result-item a, h2.entry-title a".to_string()
}

#[derive(Debug, Clone, Copy)]
pub struct SearchSettings {
    pub max_candidates: usize,
    pub threshold: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_candidates: 20,
            threshold: HIGH_CONFIDENCE,
        }
    }
}

pub struct SearchProvider {
    config: SearchProviderConfig,
    fetch: Arc<dyn Fetch>,
    mirrors: Arc<MirrorResolver>,
    settings: SearchSettings,
}

impl SearchProvider {
    pub fn new(
        config: SearchProviderConfig,
        fetch: Arc<dyn Fetch>,
        mirrors: Arc<MirrorResolver>,
        settings: SearchSettings,
    ) -> Self {
        Self {
            config,
            fetch,
            mirrors,
            settings,
        }
    }

    /// Best-scoring candidate across the variants, with its score
    async fn best_candidate(
        &self,
        base: &str,
        identity: &MediaIdentity,
        options: &RequestOptions,
    ) -> Result<Option<(f64, Candidate)>, ProviderError> {
        let variants = build_variants(
            &identity.title,
            &identity.year,
            &options.requested_languages,
            options.want_dubbed,
        );

        let mut best: Option<(f64, Candidate)> = None;
        let mut failures = 0usize;

        for variant in &variants {
            let url = format!(
                "{}{}",
                base,
                self.config
                    .search_path
                    .replace("{query}", &urlencoding::encode(variant))
            );
            let page = match self.fetch.get_text(&url, None).await {
                Ok(page) => page,
                Err(e) => {
                    failures += 1;
                    debug!(
                        provider = %self.config.name,
                        query = %variant,
                        error = %e,
                        "search request failed"
                    );
                    continue;
                }
            };

            let candidates = parse_candidates(
                &page,
                &url,
                &self.config.result_selector,
                &self.config.name,
                self.settings.max_candidates,
            )?;

            for candidate in candidates {
                let score = scorer::score(
                    &candidate.display_text,
                    &identity.title,
                    &identity.year,
                    &options.requested_languages,
                );
                if best.as_ref().map_or(true, |(top, _)| score > *top) {
                    best = Some((score, candidate));
                }
            }

            if let Some((top, candidate)) = &best {
                if *top >= self.settings.threshold {
                    debug!(
                        provider = %self.config.name,
                        score = top,
                        text = %candidate.display_text,
                        "confident match, stopping search"
                    );
                    break;
                }
            }
        }

        if !variants.is_empty() && failures == variants.len() {
            self.mirrors.invalidate(&self.config.name);
            return Err(ProviderError::ProviderUnreachable(format!(
                "every search request to {} failed",
                base
            )));
        }

        Ok(best)
    }
}

#[async_trait]
impl LinkProvider for SearchProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn fetch_links(
        &self,
        identity: &MediaIdentity,
        options: &RequestOptions,
    ) -> Result<Vec<ResolvedLink>, ProviderError> {
        if identity.title.trim().is_empty() {
            return Err(ProviderError::NoCandidateMatch);
        }

        let base = self.mirrors.resolve_base(&self.config.name).await?;
        let (score, candidate) = match self.best_candidate(&base, identity, options).await? {
            Some((score, candidate)) if score > 0.0 => (score, candidate),
            _ => return Err(ProviderError::NoCandidateMatch),
        };

        info!(
            provider = %self.config.name,
            score = score,
            text = %candidate.display_text,
            "search candidate chosen"
        );

        let landing = self
            .fetch
            .get_text(&candidate.target_url, Some(&base))
            .await?;
        let embeds = extract_embeds(&landing, &candidate.target_url, &self.config.allowed_hosts);
        if embeds.is_empty() {
            return Err(ProviderError::ParseStructureChanged(format!(
                "no allow-listed embeds on {}",
                candidate.target_url
            )));
        }

        let class = AudioQualityClassifier::classify(&format!(
            "{} {}",
            candidate.display_text,
            visible_text(&landing)
        ));

        Ok(embeds
            .into_iter()
            .map(|url| {
                let label = format!("{} - {}", self.config.name, host_of(&url));
                ResolvedLink::embed(url, label)
                    .with_quality(class.quality_tier)
                    .with_release(class.release_type)
                    .with_audio(class.audio_lang.clone(), class.audio_label.clone())
            })
            .collect())
    }
}
