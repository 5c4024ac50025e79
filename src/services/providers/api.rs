//! Primary aggregation API: a JSON service fronting several sub-providers.
//!
//! Sub-providers are asked in order and the first one returning usable
//! sources answers for the whole adapter.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use super::extract::absolutize;
use super::LinkProvider;
use crate::models::{LinkKind, MediaIdentity, MediaKind, RequestOptions, ResolvedLink};
use crate::services::classifier::AudioQualityClassifier;
use crate::services::error::ProviderError;
use crate::services::http::Fetch;
use crate::services::mirror::MirrorResolver;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AggregationApiConfig {
    #[serde(default = "default_name")]
    pub name: String,
    pub mirrors: Vec<String>,
    pub sub_providers: Vec<String>,
}

fn default_name() -> String {
    "primary-api".to_string()
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    sources: Vec<ApiSource>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    url: String,
    #[serde(default)]
    quality: Option<String>,
    #[serde(default)]
    lang: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

fn link_kind(kind: Option<&str>) -> LinkKind {
    match kind.map(str::to_lowercase).as_deref() {
        Some("hls") | Some("mp4") | Some("file") => LinkKind::DirectStream,
        _ => LinkKind::Embed,
    }
}

pub struct AggregationApiProvider {
    config: AggregationApiConfig,
    fetch: Arc<dyn Fetch>,
    mirrors: Arc<MirrorResolver>,
}

impl AggregationApiProvider {
    pub fn new(
        config: AggregationApiConfig,
        fetch: Arc<dyn Fetch>,
        mirrors: Arc<MirrorResolver>,
    ) -> Self {
        Self {
            config,
            fetch,
            mirrors,
        }
    }

    fn endpoint(&self, base: &str, sub: &str, identity: &MediaIdentity) -> String {
        match identity.media_kind {
            MediaKind::Movie => format!("{}/{}/movie/{}", base, sub, identity.canonical_id),
            MediaKind::Series => format!(
                "{}/{}/tv/{}/{}/{}",
                base,
                sub,
                identity.canonical_id,
                identity.season.unwrap_or(1),
                identity.episode.unwrap_or(1)
            ),
        }
    }

    fn to_links(&self, sub: &str, endpoint: &str, response: ApiResponse) -> Vec<ResolvedLink> {
        response
            .sources
            .into_iter()
            .filter_map(|source| {
                let url = absolutize(endpoint, &source.url)?;
                let quality = source.quality.as_deref().unwrap_or_default();
                let lang = source.lang.as_deref().unwrap_or_default();
                let (audio_lang, audio_label) = AudioQualityClassifier::audio_from_hint(lang);
                Some(
                    ResolvedLink::embed(url, format!("{} - {}", self.config.name, sub))
                        .with_kind(link_kind(source.kind.as_deref()))
                        .with_quality(AudioQualityClassifier::quality_from_hint(quality))
                        .with_release(AudioQualityClassifier::detect_release(quality))
                        .with_audio(audio_lang, audio_label),
                )
            })
            .collect()
    }
}

#[async_trait]
impl LinkProvider for AggregationApiProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn fetch_links(
        &self,
        identity: &MediaIdentity,
        _options: &RequestOptions,
    ) -> Result<Vec<ResolvedLink>, ProviderError> {
        let base = self.mirrors.resolve_base(&self.config.name).await?;
        let mut failures = 0usize;

        for sub in &self.config.sub_providers {
            let endpoint = self.endpoint(&base, sub, identity);
            let body = match self.fetch.get_text(&endpoint, None).await {
                Ok(body) => body,
                Err(e) => {
                    failures += 1;
                    debug!(
                        provider = %self.config.name,
                        sub = %sub,
                        error = %e,
                        "sub-provider request failed"
                    );
                    continue;
                }
            };

            let response: ApiResponse = match serde_json::from_str(&body) {
                Ok(response) => response,
                Err(e) => {
                    warn!(
                        provider = %self.config.name,
                        sub = %sub,
                        error = %e,
                        "unexpected sub-provider payload"
                    );
                    continue;
                }
            };

            let links = self.to_links(sub, &endpoint, response);
            if !links.is_empty() {
                debug!(
                    provider = %self.config.name,
                    sub = %sub,
                    count = links.len(),
                    "sub-provider answered"
                );
                return Ok(links);
            }
        }

        if !self.config.sub_providers.is_empty() && failures == self.config.sub_providers.len() {
            self.mirrors.invalidate(&self.config.name);
            return Err(ProviderError::ProviderUnreachable(format!(
                "every sub-provider of {} failed",
                base
            )));
        }

        Err(ProviderError::NoCandidateMatch)
    }
}
