//! Identifier-based providers: the embed address is formatted straight from
//! the catalog id, no search involved.

use async_trait::async_trait;
use futures::future::join_all;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use super::extract::{absolutize, extract_embeds, server_tabs, visible_text};
use super::LinkProvider;
use crate::models::{AudioLang, MediaIdentity, MediaKind, RequestOptions, ResolvedLink};
use crate::services::classifier::AudioQualityClassifier;
use crate::services::error::ProviderError;
use crate::services::http::Fetch;

lazy_static! {
    static ref DUB_TAB: Regex = Regex::new(r"(?i)\bdub(?:bed)?\b").unwrap();
}

/// Audio of a server tab. A tab marked "dub" without a language name is
/// taken as the first requested dub, or kept original-language otherwise.
fn tab_audio(tab_name: &str, requested: &[String]) -> (AudioLang, String) {
    let detected = AudioQualityClassifier::detect_audio(tab_name);
    if detected.0 != AudioLang::Original || !DUB_TAB.is_match(tab_name) {
        return detected;
    }
    match requested.first() {
        Some(code) => (AudioLang::Language(code.clone()), "Dubbed".to_string()),
        None => (AudioLang::Original, "Dubbed".to_string()),
    }
}

/// What to do with the formatted URL
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum EmbedStrategy {
    /// Return the formatted URL itself
    Direct,
    /// Fetch the page and keep iframes/anchors on allow-listed hosts
    Iframes { allowed_hosts: Vec<String> },
    /// Page lists server tabs; each tab's hash resolves to a source URL
    /// through a JSON endpoint requested with the embed page as referer
    ServerTabs {
        #[serde(default = "default_tab_selector")]
        tab_selector: String,
        #[serde(default = "default_hash_attr")]
        hash_attr: String,
        source_api: String,
    },
}

impl Default for EmbedStrategy {
    fn default() -> Self {
        EmbedStrategy::Direct
    }
}

fn default_tab_selector() -> String {
    "div.server".to_string()
}

fn default_hash_attr() -> String {
    "data-hash".to_string()
}

/// Templates understand `{id}`, `{imdb}`, `{season}` and `{episode}`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IdentifierProviderConfig {
    pub name: String,
    #[serde(default)]
    pub movie_template: Option<String>,
    #[serde(default)]
    pub series_template: Option<String>,
    #[serde(default)]
    pub embed: EmbedStrategy,
}

pub struct IdentifierProvider {
    config: IdentifierProviderConfig,
    fetch: Arc<dyn Fetch>,
}

impl IdentifierProvider {
    pub fn new(config: IdentifierProviderConfig, fetch: Arc<dyn Fetch>) -> Self {
        Self { config, fetch }
    }

    fn build_url(&self, identity: &MediaIdentity) -> Result<String, ProviderError> {
        let template = match identity.media_kind {
            MediaKind::Movie => self.config.movie_template.as_deref(),
            MediaKind::Series => self.config.series_template.as_deref(),
        }
        .ok_or_else(|| {
            ProviderError::UnsupportedMedia(format!(
                "{} has no {} template",
                self.config.name, identity.media_kind
            ))
        })?;

        let mut url = template
            .replace("{id}", &identity.canonical_id)
            .replace("{season}", &identity.season.unwrap_or(1).to_string())
            .replace("{episode}", &identity.episode.unwrap_or(1).to_string());

        if url.contains("{imdb}") {
            let imdb = identity
                .external_id
                .as_deref()
                .filter(|id| !id.is_empty())
                .ok_or_else(|| {
                    ProviderError::UnsupportedMedia(format!(
                        "{} needs an external id",
                        self.config.name
                    ))
                })?;
            url = url.replace("{imdb}", imdb);
        }

        Ok(url)
    }

    async fn from_page(
        &self,
        embed_url: &str,
        allowed_hosts: &[String],
    ) -> Result<Vec<ResolvedLink>, ProviderError> {
        let page = self.fetch.get_text(embed_url, None).await?;
        let embeds = extract_embeds(&page, embed_url, allowed_hosts);
        let class = AudioQualityClassifier::classify(&visible_text(&page));

        Ok(embeds
            .into_iter()
            .map(|url| {
                ResolvedLink::embed(url, self.config.name.clone())
                    .with_quality(class.quality_tier)
                    .with_release(class.release_type)
                    .with_audio(class.audio_lang.clone(), class.audio_label.clone())
            })
            .collect())
    }

    async fn from_server_tabs(
        &self,
        embed_url: &str,
        tab_selector: &str,
        hash_attr: &str,
        source_api: &str,
        requested: &[String],
    ) -> Result<Vec<ResolvedLink>, ProviderError> {
        let page = self.fetch.get_text(embed_url, None).await?;
        let tabs = server_tabs(&page, tab_selector, hash_attr)?;
        if tabs.is_empty() {
            return Err(ProviderError::ParseStructureChanged(format!(
                "no server tabs on {}",
                embed_url
            )));
        }

        let lookups = tabs.into_iter().map(|(tab_name, hash)| async move {
            let api_url = absolutize(embed_url, &source_api.replace("{hash}", &hash))?;
            let body = match self.fetch.get_text(&api_url, Some(embed_url)).await {
                Ok(body) => body,
                Err(e) => {
                    debug!(
                        provider = %self.config.name,
                        tab = %tab_name,
                        error = %e,
                        "server tab lookup failed"
                    );
                    return None;
                }
            };
            let source = serde_json::from_str::<Value>(&body).ok().and_then(|v| {
                v.pointer("/result/url")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            });
            let Some(source) = source.and_then(|s| absolutize(embed_url, &s)) else {
                warn!(
                    provider = %self.config.name,
                    tab = %tab_name,
                    "server tab payload had no source url"
                );
                return None;
            };

            let (audio_lang, audio_label) = tab_audio(&tab_name, requested);
            let label = if tab_name.is_empty() {
                self.config.name.clone()
            } else {
                format!("{} - {}", self.config.name, tab_name)
            };
            Some(
                ResolvedLink::embed(source, label)
                    .with_quality(AudioQualityClassifier::detect_quality(&tab_name))
                    .with_audio(audio_lang, audio_label),
            )
        });

        Ok(join_all(lookups).await.into_iter().flatten().collect())
    }
}

#[async_trait]
impl LinkProvider for IdentifierProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn fetch_links(
        &self,
        identity: &MediaIdentity,
        options: &RequestOptions,
    ) -> Result<Vec<ResolvedLink>, ProviderError> {
        let embed_url = self.build_url(identity)?;

        match &self.config.embed {
            EmbedStrategy::Direct => Ok(vec![ResolvedLink::embed(
                embed_url,
                self.config.name.clone(),
            )]),
            EmbedStrategy::Iframes { allowed_hosts } => {
                self.from_page(&embed_url, allowed_hosts).await
            }
            EmbedStrategy::ServerTabs {
                tab_selector,
                hash_attr,
                source_api,
            } => {
                self.from_server_tabs(
                    &embed_url,
                    tab_selector,
                    hash_attr,
                    source_api,
                    &options.requested_languages,
                )
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LinkKind, QualityTier};
    use crate::services::http::testing::FakeFetch;

    fn direct() -> IdentifierProviderConfig {
        IdentifierProviderConfig {
            name: "byid".into(),
            movie_template: Some("https://byid.example/embed/movie?tmdb={id}".into()),
            series_template: Some(
                "https://byid.example/embed/tv?tmdb={id}&season={season}&episode={episode}".into(),
            ),
            embed: EmbedStrategy::Direct,
        }
    }

    #[tokio::test]
    async fn test_direct_movie_and_episode() {
        let provider = IdentifierProvider::new(direct(), Arc::new(FakeFetch::new()));
        let options = RequestOptions::default();

        let links = provider
            .fetch_links(&MediaIdentity::movie("438631", "Dune", "2021"), &options)
            .await
            .unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://byid.example/embed/movie?tmdb=438631");
        assert_eq!(links[0].link_kind, LinkKind::Embed);
        assert_eq!(links[0].quality_tier, QualityTier::Auto);
        assert_eq!(links[0].audio_lang, AudioLang::Original);

        let links = provider
            .fetch_links(&MediaIdentity::episode("1399", "GoT", "2011", 2, 5), &options)
            .await
            .unwrap();
        assert_eq!(
            links[0].url,
            "https://byid.example/embed/tv?tmdb=1399&season=2&episode=5"
        );
    }

    #[tokio::test]
    async fn test_missing_external_id_is_unsupported() {
        let mut config = direct();
        config.movie_template = Some("https://byid.example/imdb/{imdb}".into());
        let provider = IdentifierProvider::new(config, Arc::new(FakeFetch::new()));

        let err = provider
            .fetch_links(&MediaIdentity::movie("1", "X", ""), &RequestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::UnsupportedMedia(_)));

        let identity = MediaIdentity::movie("1", "X", "").with_external_id(Some("tt0001".into()));
        let links = provider
            .fetch_links(&identity, &RequestOptions::default())
            .await
            .unwrap();
        assert_eq!(links[0].url, "https://byid.example/imdb/tt0001");
    }

    #[tokio::test]
    async fn test_server_tabs_use_embed_page_as_referer() {
        let embed = "https://tabs.example/embed/movie/27205";
        let fetch = Arc::new(
            FakeFetch::new()
                .page(
                    embed,
                    r#"<div class="server" data-hash="h1">VidSrc</div>
                       <div class="server" data-hash="h2">Hindi 1080p</div>
                       <div class="server" data-hash="h3">Broken</div>"#,
                )
                .page(
                    "https://tabs.example/rcp/h1",
                    r#"{"result":{"url":"//cdn.one.example/e/abc"}}"#,
                )
                .page(
                    "https://tabs.example/rcp/h2",
                    r#"{"result":{"url":"https://cdn.two.example/e/def"}}"#,
                )
                .page("https://tabs.example/rcp/h3", r#"{"status":"error"}"#),
        );
        let config = IdentifierProviderConfig {
            name: "tabs".into(),
            movie_template: Some("https://tabs.example/embed/movie/{id}".into()),
            series_template: None,
            embed: EmbedStrategy::ServerTabs {
                tab_selector: default_tab_selector(),
                hash_attr: default_hash_attr(),
                source_api: "/rcp/{hash}".into(),
            },
        };
        let provider = IdentifierProvider::new(config, fetch.clone());

        let identity = MediaIdentity::movie("27205", "Inception", "2010");
        let links = provider
            .fetch_links(&identity, &RequestOptions::default())
            .await
            .unwrap();

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "https://cdn.one.example/e/abc");
        assert_eq!(links[0].source_label, "tabs - VidSrc");
        assert_eq!(links[0].audio_lang, AudioLang::Original);
        assert_eq!(links[1].audio_lang, AudioLang::Language("hi".into()));
        assert_eq!(links[1].quality_tier, QualityTier::Fhd1080);
        assert_eq!(
            fetch.referer_for("https://tabs.example/rcp/h1").as_deref(),
            Some(embed)
        );

        let err = provider
            .fetch_links(&MediaIdentity::episode("1", "S", "", 1, 1), &RequestOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_no_match());
    }

    #[tokio::test]
    async fn test_dub_tab_without_language() {
        let embed = "https://tabs.example/embed/movie/27205";
        let fetch = Arc::new(
            FakeFetch::new()
                .page(
                    embed,
                    r#"<div class="server" data-hash="h1">Dub Server</div>
                       <div class="server" data-hash="h2">VidSrc</div>"#,
                )
                .page(
                    "https://tabs.example/rcp/h1",
                    r#"{"result":{"url":"https://cdn.one.example/e/dub"}}"#,
                )
                .page(
                    "https://tabs.example/rcp/h2",
                    r#"{"result":{"url":"https://cdn.two.example/e/orig"}}"#,
                ),
        );
        let config = IdentifierProviderConfig {
            name: "tabs".into(),
            movie_template: Some("https://tabs.example/embed/movie/{id}".into()),
            series_template: None,
            embed: EmbedStrategy::ServerTabs {
                tab_selector: default_tab_selector(),
                hash_attr: default_hash_attr(),
                source_api: "/rcp/{hash}".into(),
            },
        };
        let provider = IdentifierProvider::new(config, fetch);
        let identity = MediaIdentity::movie("27205", "Inception", "2010");

        let links = provider
            .fetch_links(&identity, &RequestOptions::new(["hi"]).dubbed(true))
            .await
            .unwrap();
        assert_eq!(links[0].audio_lang, AudioLang::Language("hi".into()));
        assert_eq!(links[0].audio_label, "Dubbed");
        assert_eq!(links[1].audio_lang, AudioLang::Original);

        let links = provider
            .fetch_links(&identity, &RequestOptions::default())
            .await
            .unwrap();
        assert_eq!(links[0].audio_lang, AudioLang::Original);
        assert_eq!(links[0].audio_label, "Dubbed");
    }

    #[test]
    fn test_tab_audio_prefers_named_language() {
        let requested = vec!["ta".to_string()];
        assert_eq!(
            tab_audio("Hindi Dub", &requested),
            (AudioLang::Language("hi".into()), "Hindi".to_string())
        );
        assert_eq!(
            tab_audio("Dubbed", &requested),
            (AudioLang::Language("ta".into()), "Dubbed".to_string())
        );
        assert_eq!(tab_audio("Dubai Mirror", &requested).0, AudioLang::Original);
    }

    #[tokio::test]
    async fn test_iframes_strategy() {
        let page_url = "https://frames.example/movie/550";
        let fetch = Arc::new(FakeFetch::new().page(
            page_url,
            r#"<title>Fight Club 720p Tamil</title>
               <iframe src="https://player.host.example/v/1"></iframe>
               <iframe src="https://ads.example/v/2"></iframe>"#,
        ));
        let config = IdentifierProviderConfig {
            name: "frames".into(),
            movie_template: Some("https://frames.example/movie/{id}".into()),
            series_template: None,
            embed: EmbedStrategy::Iframes {
                allowed_hosts: vec!["host.example".into()],
            },
        };
        let provider = IdentifierProvider::new(config, fetch);

        let identity = MediaIdentity::movie("550", "Fight Club", "1999");
        let links = provider
            .fetch_links(&identity, &RequestOptions::default())
            .await
            .unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].quality_tier, QualityTier::Hd720);
        assert_eq!(links[0].audio_label, "Tamil");
    }

    #[test]
    fn test_strategy_deserializes() {
        let config: IdentifierProviderConfig = serde_json::from_str(
            r#"{"name":"x","movie_template":"https://x/{id}",
                "embed":{"strategy":"server_tabs","source_api":"https://x/rcp/{hash}"}}"#,
        )
        .unwrap();
        assert_eq!(
            config.embed,
            EmbedStrategy::ServerTabs {
                tab_selector: "div.server".into(),
                hash_attr: "data-hash".into(),
                source_api: "https://x/rcp/{hash}".into(),
            }
        );

        let config: IdentifierProviderConfig =
            serde_json::from_str(r#"{"name":"y","series_template":"https://y/{id}"}"#).unwrap();
        assert_eq!(config.embed, EmbedStrategy::Direct);
    }
}
