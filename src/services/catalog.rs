//! Title catalog (TMDB): search, canonical identities and season listings.
//!
//! Responses are kept in a bounded TTL cache keyed by request path and
//! parameters, so repeated lookups of the same title don't hit the API.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::models::{
    EpisodeSummary, MediaIdentity, MediaKind, SearchHit, SeasonSummary, SeasonsResponse,
};
use crate::services::cache::TtlCache;
use crate::services::error::CatalogError;

#[async_trait]
pub trait Catalog: Send + Sync {
    /// Movies and series matching free text
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, CatalogError>;

    /// Title, year and external id for a catalog entry
    async fn identity(
        &self,
        kind: MediaKind,
        id: &str,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Result<MediaIdentity, CatalogError>;

    /// Regular seasons of a series (specials excluded)
    async fn seasons(&self, id: &str) -> Result<SeasonsResponse, CatalogError>;

    async fn episodes(&self, id: &str, season: u32) -> Result<Vec<EpisodeSummary>, CatalogError>;
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: u64,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    first_air_date: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Details {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    first_air_date: Option<String>,
    #[serde(default)]
    imdb_id: Option<String>,
    #[serde(default)]
    external_ids: Option<ExternalIds>,
    #[serde(default)]
    seasons: Vec<SeasonItem>,
}

#[derive(Debug, Deserialize)]
struct ExternalIds {
    #[serde(default)]
    imdb_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SeasonItem {
    season_number: u32,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    episode_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct SeasonDetails {
    #[serde(default)]
    episodes: Vec<EpisodeItem>,
}

#[derive(Debug, Deserialize)]
struct EpisodeItem {
    episode_number: u32,
    #[serde(default)]
    name: Option<String>,
}

fn year_of(date: Option<&str>) -> String {
    date.unwrap_or_default().chars().take(4).collect()
}

fn parse<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, CatalogError> {
    serde_json::from_value(value)
        .map_err(|e| CatalogError::Upstream(format!("unexpected payload: {}", e)))
}

fn search_hits(value: Value) -> Result<Vec<SearchHit>, CatalogError> {
    let page: SearchPage = parse(value)?;
    Ok(page
        .results
        .into_iter()
        .filter_map(|item| {
            let kind = match item.media_type.as_deref() {
                Some("movie") => MediaKind::Movie,
                Some("tv") => MediaKind::Series,
                _ => return None,
            };
            Some(SearchHit {
                id: item.id,
                kind,
                title: item.title.or(item.name).unwrap_or_default(),
                year: year_of(item.release_date.as_deref().or(item.first_air_date.as_deref())),
                poster_path: item.poster_path,
            })
        })
        .collect())
}

fn identity_from(
    value: Value,
    kind: MediaKind,
    id: &str,
    season: Option<u32>,
    episode: Option<u32>,
) -> Result<MediaIdentity, CatalogError> {
    let details: Details = parse(value)?;
    let title = details.title.or(details.name).unwrap_or_default();
    let imdb = details
        .imdb_id
        .or(details.external_ids.and_then(|ids| ids.imdb_id))
        .filter(|id| !id.is_empty());

    let identity = match kind {
        MediaKind::Movie => {
            MediaIdentity::movie(id, title, year_of(details.release_date.as_deref()))
        }
        MediaKind::Series => MediaIdentity::episode(
            id,
            title,
            year_of(details.first_air_date.as_deref()),
            season.unwrap_or(1),
            episode.unwrap_or(1),
        ),
    };
    Ok(identity.with_external_id(imdb))
}

fn seasons_from(value: Value) -> Result<SeasonsResponse, CatalogError> {
    let details: Details = parse(value)?;
    Ok(SeasonsResponse {
        title: details.name.or(details.title).unwrap_or_default(),
        seasons: details
            .seasons
            .into_iter()
            .filter(|s| s.season_number > 0)
            .map(|s| SeasonSummary {
                season_number: s.season_number,
                name: s.name.unwrap_or_else(|| format!("Season {}", s.season_number)),
                episode_count: s.episode_count.unwrap_or(0),
            })
            .collect(),
    })
}

fn episodes_from(value: Value) -> Result<Vec<EpisodeSummary>, CatalogError> {
    let details: SeasonDetails = parse(value)?;
    Ok(details
        .episodes
        .into_iter()
        .map(|e| EpisodeSummary {
            episode_number: e.episode_number,
            name: e.name.filter(|n| !n.is_empty()),
        })
        .collect())
}

pub struct TmdbCatalog {
    http: Client,
    api_base: String,
    api_key: String,
    cache: TtlCache<String, Value>,
    cache_ttl: Duration,
}

impl TmdbCatalog {
    /// `None` when no API key is configured
    pub fn from_config(config: &Config) -> Result<Option<Self>, reqwest::Error> {
        let Some(api_key) = config.tmdb_api_key.clone() else {
            return Ok(None);
        };
        let http = Client::builder()
            .timeout(Duration::from_millis(config.provider_timeout_ms))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;

        Ok(Some(Self {
            http,
            api_base: config.tmdb_api_base.trim_end_matches('/').to_string(),
            api_key,
            cache: TtlCache::new(config.catalog_cache_capacity.max(1)),
            cache_ttl: Duration::from_secs(config.catalog_cache_ttl_secs),
        }))
    }

    async fn get_json(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, CatalogError> {
        let cache_key = format!("{}?{:?}", path, params);
        if let Some(value) = self.cache.get(&cache_key) {
            debug!(path = path, "catalog cache hit");
            return Ok(value);
        }

        let response = self
            .http
            .get(format!("{}{}", self.api_base, path))
            .query(&[("api_key", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(CatalogError::NotFound(path.to_string())),
            status if !status.is_success() => {
                return Err(CatalogError::Upstream(format!("HTTP {} for {}", status.as_u16(), path)))
            }
            _ => {}
        }

        let value: Value = response.json().await?;
        self.cache.insert(cache_key, value.clone(), self.cache_ttl);
        Ok(value)
    }
}

#[async_trait]
impl Catalog for TmdbCatalog {
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, CatalogError> {
        let value = self.get_json("/search/multi", &[("query", query)]).await?;
        search_hits(value)
    }

    async fn identity(
        &self,
        kind: MediaKind,
        id: &str,
        season: Option<u32>,
        episode: Option<u32>,
    ) -> Result<MediaIdentity, CatalogError> {
        let path = format!("/{}/{}", kind.path_segment(), id);
        let value = self
            .get_json(&path, &[("append_to_response", "external_ids")])
            .await?;
        identity_from(value, kind, id, season, episode)
    }

    async fn seasons(&self, id: &str) -> Result<SeasonsResponse, CatalogError> {
        // same request as identity() so the cached payload is shared
        let value = self
            .get_json(&format!("/tv/{}", id), &[("append_to_response", "external_ids")])
            .await?;
        seasons_from(value)
    }

    async fn episodes(&self, id: &str, season: u32) -> Result<Vec<EpisodeSummary>, CatalogError> {
        let value = self.get_json(&format!("/tv/{}/season/{}", id, season), &[]).await?;
        episodes_from(value)
    }
}
