use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;

use crate::models::{
    EpisodeLinks, EpisodesQuery, EpisodesResponse, LinkQuery, LinksResponse, MediaIdentity,
    MediaKind, ResolvedLink, SearchQuery,
};
use crate::services::catalog::Catalog;
use crate::services::error::CatalogError;
use crate::services::query::split_language_hints;
use crate::AppState;

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(serde_json::json!({ "error": message.into() })))
}

fn require_catalog(state: &AppState) -> Result<&Arc<dyn Catalog>, ApiError> {
    state
        .catalog
        .as_ref()
        .ok_or_else(|| catalog_error(CatalogError::NotConfigured, ""))
}

fn catalog_error(err: CatalogError, not_found: &str) -> ApiError {
    match err {
        CatalogError::NotFound(_) => api_error(StatusCode::NOT_FOUND, not_found),
        CatalogError::NotConfigured => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "TMDB_API_KEY is not configured.",
        ),
        CatalogError::Upstream(_) => {
            tracing::warn!(error = %err, "catalog request failed");
            api_error(StatusCode::BAD_GATEWAY, "Catalog is unavailable, try again later.")
        }
    }
}

/// Identity from the catalog; without one (no key, lookup failure) the id
/// alone is used, titled from the free-text query when given
async fn lookup_identity(
    state: &AppState,
    kind: MediaKind,
    id: &str,
    season: Option<u32>,
    episode: Option<u32>,
    query: &LinkQuery,
) -> MediaIdentity {
    if let Some(catalog) = &state.catalog {
        match catalog.identity(kind, id, season, episode).await {
            Ok(identity) => return identity,
            Err(e) => tracing::warn!(
                id = id,
                kind = %kind,
                error = %e,
                "catalog lookup failed, resolving by id only"
            ),
        }
    }

    let title = query
        .q
        .as_deref()
        .map(|q| split_language_hints(q).base_title)
        .unwrap_or_default();
    match kind {
        MediaKind::Movie => MediaIdentity::movie(id, title, ""),
        MediaKind::Series => {
            MediaIdentity::episode(id, title, "", season.unwrap_or(1), episode.unwrap_or(1))
        }
    }
}

/// GET /search?query= - Catalog search, language words stripped from the query
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let query = params
        .query
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "A 'query' parameter is required."))?;
    let catalog = require_catalog(&state)?;

    let hints = split_language_hints(&query);
    let hits = catalog
        .search(&hints.base_title)
        .await
        .map_err(|e| catalog_error(e, &format!("Could not find '{}'.", query)))?;

    if hits.is_empty() {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            format!("Could not find '{}'.", query),
        ));
    }

    Ok(Json(hits))
}

/// GET /movie/:id - Links for a movie
pub async fn movie_links(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Query(params): Query<LinkQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = id.to_string();
    let identity = lookup_identity(&state, MediaKind::Movie, &id, None, None, &params).await;
    let links = state.aggregator.resolve(&identity, &params.to_options()).await;

    if links.is_empty() {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            "No streaming links found for this movie.",
        ));
    }

    Ok(Json(LinksResponse { links }))
}

/// GET /tv/:id - Seasons of a series
pub async fn tv_seasons(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    let catalog = require_catalog(&state)?;
    let seasons = catalog
        .seasons(&id.to_string())
        .await
        .map_err(|e| catalog_error(e, "TV show not found."))?;

    Ok(Json(seasons))
}

/// GET /tv/:id/:season/:episode - Links for one episode
pub async fn episode_links(
    State(state): State<Arc<AppState>>,
    Path((id, season, episode)): Path<(u64, u32, u32)>,
    Query(params): Query<LinkQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = id.to_string();
    let identity = lookup_identity(
        &state,
        MediaKind::Series,
        &id,
        Some(season),
        Some(episode),
        &params,
    )
    .await;
    let links = state.aggregator.resolve(&identity, &params.to_options()).await;

    if links.is_empty() {
        return Err(api_error(
            StatusCode::NOT_FOUND,
            "No streaming links found for this episode.",
        ));
    }

    Ok(Json(LinksResponse { links }))
}

/// GET /episodes?tmdb_id=&season= - Links for every episode of a season.
///
/// Episode 1 is resolved once and its links are re-pointed at each episode.
pub async fn season_episodes(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EpisodesQuery>,
    Query(link_params): Query<LinkQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (Some(id), Some(season)) = (
        params.tmdb_id.filter(|id| !id.trim().is_empty()),
        params.season,
    ) else {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "tmdb_id and season are required.",
        ));
    };
    let id = id.trim().to_string();
    let catalog = require_catalog(&state)?;

    let not_found = "Could not find episodes for this season.";
    let episodes = catalog
        .episodes(&id, season)
        .await
        .map_err(|e| catalog_error(e, not_found))?;
    if episodes.is_empty() {
        return Err(api_error(StatusCode::NOT_FOUND, not_found));
    }

    let identity = lookup_identity(
        &state,
        MediaKind::Series,
        &id,
        Some(season),
        Some(1),
        &link_params,
    )
    .await;
    let first = state
        .aggregator
        .resolve(&identity, &link_params.to_options())
        .await;

    let episodes = episodes
        .into_iter()
        .map(|ep| EpisodeLinks {
            episode: ep.episode_number,
            title: ep
                .name
                .unwrap_or_else(|| format!("Episode {}", ep.episode_number)),
            links: first
                .iter()
                .map(|link| ResolvedLink {
                    url: rewrite_episode(&link.url, season, ep.episode_number),
                    ..link.clone()
                })
                .collect(),
        })
        .collect();

    Ok(Json(EpisodesResponse { season, episodes }))
}

lazy_static! {
    static ref QUERY_EPISODE: Regex = Regex::new(r"(?i)([?&](?:e|ep|episode)=)\d+").unwrap();
    static ref TRAILING_EPISODE: Regex = Regex::new(r"(?i)(e)\d+$").unwrap();
}

/// Point an episode URL at another episode of the same season.
/// URLs with no recognisable episode marker are returned unchanged.
pub fn rewrite_episode(url: &str, season: u32, episode: u32) -> String {
    if QUERY_EPISODE.is_match(url) {
        return QUERY_EPISODE
            .replace(url, format!("${{1}}{}", episode).as_str())
            .into_owned();
    }

    // ".../{season}-{episode}" and ".../{season}/{episode}"
    if let Ok(path) = Regex::new(&format!(r"(/{}[-/])\d+/?$", season)) {
        if path.is_match(url) {
            return path
                .replace(url, format!("${{1}}{}", episode).as_str())
                .into_owned();
        }
    }

    TRAILING_EPISODE
        .replace(url, format!("${{1}}{}", episode).as_str())
        .into_owned()
}
