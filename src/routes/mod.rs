pub mod health;
pub mod media;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health endpoints
        .route("/", get(health::root))
        .route("/health", get(health::health_check))
        .route("/metrics", get(health::metrics))
        .route("/live", get(health::live))
        // Catalog
        .route("/search", get(media::search))
        .route("/tv/:id", get(media::tv_seasons))
        // Links
        .route("/movie/:id", get(media::movie_links))
        .route("/tv/:id/:season/:episode", get(media::episode_links))
        .route("/episodes", get(media::season_episodes))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use std::sync::Mutex;
    use std::time::Instant;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::models::{
        EpisodeSummary, MediaIdentity, MediaKind, RequestOptions, ResolvedLink, SearchHit,
        SeasonsResponse,
    };
    use crate::services::aggregator::{Aggregator, AggregatorSettings, Layer, LayerPolicy};
    use crate::services::catalog::Catalog;
    use crate::services::error::{CatalogError, ProviderError};
    use crate::services::http::testing::FakeFetch;
    use crate::services::mirror::{MirrorResolver, MirrorSettings};
    use crate::services::providers::{build_layers, LinkProvider, ProvidersConfig};

    struct FixedProvider {
        seen: Mutex<Vec<MediaIdentity>>,
    }

    #[async_trait]
    impl LinkProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn fetch_links(
            &self,
            identity: &MediaIdentity,
            _options: &RequestOptions,
        ) -> Result<Vec<ResolvedLink>, ProviderError> {
            self.seen.lock().unwrap().push(identity.clone());
            let url = match identity.media_kind {
                MediaKind::Movie => {
                    format!("https://embed.example/movie/{}", identity.canonical_id)
                }
                MediaKind::Series => format!(
                    "https://embed.example/tv?tmdb={}&season={}&episode={}",
                    identity.canonical_id,
                    identity.season.unwrap_or(1),
                    identity.episode.unwrap_or(1)
                ),
            };
            Ok(vec![ResolvedLink::embed(url, "fixed")])
        }
    }

    #[derive(Default)]
    struct FakeCatalog {
        searched: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Catalog for FakeCatalog {
        async fn search(&self, query: &str) -> Result<Vec<SearchHit>, CatalogError> {
            self.searched.lock().unwrap().push(query.to_string());
            if query != "Dune" {
                return Ok(Vec::new());
            }
            Ok(vec![SearchHit {
                id: 438631,
                kind: MediaKind::Movie,
                title: "Dune".into(),
                year: "2021".into(),
                poster_path: None,
            }])
        }

        async fn identity(
            &self,
            kind: MediaKind,
            id: &str,
            season: Option<u32>,
            episode: Option<u32>,
        ) -> Result<MediaIdentity, CatalogError> {
            Ok(match kind {
                MediaKind::Movie => MediaIdentity::movie(id, "Dune", "2021"),
                MediaKind::Series => MediaIdentity::episode(
                    id,
                    "Game of Thrones",
                    "2011",
                    season.unwrap_or(1),
                    episode.unwrap_or(1),
                ),
            })
        }

        async fn seasons(&self, id: &str) -> Result<SeasonsResponse, CatalogError> {
            Err(CatalogError::NotFound(format!("/tv/{}", id)))
        }

        async fn episodes(
            &self,
            _id: &str,
            _season: u32,
        ) -> Result<Vec<EpisodeSummary>, CatalogError> {
            Ok(vec![
                EpisodeSummary {
                    episode_number: 1,
                    name: Some("Winter Is Coming".into()),
                },
                EpisodeSummary {
                    episode_number: 2,
                    name: None,
                },
            ])
        }
    }

    fn state(
        with_provider: bool,
        catalog: Option<Arc<dyn Catalog>>,
    ) -> (Arc<AppState>, Arc<FixedProvider>) {
        let provider = Arc::new(FixedProvider {
            seen: Mutex::new(Vec::new()),
        });
        let mut layers = Vec::new();
        if with_provider {
            layers.push(
                Layer::new("identifier", LayerPolicy::Gather { concurrency: 2 })
                    .with_provider(provider.clone()),
            );
        }
        let mirrors = MirrorResolver::new(Arc::new(FakeFetch::new()), MirrorSettings::default());
        let state = Arc::new(AppState {
            config: Config::from_env(),
            aggregator: Aggregator::new(layers, AggregatorSettings::default()),
            catalog,
            mirrors: Arc::new(mirrors),
            start_time: Instant::now(),
        });
        (state, provider)
    }

    async fn get(state: Arc<AppState>, uri: &str) -> (StatusCode, Value) {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_movie_without_links_is_404() {
        let (state, _) = state(false, None);
        let (status, body) = get(state, "/movie/550").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "No streaming links found for this movie.");
    }

    #[tokio::test]
    async fn test_movie_links_titled_from_query_without_catalog() {
        let (state, provider) = state(true, None);
        let (status, body) = get(state, "/movie/550?q=Fight%20Club%20hindi&strict=false").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["links"][0]["url"], "https://embed.example/movie/550");
        assert_eq!(body["links"][0]["kind"], "embed");
        assert_eq!(body["links"][0]["quality"], "auto");
        assert_eq!(body["links"][0]["audioLang"], "original");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0].title, "Fight Club");
        assert_eq!(seen[0].canonical_id, "550");
    }

    #[tokio::test]
    async fn test_search_validation() {
        let (state, _) = state(true, None);
        let (status, _) = get(state.clone(), "/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get(state, "/search?query=Dune").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "TMDB_API_KEY is not configured.");
    }

    #[tokio::test]
    async fn test_search_strips_language_words() {
        let catalog = Arc::new(FakeCatalog::default());
        let (state, _) = state(true, Some(catalog.clone()));

        let (status, body) = get(state.clone(), "/search?query=Dune%20hindi%20dubbed").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["id"], 438631);
        assert_eq!(body[0]["type"], "movie");
        assert_eq!(catalog.searched.lock().unwrap()[0], "Dune");

        let (status, body) = get(state, "/search?query=Nothing").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Could not find 'Nothing'.");
    }

    #[tokio::test]
    async fn test_episode_fan_out_rewrites_urls() {
        let (state, provider) = state(true, Some(Arc::new(FakeCatalog::default())));
        let (status, body) = get(state, "/episodes?tmdb_id=1399&season=2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["season"], 2);
        assert_eq!(body["episodes"][0]["title"], "Winter Is Coming");
        assert_eq!(body["episodes"][1]["title"], "Episode 2");
        assert_eq!(
            body["episodes"][1]["links"][0]["url"],
            "https://embed.example/tv?tmdb=1399&season=2&episode=2"
        );
        assert_eq!(provider.seen.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_episodes_requires_params_and_tv_not_found() {
        let (state, _) = state(true, Some(Arc::new(FakeCatalog::default())));
        let (status, _) = get(state.clone(), "/episodes?tmdb_id=1399").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = get(state.clone(), "/tv/1399").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "TV show not found.");

        let (status, body) = get(state, "/tv/1399/1/3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["links"][0]["url"],
            "https://embed.example/tv?tmdb=1399&season=1&episode=3"
        );
    }

    #[tokio::test]
    async fn test_search_keeps_english_in_title() {
        let catalog = Arc::new(FakeCatalog::default());
        let (state, _) = state(true, Some(catalog.clone()));

        let (status, _) = get(state, "/search?query=Johnny%20English").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(catalog.searched.lock().unwrap()[0], "Johnny English");
    }

    #[tokio::test]
    async fn test_router_serves_links_from_configured_layers() {
        let mut config = Config::from_env();
        config.disabled_layers.clear();
        let providers = ProvidersConfig::from_json(
            r#"{
                "identifier": [
                    {"name": "one", "movie_template": "https://one.example/embed/{id}"},
                    {"name": "two", "movie_template": "https://two.example/movie?tmdb={id}"}
                ]
            }"#,
        )
        .unwrap();
        let (layers, mirrors) =
            build_layers(&config, &providers, None, Arc::new(FakeFetch::new()));
        let state = Arc::new(AppState {
            aggregator: Aggregator::new(layers, config.aggregator_settings()),
            config,
            catalog: None,
            mirrors,
            start_time: Instant::now(),
        });

        let (status, body) = get(state, "/movie/550").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["links"][0]["url"], "https://one.example/embed/550");
        assert_eq!(body["links"][1]["url"], "https://two.example/movie?tmdb=550");
    }

    #[tokio::test]
    async fn test_health() {
        let (state, _) = state(true, None);
        let (status, body) = get(state, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["catalog"], false);
        assert_eq!(body["layers"][0], "identifier");
    }
}
