mod config;
mod models;
mod routes;
mod services;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::{
    aggregator::Aggregator,
    catalog::{Catalog, TmdbCatalog},
    http::{Fetch, HttpFetcher},
    mirror::MirrorResolver,
    providers::{build_layers, ManualOverrides, ProvidersConfig},
};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub aggregator: Aggregator,
    pub catalog: Option<Arc<dyn Catalog>>,
    pub mirrors: Arc<MirrorResolver>,
    pub start_time: Instant,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wellplayer_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting WellPlayer Server v{}", env!("CARGO_PKG_VERSION"));

    // Outbound HTTP shared by every provider and the mirror prober
    let fetch: Arc<dyn Fetch> = Arc::new(HttpFetcher::new(&config)?);

    // Provider table
    let providers = match &config.providers_file {
        Some(path) => {
            tracing::info!("Loading providers from {}", path);
            ProvidersConfig::load(path)?
        }
        None => ProvidersConfig::default(),
    };

    let manual = match &config.manual_links_file {
        Some(path) => {
            let manual = ManualOverrides::load(path)?;
            tracing::info!("Manual links loaded: {} titles", manual.len());
            Some(manual)
        }
        None => None,
    };

    let (layers, mirrors) = build_layers(&config, &providers, manual, fetch);
    if layers.is_empty() {
        tracing::warn!("No provider layers configured, every link request will 404");
    }
    let aggregator = Aggregator::new(layers, config.aggregator_settings());

    // Catalog is optional: without a key links resolve by id only
    let catalog = TmdbCatalog::from_config(&config)?.map(|c| Arc::new(c) as Arc<dyn Catalog>);
    if catalog.is_none() {
        tracing::warn!("TMDB_API_KEY not set, /search, /tv and /episodes are unavailable");
    }

    // Build application state
    let state = Arc::new(AppState {
        config,
        aggregator,
        catalog,
        mirrors,
        start_time: Instant::now(),
    });

    let app = routes::router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
