//! Binary entry point: load configuration, wire adapters, serve.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing_subscriber::EnvFilter;

use huddle::adapters::auth::JwtAuthService;
use huddle::adapters::http::{router, AppState};
use huddle::adapters::realtime::RealtimeHub;
use huddle::adapters::storage::{InMemoryStore, PostgresStore};
use huddle::config::AppConfig;
use huddle::ports::{ChatStore, SessionValidator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    let store: Arc<dyn ChatStore> = match &config.database.url {
        Some(url) => {
            let store = PostgresStore::connect(&config.database, url).await?;
            tracing::info!("connected to postgres");
            Arc::new(store)
        }
        None => {
            tracing::warn!("no database url configured, using in-memory store");
            Arc::new(InMemoryStore::new())
        }
    };

    let tokens = Arc::new(JwtAuthService::new(
        &config.auth.jwt_secret,
        config.auth.token_ttl_hours,
    ));
    let validator: Arc<dyn SessionValidator> = tokens.clone();
    let hub = Arc::new(RealtimeHub::new(Arc::clone(&store)));

    let state = AppState::new(store, tokens, validator, hub, config.auth.bcrypt_cost);

    let app = router(state)
        .layer(cors_layer(&config))
        .layer(TimeoutLayer::new(Duration::from_secs(30)));

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.server.is_production() {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    if origins.is_empty() {
        layer.allow_origin(Any)
    } else {
        layer.allow_origin(origins)
    }
}
