use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cti_lookup::{
    config::Config,
    create_router,
    feeds::ThreatFeeds,
    providers::{build_http_client, ProviderRegistry},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "cti_lookup=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    tracing::info!("CTI Lookup Server starting ({})...", config.environment);
    tracing::info!("Provider timeout: {:?}", config.provider_timeout);

    let http = build_http_client(config.provider_timeout)
        .context("Failed to create provider HTTP client")?;
    let registry = ProviderRegistry::from_config(&config, http.clone());
    let feeds = ThreatFeeds::from_config(&config, http);

    for provider in registry.iter().filter(|p| !p.is_configured()) {
        tracing::warn!("Provider {} has no API key; lookups will report an error", provider.name());
    }

    let state = AppState::new(config.clone(), registry, feeds);
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
