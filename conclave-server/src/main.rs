use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use conclave_server::{AppState, IceConfigService, RoomRegistry, ServerConfig, SignalingRelay, http};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env();

    let registry = Arc::new(RoomRegistry::new());
    let relay = Arc::new(SignalingRelay::new(registry));
    let ice = IceConfigService::new(config.ice_upstream.clone(), config.static_ice());

    let state = Arc::new(AppState {
        relay,
        ice,
        config,
    });
    let app = http::router(state.clone());

    let listener = tokio::net::TcpListener::bind(state.config.bind_addr).await?;
    info!("signaling server listening on http://{}", state.config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
