use std::sync::Arc;

use axum::extract::State;
use axum::response::Redirect;
use axum::routing::get;
use axum::{Json, Router};
use conclave_core::IceConfig;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeFile;

use crate::AppState;
use crate::signaling::ws_handler;

pub fn router(state: Arc<AppState>) -> Router {
    let room_page = ServeFile::new(state.config.public_dir.join("room.html"));
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(new_room_redirect))
        .route("/ws", get(ws_handler))
        .route("/ice-config", get(ice_config))
        .route_service("/{room}", room_page)
        .layer(cors)
        .with_state(state)
}

/// Visiting the root lands you in a freshly named room.
async fn new_room_redirect() -> Redirect {
    Redirect::to(&format!("/{}", generate_room_id()))
}

async fn ice_config(State(state): State<Arc<AppState>>) -> Json<IceConfig> {
    Json(state.ice.resolve().await)
}

/// Short, URL-safe room name.
pub fn generate_room_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}
