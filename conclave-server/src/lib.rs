pub mod config;
pub mod http;
pub mod room;
pub mod signaling;

use std::sync::Arc;

pub use config::ServerConfig;
pub use http::IceConfigService;
pub use room::RoomRegistry;
pub use signaling::{SignalingRelay, ws_handler};

/// Shared state behind every HTTP/WS handler.
pub struct AppState {
    pub relay: Arc<SignalingRelay>,
    pub ice: IceConfigService,
    pub config: ServerConfig,
}
