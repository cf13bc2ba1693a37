use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use conclave_core::{IceConfig, IceServerConfig};
use tracing::warn;

/// Server configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP/WS listener binds to.
    pub bind_addr: SocketAddr,
    /// Directory holding the room page.
    pub public_dir: PathBuf,
    /// Optional credential-service URL queried for short-lived TURN credentials.
    pub ice_upstream: Option<String>,
    /// Optional statically configured TURN server.
    pub turn: Option<IceServerConfig>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let bind_addr = match env::var("CONCLAVE_ADDR") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("CONCLAVE_ADDR is not a valid socket address, using default");
                default_addr()
            }),
            Err(_) => default_addr(),
        };

        let public_dir = env::var("CONCLAVE_PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("public"));

        let turn = env::var("TURN_URL").ok().map(|url| IceServerConfig {
            urls: vec![url],
            username: env::var("TURN_USERNAME").ok(),
            credential: env::var("TURN_CREDENTIAL").ok(),
        });

        Self {
            bind_addr,
            public_dir,
            ice_upstream: env::var("CONCLAVE_ICE_UPSTREAM").ok(),
            turn,
        }
    }

    /// Statically configured ICE servers, if any were provided.
    pub fn static_ice(&self) -> Option<IceConfig> {
        self.turn.clone().map(|server| IceConfig {
            ice_servers: vec![server],
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_addr(),
            public_dir: PathBuf::from("public"),
            ice_upstream: None,
            turn: None,
        }
    }
}

fn default_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}
