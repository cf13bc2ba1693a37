use std::time::Duration;

use conclave_core::IceConfig;
use tracing::{debug, warn};

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(2);

/// Resolves the ICE server list handed to clients.
///
/// Order: credential upstream (if configured), statically configured
/// servers, public STUN. Upstream failure is never surfaced to the caller;
/// joining a room must not depend on the credential service being up.
#[derive(Clone)]
pub struct IceConfigService {
    upstream: Option<String>,
    static_config: Option<IceConfig>,
    http: reqwest::Client,
}

impl IceConfigService {
    pub fn new(upstream: Option<String>, static_config: Option<IceConfig>) -> Self {
        Self {
            upstream,
            static_config,
            http: reqwest::Client::new(),
        }
    }

    pub async fn resolve(&self) -> IceConfig {
        if let Some(url) = &self.upstream {
            match self.fetch_upstream(url).await {
                Ok(config) => {
                    debug!("ice config resolved from credential upstream");
                    return config;
                }
                Err(e) => warn!("ice credential upstream failed, falling back: {e}"),
            }
        }
        self.static_config
            .clone()
            .unwrap_or_else(IceConfig::default_stun)
    }

    async fn fetch_upstream(&self, url: &str) -> Result<IceConfig, reqwest::Error> {
        self.http
            .get(url)
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await
    }
}
