/* src/state.rs */

use crate::{
    cache::ResultCache,
    config::AppConfig,
    engine::ResolutionEngine,
    ratelimit::RateGate,
    transport::{HttpTransport, Transport},
    upstream::UpstreamFetcher,
};
use anyhow::{Context, Result};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub engine: Arc<ResolutionEngine>,
}

impl AppState {
    /// Wires the engine over an arbitrary transport.
    #[must_use]
    pub fn with_transport(config: Arc<AppConfig>, transport: Arc<dyn Transport>) -> Self {
        let gate = Arc::new(RateGate::new(config.rate_limit_rps));
        let fetcher = UpstreamFetcher::new(
            config.upstreams.clone(),
            transport,
            gate,
            config.upstream_timeout,
        );
        let engine = ResolutionEngine::new(ResultCache::new(config.cache_ttl), fetcher);

        Self {
            config,
            engine: Arc::new(engine),
        }
    }
}

/// Builds the shared AppState with the production HTTP transport.
pub fn build_shared_state(config: Arc<AppConfig>) -> Result<Arc<AppState>> {
    let transport = HttpTransport::new().context("Failed to build upstream HTTP client")?;
    Ok(Arc::new(AppState::with_transport(
        config,
        Arc::new(transport),
    )))
}
