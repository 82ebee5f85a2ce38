//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use upvote::domain::{TallyMode, TokenSettings};
use upvote::outbound::persistence::DbPool;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) token_settings: TokenSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) tally_mode: TallyMode,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Configuration serving from memory until a pool is attached.
    #[must_use]
    pub fn new(token_settings: TokenSettings, bind_addr: SocketAddr) -> Self {
        Self {
            token_settings,
            bind_addr,
            db_pool: None,
            tally_mode: TallyMode::default(),
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Attach a database connection pool; repositories become Diesel-backed.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Choose how vote counts are written back to posts.
    #[must_use]
    pub fn with_tally_mode(mut self, mode: TallyMode) -> Self {
        self.tally_mode = mode;
        self
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
