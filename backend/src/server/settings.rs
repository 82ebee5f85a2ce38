//! Server settings loaded via OrthoConfig.
//!
//! Values come from `SERVER_*` environment variables, an optional config
//! file, and command-line flags, in increasing order of precedence.

use std::net::SocketAddr;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use upvote::domain::TallyMode;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POOL_MAX_SIZE: u32 = 10;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid bind address '{value}': {source}")]
    BindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("SERVER_POOL_MAX_SIZE must be at least 1")]
    PoolMaxSize,
}

/// Listener and database settings for the HTTP server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "SERVER")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without one the server keeps data in memory.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub pool_max_size: Option<u32>,
    /// Skip embedded migrations at start-up.
    #[ortho_config(default = false)]
    pub skip_migrations: bool,
    /// `transactional` (default) or `sequential` vote count maintenance.
    pub tally_mode: Option<TallyMode>,
}

impl ServerSettings {
    /// Parse the configured bind address, falling back to `0.0.0.0:8080`.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|source| SettingsError::BindAddr {
            value: value.to_owned(),
            source,
        })
    }

    /// Configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Pool ceiling, defaulting to 10. Zero is rejected.
    pub fn pool_max_size(&self) -> Result<u32, SettingsError> {
        match self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE) {
            0 => Err(SettingsError::PoolMaxSize),
            size => Ok(size),
        }
    }

    pub fn tally_mode(&self) -> TallyMode {
        self.tally_mode.unwrap_or_default()
    }
}
