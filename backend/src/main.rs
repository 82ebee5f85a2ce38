//! Backend entry-point: loads settings, prepares persistence, and serves the API.

mod server;

use actix_web::web;
#[cfg(feature = "metrics")]
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, ServerSettings, create_server};
use upvote::domain::TokenSettings;
use upvote::inbound::http::health::HealthState;
use upvote::inbound::http::token_config::{BuildMode, token_settings_from_env};
use upvote::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load().map_err(|e| std::io::Error::other(e.to_string()))?;
    let config = build_server_config(&settings).await?;

    #[cfg(feature = "metrics")]
    let config = config.with_metrics(initialize_metrics(|| {
        PrometheusMetricsBuilder::new("upvote")
            .endpoint("/metrics")
            .build()
    }));

    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config)?.await
}

/// Resolve token settings, bind address, and (when configured) the database.
async fn build_server_config(settings: &ServerSettings) -> std::io::Result<ServerConfig> {
    let token_settings = token_settings(BuildMode::from_debug_assertions())?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let tally_mode = settings.tally_mode();
    let config = ServerConfig::new(token_settings, bind_addr).with_tally_mode(tally_mode);

    let Some(database_url) = settings.database_url() else {
        return Ok(config);
    };
    let pool_max_size = settings.pool_max_size().map_err(std::io::Error::other)?;
    if settings.skip_migrations {
        info!("skipping database migrations");
    } else {
        run_pending_migrations(database_url)
            .await
            .map_err(std::io::Error::other)?;
    }
    let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(pool_max_size))
        .await
        .map_err(std::io::Error::other)?;
    Ok(config.with_db_pool(pool))
}

/// Token signing settings read from the process environment.
fn token_settings(mode: BuildMode) -> std::io::Result<TokenSettings> {
    token_settings_from_env(&DefaultEnv::new(), mode).map_err(std::io::Error::other)
}

/// Build Prometheus middleware, serving without metrics when that fails.
#[cfg(feature = "metrics")]
fn initialize_metrics<F, E>(make: F) -> Option<PrometheusMetrics>
where
    F: FnOnce() -> Result<PrometheusMetrics, E>,
    E: std::fmt::Display,
{
    match make() {
        Ok(metrics) => Some(metrics),
        Err(e) => {
            warn!(error = %e, "Prometheus metrics disabled");
            None
        }
    }
}
