//! Profile sync entry-point: loads configuration, prepares the store and
//! serves the REST endpoints.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use profile_sync::config::ServiceSettings;
use profile_sync::inbound::http::health::HealthState;
use profile_sync::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use server::{ServerConfig, create_server};

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

    let settings = ServiceSettings::load()
        .map_err(|e| std::io::Error::other(format!("failed to load configuration: {e}")))?;
    let defaults = settings.default_settings().map_err(std::io::Error::other)?;

    let mut config = ServerConfig::new(
        settings.bind_addr(),
        settings.transaction_timeout(),
        defaults,
    );

    if let Some(database_url) = settings.database_url.as_deref() {
        let applied = run_pending_migrations(database_url)
            .await
            .map_err(std::io::Error::other)?;
        info!(applied, "database migrations complete");

        let pool = DbPool::new(
            PoolConfig::new(database_url).with_max_size(settings.pool_max_size),
        )
        .await
        .map_err(std::io::Error::other)?;
        config = config.with_db_pool(pool);
    }

    info!(bind_addr = %config.bind_addr(), "starting profile sync server");
    let health_state = web::Data::new(HealthState::new());
    create_server(health_state, config)?.await
}
