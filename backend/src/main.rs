//! Backend entry-point: loads settings, selects the store, and serves the API.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use server::{ServerConfig, ServerSettings, create_server};
use sugar_spike::inbound::http::health::HealthState;
use sugar_spike::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};

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

    let settings = ServerSettings::load_from_iter(std::env::args_os())
        .map_err(|e| std::io::Error::other(format!("failed to load settings: {e}")))?;
    let mut config = ServerConfig::from_settings(&settings).map_err(std::io::Error::other)?;

    match settings.database_url.as_deref() {
        Some(database_url) => {
            if settings.run_migrations() {
                run_pending_migrations(database_url)
                    .await
                    .map_err(std::io::Error::other)?;
            }
            let pool = DbPool::new(
                PoolConfig::new(database_url).with_connection_timeout(config.store_timeout),
            )
            .await
            .map_err(std::io::Error::other)?;
            config = config.with_db_pool(pool);
        }
        None => {
            warn!("SPIKE_DATABASE_URL not set; events are kept in memory only");
        }
    }

    info!(bind_addr = %config.bind_addr, "starting engagement server");
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    let outcome = server.await;
    health_state.mark_unhealthy();
    outcome
}
