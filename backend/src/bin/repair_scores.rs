//! Score sugar events that were stored but never scored.
//!
//! An event whose points write failed keeps `points_earned` empty. This
//! command walks those events oldest first and scores them with the same
//! rules the live path uses.

use std::env;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{Context, Result, eyre};
use mockable::DefaultClock;
use tokio::runtime::Builder;
use tracing_subscriber::{EnvFilter, fmt};

use sugar_spike::domain::ports::ScoringRepair;
use sugar_spike::domain::{EngagementService, LocalCalendar};
use sugar_spike::outbound::persistence::{
    DbPool, DieselSugarEventRepository, DieselUserProfileRepository, PoolConfig,
};

/// `repair-scores` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "repair-scores",
    about = "Score stored sugar events whose points were never recorded",
    version
)]
struct CliArgs {
    /// Database connection URL. Falls back to `SPIKE_DATABASE_URL` when omitted.
    #[arg(long = "database-url", value_name = "url")]
    database_url: Option<String>,
    /// Maximum number of events to examine.
    #[arg(long, default_value_t = 500)]
    limit: usize,
    /// Local calendar offset in minutes east of UTC.
    #[arg(long = "utc-offset-minutes", default_value_t = 0, allow_hyphen_values = true)]
    utc_offset_minutes: i32,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        return Err(eyre!("tracing init failed: {error}"));
    }

    let args = CliArgs::parse();
    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("failed to build repair runtime")?;
    runtime.block_on(run(args))
}

async fn run(args: CliArgs) -> Result<()> {
    let database_url = resolve_database_url(args.database_url)?;
    let calendar = LocalCalendar::from_offset_minutes(args.utc_offset_minutes)
        .wrap_err("invalid --utc-offset-minutes")?;
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .wrap_err("failed to create database pool")?;

    let service = EngagementService::new(
        Arc::new(DieselSugarEventRepository::new(pool.clone())),
        Arc::new(DieselUserProfileRepository::new(pool)),
        Arc::new(DefaultClock),
    )
    .with_calendar(calendar);

    let report = service
        .repair_unscored(args.limit)
        .await
        .map_err(|error| eyre!("repair failed: {}", error.message()))?;

    println!("examined={}", report.examined);
    println!("repaired={}", report.repaired);
    println!("orphaned={}", report.orphaned);
    Ok(())
}

fn resolve_database_url(explicit: Option<String>) -> Result<String> {
    let value = match explicit {
        Some(value) => value,
        None => env::var("SPIKE_DATABASE_URL")
            .wrap_err("database URL missing: set --database-url or SPIKE_DATABASE_URL")?,
    };
    if value.trim().is_empty() {
        return Err(eyre!("database URL must not be empty"));
    }
    Ok(value)
}
