//! Destructive full rebuild of the live database
//!
//! Deletes the live file, reinitializes the schema, reseeds the first
//! configured ladder tier, refreshes every seeded player, and recomputes
//! the global refresh bounds. Used for first runs; any failure after the
//! delete is fatal and surfaced.
//!
//! Usage:
//!   cargo run --release --bin rebuild_live_db

use dotenv::dotenv;
use log::info;
use riftflow::{report, Config, MatchBase, RiotApiClient};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    info!("🏗️  riftflow full rebuild");
    info!("   └─ Live DB: {}", config.live_db_path);

    let api = Arc::new(RiotApiClient::new(&config));
    let mut base = MatchBase::new(&config.live_db_path, &config.update_db_path, api)?;

    let before = base.counts()?;
    report::print_summary("Database snapshot (before)", &before);

    // Rebuilds reseed a single tier; a follow-up crawl widens the pool
    let seed_tiers: Vec<String> = config.seed_tiers.iter().take(1).cloned().collect();
    base.rebuild_from_scratch(&seed_tiers).await?;

    let counts = base.counts()?;
    report::print_summary("Database summary after build", &counts);
    Ok(())
}
