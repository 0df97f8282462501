//! Incremental update over the dual-copy protocol
//!
//! Snapshots the live counts, stages a working copy, refreshes every
//! player on the copy (live stays fully readable throughout), reports
//! the deltas, then atomically promotes the copy to live.
//!
//! Usage:
//!   cargo run --release --bin db_update
//!
//! Environment variables: see `Config::from_env`; `UPDATE_PLAYER_LIMIT`
//! caps the number of players refreshed.

use dotenv::dotenv;
use log::info;
use riftflow::{report, Config, MatchBase, RiotApiClient};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    info!("🚀 riftflow incremental update");
    info!("   ├─ Live DB: {}", config.live_db_path);
    info!("   ├─ Update DB: {}", config.update_db_path);
    match config.update_limit {
        Some(limit) => info!("   └─ Player limit: {}", limit),
        None => info!("   └─ Refreshing all players"),
    }

    let api = Arc::new(RiotApiClient::new(&config));
    let mut base = MatchBase::new(&config.live_db_path, &config.update_db_path, api)?;

    let before = base.counts()?;
    report::print_summary("Database snapshot (before)", &before);

    base.stage_copy()?;

    info!("⚙️  Updating players on update DB...");
    base.refresh_all(config.update_limit).await?;

    let after = base.counts()?;
    report::print_deltas(&before, &after);

    base.promote()?;

    let final_counts = base.counts()?;
    report::print_summary("Database snapshot (after promote)", &final_counts);
    Ok(())
}
