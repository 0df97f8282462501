//! Feature pipeline: build per-player feature vectors for every
//! feature-incomplete match, resumable across restarts
//!
//! Usage:
//!   cargo run --release --bin feature_pipeline
//!
//! Environment variables: see `Config::from_env`; `FEATURE_MAX_MATCHES`
//! caps one run, `FEATURE_REPORT_INTERVAL` controls progress reports.

use dotenv::dotenv;
use log::info;
use riftflow::{report, Config, FeatureBuilder, MatchStore, RiotApiClient, SqliteStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    info!("🚀 riftflow feature pipeline");
    info!("   ├─ Database: {}", config.live_db_path);
    info!("   ├─ Cache dir: {}", config.cache_dir);
    match config.max_feature_matches {
        Some(cap) => info!("   └─ Max matches this run: {}", cap),
        None => info!("   └─ Running until all matches are complete"),
    }

    let api = Arc::new(RiotApiClient::new(&config));
    let store = Arc::new(SqliteStore::open(&config.live_db_path)?);

    let before = store.table_counts()?;
    report::print_summary("Database snapshot (before)", &before);

    let builder = FeatureBuilder::new(api, store.clone(), &config.cache_dir)?;
    builder
        .run(config.max_feature_matches, config.report_interval)
        .await?;

    let after = store.table_counts()?;
    report::print_deltas(&before, &after);
    Ok(())
}
