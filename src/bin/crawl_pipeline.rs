//! Crawl pipeline: seed the ladder tiers, then crawl matches until the
//! target count is reached
//!
//! Usage:
//!   cargo run --release --bin crawl_pipeline
//!
//! Environment variables: see `Config::from_env` (RIOT_API_KEY required).

use dotenv::dotenv;
use log::info;
use riftflow::{report, Config, LadderSeeder, MatchCrawler, MatchStore, RiotApiClient, SqliteStore};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    info!("🚀 riftflow crawl pipeline");
    info!("   ├─ Database: {}", config.live_db_path);
    info!("   ├─ Seed tiers: {}", config.seed_tiers.join(", "));
    info!("   ├─ Matches per player: {}", config.matches_per_player);
    info!("   └─ Target matches: {}", config.target_matches);

    let api = Arc::new(RiotApiClient::new(&config));
    let store = Arc::new(SqliteStore::open(&config.live_db_path)?);

    let before = store.table_counts()?;
    report::print_summary("Database snapshot (before)", &before);

    let seeder = LadderSeeder::new(Arc::clone(&api), store.clone());
    seeder.seed(&config.seed_tiers).await?;

    let crawler = MatchCrawler::new(
        api,
        store.clone(),
        config.matches_per_player,
        config.target_matches,
    );
    crawler.run().await?;

    let after = store.table_counts()?;
    report::print_deltas(&before, &after);
    Ok(())
}
