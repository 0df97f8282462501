//! Ladder seeding: populate the players table from apex-tier listings

use crate::client::RiotApiClient;
use crate::store::MatchStore;
use std::collections::HashSet;
use std::sync::Arc;

/// Seeds the players table with ladder PUUIDs
///
/// A tier that fails to resolve yields an empty list and the remaining
/// tiers are still processed. Never touches match or stat tables.
pub struct LadderSeeder {
    api: Arc<RiotApiClient>,
    store: Arc<dyn MatchStore>,
}

/// Drop repeated PUUIDs while preserving first-seen order across tiers
pub fn dedup_first_seen(pairs: Vec<(String, String)>) -> Vec<(String, String)> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    for (puuid, tier) in pairs {
        if seen.insert(puuid.clone()) {
            ordered.push((puuid, tier));
        }
    }
    ordered
}

impl LadderSeeder {
    pub fn new(api: Arc<RiotApiClient>, store: Arc<dyn MatchStore>) -> Self {
        Self { api, store }
    }

    /// Fetch each tier's ladder and insert every new player
    ///
    /// Returns the total number of players known after seeding.
    pub async fn seed(&self, tiers: &[String]) -> Result<i64, Box<dyn std::error::Error>> {
        let mut collected = Vec::new();
        for tier in tiers {
            let puuids = self.api.ladder_puuids(tier).await;
            log::info!("➡️ {} → {} players", tier, puuids.len());
            for puuid in puuids {
                collected.push((puuid, tier.to_uppercase()));
            }
        }

        let ordered = dedup_first_seen(collected);
        log::info!("✅ Total seed PUUIDs: {}", ordered.len());

        for (puuid, tier) in &ordered {
            self.store.insert_player(puuid, Some(tier), true)?;
        }

        let total = self.store.table_counts()?.players;
        log::info!("✅ Seeded ladders, {} players known", total);
        Ok(total)
    }
}
