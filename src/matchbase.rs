//! High-level orchestrator connecting the Riot API and persistent storage
//!
//! Owns the dual-copy safe-update protocol: mutations for a refresh run
//! happen on a working copy of the database while the live file stays
//! untouched and fully readable; `promote` then replaces the live file
//! with a single atomic rename, so readers only ever observe the
//! previous consistent snapshot or the next one.

use crate::client::RiotApiClient;
use crate::seeder::LadderSeeder;
use crate::store::{MatchStore, PlayerStatRow, SqliteStore, TableCounts};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Match ids requested per incremental player refresh
const REFRESH_MATCH_COUNT: usize = 10;

/// Orchestrator over the live/update database pair
///
/// Handles player verification and insertion, incremental updates using
/// minimal API calls, the dual-copy stage/promote cycle, and destructive
/// full rebuilds.
pub struct MatchBase {
    live_path: PathBuf,
    update_path: PathBuf,
    api: Arc<RiotApiClient>,
    store: Arc<SqliteStore>,
    refresh_min: Option<i64>,
    refresh_max: Option<i64>,
}

impl MatchBase {
    /// Open the live database (creating it if needed); the update copy is
    /// created lazily by [`MatchBase::stage_copy`]
    pub fn new(
        live_path: impl Into<PathBuf>,
        update_path: impl Into<PathBuf>,
        api: Arc<RiotApiClient>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let live_path = live_path.into();
        let store = Arc::new(SqliteStore::open(&live_path)?);
        Ok(Self {
            live_path,
            update_path: update_path.into(),
            api,
            store,
            refresh_min: None,
            refresh_max: None,
        })
    }

    /// Handle to whichever copy mutations currently target
    pub fn store(&self) -> Arc<SqliteStore> {
        Arc::clone(&self.store)
    }

    pub fn live_path(&self) -> &Path {
        &self.live_path
    }

    /// Global min/max refresh stamps, cached by
    /// [`MatchBase::compute_refresh_bounds`] for normalization consumers
    pub fn refresh_bounds(&self) -> (Option<i64>, Option<i64>) {
        (self.refresh_min, self.refresh_max)
    }

    pub fn compute_refresh_bounds(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let (min, max) = self.store.refresh_bounds()?;
        self.refresh_min = min;
        self.refresh_max = max;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Player management
    // -----------------------------------------------------------------

    /// Ensure a player exists in the database
    ///
    /// If missing, attempts a single profile fetch and inserts a minimal
    /// record. Keeps the database self-healing when new participants
    /// appear in matches during updates.
    pub async fn verify_player(&self, puuid: &str) -> Result<bool, Box<dyn std::error::Error>> {
        if self.store.player_exists(puuid)? {
            return Ok(true);
        }

        let Some(_summoner) = self.api.summoner(puuid).await else {
            log::warn!("⚠️ Failed to verify new player {}", truncate(puuid));
            return Ok(false);
        };

        let now = chrono::Utc::now().timestamp();
        self.store.insert_player(puuid, None, false)?;
        self.store.mark_refreshed(puuid, now)?;
        log::info!("🟢 Added new player {}…", truncate(puuid));
        Ok(true)
    }

    /// Minimal-cost refresh unit for one player
    ///
    /// Fetches recent match ids, skips ones already stored for that
    /// player, stores the player's own counters for the rest, and lets
    /// the sliding window trim to the 10 most recent. Re-running with no
    /// new upstream matches changes nothing.
    pub async fn refresh_player(&self, puuid: &str) -> Result<usize, Box<dyn std::error::Error>> {
        let ids = self.api.match_ids(puuid, REFRESH_MATCH_COUNT).await;
        if ids.is_empty() {
            return Ok(0);
        }

        let mut new_count = 0usize;
        for mid in ids {
            if self.store.has_player_stat(puuid, &mid)? {
                continue;
            }

            let Some(detail) = self.api.match_detail(&mid).await else {
                continue;
            };
            let info = detail.info;

            let Some(p) = info.participants.iter().find(|p| p.puuid == puuid) else {
                continue;
            };

            let timestamp = info
                .game_start_timestamp
                .unwrap_or_else(|| chrono::Utc::now().timestamp_millis());
            let role = if p.team_position.is_empty() {
                None
            } else {
                Some(p.team_position.clone())
            };

            self.store.upsert_player_stat(&PlayerStatRow {
                puuid: puuid.to_string(),
                match_id: mid,
                timestamp,
                role,
                kills: p.kills,
                deaths: p.deaths,
                assists: p.assists,
                gold: p.gold_earned,
                damage: p.total_damage_dealt_to_champions,
                vision: p.vision_score,
            })?;
            new_count += 1;
        }

        self.store
            .mark_refreshed(puuid, chrono::Utc::now().timestamp())?;
        log::info!("Updated {}… (+{} new)", truncate(puuid), new_count);
        Ok(new_count)
    }

    /// Iterate every known player and run a minimal update
    ///
    /// The standard periodic refresh operation; a failing player is
    /// logged and skipped, never aborting the batch.
    pub async fn refresh_all(
        &self,
        limit: Option<usize>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut players = self.store.all_players()?;
        if let Some(limit) = limit {
            players.truncate(limit);
        }

        for puuid in players {
            if let Err(e) = self.refresh_player(&puuid).await {
                log::warn!("⚠️ {}… skipped: {}", truncate(&puuid), e);
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Dual-copy safe update
    // -----------------------------------------------------------------

    /// Duplicate the live database into the update path and point all
    /// subsequent mutations at the copy
    ///
    /// The live file stays untouched and fully readable until
    /// [`MatchBase::promote`] runs.
    pub fn stage_copy(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if self.update_path.exists() {
            fs::remove_file(&self.update_path)?;
        }
        fs::copy(&self.live_path, &self.update_path)?;
        self.store = Arc::new(SqliteStore::open(&self.update_path)?);
        log::info!("📀 Copied live → update DB");
        Ok(())
    }

    /// Replace the live database with the update copy
    ///
    /// Uses a single atomic rename, so there is no window in which the
    /// live path has no consistent file. Mutations target the live copy
    /// again afterwards.
    pub fn promote(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if !self.update_path.exists() {
            return Err("no staged update database to promote".into());
        }
        fs::rename(&self.update_path, &self.live_path)?;
        self.store = Arc::new(SqliteStore::open(&self.live_path)?);
        log::info!("🚀 Promoted update DB → live");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Full rebuild
    // -----------------------------------------------------------------

    /// Destructive rebuild: delete the live file, reinitialize the
    /// schema, reseed the given ladder tiers, refresh every seeded
    /// player, and recompute the refresh bounds
    ///
    /// Any failure after the delete is surfaced to the caller; there is
    /// no live file to fall back to at that point.
    pub async fn rebuild_from_scratch(
        &mut self,
        seed_tiers: &[String],
    ) -> Result<(), Box<dyn std::error::Error>> {
        log::info!("🚧 Building database from scratch…");
        if self.live_path.exists() {
            fs::remove_file(&self.live_path)?;
        }
        self.store = Arc::new(SqliteStore::open(&self.live_path)?);

        let seeder = LadderSeeder::new(Arc::clone(&self.api), self.store());
        seeder.seed(seed_tiers).await?;

        self.refresh_all(None).await?;
        self.compute_refresh_bounds()?;
        log::info!("✅ Fresh database created");
        Ok(())
    }

    /// Row counts of whichever copy mutations currently target
    pub fn counts(&self) -> Result<TableCounts, Box<dyn std::error::Error>> {
        self.store.table_counts()
    }
}

fn truncate(puuid: &str) -> &str {
    &puuid[..puuid.len().min(8)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::tempdir;

    fn test_config() -> Config {
        Config {
            api_key: "RGAPI-test".to_string(),
            platform: "euw1".to_string(),
            region: "europe".to_string(),
            live_db_path: "unused".to_string(),
            update_db_path: "unused".to_string(),
            cache_dir: "unused".to_string(),
            request_limit: 5,
            cooldown_ms: 0,
            max_attempts: 1,
            seed_tiers: vec![],
            matches_per_player: 10,
            target_matches: 0,
            update_limit: None,
            max_feature_matches: None,
            report_interval: 5,
        }
    }

    fn make_base(dir: &Path) -> MatchBase {
        let api = Arc::new(RiotApiClient::new(&test_config()));
        MatchBase::new(dir.join("live.db"), dir.join("update.db"), api).unwrap()
    }

    #[test]
    fn test_stage_then_promote_is_byte_identical() {
        let dir = tempdir().unwrap();
        let mut base = make_base(dir.path());

        base.store().insert_player("p1", Some("MASTER"), true).unwrap();
        base.store().mark_refreshed("p1", 1_234).unwrap();

        let before = fs::read(base.live_path()).unwrap();

        base.stage_copy().unwrap();
        base.promote().unwrap();

        let after = fs::read(base.live_path()).unwrap();
        assert_eq!(before, after);
        assert!(!dir.path().join("update.db").exists());
    }

    #[test]
    fn test_stage_copy_replaces_stale_working_file() {
        let dir = tempdir().unwrap();
        let mut base = make_base(dir.path());

        fs::write(dir.path().join("update.db"), b"stale garbage").unwrap();
        base.stage_copy().unwrap();

        // The working copy is now a real database, not the stale file
        assert!(base.counts().is_ok());
    }

    #[test]
    fn test_mutations_target_update_copy_after_stage() {
        let dir = tempdir().unwrap();
        let mut base = make_base(dir.path());

        base.store().insert_player("existing", None, false).unwrap();
        base.stage_copy().unwrap();
        base.store().insert_player("staged_only", None, false).unwrap();

        // Live copy still holds the previous snapshot
        let live = SqliteStore::open(dir.path().join("live.db")).unwrap();
        assert!(!live.player_exists("staged_only").unwrap());
        drop(live);

        base.promote().unwrap();
        assert!(base.store().player_exists("staged_only").unwrap());
        assert!(base.store().player_exists("existing").unwrap());
    }

    #[test]
    fn test_promote_without_stage_fails() {
        let dir = tempdir().unwrap();
        let mut base = make_base(dir.path());
        assert!(base.promote().is_err());
        // The live file is untouched by the failed promote
        assert!(base.live_path().exists());
    }

    #[test]
    fn test_refresh_bounds_cached() {
        let dir = tempdir().unwrap();
        let mut base = make_base(dir.path());
        assert_eq!(base.refresh_bounds(), (None, None));

        base.store().insert_player("a", None, false).unwrap();
        base.store().mark_refreshed("a", 42).unwrap();
        base.compute_refresh_bounds().unwrap();
        assert_eq!(base.refresh_bounds(), (Some(42), Some(42)));
    }

    #[tokio::test]
    async fn test_verify_player_known_short_circuits() {
        let dir = tempdir().unwrap();
        let base = make_base(dir.path());

        base.store().insert_player("known", None, false).unwrap();
        // No API call happens for a known player
        assert!(base.verify_player("known").await.unwrap());
    }
}
