//! Resumable per-player feature aggregation
//!
//! Walks feature-incomplete matches oldest-first and enriches each of
//! the 10 participants with a static profile (rank, level, mastery,
//! challenges) and a rolling aggregate over their recent match history.
//! Every feature row is written immediately, so a restart resumes at the
//! first match whose `vector_complete` flag never flipped.
//!
//! Match histories are cached one JSON file per player under the cache
//! directory and read through before any refetch.

use crate::client::{MatchDto, RiotApiClient};
use crate::crawler::compute_label;
use crate::store::{MatchStore, PlayerFeatureRow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

/// History depth for the rolling aggregate
const HISTORY_DEPTH: usize = 10;

/// Fixed mapping from ladder tier to a normalized model input in [0, 1]
///
/// Unknown or missing tiers land on 0.3 (the population median bracket).
pub fn tier_to_norm(tier: Option<&str>) -> f64 {
    match tier.map(|t| t.to_uppercase()).as_deref() {
        Some("IRON") => 0.05,
        Some("BRONZE") => 0.1,
        Some("SILVER") => 0.2,
        Some("GOLD") => 0.3,
        Some("PLATINUM") => 0.4,
        Some("EMERALD") => 0.5,
        Some("DIAMOND") => 0.6,
        Some("MASTER") => 0.75,
        Some("GRANDMASTER") => 0.9,
        Some("CHALLENGER") => 1.0,
        _ => 0.3,
    }
}

/// Static profile snapshot persisted as `static_json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticProfile {
    pub tier: Option<String>,
    pub rank: Option<String>,
    pub league_points: Option<i64>,
    pub summoner_level: Option<i64>,
    pub profile_icon: Option<i64>,
    pub mastery_score: Option<f64>,
    pub challenge_points: Option<f64>,
    pub tier_norm: f64,
}

/// Rolling means over a player's recent match history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryAggregate {
    pub kills_avg: f64,
    pub deaths_avg: f64,
    pub assists_avg: f64,
    pub kda: f64,
    pub gold_per_min: f64,
    pub cs_per_min: f64,
    pub vision_score: f64,
    pub damage_to_champs: f64,
    pub win_rate_recent: f64,
}

/// Full dynamic blob persisted as `dynamic_json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicFeatures {
    #[serde(flatten)]
    pub history: Option<HistoryAggregate>,
    pub label: f64,
    pub tier_norm: f64,
}

/// Mean per-match counters for one player across their history
///
/// Matches where the player does not appear are skipped; `None` when the
/// history holds no appearances at all.
pub fn aggregate_history(matches: &[MatchDto], puuid: &str) -> Option<HistoryAggregate> {
    let mut kills = Vec::new();
    let mut deaths = Vec::new();
    let mut assists = Vec::new();
    let mut gpm = Vec::new();
    let mut cspm = Vec::new();
    let mut vision = Vec::new();
    let mut damage = Vec::new();
    let mut wins = Vec::new();

    for m in matches.iter().take(HISTORY_DEPTH) {
        let minutes = (m.info.game_duration.unwrap_or(1) as f64 / 60.0).max(1.0);
        if let Some(p) = m.info.participants.iter().find(|p| p.puuid == puuid) {
            kills.push(p.kills as f64);
            deaths.push(p.deaths as f64);
            assists.push(p.assists as f64);
            gpm.push(p.gold_earned as f64 / minutes);
            cspm.push((p.total_minions_killed + p.neutral_minions_killed) as f64 / minutes);
            vision.push(p.vision_score as f64);
            damage.push(p.total_damage_dealt_to_champions as f64);
            wins.push(if p.win { 1.0 } else { 0.0 });
        }
    }

    if kills.is_empty() {
        return None;
    }

    let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;
    let kills_avg = mean(&kills);
    let deaths_avg = mean(&deaths);
    let assists_avg = mean(&assists);

    Some(HistoryAggregate {
        kills_avg,
        deaths_avg,
        assists_avg,
        kda: (kills_avg + assists_avg) / deaths_avg.max(1.0),
        gold_per_min: mean(&gpm),
        cs_per_min: mean(&cspm),
        vision_score: mean(&vision),
        damage_to_champs: mean(&damage),
        win_rate_recent: mean(&wins),
    })
}

/// Builds player feature vectors match by match, resumable across runs
pub struct FeatureBuilder {
    api: Arc<RiotApiClient>,
    store: Arc<dyn MatchStore>,
    cache_dir: PathBuf,
}

impl FeatureBuilder {
    pub fn new(
        api: Arc<RiotApiClient>,
        store: Arc<dyn MatchStore>,
        cache_dir: impl Into<PathBuf>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir)?;
        Ok(Self {
            api,
            store,
            cache_dir,
        })
    }

    /// Cached static profile from the feature table, if parsable
    fn cached_static(&self, puuid: &str) -> Option<StaticProfile> {
        let raw = self.store.feature_static_json(puuid).ok().flatten()?;
        serde_json::from_str(&raw).ok()
    }

    /// Pull rank / level / mastery / challenges from the API
    async fn fetch_remote_statics(&self, puuid: &str) -> StaticProfile {
        let mut statics = StaticProfile::default();

        if let Some(entry) = self.api.solo_queue_entry(puuid).await {
            statics.tier = entry.tier;
            statics.rank = entry.rank;
            statics.league_points = entry.league_points;
        }
        if let Some(summoner) = self.api.summoner(puuid).await {
            statics.summoner_level = summoner.summoner_level;
            statics.profile_icon = summoner.profile_icon_id;
        }
        statics.mastery_score = self.api.mastery_score(puuid).await;
        statics.challenge_points = self.api.challenge_points(puuid).await;
        statics.tier_norm = tier_to_norm(statics.tier.as_deref());

        statics
    }

    fn cache_file(&self, puuid: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", puuid))
    }

    /// Recent match history, read through the per-player file cache
    async fn fetch_history(&self, puuid: &str) -> Vec<MatchDto> {
        let cache_file = self.cache_file(puuid);
        if let Ok(raw) = fs::read_to_string(&cache_file) {
            if let Ok(cached) = serde_json::from_str::<Vec<MatchDto>>(&raw) {
                return cached;
            }
            // Corrupt cache entries are refetched, not fatal
            log::warn!("⚠️ discarding unreadable cache file {:?}", cache_file);
        }

        let ids = self.api.match_ids(puuid, HISTORY_DEPTH).await;
        let mut history = Vec::new();
        for mid in ids {
            if let Some(detail) = self.api.match_detail(&mid).await {
                history.push(detail);
            }
        }

        match serde_json::to_string(&history) {
            Ok(serialized) => {
                if let Err(e) = fs::write(&cache_file, serialized) {
                    log::warn!("⚠️ failed to write cache file {:?}: {}", cache_file, e);
                }
            }
            Err(e) => log::warn!("⚠️ failed to serialize history for {}: {}", puuid, e),
        }
        history
    }

    /// Build and persist feature rows for all 10 participants of a match,
    /// then flip its completion flag
    ///
    /// Returns `Ok(false)` when the match detail is unavailable upstream;
    /// nothing is written in that case.
    pub async fn process_match(&self, match_id: &str) -> Result<bool, Box<dyn std::error::Error>> {
        let Some(detail) = self.api.match_detail(match_id).await else {
            log::warn!("⚠️ match {} unavailable", match_id);
            return Ok(false);
        };
        let info = detail.info;
        let label = compute_label(&info);

        for p in &info.participants {
            let puuid = &p.puuid;
            let now = chrono::Utc::now().timestamp();

            let statics = match self.cached_static(puuid) {
                Some(cached) => cached,
                None => {
                    let fetched = self.fetch_remote_statics(puuid).await;
                    self.store.set_tier(puuid, fetched.tier.as_deref(), now)?;
                    fetched
                }
            };

            let history = self.fetch_history(puuid).await;
            let dynamic = DynamicFeatures {
                history: aggregate_history(&history, puuid),
                label,
                tier_norm: statics.tier_norm,
            };

            self.store.upsert_feature(&PlayerFeatureRow {
                puuid: puuid.clone(),
                tier_norm: statics.tier_norm,
                static_json: serde_json::to_string(&statics)?,
                dynamic_json: serde_json::to_string(&dynamic)?,
                games_used: history.len() as i64,
                last_updated: now,
            })?;
            self.store.set_has_features(puuid)?;
        }

        self.store.mark_match_complete(match_id)?;
        log::info!(
            "✅ match {} | {} players updated",
            match_id,
            info.participants.len()
        );
        Ok(true)
    }

    /// Process incomplete matches oldest-first until none remain or the
    /// optional cap is hit, reporting progress every `report_interval`
    /// matches
    pub async fn run(
        &self,
        max_matches: Option<usize>,
        report_interval: usize,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut processed = 0usize;
        let mut last_failed: Option<String> = None;

        loop {
            let Some(mid) = self.store.next_incomplete_match()? else {
                log::info!("✅ all matches already feature-complete");
                break;
            };

            if !self.process_match(&mid).await? {
                // Oldest-first selection would hand the same match back
                // forever; stop once it fails twice in a row
                if last_failed.as_deref() == Some(mid.as_str()) {
                    log::warn!("⚠️ match {} still unavailable, stopping run", mid);
                    break;
                }
                log::warn!("⚠️ skipping {}", mid);
                last_failed = Some(mid);
                continue;
            }
            last_failed = None;

            processed += 1;
            if report_interval > 0 && processed % report_interval == 0 {
                let counts = self.store.table_counts()?;
                log::info!(
                    "📊 {}/{} matches complete",
                    counts.matches_complete,
                    counts.matches
                );
            }

            if let Some(cap) = max_matches {
                if processed >= cap {
                    log::info!("⏸ stopped after {} match(es)", processed);
                    break;
                }
            }
        }
        Ok(())
    }
}
