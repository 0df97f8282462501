//! Configuration loaded from environment variables

use std::env;

/// Runtime configuration for the crawl/feature/update pipelines
///
/// Loaded from environment variables with sensible defaults; only the
/// API key is mandatory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Riot API key sent as the `X-Riot-Token` header
    pub api_key: String,

    /// Platform routing value for summoner/league endpoints (e.g. `euw1`)
    pub platform: String,

    /// Regional routing value for match endpoints (e.g. `europe`)
    pub region: String,

    /// Path of the live SQLite database file
    pub live_db_path: String,

    /// Path of the working copy used by the dual-copy update protocol
    pub update_db_path: String,

    /// Directory holding per-player match-history cache files
    pub cache_dir: String,

    /// Maximum number of outstanding API requests
    pub request_limit: usize,

    /// Cooldown after every completed request, in milliseconds
    pub cooldown_ms: u64,

    /// Maximum attempts for a rate-limited request before giving up
    pub max_attempts: u32,

    /// Ladder tiers used for seeding, highest first
    pub seed_tiers: Vec<String>,

    /// Match ids requested per player during a crawl iteration
    pub matches_per_player: usize,

    /// Crawl stops once this many matches are stored
    pub target_matches: i64,

    /// Optional cap on players touched by an incremental update
    pub update_limit: Option<usize>,

    /// Optional cap on matches processed by one feature-builder run
    pub max_feature_matches: Option<usize>,

    /// Feature-builder progress report interval, in processed matches
    pub report_interval: usize,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `RIOT_API_KEY` (required)
    /// - `RIOT_PLATFORM` (default: euw1)
    /// - `RIOT_REGION` (default: europe)
    /// - `RIFTFLOW_LIVE_DB` (default: data/live.db)
    /// - `RIFTFLOW_UPDATE_DB` (default: data/update.db)
    /// - `RIFTFLOW_CACHE_DIR` (default: cache/player_matches)
    /// - `RIOT_REQUEST_LIMIT` (default: 5)
    /// - `RIOT_COOLDOWN_MS` (default: 250)
    /// - `RIOT_MAX_ATTEMPTS` (default: 5)
    /// - `SEED_TIERS` (default: challenger,grandmaster,master)
    /// - `CRAWL_MATCHES_PER_PLAYER` (default: 10)
    /// - `CRAWL_TARGET_MATCHES` (default: 5000)
    /// - `UPDATE_PLAYER_LIMIT` (default: unset, all players)
    /// - `FEATURE_MAX_MATCHES` (default: unset, run to completion)
    /// - `FEATURE_REPORT_INTERVAL` (default: 5)
    pub fn from_env() -> Self {
        let api_key = env::var("RIOT_API_KEY").expect("RIOT_API_KEY must be set in .env file");

        let seed_tiers = env::var("SEED_TIERS")
            .unwrap_or_else(|_| "challenger,grandmaster,master".to_string())
            .split(',')
            .map(|t| t.trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        Self {
            api_key,
            platform: env::var("RIOT_PLATFORM").unwrap_or_else(|_| "euw1".to_string()),
            region: env::var("RIOT_REGION").unwrap_or_else(|_| "europe".to_string()),
            live_db_path: env::var("RIFTFLOW_LIVE_DB")
                .unwrap_or_else(|_| "data/live.db".to_string()),
            update_db_path: env::var("RIFTFLOW_UPDATE_DB")
                .unwrap_or_else(|_| "data/update.db".to_string()),
            cache_dir: env::var("RIFTFLOW_CACHE_DIR")
                .unwrap_or_else(|_| "cache/player_matches".to_string()),
            request_limit: env::var("RIOT_REQUEST_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            cooldown_ms: env::var("RIOT_COOLDOWN_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(250),
            max_attempts: env::var("RIOT_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
            seed_tiers,
            matches_per_player: env::var("CRAWL_MATCHES_PER_PLAYER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            target_matches: env::var("CRAWL_TARGET_MATCHES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5_000),
            update_limit: env::var("UPDATE_PLAYER_LIMIT")
                .ok()
                .and_then(|s| s.parse().ok()),
            max_feature_matches: env::var("FEATURE_MAX_MATCHES")
                .ok()
                .and_then(|s| s.parse().ok()),
            report_interval: env::var("FEATURE_REPORT_INTERVAL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        env::set_var("RIOT_API_KEY", "RGAPI-test");
        env::remove_var("RIOT_PLATFORM");
        env::remove_var("RIFTFLOW_LIVE_DB");
        env::remove_var("SEED_TIERS");

        let config = Config::from_env();

        assert_eq!(config.platform, "euw1");
        assert_eq!(config.region, "europe");
        assert_eq!(config.live_db_path, "data/live.db");
        assert_eq!(config.request_limit, 5);
        assert_eq!(config.cooldown_ms, 250);
        assert_eq!(config.target_matches, 5_000);
        assert_eq!(
            config.seed_tiers,
            vec!["challenger", "grandmaster", "master"]
        );
        assert!(config.update_limit.is_none());
    }
}
