//! Rate-limited Riot API client
//!
//! Wraps every outbound call with:
//! - Bounded concurrency (one semaphore shared for the client lifetime)
//! - A fixed cooldown after every completed request, held while the
//!   concurrency slot is still occupied, to smooth the aggregate rate
//! - Bounded retry on HTTP 429 honoring the server-advised wait, with
//!   escalating back-off and jitter
//!
//! All payloads are deserialized into the typed DTOs below at this
//! boundary; raw JSON never leaves the client. Non-success responses and
//! exhausted retries are logged and surfaced as `None`, never as fatal
//! errors.

use crate::config::Config;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;

/// Queue id of the tracked ranked solo queue
pub const RANKED_SOLO_QUEUE: i64 = 420;

const SOLO_QUEUE_TYPE: &str = "RANKED_SOLO_5x5";

// ---------------------------------------------------------------------
// Response DTOs (optional fields default on absence)
// ---------------------------------------------------------------------

/// League-v4 ladder listing for one apex tier
#[derive(Debug, Clone, Deserialize)]
pub struct LeagueListDto {
    #[serde(default)]
    pub entries: Vec<LeagueItemDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueItemDto {
    #[serde(default)]
    pub puuid: Option<String>,
}

/// Match-v5 full match payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchDto {
    pub metadata: MatchMetadataDto,
    pub info: MatchInfoDto,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchMetadataDto {
    #[serde(default)]
    pub match_id: String,
    #[serde(default)]
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchInfoDto {
    #[serde(default)]
    pub queue_id: i64,
    #[serde(default)]
    pub game_start_timestamp: Option<i64>,
    #[serde(default)]
    pub game_duration: Option<i64>,
    #[serde(default)]
    pub participants: Vec<ParticipantDto>,
    #[serde(default)]
    pub teams: Vec<TeamDto>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantDto {
    #[serde(default)]
    pub puuid: String,
    #[serde(default)]
    pub team_id: i64,
    #[serde(default)]
    pub team_position: String,
    #[serde(default)]
    pub kills: i64,
    #[serde(default)]
    pub deaths: i64,
    #[serde(default)]
    pub assists: i64,
    #[serde(default)]
    pub gold_earned: i64,
    #[serde(default)]
    pub total_damage_dealt_to_champions: i64,
    #[serde(default)]
    pub vision_score: i64,
    #[serde(default)]
    pub total_minions_killed: i64,
    #[serde(default)]
    pub neutral_minions_killed: i64,
    #[serde(default)]
    pub win: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDto {
    #[serde(default)]
    pub team_id: i64,
    #[serde(default)]
    pub win: bool,
}

/// Summoner-v4 profile
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummonerDto {
    #[serde(default)]
    pub puuid: Option<String>,
    #[serde(default)]
    pub summoner_level: Option<i64>,
    #[serde(default)]
    pub profile_icon_id: Option<i64>,
}

/// League-v4 per-queue rank entry
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeagueEntryDto {
    #[serde(default)]
    pub queue_type: String,
    #[serde(default)]
    pub tier: Option<String>,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub league_points: Option<i64>,
}

/// Challenges-v1 player data (only the total points are extracted)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengesDto {
    #[serde(default)]
    pub total_points: Option<ChallengePointsDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengePointsDto {
    #[serde(default)]
    pub current: Option<f64>,
}

// ---------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------

/// Asynchronous Riot API wrapper with throttling and bounded back-off
pub struct RiotApiClient {
    http: reqwest::Client,
    sem: Semaphore,
    api_key: String,
    platform: String,
    region: String,
    cooldown: Duration,
    max_attempts: u32,
}

/// Escalating wait for a rate-limited retry: server-advised seconds,
/// doubled per attempt, capped at 60s. `attempt` is 1-based.
pub fn backoff_wait_secs(advised: u64, attempt: u32) -> u64 {
    let base = advised.max(1);
    base.saturating_mul(2_u64.saturating_pow(attempt.saturating_sub(1)))
        .min(60)
}

impl RiotApiClient {
    pub fn new(config: &Config) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("failed to build HTTP client");

        Self {
            http,
            sem: Semaphore::new(config.request_limit.max(1)),
            api_key: config.api_key.clone(),
            platform: config.platform.clone(),
            region: config.region.clone(),
            cooldown: Duration::from_millis(config.cooldown_ms),
            max_attempts: config.max_attempts.max(1),
        }
    }

    /// GET a URL and deserialize the response body
    ///
    /// Returns `None` on any non-success status, unparsable body, or
    /// exhausted rate-limit retries. The concurrency slot is held through
    /// the trailing cooldown so the aggregate request rate stays smooth.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        let _permit = self.sem.acquire().await.ok()?;
        let result = self.request_with_retry(url).await;
        sleep(self.cooldown).await;
        result
    }

    async fn request_with_retry<T: DeserializeOwned>(&self, url: &str) -> Option<T> {
        let mut attempt: u32 = 0;
        loop {
            let response = match self
                .http
                .get(url)
                .header("X-Riot-Token", &self.api_key)
                .send()
                .await
            {
                Ok(r) => r,
                Err(e) => {
                    log::warn!("❌ request failed: {} → {}", url, e);
                    return None;
                }
            };

            let status = response.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                attempt += 1;
                if attempt >= self.max_attempts {
                    log::warn!(
                        "⚠️ 429 retries exhausted after {} attempts → {}",
                        attempt,
                        url
                    );
                    return None;
                }
                let advised = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(2);
                let wait = backoff_wait_secs(advised, attempt);
                let jitter_ms = rand::thread_rng().gen_range(0..500);
                log::warn!(
                    "⚠️ 429 – waiting {}s (attempt {} of {})",
                    wait,
                    attempt,
                    self.max_attempts
                );
                sleep(Duration::from_secs(wait) + Duration::from_millis(jitter_ms)).await;
                continue;
            }

            if !status.is_success() {
                log::warn!("[WARN] {} → {}", status, url);
                return None;
            }

            return match response.json::<T>().await {
                Ok(data) => Some(data),
                Err(e) => {
                    log::warn!("⚠️ unparsable payload from {} → {}", url, e);
                    None
                }
            };
        }
    }

    // -----------------------------------------------------------------
    // Endpoint wrappers
    // -----------------------------------------------------------------

    /// PUUIDs of one apex ladder tier (`challenger`, `grandmaster`, `master`)
    pub async fn ladder_puuids(&self, tier: &str) -> Vec<String> {
        let url = format!(
            "https://{}.api.riotgames.com/lol/league/v4/{}leagues/by-queue/{}",
            self.platform,
            tier.to_lowercase(),
            SOLO_QUEUE_TYPE
        );
        let Some(list) = self.get_json::<LeagueListDto>(&url).await else {
            return Vec::new();
        };
        list.entries.into_iter().filter_map(|e| e.puuid).collect()
    }

    /// Latest match ids for a player
    pub async fn match_ids(&self, puuid: &str, count: usize) -> Vec<String> {
        let url = format!(
            "https://{}.api.riotgames.com/lol/match/v5/matches/by-puuid/{}/ids?count={}",
            self.region, puuid, count
        );
        self.get_json(&url).await.unwrap_or_default()
    }

    /// Full match detail
    pub async fn match_detail(&self, match_id: &str) -> Option<MatchDto> {
        let url = format!(
            "https://{}.api.riotgames.com/lol/match/v5/matches/{}",
            self.region, match_id
        );
        self.get_json(&url).await
    }

    /// Summoner profile (level, icon)
    pub async fn summoner(&self, puuid: &str) -> Option<SummonerDto> {
        let url = format!(
            "https://{}.api.riotgames.com/lol/summoner/v4/summoners/by-puuid/{}",
            self.platform, puuid
        );
        self.get_json(&url).await
    }

    /// Rank entries across queues; callers filter for the solo queue
    pub async fn league_entries(&self, puuid: &str) -> Option<Vec<LeagueEntryDto>> {
        let url = format!(
            "https://{}.api.riotgames.com/lol/league/v4/entries/by-puuid/{}",
            self.platform, puuid
        );
        self.get_json(&url).await
    }

    /// Solo-queue rank entry, if the player has one
    pub async fn solo_queue_entry(&self, puuid: &str) -> Option<LeagueEntryDto> {
        self.league_entries(puuid)
            .await?
            .into_iter()
            .find(|e| e.queue_type == SOLO_QUEUE_TYPE)
    }

    /// Total champion-mastery score (the endpoint returns a bare number)
    pub async fn mastery_score(&self, puuid: &str) -> Option<f64> {
        let url = format!(
            "https://{}.api.riotgames.com/lol/champion-mastery/v4/scores/by-puuid/{}",
            self.platform, puuid
        );
        self.get_json(&url).await
    }

    /// Current total challenge points
    pub async fn challenge_points(&self, puuid: &str) -> Option<f64> {
        let url = format!(
            "https://{}.api.riotgames.com/lol/challenges/v1/player-data/{}",
            self.platform, puuid
        );
        let data = self.get_json::<ChallengesDto>(&url).await?;
        data.total_points.and_then(|p| p.current)
    }
}
