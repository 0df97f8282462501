//! Match discovery and ingestion loop
//!
//! Walks least-recently-refreshed players, pulls their recent match ids,
//! and stores every new ranked solo-queue match together with its
//! continuous outcome label and canonically ordered participant list.
//! A match id moves from *unseen* to *stored* exactly once and is never
//! revisited.

use crate::client::{MatchInfoDto, ParticipantDto, RiotApiClient, RANKED_SOLO_QUEUE};
use crate::store::MatchStore;
use std::sync::Arc;

/// Fixed canonical role order within each side
pub const ROLES_ORDER: [&str; 5] = ["TOP", "JUNGLE", "MIDDLE", "BOTTOM", "UTILITY"];

/// Weight of the gold share in the outcome label; the remainder goes to
/// the win indicator, so the label favors the outcome while still
/// rewarding objective dominance
pub const LABEL_GOLD_WEIGHT: f64 = 0.55;

/// Players taken per crawl iteration
const PLAYER_BATCH: usize = 5;

/// Return the 10 PUUIDs in fixed [blue roles, red roles] order
///
/// `None` unless every role resolves on both sides, i.e. exactly 10
/// participants in the canonical order.
pub fn order_puuids_by_role(participants: &[ParticipantDto]) -> Option<Vec<String>> {
    let mut blue = Vec::new();
    let mut red = Vec::new();
    for role in ROLES_ORDER {
        for p in participants {
            if p.team_position != role {
                continue;
            }
            match p.team_id {
                100 => blue.push(p.puuid.clone()),
                200 => red.push(p.puuid.clone()),
                _ => {}
            }
        }
    }

    if blue.len() == 5 && red.len() == 5 {
        blue.extend(red);
        Some(blue)
    } else {
        None
    }
}

/// Continuous label measuring blue-side success
///
/// `label = 0.55 × blue gold share + 0.45 × blue win flag`
pub fn compute_label(info: &MatchInfoDto) -> f64 {
    let blue_gold: i64 = info
        .participants
        .iter()
        .filter(|p| p.team_id == 100)
        .map(|p| p.gold_earned)
        .sum();
    let red_gold: i64 = info
        .participants
        .iter()
        .filter(|p| p.team_id == 200)
        .map(|p| p.gold_earned)
        .sum();

    let total = blue_gold + red_gold;
    let ratio = if total > 0 {
        blue_gold as f64 / total as f64
    } else {
        0.5
    };

    let blue_win = info
        .teams
        .iter()
        .find(|t| t.team_id == 100)
        .map(|t| t.win)
        .unwrap_or(false);
    let win_flag = if blue_win { 1.0 } else { 0.0 };

    LABEL_GOLD_WEIGHT * ratio + (1.0 - LABEL_GOLD_WEIGHT) * win_flag
}

/// Loops through players and collects unique matches until the target
/// count is reached or no players remain
pub struct MatchCrawler {
    api: Arc<RiotApiClient>,
    store: Arc<dyn MatchStore>,
    matches_per_player: usize,
    target_matches: i64,
}

impl MatchCrawler {
    pub fn new(
        api: Arc<RiotApiClient>,
        store: Arc<dyn MatchStore>,
        matches_per_player: usize,
        target_matches: i64,
    ) -> Self {
        Self {
            api,
            store,
            matches_per_player,
            target_matches,
        }
    }

    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        let mut processed = self.store.match_count()?;
        while processed < self.target_matches {
            let players = self.store.stale_players(PLAYER_BATCH)?;
            if players.is_empty() {
                log::warn!("⚠️ No players left to crawl");
                break;
            }

            for puuid in players {
                let ids = self.api.match_ids(&puuid, self.matches_per_player).await;
                for mid in ids {
                    if self.store.match_exists(&mid)? {
                        continue;
                    }

                    let Some(detail) = self.api.match_detail(&mid).await else {
                        continue;
                    };
                    let info = detail.info;

                    // Only the tracked ranked solo queue is kept
                    if info.queue_id != RANKED_SOLO_QUEUE {
                        continue;
                    }
                    let Some(ordered) = order_puuids_by_role(&info.participants) else {
                        continue;
                    };

                    let label = compute_label(&info);
                    self.store.insert_match(&mid, &info, &ordered, label)?;

                    // Register any participants we had never seen
                    for pid in &detail.metadata.participants {
                        self.store.insert_player(pid, None, true)?;
                        self.store.mark_in_match(pid)?;
                    }

                    processed = self.store.match_count()?;
                    if processed % 5 == 0 {
                        log::info!(
                            "🟢 {} / {} matches stored",
                            processed,
                            self.target_matches
                        );
                    }
                }
                self.store
                    .mark_refreshed(&puuid, chrono::Utc::now().timestamp())?;
            }

            processed = self.store.match_count()?;
        }

        log::info!("✅ Crawl completed: {} matches in database", processed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TeamDto;

    fn participant(puuid: &str, team_id: i64, role: &str, gold: i64) -> ParticipantDto {
        ParticipantDto {
            puuid: puuid.to_string(),
            team_id,
            team_position: role.to_string(),
            gold_earned: gold,
            ..Default::default()
        }
    }

    fn full_lobby() -> Vec<ParticipantDto> {
        let mut out = Vec::new();
        for (i, role) in ROLES_ORDER.iter().enumerate() {
            out.push(participant(&format!("blue{}", i), 100, role, 10_000));
            out.push(participant(&format!("red{}", i), 200, role, 9_000));
        }
        out
    }

    #[test]
    fn test_order_is_blue_then_red_in_role_order() {
        let ordered = order_puuids_by_role(&full_lobby()).unwrap();
        assert_eq!(ordered.len(), 10);
        assert_eq!(ordered[0], "blue0"); // TOP
        assert_eq!(ordered[4], "blue4"); // UTILITY
        assert_eq!(ordered[5], "red0");
        assert_eq!(ordered[9], "red4");
    }

    #[test]
    fn test_nine_resolvable_participants_rejected() {
        let mut lobby = full_lobby();
        lobby.pop();
        assert!(order_puuids_by_role(&lobby).is_none());
    }

    #[test]
    fn test_unresolvable_role_rejected() {
        let mut lobby = full_lobby();
        // Arena-style payloads leave teamPosition empty
        lobby[3].team_position = String::new();
        assert!(order_puuids_by_role(&lobby).is_none());
    }

    #[test]
    fn test_label_weights_gold_share_and_win() {
        // Blue holds 60% of the gold and wins: 0.55*0.60 + 0.45*1.0 = 0.78
        let mut participants = Vec::new();
        for i in 0..5 {
            participants.push(participant(&format!("b{}", i), 100, "TOP", 12_000));
            participants.push(participant(&format!("r{}", i), 200, "TOP", 8_000));
        }
        let info = MatchInfoDto {
            participants,
            teams: vec![
                TeamDto {
                    team_id: 100,
                    win: true,
                },
                TeamDto {
                    team_id: 200,
                    win: false,
                },
            ],
            ..Default::default()
        };

        let label = compute_label(&info);
        assert!((label - 0.78).abs() < 1e-9);
    }

    #[test]
    fn test_label_without_gold_falls_back_to_even_share() {
        let info = MatchInfoDto {
            teams: vec![TeamDto {
                team_id: 100,
                win: false,
            }],
            ..Default::default()
        };
        assert!((compute_label(&info) - 0.275).abs() < 1e-9);
    }
}
