//! SQLite persistence for players, matches, per-match stats, and features
//!
//! Tables:
//! - `players` - identity + discovery/refresh flags (insert-if-absent)
//! - `matches` - one row per stored match with denormalized aggregates
//!   computed at insert time and the monotonic `vector_complete` flag
//! - `player_match_stats` - per-player per-match counters, trimmed to the
//!   10 most-recent-by-timestamp rows per player on every write
//! - `player_features` - one replace-on-write feature row per player
//!
//! Schema initialization is idempotent and migrations are strictly
//! additive (new nullable columns only) because the same file is mutated
//! in place across software versions.

use crate::client::MatchInfoDto;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Sliding-window size for retained per-player stat rows
pub const STAT_WINDOW: usize = 10;

/// One player's raw counters for one match
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerStatRow {
    pub puuid: String,
    pub match_id: String,
    /// Game-start timestamp (ms, as reported upstream)
    pub timestamp: i64,
    pub role: Option<String>,
    pub kills: i64,
    pub deaths: i64,
    pub assists: i64,
    pub gold: i64,
    pub damage: i64,
    pub vision: i64,
}

/// Replace-on-write per-player feature row
#[derive(Debug, Clone)]
pub struct PlayerFeatureRow {
    pub puuid: String,
    pub tier_norm: f64,
    pub static_json: String,
    pub dynamic_json: String,
    pub games_used: i64,
    pub last_updated: i64,
}

/// Row counts for the four tables plus completion tallies
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TableCounts {
    pub players: i64,
    pub players_with_features: i64,
    pub matches: i64,
    pub matches_complete: i64,
    pub player_match_stats: i64,
    pub player_features: i64,
}

/// Narrow persistence contract the pipeline components depend on
///
/// Components must not bypass these operations: stat writes always pass
/// through the sliding-window trim, and match completion only ever moves
/// false → true.
pub trait MatchStore: Send + Sync {
    // players
    fn insert_player(
        &self,
        puuid: &str,
        tier: Option<&str>,
        discovered: bool,
    ) -> Result<(), Box<dyn std::error::Error>>;
    fn player_exists(&self, puuid: &str) -> Result<bool, Box<dyn std::error::Error>>;
    fn mark_in_match(&self, puuid: &str) -> Result<(), Box<dyn std::error::Error>>;
    fn mark_refreshed(&self, puuid: &str, ts: i64) -> Result<(), Box<dyn std::error::Error>>;
    fn set_tier(
        &self,
        puuid: &str,
        tier: Option<&str>,
        ts: i64,
    ) -> Result<(), Box<dyn std::error::Error>>;
    fn set_has_features(&self, puuid: &str) -> Result<(), Box<dyn std::error::Error>>;
    /// Least-recently-refreshed batch; never-refreshed players first
    fn stale_players(&self, limit: usize) -> Result<Vec<String>, Box<dyn std::error::Error>>;
    fn all_players(&self) -> Result<Vec<String>, Box<dyn std::error::Error>>;

    // matches
    /// Insert or refresh a match, recomputing the denormalized aggregates
    /// from the supplied detail. Rejects participant lists that are not
    /// exactly 10. Never touches `vector_complete` or `ingested_at` on
    /// conflict.
    fn insert_match(
        &self,
        match_id: &str,
        info: &MatchInfoDto,
        ordered_puuids: &[String],
        label: f64,
    ) -> Result<(), Box<dyn std::error::Error>>;
    fn match_exists(&self, match_id: &str) -> Result<bool, Box<dyn std::error::Error>>;
    fn match_count(&self) -> Result<i64, Box<dyn std::error::Error>>;
    /// Oldest feature-incomplete match by game start, deterministic
    fn next_incomplete_match(&self) -> Result<Option<String>, Box<dyn std::error::Error>>;
    fn mark_match_complete(&self, match_id: &str) -> Result<(), Box<dyn std::error::Error>>;

    // per-match stats
    /// Insert-or-replace one stat row, then trim that player's history to
    /// the [`STAT_WINDOW`] most recent rows
    fn upsert_player_stat(&self, stat: &PlayerStatRow) -> Result<(), Box<dyn std::error::Error>>;
    fn has_player_stat(
        &self,
        puuid: &str,
        match_id: &str,
    ) -> Result<bool, Box<dyn std::error::Error>>;
    fn recent_stats(
        &self,
        puuid: &str,
        limit: usize,
    ) -> Result<Vec<PlayerStatRow>, Box<dyn std::error::Error>>;

    // features
    fn upsert_feature(&self, row: &PlayerFeatureRow) -> Result<(), Box<dyn std::error::Error>>;
    fn feature_static_json(
        &self,
        puuid: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error>>;

    // reporting
    fn refresh_bounds(
        &self,
    ) -> Result<(Option<i64>, Option<i64>), Box<dyn std::error::Error>>;
    fn table_counts(&self) -> Result<TableCounts, Box<dyn std::error::Error>>;
}

/// SQLite-backed implementation of [`MatchStore`]
///
/// One connection per handle; every mutation commits immediately
/// (autocommit). A single process owns a database file at a time.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    path: PathBuf,
}

impl SqliteStore {
    /// Open (or create) a store at `path` and bring its schema up to date
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;
        init_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn init_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS players (
            puuid           TEXT PRIMARY KEY,
            tier            TEXT,
            discovered      INTEGER DEFAULT 0,
            in_match        INTEGER DEFAULT 0,
            last_refreshed  INTEGER
        );

        CREATE TABLE IF NOT EXISTS matches (
            match_id        TEXT PRIMARY KEY,
            game_start      INTEGER,
            ingested_at     INTEGER,
            puuids_json     TEXT,
            label           REAL
        );

        CREATE TABLE IF NOT EXISTS player_match_stats (
            puuid           TEXT NOT NULL,
            match_id        TEXT NOT NULL,
            timestamp       INTEGER,
            role            TEXT,
            kills           INTEGER,
            deaths          INTEGER,
            assists         INTEGER,
            gold            INTEGER,
            damage          INTEGER,
            vision          INTEGER,
            PRIMARY KEY (puuid, match_id)
        );

        CREATE TABLE IF NOT EXISTS player_features (
            puuid           TEXT PRIMARY KEY,
            tier_norm       REAL,
            static_json     TEXT,
            dynamic_json    TEXT,
            games_used      INTEGER,
            last_updated    INTEGER
        );

        CREATE INDEX IF NOT EXISTS idx_stats_player_time
            ON player_match_stats (puuid, timestamp);
        CREATE INDEX IF NOT EXISTS idx_stats_match_id
            ON player_match_stats (match_id);
        "#,
    )?;

    // Additive migrations: columns introduced after the first schema
    // generation. Nullable only; existing files upgrade in place.
    ensure_column(conn, "players", "has_features", "INTEGER")?;
    ensure_column(conn, "matches", "vector_complete", "INTEGER")?;
    ensure_column(conn, "matches", "winning_team", "INTEGER")?;
    ensure_column(conn, "matches", "blue_gold", "INTEGER")?;
    ensure_column(conn, "matches", "red_gold", "INTEGER")?;
    ensure_column(conn, "matches", "gold_json", "TEXT")?;

    // Keeps the "next incomplete" scan cheap
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_matches_vector_complete
            ON matches (vector_complete);",
    )?;

    Ok(())
}

/// Add `column` to `table` unless it already exists
fn ensure_column(
    conn: &Connection,
    table: &str,
    column: &str,
    decl: &str,
) -> Result<(), rusqlite::Error> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let existing = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;

    if !existing.iter().any(|c| c == column) {
        conn.execute(
            &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, decl),
            [],
        )?;
        log::info!("🔧 Added column {}.{}", table, column);
    }
    Ok(())
}

impl MatchStore for SqliteStore {
    fn insert_player(
        &self,
        puuid: &str,
        tier: Option<&str>,
        discovered: bool,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO players (puuid, tier, discovered) VALUES (?, ?, ?)",
            params![puuid, tier, discovered as i64],
        )?;
        Ok(())
    }

    fn player_exists(&self, puuid: &str) -> Result<bool, Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT 1 FROM players WHERE puuid = ?")?;
        Ok(stmt.exists(params![puuid])?)
    }

    fn mark_in_match(&self, puuid: &str) -> Result<(), Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE players SET in_match = 1 WHERE puuid = ?",
            params![puuid],
        )?;
        Ok(())
    }

    fn mark_refreshed(&self, puuid: &str, ts: i64) -> Result<(), Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE players SET last_refreshed = ? WHERE puuid = ?",
            params![ts, puuid],
        )?;
        Ok(())
    }

    fn set_tier(
        &self,
        puuid: &str,
        tier: Option<&str>,
        ts: i64,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE players SET tier = ?, last_refreshed = ? WHERE puuid = ?",
            params![tier, ts, puuid],
        )?;
        Ok(())
    }

    fn set_has_features(&self, puuid: &str) -> Result<(), Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE players SET has_features = 1 WHERE puuid = ?",
            params![puuid],
        )?;
        Ok(())
    }

    fn stale_players(&self, limit: usize) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT puuid FROM players
             ORDER BY last_refreshed IS NULL DESC, last_refreshed ASC
             LIMIT ?",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn all_players(&self) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT puuid FROM players ORDER BY rowid")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn insert_match(
        &self,
        match_id: &str,
        info: &MatchInfoDto,
        ordered_puuids: &[String],
        label: f64,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if ordered_puuids.len() != 10 {
            return Err(format!(
                "match {} must have exactly 10 participants, got {}",
                match_id,
                ordered_puuids.len()
            )
            .into());
        }

        // Denormalized aggregates, computed once here so downstream
        // readers never re-derive them from raw detail
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
        let winning_team: Option<i64> = info.teams.iter().find(|t| t.win).map(|t| t.team_id);
        let gold_map: BTreeMap<&str, i64> = info
            .participants
            .iter()
            .map(|p| (p.puuid.as_str(), p.gold_earned))
            .collect();

        let now = chrono::Utc::now();
        let game_start = info
            .game_start_timestamp
            .unwrap_or_else(|| now.timestamp_millis());

        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO matches (
                match_id, game_start, ingested_at, puuids_json, label,
                winning_team, blue_gold, red_gold, gold_json
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(match_id) DO UPDATE SET
                game_start = excluded.game_start,
                puuids_json = excluded.puuids_json,
                label = excluded.label,
                winning_team = excluded.winning_team,
                blue_gold = excluded.blue_gold,
                red_gold = excluded.red_gold,
                gold_json = excluded.gold_json
            "#,
            params![
                match_id,
                game_start,
                now.timestamp(),
                serde_json::to_string(ordered_puuids)?,
                label,
                winning_team,
                blue_gold,
                red_gold,
                serde_json::to_string(&gold_map)?,
            ],
        )?;
        Ok(())
    }

    fn match_exists(&self, match_id: &str) -> Result<bool, Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT 1 FROM matches WHERE match_id = ?")?;
        Ok(stmt.exists(params![match_id])?)
    }

    fn match_count(&self) -> Result<i64, Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        let count = conn.query_row("SELECT COUNT(*) FROM matches", [], |row| row.get(0))?;
        Ok(count)
    }

    fn next_incomplete_match(&self) -> Result<Option<String>, Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT match_id FROM matches
             WHERE vector_complete IS NULL OR vector_complete = 0
             ORDER BY game_start ASC, match_id ASC
             LIMIT 1",
        )?;
        let mut rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        Ok(rows.next().transpose()?)
    }

    fn mark_match_complete(&self, match_id: &str) -> Result<(), Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE matches SET vector_complete = 1 WHERE match_id = ?",
            params![match_id],
        )?;
        Ok(())
    }

    fn upsert_player_stat(&self, stat: &PlayerStatRow) -> Result<(), Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO player_match_stats
                (puuid, match_id, timestamp, role, kills, deaths, assists, gold, damage, vision)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                stat.puuid,
                stat.match_id,
                stat.timestamp,
                stat.role,
                stat.kills,
                stat.deaths,
                stat.assists,
                stat.gold,
                stat.damage,
                stat.vision,
            ],
        )?;

        // Sliding-window cleanup: keep only the most recent rows
        conn.execute(
            r#"
            DELETE FROM player_match_stats
            WHERE puuid = ?
              AND rowid NOT IN (
                SELECT rowid FROM player_match_stats
                WHERE puuid = ? ORDER BY timestamp DESC LIMIT ?
              )
            "#,
            params![stat.puuid, stat.puuid, STAT_WINDOW as i64],
        )?;
        Ok(())
    }

    fn has_player_stat(
        &self,
        puuid: &str,
        match_id: &str,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT 1 FROM player_match_stats WHERE puuid = ? AND match_id = ?")?;
        Ok(stmt.exists(params![puuid, match_id])?)
    }

    fn recent_stats(
        &self,
        puuid: &str,
        limit: usize,
    ) -> Result<Vec<PlayerStatRow>, Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT puuid, match_id, timestamp, role, kills, deaths, assists, gold, damage, vision
             FROM player_match_stats
             WHERE puuid = ?
             ORDER BY timestamp DESC
             LIMIT ?",
        )?;
        let rows = stmt
            .query_map(params![puuid, limit as i64], |row| {
                Ok(PlayerStatRow {
                    puuid: row.get(0)?,
                    match_id: row.get(1)?,
                    timestamp: row.get(2)?,
                    role: row.get(3)?,
                    kills: row.get(4)?,
                    deaths: row.get(5)?,
                    assists: row.get(6)?,
                    gold: row.get(7)?,
                    damage: row.get(8)?,
                    vision: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn upsert_feature(&self, row: &PlayerFeatureRow) -> Result<(), Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT OR REPLACE INTO player_features
                (puuid, tier_norm, static_json, dynamic_json, games_used, last_updated)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
            params![
                row.puuid,
                row.tier_norm,
                row.static_json,
                row.dynamic_json,
                row.games_used,
                row.last_updated,
            ],
        )?;
        Ok(())
    }

    fn feature_static_json(
        &self,
        puuid: &str,
    ) -> Result<Option<String>, Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare("SELECT static_json FROM player_features WHERE puuid = ?")?;
        let mut rows = stmt.query_map(params![puuid], |row| row.get::<_, Option<String>>(0))?;
        Ok(rows.next().transpose()?.flatten())
    }

    fn refresh_bounds(
        &self,
    ) -> Result<(Option<i64>, Option<i64>), Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        let bounds = conn.query_row(
            "SELECT MIN(last_refreshed), MAX(last_refreshed) FROM players",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(bounds)
    }

    fn table_counts(&self) -> Result<TableCounts, Box<dyn std::error::Error>> {
        let conn = self.conn.lock().unwrap();
        let count = |sql: &str| -> Result<i64, rusqlite::Error> {
            conn.query_row(sql, [], |row| row.get(0))
        };
        Ok(TableCounts {
            players: count("SELECT COUNT(*) FROM players")?,
            players_with_features: count("SELECT COUNT(*) FROM players WHERE has_features = 1")?,
            matches: count("SELECT COUNT(*) FROM matches")?,
            matches_complete: count("SELECT COUNT(*) FROM matches WHERE vector_complete = 1")?,
            player_match_stats: count("SELECT COUNT(*) FROM player_match_stats")?,
            player_features: count("SELECT COUNT(*) FROM player_features")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ParticipantDto, TeamDto};
    use tempfile::NamedTempFile;

    fn open_store() -> (NamedTempFile, SqliteStore) {
        let temp = NamedTempFile::new().unwrap();
        let store = SqliteStore::open(temp.path()).unwrap();
        (temp, store)
    }

    fn make_stat(puuid: &str, match_id: &str, ts: i64) -> PlayerStatRow {
        PlayerStatRow {
            puuid: puuid.to_string(),
            match_id: match_id.to_string(),
            timestamp: ts,
            role: Some("TOP".to_string()),
            kills: 3,
            deaths: 1,
            assists: 8,
            gold: 11_000,
            damage: 18_000,
            vision: 22,
        }
    }

    fn make_info(blue_gold_each: i64, red_gold_each: i64, blue_wins: bool) -> MatchInfoDto {
        let mut participants = Vec::new();
        for i in 0..10 {
            let team_id = if i < 5 { 100 } else { 200 };
            participants.push(ParticipantDto {
                puuid: format!("p{}", i),
                team_id,
                gold_earned: if team_id == 100 {
                    blue_gold_each
                } else {
                    red_gold_each
                },
                ..Default::default()
            });
        }
        MatchInfoDto {
            queue_id: 420,
            game_start_timestamp: Some(1_700_000_000_000),
            participants,
            teams: vec![
                TeamDto {
                    team_id: 100,
                    win: blue_wins,
                },
                TeamDto {
                    team_id: 200,
                    win: !blue_wins,
                },
            ],
            ..Default::default()
        }
    }

    fn ordered_puuids() -> Vec<String> {
        (0..10).map(|i| format!("p{}", i)).collect()
    }

    #[test]
    fn test_insert_player_is_idempotent() {
        let (_temp, store) = open_store();

        store.insert_player("dup", Some("CHALLENGER"), true).unwrap();
        store.insert_player("dup", None, false).unwrap();
        store.insert_player("dup", Some("MASTER"), true).unwrap();

        let counts = store.table_counts().unwrap();
        assert_eq!(counts.players, 1);
    }

    #[test]
    fn test_stat_window_keeps_ten_most_recent() {
        let (_temp, store) = open_store();

        for i in 0..12 {
            store
                .upsert_player_stat(&make_stat("p1", &format!("m{}", i), 1_000 + i))
                .unwrap();
        }

        let recent = store.recent_stats("p1", 20).unwrap();
        assert_eq!(recent.len(), STAT_WINDOW);
        // Most recent first; the two oldest rows were evicted
        assert_eq!(recent[0].timestamp, 1_011);
        assert_eq!(recent[9].timestamp, 1_002);
    }

    #[test]
    fn test_stat_upsert_same_match_is_idempotent() {
        let (_temp, store) = open_store();

        store.upsert_player_stat(&make_stat("p1", "m1", 500)).unwrap();
        store.upsert_player_stat(&make_stat("p1", "m1", 500)).unwrap();

        let recent = store.recent_stats("p1", 20).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0], make_stat("p1", "m1", 500));
    }

    #[test]
    fn test_insert_match_rejects_wrong_participant_count() {
        let (_temp, store) = open_store();
        let info = make_info(10_000, 9_000, true);
        let nine: Vec<String> = (0..9).map(|i| format!("p{}", i)).collect();

        let result = store.insert_match("EUW1_9", &info, &nine, 0.5);
        assert!(result.is_err());
        assert_eq!(store.match_count().unwrap(), 0);
        assert!(store.next_incomplete_match().unwrap().is_none());
    }

    #[test]
    fn test_insert_match_denormalizes_aggregates() {
        let (_temp, store) = open_store();
        let info = make_info(10_000, 8_000, true);

        store
            .insert_match("EUW1_1", &info, &ordered_puuids(), 0.78)
            .unwrap();

        let conn = store.conn.lock().unwrap();
        let (winning, blue, red, gold_json): (i64, i64, i64, String) = conn
            .query_row(
                "SELECT winning_team, blue_gold, red_gold, gold_json FROM matches WHERE match_id = ?",
                params!["EUW1_1"],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap();

        assert_eq!(winning, 100);
        assert_eq!(blue, 50_000);
        assert_eq!(red, 40_000);
        let map: BTreeMap<String, i64> = serde_json::from_str(&gold_json).unwrap();
        assert_eq!(map["p0"], 10_000);
        assert_eq!(map["p9"], 8_000);
    }

    #[test]
    fn test_vector_complete_survives_reinsert() {
        let (_temp, store) = open_store();
        let info = make_info(10_000, 8_000, true);

        store
            .insert_match("EUW1_1", &info, &ordered_puuids(), 0.78)
            .unwrap();
        store.mark_match_complete("EUW1_1").unwrap();
        assert!(store.next_incomplete_match().unwrap().is_none());

        // Re-inserting the same match must not revert the flag
        store
            .insert_match("EUW1_1", &info, &ordered_puuids(), 0.80)
            .unwrap();
        assert!(store.next_incomplete_match().unwrap().is_none());
        assert_eq!(store.table_counts().unwrap().matches_complete, 1);
    }

    #[test]
    fn test_next_incomplete_is_oldest_first() {
        let (_temp, store) = open_store();

        let mut newer = make_info(10_000, 8_000, true);
        newer.game_start_timestamp = Some(2_000);
        let mut older = make_info(10_000, 8_000, true);
        older.game_start_timestamp = Some(1_000);

        store
            .insert_match("EUW1_newer", &newer, &ordered_puuids(), 0.5)
            .unwrap();
        store
            .insert_match("EUW1_older", &older, &ordered_puuids(), 0.5)
            .unwrap();

        assert_eq!(
            store.next_incomplete_match().unwrap().as_deref(),
            Some("EUW1_older")
        );

        store.mark_match_complete("EUW1_older").unwrap();
        assert_eq!(
            store.next_incomplete_match().unwrap().as_deref(),
            Some("EUW1_newer")
        );
    }

    #[test]
    fn test_stale_players_never_refreshed_first() {
        let (_temp, store) = open_store();

        store.insert_player("fresh", None, false).unwrap();
        store.insert_player("never", None, false).unwrap();
        store.insert_player("old", None, false).unwrap();
        store.mark_refreshed("fresh", 2_000).unwrap();
        store.mark_refreshed("old", 1_000).unwrap();

        let batch = store.stale_players(3).unwrap();
        assert_eq!(batch, vec!["never", "old", "fresh"]);
    }

    #[test]
    fn test_additive_migration_upgrades_old_file() {
        let temp = NamedTempFile::new().unwrap();

        // First-generation schema without the later columns
        {
            let conn = Connection::open(temp.path()).unwrap();
            conn.execute_batch(
                r#"
                CREATE TABLE players (
                    puuid TEXT PRIMARY KEY,
                    tier TEXT,
                    discovered INTEGER DEFAULT 0,
                    in_match INTEGER DEFAULT 0,
                    last_refreshed INTEGER
                );
                CREATE TABLE matches (
                    match_id TEXT PRIMARY KEY,
                    game_start INTEGER,
                    ingested_at INTEGER,
                    puuids_json TEXT,
                    label REAL
                );
                INSERT INTO players (puuid) VALUES ('legacy');
                INSERT INTO matches (match_id, game_start) VALUES ('EUW1_old', 123);
                "#,
            )
            .unwrap();
        }

        let store = SqliteStore::open(temp.path()).unwrap();

        // Pre-existing rows survive and the new columns are usable
        assert!(store.player_exists("legacy").unwrap());
        store.set_has_features("legacy").unwrap();
        assert_eq!(
            store.next_incomplete_match().unwrap().as_deref(),
            Some("EUW1_old")
        );
        store.mark_match_complete("EUW1_old").unwrap();
        assert_eq!(store.table_counts().unwrap().matches_complete, 1);
    }

    #[test]
    fn test_refresh_bounds() {
        let (_temp, store) = open_store();
        assert_eq!(store.refresh_bounds().unwrap(), (None, None));

        store.insert_player("a", None, false).unwrap();
        store.insert_player("b", None, false).unwrap();
        store.mark_refreshed("a", 100).unwrap();
        store.mark_refreshed("b", 900).unwrap();

        assert_eq!(store.refresh_bounds().unwrap(), (Some(100), Some(900)));
    }
}
