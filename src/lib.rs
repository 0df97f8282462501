//! # riftflow
//!
//! Data-acquisition and persistence pipeline for ranked match records:
//! - Pulls ladder, match, and profile data from the Riot API under a
//!   shared rate limit
//! - Persists players, matches, per-match stats, and feature vectors in
//!   an embedded SQLite store with sliding-window retention
//! - Derives per-player feature vectors consumed by downstream
//!   prediction and visualization tooling
//!
//! ## Architecture
//!
//! ```text
//! LadderSeeder ──> players
//! MatchCrawler ──> matches + players (discovered participants)
//! FeatureBuilder ──> player_features + vector_complete flags
//! MatchBase ──> incremental refresh + dual-copy live/update protocol
//! ```
//!
//! The store is accessed through the narrow [`store::MatchStore`] trait
//! and every component receives its client/store handles explicitly —
//! there are no process-wide singletons.
//!
//! ## Module Organization
//!
//! - `client` - Rate-limited Riot API client with typed payloads
//! - `store` - SQLite persistence (schema, migrations, retention)
//! - `seeder` - Ladder-tier player seeding
//! - `crawler` - Match discovery and ingestion loop
//! - `features` - Resumable per-player feature aggregation
//! - `matchbase` - Orchestrator and dual-copy safe-update protocol
//! - `config` - Environment-based configuration
//! - `report` - Table-count summaries for the operational binaries

pub mod client;
pub mod config;
pub mod crawler;
pub mod features;
pub mod matchbase;
pub mod report;
pub mod seeder;
pub mod store;

pub use client::RiotApiClient;
pub use config::Config;
pub use crawler::MatchCrawler;
pub use features::FeatureBuilder;
pub use matchbase::MatchBase;
pub use seeder::LadderSeeder;
pub use store::{MatchStore, SqliteStore};
