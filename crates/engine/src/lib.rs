//! # AdPace Engine — Budget & Bid Reallocation
//!
//! A deterministic, single-pass reallocation engine for advertising campaigns.
//! Given a snapshot of campaigns grouped by label, it computes a new daily
//! budget and a new target CPA per campaign such that group-level spend and
//! regional constraints hold while the label-wide KPI band is respected.
//!
//! Table of Contents:
//! 1. `types` — Campaign snapshot record, per-campaign update, group summary
//! 2. `config` — EngineConfig with every policy tunable
//! 3. `grouping` — Partition a snapshot by label
//! 4. `budget` — Scoring, proportional allocation, regional cap resolution
//! 5. `bids` — Raw tCPA rule and group-level correction factor
//! 6. `optimizer` — `run_optimization`, the one public entry point per pass
//!
//! The engine is a pure function of its input: no I/O, no clock, no shared
//! state. Groups have no data dependency on each other, so a pass always
//! terminates in time linear in the campaign count.

pub mod bids;
pub mod budget;
pub mod config;
pub mod grouping;
pub mod optimizer;
pub mod types;

pub use config::EngineConfig;
pub use optimizer::run_optimization;
pub use types::{Campaign, CampaignUpdate, GroupSummary, PassOutcome};
