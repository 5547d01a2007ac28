//! # AdPace Engine — Snapshot & Result Types
//!
//! Table of Contents:
//! 1. Campaign — read-only input record, one per ad campaign
//! 2. CampaignUpdate — the two output fields written back per campaign
//! 3. GroupSummary / PassOutcome — per-label bookkeeping for one pass

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// 1. Campaign
// ─────────────────────────────────────────────

/// A campaign record as seen by the engine. Read-only during a pass.
///
/// Label-level metrics are duplicated onto every record of a group; they are
/// assumed uniform per label and the first record's values are authoritative
/// (disagreements are logged, see [`crate::optimizer`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    /// Opaque unique identifier
    pub id: String,
    /// Display name; also the input to the region-marker match
    pub name: String,
    /// Grouping key; empty means the campaign is unlabeled
    pub label: String,
    /// Configured campaign daily budget
    pub budget: f64,
    /// Month-to-date spend
    pub cost: f64,
    /// Spend over the trailing 3 days ("momentum")
    pub cost_3d: f64,
    /// Conversions to date
    pub conversions: f64,
    /// Current cost per acquisition; 0 means no conversion data yet
    pub cpa: f64,
    /// Current target CPA bid; 0 means none set yet
    pub tcpa: f64,
    /// Monthly budget for the whole label
    pub label_budget: f64,
    /// Remaining daily budget for the whole label
    pub label_remaining_budget: f64,
    /// The label KPI: target CPA the whole group is steered toward
    pub label_kpi: f64,
}

// ─────────────────────────────────────────────
// 2. CampaignUpdate
// ─────────────────────────────────────────────

/// Final output of a pass for one campaign. These are the only two fields the
/// engine ever asks the caller to mutate, rounded to 2 decimal places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignUpdate {
    pub id: String,
    pub new_daily_budget: f64,
    pub new_target_cpa: f64,
}

// ─────────────────────────────────────────────
// 3. GroupSummary / PassOutcome
// ─────────────────────────────────────────────

/// Per-label bookkeeping emitted alongside the updates.
#[derive(Debug, Clone, Serialize)]
pub struct GroupSummary {
    pub label: String,
    /// Number of member campaigns
    pub campaigns: usize,
    /// The daily spend target the group was allocated against
    pub target_daily_spend: f64,
    /// Budget lost when a regional cap freed surplus but the group had no
    /// non-region campaign to absorb it. Zero in the normal case.
    pub absorbed_surplus: f64,
}

/// Result of one full optimization pass: one update per input campaign plus
/// one summary per label group.
#[derive(Debug, Clone, Serialize)]
pub struct PassOutcome {
    pub updates: Vec<CampaignUpdate>,
    pub groups: Vec<GroupSummary>,
}
