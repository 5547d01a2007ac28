//! # AdPace Engine — Policy Configuration
//!
//! Every tunable of the reallocation policy lives here instead of being a
//! hidden literal, so alternate policies can be tested without code changes.
//! `EngineConfig::default()` carries the production constants.

use serde::{Deserialize, Serialize};

use crate::types::Campaign;

/// All policy tunables for one optimization pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Days left in the current spend period, used to turn a remaining
    /// monthly region budget into a daily cap
    pub days_remaining: f64,
    /// Absolute floor for any campaign's new daily budget
    pub min_daily_budget: f64,
    /// Substring of the campaign name that marks a region-capped campaign
    pub region_marker: String,
    /// Fraction of the label's monthly budget the region may consume
    pub region_budget_ratio: f64,
    /// Score multiplier for campaigns at or above KPI efficiency
    pub reward_factor: f64,
    /// Score multiplier for campaigns below the efficiency tolerance
    pub penalty_factor: f64,
    /// Efficiency below this is penalized (1 / 1.15: 15% worse than KPI)
    pub penalty_threshold: f64,
    /// tCPA multiplier used to loosen bids (dormant wake-up, CPA step-up)
    pub tcpa_loosen: f64,
    /// Minimum step-up from the previous bid when raising toward spend
    pub tcpa_step_up: f64,
    /// tCPA multiplier applied to underperformers
    pub tcpa_tighten: f64,
    /// Half-width of the KPI tolerance band (0.15 = ±15%)
    pub kpi_band: f64,
    /// Absolute floor for any campaign's new target CPA
    pub tcpa_floor: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            days_remaining: 15.0,
            min_daily_budget: 5.0,
            region_marker: "India".to_string(),
            region_budget_ratio: 0.30,
            reward_factor: 1.25,
            penalty_factor: 0.75,
            penalty_threshold: 1.0 / 1.15,
            tcpa_loosen: 1.20,
            tcpa_step_up: 1.05,
            tcpa_tighten: 0.90,
            kpi_band: 0.15,
            tcpa_floor: 0.01,
        }
    }
}

impl EngineConfig {
    /// Whether a campaign falls under the regional spend cap.
    ///
    /// Name-substring matching is a known simplification kept for legacy
    /// compatibility; the marker is configurable so deployments with a real
    /// region attribute can route through a dedicated label instead.
    pub fn is_region(&self, campaign: &Campaign) -> bool {
        !self.region_marker.is_empty() && campaign.name.contains(&self.region_marker)
    }

    /// Lower edge of the KPI tolerance band for a given KPI.
    pub fn band_lower(&self, kpi: f64) -> f64 {
        kpi * (1.0 - self.kpi_band)
    }

    /// Upper edge of the KPI tolerance band for a given KPI.
    pub fn band_upper(&self, kpi: f64) -> f64 {
        kpi * (1.0 + self.kpi_band)
    }
}
