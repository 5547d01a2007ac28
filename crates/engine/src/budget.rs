//! # AdPace Engine — Scoring & Budget Allocation
//!
//! Table of Contents:
//! 1. WorkItem — transient per-campaign state for one group's pass
//! 2. Scoring — momentum x efficiency weight per campaign
//! 3. Allocation — proportional split of the group's daily spend target
//! 4. Regional cap — cap a marked region's aggregate budget, redistribute
//! 5. Finalization — minimum-budget floor, applied last

use crate::config::EngineConfig;
use crate::types::Campaign;

// ─────────────────────────────────────────────
// 1. WorkItem
// ─────────────────────────────────────────────

/// Transient per-campaign state built at the start of a group's pass and
/// discarded at the end. Only `new_daily_budget` and `new_tcpa` survive.
#[derive(Debug)]
pub(crate) struct WorkItem<'a> {
    pub campaign: &'a Campaign,
    pub score: f64,
    pub temp_budget: f64,
    pub new_daily_budget: f64,
    pub raw_tcpa: f64,
    pub new_tcpa: f64,
    pub in_region: bool,
}

impl<'a> WorkItem<'a> {
    pub fn new(campaign: &'a Campaign, kpi: f64, cfg: &EngineConfig) -> Self {
        Self {
            campaign,
            score: budget_score(campaign, kpi, cfg),
            temp_budget: 0.0,
            new_daily_budget: 0.0,
            raw_tcpa: 0.0,
            new_tcpa: 0.0,
            in_region: cfg.is_region(campaign),
        }
    }
}

// ─────────────────────────────────────────────
// 2. Scoring
// ─────────────────────────────────────────────

/// Allocation weight for one campaign: spend momentum, scaled up for
/// campaigns beating the KPI and down for clear underperformers.
///
/// Momentum is floored at the minimum daily budget so a silent campaign is
/// never starved to zero weight. A campaign with no conversion data is
/// treated as performing exactly at KPI (neutral).
pub fn budget_score(campaign: &Campaign, kpi: f64, cfg: &EngineConfig) -> f64 {
    let momentum = campaign.cost_3d.max(cfg.min_daily_budget);
    let cpa = if campaign.cpa > 0.0 { campaign.cpa } else { kpi };

    // cpa == 0 only when the KPI itself is 0; no efficiency signal either way
    let factor = if cpa <= 0.0 {
        1.0
    } else {
        let efficiency = kpi / cpa;
        if efficiency >= 1.0 {
            cfg.reward_factor
        } else if efficiency < cfg.penalty_threshold {
            cfg.penalty_factor
        } else {
            1.0
        }
    };

    momentum * factor
}

// ─────────────────────────────────────────────
// 3. Allocation
// ─────────────────────────────────────────────

/// The group's daily spend target: the label's remaining daily budget, or a
/// per-campaign floor bootstrap when that field is unknown or exhausted.
pub fn target_daily_spend(group: &[&Campaign], cfg: &EngineConfig) -> f64 {
    let remaining = group.first().map(|c| c.label_remaining_budget).unwrap_or(0.0);
    if remaining > 0.0 {
        remaining
    } else {
        group.len() as f64 * cfg.min_daily_budget
    }
}

/// Distribute `target` across the group proportionally to score. The momentum
/// floor makes a zero score sum unreachable, but an even split guards it.
pub(crate) fn allocate_proportional(items: &mut [WorkItem<'_>], target: f64) {
    let total_score: f64 = items.iter().map(|i| i.score).sum();
    if total_score <= 0.0 {
        let share = target / items.len() as f64;
        for item in items.iter_mut() {
            item.temp_budget = share;
        }
    } else {
        for item in items.iter_mut() {
            item.temp_budget = (item.score / total_score) * target;
        }
    }
}

// ─────────────────────────────────────────────
// 4. Regional cap
// ─────────────────────────────────────────────

/// Daily spend ceiling for the group's region campaigns, derived from the
/// region's share of the label's monthly budget and its spend to date. The
/// per-campaign floor always wins over the computed cap, so capping can never
/// starve region campaigns below the absolute minimum.
pub(crate) fn region_daily_cap(items: &[WorkItem<'_>], label_budget: f64, cfg: &EngineConfig) -> f64 {
    let region: Vec<&WorkItem<'_>> = items.iter().filter(|i| i.in_region).collect();
    let region_spent: f64 = region.iter().map(|i| i.campaign.cost).sum();

    let max_region_spend = label_budget * cfg.region_budget_ratio;
    let remaining = max_region_spend - region_spent;

    let mut cap = if remaining > 0.0 {
        remaining / cfg.days_remaining
    } else {
        0.0
    };

    let floor = region.len() as f64 * cfg.min_daily_budget;
    if cap < floor {
        cap = floor;
    }
    cap
}

/// Enforce the regional cap on proportional budgets. When the region's
/// allocation exceeds the cap, region budgets are scaled down and the surplus
/// is redistributed to non-region campaigns proportional to score (even split
/// if their combined score is 0). Returns the surplus that could not be
/// placed because the group has no non-region campaign.
pub(crate) fn apply_region_cap(items: &mut [WorkItem<'_>], cap: f64) -> f64 {
    let region_count = items.iter().filter(|i| i.in_region).count();
    if region_count == 0 {
        return 0.0;
    }

    let region_sum: f64 = items.iter().filter(|i| i.in_region).map(|i| i.temp_budget).sum();
    if region_sum <= cap {
        return 0.0;
    }

    let scale = cap / region_sum;
    for item in items.iter_mut().filter(|i| i.in_region) {
        item.temp_budget *= scale;
    }

    let surplus = region_sum - cap;
    let non_region_score: f64 = items
        .iter()
        .filter(|i| !i.in_region)
        .map(|i| i.score)
        .sum();
    let non_region_count = items.len() - region_count;

    if non_region_count == 0 {
        // No peer to absorb the freed budget; caller reports it as slack.
        return surplus;
    }

    if non_region_score > 0.0 {
        for item in items.iter_mut().filter(|i| !i.in_region) {
            item.temp_budget += (item.score / non_region_score) * surplus;
        }
    } else {
        let share = surplus / non_region_count as f64;
        for item in items.iter_mut().filter(|i| !i.in_region) {
            item.temp_budget += share;
        }
    }
    0.0
}

// ─────────────────────────────────────────────
// 5. Finalization
// ─────────────────────────────────────────────

/// Apply the minimum-budget floor after all redistribution. The floor can
/// push total group spend slightly above the daily target.
pub(crate) fn finalize_budgets(items: &mut [WorkItem<'_>], cfg: &EngineConfig) {
    for item in items.iter_mut() {
        item.new_daily_budget = item.temp_budget.max(cfg.min_daily_budget);
    }
}
