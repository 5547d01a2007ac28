//! # AdPace Engine — Bid Normalization (tCPA)
//!
//! Table of Contents:
//! 1. Raw tCPA rule — per-campaign bid from recent performance
//! 2. Correction factor — one scalar pulling the group's spend-weighted
//!    average bid back inside the KPI tolerance band

use crate::budget::WorkItem;
use crate::config::EngineConfig;
use crate::types::Campaign;

// ─────────────────────────────────────────────
// 1. Raw tCPA rule
// ─────────────────────────────────────────────

/// New target CPA for one campaign, before group correction. Evaluated
/// independently of the budget allocation.
///
/// - No conversion data: default to the KPI (neutral).
/// - Dormant (3-day spend under the budget floor): loosen aggressively to
///   wake the campaign up, but never below KPI.
/// - Beating KPI: let the bid rise toward efficient spend, bounded below by
///   a small step-up from the previous bid to prevent whiplash.
/// - Underperforming: tighten.
pub fn raw_tcpa(campaign: &Campaign, kpi: f64, cfg: &EngineConfig) -> f64 {
    let current_cpa = campaign.cpa;
    let old_tcpa = campaign.tcpa;

    if current_cpa <= 0.0 {
        kpi
    } else if campaign.cost_3d < cfg.min_daily_budget {
        (old_tcpa * cfg.tcpa_loosen).max(kpi)
    } else if current_cpa < kpi {
        let ideal_bid = current_cpa * cfg.tcpa_loosen;
        ideal_bid.max(old_tcpa * cfg.tcpa_step_up)
    } else {
        old_tcpa * cfg.tcpa_tighten
    }
}

// ─────────────────────────────────────────────
// 2. Correction factor
// ─────────────────────────────────────────────

/// Spend-weighted average of the raw bids, using the finalized daily budgets
/// as weights. Falls back to the unweighted mean for a zero-budget group.
pub(crate) fn weighted_avg_tcpa(items: &[WorkItem<'_>]) -> f64 {
    let total_budget: f64 = items.iter().map(|i| i.new_daily_budget).sum();
    if total_budget > 0.0 {
        items
            .iter()
            .map(|i| i.raw_tcpa * i.new_daily_budget)
            .sum::<f64>()
            / total_budget
    } else {
        items.iter().map(|i| i.raw_tcpa).sum::<f64>() / items.len() as f64
    }
}

/// The single scalar applied uniformly to every raw bid in the group. Keeps
/// the label's bidding coherent with its KPI while preserving the relative
/// ordering chosen by the per-campaign rule.
pub(crate) fn correction_factor(avg_tcpa: f64, kpi: f64, cfg: &EngineConfig) -> f64 {
    if avg_tcpa <= 0.0 {
        return 1.0;
    }
    let upper = cfg.band_upper(kpi);
    let lower = cfg.band_lower(kpi);
    if avg_tcpa > upper {
        upper / avg_tcpa
    } else if avg_tcpa < lower {
        lower / avg_tcpa
    } else {
        1.0
    }
}

/// Compute raw bids, the group correction, and the floored final bids.
pub(crate) fn normalize_bids(items: &mut [WorkItem<'_>], kpi: f64, cfg: &EngineConfig) {
    for item in items.iter_mut() {
        item.raw_tcpa = raw_tcpa(item.campaign, kpi, cfg);
    }
    let factor = correction_factor(weighted_avg_tcpa(items), kpi, cfg);
    for item in items.iter_mut() {
        item.new_tcpa = (item.raw_tcpa * factor).max(cfg.tcpa_floor);
    }
}
