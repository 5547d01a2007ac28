//! # AdPace Engine — Optimization Pass
//!
//! Orchestrates one full pass: group by label, then per group run scoring →
//! allocation → regional cap → floors to get budgets, and independently the
//! bid normalizer (using those budgets as weights) to get tCPAs. Groups are
//! independent; the pass is a pure function of the snapshot.

use crate::bids::normalize_bids;
use crate::budget::{
    allocate_proportional, apply_region_cap, finalize_budgets, region_daily_cap,
    target_daily_spend, WorkItem,
};
use crate::config::EngineConfig;
use crate::grouping::group_by_label;
use crate::types::{Campaign, CampaignUpdate, GroupSummary, PassOutcome};

/// Tolerance when checking that label-level metrics agree across a group.
const LABEL_METRIC_TOLERANCE: f64 = 1e-6;

/// Run one optimization pass over a campaign snapshot.
///
/// Never fails: input anomalies (zero KPI, exhausted budgets, zero scores)
/// are resolved by documented fallbacks. The caller persists the returned
/// updates as a single all-or-nothing batch.
pub fn run_optimization(snapshot: &[Campaign], cfg: &EngineConfig) -> PassOutcome {
    let mut updates = Vec::with_capacity(snapshot.len());
    let mut groups = Vec::new();

    for (label, group) in group_by_label(snapshot) {
        if group.is_empty() {
            continue;
        }
        check_label_metrics(&label, &group);

        // First record's label-level metrics are authoritative
        let first = group[0];
        let label_budget = first.label_budget;
        let kpi = first.label_kpi;
        let target = target_daily_spend(&group, cfg);

        let mut items: Vec<WorkItem<'_>> =
            group.iter().map(|c| WorkItem::new(c, kpi, cfg)).collect();

        allocate_proportional(&mut items, target);
        let cap = region_daily_cap(&items, label_budget, cfg);
        let absorbed_surplus = apply_region_cap(&mut items, cap);
        if absorbed_surplus > 0.0 {
            tracing::warn!(
                label = %label,
                surplus = absorbed_surplus,
                "regional cap freed budget with no non-region campaign to absorb it"
            );
        }
        finalize_budgets(&mut items, cfg);

        normalize_bids(&mut items, kpi, cfg);

        for item in &items {
            updates.push(CampaignUpdate {
                id: item.campaign.id.clone(),
                new_daily_budget: round2(item.new_daily_budget),
                new_target_cpa: round2(item.new_tcpa),
            });
        }
        groups.push(GroupSummary {
            label,
            campaigns: items.len(),
            target_daily_spend: target,
            absorbed_surplus,
        });
    }

    PassOutcome { updates, groups }
}

/// Round to 2 decimal places for persistence.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The policy assumes all records of a label carry identical label-level
/// metrics and takes the first record's values. Disagreement means a data
/// entry error upstream; surface it instead of silently trusting first-seen.
fn check_label_metrics(label: &str, group: &[&Campaign]) {
    let first = group[0];
    for campaign in &group[1..] {
        let mismatch = (campaign.label_budget - first.label_budget).abs() > LABEL_METRIC_TOLERANCE
            || (campaign.label_remaining_budget - first.label_remaining_budget).abs()
                > LABEL_METRIC_TOLERANCE
            || (campaign.label_kpi - first.label_kpi).abs() > LABEL_METRIC_TOLERANCE;
        if mismatch {
            tracing::warn!(
                label = %label,
                campaign = %campaign.id,
                "label-level metrics disagree within group; first record wins"
            );
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestCampaign {
        id: &'static str,
        name: &'static str,
        label: &'static str,
        cost: f64,
        cost_3d: f64,
        cpa: f64,
        tcpa: f64,
        label_budget: f64,
        label_remaining_budget: f64,
        label_kpi: f64,
    }

    impl Default for TestCampaign {
        fn default() -> Self {
            Self {
                id: "c",
                name: "US Search",
                label: "Search",
                cost: 0.0,
                cost_3d: 50.0,
                cpa: 8.0,
                tcpa: 9.0,
                label_budget: 3000.0,
                label_remaining_budget: 100.0,
                label_kpi: 10.0,
            }
        }
    }

    fn campaign(t: TestCampaign) -> Campaign {
        Campaign {
            id: t.id.into(),
            name: t.name.into(),
            label: t.label.into(),
            budget: 100.0,
            cost: t.cost,
            cost_3d: t.cost_3d,
            conversions: 10.0,
            cpa: t.cpa,
            tcpa: t.tcpa,
            label_budget: t.label_budget,
            label_remaining_budget: t.label_remaining_budget,
            label_kpi: t.label_kpi,
        }
    }

    fn update_for<'a>(outcome: &'a PassOutcome, id: &str) -> &'a CampaignUpdate {
        outcome.updates.iter().find(|u| u.id == id).unwrap()
    }

    #[test]
    fn test_efficient_campaign_wins_budget() {
        // Two campaigns, equal momentum, one beating and one missing KPI:
        // the $100 daily target splits 62.50 / 37.50.
        let snapshot = vec![
            campaign(TestCampaign {
                id: "eff",
                cpa: 8.0,
                ..TestCampaign::default()
            }),
            campaign(TestCampaign {
                id: "ineff",
                cpa: 15.0,
                ..TestCampaign::default()
            }),
        ];
        let outcome = run_optimization(&snapshot, &EngineConfig::default());

        assert!((update_for(&outcome, "eff").new_daily_budget - 62.5).abs() < 1e-9);
        assert!((update_for(&outcome, "ineff").new_daily_budget - 37.5).abs() < 1e-9);
    }

    #[test]
    fn test_budget_and_tcpa_floors_hold() {
        let snapshot = vec![
            campaign(TestCampaign {
                id: "a",
                cost_3d: 0.0,
                cpa: 40.0,
                tcpa: 0.0,
                label_remaining_budget: 6.0,
                ..TestCampaign::default()
            }),
            campaign(TestCampaign {
                id: "b",
                cost_3d: 200.0,
                cpa: 2.0,
                tcpa: 50.0,
                label_remaining_budget: 6.0,
                ..TestCampaign::default()
            }),
        ];
        let outcome = run_optimization(&snapshot, &EngineConfig::default());
        for update in &outcome.updates {
            assert!(update.new_daily_budget >= 5.0);
            assert!(update.new_target_cpa >= 0.01);
        }
    }

    #[test]
    fn test_group_kpi_band_holds() {
        let snapshot = vec![
            campaign(TestCampaign {
                id: "a",
                cpa: 3.0,
                tcpa: 30.0,
                ..TestCampaign::default()
            }),
            campaign(TestCampaign {
                id: "b",
                cpa: 25.0,
                tcpa: 28.0,
                ..TestCampaign::default()
            }),
            campaign(TestCampaign {
                id: "c",
                cpa: 0.0,
                tcpa: 0.0,
                ..TestCampaign::default()
            }),
        ];
        let cfg = EngineConfig::default();
        let outcome = run_optimization(&snapshot, &cfg);

        let total: f64 = outcome.updates.iter().map(|u| u.new_daily_budget).sum();
        let weighted: f64 = outcome
            .updates
            .iter()
            .map(|u| u.new_target_cpa * u.new_daily_budget)
            .sum::<f64>()
            / total;
        // KPI 10, band [8.5, 11.5]; allow slack for 2-decimal rounding
        assert!(weighted >= 8.5 - 0.05, "weighted avg {weighted} below band");
        assert!(weighted <= 11.5 + 0.05, "weighted avg {weighted} above band");
    }

    #[test]
    fn test_region_spend_stays_under_cap() {
        // Region has spent $880 of its 3000 * 0.30 = $900 share:
        // daily cap = 20/15 ≈ 1.33, raised to the 1-campaign floor of $5.
        let snapshot = vec![
            campaign(TestCampaign {
                id: "in",
                name: "India Search",
                cost: 880.0,
                cost_3d: 80.0,
                ..TestCampaign::default()
            }),
            campaign(TestCampaign {
                id: "us",
                name: "US Search",
                cost_3d: 20.0,
                ..TestCampaign::default()
            }),
        ];
        let cfg = EngineConfig::default();
        let outcome = run_optimization(&snapshot, &cfg);

        let region_total = update_for(&outcome, "in").new_daily_budget;
        assert!(region_total <= 5.0 + 0.01);
        // Freed budget lands on the non-region campaign, nothing reported lost
        assert_eq!(outcome.groups.len(), 1);
        assert_eq!(outcome.groups[0].absorbed_surplus, 0.0);
        let total = region_total + update_for(&outcome, "us").new_daily_budget;
        assert!((total - 100.0).abs() < 0.02);
    }

    #[test]
    fn test_region_only_group_reports_absorbed_surplus() {
        let snapshot = vec![campaign(TestCampaign {
            id: "in",
            name: "India Search",
            cost: 880.0,
            cost_3d: 80.0,
            ..TestCampaign::default()
        })];
        let outcome = run_optimization(&snapshot, &EngineConfig::default());
        assert!(outcome.groups[0].absorbed_surplus > 0.0);
        // Whole target was $100, cap lets through $5
        assert!((outcome.groups[0].absorbed_surplus - 95.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_conversion_data_bids_at_kpi() {
        let snapshot = vec![campaign(TestCampaign {
            id: "fresh",
            cpa: 0.0,
            tcpa: 22.0,
            ..TestCampaign::default()
        })];
        let outcome = run_optimization(&snapshot, &EngineConfig::default());
        assert!((update_for(&outcome, "fresh").new_target_cpa - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_dormant_campaign_wakes_at_kpi() {
        // momentum $3 < floor, oldTcpa $8: max(9.6, 10) = 10
        let snapshot = vec![campaign(TestCampaign {
            id: "dormant",
            cost_3d: 3.0,
            cpa: 12.0,
            tcpa: 8.0,
            ..TestCampaign::default()
        })];
        let outcome = run_optimization(&snapshot, &EngineConfig::default());
        assert!((update_for(&outcome, "dormant").new_target_cpa - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_pass_is_deterministic() {
        let snapshot = vec![
            campaign(TestCampaign {
                id: "a",
                name: "India Search",
                cost: 500.0,
                cpa: 12.0,
                ..TestCampaign::default()
            }),
            campaign(TestCampaign {
                id: "b",
                cpa: 7.0,
                ..TestCampaign::default()
            }),
            campaign(TestCampaign {
                id: "c",
                label: "",
                cpa: 0.0,
                label_kpi: 20.0,
                ..TestCampaign::default()
            }),
        ];
        let cfg = EngineConfig::default();
        let first = run_optimization(&snapshot, &cfg);
        let second = run_optimization(&snapshot, &cfg);
        assert_eq!(first.updates, second.updates);
    }

    #[test]
    fn test_groups_are_independent() {
        let search = campaign(TestCampaign {
            id: "s",
            ..TestCampaign::default()
        });
        let display = campaign(TestCampaign {
            id: "d",
            label: "Display",
            label_remaining_budget: 40.0,
            label_kpi: 25.0,
            ..TestCampaign::default()
        });
        let cfg = EngineConfig::default();

        let combined = run_optimization(&[search.clone(), display.clone()], &cfg);
        let alone = run_optimization(&[display], &cfg);
        assert_eq!(
            update_for(&combined, "d"),
            update_for(&alone, "d"),
        );
        assert_eq!(combined.updates.len(), 2);
    }

    #[test]
    fn test_exhausted_label_budget_bootstraps_floors() {
        let snapshot = vec![
            campaign(TestCampaign {
                id: "a",
                label_remaining_budget: 0.0,
                ..TestCampaign::default()
            }),
            campaign(TestCampaign {
                id: "b",
                label_remaining_budget: 0.0,
                ..TestCampaign::default()
            }),
        ];
        let outcome = run_optimization(&snapshot, &EngineConfig::default());
        // Target falls back to 2 * $5; equal scores split it evenly
        assert_eq!(outcome.groups[0].target_daily_spend, 10.0);
        for update in &outcome.updates {
            assert!((update.new_daily_budget - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_outputs_rounded_to_cents() {
        let snapshot = vec![
            campaign(TestCampaign {
                id: "a",
                cost_3d: 33.33,
                ..TestCampaign::default()
            }),
            campaign(TestCampaign {
                id: "b",
                cost_3d: 66.67,
                cpa: 15.0,
                ..TestCampaign::default()
            }),
        ];
        let outcome = run_optimization(&snapshot, &EngineConfig::default());
        for update in &outcome.updates {
            let cents = update.new_daily_budget * 100.0;
            assert!((cents - cents.round()).abs() < 1e-9);
            let cents = update.new_target_cpa * 100.0;
            assert!((cents - cents.round()).abs() < 1e-9);
        }
    }

    #[test]
    fn test_one_update_per_input_campaign() {
        let snapshot = vec![
            campaign(TestCampaign {
                id: "a",
                ..TestCampaign::default()
            }),
            campaign(TestCampaign {
                id: "b",
                label: "Display",
                ..TestCampaign::default()
            }),
            campaign(TestCampaign {
                id: "c",
                label: "",
                ..TestCampaign::default()
            }),
        ];
        let outcome = run_optimization(&snapshot, &EngineConfig::default());
        assert_eq!(outcome.updates.len(), 3);
        assert_eq!(outcome.groups.len(), 3);
    }
}
