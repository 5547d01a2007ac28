//! # AdPace Engine — Label Grouping
//!
//! Partitions a campaign snapshot into disjoint label groups. Campaigns with
//! an empty label fall into the synthetic "Unlabeled" group.

use std::collections::BTreeMap;

use crate::types::Campaign;

/// Group key assigned to campaigns without a label.
pub const UNLABELED: &str = "Unlabeled";

/// Partition a snapshot by label. Within a group, input order is preserved;
/// groups themselves come out in lexicographic label order so a pass is
/// deterministic regardless of snapshot ordering across labels.
pub fn group_by_label(snapshot: &[Campaign]) -> BTreeMap<String, Vec<&Campaign>> {
    let mut groups: BTreeMap<String, Vec<&Campaign>> = BTreeMap::new();
    for campaign in snapshot {
        let label = if campaign.label.trim().is_empty() {
            UNLABELED.to_string()
        } else {
            campaign.label.clone()
        };
        groups.entry(label).or_default().push(campaign);
    }
    groups
}
