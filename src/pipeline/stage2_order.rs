use std::collections::{BTreeMap, BTreeSet};

use crate::error::{PipelineError, PipelineResult, config_err};
use crate::model::config::SortOrder;
use crate::model::group::{GroupKey, TaxonomicGroup};

#[derive(Debug, Clone)]
pub struct Stage2Params<'a> {
    pub sort_order: SortOrder,
    pub sort_first: &'a [GroupKey],
    pub max_group_plot: usize,
}

/// Groups in plotting order. Keys are unique and at most `cap + 1` groups are held.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupOrder {
    groups: Vec<TaxonomicGroup>,
    merged: Vec<GroupKey>,
}

impl GroupOrder {
    pub fn new(
        groups: Vec<TaxonomicGroup>,
        merged: Vec<GroupKey>,
        cap: usize,
    ) -> PipelineResult<Self> {
        let mut seen = BTreeSet::new();
        for group in &groups {
            if !seen.insert(&group.key) {
                return Err(PipelineError::Data(format!(
                    "group '{}' appears twice in the plotting order",
                    group.key
                )));
            }
        }
        if groups.len() > cap + 1 {
            return Err(PipelineError::Data(format!(
                "plotting order holds {} groups but the cap is {}",
                groups.len(),
                cap
            )));
        }
        Ok(Self { groups, merged })
    }

    pub fn groups(&self) -> &[TaxonomicGroup] {
        &self.groups
    }

    pub fn keys(&self) -> impl Iterator<Item = &GroupKey> {
        self.groups.iter().map(|g| &g.key)
    }

    pub fn get(&self, key: &GroupKey) -> Option<&TaxonomicGroup> {
        self.groups.iter().find(|g| &g.key == key)
    }

    /// Keys folded into `other` because of the cap.
    pub fn merged(&self) -> &[GroupKey] {
        &self.merged
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Pinned groups lead in the given order and never overflow; the `other` key does not
/// count against `max_group_plot`. When more than `max_group_plot` other groups remain,
/// the smallest are merged into `other`. An unpinned `other` found in the data is then
/// taken out of its sorted slot and becomes the overflow bucket, placed last; a pinned
/// `other` keeps its slot and absorbs the overflow.
pub fn run_stage2(
    groups: BTreeMap<GroupKey, TaxonomicGroup>,
    params: &Stage2Params<'_>,
) -> PipelineResult<GroupOrder> {
    let cap = params.max_group_plot;
    if cap == 0 {
        return Err(config_err("--plotgroups must be at least 1"));
    }

    let mut remaining = groups;
    let mut pinned: Vec<TaxonomicGroup> = Vec::new();
    for key in params.sort_first {
        if let Some(group) = remaining.remove(key) {
            pinned.push(group);
        }
    }
    let pinned_capped = pinned.iter().filter(|g| !g.key.is_other()).count();
    if pinned_capped > cap {
        return Err(config_err(format!(
            "{} --sort_first groups are present but only {} groups are plotted",
            pinned_capped, cap
        )));
    }

    let mut unpinned: Vec<TaxonomicGroup> = remaining.into_values().collect();
    sort_groups(&mut unpinned, params.sort_order);

    let unpinned_capped = unpinned.iter().filter(|g| !g.key.is_other()).count();
    if pinned_capped + unpinned_capped <= cap {
        pinned.extend(unpinned);
        return GroupOrder::new(pinned, Vec::new(), cap);
    }

    // Overflow. An unpinned "other" never keeps a slot of its own.
    let pinned_other = pinned.iter().position(|g| g.key.is_other());
    let natural_other = match pinned_other {
        Some(_) => None,
        None => unpinned
            .iter()
            .position(|g| g.key.is_other())
            .map(|idx| unpinned.remove(idx)),
    };

    let slots = cap - pinned_capped;
    let overflow = unpinned.split_off(slots.min(unpinned.len()));

    let mut merged: Vec<GroupKey> = overflow.iter().map(|g| g.key.clone()).collect();
    let mut bucket = match natural_other {
        Some(other) => {
            merged.push(other.key.clone());
            other
        }
        None => TaxonomicGroup::new(GroupKey::other()),
    };
    for group in overflow {
        bucket.absorb(group);
    }

    tracing::info!(
        "{} groups exceed --plotgroups {}; merged {} into 'other'",
        pinned.len() + unpinned.len() + merged.len(),
        cap,
        merged.len()
    );

    let mut order = pinned;
    order.extend(unpinned);
    match pinned_other {
        Some(idx) => order[idx].absorb(bucket),
        None => order.push(bucket),
    }
    GroupOrder::new(order, merged, cap)
}

/// Descending by the chosen metric, ties broken by ascending key.
pub fn sort_groups(groups: &mut [TaxonomicGroup], order: SortOrder) {
    let metric = |g: &TaxonomicGroup| match order {
        SortOrder::Span => g.span,
        SortOrder::Count => g.count as u64,
    };
    groups.sort_by(|a, b| metric(b).cmp(&metric(a)).then_with(|| a.key.cmp(&b.key)));
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_order.rs"]
mod tests;
