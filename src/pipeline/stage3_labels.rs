use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{PipelineError, PipelineResult, config_err};
use crate::model::group::{GroupKey, OTHER};
use crate::model::palette::{
    Colour, ColourTable, DEFAULT_PALETTE, fallback_colour, palette_colour, reserved_colour,
};
use crate::pipeline::stage2_order::GroupOrder;

#[derive(Debug, Clone)]
pub struct Stage3Params<'a> {
    pub user_labels: &'a BTreeMap<GroupKey, String>,
    pub exclude: &'a [GroupKey],
    pub colours: Option<&'a ColourTable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelEntry {
    pub label: String,
    pub colour: Colour,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelAssignment {
    order: Vec<GroupKey>,
    entries: BTreeMap<GroupKey, LabelEntry>,
    label_order: Vec<String>,
    excluded: Vec<GroupKey>,
}

impl LabelAssignment {
    fn new(
        order: Vec<GroupKey>,
        entries: BTreeMap<GroupKey, LabelEntry>,
        label_order: Vec<String>,
        excluded: Vec<GroupKey>,
    ) -> PipelineResult<Self> {
        let mut colour_by_label: BTreeMap<&str, &Colour> = BTreeMap::new();
        for key in &order {
            let entry = entries.get(key).ok_or_else(|| {
                PipelineError::Data(format!("group '{key}' has no label assignment"))
            })?;
            let colour = colour_by_label
                .entry(entry.label.as_str())
                .or_insert(&entry.colour);
            if *colour != &entry.colour {
                return Err(PipelineError::Data(format!(
                    "label '{}' was given two colours",
                    entry.label
                )));
            }
        }
        if entries.len() != order.len() {
            return Err(PipelineError::Data(
                "label assignment holds entries for groups outside the plotting order".to_string(),
            ));
        }
        Ok(Self {
            order,
            entries,
            label_order,
            excluded,
        })
    }

    /// Plotting order after exclusion.
    pub fn order(&self) -> &[GroupKey] {
        &self.order
    }

    pub fn entry(&self, key: &GroupKey) -> Option<&LabelEntry> {
        self.entries.get(key)
    }

    /// Distinct labels by first appearance in the plotting order.
    pub fn label_order(&self) -> &[String] {
        &self.label_order
    }

    pub fn excluded(&self) -> &[GroupKey] {
        &self.excluded
    }

    pub fn colour_of_label(&self, label: &str) -> Option<&Colour> {
        self.entries
            .values()
            .find(|e| e.label == label)
            .map(|e| &e.colour)
    }

    /// Keys carrying `label`, in plotting order.
    pub fn keys_for_label<'s>(&'s self, label: &'s str) -> impl Iterator<Item = &'s GroupKey> + 's {
        self.order
            .iter()
            .filter(move |k| self.entries.get(*k).is_some_and(|e| e.label == label))
    }
}

pub fn run_stage3(order: &GroupOrder, params: &Stage3Params<'_>) -> PipelineResult<LabelAssignment> {
    let mut kept: Vec<GroupKey> = Vec::with_capacity(order.len());
    let mut excluded: Vec<GroupKey> = Vec::new();
    for key in order.keys() {
        if params.exclude.contains(key) {
            excluded.push(key.clone());
        } else {
            kept.push(key.clone());
        }
    }
    for key in params.exclude {
        if !excluded.contains(key) {
            tracing::warn!("excluded group '{}' is not among the plotted groups", key);
        }
    }

    let mut label_by_key: Vec<(GroupKey, String)> = Vec::with_capacity(kept.len());
    let mut label_order: Vec<String> = Vec::new();
    for key in &kept {
        let label = resolve_label(key, params.user_labels);
        if !label_order.contains(&label) {
            label_order.push(label.clone());
        }
        label_by_key.push((key.clone(), label));
    }

    let colour_by_label = assign_colours(&label_order, &label_by_key, params.colours)?;

    let mut entries = BTreeMap::new();
    for (key, label) in label_by_key {
        let colour = colour_by_label
            .get(&label)
            .cloned()
            .unwrap_or_else(fallback_colour);
        entries.insert(key, LabelEntry { label, colour });
    }

    LabelAssignment::new(kept, entries, label_order, excluded)
}

/// Label precedence: user relabel, then the fixed `other` label, then the raw key.
pub fn resolve_label(key: &GroupKey, user_labels: &BTreeMap<GroupKey, String>) -> String {
    if let Some(label) = user_labels.get(key) {
        return label.clone();
    }
    if key.is_other() {
        return OTHER.to_string();
    }
    key.as_str().to_string()
}

/// Colour precedence: table by label, table by key, reserved colour, default palette.
fn assign_colours(
    label_order: &[String],
    label_by_key: &[(GroupKey, String)],
    table: Option<&ColourTable>,
) -> PipelineResult<BTreeMap<String, Colour>> {
    let mut out = BTreeMap::new();
    let mut needs_palette: Vec<&String> = Vec::new();

    for label in label_order {
        let from_table = table.and_then(|t| {
            t.get(label).cloned().or_else(|| {
                label_by_key
                    .iter()
                    .filter(|(_, l)| l == label)
                    .find_map(|(k, _)| t.get(k.as_str()).cloned())
            })
        });
        match from_table.or_else(|| reserved_colour(label)) {
            Some(colour) => {
                out.insert(label.clone(), colour);
            }
            None => needs_palette.push(label),
        }
    }

    if needs_palette.len() > DEFAULT_PALETTE.len() && table.is_none() {
        return Err(config_err(format!(
            "{} labels need automatic colours but the default palette holds {}; supply --colours or lower --plotgroups",
            needs_palette.len(),
            DEFAULT_PALETTE.len()
        )));
    }

    for (idx, label) in needs_palette.into_iter().enumerate() {
        let colour = match palette_colour(idx) {
            Some(colour) => colour,
            None => {
                tracing::warn!(
                    "no colour for label '{}' in the colour table and the palette is exhausted; using {}",
                    label,
                    fallback_colour()
                );
                fallback_colour()
            }
        };
        out.insert(label.clone(), colour);
    }

    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_labels.rs"]
mod tests;
