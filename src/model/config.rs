use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{PipelineResult, config_err};
use crate::model::group::GroupKey;
use crate::model::palette::{ColourTable, DEFAULT_PALETTE};
use crate::model::sequence::{Rank, TaxRule};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Span,
    Count,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Span => "span",
            SortOrder::Count => "count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum HistType {
    Span,
    Count,
}

impl HistType {
    pub fn as_str(self) -> &'static str {
        match self {
            HistType::Span => "span",
            HistType::Count => "count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PlotFormat {
    Png,
    Pdf,
    Eps,
    Jpeg,
    Ps,
    Svg,
    Svgz,
    Tiff,
}

/// Reference read counts for one library, overriding the database figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadTotals {
    pub total: u64,
    pub mapped: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub format: PlotFormat,
    pub no_title: bool,
    pub file_label: bool,
    pub legend: bool,
    pub no_blobs: bool,
    pub no_reads: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            format: PlotFormat::Png,
            no_title: false,
            file_label: false,
            legend: false,
            no_blobs: false,
            no_reads: false,
        }
    }
}

/// Everything one run depends on. Built once, then only borrowed by the stages.
#[derive(Debug, Clone)]
pub struct PlotConfig {
    pub rank: Rank,
    pub taxrule: TaxRule,
    pub min_length: u64,
    pub max_group_plot: usize,
    pub hide_nohits: bool,
    pub c_index: bool,
    pub sort_order: SortOrder,
    pub sort_first: Vec<GroupKey>,
    pub hist_type: HistType,
    pub no_scale: bool,
    pub cumulative: bool,
    pub multiplot: bool,
    pub lib_selection: Option<Vec<String>>,
    pub exclude: Vec<GroupKey>,
    pub user_labels: BTreeMap<GroupKey, String>,
    pub colours: Option<ColourTable>,
    pub categories: Option<BTreeMap<String, GroupKey>>,
    pub refcov: Option<BTreeMap<String, ReadTotals>>,
    pub render: RenderOptions,
    pub out_prefix: Option<PathBuf>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            rank: Rank::Phylum,
            taxrule: TaxRule::BestSum,
            min_length: 100,
            max_group_plot: 8,
            hide_nohits: false,
            c_index: false,
            sort_order: SortOrder::Span,
            sort_first: Vec::new(),
            hist_type: HistType::Span,
            no_scale: false,
            cumulative: false,
            multiplot: false,
            lib_selection: None,
            exclude: Vec::new(),
            user_labels: BTreeMap::new(),
            colours: None,
            categories: None,
            refcov: None,
            render: RenderOptions::default(),
            out_prefix: None,
        }
    }
}

impl PlotConfig {
    /// Checks that can be decided before the database is read.
    pub fn validate(&self) -> PipelineResult<()> {
        if self.max_group_plot == 0 {
            return Err(config_err("--plotgroups must be at least 1"));
        }
        if self.max_group_plot > DEFAULT_PALETTE.len() && self.colours.is_none() {
            return Err(config_err(format!(
                "--plotgroups must be at most {} for automatic colour assignment; supply --colours",
                DEFAULT_PALETTE.len()
            )));
        }
        if self.cumulative && self.multiplot {
            return Err(config_err("--cumulative and --multiplot cannot be combined"));
        }
        if self.c_index && self.categories.is_some() {
            return Err(config_err("--cindex and --catcolour cannot be combined"));
        }
        if let Some(libs) = &self.lib_selection {
            if libs.is_empty() {
                return Err(config_err("--lib was given without any library"));
            }
        }
        Ok(())
    }

    /// Relabel mapping as `(label, key)` pairs sorted by label, then key.
    pub fn user_label_pairs(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self
            .user_labels
            .iter()
            .map(|(key, label)| (label.as_str(), key.as_str()))
            .collect();
        pairs.sort_unstable();
        pairs
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/config.rs"]
mod tests;
