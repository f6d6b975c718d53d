use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::{PipelineError, PipelineResult, config_err};
use crate::input::BlobDb;
use crate::model::config::ReadTotals;
use crate::model::group::{GroupKey, TaxonomicGroup};
use crate::model::sequence::{COVSUM, Rank, SequenceRecord, TaxRule};

#[derive(Debug, Clone)]
pub struct Stage1Params<'a> {
    pub rank: Rank,
    pub taxrule: TaxRule,
    pub min_length: u64,
    pub hide_nohits: bool,
    pub c_index: bool,
    pub categories: Option<&'a BTreeMap<String, GroupKey>>,
    pub lib_selection: Option<&'a [String]>,
    pub refcov: Option<&'a BTreeMap<String, ReadTotals>>,
}

/// A coverage library as used in this run, after selection and reference overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryTotals {
    pub id: String,
    pub path: String,
    pub reads_total: u64,
    pub reads_mapped: u64,
    pub synthetic: bool,
}

impl LibraryTotals {
    /// Libraries without a read total have nothing to show in read-mapping plots.
    pub fn has_read_mapping(&self) -> bool {
        self.reads_total > 0
    }

    pub fn reads_unmapped(&self) -> u64 {
        self.reads_total.saturating_sub(self.reads_mapped)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSummary {
    pub total_count: usize,
    pub total_span: u64,
    pub visible_count: usize,
    pub visible_span: u64,
    pub below_length_count: usize,
    pub below_length_span: u64,
    pub unclassified_hidden_count: usize,
    pub unclassified_hidden_span: u64,
}

#[derive(Debug, Clone)]
pub struct Stage1Output {
    pub groups: BTreeMap<GroupKey, TaxonomicGroup>,
    pub libraries: Vec<LibraryTotals>,
    pub summary: FilterSummary,
}

pub fn run_stage1(db: &BlobDb, params: &Stage1Params<'_>) -> PipelineResult<Stage1Output> {
    check_taxrule_available(db, params.taxrule)?;
    let libraries = resolve_libraries(db, params)?;

    if let Some(categories) = params.categories {
        let names: BTreeSet<&str> = db.records.iter().map(|r| r.name.as_str()).collect();
        let unknown = categories
            .keys()
            .filter(|name| !names.contains(name.as_str()))
            .count();
        if unknown > 0 {
            tracing::warn!(
                "{} categorised sequences are not in the BlobDB and were ignored",
                unknown
            );
        }
    }

    let mut groups: BTreeMap<GroupKey, TaxonomicGroup> = BTreeMap::new();
    let mut summary = FilterSummary::default();

    for (idx, record) in db.records.iter().enumerate() {
        summary.total_count += 1;
        summary.total_span += record.length;

        if record.length < params.min_length {
            summary.below_length_count += 1;
            summary.below_length_span += record.length;
            continue;
        }

        let key = resolve_group_key(record, params)?;
        if params.hide_nohits && key.is_unclassified() {
            summary.unclassified_hidden_count += 1;
            summary.unclassified_hidden_span += record.length;
            continue;
        }

        summary.visible_count += 1;
        summary.visible_span += record.length;
        groups
            .entry(key.clone())
            .or_insert_with(|| TaxonomicGroup::new(key))
            .push(idx, record.length);
    }

    tracing::info!(
        "resolved {} groups from {} of {} sequences (rank={}, taxrule={})",
        groups.len(),
        summary.visible_count,
        summary.total_count,
        params.rank,
        params.taxrule
    );

    Ok(Stage1Output {
        groups,
        libraries,
        summary,
    })
}

/// Key precedence: category table, then c-index, then the taxon at the requested rank.
pub fn resolve_group_key(
    record: &SequenceRecord,
    params: &Stage1Params<'_>,
) -> PipelineResult<GroupKey> {
    if let Some(category) = params.categories.and_then(|c| c.get(&record.name)) {
        return Ok(category.clone());
    }

    let ranks = record
        .taxonomy
        .get(&params.taxrule)
        .filter(|ranks| !ranks.is_empty())
        .ok_or_else(|| {
            PipelineError::Data(format!(
                "sequence '{}' has no taxonomy under taxrule '{}'",
                record.name, params.taxrule
            ))
        })?;
    let hit = ranks.get(&params.rank).ok_or_else(|| {
        PipelineError::Data(format!(
            "sequence '{}' has no '{}' assignment under taxrule '{}'",
            record.name, params.rank, params.taxrule
        ))
    })?;

    let raw = if params.c_index {
        hit.c_index.to_string()
    } else {
        hit.tax.clone()
    };
    GroupKey::new(&raw)
        .map_err(|e| PipelineError::Data(format!("sequence '{}': {e}", record.name)))
}

fn check_taxrule_available(db: &BlobDb, taxrule: TaxRule) -> PipelineResult<()> {
    if db.taxrules.is_empty() || db.taxrules.iter().any(|r| r == taxrule.as_str()) {
        return Ok(());
    }
    Err(config_err(format!(
        "taxrule '{}' was not computed for this BlobDB (available: {})",
        taxrule,
        db.taxrules.join(", ")
    )))
}

fn resolve_libraries(db: &BlobDb, params: &Stage1Params<'_>) -> PipelineResult<Vec<LibraryTotals>> {
    let mut all: Vec<LibraryTotals> = db
        .cov_libs
        .iter()
        .map(|lib| LibraryTotals {
            id: lib.id.clone(),
            path: lib.path.clone(),
            reads_total: lib.reads_total,
            reads_mapped: lib.reads_mapped,
            synthetic: false,
        })
        .collect();

    if let Some(refcov) = params.refcov {
        for (lib_id, totals) in refcov {
            let lib = all.iter_mut().find(|l| &l.id == lib_id).ok_or_else(|| {
                config_err(format!(
                    "reference coverage names unknown library '{lib_id}'"
                ))
            })?;
            lib.reads_total = totals.total;
            lib.reads_mapped = totals.mapped;
        }
    }

    if all.len() > 1 {
        let covsum = LibraryTotals {
            id: COVSUM.to_string(),
            path: String::new(),
            reads_total: all.iter().map(|l| l.reads_total).sum(),
            reads_mapped: all.iter().map(|l| l.reads_mapped).sum(),
            synthetic: true,
        };
        all.push(covsum);
    }

    let Some(selection) = params.lib_selection else {
        return Ok(all);
    };
    let mut selected = Vec::with_capacity(selection.len());
    for id in selection {
        let lib = all.iter().find(|l| &l.id == id).ok_or_else(|| {
            let known: Vec<&str> = all.iter().map(|l| l.id.as_str()).collect();
            config_err(format!(
                "coverage library '{id}' not found (available: {})",
                known.join(", ")
            ))
        })?;
        if !selected.iter().any(|l: &LibraryTotals| &l.id == id) {
            selected.push(lib.clone());
        }
    }
    Ok(selected)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_resolve.rs"]
mod tests;
