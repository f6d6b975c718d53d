use serde::Serialize;

use crate::model::palette::Colour;
use crate::model::sequence::SequenceRecord;
use crate::pipeline::stage1_resolve::{FilterSummary, LibraryTotals};
use crate::pipeline::stage2_order::GroupOrder;
use crate::pipeline::stage3_labels::LabelAssignment;
use crate::report::{max_f64, mean, median_f64, min_f64, n50, percent, std_dev};

/// Coverage below this is drawn at this value so log-scaled axes stay finite.
pub const MIN_PLOT_COVERAGE: f64 = 0.02;

pub fn plot_coverage(cov: f64) -> f64 {
    cov.max(MIN_PLOT_COVERAGE)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverageSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryGroupStats {
    pub library: String,
    pub coverage: CoverageSummary,
    pub reads_mapped: u64,
    /// Share of the library's total reads; absent when the library has no read total.
    pub reads_mapped_perc: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub name: String,
    pub label: String,
    pub colour: Option<Colour>,
    pub count: usize,
    pub count_perc: f64,
    pub span: u64,
    pub span_perc: f64,
    pub n50: u64,
    pub gc_mean: f64,
    pub gc_std: f64,
    pub libraries: Vec<LibraryGroupStats>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CoverageRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsTable {
    pub groups: Vec<GroupStats>,
    pub all: GroupStats,
    pub libraries: Vec<LibraryTotals>,
    pub coverage_range: Option<CoverageRange>,
    pub summary: FilterSummary,
}

#[derive(Debug, Clone)]
pub struct Stage4Inputs<'a> {
    pub records: &'a [SequenceRecord],
    pub order: &'a GroupOrder,
    pub labels: &'a LabelAssignment,
    pub libraries: &'a [LibraryTotals],
    pub summary: &'a FilterSummary,
}

pub fn run_stage4(inputs: &Stage4Inputs<'_>) -> StatsTable {
    let mut surviving: Vec<(&str, &str, Option<&Colour>, &[usize])> = Vec::new();
    for key in inputs.labels.order() {
        let Some(group) = inputs.order.get(key) else {
            continue;
        };
        let entry = inputs.labels.entry(key);
        surviving.push((
            key.as_str(),
            entry.map(|e| e.label.as_str()).unwrap_or(key.as_str()),
            entry.map(|e| &e.colour),
            group.members.as_slice(),
        ));
    }

    let all_members: Vec<usize> = surviving
        .iter()
        .flat_map(|(_, _, _, members)| members.iter().copied())
        .collect();
    let total_count = all_members.len();
    let total_span: u64 = all_members
        .iter()
        .map(|&idx| inputs.records[idx].length)
        .sum();

    let groups = surviving
        .iter()
        .map(|(name, label, colour, members)| {
            group_stats(
                name,
                label,
                colour.cloned(),
                members,
                inputs,
                total_count,
                total_span,
            )
        })
        .collect::<Vec<_>>();
    let all = group_stats(
        "all",
        "all",
        None,
        &all_members,
        inputs,
        total_count,
        total_span,
    );

    StatsTable {
        groups,
        all,
        libraries: inputs.libraries.to_vec(),
        coverage_range: coverage_range(inputs.records, &all_members, inputs.libraries),
        summary: inputs.summary.clone(),
    }
}

fn group_stats(
    name: &str,
    label: &str,
    colour: Option<Colour>,
    members: &[usize],
    inputs: &Stage4Inputs<'_>,
    total_count: usize,
    total_span: u64,
) -> GroupStats {
    let records = inputs.records;
    let lengths: Vec<u64> = members.iter().map(|&i| records[i].length).collect();
    let gcs: Vec<f64> = members.iter().map(|&i| records[i].gc).collect();
    let span: u64 = lengths.iter().sum();

    let libraries = inputs
        .libraries
        .iter()
        .map(|lib| {
            let covs: Vec<f64> = members
                .iter()
                .map(|&i| records[i].coverage(&lib.id))
                .collect();
            let reads_mapped: u64 = members
                .iter()
                .map(|&i| records[i].reads_mapped(&lib.id))
                .sum();
            LibraryGroupStats {
                library: lib.id.clone(),
                coverage: CoverageSummary {
                    min: min_f64(&covs),
                    max: max_f64(&covs),
                    mean: mean(&covs),
                    median: median_f64(&covs),
                    std: std_dev(&covs),
                },
                reads_mapped,
                reads_mapped_perc: lib
                    .has_read_mapping()
                    .then(|| percent(reads_mapped as f64, lib.reads_total as f64)),
            }
        })
        .collect();

    GroupStats {
        name: name.to_string(),
        label: label.to_string(),
        colour,
        count: members.len(),
        count_perc: percent(members.len() as f64, total_count as f64),
        span,
        span_perc: percent(span as f64, total_span as f64),
        n50: n50(&lengths),
        gc_mean: mean(&gcs),
        gc_std: std_dev(&gcs),
        libraries,
    }
}

/// Range of plotted coverage across every selected library.
fn coverage_range(
    records: &[SequenceRecord],
    members: &[usize],
    libraries: &[LibraryTotals],
) -> Option<CoverageRange> {
    let mut range: Option<CoverageRange> = None;
    for lib in libraries {
        for &idx in members {
            let cov = plot_coverage(records[idx].coverage(&lib.id));
            range = Some(match range {
                None => CoverageRange { min: cov, max: cov },
                Some(r) => CoverageRange {
                    min: r.min.min(cov),
                    max: r.max.max(cov),
                },
            });
        }
    }
    range
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_stats.rs"]
mod tests;
