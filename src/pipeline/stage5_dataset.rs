use std::path::Path;

use serde::Serialize;

use crate::model::config::{HistType, PlotFormat, RenderOptions};
use crate::model::group::GroupKey;
use crate::model::palette::Colour;
use crate::model::sequence::SequenceRecord;
use crate::pipeline::stage1_resolve::LibraryTotals;
use crate::pipeline::stage2_order::GroupOrder;
use crate::pipeline::stage3_labels::LabelAssignment;
use crate::pipeline::stage4_stats::{CoverageRange, plot_coverage};

pub const UNMAPPED: &str = "unmapped";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlobPoint {
    pub gc: f64,
    pub cov: f64,
    pub length: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub key: GroupKey,
    pub label: String,
    pub colour: Colour,
    pub points: Vec<BlobPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPanel {
    pub library: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<ScatterSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadBar {
    pub label: String,
    pub colour: Colour,
    pub reads: u64,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReadMappingPanel {
    pub library: String,
    pub reads_total: u64,
    pub bars: Vec<ReadBar>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub colour: Colour,
    pub count: usize,
    pub span: u64,
}

/// Render-ready data handed to the plotting backend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotDataset {
    pub title: Option<String>,
    pub format: PlotFormat,
    pub hist_type: HistType,
    pub scale_by_length: bool,
    pub legend: bool,
    pub coverage_range: Option<CoverageRange>,
    pub labels: Vec<LegendEntry>,
    pub scatter: Vec<ScatterPanel>,
    pub read_mapping: Vec<ReadMappingPanel>,
    /// Labels drawn in each successive figure.
    pub frames: Vec<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct Stage5Inputs<'a> {
    pub title: &'a str,
    pub records: &'a [SequenceRecord],
    pub order: &'a GroupOrder,
    pub labels: &'a LabelAssignment,
    pub libraries: &'a [LibraryTotals],
    pub coverage_range: Option<CoverageRange>,
    pub render: &'a RenderOptions,
    pub hist_type: HistType,
    pub no_scale: bool,
    pub cumulative: bool,
    pub multiplot: bool,
}

pub fn run_stage5(inputs: &Stage5Inputs<'_>) -> PlotDataset {
    let render = inputs.render;

    let scatter = if render.no_blobs {
        Vec::new()
    } else {
        inputs
            .libraries
            .iter()
            .map(|lib| scatter_panel(inputs, lib))
            .collect()
    };

    let read_mapping = if render.no_reads {
        Vec::new()
    } else {
        inputs
            .libraries
            .iter()
            .filter(|lib| {
                if !lib.has_read_mapping() {
                    tracing::info!(
                        "library '{}' has no read total; skipping its read-mapping plot",
                        lib.id
                    );
                }
                lib.has_read_mapping()
            })
            .map(|lib| read_mapping_panel(inputs, lib))
            .collect()
    };

    PlotDataset {
        title: (!render.no_title).then(|| inputs.title.to_string()),
        format: render.format,
        hist_type: inputs.hist_type,
        scale_by_length: !inputs.no_scale,
        legend: render.legend,
        coverage_range: inputs.coverage_range,
        labels: legend_entries(inputs),
        scatter,
        read_mapping,
        frames: frames(inputs.labels.label_order(), inputs.cumulative, inputs.multiplot),
    }
}

fn scatter_panel(inputs: &Stage5Inputs<'_>, lib: &LibraryTotals) -> ScatterPanel {
    let mut series = Vec::with_capacity(inputs.labels.order().len());
    for key in inputs.labels.order() {
        let (Some(group), Some(entry)) = (inputs.order.get(key), inputs.labels.entry(key)) else {
            continue;
        };
        let points = group
            .members
            .iter()
            .map(|&idx| {
                let record = &inputs.records[idx];
                BlobPoint {
                    gc: record.gc,
                    cov: plot_coverage(record.coverage(&lib.id)),
                    length: record.length,
                }
            })
            .collect();
        series.push(ScatterSeries {
            key: key.clone(),
            label: entry.label.clone(),
            colour: entry.colour.clone(),
            points,
        });
    }

    let y_label = if inputs.render.file_label && !lib.path.is_empty() {
        Path::new(&lib.path)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| lib.path.clone())
    } else {
        "Coverage".to_string()
    };

    ScatterPanel {
        library: lib.id.clone(),
        x_label: "GC proportion".to_string(),
        y_label,
        series,
    }
}

fn read_mapping_panel(inputs: &Stage5Inputs<'_>, lib: &LibraryTotals) -> ReadMappingPanel {
    let total = lib.reads_total as f64;
    let mut bars = Vec::with_capacity(inputs.labels.label_order().len() + 1);
    for label in inputs.labels.label_order() {
        let reads: u64 = inputs
            .labels
            .keys_for_label(label)
            .filter_map(|key| inputs.order.get(key))
            .flat_map(|group| group.members.iter())
            .map(|&idx| inputs.records[idx].reads_mapped(&lib.id))
            .sum();
        let Some(colour) = inputs.labels.colour_of_label(label) else {
            continue;
        };
        bars.push(ReadBar {
            label: label.clone(),
            colour: colour.clone(),
            reads,
            fraction: reads as f64 / total,
        });
    }
    let unmapped = lib.reads_unmapped();
    bars.push(ReadBar {
        label: UNMAPPED.to_string(),
        colour: crate::model::palette::fallback_colour(),
        reads: unmapped,
        fraction: unmapped as f64 / total,
    });

    ReadMappingPanel {
        library: lib.id.clone(),
        reads_total: lib.reads_total,
        bars,
    }
}

fn legend_entries(inputs: &Stage5Inputs<'_>) -> Vec<LegendEntry> {
    let mut out = Vec::with_capacity(inputs.labels.label_order().len());
    for label in inputs.labels.label_order() {
        let Some(colour) = inputs.labels.colour_of_label(label) else {
            continue;
        };
        let mut count = 0usize;
        let mut span = 0u64;
        for group in inputs
            .labels
            .keys_for_label(label)
            .filter_map(|key| inputs.order.get(key))
        {
            count += group.count;
            span += group.span;
        }
        out.push(LegendEntry {
            label: label.clone(),
            colour: colour.clone(),
            count,
            span,
        });
    }
    out
}

pub fn frames(labels: &[String], cumulative: bool, multiplot: bool) -> Vec<Vec<String>> {
    if multiplot {
        labels.iter().map(|l| vec![l.clone()]).collect()
    } else if cumulative {
        (1..=labels.len()).map(|n| labels[..n].to_vec()).collect()
    } else {
        vec![labels.to_vec()]
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_dataset.rs"]
mod tests;
