use std::fmt::Write;

use crate::pipeline::stage4_stats::{GroupStats, StatsTable};
use crate::report::{ReportMeta, format_f64_4, format_perc};

pub fn render_stats_text(meta: &ReportMeta, stats: &StatsTable) -> String {
    let mut out = String::new();
    let summary = &stats.summary;

    let _ = writeln!(out, "## {} v{}", meta.tool_name, meta.tool_version);
    let _ = writeln!(out, "## BlobDB: {}", meta.blobdb_path);
    if let Some(version) = &meta.blobdb_version {
        let _ = writeln!(out, "## BlobDB version: {}", version);
    }
    let _ = writeln!(out, "## Output: {}", meta.output_key);
    let _ = writeln!(
        out,
        "## Settings: rank={} taxrule={} min_length={} plotgroups={} sort={} hist={}",
        meta.rank, meta.taxrule, meta.min_length, meta.max_group_plot, meta.sort_order, meta.hist_type
    );
    let _ = writeln!(
        out,
        "## Sequences: total={} (span {}), visible={} (span {})",
        summary.total_count, summary.total_span, summary.visible_count, summary.visible_span
    );
    let _ = writeln!(
        out,
        "## Hidden: below_length={} (span {}), unclassified={} (span {})",
        summary.below_length_count,
        summary.below_length_span,
        summary.unclassified_hidden_count,
        summary.unclassified_hidden_span
    );
    for lib in &stats.libraries {
        if lib.has_read_mapping() {
            let _ = writeln!(
                out,
                "## {}: total_reads={} mapped_reads={} unmapped_reads={}",
                lib.id,
                lib.reads_total,
                lib.reads_mapped,
                lib.reads_unmapped()
            );
        } else {
            let _ = writeln!(out, "## {}: no read-mapping data", lib.id);
        }
    }
    if let Some(range) = stats.coverage_range {
        let _ = writeln!(
            out,
            "## Coverage range: {} - {}",
            format_f64_4(range.min),
            format_f64_4(range.max)
        );
    }

    let mut header = vec![
        "# name".to_string(),
        "label".to_string(),
        "colour".to_string(),
        "count_visible".to_string(),
        "count_visible_perc".to_string(),
        "span_visible".to_string(),
        "span_visible_perc".to_string(),
        "n50".to_string(),
        "gc_mean".to_string(),
        "gc_std".to_string(),
    ];
    for lib in &stats.libraries {
        for col in ["mean", "median", "std", "min", "max", "read_map", "read_map_p"] {
            header.push(format!("{}_{}", lib.id, col));
        }
    }
    let _ = writeln!(out, "{}", header.join("\t"));

    for group in stats.groups.iter().chain(std::iter::once(&stats.all)) {
        let _ = writeln!(out, "{}", stats_row(group).join("\t"));
    }
    out
}

fn stats_row(group: &GroupStats) -> Vec<String> {
    let mut row = vec![
        group.name.clone(),
        group.label.clone(),
        group
            .colour
            .as_ref()
            .map(|c| c.to_string())
            .unwrap_or_else(|| "None".to_string()),
        group.count.to_string(),
        format_perc(Some(group.count_perc)),
        group.span.to_string(),
        format_perc(Some(group.span_perc)),
        group.n50.to_string(),
        format_f64_4(group.gc_mean),
        format_f64_4(group.gc_std),
    ];
    for lib in &group.libraries {
        row.push(format_f64_4(lib.coverage.mean));
        row.push(format_f64_4(lib.coverage.median));
        row.push(format_f64_4(lib.coverage.std));
        row.push(format_f64_4(lib.coverage.min));
        row.push(format_f64_4(lib.coverage.max));
        row.push(lib.reads_mapped.to_string());
        row.push(format_perc(lib.reads_mapped_perc));
    }
    row
}
