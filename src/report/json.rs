use serde::Serialize;

use crate::pipeline::stage4_stats::StatsTable;
use crate::pipeline::stage5_dataset::PlotDataset;
use crate::report::ReportMeta;

#[derive(Serialize)]
struct StatsDocument<'a> {
    tool: &'a str,
    version: &'a str,
    meta: &'a ReportMeta,
    stats: &'a StatsTable,
}

pub fn render_stats_json(meta: &ReportMeta, stats: &StatsTable) -> serde_json::Result<String> {
    let doc = StatsDocument {
        tool: &meta.tool_name,
        version: &meta.tool_version,
        meta,
        stats,
    };
    let mut out = serde_json::to_string_pretty(&doc)?;
    out.push('\n');
    Ok(out)
}

pub fn render_dataset_json(dataset: &PlotDataset) -> serde_json::Result<String> {
    let mut out = serde_json::to_string(dataset)?;
    out.push('\n');
    Ok(out)
}
