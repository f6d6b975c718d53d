use std::fs;
use std::path::{Path, PathBuf};

use crate::error::PipelineResult;
use crate::model::config::{PlotConfig, SortOrder};
use crate::model::group::GroupKey;
use crate::pipeline::stage4_stats::StatsTable;
use crate::pipeline::stage5_dataset::PlotDataset;
use crate::report::ReportMeta;
use crate::report::json::{render_dataset_json, render_stats_json};
use crate::report::text::render_stats_text;

/// Builds the output basename from every facet that changes the plotted result.
pub fn output_key(title: &str, config: &PlotConfig) -> String {
    let mut facets = vec![
        title.to_string(),
        config.taxrule.to_string(),
        config.rank.to_string(),
        format!("p{}", config.max_group_plot),
        config.hist_type.as_str().to_string(),
        config.min_length.to_string(),
    ];
    if config.categories.is_some() {
        facets.push("catcolour".to_string());
    }
    if config.no_scale {
        facets.push("noscale".to_string());
    }
    if config.c_index {
        facets.push("c_index".to_string());
    }
    if !config.exclude.is_empty() {
        facets.push(format!("exclude_{}", join_keys(config.exclude.iter())));
    }
    if !config.user_labels.is_empty() {
        let pairs: Vec<String> = config
            .user_label_pairs()
            .into_iter()
            .map(|(label, key)| format!("{}={}", escape_facet(label), escape_facet(key)))
            .collect();
        facets.push(format!("userlabel_{}", pairs.join("_")));
    }
    if config.hide_nohits {
        facets.push("nohit".to_string());
    }
    if config.sort_order == SortOrder::Count {
        facets.push("sort_count".to_string());
    }
    if !config.sort_first.is_empty() {
        facets.push(format!("first_{}", join_keys(config.sort_first.iter())));
    }
    if config.colours.is_some() {
        facets.push("colours".to_string());
    }
    if config.refcov.is_some() {
        facets.push("refcov".to_string());
    }
    if let Some(libs) = &config.lib_selection {
        let ids: Vec<String> = libs.iter().map(|id| escape_facet(id)).collect();
        facets.push(format!("lib_{}", ids.join("_")));
    }
    facets.push("blobplot".to_string());
    if config.cumulative {
        facets.push("cumulative".to_string());
    }
    if config.multiplot {
        facets.push("multiplot".to_string());
    }
    facets.join(".")
}

fn join_keys<'a>(keys: impl Iterator<Item = &'a GroupKey>) -> String {
    keys.map(|k| escape_facet(k.as_str()))
        .collect::<Vec<_>>()
        .join("_")
}

/// Percent-escapes facet, list and pair delimiters, path separators and spaces.
fn escape_facet(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '%' | '_' | '.' | '=' | '/' | '\\' | ' ' => {
                out.push_str(&format!("%{:02X}", c as u32));
            }
            _ => out.push(c),
        }
    }
    out
}

/// A prefix ending in `/` is a directory; any other prefix is joined with a dot.
pub fn output_base(prefix: Option<&Path>, key: &str) -> PathBuf {
    match prefix {
        None => PathBuf::from(key),
        Some(prefix) => {
            let raw = prefix.to_string_lossy();
            if raw.ends_with('/') || raw.ends_with(std::path::MAIN_SEPARATOR) {
                prefix.join(key)
            } else {
                PathBuf::from(format!("{raw}.{key}"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifacts {
    pub stats_txt: PathBuf,
    pub stats_json: PathBuf,
    pub plot_data: PathBuf,
}

/// Renders every artifact first so a rendering failure leaves nothing on disk.
pub fn write_outputs(
    base: &Path,
    meta: &ReportMeta,
    stats: &StatsTable,
    dataset: &PlotDataset,
) -> PipelineResult<WrittenArtifacts> {
    let stats_txt = render_stats_text(meta, stats);
    let stats_json = render_stats_json(meta, stats)?;
    let plot_data = render_dataset_json(dataset)?;

    let artifacts = WrittenArtifacts {
        stats_txt: with_suffix(base, "stats.txt"),
        stats_json: with_suffix(base, "stats.json"),
        plot_data: with_suffix(base, "plotdata.json"),
    };

    if let Some(parent) = base.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&artifacts.stats_txt, stats_txt)?;
    fs::write(&artifacts.stats_json, stats_json)?;
    fs::write(&artifacts.plot_data, plot_data)?;

    tracing::info!("wrote {}", artifacts.stats_txt.display());
    tracing::info!("wrote {}", artifacts.stats_json.display());
    tracing::info!("wrote {}", artifacts.plot_data.display());
    Ok(artifacts)
}

fn with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut raw = base.as_os_str().to_os_string();
    raw.push(".");
    raw.push(suffix);
    PathBuf::from(raw)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_output.rs"]
mod tests;
