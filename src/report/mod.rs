use serde::Serialize;

pub mod json;
pub mod text;

/// Run metadata printed at the top of every report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMeta {
    pub tool_name: String,
    pub tool_version: String,
    pub title: String,
    pub output_key: String,
    pub blobdb_path: String,
    pub blobdb_version: Option<String>,
    pub rank: String,
    pub taxrule: String,
    pub min_length: u64,
    pub max_group_plot: usize,
    pub sort_order: String,
    pub hist_type: String,
}

pub fn format_f64_4(v: f64) -> String {
    if v.is_finite() {
        format!("{:.4}", v)
    } else {
        "N/A".to_string()
    }
}

pub fn format_perc(v: Option<f64>) -> String {
    match v {
        Some(p) if p.is_finite() => format!("{:.2}%", p),
        _ => "N/A".to_string(),
    }
}

pub fn percent(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { 100.0 * part / whole } else { 0.0 }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Even-length input averages the two middle values.
pub fn median_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

pub fn min_f64(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

pub fn max_f64(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

/// Length `L` such that sequences of length >= `L` hold at least half the span.
pub fn n50(lengths: &[u64]) -> u64 {
    let total: u64 = lengths.iter().sum();
    if total == 0 {
        return 0;
    }
    let mut sorted = lengths.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let mut acc = 0u64;
    for len in sorted {
        acc += len;
        if acc * 2 >= total {
            return len;
        }
    }
    0
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
