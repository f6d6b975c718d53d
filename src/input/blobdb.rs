use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::input::{InputError, read_to_string_maybe_gz};
use crate::model::sequence::{CoverageLibrary, Rank, SequenceRecord, TaxHit, TaxRule};

#[derive(Debug, Deserialize)]
struct RawBlobDb {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    order_of_blobs: Vec<String>,
    dict_of_blobs: BTreeMap<String, RawBlob>,
    #[serde(rename = "covLibs", default)]
    cov_libs: BTreeMap<String, RawCovLib>,
    #[serde(default)]
    taxrules: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawBlob {
    #[serde(default)]
    name: Option<String>,
    length: u64,
    gc: f64,
    #[serde(default)]
    n_count: u64,
    #[serde(default)]
    covs: BTreeMap<String, f64>,
    #[serde(default)]
    read_cov: BTreeMap<String, u64>,
    #[serde(default)]
    taxonomy: BTreeMap<String, BTreeMap<String, RawTaxHit>>,
}

#[derive(Debug, Deserialize)]
struct RawTaxHit {
    tax: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    c_index: u32,
}

#[derive(Debug, Deserialize)]
struct RawCovLib {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "f", alias = "cov_lib_f", default)]
    path: String,
    #[serde(default)]
    reads_total: u64,
    #[serde(default)]
    reads_mapped: u64,
}

/// Loaded assembly database. Read-only once built.
#[derive(Debug, Clone)]
pub struct BlobDb {
    pub title: String,
    pub version: Option<String>,
    pub records: Vec<SequenceRecord>,
    pub cov_libs: Vec<CoverageLibrary>,
    /// Taxonomy rules the database was built with; empty when the file does not say.
    pub taxrules: Vec<String>,
}

pub fn load_blobdb(path: &Path) -> Result<BlobDb, InputError> {
    let text = read_to_string_maybe_gz(path)?;
    let raw: RawBlobDb = serde_json::from_str(&text)
        .map_err(|e| InputError::malformed(path, e.line(), e.to_string()))?;
    let title = raw
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| default_title(path));
    build_blobdb(raw, title, path)
}

fn build_blobdb(mut raw: RawBlobDb, title: String, path: &Path) -> Result<BlobDb, InputError> {
    let order = if raw.order_of_blobs.is_empty() {
        raw.dict_of_blobs.keys().cloned().collect::<Vec<_>>()
    } else {
        std::mem::take(&mut raw.order_of_blobs)
    };

    let mut records = Vec::with_capacity(order.len());
    for name in order {
        let blob = raw.dict_of_blobs.remove(&name).ok_or_else(|| {
            InputError::invalid(path, format!("sequence '{name}' is listed but has no entry"))
        })?;
        records.push(convert_blob(name, blob, path)?);
    }

    let mut cov_libs = Vec::with_capacity(raw.cov_libs.len());
    for (id, lib) in raw.cov_libs {
        if lib.reads_mapped > lib.reads_total && lib.reads_total > 0 {
            return Err(InputError::invalid(
                path,
                format!("coverage library '{id}' maps more reads than it holds"),
            ));
        }
        cov_libs.push(CoverageLibrary {
            id: lib.name.unwrap_or_else(|| id.clone()),
            path: lib.path,
            reads_total: lib.reads_total,
            reads_mapped: lib.reads_mapped,
        });
    }

    tracing::info!(
        "loaded BlobDB '{}': {} sequences, {} coverage libraries",
        title,
        records.len(),
        cov_libs.len()
    );

    Ok(BlobDb {
        title,
        version: raw.version,
        records,
        cov_libs,
        taxrules: raw.taxrules,
    })
}

fn convert_blob(name: String, blob: RawBlob, path: &Path) -> Result<SequenceRecord, InputError> {
    if !(0.0..=1.0).contains(&blob.gc) {
        return Err(InputError::invalid(
            path,
            format!("sequence '{name}' has GC {} outside [0, 1]", blob.gc),
        ));
    }
    if let Some((lib, cov)) = blob.covs.iter().find(|(_, c)| c.is_nan() || **c < 0.0) {
        return Err(InputError::invalid(
            path,
            format!("sequence '{name}' has invalid coverage {cov} in library '{lib}'"),
        ));
    }

    let mut taxonomy = BTreeMap::new();
    for (rule_name, ranks) in blob.taxonomy {
        let Ok(rule) = rule_name.parse::<TaxRule>() else {
            continue;
        };
        let mut hits = BTreeMap::new();
        for (rank_name, hit) in ranks {
            let Ok(rank) = rank_name.parse::<Rank>() else {
                continue;
            };
            hits.insert(
                rank,
                TaxHit {
                    tax: hit.tax,
                    score: hit.score,
                    c_index: hit.c_index,
                },
            );
        }
        taxonomy.insert(rule, hits);
    }

    Ok(SequenceRecord {
        name: blob.name.unwrap_or(name),
        length: blob.length,
        gc: blob.gc,
        n_count: blob.n_count,
        covs: blob.covs,
        read_cov: blob.read_cov,
        taxonomy,
    })
}

/// `assembly.blobDB.json.gz` -> `assembly`
fn default_title(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "blobplot".to_string());
    let mut title = file_name.as_str();
    for suffix in [".gz", ".json", ".blobDB"] {
        if let Some(stripped) = title.strip_suffix(suffix) {
            title = stripped;
        }
    }
    if title.is_empty() {
        "blobplot".to_string()
    } else {
        title.to_string()
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/blobdb.rs"]
mod tests;
