use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{PipelineError, config_err};

/// Name of the synthetic library that sums coverage over all real libraries.
pub const COVSUM: &str = "covsum";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rank {
    Species,
    Genus,
    Family,
    Order,
    Phylum,
    Superkingdom,
}

impl Rank {
    pub const ALL: [Rank; 6] = [
        Rank::Species,
        Rank::Genus,
        Rank::Family,
        Rank::Order,
        Rank::Phylum,
        Rank::Superkingdom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Rank::Species => "species",
            Rank::Genus => "genus",
            Rank::Family => "family",
            Rank::Order => "order",
            Rank::Phylum => "phylum",
            Rank::Superkingdom => "superkingdom",
        }
    }
}

impl FromStr for Rank {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rank::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| {
                config_err(format!(
                    "unsupported rank '{s}' (use species|genus|family|order|phylum|superkingdom)"
                ))
            })
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxRule {
    BestSum,
    BestSumOrder,
}

impl TaxRule {
    pub const ALL: [TaxRule; 2] = [TaxRule::BestSum, TaxRule::BestSumOrder];

    pub fn as_str(self) -> &'static str {
        match self {
            TaxRule::BestSum => "bestsum",
            TaxRule::BestSumOrder => "bestsumorder",
        }
    }
}

impl FromStr for TaxRule {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaxRule::ALL
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| {
                config_err(format!(
                    "unsupported taxrule '{s}' (use bestsum|bestsumorder)"
                ))
            })
    }
}

impl fmt::Display for TaxRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaxHit {
    pub tax: String,
    pub score: f64,
    pub c_index: u32,
}

#[derive(Debug, Clone)]
pub struct SequenceRecord {
    pub name: String,
    pub length: u64,
    pub gc: f64,
    pub n_count: u64,
    pub covs: BTreeMap<String, f64>,
    pub read_cov: BTreeMap<String, u64>,
    pub taxonomy: BTreeMap<TaxRule, BTreeMap<Rank, TaxHit>>,
}

impl SequenceRecord {
    pub fn hit(&self, taxrule: TaxRule, rank: Rank) -> Option<&TaxHit> {
        self.taxonomy.get(&taxrule).and_then(|ranks| ranks.get(&rank))
    }

    pub fn coverage(&self, lib: &str) -> f64 {
        if lib == COVSUM {
            return self.covs.values().sum();
        }
        self.covs.get(lib).copied().unwrap_or(0.0)
    }

    pub fn reads_mapped(&self, lib: &str) -> u64 {
        if lib == COVSUM {
            return self.read_cov.values().sum();
        }
        self.read_cov.get(lib).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageLibrary {
    pub id: String,
    pub path: String,
    pub reads_total: u64,
    pub reads_mapped: u64,
}
