use std::fmt;

use serde::Serialize;

pub const NO_HIT: &str = "no-hit";
pub const UNDEF: &str = "undef";
pub const OTHER: &str = "other";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid group key '{0}': must be non-empty and free of tabs and newlines")]
pub struct InvalidGroupKey(pub String);

/// Validated group key. Keys end up as TSV cells and file name facets.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct GroupKey(String);

impl GroupKey {
    pub fn new(raw: &str) -> Result<Self, InvalidGroupKey> {
        let key = raw.trim();
        if key.is_empty() || key.contains(['\t', '\n', '\r']) {
            return Err(InvalidGroupKey(raw.to_string()));
        }
        Ok(Self(key.to_string()))
    }

    pub fn other() -> Self {
        Self(OTHER.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_other(&self) -> bool {
        self.0 == OTHER
    }

    pub fn is_unclassified(&self) -> bool {
        self.0 == NO_HIT || self.0 == UNDEF
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A bucket of records sharing one group key. `members` index into the loaded record set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomicGroup {
    pub key: GroupKey,
    pub members: Vec<usize>,
    pub span: u64,
    pub count: usize,
}

impl TaxonomicGroup {
    pub fn new(key: GroupKey) -> Self {
        Self {
            key,
            members: Vec::new(),
            span: 0,
            count: 0,
        }
    }

    pub fn push(&mut self, record_idx: usize, length: u64) {
        self.members.push(record_idx);
        self.span += length;
        self.count += 1;
    }

    pub fn absorb(&mut self, other: TaxonomicGroup) {
        self.members.extend(other.members);
        self.span += other.span;
        self.count += other.count;
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/group.rs"]
mod tests;
