use std::collections::BTreeMap;
use std::path::Path;

use crate::input::{InputError, read_data_lines};
use crate::model::config::ReadTotals;
use crate::model::group::GroupKey;
use crate::model::palette::{Colour, ColourTable};

/// Splits `a,b,c` into trimmed, non-empty items.
pub fn parse_cmd_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_group_list(raw: &str) -> Result<Vec<GroupKey>, InputError> {
    let mut out: Vec<GroupKey> = Vec::new();
    for item in parse_cmd_list(raw) {
        let key = GroupKey::new(&item).map_err(|e| InputError::Argument(e.to_string()))?;
        if !out.contains(&key) {
            out.push(key);
        }
    }
    Ok(out)
}

/// Parses repeated `LABEL=g1,g2` arguments into a key -> label map.
pub fn parse_user_labels(args: &[String]) -> Result<BTreeMap<GroupKey, String>, InputError> {
    let mut out: BTreeMap<GroupKey, String> = BTreeMap::new();
    for arg in args {
        let Some((label, groups)) = arg.split_once('=') else {
            return Err(InputError::Argument(format!(
                "--label '{arg}' is not of the form LABEL=group1,group2"
            )));
        };
        let label = GroupKey::new(label)
            .map_err(|e| InputError::Argument(format!("--label '{arg}': {e}")))?
            .to_string();
        let keys = parse_group_list(groups)?;
        if keys.is_empty() {
            return Err(InputError::Argument(format!("--label '{arg}' names no groups")));
        }
        for key in keys {
            if let Some(previous) = out.get(&key) {
                if previous != &label {
                    return Err(InputError::Argument(format!(
                        "group '{key}' is relabelled both as '{previous}' and '{label}'"
                    )));
                }
            }
            out.insert(key, label.clone());
        }
    }
    Ok(out)
}

/// `lib,total,mapped` per line.
pub fn parse_refcov(path: &Path) -> Result<BTreeMap<String, ReadTotals>, InputError> {
    let mut out = BTreeMap::new();
    for (line_no, line) in read_data_lines(path)? {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 3 || fields[0].is_empty() {
            return Err(InputError::malformed(
                path,
                line_no,
                "expected 'library,total_reads,mapped_reads'",
            ));
        }
        let total = parse_count(fields[1], path, line_no)?;
        let mapped = parse_count(fields[2], path, line_no)?;
        if mapped > total {
            return Err(InputError::malformed(
                path,
                line_no,
                format!("mapped reads ({mapped}) exceed total reads ({total})"),
            ));
        }
        if out
            .insert(fields[0].to_string(), ReadTotals { total, mapped })
            .is_some()
        {
            return Err(InputError::malformed(
                path,
                line_no,
                format!("library '{}' listed twice", fields[0]),
            ));
        }
    }
    Ok(out)
}

/// `group,#rrggbb` per line.
pub fn parse_colours(path: &Path) -> Result<ColourTable, InputError> {
    let mut out = ColourTable::new();
    for (line_no, line) in read_data_lines(path)? {
        let Some((group, colour)) = line.rsplit_once(',') else {
            return Err(InputError::malformed(path, line_no, "expected 'group,#rrggbb'"));
        };
        let group = group.trim();
        if group.is_empty() {
            return Err(InputError::malformed(path, line_no, "empty group name"));
        }
        let colour = Colour::parse(colour).ok_or_else(|| {
            InputError::malformed(path, line_no, format!("invalid colour '{}'", colour.trim()))
        })?;
        out.insert(group.to_string(), colour);
    }
    if out.is_empty() {
        return Err(InputError::invalid(path, "colour file defines no colours"));
    }
    Ok(out)
}

/// `sequence<TAB>category` per line; a comma separator is accepted too.
pub fn parse_categories(path: &Path) -> Result<BTreeMap<String, GroupKey>, InputError> {
    let mut out = BTreeMap::new();
    for (line_no, line) in read_data_lines(path)? {
        let split = line.split_once('\t').or_else(|| line.split_once(','));
        let Some((seq, category)) = split else {
            return Err(InputError::malformed(path, line_no, "expected 'sequence<TAB>category'"));
        };
        let seq = seq.trim();
        if seq.is_empty() {
            return Err(InputError::malformed(path, line_no, "empty sequence name"));
        }
        let key = GroupKey::new(category)
            .map_err(|e| InputError::malformed(path, line_no, e.to_string()))?;
        if out.insert(seq.to_string(), key).is_some() {
            tracing::warn!(
                "sequence '{}' has more than one category in {}; keeping the last (line {})",
                seq,
                path.display(),
                line_no
            );
        }
    }
    Ok(out)
}

fn parse_count(raw: &str, path: &Path, line_no: usize) -> Result<u64, InputError> {
    raw.parse::<u64>()
        .map_err(|_| InputError::malformed(path, line_no, format!("'{raw}' is not a read count")))
}

#[cfg(test)]
#[path = "../../tests/src_inline/input/auxfiles.rs"]
mod tests;
