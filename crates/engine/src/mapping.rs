//! Name-based schema mapping between canonical target fields and the
//! secondary source's columns.
//!
//! Suggestion is deliberately name-only: a wrong suggestion is always
//! user-correctable before commit, whereas inferring from cell contents
//! risks silent misjoins.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{TAG_FIELD, TARGET_FIELDS};

/// Canonical target field → secondary-source column. Several targets may
/// share one column; a target may be unmapped. Only `Tag` is required
/// before a join may run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMapping {
    map: BTreeMap<String, String>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, target: impl Into<String>, source: impl Into<String>) {
        self.map.insert(target.into(), source.into());
    }

    pub fn unset(&mut self, target: &str) {
        self.map.remove(target);
    }

    pub fn source_for(&self, target: &str) -> Option<&str> {
        self.map.get(target).map(String::as_str)
    }

    /// Source column mapped to the mandatory identifier field, if any.
    pub fn tag_source(&self) -> Option<&str> {
        self.source_for(TAG_FIELD)
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.map.iter().map(|(t, s)| (t.as_str(), s.as_str()))
    }
}

/// Suggestion payload handed to the caller for confirmation.
#[derive(Debug, Clone, Serialize)]
pub struct MappingSuggestion {
    pub target_fields: Vec<String>,
    pub source_fields: Vec<String>,
    pub suggested: FieldMapping,
}

/// Known alternate spellings per canonical field, drawn from schedule
/// exports seen in the field. Consulted only after exact and normalized
/// name matching fail; still name-based.
const FIELD_ALIASES: [(&str, &[&str]); 4] = [
    ("Tag", &["Unit_No", "Unit No.", "Unit Tag"]),
    ("MBH", &["Total_MBH", "MBH_Total"]),
    ("LAT", &["Leaving_Air_Temp"]),
    ("WPD", &["Max_WPD"]),
];

/// Propose a mapping for each target field from the secondary source's
/// column names. `Tag` is attempted first, then the remaining targets
/// in the given order. Precedence per target: exact name match, then
/// normalized match, then a known alias; the leftmost source column
/// wins among ties. Unmatched targets stay unmapped.
pub fn suggest(target_fields: &[&str], source_columns: &[String]) -> FieldMapping {
    let mut mapping = FieldMapping::new();

    let ordered = std::iter::once(TAG_FIELD)
        .chain(target_fields.iter().copied().filter(|t| *t != TAG_FIELD));

    for target in ordered {
        if let Some(column) = best_match(target, source_columns) {
            mapping.set(target, column);
        }
    }

    mapping
}

/// Suggest against the full canonical target field list.
pub fn suggest_default(source_columns: &[String]) -> FieldMapping {
    suggest(&TARGET_FIELDS, source_columns)
}

fn best_match<'a>(target: &str, source_columns: &'a [String]) -> Option<&'a str> {
    if let Some(col) = source_columns.iter().find(|c| c.trim() == target) {
        return Some(col);
    }

    let want = normalize_name(target);
    if let Some(col) = source_columns.iter().find(|c| normalize_name(c) == want) {
        return Some(col);
    }

    let aliases = FIELD_ALIASES
        .iter()
        .find(|(field, _)| *field == target)
        .map(|(_, aliases)| *aliases)?;
    for alias in aliases {
        let want = normalize_name(alias);
        if let Some(col) = source_columns.iter().find(|c| normalize_name(c) == want) {
            return Some(col);
        }
    }
    None
}

/// Case-fold and collapse whitespace/underscore runs so `Unit_No` and
/// `UNIT NO.` compare equal.
fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;
    for ch in name.trim().chars() {
        if ch.is_whitespace() || ch == '_' {
            pending_space = true;
            continue;
        }
        if ch == '.' {
            continue;
        }
        if pending_space {
            if !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
        }
        for lower in ch.to_lowercase() {
            out.push(lower);
        }
    }
    out
}
