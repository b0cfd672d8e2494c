use std::collections::BTreeMap;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Canonical schedule fields
// ---------------------------------------------------------------------------

/// Unit identifier, the join key between sources.
pub const TAG_FIELD: &str = "Tag";

/// Correctable attribute: hot-water coil rows, held by the primary source.
pub const HW_ROWS_FIELD: &str = "HWRows";

/// Metrics compared by signed percent deviation against the primary value.
pub const RATIO_METRICS: [&str; 2] = ["MBH", "LAT"];

/// Metrics checked against an absolute ceiling on the secondary value.
pub const MAGNITUDE_METRICS: [&str; 2] = ["WPD", "APD"];

/// Target fields offered for mapping onto secondary-source columns,
/// `Tag` first. `Tag` is the only mapping required downstream.
pub const TARGET_FIELDS: [&str; 5] = ["Tag", "MBH", "LAT", "WPD", "APD"];

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// One cell from either source: present-typed or explicitly absent.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Text(String),
    Absent,
}

impl FieldValue {
    pub fn number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Render as a string, the way a tag cell would read. Numeric cells
    /// with no fraction render without a decimal point so a tag stored
    /// as `101` still matches `"101"`.
    pub fn display(&self) -> Option<String> {
        match self {
            Self::Number(n) if n.fract() == 0.0 => Some(format!("{}", *n as i64)),
            Self::Number(n) => Some(format!("{n}")),
            Self::Text(s) => Some(s.clone()),
            Self::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

/// One row from either source. No identity beyond row position until
/// a tag column is resolved and normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitRecord {
    pub fields: BTreeMap<String, FieldValue>,
}

impl UnitRecord {
    pub fn number(&self, column: &str) -> Option<f64> {
        self.fields.get(column).and_then(FieldValue::number)
    }

    pub fn display(&self, column: &str) -> Option<String> {
        self.fields.get(column).and_then(FieldValue::display)
    }
}

/// A materialized table from an external parser: ordered columns plus rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<UnitRecord>,
}

// ---------------------------------------------------------------------------
// Comparison output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Pass,
    Warning,
    Fail,
    NotFound,
}

impl std::fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "Pass"),
            Self::Warning => write!(f, "Warning"),
            Self::Fail => write!(f, "Fail"),
            Self::NotFound => write!(f, "Not Found"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricOutcome {
    /// Within the acceptance band (boundary inclusive).
    Pass,
    /// Outside the margins but inside the configured warning band.
    Marginal,
    /// Ratio deviation below the lower margin.
    TooLow,
    /// Ratio deviation above the upper margin.
    TooHigh,
    /// Magnitude value above its ceiling.
    ExceedsCeiling,
    /// Primary value present but zero; deviation cannot be computed.
    Undefined,
    /// A value is missing; the metric contributes nothing.
    Insufficient,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricDelta {
    pub metric: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deviation_pct: Option<f64>,
    pub outcome: MetricOutcome,
}

/// One unit's reconciliation verdict. Created fresh on every run and
/// never mutated; a new run replaces the prior result set wholesale.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonResult {
    /// Raw tag as it appears in the secondary source.
    pub unit_tag: String,
    pub normalized_tag: String,
    pub status: UnitStatus,
    pub status_details: String,
    pub metrics: Vec<MetricDelta>,
    /// Committed coil row count carried through from the primary source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hw_rows: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonSummary {
    pub total: usize,
    pub pass: usize,
    pub warning: usize,
    pub fail: usize,
    pub not_found: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Comparison {
    pub summary: ComparisonSummary,
    pub results: Vec<ComparisonResult>,
}
