//! The reconciliation run: join the two sources on normalized tag,
//! compute per-metric deltas, classify each unit.

use std::collections::HashMap;

use crate::classify;
use crate::config::ThresholdConfig;
use crate::error::EngineError;
use crate::mapping::FieldMapping;
use crate::model::{
    Comparison, ComparisonResult, ComparisonSummary, MetricDelta, MetricOutcome, Table,
    UnitRecord, UnitStatus, HW_ROWS_FIELD, MAGNITUDE_METRICS, RATIO_METRICS, TAG_FIELD,
};
use crate::normalize::normalize_tag;

/// Compare the secondary source against the primary baseline.
///
/// Pure: identical inputs produce identical, order-stable results,
/// ordered by the secondary source's original row order. The secondary
/// source drives the iteration, so the run reports on what the
/// selection tool produced. Units only the primary knows about are not
/// reported; units only the secondary knows about come back `Not Found`.
pub fn compare(
    primary: &Table,
    secondary: &Table,
    mapping: &FieldMapping,
    thresholds: &ThresholdConfig,
) -> Result<Comparison, EngineError> {
    thresholds.validate()?;
    let tag_column = mapping.tag_source().ok_or(EngineError::TagUnmapped)?;
    // Every mapped column must exist; a typo would otherwise read as
    // absent data and classify everything Pass.
    for (_, source_column) in mapping.iter() {
        if !secondary.columns.iter().any(|c| c == source_column) {
            return Err(EngineError::MissingColumn {
                source: "secondary".to_string(),
                column: source_column.to_string(),
            });
        }
    }

    // First occurrence wins when the primary repeats a tag.
    let mut primary_index: HashMap<String, &UnitRecord> = HashMap::new();
    for row in &primary.rows {
        let Some(raw) = row.display(TAG_FIELD) else { continue };
        if raw.trim().is_empty() {
            continue;
        }
        primary_index.entry(normalize_tag(&raw)).or_insert(row);
    }

    let mut results = Vec::with_capacity(secondary.rows.len());
    for row in &secondary.rows {
        let Some(raw_tag) = row.display(tag_column) else { continue };
        let raw_tag = raw_tag.trim().to_string();
        if raw_tag.is_empty() {
            continue;
        }
        let normalized = normalize_tag(&raw_tag);

        let result = match primary_index.get(&normalized) {
            Some(primary_row) => compare_unit(raw_tag, normalized, primary_row, row, mapping, thresholds),
            None => not_found(raw_tag, normalized, row, mapping),
        };
        results.push(result);
    }

    let summary = summarize(&results);
    Ok(Comparison { summary, results })
}

fn compare_unit(
    unit_tag: String,
    normalized_tag: String,
    primary: &UnitRecord,
    secondary: &UnitRecord,
    mapping: &FieldMapping,
    thresholds: &ThresholdConfig,
) -> ComparisonResult {
    let mut metrics = Vec::new();

    for name in RATIO_METRICS {
        // An unmapped metric suppresses that comparison for every unit.
        let Some(source_column) = mapping.source_for(name) else { continue };
        let primary_value = primary.number(name);
        let secondary_value = secondary.number(source_column);
        let (deviation, outcome) = classify::ratio_outcome(primary_value, secondary_value, thresholds);
        metrics.push(MetricDelta {
            metric: name.to_string(),
            primary: primary_value,
            secondary: secondary_value,
            deviation_pct: deviation,
            outcome,
        });
    }

    for name in MAGNITUDE_METRICS {
        let Some(source_column) = mapping.source_for(name) else { continue };
        let Some(ceiling) = thresholds.ceiling_for(name) else { continue };
        let secondary_value = secondary.number(source_column);
        let outcome = classify::magnitude_outcome(secondary_value, ceiling);
        metrics.push(MetricDelta {
            metric: name.to_string(),
            primary: None,
            secondary: secondary_value,
            deviation_pct: None,
            outcome,
        });
    }

    let status = classify::overall_status(&metrics);
    let status_details = classify::detail_line(&metrics);
    let hw_rows = primary.number(HW_ROWS_FIELD).map(|v| v as i64);

    ComparisonResult {
        unit_tag,
        normalized_tag,
        status,
        status_details,
        metrics,
        hw_rows,
    }
}

fn not_found(
    unit_tag: String,
    normalized_tag: String,
    secondary: &UnitRecord,
    mapping: &FieldMapping,
) -> ComparisonResult {
    // Carry the secondary's own values for display; no deviation is
    // computed and nothing primary-sourced is available.
    let mut metrics = Vec::new();
    for name in RATIO_METRICS.into_iter().chain(MAGNITUDE_METRICS) {
        let Some(source_column) = mapping.source_for(name) else { continue };
        metrics.push(MetricDelta {
            metric: name.to_string(),
            primary: None,
            secondary: secondary.number(source_column),
            deviation_pct: None,
            outcome: MetricOutcome::Insufficient,
        });
    }

    ComparisonResult {
        unit_tag,
        normalized_tag,
        status: UnitStatus::NotFound,
        status_details: "No matching unit in primary source".to_string(),
        metrics,
        hw_rows: None,
    }
}

fn summarize(results: &[ComparisonResult]) -> ComparisonSummary {
    let mut summary = ComparisonSummary {
        total: results.len(),
        ..ComparisonSummary::default()
    };
    for r in results {
        match r.status {
            UnitStatus::Pass => summary.pass += 1,
            UnitStatus::Warning => summary.warning += 1,
            UnitStatus::Fail => summary.fail += 1,
            UnitStatus::NotFound => summary.not_found += 1,
        }
    }
    summary
}
