//! CSV table ingestion at the engine boundary.
//!
//! Proprietary schedule and selection formats are materialized into CSV
//! by external tooling before they reach the engine; this module only
//! turns that CSV into the typed row model.

use std::collections::BTreeMap;

use crate::error::EngineError;
use crate::model::{FieldValue, Table, UnitRecord};

/// Load a headed CSV document into a [`Table`]. Blank cells and the
/// `N/A`/`NaN` sentinels schedule exports use become [`FieldValue::Absent`];
/// numeric-looking cells become [`FieldValue::Number`].
pub fn load_csv_table(data: &str) -> Result<Table, EngineError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| EngineError::Io(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| EngineError::Io(e.to_string()))?;
        let mut fields = BTreeMap::new();
        for (i, column) in columns.iter().enumerate() {
            fields.insert(column.clone(), parse_cell(record.get(i).unwrap_or("")));
        }
        rows.push(UnitRecord { fields });
    }

    Ok(Table { columns, rows })
}

fn parse_cell(raw: &str) -> FieldValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return FieldValue::Absent;
    }
    match trimmed.to_ascii_lowercase().as_str() {
        "n/a" | "nan" => return FieldValue::Absent,
        _ => {}
    }
    if let Ok(n) = trimmed.parse::<f64>() {
        if n.is_finite() {
            return FieldValue::Number(n);
        }
    }
    FieldValue::Text(trimmed.to_string())
}
