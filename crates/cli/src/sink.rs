//! CSV write-back collaborator for coil-row edits.
//!
//! Backup-before-overwrite: a timestamped copy of the schedule file is
//! taken before any row is rewritten. Row matching uses the same tag
//! normalization as the join, so an edit staged as `v-1-1` updates the
//! row tagged `V-1-01`.

use std::path::PathBuf;

use vavrecon_engine::edits::{CommitFailure, PersistOutcome};
use vavrecon_engine::{normalize_tag, EditSink, PendingEdit};

const TAG_COLUMN: &str = "Tag";
const HW_ROWS_COLUMN: &str = "HWRows";

pub struct CsvWriteBack {
    path: PathBuf,
}

impl CsvWriteBack {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl EditSink for CsvWriteBack {
    fn backup(&mut self) -> Result<String, String> {
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let backup_path = format!("{}.backup_hw_rows_{stamp}", self.path.display());
        std::fs::copy(&self.path, &backup_path)
            .map_err(|e| format!("cannot back up {}: {e}", self.path.display()))?;
        Ok(backup_path)
    }

    fn persist(&mut self, edits: &[PendingEdit]) -> Result<PersistOutcome, String> {
        let data = std::fs::read_to_string(&self.path)
            .map_err(|e| format!("cannot read {}: {e}", self.path.display()))?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data.as_bytes());

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| e.to_string())?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let column = |name: &str| -> Result<usize, String> {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| format!("{}: missing column '{name}'", self.path.display()))
        };
        let tag_idx = column(TAG_COLUMN)?;
        let hw_idx = column(HW_ROWS_COLUMN)?;

        let mut rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| e.to_string())?;
            let mut row: Vec<String> =
                record.iter().map(|cell| cell.to_string()).collect();
            row.resize(headers.len(), String::new());
            rows.push(row);
        }

        let mut committed = Vec::new();
        let mut failures = Vec::new();

        for edit in edits {
            let key = normalize_tag(&edit.identifier);
            let mut hit = false;
            for row in &mut rows {
                if normalize_tag(&row[tag_idx]) == key {
                    row[hw_idx] = edit.hw_rows.to_string();
                    hit = true;
                }
            }
            if hit {
                committed.push(edit.identifier.clone());
            } else {
                failures.push(CommitFailure {
                    identifier: edit.identifier.clone(),
                    reason: format!("no record found for tag: {}", edit.identifier),
                });
            }
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&headers).map_err(|e| e.to_string())?;
        for row in &rows {
            writer.write_record(row).map_err(|e| e.to_string())?;
        }
        let out = writer.into_inner().map_err(|e| e.to_string())?;
        std::fs::write(&self.path, out)
            .map_err(|e| format!("cannot write {}: {e}", self.path.display()))?;

        Ok(PersistOutcome { committed, failures })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_schedule(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("schedule.csv");
        std::fs::write(
            &path,
            "Tag,MBH,HWRows\nV-1-01,100,2\nV-1-02,80,1\n",
        )
        .unwrap();
        path
    }

    fn edit(identifier: &str, hw_rows: i64) -> PendingEdit {
        PendingEdit { identifier: identifier.into(), hw_rows }
    }

    #[test]
    fn backup_then_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_schedule(&dir);
        let mut sink = CsvWriteBack::new(path.clone());

        let backup = sink.backup().unwrap();
        assert!(std::path::Path::new(&backup).exists());

        let outcome = sink.persist(&[edit("v-1-1", 3)]).unwrap();
        assert_eq!(outcome.committed, vec!["v-1-1"]);
        assert!(outcome.failures.is_empty());

        let rewritten = std::fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("V-1-01,100,3"));
        assert!(rewritten.contains("V-1-02,80,1"));

        // The backup still holds the original value.
        let backed_up = std::fs::read_to_string(&backup).unwrap();
        assert!(backed_up.contains("V-1-01,100,2"));
    }

    #[test]
    fn unknown_tag_reports_failure_without_touching_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_schedule(&dir);
        let mut sink = CsvWriteBack::new(path.clone());

        let outcome = sink.persist(&[edit("Z-9-99", 2)]).unwrap();
        assert!(outcome.committed.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].reason.contains("Z-9-99"));

        let rewritten = std::fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("V-1-01,100,2"));
    }

    #[test]
    fn backup_fails_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = CsvWriteBack::new(dir.path().join("missing.csv"));
        assert!(sink.backup().is_err());
    }

    #[test]
    fn missing_hw_rows_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schedule.csv");
        std::fs::write(&path, "Tag,MBH\nV-1-01,100\n").unwrap();
        let mut sink = CsvWriteBack::new(path);
        let err = sink.persist(&[edit("V-1-01", 2)]).unwrap_err();
        assert!(err.contains("HWRows"));
    }
}
