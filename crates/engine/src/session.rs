//! One reconciliation session: the two loaded tables, the confirmed
//! mapping, the latest comparison and the edit working set, with an
//! explicit lifecycle. Single-threaded by design; callers serialize
//! access.

use crate::config::ThresholdConfig;
use crate::edits::{CommitReport, EditBatch, EditSink, PendingEdit};
use crate::engine;
use crate::error::EngineError;
use crate::mapping::{self, FieldMapping, MappingSuggestion};
use crate::model::{Comparison, Table, TARGET_FIELDS};

#[derive(Debug, Default)]
pub struct Session {
    primary: Option<Table>,
    secondary: Option<Table>,
    mapping: FieldMapping,
    comparison: Option<Comparison>,
    edits: EditBatch,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the schedule baseline. Invalidates any prior comparison.
    pub fn load_primary(&mut self, table: Table) {
        self.primary = Some(table);
        self.comparison = None;
    }

    /// Load the selection-tool output. Invalidates any prior comparison.
    pub fn load_secondary(&mut self, table: Table) {
        self.secondary = Some(table);
        self.comparison = None;
    }

    pub fn has_sources(&self) -> bool {
        self.primary.is_some() && self.secondary.is_some()
    }

    /// Propose a mapping from the secondary source's column names.
    pub fn suggest_mapping(&self) -> Result<MappingSuggestion, EngineError> {
        let secondary = self
            .secondary
            .as_ref()
            .ok_or_else(|| EngineError::SessionState("secondary source not loaded".into()))?;
        Ok(MappingSuggestion {
            target_fields: TARGET_FIELDS.iter().map(|f| f.to_string()).collect(),
            source_fields: secondary.columns.clone(),
            suggested: mapping::suggest_default(&secondary.columns),
        })
    }

    pub fn confirm_mapping(&mut self, mapping: FieldMapping) {
        self.mapping = mapping;
        self.comparison = None;
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    /// Run a comparison and replace the prior result set wholesale.
    /// On error the prior result set is left untouched.
    pub fn compare(&mut self, thresholds: &ThresholdConfig) -> Result<&Comparison, EngineError> {
        let (Some(primary), Some(secondary)) = (&self.primary, &self.secondary) else {
            return Err(EngineError::SessionState(
                "both sources must be loaded before comparing".into(),
            ));
        };
        let comparison = engine::compare(primary, secondary, &self.mapping, thresholds)?;
        self.edits.seed_baseline(&comparison.results);
        Ok(self.comparison.insert(comparison))
    }

    pub fn last_comparison(&self) -> Option<&Comparison> {
        self.comparison.as_ref()
    }

    pub fn stage_edit(&mut self, identifier: &str, hw_rows: i64) -> Result<(), EngineError> {
        self.edits.stage(identifier, hw_rows)
    }

    pub fn unstage_edit(&mut self, identifier: &str) {
        self.edits.unstage(identifier)
    }

    pub fn pending_edits(&self) -> Vec<PendingEdit> {
        self.edits.pending_edits()
    }

    pub fn commit_edits(&mut self, sink: &mut dyn EditSink) -> Result<CommitReport, EngineError> {
        self.edits.commit(sink)
    }

    /// Clear everything; the session is as if freshly created.
    pub fn reset(&mut self) {
        *self = Session::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UnitStatus;
    use crate::table::load_csv_table;

    fn loaded_session() -> Session {
        let mut session = Session::new();
        session.load_primary(
            load_csv_table("Tag,MBH,LAT,HWRows\nA-1-01,100,95,2\n").unwrap(),
        );
        session.load_secondary(
            load_csv_table("Unit_No,HWMBHCalc\na-1-1,112\n").unwrap(),
        );
        let mut mapping = FieldMapping::new();
        mapping.set("Tag", "Unit_No");
        mapping.set("MBH", "HWMBHCalc");
        session.confirm_mapping(mapping);
        session
    }

    #[test]
    fn compare_requires_both_sources() {
        let mut session = Session::new();
        session.load_primary(load_csv_table("Tag,MBH\nA-1-01,100\n").unwrap());
        let err = session.compare(&ThresholdConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::SessionState(_)));
    }

    #[test]
    fn suggest_requires_secondary() {
        let session = Session::new();
        assert!(session.suggest_mapping().is_err());
    }

    #[test]
    fn suggestion_covers_loaded_columns() {
        let session = loaded_session();
        let suggestion = session.suggest_mapping().unwrap();
        assert_eq!(suggestion.suggested.tag_source(), Some("Unit_No"));
        assert_eq!(suggestion.source_fields, vec!["Unit_No", "HWMBHCalc"]);
    }

    #[test]
    fn compare_seeds_edit_baseline() {
        let mut session = loaded_session();
        session.compare(&ThresholdConfig::default()).unwrap();
        // Staging the committed value is a no-op, proving the baseline
        // came from the comparison.
        session.stage_edit("a-1-1", 2).unwrap();
        assert!(session.pending_edits().is_empty());
        session.stage_edit("a-1-1", 3).unwrap();
        assert_eq!(session.pending_edits().len(), 1);
    }

    #[test]
    fn failed_compare_keeps_prior_results() {
        let mut session = loaded_session();
        session.compare(&ThresholdConfig::default()).unwrap();
        assert!(session.last_comparison().is_some());

        let bad = ThresholdConfig {
            lower_margin_pct: -1.0,
            ..ThresholdConfig::default()
        };
        assert!(session.compare(&bad).is_err());
        let prior = session.last_comparison().unwrap();
        assert_eq!(prior.results[0].status, UnitStatus::Pass);
    }

    #[test]
    fn reset_clears_state() {
        let mut session = loaded_session();
        session.compare(&ThresholdConfig::default()).unwrap();
        session.stage_edit("a-1-1", 3).unwrap();
        session.reset();
        assert!(!session.has_sources());
        assert!(session.last_comparison().is_none());
        assert!(session.pending_edits().is_empty());
        assert!(session.mapping().is_empty());
    }
}
