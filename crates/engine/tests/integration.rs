//! End-to-end: load CSV tables, suggest and confirm a mapping, run the
//! comparison, stage coil-row corrections, commit through a collaborator.

use vavrecon_engine::edits::{CommitFailure, PersistOutcome};
use vavrecon_engine::model::UnitStatus;
use vavrecon_engine::{
    load_csv_table, EditSink, EngineError, PendingEdit, Session, ThresholdConfig,
};

const SCHEDULE_CSV: &str = "\
Tag,MBH,LAT,HWRows
V-1-01,100,95,2
V-1-02,80,90,1
V-1-03,60,85,2
V-2-01,120,92,3
";

const SELECTION_CSV: &str = "\
Unit_No,HWMBHCalc,HWLATCalc,HWPDCalc,HWAPDCalc
v-1-1,112,95,3.2,0.20
V-1-2,56,90,2.1,0.18
V-1-03,60,84,5.5,0.22
v-2-1,120,93,4.0,0.30
B-9-01,50,80,1.0,0.10
";

struct RecordingSink {
    backup_ok: bool,
    missing: Vec<String>,
}

impl EditSink for RecordingSink {
    fn backup(&mut self) -> Result<String, String> {
        if self.backup_ok {
            Ok("schedule.csv.backup_hw_rows_20260823_093000".into())
        } else {
            Err("cannot create backup".into())
        }
    }

    fn persist(&mut self, edits: &[PendingEdit]) -> Result<PersistOutcome, String> {
        let mut committed = Vec::new();
        let mut failures = Vec::new();
        for edit in edits {
            if self.missing.contains(&edit.identifier) {
                failures.push(CommitFailure {
                    identifier: edit.identifier.clone(),
                    reason: format!("no record found for tag: {}", edit.identifier),
                });
            } else {
                committed.push(edit.identifier.clone());
            }
        }
        Ok(PersistOutcome { committed, failures })
    }
}

fn session_with_confirmed_mapping() -> Session {
    let mut session = Session::new();
    session.load_primary(load_csv_table(SCHEDULE_CSV).unwrap());
    session.load_secondary(load_csv_table(SELECTION_CSV).unwrap());

    let suggestion = session.suggest_mapping().unwrap();
    // Tag resolves through the Unit_No alias; the Calc columns do not
    // name-match and are confirmed by hand, as a user would.
    assert_eq!(suggestion.suggested.tag_source(), Some("Unit_No"));
    let mut mapping = suggestion.suggested;
    mapping.set("MBH", "HWMBHCalc");
    mapping.set("LAT", "HWLATCalc");
    mapping.set("WPD", "HWPDCalc");
    mapping.set("APD", "HWAPDCalc");
    session.confirm_mapping(mapping);
    session
}

#[test]
fn full_reconciliation_flow() {
    let mut session = session_with_confirmed_mapping();
    let comparison = session.compare(&ThresholdConfig::default()).unwrap();

    assert_eq!(comparison.summary.total, 5);
    assert_eq!(comparison.summary.pass, 1);
    assert_eq!(comparison.summary.not_found, 1);
    assert_eq!(comparison.summary.fail, 3);

    // v-1-1: +12% MBH, everything else in range.
    let r = &comparison.results[0];
    assert_eq!(r.normalized_tag, "v-1-01");
    assert_eq!(r.status, UnitStatus::Pass);
    assert_eq!(r.hw_rows, Some(2));

    // V-1-2: 56 vs 80 = -30% MBH.
    let r = &comparison.results[1];
    assert_eq!(r.status, UnitStatus::Fail);
    assert!(r.status_details.contains("MBH -30.0% (too low)"));

    // V-1-03: WPD 5.5 over the 5.0 ceiling.
    let r = &comparison.results[2];
    assert_eq!(r.status, UnitStatus::Fail);
    assert!(r.status_details.contains("WPD 5.50"));

    // v-2-1: APD 0.30 over the 0.25 ceiling.
    let r = &comparison.results[3];
    assert_eq!(r.status, UnitStatus::Fail);
    assert!(r.status_details.contains("APD 0.30"));

    // B-9-01 only exists in the selection output.
    let r = &comparison.results[4];
    assert_eq!(r.status, UnitStatus::NotFound);
    assert!(r.metrics.iter().all(|m| m.deviation_pct.is_none()));
}

#[test]
fn warning_band_splits_marginal_from_fail() {
    let mut session = session_with_confirmed_mapping();
    let thresholds = ThresholdConfig {
        warning_band: Some(2.5),
        ..ThresholdConfig::default()
    };
    let comparison = session.compare(&thresholds).unwrap();
    // -30% is inside the widened [-37.5, 62.5] band.
    let r = &comparison.results[1];
    assert_eq!(r.status, UnitStatus::Warning);
    assert!(r.status_details.contains("(marginal)"));
    // Ceiling checks are unaffected by the warning band.
    assert_eq!(comparison.results[2].status, UnitStatus::Fail);
}

#[test]
fn tag_must_be_mapped_before_compare() {
    let mut session = Session::new();
    session.load_primary(load_csv_table(SCHEDULE_CSV).unwrap());
    session.load_secondary(load_csv_table(SELECTION_CSV).unwrap());
    let err = session.compare(&ThresholdConfig::default()).unwrap_err();
    assert!(matches!(err, EngineError::TagUnmapped));
    assert!(session.last_comparison().is_none());
}

#[test]
fn edit_flow_commit_and_partial_failure() {
    let mut session = session_with_confirmed_mapping();
    session.compare(&ThresholdConfig::default()).unwrap();

    // Bump coil rows on two units; one will be rejected by the store.
    session.stage_edit("v-1-1", 3).unwrap();
    session.stage_edit("V-1-2", 2).unwrap();
    assert_eq!(session.pending_edits().len(), 2);

    let mut sink = RecordingSink {
        backup_ok: true,
        missing: vec!["V-1-2".into()],
    };
    let report = session.commit_edits(&mut sink).unwrap();
    assert_eq!(report.committed_count, 1);
    assert_eq!(report.failures.len(), 1);
    assert!(report.backup_file.contains("backup_hw_rows"));

    // The failed edit is still pending; the committed one is baseline now.
    let pending = session.pending_edits();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].identifier, "V-1-2");
    session.stage_edit("v-1-1", 3).unwrap();
    assert_eq!(session.pending_edits().len(), 1, "3 is the committed value now");
}

#[test]
fn backup_failure_preserves_all_pending_edits() {
    let mut session = session_with_confirmed_mapping();
    session.compare(&ThresholdConfig::default()).unwrap();
    session.stage_edit("v-1-1", 4).unwrap();
    session.stage_edit("V-1-03", 1).unwrap();
    let before = session.pending_edits();

    let mut sink = RecordingSink { backup_ok: false, missing: vec![] };
    let err = session.commit_edits(&mut sink).unwrap_err();
    assert!(matches!(err, EngineError::Persistence { .. }));
    assert_eq!(session.pending_edits(), before);
}

#[test]
fn rerun_replaces_results_wholesale() {
    let mut session = session_with_confirmed_mapping();
    let first_total = session.compare(&ThresholdConfig::default()).unwrap().summary.total;

    // Loosen the ceilings: previously failing units now pass.
    let loose = ThresholdConfig {
        wpd_ceiling: 10.0,
        apd_ceiling: 1.0,
        lower_margin_pct: 50.0,
        ..ThresholdConfig::default()
    };
    let comparison = session.compare(&loose).unwrap();
    assert_eq!(comparison.summary.total, first_total);
    assert_eq!(comparison.summary.fail, 0);
    assert_eq!(comparison.summary.pass, 4);
    assert_eq!(comparison.summary.not_found, 1);
}
