//! `vavrecon-engine` — schedule-vs-selection reconciliation for HVAC
//! terminal units.
//!
//! Pure engine crate: receives pre-loaded tables, returns classified
//! results. No CLI or transport dependencies.

pub mod classify;
pub mod config;
pub mod edits;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod model;
pub mod normalize;
pub mod session;
pub mod table;

pub use config::{JobConfig, ThresholdConfig};
pub use edits::{CommitReport, EditBatch, EditSink, PendingEdit, PersistOutcome};
pub use engine::compare;
pub use error::EngineError;
pub use mapping::{FieldMapping, MappingSuggestion};
pub use model::{Comparison, ComparisonResult, Table, UnitStatus};
pub use normalize::normalize_tag;
pub use session::Session;
pub use table::load_csv_table;
