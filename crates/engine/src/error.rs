use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// The mandatory `Tag` field has no source column mapped.
    TagUnmapped,
    /// A mapped or canonical column is missing from the loaded table.
    MissingColumn { source: String, column: String },
    /// Malformed threshold configuration (non-numeric, negative ceiling).
    InvalidThreshold { field: &'static str, reason: String },
    /// Coil row count outside the selectable range.
    InvalidHwRows { identifier: String, value: i64 },
    /// Backup or write-back failed; pending edits are preserved.
    Persistence { reason: String },
    /// Operation called before the session holds what it needs.
    SessionState(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::TagUnmapped => {
                write!(f, "the 'Tag' field must be mapped to a source column before comparing")
            }
            Self::MissingColumn { source, column } => {
                write!(f, "{source} table: missing column '{column}'")
            }
            Self::InvalidThreshold { field, reason } => {
                write!(f, "invalid threshold '{field}': {reason}")
            }
            Self::InvalidHwRows { identifier, value } => {
                write!(f, "unit '{identifier}': HW rows must be 1-4, got {value}")
            }
            Self::Persistence { reason } => write!(f, "persistence error: {reason}"),
            Self::SessionState(msg) => write!(f, "session error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
