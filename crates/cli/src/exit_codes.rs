//! CLI Exit Code Registry
//!
//! Single source of truth for all CLI exit codes. Exit codes are part
//! of the shell contract — scripts rely on them.
//!
//! | Code | Meaning                                        |
//! |------|------------------------------------------------|
//! | 0    | Success                                        |
//! | 1    | General error (unspecified)                    |
//! | 2    | CLI usage error (bad args, malformed edits)    |
//! | 3    | Invalid job config                             |
//! | 4    | Mapping error (Tag unmapped)                   |
//! | 5    | Comparison found failing or unmatched units    |
//! | 6    | Persistence failure (backup or write-back)     |

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, malformed edits payload.
pub const EXIT_USAGE: u8 = 2;

/// Job config failed to parse or validate.
pub const EXIT_INVALID_CONFIG: u8 = 3;

/// The mandatory `Tag` mapping is missing.
pub const EXIT_MAPPING: u8 = 4;

/// Comparison ran but found `Fail` or `Not Found` units.
/// Like `diff(1)`, a non-zero exit here means "the sources differ."
pub const EXIT_MISMATCH: u8 = 5;

/// Backup or write-back failed; pending edits were not applied,
/// or some edits could not be matched in the target file.
pub const EXIT_PERSISTENCE: u8 = 6;
