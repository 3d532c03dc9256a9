//! Exit codes and machine-readable error reports for the binary.

use serde::Serialize;

use crate::actions::TrashError;
use crate::config::ConfigError;
use crate::duplicates::GroupError;
use crate::scanner::ScanError;
use crate::session::SessionError;

/// Process exit codes.
///
/// - 0: Success (something was flagged, grouped or moved)
/// - 1: Error (setup failure, bad arguments, model failed to load)
/// - 2: Nothing found (completed normally, nothing flagged or grouped)
/// - 3: Partial success (completed, but some files failed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Completed and produced results.
    Success = 0,
    /// Aborted with an error.
    Error = 1,
    /// Completed with nothing to report.
    NothingFound = 2,
    /// Completed, some files could not be processed.
    PartialSuccess = 3,
}

impl ExitCode {
    /// Numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Machine-readable code.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "PS000",
            Self::Error => "PS001",
            Self::NothingFound => "PS002",
            Self::PartialSuccess => "PS003",
        }
    }

    /// Exit code for a finished run.
    ///
    /// Failures win over an empty result so they are never hidden.
    #[must_use]
    pub fn for_outcome(found: usize, failed: usize) -> Self {
        if failed > 0 {
            Self::PartialSuccess
        } else if found == 0 {
            Self::NothingFound
        } else {
            Self::Success
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        // All codes fit in a u8.
        Self::from(code as u8)
    }
}

/// Error category shown next to the code in JSON reports.
#[must_use]
pub fn error_kind(err: &anyhow::Error) -> &'static str {
    if let Some(e) = err.downcast_ref::<SessionError>() {
        return match e {
            SessionError::NoFolder | SessionError::NoEmbeddings => "usage",
            SessionError::Scan(_) => "scan",
            SessionError::Group(_) => "model",
            SessionError::Trash(_) => "trash",
        };
    }
    if err.downcast_ref::<ScanError>().is_some() {
        "scan"
    } else if let Some(e) = err.downcast_ref::<GroupError>() {
        match e {
            GroupError::Model(_) => "model",
            GroupError::Scan(_) => "scan",
        }
    } else if err.downcast_ref::<TrashError>().is_some() {
        "trash"
    } else if err.downcast_ref::<ConfigError>().is_some() {
        "config"
    } else {
        "general"
    }
}

/// Error report printed with `--json-errors`.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// Code such as "PS001"
    pub code: String,
    /// Process exit code
    pub exit_code: i32,
    /// Error category
    pub kind: String,
    /// Human-readable message including causes
    pub message: String,
}

impl StructuredError {
    /// Build a report from an error.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            kind: error_kind(err).to_string(),
            message: format!("{err:#}"),
        }
    }
}
