//! Crate-level error type and failure taxonomy.
//!
//! Each layer defines its own error enum next to the code that produces it
//! ([`CollectError`], [`ScanError`], [`StoreError`], [`ExportError`]). This
//! module folds them into a single [`Error`] for the session API and maps
//! every failure onto a stable [`ErrorKind`] code, so a presentation layer can
//! branch on the code or just render the `Display` message.

use std::fmt;

use crate::collector::CollectError;
use crate::export::ExportError;
use crate::scan::ScanError;
use crate::store::StoreError;

/// Stable failure codes shared by every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The environment root is empty or not a directory.
    InvalidPath,
    /// No interpreter was found under the environment root.
    ToolNotFound,
    /// The external tool could not be started or exited non-zero.
    ToolExecutionFailed,
    /// The tool wrote more output than the capture buffer allows.
    CaptureOverflow,
    /// The tool did not finish within the configured timeout.
    ToolTimeout,
    /// The scan as a whole failed.
    ScanFailed,
    /// A line of tool output was not understood and was skipped.
    ParseSkipped,
    /// The store could not be opened or its schema applied.
    InitFailed,
    /// A store statement failed.
    QueryFailed,
    /// A store statement violated a uniqueness or reference constraint.
    ConstraintViolation,
    /// The requested store row does not exist.
    NotFound,
    /// An export destination could not be created or written.
    ExportFailed,
}

impl ErrorKind {
    /// Returns the code as a short identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidPath => "InvalidPath",
            ErrorKind::ToolNotFound => "ToolNotFound",
            ErrorKind::ToolExecutionFailed => "ToolExecutionFailed",
            ErrorKind::CaptureOverflow => "CaptureOverflow",
            ErrorKind::ToolTimeout => "ToolTimeout",
            ErrorKind::ScanFailed => "ScanFailed",
            ErrorKind::ParseSkipped => "ParseSkipped",
            ErrorKind::InitFailed => "InitFailed",
            ErrorKind::QueryFailed => "QueryFailed",
            ErrorKind::ConstraintViolation => "ConstraintViolation",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::ExportFailed => "ExportFailed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any failure surfaced by a [`Session`](crate::scan::Session) operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The external tool failed outside of a scan.
    #[error(transparent)]
    Collect(#[from] CollectError),

    /// Scanning the environment failed.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// A persistence operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Writing an export failed.
    #[error(transparent)]
    Export(#[from] ExportError),
}

impl Error {
    /// Returns the taxonomy code for this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Collect(e) => e.kind(),
            Error::Scan(e) => e.kind(),
            Error::Store(e) => e.kind(),
            Error::Export(e) => e.kind(),
        }
    }
}

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, Error>;
