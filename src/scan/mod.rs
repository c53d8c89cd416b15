//! Environment scanning.
//!
//! A scan asks the package manager for the list of installed packages, then
//! describes each package to learn its dependencies, summary and location,
//! and finally measures how much disk space each package occupies.
//!
//! Failing to list packages fails the scan. Failing to describe or measure a
//! single package does not: that package keeps an empty dependency set or an
//! unmeasured size and the failure is counted in the [`ScanReport`].

mod pipeline;
mod session;

pub use pipeline::Scanner;
pub use session::Session;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::collector::CollectError;
use crate::error::ErrorKind;

/// Errors that abort a scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The session has no usable environment root.
    #[error("Invalid virtual environment path: '{}'", .0.display())]
    InvalidPath(PathBuf),

    /// Listing installed packages failed.
    #[error("Failed to get package list: {0}")]
    Collect(#[source] CollectError),

    /// The worker pool could not be started.
    #[error("Failed to start scan workers: {0}")]
    Workers(String),

    /// The scan was cancelled before it completed.
    #[error("Scan cancelled")]
    Cancelled,
}

impl ScanError {
    /// Returns the taxonomy code for this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScanError::InvalidPath(_) => ErrorKind::InvalidPath,
            ScanError::Collect(_) | ScanError::Workers(_) | ScanError::Cancelled => {
                ErrorKind::ScanFailed
            }
        }
    }

    /// Returns the code of the underlying collector failure, if any.
    pub fn cause_kind(&self) -> Option<ErrorKind> {
        match self {
            ScanError::Collect(e) => Some(e.kind()),
            _ => None,
        }
    }
}

/// Result type alias for scan operations.
pub type ScanResult<T> = Result<T, ScanError>;

/// Counters describing how a completed scan went.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Distinct packages in the resulting collection.
    pub packages: usize,
    /// Listing lines that could not be parsed.
    pub skipped_lines: usize,
    /// Packages whose describe call failed.
    pub describe_failures: usize,
    /// Packages whose size could not be measured.
    pub size_failures: usize,
}

impl ScanReport {
    /// Returns true if every package was described and measured.
    pub fn is_complete(&self) -> bool {
        self.describe_failures == 0 && self.size_failures == 0
    }
}

/// Cooperative cancellation flag shared between a scan and its caller.
///
/// The scan checks the flag between per-package steps. Once cancelled the
/// token stays cancelled until [`CancelToken::reset`] is called.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_error_kinds() {
        let err = ScanError::Collect(CollectError::ToolNotFound {
            root: PathBuf::from("/venv"),
        });
        assert_eq!(err.kind(), ErrorKind::ScanFailed);
        assert_eq!(err.cause_kind(), Some(ErrorKind::ToolNotFound));
        assert!(err.to_string().starts_with("Failed to get package list"));

        assert_eq!(ScanError::Cancelled.kind(), ErrorKind::ScanFailed);
        assert_eq!(ScanError::InvalidPath(PathBuf::new()).kind(), ErrorKind::InvalidPath);
    }

    #[test]
    fn test_cancel_token_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());

        clone.cancel();
        assert!(token.is_cancelled());

        token.reset();
        assert!(!clone.is_cancelled());
    }

    #[test]
    fn test_report_complete() {
        let mut report = ScanReport::default();
        assert!(report.is_complete());
        report.size_failures = 1;
        assert!(!report.is_complete());
    }
}
