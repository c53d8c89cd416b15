//! Invocation of the environment's package manager.
//!
//! The collector resolves the environment's Python interpreter, runs
//! `python -m pip ...` as a child process and hands back its standard output
//! as text. It never parses the output. Arguments are passed as a vector, so
//! package names never go through a shell.
//!
//! Output is captured into a bounded buffer and every invocation is subject
//! to a timeout. Overflowing the buffer, exiting non-zero and timing out are
//! all reported as failures; partial output is never returned.

mod command;

pub use command::ToolCommand;

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::ErrorKind;

/// Errors that can occur while running the package manager.
#[derive(Debug, thiserror::Error)]
pub enum CollectError {
    /// The environment root is empty or not a directory.
    #[error("Invalid environment path: '{}'", .0.display())]
    InvalidPath(PathBuf),

    /// None of the interpreter candidates exist under the environment root.
    #[error("Python executable not found in virtual environment '{}'", .root.display())]
    ToolNotFound { root: PathBuf },

    /// The child process could not be spawned or awaited.
    #[error("Failed to execute package manager: {0}")]
    Spawn(#[from] std::io::Error),

    /// The child process exited unsuccessfully.
    #[error("Package manager failed with {}", exit_description(.code))]
    ExecutionFailed { code: Option<i32> },

    /// The child process wrote more than the capture limit.
    #[error("Package manager output exceeded {limit} bytes")]
    CaptureOverflow { limit: usize },

    /// The child process was killed after running past the timeout.
    #[error("Package manager did not finish within {}s", .timeout.as_secs_f32())]
    Timeout { timeout: Duration },
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl CollectError {
    /// Returns the taxonomy code for this failure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CollectError::InvalidPath(_) => ErrorKind::InvalidPath,
            CollectError::ToolNotFound { .. } => ErrorKind::ToolNotFound,
            CollectError::Spawn(_) | CollectError::ExecutionFailed { .. } => {
                ErrorKind::ToolExecutionFailed
            }
            CollectError::CaptureOverflow { .. } => ErrorKind::CaptureOverflow,
            CollectError::Timeout { .. } => ErrorKind::ToolTimeout,
        }
    }
}

/// Result type alias for collector operations.
pub type CollectResult<T> = Result<T, CollectError>;

/// The two questions the scan asks the package manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOperation {
    /// List every installed package with its exact version.
    Freeze,
    /// Describe one installed package.
    Show(String),
}

impl ToolOperation {
    /// Arguments passed to the interpreter for this operation.
    pub fn args(&self) -> Vec<&str> {
        match self {
            ToolOperation::Freeze => vec!["-m", "pip", "freeze"],
            ToolOperation::Show(name) => vec!["-m", "pip", "show", name.as_str()],
        }
    }
}

/// Something that can answer [`ToolOperation`]s with raw text.
///
/// [`PipCollector`] is the real implementation; the scan pipeline only
/// depends on this trait.
pub trait PackageTool {
    /// Runs `op` and returns its complete standard output.
    fn run(&self, op: &ToolOperation) -> CollectResult<String>;
}

/// Finds the first existing, executable interpreter under `root`.
pub fn resolve_interpreter(root: &Path, candidates: &[String]) -> CollectResult<PathBuf> {
    if root.as_os_str().is_empty() || !root.is_dir() {
        return Err(CollectError::InvalidPath(root.to_path_buf()));
    }

    for candidate in candidates {
        let path = root.join(candidate.trim_start_matches('/'));
        if is_executable(&path) {
            debug!(interpreter = %path.display(), "resolved interpreter");
            return Ok(path);
        }
        debug!(candidate = %path.display(), "interpreter candidate not usable");
    }

    Err(CollectError::ToolNotFound {
        root: root.to_path_buf(),
    })
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// Runs `pip` through an environment's own interpreter.
#[derive(Debug, Clone)]
pub struct PipCollector {
    interpreter: PathBuf,
    timeout: Duration,
    capture_limit: usize,
}

impl PipCollector {
    /// Resolves the interpreter under `root` using the configured candidates.
    pub fn new(root: &Path, config: &Config) -> CollectResult<Self> {
        let interpreter = resolve_interpreter(root, &config.interpreter_candidates)?;
        Ok(Self {
            interpreter,
            timeout: config.timeout(),
            capture_limit: config.capture_limit,
        })
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }
}

impl PackageTool for PipCollector {
    fn run(&self, op: &ToolOperation) -> CollectResult<String> {
        ToolCommand::new(&self.interpreter)
            .args(op.args())
            .timeout(self.timeout)
            .capture_limit(self.capture_limit)
            .run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn candidates() -> Vec<String> {
        Config::default().interpreter_candidates
    }

    #[test]
    fn test_operation_args() {
        assert_eq!(ToolOperation::Freeze.args(), vec!["-m", "pip", "freeze"]);
        assert_eq!(
            ToolOperation::Show("flask; rm -rf /".to_string()).args(),
            vec!["-m", "pip", "show", "flask; rm -rf /"]
        );
    }

    #[test]
    fn test_resolve_invalid_path() {
        let err = resolve_interpreter(Path::new(""), &candidates()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath);

        let err = resolve_interpreter(Path::new("/definitely/not/here"), &candidates()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPath);
    }

    #[test]
    fn test_resolve_tool_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_interpreter(dir.path(), &candidates()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ToolNotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_skips_non_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("bin")).unwrap();

        let python = dir.path().join("bin/python");
        fs::write(&python, "").unwrap();
        fs::set_permissions(&python, fs::Permissions::from_mode(0o644)).unwrap();

        let python3 = dir.path().join("bin/python3");
        fs::write(&python3, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&python3, fs::Permissions::from_mode(0o755)).unwrap();

        let resolved = resolve_interpreter(dir.path(), &candidates()).unwrap();
        assert_eq!(resolved, python3);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            CollectError::ExecutionFailed { code: Some(1) }.kind(),
            ErrorKind::ToolExecutionFailed
        );
        assert_eq!(
            CollectError::CaptureOverflow { limit: 10 }.kind(),
            ErrorKind::CaptureOverflow
        );
        assert_eq!(
            CollectError::Timeout {
                timeout: Duration::from_secs(1)
            }
            .kind(),
            ErrorKind::ToolTimeout
        );
    }

    #[test]
    fn test_execution_failed_message() {
        let err = CollectError::ExecutionFailed { code: Some(2) };
        assert_eq!(err.to_string(), "Package manager failed with exit code 2");
    }
}
