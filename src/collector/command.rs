//! Bounded, time-limited child process execution.

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

use super::{CollectError, CollectResult};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_CAPTURE_LIMIT: usize = 1024 * 1024;

/// Builder for a single external command whose stdout is captured.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
/// use venvscope::collector::ToolCommand;
///
/// let out = ToolCommand::new("echo")
///     .arg("hello")
///     .timeout(Duration::from_secs(2))
///     .run()
///     .unwrap();
/// assert_eq!(out.trim(), "hello");
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: OsString,
    args: Vec<OsString>,
    timeout: Duration,
    capture_limit: usize,
}

/// Captured stdout plus whether the limit was exceeded.
struct Capture {
    bytes: Vec<u8>,
    overflowed: bool,
}

impl ToolCommand {
    /// Create a new command for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().as_os_str().to_os_string(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            capture_limit: DEFAULT_CAPTURE_LIMIT,
        }
    }

    /// Append a single argument.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<OsString>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Maximum wall-clock time before the child is killed.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Maximum number of stdout bytes accepted.
    pub fn capture_limit(mut self, limit: usize) -> Self {
        self.capture_limit = limit;
        self
    }

    /// Runs the command to completion and returns its stdout as text.
    ///
    /// Stdout is drained on a helper thread so a chatty child never blocks
    /// on a full pipe while we wait for it. Bytes past the limit are read
    /// and discarded, and the run is reported as an overflow.
    pub fn run(&self) -> CollectResult<String> {
        debug!(
            program = ?self.program,
            args = ?self.args,
            timeout_secs = self.timeout.as_secs_f32(),
            "running tool"
        );

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null());
        // Own process group, so a timeout also reaches anything the tool spawned.
        #[cfg(unix)]
        command.process_group(0);
        let mut child = command.spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("child stdout was not captured"))?;
        let limit = self.capture_limit;
        let reader = thread::spawn(move || read_bounded(stdout, limit));

        let status = match child.wait_timeout(self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                warn!(program = ?self.program, "tool timed out, killing it");
                kill(&mut child);
                // The reader finishes on its own once the pipe closes.
                drop(reader);
                return Err(CollectError::Timeout {
                    timeout: self.timeout,
                });
            }
            Err(e) => {
                kill(&mut child);
                drop(reader);
                return Err(e.into());
            }
        };

        let capture = reader
            .join()
            .map_err(|_| io::Error::other("stdout reader thread panicked"))??;

        if capture.overflowed {
            return Err(CollectError::CaptureOverflow { limit });
        }
        if !status.success() {
            return Err(CollectError::ExecutionFailed {
                code: status.code(),
            });
        }

        Ok(String::from_utf8_lossy(&capture.bytes).into_owned())
    }
}

fn read_bounded(stdout: ChildStdout, limit: usize) -> io::Result<Capture> {
    let mut bytes = Vec::new();
    let mut bounded = stdout.take(limit as u64 + 1);
    bounded.read_to_end(&mut bytes)?;

    let overflowed = bytes.len() > limit;
    if overflowed {
        bytes.truncate(limit);
        io::copy(&mut bounded.into_inner(), &mut io::sink())?;
    }

    Ok(Capture { bytes, overflowed })
}

/// Kills the child's whole process group, then reaps the child.
#[cfg(unix)]
fn kill(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let group = Pid::from_raw(child.id() as i32);
    if let Err(e) = killpg(group, Signal::SIGKILL) {
        debug!(error = %e, "failed to kill tool process group");
        if let Err(e) = child.kill() {
            debug!(error = %e, "failed to kill tool process");
        }
    }
    let _ = child.wait();
}

#[cfg(not(unix))]
fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!(error = %e, "failed to kill tool process");
    }
    let _ = child.wait();
}
