//! Backup script execution.
//!
//! A job's script lines run as one `sh -c` invocation so later lines see
//! variables set by earlier ones. Script content is trusted configuration.
//! stdout and stderr are forwarded to a [`ScriptOutputSink`] line by line
//! while the process runs.

use std::fmt;
use std::process::Stdio;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::error::ScriptFailure;
use crate::id::RunIdentity;

/// Shell used to run scripts.
pub const DEFAULT_SHELL: &str = "sh";

/// Which stream a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStream {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
}

impl OutputStream {
    /// Stream name as used in log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stdout => "stdout",
            Self::Stderr => "stderr",
        }
    }
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receives script output, one sanitized line at a time.
///
/// Shared by concurrent runs.
pub trait ScriptOutputSink: Send + Sync + fmt::Debug {
    /// Handle one line of output from `run`.
    fn write_line(&self, run: &RunIdentity, stream: OutputStream, line: &str);
}

/// Emits script output as `tracing` events in the current run span.
///
/// stdout lines are logged at INFO and stderr lines at ERROR.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ScriptOutputSink for TracingSink {
    fn write_line(&self, _run: &RunIdentity, stream: OutputStream, line: &str) {
        match stream {
            OutputStream::Stdout => {
                tracing::info!(target: "backuper::script", stream = %stream, "SCRIPT> {line}")
            }
            OutputStream::Stderr => {
                tracing::error!(target: "backuper::script", stream = %stream, "SCRIPT> {line}")
            }
        }
    }
}

/// Make a captured line safe to log as a single record.
pub fn sanitize_line(raw: &str) -> String {
    let trimmed = raw.trim_end_matches('\n');
    let trimmed = trimmed.strip_suffix('\r').unwrap_or(trimmed);
    trimmed.replace('\n', "\\n")
}

/// Runs backup scripts and streams their output.
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    shell: String,
    sink: Arc<dyn ScriptOutputSink>,
}

impl ScriptExecutor {
    /// Create an executor that writes output to `sink`.
    pub fn new(sink: Arc<dyn ScriptOutputSink>) -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            sink,
        }
    }

    /// Join script lines into the text passed to the shell.
    pub fn join_script(lines: &[String]) -> String {
        lines.join("\n")
    }

    /// Run `lines` as one script and wait for it to exit.
    ///
    /// Returns once the process has exited and both output streams are drained.
    pub async fn execute(&self, run: &RunIdentity, lines: &[String]) -> Result<(), ScriptFailure> {
        let script = Self::join_script(lines);

        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(&script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(ScriptFailure::Spawn)?;

        tracing::debug!(shell = %self.shell, lines = lines.len(), "Backup script started");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (status, (), ()) = tokio::join!(
            child.wait(),
            self.forward(run, OutputStream::Stdout, stdout),
            self.forward(run, OutputStream::Stderr, stderr),
        );
        let status = status.map_err(ScriptFailure::Wait)?;

        if status.success() {
            tracing::debug!("Backup script exited successfully");
            return Ok(());
        }

        match status.code() {
            Some(code) => Err(ScriptFailure::Exit { code }),
            None => Err(ScriptFailure::Signal),
        }
    }

    /// Copy one output stream to the sink until EOF.
    async fn forward<R>(&self, run: &RunIdentity, stream: OutputStream, reader: Option<R>)
    where
        R: AsyncRead + Unpin,
    {
        let Some(reader) = reader else {
            return;
        };

        let mut segments = BufReader::new(reader).split(b'\n');
        loop {
            match segments.next_segment().await {
                Ok(Some(bytes)) => {
                    let line = sanitize_line(&String::from_utf8_lossy(&bytes));
                    self.sink.write_line(run, stream, &line);
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(stream = %stream, error = %e, "Failed to read script output");
                    break;
                }
            }
        }
    }
}
