//! Subprocess execution with streamed output.
//!
//! [`ProcessRunner`] is the seam between argument construction and the
//! operating system. [`SystemRunner`] spawns the real program; tests
//! substitute a runner that replays canned output.

use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{DbtdefsError, Result};

/// A program invocation, without a shell in between.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandSpec {
    /// Executable name or path.
    pub program: String,

    /// Arguments, passed verbatim.
    pub args: Vec<String>,

    /// Working directory.
    pub cwd: Option<PathBuf>,

    /// Environment variables (merged with system env).
    pub env: HashMap<String, String>,
}

impl CommandSpec {
    /// The invocation as a single display string.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|part| {
                if part.is_empty() || part.contains(char::is_whitespace) {
                    format!("'{}'", part)
                } else {
                    part.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Output line from command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

impl OutputLine {
    /// The line text regardless of stream.
    pub fn text(&self) -> &str {
        match self {
            OutputLine::Stdout(s) | OutputLine::Stderr(s) => s,
        }
    }
}

/// How a finished process exited.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Create a result from an exit code.
    pub fn from_code(exit_code: Option<i32>, duration: Duration) -> Self {
        Self {
            exit_code,
            duration,
            success: exit_code == Some(0),
        }
    }
}

/// Runs a program and streams its output lines.
pub trait ProcessRunner: Send + Sync {
    /// Run `spec` to completion, calling `on_line` for each line in arrival
    /// order. Fails only if the program could not be started or waited on.
    fn run_streaming(
        &self,
        spec: &CommandSpec,
        on_line: &mut dyn FnMut(OutputLine),
    ) -> Result<CommandResult>;
}

/// Spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run_streaming(
        &self,
        spec: &CommandSpec,
        on_line: &mut dyn FnMut(OutputLine),
    ) -> Result<CommandResult> {
        let start = Instant::now();

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args);

        if let Some(cwd) = &spec.cwd {
            cmd.current_dir(cwd);
        }

        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        tracing::debug!("Spawning: {}", spec.display());

        let spawn_failed = |e: std::io::Error| {
            tracing::debug!("Spawn failed: {}", e);
            DbtdefsError::CommandFailed {
                command: spec.display(),
                code: None,
            }
        };

        let mut child = cmd.spawn().map_err(spawn_failed)?;

        let stdout = child.stdout.take().ok_or_else(|| {
            DbtdefsError::Other(anyhow::anyhow!("child stdout was not captured"))
        })?;
        let stderr = child.stderr.take().ok_or_else(|| {
            DbtdefsError::Other(anyhow::anyhow!("child stderr was not captured"))
        })?;

        let (tx, rx) = mpsc::channel();
        let tx_stdout = tx.clone();
        let tx_stderr = tx;

        let stdout_handle =
            thread::spawn(move || forward_lines(stdout, OutputLine::Stdout, &tx_stdout));
        let stderr_handle =
            thread::spawn(move || forward_lines(stderr, OutputLine::Stderr, &tx_stderr));

        // Ends once both reader threads drop their senders
        for line in rx {
            on_line(line);
        }

        let _ = stdout_handle.join();
        let _ = stderr_handle.join();

        let status = child.wait().map_err(spawn_failed)?;

        Ok(CommandResult::from_code(status.code(), start.elapsed()))
    }
}

/// Send each line of `source` until EOF.
///
/// Bytes that are not UTF-8 are replaced rather than ending the stream, so
/// the pipe keeps draining and later lines still arrive.
fn forward_lines<R: Read>(
    source: R,
    wrap: fn(String) -> OutputLine,
    tx: &mpsc::Sender<OutputLine>,
) {
    let mut reader = BufReader::new(source);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => {
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                    if buf.last() == Some(&b'\r') {
                        buf.pop();
                    }
                }
                let line = String::from_utf8_lossy(&buf).into_owned();
                if tx.send(wrap(line)).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => {
                tracing::warn!("Stopped reading dbt output: {}", e);
                break;
            }
        }
    }
}
