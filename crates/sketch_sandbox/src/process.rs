use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tempfile::NamedTempFile;
use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::channel::{decode_report, HostCommand, SandboxReport};
use crate::error::SandboxError;

const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(3);

/// Launch configuration for the external sandbox runner.
///
/// The runner receives the composed document's path as its final argument,
/// reads control tokens from stdin, and writes fault reports to stdout as
/// JSON lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxConfig {
    pub runner_command: String,
    pub runner_args: Vec<String>,
    pub shutdown_timeout: Duration,
}

impl SandboxConfig {
    #[must_use]
    pub fn new(runner_command: impl Into<String>) -> Self {
        Self {
            runner_command: runner_command.into(),
            runner_args: Vec::new(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.runner_args = args;
        self
    }

    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

/// One live runner process hosting one composed document.
///
/// There is no in-place reload. Changing the running code means shutting
/// this instance down and launching a fresh one with a newly composed
/// document.
#[derive(Debug)]
pub struct ProcessSandbox {
    child: Child,
    stdin: ChildStdin,
    reader: Option<JoinHandle<()>>,
    shutdown_timeout: Duration,
    // Holds the document on disk for the lifetime of the runner.
    _document: NamedTempFile,
}

impl ProcessSandbox {
    /// Writes the document to a temp file and launches the runner over it.
    ///
    /// `on_report` is invoked from a background thread for every decoded
    /// fault line until the runner's stdout closes.
    pub fn launch<F>(
        config: &SandboxConfig,
        document: &str,
        mut on_report: F,
    ) -> Result<Self, SandboxError>
    where
        F: FnMut(SandboxReport) + Send + 'static,
    {
        let mut document_file =
            NamedTempFile::with_suffix(".html").map_err(SandboxError::DocumentWrite)?;
        document_file
            .write_all(document.as_bytes())
            .map_err(SandboxError::DocumentWrite)?;
        document_file.flush().map_err(SandboxError::DocumentWrite)?;

        let mut child = Command::new(&config.runner_command)
            .args(&config.runner_args)
            .arg(document_file.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SandboxError::Launch {
                command: config.runner_command.clone(),
                source,
            })?;

        let stdin = child.stdin.take().ok_or(SandboxError::MissingStdio)?;
        let stdout = child.stdout.take().ok_or(SandboxError::MissingStdio)?;

        let reader = thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(error) => {
                        debug!(%error, "sandbox stdout closed");
                        break;
                    }
                };

                match decode_report(&line) {
                    Some(report) => on_report(report),
                    None => debug!(line, "ignoring non-report sandbox output"),
                }
            }
        });

        Ok(Self {
            child,
            stdin,
            reader: Some(reader),
            shutdown_timeout: config.shutdown_timeout,
            _document: document_file,
        })
    }

    /// Sends a fire-and-forget control command to the runner.
    pub fn send(&mut self, command: HostCommand) -> Result<(), SandboxError> {
        writeln!(self.stdin, "{}", command.token()).map_err(SandboxError::Control)?;
        self.stdin.flush().map_err(SandboxError::Control)
    }

    /// Tears the runner down, killing it if it outlives the grace period.
    pub fn shutdown(mut self) -> Result<(), SandboxError> {
        // Closing stdin is the runner's signal to exit.
        drop(self.stdin);

        match self.child.wait_timeout(self.shutdown_timeout) {
            Ok(Some(status)) => {
                debug!(%status, "sandbox runner exited");
            }
            Ok(None) => {
                warn!("sandbox runner did not exit in time, killing it");
                let _ = self.child.kill();
                self.child.wait().map_err(SandboxError::Wait)?;
            }
            Err(error) => {
                let _ = self.child.kill();
                return Err(SandboxError::Wait(error));
            }
        }

        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }

        Ok(())
    }
}
