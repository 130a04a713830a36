use serde::{Deserialize, Serialize};

/// Stdin token that pauses the running sketch.
pub const PAUSE_TOKEN: &str = "pause";
/// Stdin token that resumes a paused sketch.
pub const RESUME_TOKEN: &str = "resume";

/// Fire-and-forget control command sent to the runner over stdin.
///
/// Delivery is best effort. The host never waits for an acknowledgement and
/// a command sent to a runner that is still booting is silently dropped by
/// the runner side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCommand {
    Pause,
    Resume,
}

impl HostCommand {
    #[must_use]
    pub fn token(&self) -> &'static str {
        match self {
            Self::Pause => PAUSE_TOKEN,
            Self::Resume => RESUME_TOKEN,
        }
    }
}

/// One runtime fault reported by the runner over stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxReport {
    pub message: String,
}

impl SandboxReport {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Decodes one stdout line into a fault report.
///
/// The runner shares stdout with whatever the sketch itself prints, so
/// anything that is not a JSON object with a string `message` is ignored
/// rather than treated as a protocol error.
#[must_use]
pub fn decode_report(line: &str) -> Option<SandboxReport> {
    let line = line.trim();
    if line.is_empty() || !line.starts_with('{') {
        return None;
    }

    let report: SandboxReport = serde_json::from_str(line).ok()?;
    if report.message.trim().is_empty() {
        return None;
    }

    Some(report)
}
