//! Minimal provider-agnostic contract for executing a single assistant turn.
//!
//! This crate intentionally defines only the shared turn lifecycle types. It
//! excludes provider transport details, protocol payloads, and session
//! orchestration concerns. Cancellation is deliberately absent: an in-flight
//! turn either completes or fails, and the host decides what to do next.

use std::fmt;

/// Identifier for one provider turn.
pub type RunId = u64;

/// Error returned while constructing/configuring a provider before any turn starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInitError {
    message: String,
}

impl ProviderInitError {
    /// Creates a new provider initialization error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ProviderInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ProviderInitError {}

impl From<String> for ProviderInitError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ProviderInitError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Role of one model-facing chat history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Model,
}

/// Provider-neutral model-facing chat history item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// Input required to start a provider turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub run_id: RunId,
    pub messages: Vec<ChatMessage>,
    pub instructions: String,
}

/// One streamed fragment of an in-flight turn.
///
/// Hosts reconstruct the full thinking trace and response text by
/// concatenating parts of each kind in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamPart {
    /// Model reasoning text, streamed into the turn's thinking trace.
    Thought(String),
    /// Response/code text, streamed into the turn's display text.
    Text(String),
}

impl StreamPart {
    /// Returns the carried text regardless of part kind.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Thought(text) | Self::Text(text) => text,
        }
    }
}

/// Provider-emitted lifecycle event for a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEvent {
    Started { run_id: RunId },
    Part { run_id: RunId, part: StreamPart },
    Finished { run_id: RunId },
    Failed { run_id: RunId, error: String },
}

impl RunEvent {
    /// Returns the run identifier associated with this event.
    #[must_use]
    pub fn run_id(&self) -> RunId {
        match self {
            Self::Started { run_id }
            | Self::Part { run_id, .. }
            | Self::Finished { run_id }
            | Self::Failed { run_id, .. } => *run_id,
        }
    }

    /// Returns true when this event terminates the turn lifecycle.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished { .. } | Self::Failed { .. })
    }
}

/// Immutable metadata describing a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider_id: String,
    pub model_id: String,
}

/// Provider interface for executing one turn request.
pub trait SketchProvider: Send + Sync + 'static {
    /// Returns provider/model identity metadata.
    fn profile(&self) -> ProviderProfile;

    /// Executes a turn request and emits lifecycle events in provider order.
    ///
    /// A conforming provider emits `Started` first and exactly one terminal
    /// event last; the callback is serial from the caller's perspective.
    fn run(&self, req: RunRequest, emit: &mut dyn FnMut(RunEvent)) -> Result<(), String>;
}
