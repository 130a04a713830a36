use std::io;

use thiserror::Error;

/// Failure modes of the sandbox runner lifecycle.
#[derive(Debug, Error)]
pub enum SandboxError {
    #[error("failed to write sandbox document: {0}")]
    DocumentWrite(#[source] io::Error),

    #[error("failed to launch sandbox runner '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("sandbox runner did not expose the expected stdio pipes")]
    MissingStdio,

    #[error("failed to send control token to sandbox runner: {0}")]
    Control(#[source] io::Error),

    #[error("failed waiting for sandbox runner to exit: {0}")]
    Wait(#[source] io::Error),
}
