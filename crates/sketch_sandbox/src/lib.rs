//! Isolated execution surface for untrusted sketch code.
//!
//! The sandbox composes a self-contained HTML document around the current
//! code version and hands it to an external runner process. Rebuilding the
//! document is the only way to change the running code; the host never
//! patches a live instance. The runner reports runtime faults back over
//! stdout as JSON lines and accepts pause/resume tokens over stdin.

pub mod bootstrap;
pub mod channel;
pub mod error;
pub mod process;

pub use bootstrap::{compose_document, BootstrapOptions};
pub use channel::{decode_report, HostCommand, SandboxReport, PAUSE_TOKEN, RESUME_TOKEN};
pub use error::SandboxError;
pub use process::{ProcessSandbox, SandboxConfig};
