//! Session engine for AI-assisted sketch authoring.
//!
//! The engine tracks an append-only history of code snapshots, runs the
//! current code in a process-isolated sandbox with a fault-report channel,
//! and serializes authoring actions (manual edits, version loads, AI turns,
//! reset) through a single turn-taking session state machine.
//!
//! ## Provider bootstrap
//!
//! Provider selection is explicit:
//!
//! - `SKETCH_STUDIO_PROVIDER=mock` for deterministic local runs and tests
//! - `SKETCH_STUDIO_PROVIDER=gemini-api` for Gemini transport; requires
//!   `GEMINI_API_KEY`, honors `SKETCH_STUDIO_MODEL`
//!
//! ## System instructions
//!
//! Every provider turn carries system instructions. Set
//! `SKETCH_STUDIO_SYSTEM_INSTRUCTIONS` to override the built-in default.

pub mod config;
pub mod controller;
pub mod export;
pub mod fences;
pub mod providers;
pub mod render;
pub mod session;
pub mod turn;

pub use config::{StudioConfig, DEFAULT_SKETCH, DEFAULT_SYSTEM_INSTRUCTIONS};
pub use controller::{ConfirmPolicy, SessionController};
pub use export::{export_draft, export_filename};
pub use fences::extract_fenced_code;
pub use render::{DefaultMarkdownRenderer, MarkdownRenderer};
pub use session::{Activity, Session, SessionHost};
pub use turn::{Turn, TurnId, TurnRole};
