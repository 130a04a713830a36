//! Turn-taking session state machine.
//!
//! `Session` owns the chat turns, the snapshot store, the editable draft and
//! the activity state. It is pure with respect to the outside world: every
//! side effect (starting a provider turn, rebuilding the sandbox, sending
//! control tokens, asking for confirmation) goes through the `SessionHost`
//! seam, so tests drive it with a host spy.

use sketch_provider::{ChatMessage, RunId, StreamPart};
use sketch_sandbox::HostCommand;
use snapshot_store::{CodeOrigin, SnapshotStore, VersionId};
use tracing::debug;

use crate::config::StudioConfig;
use crate::fences::extract_fenced_code;
use crate::render::MarkdownRenderer;
use crate::turn::{Turn, TurnId, TurnRole};

/// Current chat activity. `Thinking` and `Coding` are presentation substates
/// of one in-flight assistant turn, not independent activities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Idle,
    Generating,
    Thinking,
    Coding,
}

/// Side-effect seam between the session and its runtime.
pub trait SessionHost {
    fn start_turn(
        &mut self,
        messages: Vec<ChatMessage>,
        instructions: String,
    ) -> Result<RunId, String>;
    fn rebuild_sandbox(&mut self, code: &str);
    fn send_control(&mut self, command: HostCommand);
    fn confirm(&mut self, prompt: &str) -> bool;
    fn reset_assistant_context(&mut self);
    fn request_render(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct InFlightTurn {
    run_id: RunId,
    turn_id: Option<TurnId>,
    fix: bool,
}

const CONFIRM_DISCARD_DRAFT: &str = "Discard unsaved sketch changes?";
const CONFIRM_RESET: &str = "Clear the session and restore the default sketch?";
const MANUAL_SNAPSHOT_LABEL: &str = "Saved current sketch";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    turns: Vec<Turn>,
    store: SnapshotStore,
    active_version: Option<VersionId>,
    draft_code: String,
    dirty: bool,
    activity: Activity,
    sandbox_running: bool,
    last_reported_fault: Option<String>,
    in_flight: Option<InFlightTurn>,
    next_turn_id: TurnId,
    config: StudioConfig,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(StudioConfig::default())
    }
}

impl Session {
    #[must_use]
    pub fn new(config: StudioConfig) -> Self {
        Self {
            turns: Vec::new(),
            store: SnapshotStore::new(),
            active_version: None,
            // The default sketch has no backing snapshot yet.
            draft_code: config.default_sketch.clone(),
            dirty: true,
            activity: Activity::Idle,
            sandbox_running: false,
            last_reported_fault: None,
            in_flight: None,
            next_turn_id: 1,
            config,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn turn(&self, id: TurnId) -> Option<&Turn> {
        self.turns.iter().find(|turn| turn.id == id)
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn active_version(&self) -> Option<VersionId> {
        self.active_version
    }

    pub fn draft_code(&self) -> &str {
        &self.draft_code
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn sandbox_running(&self) -> bool {
        self.sandbox_running
    }

    pub fn last_reported_fault(&self) -> Option<&str> {
        self.last_reported_fault.as_deref()
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn config(&self) -> &StudioConfig {
        &self.config
    }

    /// Sends a user-authored message, snapshotting a dirty draft first so the
    /// exchange has a recoverable code anchor.
    pub fn on_send_message(&mut self, text: &str, host: &mut dyn SessionHost) {
        let prompt = text.trim();
        if prompt.is_empty() || self.activity != Activity::Idle {
            host.request_render();
            return;
        }

        if self.dirty {
            self.snapshot_draft();
        }

        self.push_turn(TurnRole::User, prompt);
        self.start_assistant_turn(host, false);
        host.request_render();
    }

    /// Replaces the draft with an edited text. Raw keystrokes never touch the
    /// snapshot store; they only move the dirty flag.
    pub fn on_edit_draft(&mut self, code: &str) {
        if self.activity != Activity::Idle {
            return;
        }

        self.draft_code = code.to_string();
        self.recompute_dirty();
    }

    /// Re-activates a recorded version. Loading the active version is a
    /// no-op; loading over a dirty draft asks for confirmation first.
    pub fn on_load_version(&mut self, id: VersionId, host: &mut dyn SessionHost) {
        if self.activity != Activity::Idle || self.active_version == Some(id) {
            return;
        }

        let code = match self.store.get(id) {
            Ok(version) => version.code.clone(),
            Err(error) => {
                debug!(%error, "ignoring load of unknown version");
                return;
            }
        };

        if self.dirty && !host.confirm(CONFIRM_DISCARD_DRAFT) {
            return;
        }

        self.draft_code = code;
        self.active_version = Some(id);
        self.dirty = false;
        self.rebuild_sandbox(host);
        host.request_render();
    }

    /// Rebuilds the sandbox from the current draft without recording anything.
    pub fn on_reload(&mut self, host: &mut dyn SessionHost) {
        self.rebuild_sandbox(host);
        host.request_render();
    }

    /// Clears the whole session back to the configured default sketch.
    pub fn on_reset(&mut self, host: &mut dyn SessionHost) {
        if self.activity != Activity::Idle {
            return;
        }

        if !host.confirm(CONFIRM_RESET) {
            return;
        }

        self.turns.clear();
        self.store.clear();
        self.active_version = None;
        self.draft_code = self.config.default_sketch.clone();
        self.dirty = true;
        self.last_reported_fault = None;
        self.in_flight = None;
        host.reset_assistant_context();
        self.rebuild_sandbox(host);
        host.request_render();
    }

    pub fn on_pause(&mut self, host: &mut dyn SessionHost) {
        host.send_control(HostCommand::Pause);
        self.sandbox_running = false;
        host.request_render();
    }

    pub fn on_resume(&mut self, host: &mut dyn SessionHost) {
        host.send_control(HostCommand::Resume);
        self.sandbox_running = true;
        host.request_render();
    }

    /// Handles a fault reported by the sandbox. Identical consecutive fault
    /// texts collapse into one turn; a restarted sandbox re-sending the same
    /// fault therefore cannot flood the chat.
    pub fn on_sandbox_fault(&mut self, message: &str, host: &mut dyn SessionHost) {
        if self.last_reported_fault.as_deref() == Some(message) {
            return;
        }

        self.last_reported_fault = Some(message.to_string());
        self.push_turn(TurnRole::SystemFault, message);
        host.request_render();
    }

    /// Re-invokes the assistant with a reported fault and the current code as
    /// context. This is the fault-report action, so no manual snapshot is
    /// synthesized even for a dirty draft.
    pub fn on_request_fix(&mut self, fault_turn: TurnId, host: &mut dyn SessionHost) {
        if self.activity != Activity::Idle {
            return;
        }

        let Some(fault) = self
            .turn(fault_turn)
            .filter(|turn| turn.role == TurnRole::SystemFault)
            .map(|turn| turn.display_text.clone())
        else {
            return;
        };

        let fence = &self.config.fence_language;
        let prompt = format!(
            "The running sketch threw this error:\n\n{fault}\n\nCurrent code:\n\n```{fence}\n{code}\n```\n\nPlease reply with a corrected full sketch.",
            code = self.draft_code,
        );

        self.push_turn(TurnRole::User, prompt);
        self.start_assistant_turn(host, true);
        host.request_render();
    }

    pub fn on_run_started(&mut self, run_id: RunId) {
        if !self.is_in_flight(run_id) {
            return;
        }

        self.ensure_assistant_turn(run_id);
    }

    pub fn on_run_part(&mut self, run_id: RunId, part: &StreamPart) {
        if !self.is_in_flight(run_id) {
            return;
        }

        let turn_id = self.ensure_assistant_turn(run_id);
        let Some(turn) = self.turns.iter_mut().find(|turn| turn.id == turn_id) else {
            return;
        };

        match part {
            StreamPart::Thought(delta) => {
                self.activity = Activity::Thinking;
                turn.thinking_text.push_str(delta);
            }
            StreamPart::Text(delta) => {
                self.activity = Activity::Coding;
                turn.display_text.push_str(delta);
            }
        }
    }

    pub fn on_run_finished(&mut self, run_id: RunId, host: &mut dyn SessionHost) {
        let Some(in_flight) = self.in_flight.filter(|active| active.run_id == run_id) else {
            return;
        };

        self.in_flight = None;
        self.activity = Activity::Idle;

        let Some(turn_id) = in_flight.turn_id else {
            host.request_render();
            return;
        };

        let extracted = self.turn(turn_id).and_then(|turn| {
            extract_fenced_code(&turn.display_text, &self.config.fence_language)
        });

        if let Some(turn) = self.turns.iter_mut().find(|turn| turn.id == turn_id) {
            turn.streaming = false;
        }

        // A response without extractable code keeps the prior version active.
        if let Some(code) = extracted {
            let origin = if in_flight.fix {
                CodeOrigin::AiFix
            } else {
                CodeOrigin::AiResponse
            };
            let version = self.store.record(origin, code.clone());
            if let Some(turn) = self.turns.iter_mut().find(|turn| turn.id == turn_id) {
                turn.linked_version = Some(version);
            }

            self.active_version = Some(version);
            self.draft_code = code;
            self.dirty = false;
            self.rebuild_sandbox(host);
        }

        host.request_render();
    }

    pub fn on_run_failed(&mut self, run_id: RunId, error: &str, host: &mut dyn SessionHost) {
        let Some(in_flight) = self.in_flight.filter(|active| active.run_id == run_id) else {
            return;
        };

        self.in_flight = None;
        self.activity = Activity::Idle;

        if let Some(turn_id) = in_flight.turn_id {
            if let Some(turn) = self.turns.iter_mut().find(|turn| turn.id == turn_id) {
                turn.streaming = false;
            }
        }

        self.push_turn(TurnRole::Error, error);
        host.request_render();
    }

    /// Re-renders markdown for turns whose text changed since the last pass:
    /// the in-flight streaming turn plus any turn not yet rendered.
    pub fn rerender(&mut self, renderer: &dyn MarkdownRenderer) {
        for turn in &mut self.turns {
            if turn.role == TurnRole::ManualSnapshot {
                continue;
            }

            let display_stale =
                turn.streaming || (turn.rendered_html.is_empty() && !turn.display_text.is_empty());
            if display_stale {
                turn.rendered_html = renderer.render(&turn.display_text);
            }

            let thinking_stale = turn.streaming
                || (turn.rendered_thinking_html.is_empty() && !turn.thinking_text.is_empty());
            if thinking_stale {
                turn.rendered_thinking_html = renderer.render(&turn.thinking_text);
            }
        }
    }

    /// Model-facing chat history: user prompts and completed assistant text.
    pub fn chat_messages(&self) -> Vec<ChatMessage> {
        self.turns
            .iter()
            .filter_map(|turn| match turn.role {
                TurnRole::User => Some(ChatMessage::user(&turn.display_text)),
                TurnRole::Assistant if !turn.display_text.is_empty() => {
                    Some(ChatMessage::model(&turn.display_text))
                }
                _ => None,
            })
            .collect()
    }

    fn snapshot_draft(&mut self) {
        let version = self
            .store
            .record(CodeOrigin::UserEdit, self.draft_code.clone());
        let id = self.allocate_turn_id();
        self.turns.push(
            Turn::new(id, TurnRole::ManualSnapshot, MANUAL_SNAPSHOT_LABEL)
                .with_linked_version(version),
        );
        self.active_version = Some(version);
        self.dirty = false;
    }

    fn start_assistant_turn(&mut self, host: &mut dyn SessionHost, fix: bool) {
        let messages = self.chat_messages();
        match host.start_turn(messages, self.config.system_instructions.clone()) {
            Ok(run_id) => {
                self.activity = Activity::Generating;
                self.in_flight = Some(InFlightTurn {
                    run_id,
                    turn_id: None,
                    fix,
                });
            }
            Err(error) => {
                self.push_turn(
                    TurnRole::Error,
                    format!("Failed to start assistant turn: {error}"),
                );
            }
        }
    }

    fn ensure_assistant_turn(&mut self, run_id: RunId) -> TurnId {
        if let Some(turn_id) = self
            .in_flight
            .filter(|active| active.run_id == run_id)
            .and_then(|active| active.turn_id)
        {
            return turn_id;
        }

        let id = self.allocate_turn_id();
        self.turns.push(Turn::streaming_assistant(id));
        if let Some(in_flight) = self.in_flight.as_mut() {
            in_flight.turn_id = Some(id);
        }
        id
    }

    fn rebuild_sandbox(&mut self, host: &mut dyn SessionHost) {
        host.rebuild_sandbox(&self.draft_code);
        self.sandbox_running = true;
    }

    fn recompute_dirty(&mut self) {
        self.dirty = match self.active_version {
            Some(id) => self
                .store
                .get(id)
                .map(|version| version.code != self.draft_code)
                .unwrap_or(true),
            None => true,
        };
    }

    fn push_turn(&mut self, role: TurnRole, text: impl Into<String>) -> TurnId {
        let id = self.allocate_turn_id();
        self.turns.push(Turn::new(id, role, text));
        id
    }

    fn is_in_flight(&self, run_id: RunId) -> bool {
        self.in_flight
            .is_some_and(|active| active.run_id == run_id)
    }

    fn allocate_turn_id(&mut self) -> TurnId {
        let id = self.next_turn_id;
        self.next_turn_id += 1;
        id
    }
}
