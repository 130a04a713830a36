//! Runtime wiring between the session, the provider, and the sandbox.
//!
//! Provider turns run on a worker thread; their events, along with sandbox
//! fault reports, are buffered in a pending queue and applied to the session
//! on the host thread by `flush_pending_events`. The session itself is the
//! single writer of all authoring state.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use sketch_provider::{ChatMessage, RunEvent, RunId, RunRequest, SketchProvider};
use sketch_sandbox::{
    compose_document, BootstrapOptions, HostCommand, ProcessSandbox, SandboxConfig,
};
use snapshot_store::VersionId;
use tracing::{debug, warn};

use crate::render::MarkdownRenderer;
use crate::session::{Session, SessionHost};
use crate::turn::TurnId;

/// Injected answer policy for confirmation-guarded destructive actions.
pub enum ConfirmPolicy {
    AcceptAll,
    DeclineAll,
    Ask(Box<dyn Fn(&str) -> bool + Send + Sync>),
}

impl ConfirmPolicy {
    fn confirm(&self, prompt: &str) -> bool {
        match self {
            Self::AcceptAll => true,
            Self::DeclineAll => false,
            Self::Ask(ask) => ask(prompt),
        }
    }
}

enum PendingEvent {
    Run(RunEvent),
    Fault(String),
}

struct ActiveRun {
    run_id: RunId,
    join_handle: Option<JoinHandle<()>>,
}

pub struct SessionController {
    session: Mutex<Session>,
    provider: Arc<dyn SketchProvider>,
    renderer: Arc<dyn MarkdownRenderer>,
    sandbox_config: SandboxConfig,
    bootstrap: BootstrapOptions,
    sandbox: Mutex<Option<ProcessSandbox>>,
    pending_events: Arc<Mutex<VecDeque<PendingEvent>>>,
    next_run_id: AtomicU64,
    active_run: Mutex<Option<ActiveRun>>,
    confirm: ConfirmPolicy,
    render_requests: AtomicU64,
}

impl SessionController {
    pub fn new(
        session: Session,
        provider: Arc<dyn SketchProvider>,
        renderer: Arc<dyn MarkdownRenderer>,
        sandbox_config: SandboxConfig,
        bootstrap: BootstrapOptions,
        confirm: ConfirmPolicy,
    ) -> Arc<Self> {
        Arc::new(Self {
            session: Mutex::new(session),
            provider,
            renderer,
            sandbox_config,
            bootstrap,
            sandbox: Mutex::new(None),
            pending_events: Arc::new(Mutex::new(VecDeque::new())),
            next_run_id: AtomicU64::new(1),
            active_run: Mutex::new(None),
            confirm,
            render_requests: AtomicU64::new(0),
        })
    }

    pub fn send_message(self: &Arc<Self>, text: &str) {
        self.with_host(|session, host| session.on_send_message(text, host));
    }

    pub fn edit_draft(self: &Arc<Self>, code: &str) {
        lock_unpoisoned(&self.session).on_edit_draft(code);
    }

    pub fn load_version(self: &Arc<Self>, id: VersionId) {
        self.with_host(|session, host| session.on_load_version(id, host));
    }

    pub fn reload(self: &Arc<Self>) {
        self.with_host(|session, host| session.on_reload(host));
    }

    pub fn reset(self: &Arc<Self>) {
        self.with_host(|session, host| session.on_reset(host));
    }

    pub fn pause(self: &Arc<Self>) {
        self.with_host(|session, host| session.on_pause(host));
    }

    pub fn resume(self: &Arc<Self>) {
        self.with_host(|session, host| session.on_resume(host));
    }

    pub fn request_fix(self: &Arc<Self>, fault_turn: TurnId) {
        self.with_host(|session, host| session.on_request_fix(fault_turn, host));
    }

    /// Read access to the session for embedders and tests.
    pub fn with_session<R>(&self, read: impl FnOnce(&Session) -> R) -> R {
        read(&lock_unpoisoned(&self.session))
    }

    /// Number of render requests the session has issued so far. Embedders
    /// repaint when this moves.
    pub fn render_requests(&self) -> u64 {
        self.render_requests.load(Ordering::SeqCst)
    }

    /// Applies every queued provider event and sandbox fault to the session,
    /// re-rendering streamed markdown afterwards. Call from the host thread.
    pub fn flush_pending_events(self: &Arc<Self>) -> usize {
        let mut applied = 0usize;

        loop {
            let event = {
                let mut pending_events = lock_unpoisoned(&self.pending_events);
                pending_events.pop_front()
            };

            match event {
                Some(event) => {
                    self.apply_event(event);
                    applied += 1;
                }
                None => break,
            }
        }

        applied
    }

    /// Tears down the live sandbox, if any.
    pub fn shutdown(&self) {
        let sandbox = lock_unpoisoned(&self.sandbox).take();
        if let Some(sandbox) = sandbox {
            if let Err(error) = sandbox.shutdown() {
                warn!(%error, "sandbox shutdown failed");
            }
        }
    }

    fn with_host(self: &Arc<Self>, act: impl FnOnce(&mut Session, &mut dyn SessionHost)) {
        let mut host = Arc::clone(self);
        let mut session = lock_unpoisoned(&self.session);
        act(&mut session, &mut host);
        session.rerender(self.renderer.as_ref());
    }

    fn apply_event(self: &Arc<Self>, event: PendingEvent) {
        let terminal_run = match &event {
            PendingEvent::Run(run_event) if run_event.is_terminal() => Some(run_event.run_id()),
            _ => None,
        };

        {
            let mut host = Arc::clone(self);
            let mut session = lock_unpoisoned(&self.session);
            match event {
                PendingEvent::Run(RunEvent::Started { run_id }) => session.on_run_started(run_id),
                PendingEvent::Run(RunEvent::Part { run_id, part }) => {
                    session.on_run_part(run_id, &part);
                }
                PendingEvent::Run(RunEvent::Finished { run_id }) => {
                    session.on_run_finished(run_id, &mut host);
                }
                PendingEvent::Run(RunEvent::Failed { run_id, error }) => {
                    session.on_run_failed(run_id, &error, &mut host);
                }
                PendingEvent::Fault(message) => session.on_sandbox_fault(&message, &mut host),
            }

            session.rerender(self.renderer.as_ref());
        }

        if let Some(run_id) = terminal_run {
            self.clear_active_run_if_matching(run_id);
        }
    }

    fn start_run_internal(
        self: &Arc<Self>,
        messages: Vec<ChatMessage>,
        instructions: String,
    ) -> Result<RunId, String> {
        let mut active_run = lock_unpoisoned(&self.active_run);
        if active_run.is_some() {
            return Err("Turn already active".to_string());
        }

        let run_id = self.next_run_id.fetch_add(1, Ordering::SeqCst);
        let request = RunRequest {
            run_id,
            messages,
            instructions,
        };
        let join_handle = self.spawn_worker(request)?;

        *active_run = Some(ActiveRun {
            run_id,
            join_handle: Some(join_handle),
        });

        Ok(run_id)
    }

    fn spawn_worker(self: &Arc<Self>, request: RunRequest) -> Result<JoinHandle<()>, String> {
        let run_id = request.run_id;
        let controller = Arc::clone(self);
        thread::Builder::new()
            .name(format!("sketch-run-{run_id}"))
            .spawn(move || controller.run_worker(request))
            .map_err(|error| format!("Failed to spawn turn worker: {error}"))
    }

    fn run_worker(self: Arc<Self>, request: RunRequest) {
        let run_id = request.run_id;
        let terminal_emitted = Arc::new(AtomicBool::new(false));
        let terminal_emitted_for_emit = Arc::clone(&terminal_emitted);
        let pending_events = Arc::clone(&self.pending_events);

        let mut emit = move |event: RunEvent| {
            if event.is_terminal() {
                terminal_emitted_for_emit.store(true, Ordering::SeqCst);
            }

            lock_unpoisoned(&pending_events).push_back(PendingEvent::Run(event));
        };

        let provider = Arc::clone(&self.provider);
        let run_outcome = catch_unwind(AssertUnwindSafe(|| provider.run(request, &mut emit)));

        match run_outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => emit(RunEvent::Failed { run_id, error }),
            Err(_) => emit(RunEvent::Failed {
                run_id,
                error: "Provider panicked".to_string(),
            }),
        }

        if !terminal_emitted.load(Ordering::SeqCst) {
            emit(RunEvent::Failed {
                run_id,
                error: "Provider exited without terminal event".to_string(),
            });
        }
    }

    fn clear_active_run_if_matching(&self, run_id: RunId) {
        let mut active_run = lock_unpoisoned(&self.active_run);
        let matches = active_run.as_ref().map(|active| active.run_id) == Some(run_id);
        if !matches {
            return;
        }

        let mut completed = match active_run.take() {
            Some(completed) => completed,
            None => return,
        };

        if let Some(join_handle) = completed.join_handle.take() {
            let is_current_thread = join_handle.thread().id() == thread::current().id();
            if !is_current_thread && join_handle.is_finished() {
                let _ = join_handle.join();
            }
        }
    }

    fn rebuild_sandbox_internal(&self, code: &str) {
        let document = compose_document(code, &self.bootstrap);
        let pending_events = Arc::clone(&self.pending_events);
        let on_report = move |report: sketch_sandbox::SandboxReport| {
            lock_unpoisoned(&pending_events).push_back(PendingEvent::Fault(report.message));
        };

        let mut sandbox = lock_unpoisoned(&self.sandbox);
        if let Some(previous) = sandbox.take() {
            if let Err(error) = previous.shutdown() {
                warn!(%error, "previous sandbox did not shut down cleanly");
            }
        }

        match ProcessSandbox::launch(&self.sandbox_config, &document, on_report) {
            Ok(launched) => *sandbox = Some(launched),
            Err(error) => warn!(%error, "sandbox launch failed"),
        }
    }

    fn send_control_internal(&self, command: HostCommand) {
        let mut sandbox = lock_unpoisoned(&self.sandbox);
        match sandbox.as_mut() {
            Some(sandbox) => {
                if let Err(error) = sandbox.send(command) {
                    warn!(%error, "control command was not delivered");
                }
            }
            None => debug!("no live sandbox for control command"),
        }
    }
}

impl SessionHost for Arc<SessionController> {
    fn start_turn(
        &mut self,
        messages: Vec<ChatMessage>,
        instructions: String,
    ) -> Result<RunId, String> {
        self.start_run_internal(messages, instructions)
    }

    fn rebuild_sandbox(&mut self, code: &str) {
        self.rebuild_sandbox_internal(code);
    }

    fn send_control(&mut self, command: HostCommand) {
        self.send_control_internal(command);
    }

    fn confirm(&mut self, prompt: &str) -> bool {
        self.confirm.confirm(prompt)
    }

    fn reset_assistant_context(&mut self) {
        // The provider replays the whole history each turn; clearing the
        // turns is the entire context reset.
        debug!("assistant context reset");
    }

    fn request_render(&mut self) {
        self.render_requests.fetch_add(1, Ordering::SeqCst);
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
