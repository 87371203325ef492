//! Command Interpretation Loop
//!
//! The top-level driver. Commands are pulled from a queue one at a time and
//! each is handled to completion before the next is looked at.
//!
//! ## Per-Command Lifecycle
//!
//! ```text
//! 1. Wait for the next SubmittedCommand
//!        │
//!        ▼
//! 2. HistoryStore::append(text)        (failure logged, never blocks)
//!        │
//!        ▼
//! 3. SettingsStore::snapshot()         (fresh directive prefix)
//!        │
//!        ▼
//! 4. CommandHandler::dispatch(prefix, text)
//!        │   may suspend on a fetch or a transaction
//!        ▼
//! 5. Done ──> back to 1
//! ```
//!
//! Because step 4 is awaited inside the loop, command n's terminal effect
//! always happens before command n+1 is recorded in history.
//!
//! ## Shutdown
//!
//! The loop ends when every [`SubmitHandle`] is dropped and the queue is
//! drained, or when the shutdown signal fires. A shutdown during step 4
//! drops the in-flight dispatch; since frames are only emitted after a fetch
//! or transaction resolves, no partial frame is ever appended.

use crate::commands::{CommandHandler, DispatchKind, Outcome};
use crate::settings::SettingsStore;
use crate::storage::HistoryStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// One line of input waiting to be interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedCommand {
    pub text: String,
}

/// Errors returned to the input surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The interpreter loop is no longer running
    #[error("interpreter has shut down")]
    Closed,
}

/// The only inbound interface: enqueue a command for interpretation.
#[derive(Debug, Clone)]
pub struct SubmitHandle {
    tx: mpsc::UnboundedSender<SubmittedCommand>,
}

impl SubmitHandle {
    /// Queues `text`. Commands are interpreted in the order they are submitted.
    pub fn submit(&self, text: impl Into<String>) -> Result<(), SubmitError> {
        self.tx
            .send(SubmittedCommand { text: text.into() })
            .map_err(|_| SubmitError::Closed)
    }
}

/// Receiving end of the submission queue.
#[derive(Debug)]
pub struct CommandQueue {
    rx: mpsc::UnboundedReceiver<SubmittedCommand>,
}

/// Creates a connected submit handle and queue.
pub fn submission_channel() -> (SubmitHandle, CommandQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (SubmitHandle { tx }, CommandQueue { rx })
}

/// Counters describing what the interpreter has done.
#[derive(Debug, Default)]
pub struct InterpreterStats {
    /// Commands taken off the queue
    pub commands_received: AtomicU64,
    /// Commands classified as queries
    pub queries: AtomicU64,
    /// Commands classified as directives (clear included)
    pub directives: AtomicU64,
    /// Frames appended to the stream
    pub frames_emitted: AtomicU64,
    /// Clear-all operations
    pub clears: AtomicU64,
    /// Play-remote frames carrying an error
    pub fetch_failures: AtomicU64,
    /// Query frames carrying an error
    pub transaction_failures: AtomicU64,
    /// History appends that failed
    pub history_failures: AtomicU64,
}

impl InterpreterStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command_received(&self) {
        self.commands_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn history_failed(&self) {
        self.history_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record(&self, outcome: &Outcome) {
        let (kind, frame) = match outcome {
            Outcome::Cleared => {
                self.clears.fetch_add(1, Ordering::Relaxed);
                self.directives.fetch_add(1, Ordering::Relaxed);
                return;
            }
            Outcome::Emitted { kind, frame } => (kind, frame),
        };

        self.frames_emitted.fetch_add(1, Ordering::Relaxed);
        match kind {
            DispatchKind::Query => {
                self.queries.fetch_add(1, Ordering::Relaxed);
                if frame.is_error() {
                    self.transaction_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
            DispatchKind::PlayRemote => {
                self.directives.fetch_add(1, Ordering::Relaxed);
                if frame.is_error() {
                    self.fetch_failures.fetch_add(1, Ordering::Relaxed);
                }
            }
            DispatchKind::PlayLocal | DispatchKind::Unrecognized => {
                self.directives.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// The sequential command interpreter.
pub struct Interpreter {
    settings: Arc<dyn SettingsStore>,
    history: Arc<dyn HistoryStore>,
    handler: CommandHandler,
    stats: Arc<InterpreterStats>,
}

impl Interpreter {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        history: Arc<dyn HistoryStore>,
        handler: CommandHandler,
        stats: Arc<InterpreterStats>,
    ) -> Self {
        Self {
            settings,
            history,
            handler,
            stats,
        }
    }

    /// Interprets a single command: history, settings, dispatch.
    pub async fn process(&self, command: SubmittedCommand) -> Outcome {
        self.stats.command_received();
        self.record(&command.text);

        let settings = self.settings.snapshot();
        let outcome = self
            .handler
            .dispatch(settings.directive_prefix, &command.text)
            .await;
        self.stats.record(&outcome);

        match &outcome {
            Outcome::Cleared => debug!(cmd = %command.text, "Frame stream cleared"),
            Outcome::Emitted { frame, .. } => {
                debug!(cmd = %command.text, frame = %frame.id, "Frame emitted")
            }
        }

        outcome
    }

    /// Appends `text` to history. Best-effort: failures are only logged.
    fn record(&self, text: &str) {
        if let Err(e) = self.history.append(text) {
            self.stats.history_failed();
            warn!(cmd = %text, error = %e, "Failed to record history");
        }
    }

    /// Runs the loop until the queue closes or `shutdown` turns true.
    pub async fn run(self, mut queue: CommandQueue, mut shutdown: watch::Receiver<bool>) {
        info!("Interpreter started");

        loop {
            let command = tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => break,
                command = queue.rx.recv() => match command {
                    Some(command) => command,
                    None => {
                        debug!("Submission queue closed");
                        break;
                    }
                },
            };

            let text = command.text.clone();
            tokio::select! {
                biased;
                _ = shutdown_requested(&mut shutdown) => {
                    info!(cmd = %text, "Shutdown during dispatch, abandoning command");
                    break;
                }
                _ = self.process(command) => {}
            }
        }

        info!("Interpreter stopped");
    }

    /// Spawns the loop as a background task.
    pub fn spawn(self) -> InterpreterHandle {
        let (submitter, queue) = submission_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(queue, shutdown_rx));

        InterpreterHandle {
            submitter,
            shutdown_tx,
            task,
        }
    }
}

/// Resolves once the shutdown flag is set. Never resolves if the sender is
/// dropped without setting it.
async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// A handle to a running interpreter task.
#[derive(Debug)]
pub struct InterpreterHandle {
    submitter: SubmitHandle,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl InterpreterHandle {
    /// Returns a new submit handle for the input surface.
    pub fn submitter(&self) -> SubmitHandle {
        self.submitter.clone()
    }

    /// Queues a command.
    pub fn submit(&self, text: impl Into<String>) -> Result<(), SubmitError> {
        self.submitter.submit(text)
    }

    /// Stops accepting input from this handle and waits until every queued
    /// command has been interpreted. Other live submitters keep the loop
    /// running.
    pub async fn finish(self) {
        drop(self.submitter);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Interpreter task failed");
        }
    }

    /// Stops the loop now, abandoning any in-flight and queued commands.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            warn!(error = %e, "Interpreter task failed");
        }
    }
}
