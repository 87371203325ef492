//! Command Handler
//!
//! The dispatch stage of the interpreter: classifies one command and runs
//! the matching directive handler or the query executor to completion.
//!
//! ## Dispatch Table
//!
//! ```text
//! classify(prefix, text)
//!   ├── Query                 → Database::transaction(text) → emit {cmd}
//!   ├── Directive::Clear      → FrameStream::clear_all()      (no frame)
//!   ├── Directive::Play
//!   │     ├── http(s) URL     → RemoteContent::fetch(url)    → emit {cmd, type: "play-remote", …}
//!   │     └── anything else   → emit {cmd, type: "play"}
//!   └── Directive::Unrecognized → emit {cmd}
//! ```
//!
//! No handler fails. Fetch and transaction errors are folded into the frame
//! they produce, so the caller always gets an [`Outcome`] back.

use crate::commands::classifier::{classify, Decision, Directive};
use crate::services::{remote_url, Database, RemoteContent};
use crate::storage::{Frame, FrameBody, FrameEmitter};
use std::sync::Arc;
use tracing::{debug, warn};

/// Which handler produced a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchKind {
    Query,
    PlayLocal,
    PlayRemote,
    Unrecognized,
}

/// The terminal effect of dispatching one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The frame stream was cleared; no frame was produced.
    Cleared,

    /// Exactly one frame was appended.
    Emitted { kind: DispatchKind, frame: Frame },
}

impl Outcome {
    /// The emitted frame, if any.
    pub fn frame(&self) -> Option<&Frame> {
        match self {
            Outcome::Cleared => None,
            Outcome::Emitted { frame, .. } => Some(frame),
        }
    }
}

/// Runs classified commands against the frame stream and external services.
#[derive(Clone)]
pub struct CommandHandler {
    emitter: FrameEmitter,
    database: Arc<dyn Database>,
    remote: Arc<dyn RemoteContent>,
}

impl CommandHandler {
    pub fn new(
        emitter: FrameEmitter,
        database: Arc<dyn Database>,
        remote: Arc<dyn RemoteContent>,
    ) -> Self {
        Self {
            emitter,
            database,
            remote,
        }
    }

    /// Classifies `text` under `prefix` and handles it to completion.
    pub async fn dispatch(&self, prefix: char, text: &str) -> Outcome {
        match classify(prefix, text) {
            Decision::Query(query) => self.run_query(query).await,
            Decision::Directive(directive) => {
                debug!(cmd = %text, directive = directive.name(), "Dispatching directive");
                self.run_directive(directive, text).await
            }
        }
    }

    async fn run_directive(&self, directive: Directive<'_>, cmd: &str) -> Outcome {
        match directive {
            Directive::Clear => {
                self.emitter.clear();
                Outcome::Cleared
            }
            Directive::Play { argument } => self.play(cmd, argument).await,
            Directive::Unrecognized => {
                self.emit(DispatchKind::Unrecognized, cmd, FrameBody::Default)
            }
        }
    }

    /// Query executor: one transaction, then one untyped frame.
    async fn run_query(&self, query: &str) -> Outcome {
        debug!(cmd = %query, "Dispatching query");

        let outcome = self.database.transaction(query).await.map_err(|e| {
            warn!(cmd = %query, error = %e, "Transaction failed");
            e.to_string()
        });

        self.emit(DispatchKind::Query, query, FrameBody::Query { outcome })
    }

    async fn play(&self, cmd: &str, argument: &str) -> Outcome {
        let url = match remote_url(argument) {
            None => return self.emit(DispatchKind::PlayLocal, cmd, FrameBody::Play),
            Some(Ok(url)) => url,
            Some(Err(e)) => {
                warn!(cmd = %cmd, error = %e, "Malformed play URL");
                let body = FrameBody::PlayRemote {
                    url: argument.to_string(),
                    outcome: Err(e.to_string()),
                };
                return self.emit(DispatchKind::PlayRemote, cmd, body);
            }
        };

        let outcome = self.remote.fetch(&url).await.map_err(|e| {
            warn!(cmd = %cmd, url = %url, error = %e, "Remote fetch failed");
            e.to_string()
        });

        let body = FrameBody::PlayRemote {
            url: argument.to_string(),
            outcome,
        };
        self.emit(DispatchKind::PlayRemote, cmd, body)
    }

    fn emit(&self, kind: DispatchKind, cmd: &str, body: FrameBody) -> Outcome {
        let frame = self.emitter.emit(cmd, body);
        Outcome::Emitted { kind, frame }
    }
}
