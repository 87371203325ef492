//! Recording test doubles for the interpreter's collaborators.
//!
//! Every double writes to a shared [`EventLog`] so tests can assert on the
//! exact interleaving of effects across collaborators.

use crate::services::{Database, FetchError, RemoteContent, TransactionError, TransactionResult};
use crate::storage::{Frame, FrameStream, HistoryError, HistoryStore, InMemoryFrameStream};
use async_trait::async_trait;
use serde_json::json;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use url::Url;

/// One observed collaborator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    History(String),
    Transaction(String),
    Fetch(String),
    Append(String),
    Clear,
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, matches: impl Fn(&Event) -> bool) -> usize {
        self.events().iter().filter(|e| matches(e)).count()
    }
}

pub struct RecordingHistory {
    pub log: EventLog,
    pub fail: bool,
}

impl HistoryStore for RecordingHistory {
    fn append(&self, text: &str) -> Result<(), HistoryError> {
        self.log.push(Event::History(text.to_string()));
        if self.fail {
            return Err(HistoryError::Unavailable("disk full".to_string()));
        }
        Ok(())
    }
}

pub struct RecordingFrames {
    pub log: EventLog,
    pub inner: InMemoryFrameStream,
}

impl RecordingFrames {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            inner: InMemoryFrameStream::new(),
        }
    }
}

impl FrameStream for RecordingFrames {
    fn append(&self, frame: Frame) {
        self.log.push(Event::Append(frame.cmd.clone()));
        self.inner.append(frame);
    }

    fn clear_all(&self) {
        self.log.push(Event::Clear);
        self.inner.clear_all();
    }
}

pub struct RecordingDatabase {
    pub log: EventLog,
    pub fail: bool,
}

#[async_trait]
impl Database for RecordingDatabase {
    async fn transaction(&self, query: &str) -> Result<TransactionResult, TransactionError> {
        self.log.push(Event::Transaction(query.to_string()));
        if self.fail {
            return Err(TransactionError::Server("ERR syntax error".to_string()));
        }
        Ok(TransactionResult::new(json!({ "rows": 1 })))
    }
}

/// Remote double. When `gate` is set, each fetch waits for a permit on it.
pub struct RecordingRemote {
    pub log: EventLog,
    pub body: Result<String, String>,
    pub gate: Option<Arc<Notify>>,
}

#[async_trait]
impl RemoteContent for RecordingRemote {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        self.log.push(Event::Fetch(url.to_string()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.body.clone().map_err(|reason| FetchError::Request {
            url: url.to_string(),
            reason,
        })
    }
}
