//! Frames and the Frame Stream
//!
//! A frame is one discrete, independently addressable unit of console output.
//! Every command that reaches the interpreter produces at most one frame; the
//! clear directive produces none and empties the stream instead.
//!
//! ## Frame Shape
//!
//! ```text
//! { "id": "<uuid>", "cmd": ":play http://…", "type": "play-remote", "url": …, "contents": … }
//! { "id": "<uuid>", "cmd": "RETURN 1", "result": … }
//! { "id": "<uuid>", "cmd": ":help" }
//! ```
//!
//! The stream itself is append-only except for [`FrameStream::clear_all`].

use crate::services::TransactionResult;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::mpsc;
use tracing::trace;
use uuid::Uuid;

/// Type tag of frames produced by a local `play` directive.
pub const PLAY_TYPE: &str = "play";

/// Type tag of frames produced by a remote `play` directive.
pub const PLAY_REMOTE_TYPE: &str = "play-remote";

/// Unique frame identifier.
pub type FrameId = Uuid;

/// One unit of output.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Fresh per frame, unique across the run
    pub id: FrameId,
    /// The full command text that produced this frame
    pub cmd: String,
    /// Type-specific content
    pub body: FrameBody,
}

/// Type-specific frame content.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameBody {
    /// Untyped frame for unrecognized directives.
    Default,

    /// Untyped frame for a database query. The transaction outcome is carried
    /// along for renderers; the interpreter never inspects it.
    Query {
        outcome: Result<TransactionResult, String>,
    },

    /// A local guide (`:play <name>`).
    Play,

    /// A remotely fetched guide (`:play <url>`).
    PlayRemote {
        url: String,
        outcome: Result<String, String>,
    },
}

impl FrameBody {
    /// The frame's `type` field, if it has one.
    pub fn frame_type(&self) -> Option<&'static str> {
        match self {
            FrameBody::Default | FrameBody::Query { .. } => None,
            FrameBody::Play => Some(PLAY_TYPE),
            FrameBody::PlayRemote { .. } => Some(PLAY_REMOTE_TYPE),
        }
    }

    /// The error message carried by this body, if any.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            FrameBody::Query {
                outcome: Err(message),
            }
            | FrameBody::PlayRemote {
                outcome: Err(message),
                ..
            } => Some(message.as_str()),
            _ => None,
        }
    }
}

impl Frame {
    /// Shorthand for `self.body.frame_type()`.
    pub fn frame_type(&self) -> Option<&'static str> {
        self.body.frame_type()
    }

    /// Returns true if the frame carries an error indicator.
    pub fn is_error(&self) -> bool {
        self.body.error_message().is_some()
    }
}

impl Serialize for Frame {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("id", &self.id)?;
        map.serialize_entry("cmd", &self.cmd)?;
        if let Some(frame_type) = self.frame_type() {
            map.serialize_entry("type", frame_type)?;
        }

        match &self.body {
            FrameBody::Default | FrameBody::Play => {}
            FrameBody::Query { outcome } => match outcome {
                Ok(result) => map.serialize_entry("result", result)?,
                Err(message) => {
                    map.serialize_entry("error", &true)?;
                    map.serialize_entry("message", message)?;
                }
            },
            FrameBody::PlayRemote { url, outcome } => {
                map.serialize_entry("url", url)?;
                match outcome {
                    Ok(contents) => map.serialize_entry("contents", contents)?,
                    Err(message) => {
                        map.serialize_entry("error", &true)?;
                        map.serialize_entry("message", message)?;
                    }
                }
            }
        }

        map.end()
    }
}

/// The output stream frames are appended to.
///
/// Implementations only need interior mutability; the interpreter is the
/// sole writer and never calls these concurrently.
pub trait FrameStream: Send + Sync {
    /// Appends a frame to the end of the stream.
    fn append(&self, frame: Frame);

    /// Removes every frame from the stream.
    fn clear_all(&self);
}

/// A change to a frame stream, published to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    Appended(Frame),
    Cleared,
}

/// In-memory frame stream that publishes every change.
///
/// Each subscriber gets its own unbounded queue, so a slow reader never
/// misses an event. A subscriber's receiver yields `None` once the stream
/// is dropped.
#[derive(Debug)]
pub struct InMemoryFrameStream {
    frames: RwLock<Vec<Frame>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<FrameEvent>>>,
}

impl InMemoryFrameStream {
    pub fn new() -> Self {
        Self {
            frames: RwLock::new(Vec::new()),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Subscribes to future changes of the stream.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<FrameEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().unwrap().push(tx);
        rx
    }

    /// Sends `event` to every live subscriber, forgetting closed ones.
    fn publish(&self, event: FrameEvent) {
        self.subscribers
            .lock()
            .unwrap()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns a copy of the current frames, oldest first.
    pub fn frames(&self) -> Vec<Frame> {
        self.frames.read().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.frames.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryFrameStream {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameStream for InMemoryFrameStream {
    fn append(&self, frame: Frame) {
        self.frames.write().unwrap().push(frame.clone());
        self.publish(FrameEvent::Appended(frame));
    }

    fn clear_all(&self) {
        self.frames.write().unwrap().clear();
        self.publish(FrameEvent::Cleared);
    }
}

/// Builds frames with fresh identifiers and appends them to a stream.
#[derive(Clone)]
pub struct FrameEmitter {
    stream: Arc<dyn FrameStream>,
}

impl FrameEmitter {
    pub fn new(stream: Arc<dyn FrameStream>) -> Self {
        Self { stream }
    }

    /// Creates a frame for `cmd`, appends it and returns it.
    ///
    /// Two calls with identical arguments produce two distinct frames.
    pub fn emit(&self, cmd: &str, body: FrameBody) -> Frame {
        let frame = Frame {
            id: Uuid::new_v4(),
            cmd: cmd.to_string(),
            body,
        };
        trace!(frame = %frame.id, cmd = %cmd, frame_type = ?frame.frame_type(), "Emitting frame");
        self.stream.append(frame.clone());
        frame
    }

    /// Empties the underlying stream.
    pub fn clear(&self) {
        trace!("Clearing frame stream");
        self.stream.clear_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn emitter() -> (Arc<InMemoryFrameStream>, FrameEmitter) {
        let stream = Arc::new(InMemoryFrameStream::new());
        let emitter = FrameEmitter::new(Arc::clone(&stream) as Arc<dyn FrameStream>);
        (stream, emitter)
    }

    #[test]
    fn test_emit_appends_in_order() {
        let (stream, emitter) = emitter();

        let first = emitter.emit(":help", FrameBody::Default);
        let second = emitter.emit(":play a", FrameBody::Play);

        assert_eq!(stream.frames(), vec![first, second]);
    }

    #[test]
    fn test_identical_emits_are_distinct() {
        let (stream, emitter) = emitter();

        let a = emitter.emit(":help", FrameBody::Default);
        let b = emitter.emit(":help", FrameBody::Default);

        assert_ne!(a.id, b.id);
        assert_eq!(stream.len(), 2);
    }

    #[test]
    fn test_clear() {
        let (stream, emitter) = emitter();

        emitter.emit(":help", FrameBody::Default);
        emitter.clear();
        assert!(stream.is_empty());

        emitter.emit(":play a", FrameBody::Play);
        assert_eq!(stream.len(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_events() {
        let (stream, emitter) = emitter();
        let mut events = stream.subscribe();

        let frame = emitter.emit(":play a", FrameBody::Play);
        emitter.clear();

        assert_eq!(events.recv().await.unwrap(), FrameEvent::Appended(frame));
        assert_eq!(events.recv().await.unwrap(), FrameEvent::Cleared);
    }

    #[tokio::test]
    async fn test_slow_subscriber_misses_nothing() {
        let (stream, emitter) = emitter();
        let mut events = stream.subscribe();

        // Nobody reads until every frame has been emitted
        let emitted: Vec<Frame> = (0..2_000)
            .map(|i| emitter.emit(&format!(":help {}", i), FrameBody::Default))
            .collect();
        emitter.clear();
        drop(emitter);
        drop(stream);

        for frame in emitted {
            assert_eq!(events.recv().await, Some(FrameEvent::Appended(frame)));
        }
        assert_eq!(events.recv().await, Some(FrameEvent::Cleared));
        assert_eq!(events.recv().await, None);
    }

    #[test]
    fn test_dropped_subscriber_is_forgotten() {
        let (stream, emitter) = emitter();
        let kept = stream.subscribe();
        drop(stream.subscribe());

        emitter.emit(":help", FrameBody::Default);

        assert_eq!(stream.subscribers.lock().unwrap().len(), 1);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_frame_types() {
        assert_eq!(FrameBody::Default.frame_type(), None);
        assert_eq!(FrameBody::Play.frame_type(), Some("play"));
        assert_eq!(
            FrameBody::Query {
                outcome: Err("down".into())
            }
            .frame_type(),
            None
        );
        assert_eq!(
            FrameBody::PlayRemote {
                url: "http://test.test/".into(),
                outcome: Ok(String::new()),
            }
            .frame_type(),
            Some("play-remote")
        );
    }

    #[test]
    fn test_serialize_default_has_no_type() {
        let (_, emitter) = emitter();
        let frame = emitter.emit(":unknown", FrameBody::Default);

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            json!({ "id": frame.id.to_string(), "cmd": ":unknown" })
        );
    }

    #[test]
    fn test_serialize_remote_error() {
        let (_, emitter) = emitter();
        let frame = emitter.emit(
            ":play http://test.test",
            FrameBody::PlayRemote {
                url: "http://test.test/".into(),
                outcome: Err("connection refused".into()),
            },
        );

        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value["type"], "play-remote");
        assert_eq!(value["error"], true);
        assert_eq!(value["message"], "connection refused");
        assert!(frame.is_error());
    }

    #[test]
    fn test_serialize_query_result() {
        let (_, emitter) = emitter();
        let frame = emitter.emit(
            "GET name",
            FrameBody::Query {
                outcome: Ok(TransactionResult::new(json!("Ariz"))),
            },
        );

        let value = serde_json::to_value(&frame).unwrap();
        assert!(value.get("type").is_none());
        assert_eq!(value["result"], "Ariz");
        assert!(!frame.is_error());
    }
}
