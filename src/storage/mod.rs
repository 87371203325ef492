//! Storage Module
//!
//! The two pieces of mutable state the interpreter owns: the command history
//! and the frame stream. Both are append-only from the interpreter's point of
//! view; the frame stream can additionally be cleared as a whole.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────┐         ┌──────────────────────┐
//! │   Interpreter Loop   │────────>│    HistoryStore      │
//! │                      │ append  │ (memory or file)     │
//! │                      │         └──────────────────────┘
//! │                      │         ┌──────────────────────┐
//! │   CommandHandler     │────────>│    FrameEmitter      │
//! │                      │ emit /  │         │            │
//! │                      │ clear   │         ▼            │
//! └──────────────────────┘         │    FrameStream       │──> subscribers
//!                                  └──────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use framedeck::storage::{FrameBody, FrameEmitter, FrameStream, InMemoryFrameStream};
//! use std::sync::Arc;
//!
//! let stream = Arc::new(InMemoryFrameStream::new());
//! let emitter = FrameEmitter::new(Arc::clone(&stream) as Arc<dyn FrameStream>);
//!
//! let frame = emitter.emit(":play intro", FrameBody::Play);
//! assert_eq!(frame.frame_type(), Some("play"));
//! assert_eq!(stream.len(), 1);
//! ```

pub mod frames;
pub mod history;

// Re-export commonly used types
pub use frames::{
    Frame, FrameBody, FrameEmitter, FrameEvent, FrameId, FrameStream, InMemoryFrameStream,
    PLAY_REMOTE_TYPE, PLAY_TYPE,
};
pub use history::{FileHistory, HistoryError, HistoryStore, InMemoryHistory};
