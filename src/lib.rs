//! # FrameDeck - Command Interpretation for Interactive Database Consoles
//!
//! FrameDeck takes single lines of console input and interprets each one as
//! either a *client directive* (`:clear`, `:play …`) or a *query* for an
//! external database engine. Every submission is written to history and
//! every outcome becomes one frame in an append-only output stream.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              FrameDeck                                  │
//! │                                                                         │
//! │  ┌─────────────┐    ┌─────────────┐    ┌─────────────┐                  │
//! │  │ SubmitHandle│───>│ Interpreter │───>│  Command    │                  │
//! │  │  (mpsc)     │    │    Loop     │    │  Handler    │                  │
//! │  └─────────────┘    └──────┬──────┘    └──────┬──────┘                  │
//! │                            │                  │                         │
//! │                            ▼                  ▼                         │
//! │                     ┌─────────────┐    ┌──────────────┐ ┌────────────┐  │
//! │                     │  History    │    │ FrameEmitter │ │ Database / │  │
//! │                     │  Store      │    │      │       │ │ Remote     │  │
//! │                     └─────────────┘    │ FrameStream  │ └────────────┘  │
//! │                                        └──────────────┘                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use framedeck::commands::CommandHandler;
//! use framedeck::interpreter::{Interpreter, InterpreterStats};
//! use framedeck::services::{HttpRemote, OfflineDatabase};
//! use framedeck::settings::SharedSettings;
//! use framedeck::storage::{FrameEmitter, InMemoryFrameStream, InMemoryHistory};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let frames = Arc::new(InMemoryFrameStream::new());
//!     let handler = CommandHandler::new(
//!         FrameEmitter::new(frames.clone()),
//!         Arc::new(OfflineDatabase),
//!         Arc::new(HttpRemote::new(Duration::from_secs(10))?),
//!     );
//!     let interpreter = Interpreter::new(
//!         Arc::new(SharedSettings::default()),
//!         Arc::new(InMemoryHistory::new()),
//!         handler,
//!         Arc::new(InterpreterStats::new()),
//!     );
//!
//!     let handle = interpreter.spawn();
//!     handle.submit(":play https://example.com/guide.html")?;
//!     handle.finish().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`commands`]: classifier and directive/query handlers
//! - [`interpreter`]: the sequential interpretation loop
//! - [`storage`]: history and frame stream
//! - [`services`]: database and remote-content collaborators
//! - [`protocol`]: RESP codec used by the bundled database driver
//! - [`settings`]: live settings and startup configuration
//!
//! ## Ordering Guarantee
//!
//! Commands are interpreted strictly one at a time in submission order.
//! Command n's history entry and terminal effect (frame or clear) both
//! happen before command n+1's history entry, even when command n waits on
//! the network.

pub mod commands;
pub mod interpreter;
pub mod protocol;
pub mod services;
pub mod settings;
pub mod storage;

#[cfg(test)]
mod testing;

// Re-export commonly used types for convenience
pub use commands::{classify, CommandHandler, Decision, Directive, Outcome};
pub use interpreter::{Interpreter, InterpreterHandle, InterpreterStats, SubmitHandle};
pub use settings::{AppConfig, Settings, SettingsStore, SharedSettings};
pub use storage::{Frame, FrameBody, FrameEmitter, FrameStream, InMemoryFrameStream};

/// Version of FrameDeck
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
