//! Interpreter Module
//!
//! The sequential loop that turns submitted commands into history entries
//! and frames, one command at a time.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐  submit()   ┌──────────────────────────────────────────┐
//! │ Input surface │────────────>│ Interpreter (single tokio task)          │
//! │ (console,     │   mpsc      │                                          │
//! │  stdin, …)    │             │  history ─> settings ─> CommandHandler   │
//! └───────────────┘             │      ▲                        │          │
//!                               │      └──── next command <─────┘          │
//!                               └──────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! let interpreter = Interpreter::new(settings, history, handler, stats);
//! let handle = interpreter.spawn();
//!
//! handle.submit(":play intro")?;
//! handle.submit("GET name")?;
//! handle.finish().await;
//! ```

pub mod event_loop;

// Re-export commonly used types
pub use event_loop::{
    submission_channel, CommandQueue, Interpreter, InterpreterHandle, InterpreterStats,
    SubmitError, SubmitHandle, SubmittedCommand,
};
