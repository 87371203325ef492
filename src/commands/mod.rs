//! Command Interpretation Module
//!
//! Turns one line of console input into its effect on the frame stream.
//!
//! ## Architecture
//!
//! ```text
//! command text + directive prefix
//!       │
//!       ▼
//! ┌─────────────────┐
//! │   Classifier    │  Query | Clear | Play | Unrecognized
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐       ┌──────────────────────┐
//! │ CommandHandler  │──────>│ Database / Remote    │
//! │                 │       └──────────────────────┘
//! │  - Directives   │       ┌──────────────────────┐
//! │  - Queries      │──────>│ FrameEmitter         │
//! └─────────────────┘       └──────────────────────┘
//! ```
//!
//! ## Directives
//!
//! - `clear` - empty the frame stream
//! - `play <name>` - show a local guide
//! - `play <http(s) url>` - fetch and show a remote guide
//!
//! Every other prefixed keyword produces a plain frame echoing the command.

pub mod classifier;
pub mod handler;

// Re-export the main command handler and classifier
pub use classifier::{classify, Decision, Directive, CLEAR_KEYWORD, PLAY_KEYWORD};
pub use handler::{CommandHandler, DispatchKind, Outcome};
