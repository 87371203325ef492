//! RESP Protocol Implementation
//!
//! Client-side RESP support for the bundled database driver
//! ([`crate::services::RespDatabase`]): request serialization and an
//! incremental reply parser.
//!
//! ## Example
//!
//! ```
//! use framedeck::protocol::{parse_message, RespValue};
//!
//! let request = RespValue::command("PING").unwrap();
//! assert_eq!(request.serialize(), b"*1\r\n$4\r\nPING\r\n");
//!
//! let (reply, consumed) = parse_message(b"+PONG\r\n").unwrap().unwrap();
//! assert_eq!(reply, RespValue::SimpleString("PONG".into()));
//! assert_eq!(consumed, 7);
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{parse_message, ParseError, ParseResult, RespParser};
pub use types::RespValue;
