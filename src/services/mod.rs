//! External Services
//!
//! The two asynchronous collaborators the interpreter calls out to:
//!
//! - [`RemoteContent`]: fetches guide content for `:play <url>`
//! - [`Database`]: runs a query as a single transaction
//!
//! Both are object-safe traits so the interpreter can hold them as
//! `Arc<dyn …>` and tests can substitute recording doubles. Neither the
//! interpreter nor these traits retry; each call is made exactly once.

pub mod database;
pub mod remote;

// Re-export commonly used types
pub use database::{Database, OfflineDatabase, RespDatabase, TransactionError, TransactionResult};
pub use remote::{remote_url, FetchError, HttpRemote, RemoteContent, REMOTE_SCHEMES};
