//! Database Engine Service
//!
//! The interpreter hands query text to a [`Database`] verbatim, as a single
//! transaction call. It awaits the call but never inspects the outcome; the
//! outcome travels on the query frame to whatever renders it.
//!
//! Two engines ship with the crate:
//! - [`RespDatabase`] talks RESP over TCP to a Redis-compatible server
//! - [`OfflineDatabase`] rejects everything (no database configured)

use crate::protocol::{ParseError, RespParser, RespValue};
use async_trait::async_trait;
use bytes::BytesMut;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

/// Initial reply buffer capacity
const INITIAL_BUFFER_SIZE: usize = 4096;

/// Largest reply the driver will buffer before giving up.
///
/// Console replies are expected to stay small. The buffer is re-parsed from
/// the start after every read, so this also bounds the parsing work.
pub const MAX_REPLY_SIZE: usize = 16 * 1024 * 1024;

/// The payload a successful transaction produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TransactionResult {
    data: Value,
}

impl TransactionResult {
    pub fn new(data: Value) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &Value {
        &self.data
    }
}

/// Errors raised by a database engine.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// No database engine is configured
    #[error("no database configured")]
    NotConfigured,

    /// Network failure talking to the engine
    #[error("connection error: {0}")]
    Connection(#[from] std::io::Error),

    /// The engine sent something that is not valid RESP
    #[error("protocol error: {0}")]
    Protocol(#[from] ParseError),

    /// The engine closed the connection before replying
    #[error("connection closed before a reply was received")]
    ConnectionClosed,

    /// The engine rejected the query
    #[error("{0}")]
    Server(String),

    /// The query contained no words
    #[error("empty query")]
    EmptyQuery,

    /// No reply within the configured timeout
    #[error("transaction timed out after {0:?}")]
    Timeout(Duration),
}

/// A database engine reachable through a single transaction entry point.
#[async_trait]
pub trait Database: Send + Sync {
    /// Runs `query` as one transaction.
    async fn transaction(&self, query: &str) -> Result<TransactionResult, TransactionError>;
}

/// Placeholder engine used when no database address is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineDatabase;

#[async_trait]
impl Database for OfflineDatabase {
    async fn transaction(&self, _query: &str) -> Result<TransactionResult, TransactionError> {
        Err(TransactionError::NotConfigured)
    }
}

/// RESP engine client. Opens one connection per transaction.
#[derive(Debug, Clone)]
pub struct RespDatabase {
    addr: String,
    timeout: Duration,
    max_reply_size: usize,
}

impl RespDatabase {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
            max_reply_size: MAX_REPLY_SIZE,
        }
    }

    /// Overrides the reply size limit.
    pub fn with_max_reply_size(mut self, max: usize) -> Self {
        self.max_reply_size = max;
        self
    }

    async fn round_trip(&self, request: &RespValue) -> Result<RespValue, TransactionError> {
        let mut stream = TcpStream::connect(&self.addr).await?;
        stream.write_all(&request.serialize()).await?;
        stream.flush().await?;

        let mut buffer = BytesMut::with_capacity(INITIAL_BUFFER_SIZE);
        let mut parser = RespParser::new();
        loop {
            if let Some((reply, _)) = parser.parse(&buffer)? {
                return Ok(reply);
            }

            let n = stream.read_buf(&mut buffer).await?;
            if n == 0 {
                return Err(TransactionError::ConnectionClosed);
            }
            trace!(engine = %self.addr, bytes = n, "Read reply data");

            if buffer.len() > self.max_reply_size {
                return Err(ParseError::MessageTooLarge {
                    size: buffer.len(),
                    max: self.max_reply_size,
                }
                .into());
            }
        }
    }
}

#[async_trait]
impl Database for RespDatabase {
    async fn transaction(&self, query: &str) -> Result<TransactionResult, TransactionError> {
        let request = RespValue::command(query).ok_or(TransactionError::EmptyQuery)?;
        debug!(engine = %self.addr, query = %query, "Issuing transaction");

        let reply = tokio::time::timeout(self.timeout, self.round_trip(&request))
            .await
            .map_err(|_| TransactionError::Timeout(self.timeout))??;

        match reply {
            RespValue::Error(message) => Err(TransactionError::Server(message)),
            reply => Ok(TransactionResult::new(reply.into_json())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    /// Answers every connection with `reply`, optionally split in two writes.
    async fn create_test_server(reply: &'static [u8], split_at: Option<usize>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                match split_at {
                    Some(at) => {
                        let _ = stream.write_all(&reply[..at]).await;
                        let _ = stream.flush().await;
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        let _ = stream.write_all(&reply[at..]).await;
                    }
                    None => {
                        let _ = stream.write_all(reply).await;
                    }
                }
            }
        });

        addr
    }

    #[tokio::test]
    async fn test_offline_database() {
        assert!(matches!(
            OfflineDatabase.transaction("RETURN 1").await,
            Err(TransactionError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_resp_transaction() {
        let addr = create_test_server(b"$4\r\nAriz\r\n", None).await;
        let db = RespDatabase::new(addr.to_string(), Duration::from_secs(5));

        let result = db.transaction("GET name").await.unwrap();
        assert_eq!(result.data(), &json!("Ariz"));
    }

    #[tokio::test]
    async fn test_resp_partial_reply() {
        let addr = create_test_server(b"*2\r\n$2\r\nv1\r\n$2\r\nv2\r\n", Some(9)).await;
        let db = RespDatabase::new(addr.to_string(), Duration::from_secs(5));

        let result = db.transaction("MGET k1 k2").await.unwrap();
        assert_eq!(result.data(), &json!(["v1", "v2"]));
    }

    #[tokio::test]
    async fn test_resp_reply_over_limit() {
        // An array that never completes
        let addr = create_test_server(b"*4\r\n$5\r\nfirst\r\n$6\r\nsecond\r\n", None).await;
        let db =
            RespDatabase::new(addr.to_string(), Duration::from_secs(5)).with_max_reply_size(16);

        assert!(matches!(
            db.transaction("LRANGE list 0 -1").await,
            Err(TransactionError::Protocol(ParseError::MessageTooLarge { max: 16, .. }))
        ));
    }

    #[tokio::test]
    async fn test_resp_server_error() {
        let addr = create_test_server(b"-ERR unknown command 'RETURN'\r\n", None).await;
        let db = RespDatabase::new(addr.to_string(), Duration::from_secs(5));

        match db.transaction("RETURN 1").await {
            Err(TransactionError::Server(message)) => {
                assert_eq!(message, "ERR unknown command 'RETURN'")
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resp_empty_query() {
        let db = RespDatabase::new("127.0.0.1:1", Duration::from_secs(5));
        assert!(matches!(
            db.transaction("   ").await,
            Err(TransactionError::EmptyQuery)
        ));
    }

    #[tokio::test]
    async fn test_resp_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let db = RespDatabase::new(addr.to_string(), Duration::from_secs(5));
        assert!(matches!(
            db.transaction("PING").await,
            Err(TransactionError::Connection(_))
        ));
    }

    #[tokio::test]
    async fn test_resp_timeout() {
        // Accepts but never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        let db = RespDatabase::new(addr.to_string(), Duration::from_millis(100));
        assert!(matches!(
            db.transaction("PING").await,
            Err(TransactionError::Timeout(_))
        ));
    }
}
