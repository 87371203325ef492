//! RESP Reply and Request Values
//!
//! The database driver speaks RESP (the Redis Serialization Protocol) to the
//! query engine. Requests are always arrays of bulk strings; replies can be
//! any RESP type.
//!
//! ## Wire Format
//!
//! - `+` Simple String: `+OK\r\n`
//! - `-` Error: `-ERR unknown command\r\n`
//! - `:` Integer: `:1000\r\n`
//! - `$` Bulk String: `$5\r\nhello\r\n` (null: `$-1\r\n`)
//! - `*` Array: `*2\r\n$3\r\nGET\r\n$4\r\nname\r\n` (null: `*-1\r\n`)

use bytes::Bytes;
use serde_json::Value;

/// The CRLF terminator used in RESP protocol
pub const CRLF: &[u8] = b"\r\n";

/// RESP protocol type prefixes
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A value on the RESP wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    Integer(i64),
    BulkString(Bytes),
    /// Null bulk string or null array
    Null,
    Array(Vec<RespValue>),
}

impl RespValue {
    /// Builds a request array from the whitespace-separated words of `text`.
    ///
    /// Returns `None` when `text` has no words.
    ///
    /// # Example
    /// ```
    /// use framedeck::protocol::RespValue;
    /// let request = RespValue::command("GET name").unwrap();
    /// assert_eq!(request.serialize(), b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n");
    /// ```
    pub fn command(text: &str) -> Option<Self> {
        let words: Vec<RespValue> = text
            .split_whitespace()
            .map(|word| RespValue::BulkString(Bytes::copy_from_slice(word.as_bytes())))
            .collect();

        if words.is_empty() {
            None
        } else {
            Some(RespValue::Array(words))
        }
    }

    /// Serializes the value to its wire format.
    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        buf
    }

    /// Serializes the value into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => write_line(buf, prefix::SIMPLE_STRING, s.as_bytes()),
            RespValue::Error(s) => write_line(buf, prefix::ERROR, s.as_bytes()),
            RespValue::Integer(n) => write_line(buf, prefix::INTEGER, n.to_string().as_bytes()),
            RespValue::BulkString(data) => {
                write_line(buf, prefix::BULK_STRING, data.len().to_string().as_bytes());
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            RespValue::Null => write_line(buf, prefix::BULK_STRING, b"-1"),
            RespValue::Array(values) => {
                write_line(buf, prefix::ARRAY, values.len().to_string().as_bytes());
                for value in values {
                    value.serialize_into(buf);
                }
            }
        }
    }

    /// Converts a reply into JSON for frame rendering.
    ///
    /// Bulk strings that are not valid UTF-8 become arrays of byte values.
    pub fn into_json(self) -> Value {
        match self {
            RespValue::SimpleString(s) => Value::String(s),
            RespValue::Error(s) => serde_json::json!({ "error": s }),
            RespValue::Integer(n) => Value::from(n),
            RespValue::BulkString(data) => match std::str::from_utf8(&data) {
                Ok(s) => Value::String(s.to_string()),
                Err(_) => Value::from(data.to_vec()),
            },
            RespValue::Null => Value::Null,
            RespValue::Array(values) => {
                Value::Array(values.into_iter().map(RespValue::into_json).collect())
            }
        }
    }
}

fn write_line(buf: &mut Vec<u8>, prefix: u8, content: &[u8]) {
    buf.push(prefix);
    buf.extend_from_slice(content);
    buf.extend_from_slice(CRLF);
}
