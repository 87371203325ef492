//! Incremental RESP Reply Parser
//!
//! The database driver reads replies from a TCP stream, so a reply may arrive
//! in pieces. The parser returns:
//! - `Ok(Some((value, consumed)))` when a full reply is buffered
//! - `Ok(None)` when more bytes are needed
//! - `Err(ParseError)` when the bytes are not valid RESP

use crate::protocol::types::{prefix, RespValue, CRLF};
use bytes::Bytes;
use thiserror::Error;

/// Errors that can occur during RESP parsing.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Unknown type prefix byte
    #[error("unknown type prefix: {0:#04x}")]
    UnknownPrefix(u8),

    /// Invalid integer format
    #[error("invalid integer: {0}")]
    InvalidInteger(String),

    /// Invalid UTF-8 in a simple string or error message
    #[error("invalid UTF-8: {0}")]
    InvalidUtf8(String),

    /// Negative length other than -1
    #[error("invalid length: {0}")]
    InvalidLength(i64),

    /// Protocol violation (missing CRLF, too deep, etc.)
    #[error("protocol error: {0}")]
    ProtocolError(String),

    /// The reply exceeds maximum allowed size
    #[error("message too large: {size} bytes (max: {max})")]
    MessageTooLarge { size: usize, max: usize },
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Maximum size for a single bulk string (512 MB, same as Redis)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum array nesting depth
pub const MAX_NESTING_DEPTH: usize = 32;

/// A stateless-between-calls RESP reply parser.
#[derive(Debug, Default)]
pub struct RespParser {
    depth: usize,
}

impl RespParser {
    pub fn new() -> Self {
        Self { depth: 0 }
    }

    /// Attempts to parse one reply from the start of `buf`.
    pub fn parse(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        self.depth = 0;
        self.parse_value(buf)
    }

    fn parse_value(&mut self, buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
        if buf.is_empty() {
            return Ok(None);
        }

        if self.depth > MAX_NESTING_DEPTH {
            return Err(ParseError::ProtocolError(format!(
                "maximum nesting depth exceeded: {}",
                MAX_NESTING_DEPTH
            )));
        }

        let (line, header_len) = match read_line(&buf[1..])? {
            Some((line, len)) => (line, 1 + len),
            None => return Ok(None),
        };

        match buf[0] {
            prefix::SIMPLE_STRING => {
                Ok(Some((RespValue::SimpleString(line.to_string()), header_len)))
            }
            prefix::ERROR => Ok(Some((RespValue::Error(line.to_string()), header_len))),
            prefix::INTEGER => Ok(Some((RespValue::Integer(parse_int(line)?), header_len))),
            prefix::BULK_STRING => parse_bulk(buf, parse_int(line)?, header_len),
            prefix::ARRAY => self.parse_array(buf, parse_int(line)?, header_len),
            other => Err(ParseError::UnknownPrefix(other)),
        }
    }

    fn parse_array(
        &mut self,
        buf: &[u8],
        count: i64,
        header_len: usize,
    ) -> ParseResult<Option<(RespValue, usize)>> {
        if count == -1 {
            return Ok(Some((RespValue::Null, header_len)));
        }
        if count < 0 {
            return Err(ParseError::InvalidLength(count));
        }

        let mut elements = Vec::with_capacity((count as usize).min(1024));
        let mut consumed = header_len;

        self.depth += 1;
        for _ in 0..count {
            match self.parse_value(&buf[consumed..])? {
                Some((value, used)) => {
                    elements.push(value);
                    consumed += used;
                }
                None => return Ok(None),
            }
        }
        self.depth -= 1;

        Ok(Some((RespValue::Array(elements), consumed)))
    }
}

fn parse_bulk(
    buf: &[u8],
    length: i64,
    header_len: usize,
) -> ParseResult<Option<(RespValue, usize)>> {
    if length == -1 {
        return Ok(Some((RespValue::Null, header_len)));
    }
    if length < 0 {
        return Err(ParseError::InvalidLength(length));
    }

    let length = length as usize;
    if length > MAX_BULK_SIZE {
        return Err(ParseError::MessageTooLarge {
            size: length,
            max: MAX_BULK_SIZE,
        });
    }

    let total = header_len + length + 2;
    if buf.len() < total {
        return Ok(None);
    }
    if &buf[header_len + length..total] != CRLF {
        return Err(ParseError::ProtocolError(
            "bulk string missing trailing CRLF".to_string(),
        ));
    }

    let data = Bytes::copy_from_slice(&buf[header_len..header_len + length]);
    Ok(Some((RespValue::BulkString(data), total)))
}

/// Reads one CRLF-terminated line. Returns the line and the bytes consumed
/// including the CRLF.
fn read_line(buf: &[u8]) -> ParseResult<Option<(&str, usize)>> {
    match find_crlf(buf) {
        Some(pos) => {
            let line = std::str::from_utf8(&buf[..pos])
                .map_err(|e| ParseError::InvalidUtf8(e.to_string()))?;
            Ok(Some((line, pos + 2)))
        }
        None => Ok(None),
    }
}

fn parse_int(line: &str) -> ParseResult<i64> {
    line.parse()
        .map_err(|_| ParseError::InvalidInteger(line.to_string()))
}

#[inline]
fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == CRLF)
}

/// Parses a single reply from bytes.
pub fn parse_message(buf: &[u8]) -> ParseResult<Option<(RespValue, usize)>> {
    RespParser::new().parse(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_string() {
        let (value, consumed) = parse_message(b"+OK\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::SimpleString("OK".to_string()));
        assert_eq!(consumed, 5);
    }

    #[test]
    fn test_parse_error() {
        let (value, consumed) = parse_message(b"-ERR unknown command\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::Error("ERR unknown command".to_string()));
        assert_eq!(consumed, 22);
    }

    #[test]
    fn test_parse_integer() {
        let (value, _) = parse_message(b":-42\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::Integer(-42));
    }

    #[test]
    fn test_parse_bulk_and_null() {
        let (value, consumed) = parse_message(b"$5\r\nhello\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::BulkString(Bytes::from("hello")));
        assert_eq!(consumed, 11);

        let (value, consumed) = parse_message(b"$-1\r\n").unwrap().unwrap();
        assert_eq!(value, RespValue::Null);
        assert_eq!(consumed, 5);
    }

    #[test]
    fn test_parse_nested_array() {
        let input = b"*2\r\n:1\r\n*2\r\n$2\r\nv1\r\n$-1\r\n";
        let (value, consumed) = parse_message(input).unwrap().unwrap();
        assert_eq!(
            value,
            RespValue::Array(vec![
                RespValue::Integer(1),
                RespValue::Array(vec![RespValue::BulkString(Bytes::from("v1")), RespValue::Null]),
            ])
        );
        assert_eq!(consumed, input.len());
    }

    #[test]
    fn test_incomplete_replies() {
        assert!(parse_message(b"").unwrap().is_none());
        assert!(parse_message(b"+OK").unwrap().is_none());
        assert!(parse_message(b"$5\r\nhel").unwrap().is_none());
        assert!(parse_message(b"*2\r\n:1\r\n").unwrap().is_none());
    }

    #[test]
    fn test_invalid_replies() {
        assert_eq!(
            parse_message(b"?what\r\n"),
            Err(ParseError::UnknownPrefix(b'?'))
        );
        assert!(matches!(
            parse_message(b":abc\r\n"),
            Err(ParseError::InvalidInteger(_))
        ));
        assert_eq!(
            parse_message(b"$-2\r\n"),
            Err(ParseError::InvalidLength(-2))
        );
        assert!(matches!(
            parse_message(b"$2\r\nabcd\r\n"),
            Err(ParseError::ProtocolError(_))
        ));
    }
}
