//! Error types for the trapper client.

use std::fmt;
use std::io;
use thiserror::Error;

/// Phase of a send round trip that ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Connect,
    Write,
    Read,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Connect => f.write_str("connect"),
            Phase::Write => f.write_str("write"),
            Phase::Read => f.write_str("read"),
        }
    }
}

/// Every way a send can fail.
#[derive(Debug, Error)]
pub enum TrapperError {
    /// Header plus payload is bigger than a non-large packet may be.
    #[error("request packet size limit exceeded: {size} bytes (limit {limit})")]
    PacketSizeLimitExceeded { size: usize, limit: usize },

    /// The request envelope could not be serialized.
    #[error("encode request: {0}")]
    Encode(#[source] serde_json::Error),

    /// Address resolution or TCP connect failed.
    #[error("connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The round trip deadline passed.
    #[error("timed out during {phase}")]
    Timeout { phase: Phase },

    #[error("send request packet: {0}")]
    Write(#[source] io::Error),

    /// The peer stopped accepting bytes before the whole frame was written.
    #[error("short write for sending request packet: wrote {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },

    #[error("read response header: {0}")]
    ReadHeader(#[source] io::Error),

    #[error("unexpected response protocol: {magic:02x?}")]
    UnexpectedProtocol { magic: [u8; 4] },

    #[error("unsupported response protocol flag: {flag:#04x}")]
    UnsupportedFlag { flag: u8 },

    /// Declared payload length is above what we are willing to allocate.
    #[error("response payload too large: {len} bytes (limit {limit})")]
    ResponseTooLarge { len: u32, limit: usize },

    #[error("read response data: {0}")]
    ReadPayload(#[source] io::Error),

    #[error("unmarshal response: {0}")]
    Unmarshal(#[source] serde_json::Error),

    /// The `info` text did not match the fixed counters template.
    #[error("could not parse response info {info:?}: {reason}")]
    ParseInfo { info: String, reason: String },
}

impl TrapperError {
    /// True when the failure was the deadline, so a caller may want to retry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, TrapperError::Timeout { .. })
    }
}

/// Result type alias using TrapperError.
pub type Result<T> = std::result::Result<T, TrapperError>;
