//! Error types for kvwire
//!
//! Two classes of failure leave the codec: stream errors, passed through
//! untouched, and protocol violations, after which the stream position is
//! unknown and the connection must not be read again.

use thiserror::Error;

/// Result type alias using KvWireError
pub type Result<T> = std::result::Result<T, KvWireError>;

/// Unified error type for kvwire operations
#[derive(Debug, Error)]
pub enum KvWireError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol violation: {0}")]
    ProtocolViolation(#[from] Violation),

    #[error("Connection poisoned by a read that failed mid-value")]
    Poisoned,

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvWireError {
    /// True for malformed framing, or a connection whose stream position is
    /// no longer trustworthy
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, KvWireError::ProtocolViolation(_) | KvWireError::Poisoned)
    }

    /// True when the peer went away (EOF, reset, abort, broken pipe)
    pub fn is_disconnect(&self) -> bool {
        match self {
            KvWireError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

/// Malformed framing received from the server
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("received unknown message type: {}", .0.escape_ascii())]
    UnknownMarker(u8),

    #[error("received unexpected simple string message ending without CRLF")]
    MissingCrlf,

    #[error("received unexpected number byte: {}", .0.escape_ascii())]
    UnexpectedNumberByte(u8),

    #[error("expected byte {} but received {}", .expected.escape_ascii(), .found.escape_ascii())]
    UnexpectedByte { expected: u8, found: u8 },

    #[error("received number without digits")]
    EmptyNumber,

    #[error("received number that overflows a 64-bit integer")]
    IntegerOverflow,

    #[error("received streamed length for non-streamable type {}", .0.escape_ascii())]
    UnexpectedStreamedLength(u8),

    #[error("received invalid boolean byte: {}", .0.escape_ascii())]
    InvalidBoolean(u8),

    #[error("streamed map ended after {0} elements, leaving a key without a value")]
    OddMapLength(usize),

    #[error("nesting depth exceeds limit of {max}")]
    NestingTooDeep { max: usize },

    #[error("blob of {len} bytes exceeds limit of {max}")]
    BlobTooLarge { len: u64, max: usize },
}
