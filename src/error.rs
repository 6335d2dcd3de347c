//! Error taxonomy for request handling.
//!
//! Every failure a connection can hit is classified into an [`ErrorKind`],
//! which decides the log level and the body of the 500 response. Not-found
//! is not an error here: it is a normal 404 outcome of resolution.

use std::fmt;
use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors produced while reading and tokenizing the request line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// No line terminator seen yet; more bytes are needed.
    #[error("request line incomplete")]
    Incomplete,

    #[error("request line exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("malformed request line: {reason}")]
    Malformed { reason: &'static str },

    #[error("unsupported method {0:?}")]
    UnsupportedMethod(String),

    #[error("invalid protocol version {0:?}")]
    InvalidVersion(String),
}

impl ParseError {
    pub fn malformed(reason: &'static str) -> Self {
        Self::Malformed { reason }
    }
}

/// The I/O phase a connection was suspended in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Read,
    Write,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Read => f.write_str("read"),
            Phase::Write => f.write_str("write"),
        }
    }
}

/// A failure that ends a connection with a 500 (or, once the response has
/// started, with a bare close).
#[derive(Debug, Error)]
pub enum ServeError {
    #[error(transparent)]
    Malformed(#[from] ParseError),

    #[error("{phase} timed out after {after:?}")]
    Timeout { phase: Phase, after: Duration },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Coarse classification used for logging and for the client-visible message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedRequest,
    IoFailure,
}

impl ServeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServeError::Malformed(_) => ErrorKind::MalformedRequest,
            ServeError::Timeout { .. } | ServeError::Io(_) => ErrorKind::IoFailure,
        }
    }
}
