//! Line protocol error types.

use std::io;

use thiserror::Error;

/// Errors while reading a client line
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Client sent more than the line limit without a newline
    #[error("line exceeds {max} bytes")]
    LineTooLong { max: usize },

    /// The connection failed underneath the protocol
    #[error("connection error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;
