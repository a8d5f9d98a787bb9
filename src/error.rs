//! Error types for sqlwire-client.

use thiserror::Error;

/// Main error type for all packet buffer operations.
#[derive(Debug, Error)]
pub enum SqlwireError {
    /// Transport-level I/O error (deadline exceeded, connection reset, ...).
    ///
    /// Propagated verbatim from the underlying connection. Fatal: the
    /// connection must be treated as unusable afterwards.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The transport ended cleanly before a packet was fully received.
    ///
    /// Distinguishes a truncated packet from an EOF that lands exactly on
    /// a packet boundary. Fatal for the connection.
    #[error("unexpected EOF while reading a packet")]
    UnexpectedEof,

    /// A buffer lend was attempted while unread packet bytes remain.
    ///
    /// Recoverable: fully drain the current packet, then retry.
    #[error("busy buffer: a packet is still being read")]
    BusyBuffer,
}

impl SqlwireError {
    /// Whether the caller can recover by fixing its own call sequencing.
    ///
    /// [`BusyBuffer`](SqlwireError::BusyBuffer) is an ordering mistake on
    /// the caller's side; every other variant means the connection is no
    /// longer usable.
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SqlwireError::BusyBuffer)
    }
}

/// Result type alias using SqlwireError.
pub type Result<T> = std::result::Result<T, SqlwireError>;
