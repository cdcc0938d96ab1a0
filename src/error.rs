//! Conversation-level error type shared by the sender and receiver drivers.
//!
//! Framing errors on individual packets never show up here — they are
//! absorbed inside [`crate::stream`] (logged, frame dropped) because the
//! protocol self-heals via retransmission and duplicate ACKs.  What remains
//! are the fatal conditions: a failed or timed-out handshake, the transport
//! closing mid-conversation, and plain I/O errors.  A conversation either
//! completes fully or fails with one of these; there is no partial success.

use crate::handshake::HandshakeError;
use crate::stream::StreamError;

/// Fatal outcome of a sending or receiving conversation.
#[derive(Debug)]
pub enum TransferError {
    /// The size negotiation failed or timed out; no data transfer began.
    Handshake(HandshakeError),
    /// The underlying stream closed before the conversation finished.
    TransportClosed,
    /// Underlying I/O error from the OS.
    Io(std::io::Error),
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Handshake(e) => write!(f, "{e}"),
            Self::TransportClosed => write!(f, "transport closed mid-conversation"),
            Self::Io(e) => write!(f, "transfer I/O error: {e}"),
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Handshake(e) => Some(e),
            Self::TransportClosed => None,
            Self::Io(e) => Some(e),
        }
    }
}

impl From<HandshakeError> for TransferError {
    fn from(e: HandshakeError) -> Self {
        Self::Handshake(e)
    }
}

impl From<StreamError> for TransferError {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::Closed => Self::TransportClosed,
            StreamError::Io(e) => Self::Io(e),
        }
    }
}
