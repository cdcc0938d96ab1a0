//! Segment-size negotiation, exchanged once before any DATA frame.
//!
//! The data-sending side opens the conversation with a `SIZE_REQUEST`; the
//! data-receiving side answers with a `SIZE_RESPONSE` carrying its
//! configured maximum segment size.  The value is not negotiated — the
//! receiver's configuration is authoritative — and is immutable for the
//! rest of the conversation.
//!
//! Unexpected frame kinds arriving mid-handshake are logged and dropped on
//! both sides; a stream that closes before the exchange completes is
//! [`HandshakeError::Failed`], and a client deadline that elapses first is
//! [`HandshakeError::Timeout`].

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::Duration;

use crate::packet::{Packet, PacketKind};
use crate::stream::{PacketStream, StreamError};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can arise during size negotiation.
#[derive(Debug)]
pub enum HandshakeError {
    /// The stream closed, or the peer's response was unusable, before a
    /// maximum segment size was established.
    Failed,
    /// The configured deadline elapsed before the response arrived.
    Timeout,
    /// Underlying I/O error from the OS.
    Io(std::io::Error),
}

impl std::fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Failed => write!(f, "handshake failed before a segment size was established"),
            Self::Timeout => write!(f, "handshake timed out"),
            Self::Io(e) => write!(f, "handshake I/O error: {e}"),
        }
    }
}

impl std::error::Error for HandshakeError {}

impl From<StreamError> for HandshakeError {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::Closed => Self::Failed,
            StreamError::Io(e) => Self::Io(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Client side
// ---------------------------------------------------------------------------

/// Send `SIZE_REQUEST` and wait for the peer's `SIZE_RESPONSE`.
///
/// Returns the peer's maximum segment size.  `deadline` bounds the whole
/// exchange; `None` waits indefinitely.
pub async fn request_segment_size<T: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut PacketStream<T>,
    deadline: Option<Duration>,
) -> Result<u16, HandshakeError> {
    stream.send(&Packet::size_request()).await?;
    log::debug!("[handshake] → SIZE_REQUEST");

    let response = await_size_response(stream);
    match deadline {
        Some(limit) => tokio::time::timeout(limit, response)
            .await
            .map_err(|_elapsed| HandshakeError::Timeout)?,
        None => response.await,
    }
}

async fn await_size_response<T: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut PacketStream<T>,
) -> Result<u16, HandshakeError> {
    loop {
        let packet = stream.read_packet().await?;
        if packet.kind != PacketKind::SizeResponse {
            log::warn!("[handshake] dropping unexpected {} frame", packet.kind);
            continue;
        }
        let Some(size) = parse_size_response(&packet.payload) else {
            log::warn!(
                "[handshake] unusable SIZE_RESPONSE payload ({} bytes)",
                packet.payload.len()
            );
            return Err(HandshakeError::Failed);
        };
        log::debug!("[handshake] ← SIZE_RESPONSE max_segment_size={size}");
        return Ok(size);
    }
}

/// Extract a usable maximum segment size from a `SIZE_RESPONSE` payload:
/// a 4-byte big-endian integer in `1..=65535` (the codec's length-field
/// bound).
fn parse_size_response(payload: &[u8]) -> Option<u16> {
    let bytes: [u8; 4] = payload.try_into().ok()?;
    let size = u32::from_be_bytes(bytes);
    if size == 0 || size > u16::MAX as u32 {
        return None;
    }
    Some(size as u16)
}

// ---------------------------------------------------------------------------
// Server side
// ---------------------------------------------------------------------------

/// Wait for the peer's `SIZE_REQUEST` and answer with `max_segment_size`.
pub async fn answer_segment_size<T: AsyncRead + AsyncWrite + Unpin>(
    stream: &mut PacketStream<T>,
    max_segment_size: u16,
) -> Result<(), HandshakeError> {
    loop {
        let packet = stream.read_packet().await?;
        if packet.kind != PacketKind::SizeRequest {
            log::warn!("[handshake] dropping unexpected {} frame", packet.kind);
            continue;
        }
        log::debug!("[handshake] ← SIZE_REQUEST; → SIZE_RESPONSE max_segment_size={max_segment_size}");
        stream.send(&Packet::size_response(max_segment_size as u32)).await?;
        return Ok(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_valid_sizes() {
        assert_eq!(parse_size_response(&400u32.to_be_bytes()), Some(400));
        assert_eq!(parse_size_response(&1u32.to_be_bytes()), Some(1));
        assert_eq!(parse_size_response(&65_535u32.to_be_bytes()), Some(65_535));
    }

    #[test]
    fn parse_rejects_zero_and_oversized() {
        assert_eq!(parse_size_response(&0u32.to_be_bytes()), None);
        assert_eq!(parse_size_response(&65_536u32.to_be_bytes()), None);
    }

    #[test]
    fn parse_rejects_wrong_payload_length() {
        assert_eq!(parse_size_response(b""), None);
        assert_eq!(parse_size_response(b"ab"), None);
        assert_eq!(parse_size_response(b"abcde"), None);
    }
}
