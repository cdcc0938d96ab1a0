//! Packet-oriented adapter over a reliable byte stream.
//!
//! [`PacketStream`] is a thin wrapper around any async byte stream
//! (`tokio::net::TcpStream` in production, `tokio::io::duplex` in tests)
//! that speaks [`crate::packet::Packet`] instead of raw bytes.  All protocol
//! logic lives elsewhere; this module owns only byte I/O and framing:
//!
//! - Outbound packets are encoded and written whole.
//! - Inbound bytes accumulate in an internal buffer until a complete frame
//!   is present (a single `read` may deliver half a frame, or three), then
//!   exactly that frame is decoded.
//! - Malformed frames are logged and skipped by their declared length; the
//!   stream keeps delivering subsequent valid frames.
//! - End of stream surfaces as [`StreamError::Closed`], unblocking any
//!   pending read.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::packet::Packet;

/// Size of one read from the underlying stream.
const READ_CHUNK: usize = 4096;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can arise from packet-stream operations.
#[derive(Debug)]
pub enum StreamError {
    /// Underlying I/O error from the OS.
    Io(std::io::Error),
    /// The peer closed the stream; no further packets will arrive.
    Closed,
}

impl std::fmt::Display for StreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "stream I/O error: {e}"),
            Self::Closed => write!(f, "stream closed by peer"),
        }
    }
}

impl std::error::Error for StreamError {}

impl From<std::io::Error> for StreamError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

// ---------------------------------------------------------------------------
// PacketStream
// ---------------------------------------------------------------------------

/// An async, packet-oriented view of a reliable byte stream.
#[derive(Debug)]
pub struct PacketStream<T> {
    io: T,
    /// Bytes received but not yet consumed as a complete frame.
    buf: Vec<u8>,
}

impl<T: AsyncRead + AsyncWrite + Unpin> PacketStream<T> {
    /// Wrap an established byte stream.
    pub fn new(io: T) -> Self {
        Self {
            io,
            buf: Vec::new(),
        }
    }

    /// Encode `packet` and write it to the stream in full.
    pub async fn send(&mut self, packet: &Packet) -> Result<(), StreamError> {
        self.io.write_all(&packet.encode()).await?;
        self.io.flush().await?;
        Ok(())
    }

    /// Read the next valid packet from the stream.
    ///
    /// Buffers partial frames across reads.  Frames that fail to decode are
    /// dropped (skipped by their declared length) with a warning, and the
    /// read continues with the next frame.  Returns [`StreamError::Closed`]
    /// once the peer has closed the stream and the buffer holds no further
    /// complete frame.
    pub async fn read_packet(&mut self) -> Result<Packet, StreamError> {
        loop {
            if let Some(frame_len) = Packet::frame_len(&self.buf) {
                if self.buf.len() >= frame_len {
                    let frame: Vec<u8> = self.buf.drain(..frame_len).collect();
                    match Packet::decode(&frame) {
                        Ok(packet) => return Ok(packet),
                        Err(e) => {
                            log::warn!("dropping malformed {frame_len}-byte frame: {e}");
                            continue;
                        }
                    }
                }
            }

            let mut chunk = [0u8; READ_CHUNK];
            let n = self.io.read(&mut chunk).await?;
            if n == 0 {
                if !self.buf.is_empty() {
                    log::warn!(
                        "stream closed with {} buffered bytes of an incomplete frame",
                        self.buf.len()
                    );
                }
                return Err(StreamError::Closed);
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}
