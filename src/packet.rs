//! Wire-format definitions for protocol frames.
//!
//! Every message exchanged between peers is a [`Packet`].  This module is
//! responsible for:
//! - Defining the on-wire binary layout (kind tag, sequence number, payload).
//! - Serialising a [`Packet`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Packet`], returning errors
//!   for malformed input.
//!
//! No I/O happens here — this is pure data transformation.  Framing over the
//! byte stream (waiting until a whole frame has arrived) is the caller's
//! job; [`Packet::frame_len`] tells it how many bytes the next frame needs.
//! The codec also never validates sequence-number ordering.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     Kind      |                Sequence Number                |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     (seq)     |         Payload Length        |  Payload ...  |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Total header size: [`HEADER_LEN`] = 7 bytes.
//! kind(1) + seq(4) + payload_len(2)
//!
//! The sequence number counts whole segments, not bytes, and is meaningful
//! only for [`PacketKind::Data`] and [`PacketKind::Ack`]; the control kinds
//! carry zero.  The 2-byte length field caps a payload at 65 535 bytes; the
//! configuration layer keeps the negotiated segment size within that bound.

/// Byte length of the fixed-size header on the wire.
pub const HEADER_LEN: usize = 7;

// Byte offsets of each field within the serialised header.
const OFF_KIND: usize = 0;
const OFF_SEQ: usize = 1;
const OFF_PAYLOAD_LEN: usize = 5;

/// Discriminates the four frame kinds on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    /// One segment of the message being transferred.
    Data,
    /// Cumulative acknowledgment: every segment up to and including `seq`
    /// has been received.
    Ack,
    /// Asks the peer for its configured maximum segment size.
    SizeRequest,
    /// Answers a [`PacketKind::SizeRequest`]; the payload is the size as a
    /// 4-byte big-endian integer.
    SizeResponse,
}

impl PacketKind {
    /// On-wire tag value.
    pub fn tag(self) -> u8 {
        match self {
            Self::Data => 0,
            Self::Ack => 1,
            Self::SizeRequest => 2,
            Self::SizeResponse => 3,
        }
    }

    /// Parse an on-wire tag.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Data),
            1 => Some(Self::Ack),
            2 => Some(Self::SizeRequest),
            3 => Some(Self::SizeResponse),
            _ => None,
        }
    }
}

impl std::fmt::Display for PacketKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Data => "DATA",
            Self::Ack => "ACK",
            Self::SizeRequest => "SIZE_REQUEST",
            Self::SizeResponse => "SIZE_RESPONSE",
        };
        f.write_str(s)
    }
}

/// A complete protocol frame: kind, sequence number, payload bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub kind: PacketKind,
    /// Segment index for [`PacketKind::Data`], highest contiguously received
    /// segment index for [`PacketKind::Ack`], zero otherwise.
    pub seq: u32,
    pub payload: Vec<u8>,
}

impl Packet {
    /// Build a DATA frame carrying one segment.
    pub fn data(seq: u32, payload: Vec<u8>) -> Self {
        Self {
            kind: PacketKind::Data,
            seq,
            payload,
        }
    }

    /// Build a cumulative ACK frame.
    pub fn ack(seq: u32) -> Self {
        Self {
            kind: PacketKind::Ack,
            seq,
            payload: Vec::new(),
        }
    }

    /// Build the handshake request frame.
    pub fn size_request() -> Self {
        Self {
            kind: PacketKind::SizeRequest,
            seq: 0,
            payload: Vec::new(),
        }
    }

    /// Build the handshake response frame carrying `max_segment_size`.
    pub fn size_response(max_segment_size: u32) -> Self {
        Self {
            kind: PacketKind::SizeResponse,
            seq: 0,
            payload: max_segment_size.to_be_bytes().to_vec(),
        }
    }

    /// Serialise this packet into a newly allocated byte vector.
    ///
    /// The length field is computed from the actual payload.
    pub fn encode(&self) -> Vec<u8> {
        let payload_len = self.payload.len();
        debug_assert!(payload_len <= u16::MAX as usize, "payload exceeds length field");

        let mut buf = vec![0u8; HEADER_LEN + payload_len];
        buf[OFF_KIND] = self.kind.tag();
        buf[OFF_SEQ..OFF_SEQ + 4].copy_from_slice(&self.seq.to_be_bytes());
        buf[OFF_PAYLOAD_LEN..OFF_PAYLOAD_LEN + 2]
            .copy_from_slice(&(payload_len as u16).to_be_bytes());
        buf[HEADER_LEN..].copy_from_slice(&self.payload);
        buf
    }

    /// Parse a [`Packet`] from a raw byte slice holding exactly one frame.
    ///
    /// Returns [`Err`] if:
    /// - `buf` is shorter than [`HEADER_LEN`],
    /// - the kind tag is unrecognized, or
    /// - the `payload_len` field disagrees with `buf.len()`.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < HEADER_LEN {
            return Err(PacketError::Truncated);
        }

        let kind =
            PacketKind::from_tag(buf[OFF_KIND]).ok_or(PacketError::UnknownKind(buf[OFF_KIND]))?;
        let seq = u32::from_be_bytes(buf[OFF_SEQ..OFF_SEQ + 4].try_into().unwrap());
        let payload_len =
            u16::from_be_bytes(buf[OFF_PAYLOAD_LEN..OFF_PAYLOAD_LEN + 2].try_into().unwrap());

        if buf.len() != HEADER_LEN + payload_len as usize {
            return Err(PacketError::LengthMismatch {
                declared: payload_len,
                available: buf.len() - HEADER_LEN,
            });
        }

        Ok(Packet {
            kind,
            seq,
            payload: buf[HEADER_LEN..].to_vec(),
        })
    }

    /// Total on-wire length of the frame starting at `buf[0]`, or `None`
    /// when fewer than [`HEADER_LEN`] bytes are buffered so far.
    ///
    /// This is how a streaming caller frames the byte stream: accumulate
    /// bytes until `frame_len` returns `Some(n)` and at least `n` bytes are
    /// buffered, then hand exactly those `n` bytes to [`Packet::decode`].
    /// The length is read without validating the kind tag, so even an
    /// unrecognized frame can be skipped by its declared length.
    pub fn frame_len(buf: &[u8]) -> Option<usize> {
        if buf.len() < HEADER_LEN {
            return None;
        }
        let payload_len =
            u16::from_be_bytes(buf[OFF_PAYLOAD_LEN..OFF_PAYLOAD_LEN + 2].try_into().unwrap());
        Some(HEADER_LEN + payload_len as usize)
    }
}

/// Errors that can arise when parsing a raw frame.
#[derive(Debug, PartialEq, Eq)]
pub enum PacketError {
    /// Buffer shorter than the fixed header size.
    Truncated,
    /// Kind tag does not name any known frame kind.
    UnknownKind(u8),
    /// `payload_len` field does not match the bytes actually present.
    LengthMismatch { declared: u16, available: usize },
}

impl std::fmt::Display for PacketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketError::Truncated => write!(f, "buffer too short to contain a header"),
            PacketError::UnknownKind(tag) => write!(f, "unrecognized packet kind tag {tag:#04x}"),
            PacketError::LengthMismatch { declared, available } => write!(
                f,
                "payload length field declares {declared} bytes but {available} are present"
            ),
        }
    }
}

impl std::error::Error for PacketError {}
