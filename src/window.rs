//! Sliding-window send-side state machine.
//!
//! [`SlidingWindow`] owns the segment set for one outgoing message and
//! tracks which segments are in flight.  Up to `window_size` segments may be
//! outstanding simultaneously.
//!
//! # Protocol contract
//!
//! - Sequence numbers count whole segments: segment `i` of the message
//!   carries sequence number `i`, for `i` in `0..N`.
//! - ACKs are **cumulative**: `seq = k` means every segment up to and
//!   including `k` has been received, so `base` advances to `k + 1`.
//! - On timeout, the caller retransmits **all** unacked segments from `base`
//!   onwards (go back N), obtained from [`SlidingWindow::unacked_packets`].
//! - The transfer is complete when `base == N`.
//!
//! This module only manages state; all I/O and timing are the caller's
//! responsibility ([`crate::sender`] owns the actual event loop).

use crate::packet::Packet;

// ---------------------------------------------------------------------------
// Segmentation
// ---------------------------------------------------------------------------

/// Split `message` into the ordered segment set for one transfer.
///
/// Produces `ceil(len / max_segment_size)` chunks; every chunk except
/// possibly the last is exactly `max_segment_size` bytes, and concatenating
/// the chunks in order reproduces `message` byte for byte.
pub fn segment_message(message: &[u8], max_segment_size: usize) -> Vec<Vec<u8>> {
    assert!(max_segment_size >= 1, "max_segment_size must be at least 1");
    message
        .chunks(max_segment_size)
        .map(|chunk| chunk.to_vec())
        .collect()
}

// ---------------------------------------------------------------------------
// SlidingWindow
// ---------------------------------------------------------------------------

/// Send-side window state for one message transfer.
///
/// # Sequence-number layout
///
/// ```text
///       base         next_to_send
///        │                │
///  ──────┼────────────────┼──────────────────▶ segment index
///        │ <─ in flight ─▶│ <── sendable ───▶        (capped at N)
/// ```
#[derive(Debug)]
pub struct SlidingWindow {
    /// The complete segment set, indexed by sequence number.  Immutable for
    /// the lifetime of the transfer; retransmissions rebuild packets from it.
    segments: Vec<Vec<u8>>,

    /// Sequence number of the **oldest** unacked segment (left window edge).
    base: u32,

    /// Sequence number of the **next** segment not yet transmitted.
    next_to_send: u32,

    /// Maximum number of segments that may be in flight simultaneously.
    window_size: u32,
}

impl SlidingWindow {
    /// Create a new [`SlidingWindow`] over `segments`.
    ///
    /// `window_size` must be ≥ 1.  A window larger than the segment count is
    /// fine; the send limit is capped at `N` regardless.
    pub fn new(segments: Vec<Vec<u8>>, window_size: u32) -> Self {
        assert!(window_size >= 1, "window_size must be at least 1");
        Self {
            segments,
            base: 0,
            next_to_send: 0,
            window_size,
        }
    }

    /// Total number of segments in the transfer (N).
    pub fn total_segments(&self) -> u32 {
        self.segments.len() as u32
    }

    /// Oldest unacked sequence number.
    pub fn base(&self) -> u32 {
        self.base
    }

    /// Next sequence number not yet transmitted.
    pub fn next_to_send(&self) -> u32 {
        self.next_to_send
    }

    /// Number of segments currently awaiting acknowledgment.
    pub fn in_flight(&self) -> u32 {
        self.next_to_send - self.base
    }

    /// `true` once every segment has been acknowledged (`base == N`).
    pub fn is_complete(&self) -> bool {
        self.base == self.total_segments()
    }

    /// `true` while the window has room for another transmission.
    pub fn can_send(&self) -> bool {
        self.next_to_send < self.send_limit()
    }

    /// Exclusive upper bound on `next_to_send`: `min(base + window_size, N)`.
    fn send_limit(&self) -> u32 {
        self.base
            .saturating_add(self.window_size)
            .min(self.total_segments())
    }

    /// Build the DATA packet for the next untransmitted segment and advance
    /// `next_to_send`, or return `None` when the window is full or every
    /// segment has been sent.
    ///
    /// The caller drains this in a loop to fill the window eagerly.
    pub fn next_packet(&mut self) -> Option<Packet> {
        if !self.can_send() {
            return None;
        }
        let seq = self.next_to_send;
        self.next_to_send += 1;
        Some(Packet::data(seq, self.segments[seq as usize].clone()))
    }

    /// Process a cumulative ACK for sequence number `seq`.
    ///
    /// Returns `true` when the window advanced (`seq >= base`), in which
    /// case `base` becomes `seq + 1` and the caller should cancel the
    /// retransmission timer, refill the window, and re-arm.  Stale ACKs
    /// (`seq < base`) and ACKs for segments never sent (`seq >=
    /// next_to_send`) return `false` and leave the state untouched.
    pub fn on_ack(&mut self, seq: u32) -> bool {
        if seq < self.base {
            return false;
        }
        if seq >= self.next_to_send {
            // A conforming peer cannot ack what was never sent.
            return false;
        }
        self.base = seq + 1;
        true
    }

    /// Rebuild the DATA packets for every in-flight segment, oldest first.
    ///
    /// Used by the conversation driver to retransmit the whole unacked
    /// prefix of the window on timeout (the "go back N" step).
    pub fn unacked_packets(&self) -> impl Iterator<Item = Packet> + '_ {
        (self.base..self.next_to_send)
            .map(|seq| Packet::data(seq, self.segments[seq as usize].clone()))
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
