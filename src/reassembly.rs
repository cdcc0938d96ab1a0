//! Receive-side reordering and cumulative-ACK state machine.
//!
//! [`Reassembler`] implements the receiver half of the protocol:
//!
//! - In-order segments (`seq == next_expected`) are delivered immediately,
//!   together with any buffered run they complete.
//! - Out-of-order segments (`seq > next_expected`) are buffered until the
//!   gap before them fills.
//! - Duplicates (`seq < next_expected`) are discarded without re-delivery.
//! - After **every** DATA segment the caller sends one cumulative ACK with
//!   [`Reassembler::ack_seq`] — the highest contiguously received sequence
//!   number — so the sender always learns current progress even from
//!   duplicates.  No ACK exists until segment 0 has arrived.
//!
//! This module only manages state; all socket I/O is the caller's
//! responsibility ([`crate::receiver`] owns the actual read loop).

use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Reassembler
// ---------------------------------------------------------------------------

/// Receive-side state for one message transfer.
#[derive(Debug, Default)]
pub struct Reassembler {
    /// Smallest sequence number not yet delivered to the application.
    next_expected: u32,

    /// Out-of-order segments received ahead of `next_expected`, keyed by
    /// sequence number.  Every key is `> next_expected`; a delivered
    /// sequence number never re-enters the map.
    pending: BTreeMap<u32, Vec<u8>>,
}

impl Reassembler {
    /// Create a new [`Reassembler`] expecting segment 0 first.
    pub fn new() -> Self {
        Self::default()
    }

    /// Smallest sequence number not yet delivered.
    pub fn next_expected(&self) -> u32 {
        self.next_expected
    }

    /// Number of out-of-order segments currently buffered.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// `true` when no out-of-order segments are waiting on a gap.
    pub fn is_drained(&self) -> bool {
        self.pending.is_empty()
    }

    /// Process an inbound DATA segment.
    ///
    /// Returns the payloads now deliverable to the application, in sequence
    /// order: empty for a duplicate or an out-of-order arrival, one or more
    /// payloads when `seq == next_expected` (the new segment plus any
    /// buffered run it completes).
    pub fn on_data(&mut self, seq: u32, payload: Vec<u8>) -> Vec<Vec<u8>> {
        let mut delivered = Vec::new();

        if seq < self.next_expected {
            // Duplicate of an already-delivered segment: drop the payload.
            // The caller still acks so the sender learns current progress.
            return delivered;
        }

        if seq == self.next_expected {
            delivered.push(payload);
            self.next_expected += 1;
            // Drain the run of buffered segments this arrival completed.
            while let Some(next) = self.pending.remove(&self.next_expected) {
                delivered.push(next);
                self.next_expected += 1;
            }
        } else {
            // Ahead of the gap: buffer, overwriting any duplicate so
            // repeated out-of-order arrivals do not grow the map.
            self.pending.insert(seq, payload);
        }

        delivered
    }

    /// Cumulative ACK sequence number to send after processing a segment:
    /// the highest contiguously received sequence number, or `None` while
    /// segment 0 has never arrived.
    pub fn ack_seq(&self) -> Option<u32> {
        self.next_expected.checked_sub(1)
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(i: u32) -> Vec<u8> {
        format!("segment-{i}").into_bytes()
    }

    #[test]
    fn initial_state_has_no_ack() {
        let r = Reassembler::new();
        assert_eq!(r.next_expected(), 0);
        assert_eq!(r.ack_seq(), None);
        assert!(r.is_drained());
    }

    #[test]
    fn in_order_segment_delivered_immediately() {
        let mut r = Reassembler::new();
        let delivered = r.on_data(0, seg(0));
        assert_eq!(delivered, vec![seg(0)]);
        assert_eq!(r.next_expected(), 1);
        assert_eq!(r.ack_seq(), Some(0));
    }

    #[test]
    fn out_of_order_segment_buffered_without_ack() {
        let mut r = Reassembler::new();
        let delivered = r.on_data(2, seg(2));
        assert!(delivered.is_empty());
        assert_eq!(r.next_expected(), 0);
        assert_eq!(r.ack_seq(), None, "no ack exists before segment 0 arrives");
        assert_eq!(r.pending_len(), 1);
    }

    #[test]
    fn gap_fill_drains_buffered_run() {
        let mut r = Reassembler::new();
        assert!(r.on_data(1, seg(1)).is_empty());
        assert!(r.on_data(2, seg(2)).is_empty());
        assert_eq!(r.ack_seq(), None);

        let delivered = r.on_data(0, seg(0));
        assert_eq!(delivered, vec![seg(0), seg(1), seg(2)]);
        assert_eq!(r.next_expected(), 3);
        assert_eq!(r.ack_seq(), Some(2));
        assert!(r.is_drained());
    }

    #[test]
    fn partial_drain_stops_at_next_gap() {
        let mut r = Reassembler::new();
        r.on_data(1, seg(1));
        r.on_data(3, seg(3)); // gap at 2 remains

        let delivered = r.on_data(0, seg(0));
        assert_eq!(delivered, vec![seg(0), seg(1)]);
        assert_eq!(r.ack_seq(), Some(1));
        assert_eq!(r.pending_len(), 1);
    }

    #[test]
    fn duplicate_of_delivered_segment_ignored_but_still_acked() {
        let mut r = Reassembler::new();
        r.on_data(0, seg(0));
        r.on_data(1, seg(1));

        let delivered = r.on_data(0, seg(0));
        assert!(delivered.is_empty());
        assert_eq!(r.next_expected(), 2, "duplicate must not move the window");
        assert_eq!(r.ack_seq(), Some(1), "ack still reports current progress");
    }

    #[test]
    fn duplicate_out_of_order_segment_does_not_grow_buffer() {
        let mut r = Reassembler::new();
        r.on_data(5, seg(5));
        r.on_data(5, seg(5));
        r.on_data(5, seg(5));
        assert_eq!(r.pending_len(), 1);
    }

    #[test]
    fn ack_is_monotonic_over_arbitrary_arrivals() {
        let mut r = Reassembler::new();
        let arrivals = [3u32, 0, 3, 1, 0, 5, 2, 2, 4, 1, 5];
        let mut last_ack = None;
        for seq in arrivals {
            r.on_data(seq, seg(seq));
            let ack = r.ack_seq();
            assert!(ack >= last_ack, "ack regressed: {ack:?} after {last_ack:?}");
            last_ack = ack;
        }
        assert_eq!(last_ack, Some(5));
        assert!(r.is_drained());
    }

    #[test]
    fn delivery_order_reconstructs_message() {
        let mut r = Reassembler::new();
        let mut message = Vec::new();
        for seq in [2u32, 0, 1, 4, 3] {
            for payload in r.on_data(seq, seg(seq)) {
                message.extend_from_slice(&payload);
            }
        }
        let expected: Vec<u8> = (0..5).flat_map(seg).collect();
        assert_eq!(message, expected);
    }
}
