//! Retransmission-deadline management.
//!
//! Reliable delivery requires that unacknowledged segments are re-sent if no
//! ACK arrives within the configured timeout.  [`RetransmitTimer`] tracks
//! that single deadline as plain state — armed or cancelled, with an
//! absolute expiry instant — decoupled from any sleep primitive, so the
//! deadline logic is testable without a socket or a running event loop.
//!
//! The conversation driver ([`crate::sender`]) owns the one `sleep` future
//! and re-arms it from [`RetransmitTimer::deadline`] before every poll; a
//! cancelled timer therefore can never fire a stale retransmission.  The
//! deadline is always anchored at the oldest unacked segment: it exists only
//! while something is in flight, and acknowledgment progress cancels and
//! re-arms it from scratch.
//!
//! The timeout is a fixed configured duration for the whole conversation;
//! there is no round-trip-time estimation or back-off.

use tokio::time::{Duration, Instant};

/// The retransmission deadline for one conversation.
#[derive(Debug)]
pub struct RetransmitTimer {
    /// Configured timeout, constant for the conversation.
    period: Duration,
    /// Absolute expiry of the active deadline, or `None` when cancelled.
    deadline: Option<Instant>,
}

impl RetransmitTimer {
    /// Create a cancelled timer that will arm for `period` at a time.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: None,
        }
    }

    /// Configured timeout duration.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Arm the timer: the deadline becomes `now + period`.
    ///
    /// Re-arming an already-armed timer replaces the deadline, which is how
    /// expiry hands itself a fresh full period after retransmitting.
    pub fn arm(&mut self, now: Instant) {
        self.deadline = Some(now + self.period);
    }

    /// Cancel the active deadline, if any.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// `true` while a deadline is pending.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The pending absolute deadline, or `None` when cancelled.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// `true` when the timer is armed and its deadline has passed.
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline.is_some_and(|d| now >= d)
    }
}
