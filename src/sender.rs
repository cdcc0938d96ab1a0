//! Sending-side conversation driver.
//!
//! [`Sender`] runs one complete client-role conversation over an
//! established stream:
//!
//! 1. `NEGOTIATING` — learn the maximum segment size via the handshake.
//! 2. `TRANSMITTING` — split the message into the segment set, then drive
//!    the window/timer loop: fill the window eagerly, block on whichever
//!    comes first of "next inbound packet" and "retransmission deadline",
//!    and on expiry resend every unacked segment (go back N).
//! 3. `COMPLETE` — every segment acknowledged (`base == N`).
//!
//! The loop is the single serialization point for the window and the timer:
//! both an inbound ACK and a deadline expiry are observed by the same task,
//! and the deadline passed to the bounded read is recomputed from the timer
//! state on every iteration, so an ACK that cancels the timer can never be
//! followed by a stale retransmission.

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::time::{timeout_at, Duration, Instant};

use crate::config::SenderConfig;
use crate::error::TransferError;
use crate::handshake;
use crate::packet::PacketKind;
use crate::state::SenderState;
use crate::stream::PacketStream;
use crate::timer::RetransmitTimer;
use crate::window::{segment_message, SlidingWindow};

/// Stand-in deadline while the timer is cancelled; never elapses in practice.
const FAR_FUTURE: Duration = Duration::from_secs(365 * 24 * 3600);

/// Outcome of a completed sending conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendSummary {
    /// Number of segments the message was split into (N).
    pub segments: u32,
    /// Total DATA frames resent by go-back-N timeouts.
    pub retransmissions: u32,
    /// Segment size learned from the peer during the handshake.
    pub max_segment_size: u16,
}

/// Client-role conversation state for one message transfer.
pub struct Sender<T> {
    stream: PacketStream<T>,
    config: SenderConfig,
    /// Current FSM state; [`SenderState::Complete`] after a successful run.
    pub state: SenderState,
}

impl<T: AsyncRead + AsyncWrite + Unpin> Sender<T> {
    /// Wrap an established byte stream and validated settings.
    pub fn new(io: T, config: SenderConfig) -> Self {
        Self {
            stream: PacketStream::new(io),
            config,
            state: SenderState::Negotiating,
        }
    }

    /// Run the conversation to completion.
    ///
    /// Returns once every segment is acknowledged, or with the first fatal
    /// error (handshake failure/timeout, transport closed).
    pub async fn run(&mut self) -> Result<SendSummary, TransferError> {
        debug_assert_eq!(self.state, SenderState::Negotiating);

        // The retransmission timeout doubles as the handshake deadline.
        let max_segment_size =
            handshake::request_segment_size(&mut self.stream, Some(self.config.timeout)).await?;

        let segments = segment_message(self.config.message.as_bytes(), max_segment_size as usize);
        let mut window = SlidingWindow::new(segments, self.config.window_size);
        let mut timer = RetransmitTimer::new(self.config.timeout);
        self.state = SenderState::Transmitting;
        log::info!(
            "[send] {} → {} segment(s) of ≤{} byte(s), window={}",
            self.state,
            window.total_segments(),
            max_segment_size,
            self.config.window_size
        );

        let mut retransmissions = 0u32;

        loop {
            // Fill the window eagerly: everything sendable goes out now.
            while let Some(packet) = window.next_packet() {
                log::debug!("[send] → DATA seq={} len={}", packet.seq, packet.payload.len());
                self.stream.send(&packet).await?;
            }

            // The deadline is anchored at `base`: armed whenever segments
            // are in flight and the timer is idle.
            if !timer.is_armed() && window.in_flight() > 0 {
                timer.arm(Instant::now());
            }

            if window.is_complete() {
                timer.cancel();
                break;
            }

            let wait_until = timer
                .deadline()
                .unwrap_or_else(|| Instant::now() + FAR_FUTURE);

            match timeout_at(wait_until, self.stream.read_packet()).await {
                Ok(Ok(packet)) => match packet.kind {
                    PacketKind::Ack => {
                        if window.on_ack(packet.seq) {
                            log::debug!(
                                "[send] ← ACK seq={} base={} in_flight={}",
                                packet.seq,
                                window.base(),
                                window.in_flight()
                            );
                            // Progress covers the timed segment; the loop
                            // top refills the window and re-arms afresh.
                            timer.cancel();
                        } else {
                            log::debug!(
                                "[send] ← ACK seq={} ignored (base={})",
                                packet.seq,
                                window.base()
                            );
                        }
                    }
                    other => log::warn!("[send] dropping unexpected {other} frame"),
                },
                Ok(Err(e)) => return Err(e.into()),
                Err(_elapsed) => {
                    // Go-Back-N: resend every unacked segment from base.
                    let count = window.in_flight();
                    log::debug!(
                        "[send] timeout — retransmitting {count} segment(s) from base={}",
                        window.base()
                    );
                    for packet in window.unacked_packets() {
                        self.stream.send(&packet).await?;
                    }
                    retransmissions += count;
                    timer.arm(Instant::now());
                }
            }
        }

        self.state = SenderState::Complete;
        let summary = SendSummary {
            segments: window.total_segments(),
            retransmissions,
            max_segment_size,
        };
        log::info!(
            "[send] {}: {} segment(s) delivered, {} retransmission(s)",
            self.state,
            summary.segments,
            summary.retransmissions
        );
        Ok(summary)
    }
}
