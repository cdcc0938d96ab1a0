//! Receiving-side conversation driver.
//!
//! [`Receiver`] runs one complete server-role conversation over an
//! established stream: answer the size handshake, then react to each
//! inbound DATA frame — deliver or buffer it through the
//! [`crate::reassembly::Reassembler`] and answer with exactly one
//! cumulative ACK — until the peer closes the stream.
//!
//! The sender closes its end once everything is acknowledged, so a clean
//! close with an empty reorder buffer is the successful end of the
//! conversation; a close that strands buffered out-of-order segments means
//! the transfer never completed and is reported as
//! [`TransferError::TransportClosed`].

use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::ReceiverConfig;
use crate::error::TransferError;
use crate::handshake;
use crate::packet::{Packet, PacketKind};
use crate::reassembly::Reassembler;
use crate::stream::{PacketStream, StreamError};

/// Server-role conversation state for one message transfer.
pub struct Receiver<T> {
    stream: PacketStream<T>,
    config: ReceiverConfig,
}

impl<T: AsyncRead + AsyncWrite + Unpin> Receiver<T> {
    /// Wrap an established byte stream and validated settings.
    pub fn new(io: T, config: ReceiverConfig) -> Self {
        Self {
            stream: PacketStream::new(io),
            config,
        }
    }

    /// Run the conversation to completion and return the assembled message.
    pub async fn run(&mut self) -> Result<Vec<u8>, TransferError> {
        handshake::answer_segment_size(&mut self.stream, self.config.max_segment_size).await?;

        let mut reassembler = Reassembler::new();
        let mut message = Vec::new();

        loop {
            let packet = match self.stream.read_packet().await {
                Ok(packet) => packet,
                Err(StreamError::Closed) => break,
                Err(e) => return Err(e.into()),
            };

            match packet.kind {
                PacketKind::Data => {
                    let seq = packet.seq;
                    let len = packet.payload.len();
                    let delivered = reassembler.on_data(seq, packet.payload);
                    log::debug!(
                        "[recv] ← DATA seq={seq} len={len} delivered={} next_expected={}",
                        delivered.len(),
                        reassembler.next_expected()
                    );
                    for payload in delivered {
                        message.extend_from_slice(&payload);
                    }

                    // Exactly one cumulative ACK per DATA frame, duplicates
                    // included; none exists until segment 0 has arrived.
                    if let Some(ack) = reassembler.ack_seq() {
                        log::debug!("[recv] → ACK seq={ack}");
                        self.stream.send(&Packet::ack(ack)).await?;
                    }
                }
                other => log::warn!("[recv] dropping unexpected {other} frame"),
            }
        }

        if !reassembler.is_drained() {
            log::warn!(
                "[recv] peer closed with {} out-of-order segment(s) stranded before seq {}",
                reassembler.pending_len(),
                reassembler.next_expected()
            );
            return Err(TransferError::TransportClosed);
        }

        log::info!(
            "[recv] conversation complete: {} segment(s), {} byte(s)",
            reassembler.next_expected(),
            message.len()
        );
        Ok(message)
    }
}
