//! `rdt-over-tcp` — reliable ordered data transfer layered on TCP.
//!
//! One message per conversation: the client learns the receiver's maximum
//! segment size, splits the message into numbered segments, and streams
//! them through a fixed-size sliding window with cumulative acknowledgments
//! and go-back-N retransmission on timeout.
//!
//! # Architecture
//!
//! ```text
//!   Sender (client)                         Receiver (server)
//!  ┌──────────────────┐   DATA seq=i      ┌───────────────────┐
//!  │ window + timer   │──────────────────▶│ reassembly + acks │
//!  │   (event loop)   │◀──────────────────│    (read loop)    │
//!  └────────┬─────────┘   ACK seq=k       └─────────┬─────────┘
//!           │                                       │
//!      ┌────▼──────┐                          ┌─────▼─────┐
//!      │ handshake │  SIZE_REQUEST/RESPONSE   │ handshake │
//!      └────┬──────┘                          └─────┬─────┘
//!           │                                       │
//!      ┌────▼───────────────────────────────────────▼─────┐
//!      │          PacketStream  (framing over TCP)        │
//!      └──────────────────────────────────────────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`packet`]     — wire format (serialise / deserialise)
//! - [`stream`]     — packet framing over an async byte stream
//! - [`window`]     — segmentation + sliding-window send state machine
//! - [`reassembly`] — reorder + cumulative-ACK receive state machine
//! - [`timer`]      — retransmission deadline, decoupled from I/O
//! - [`handshake`]  — one-shot maximum-segment-size exchange
//! - [`state`]      — sender finite-state-machine types
//! - [`sender`]     — client-role conversation driver
//! - [`receiver`]   — server-role conversation driver
//! - [`config`]     — configuration file parsing and validation
//! - [`error`]      — conversation-level error type

pub mod config;
pub mod error;
pub mod handshake;
pub mod packet;
pub mod reassembly;
pub mod receiver;
pub mod sender;
pub mod state;
pub mod stream;
pub mod timer;
pub mod window;
