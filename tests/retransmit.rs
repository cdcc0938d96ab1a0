//! Scripted-peer conversation tests over an in-process duplex pipe.
//!
//! The peer side is driven by hand, frame by frame, so loss, duplication,
//! and silence are deterministic.  Timer-driven paths run under
//! `start_paused` so the retransmission deadline fires without real waiting.

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::time::{Duration, Instant};

use rdt_over_tcp::config::{ReceiverConfig, SenderConfig};
use rdt_over_tcp::error::TransferError;
use rdt_over_tcp::packet::{Packet, PacketKind, HEADER_LEN};
use rdt_over_tcp::receiver::Receiver;
use rdt_over_tcp::sender::Sender;
use rdt_over_tcp::state::SenderState;
use rdt_over_tcp::stream::PacketStream;

fn pipe() -> (DuplexStream, DuplexStream) {
    tokio::io::duplex(64 * 1024)
}

// ---------------------------------------------------------------------------
// Test 1: the canonical lost-segment walkthrough
// ---------------------------------------------------------------------------

/// 80-byte message, 20-byte segments, window 4, 5-second timeout.  The peer
/// "loses" M1: it acks M0, then re-acks 0 for the out-of-order M2 and M3.
/// After one timeout the client must resend exactly M1, M2, M3 and finish
/// once the full prefix is acknowledged.
#[tokio::test(start_paused = true)]
async fn lost_segment_triggers_go_back_n() {
    let (client_io, peer_io) = pipe();
    let mut peer = PacketStream::new(peer_io);

    let client = tokio::spawn(async move {
        let config = SenderConfig::new("b".repeat(80), 4, 5).unwrap();
        let mut sender = Sender::new(client_io, config);
        let summary = sender.run().await.expect("sender failed");
        (summary, sender.state)
    });

    // Handshake.
    assert_eq!(peer.read_packet().await.unwrap(), Packet::size_request());
    peer.send(&Packet::size_response(20)).await.unwrap();

    // Window ≥ N, so all four segments arrive immediately.
    let mut first = Vec::new();
    for _ in 0..4 {
        first.push(peer.read_packet().await.unwrap());
    }
    assert_eq!(first.iter().map(|p| p.seq).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    assert!(first.iter().all(|p| p.kind == PacketKind::Data && p.payload.len() == 20));

    // M1 never made it: ack progress the way a real receiver would —
    // ACK 0 for M0, ACK 0 again for each of the out-of-order M2 and M3.
    let acked_at = Instant::now();
    for _ in 0..3 {
        peer.send(&Packet::ack(0)).await.unwrap();
    }

    // Nothing more may arrive until the deadline fires; then the client
    // resends exactly the unacked prefix M1..M3, nothing else.
    let mut resent = Vec::new();
    for _ in 0..3 {
        resent.push(peer.read_packet().await.unwrap());
    }
    assert!(Instant::now() - acked_at >= Duration::from_secs(5));
    assert_eq!(resent.iter().map(|p| p.seq).collect::<Vec<_>>(), vec![1, 2, 3]);

    // With M1 in hand the receiver's buffer drains through M3.
    peer.send(&Packet::ack(3)).await.unwrap();

    let (summary, state) = client.await.unwrap();
    assert_eq!(state, SenderState::Complete);
    assert_eq!(summary.segments, 4);
    assert_eq!(summary.max_segment_size, 20);
    assert_eq!(summary.retransmissions, 3);
}

// ---------------------------------------------------------------------------
// Test 2: the timer re-arms with the same fixed period
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn silent_peer_causes_full_window_retransmission_each_period() {
    let (client_io, peer_io) = pipe();
    let mut peer = PacketStream::new(peer_io);

    let client = tokio::spawn(async move {
        let config = SenderConfig::new("abcdef".to_string(), 2, 3).unwrap();
        let mut sender = Sender::new(client_io, config);
        sender.run().await.expect("sender failed")
    });

    assert_eq!(peer.read_packet().await.unwrap(), Packet::size_request());
    peer.send(&Packet::size_response(3)).await.unwrap();

    let started = Instant::now();

    // Initial transmission of both segments, then two silent timeouts:
    // every round must resend the whole window, three seconds apart.
    for round in 0..3 {
        let seqs = [
            peer.read_packet().await.unwrap().seq,
            peer.read_packet().await.unwrap().seq,
        ];
        assert_eq!(seqs, [0, 1], "round {round}");
        assert!(Instant::now() - started >= Duration::from_secs(3 * round));
    }

    // Acknowledge everything at once; the client completes.
    peer.send(&Packet::ack(1)).await.unwrap();

    let summary = client.await.unwrap();
    assert_eq!(summary.segments, 2);
    assert_eq!(summary.retransmissions, 4);
}

// ---------------------------------------------------------------------------
// Test 3: lost ACKs — redelivery is acked but not re-delivered
// ---------------------------------------------------------------------------

#[tokio::test]
async fn redelivered_segments_still_produce_acks() {
    let (scripted_io, server_io) = pipe();
    let mut scripted = PacketStream::new(scripted_io);

    let server = tokio::spawn(async move {
        Receiver::new(server_io, ReceiverConfig::new(4).unwrap())
            .run()
            .await
    });

    scripted.send(&Packet::size_request()).await.unwrap();
    assert_eq!(scripted.read_packet().await.unwrap(), Packet::size_response(4));

    // Deliver segment 0; the ACK for it is "lost", so the sender would
    // retransmit — the receiver must ack again without re-delivering.
    scripted.send(&Packet::data(0, b"abcd".to_vec())).await.unwrap();
    assert_eq!(scripted.read_packet().await.unwrap(), Packet::ack(0));
    scripted.send(&Packet::data(0, b"abcd".to_vec())).await.unwrap();
    assert_eq!(scripted.read_packet().await.unwrap(), Packet::ack(0));

    // An out-of-order segment is buffered and acked at current progress,
    // duplicates of it included.
    scripted.send(&Packet::data(2, b"ijkl".to_vec())).await.unwrap();
    assert_eq!(scripted.read_packet().await.unwrap(), Packet::ack(0));
    scripted.send(&Packet::data(2, b"ijkl".to_vec())).await.unwrap();
    assert_eq!(scripted.read_packet().await.unwrap(), Packet::ack(0));

    // The gap fills: one DATA, one ACK covering the drained run.
    scripted.send(&Packet::data(1, b"efgh".to_vec())).await.unwrap();
    assert_eq!(scripted.read_packet().await.unwrap(), Packet::ack(2));

    drop(scripted);
    let message = server.await.unwrap().expect("receiver failed");
    assert_eq!(message, b"abcdefghijkl");
}

// ---------------------------------------------------------------------------
// Test 4: no ACK exists before segment 0 has arrived
// ---------------------------------------------------------------------------

#[tokio::test]
async fn no_ack_before_first_segment_received() {
    let (scripted_io, server_io) = pipe();
    let mut scripted = PacketStream::new(scripted_io);

    let server = tokio::spawn(async move {
        Receiver::new(server_io, ReceiverConfig::new(8).unwrap())
            .run()
            .await
    });

    scripted.send(&Packet::size_request()).await.unwrap();
    assert_eq!(scripted.read_packet().await.unwrap(), Packet::size_response(8));

    // Segment 1 arrives first: buffered, but no ACK may be sent yet.
    scripted.send(&Packet::data(1, b"world".to_vec())).await.unwrap();
    // Segment 0 completes the prefix; the very next frame on the wire must
    // be the single ACK for the drained run — proving no ACK preceded it.
    scripted.send(&Packet::data(0, b"hello".to_vec())).await.unwrap();
    assert_eq!(scripted.read_packet().await.unwrap(), Packet::ack(1));

    drop(scripted);
    let message = server.await.unwrap().expect("receiver failed");
    assert_eq!(message, b"helloworld");
}

// ---------------------------------------------------------------------------
// Test 5: malformed frames are absorbed, not fatal
// ---------------------------------------------------------------------------

/// Read one frame from raw bytes, the way a scripted peer does when it also
/// needs to write raw (invalid) bytes.
async fn read_frame(io: &mut DuplexStream) -> Packet {
    let mut header = [0u8; HEADER_LEN];
    io.read_exact(&mut header).await.unwrap();
    let total = Packet::frame_len(&header).unwrap();
    let mut frame = header.to_vec();
    frame.resize(total, 0);
    io.read_exact(&mut frame[HEADER_LEN..]).await.unwrap();
    Packet::decode(&frame).unwrap()
}

#[tokio::test]
async fn malformed_frame_is_dropped_without_ack() {
    let (mut scripted, server_io) = pipe();

    let server = tokio::spawn(async move {
        Receiver::new(server_io, ReceiverConfig::new(8).unwrap())
            .run()
            .await
    });

    scripted.write_all(&Packet::size_request().encode()).await.unwrap();
    assert_eq!(read_frame(&mut scripted).await, Packet::size_response(8));

    scripted.write_all(&Packet::data(0, b"good".to_vec()).encode()).await.unwrap();
    assert_eq!(read_frame(&mut scripted).await, Packet::ack(0));

    // A frame with an unrecognized kind tag: dropped, no ACK, no teardown.
    let mut garbage = Packet::data(9, b"junk!".to_vec()).encode();
    garbage[0] = 0x6a;
    scripted.write_all(&garbage).await.unwrap();

    // The conversation continues: the next valid DATA gets the next ACK.
    scripted.write_all(&Packet::data(1, b"data".to_vec()).encode()).await.unwrap();
    assert_eq!(read_frame(&mut scripted).await, Packet::ack(1));

    drop(scripted);
    let message = server.await.unwrap().expect("receiver failed");
    assert_eq!(message, b"gooddata");
}

// ---------------------------------------------------------------------------
// Test 6: transport loss is fatal to whichever side observes it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn peer_hangup_mid_transfer_fails_the_sender() {
    let (client_io, peer_io) = pipe();
    let mut peer = PacketStream::new(peer_io);

    let client = tokio::spawn(async move {
        let config = SenderConfig::new("x".repeat(50), 2, 5).unwrap();
        let mut sender = Sender::new(client_io, config);
        let result = sender.run().await;
        (result, sender.state)
    });

    assert_eq!(peer.read_packet().await.unwrap(), Packet::size_request());
    peer.send(&Packet::size_response(10)).await.unwrap();

    // Take the first segment, then hang up with four still unacknowledged.
    let _ = peer.read_packet().await.unwrap();
    drop(peer);

    let (result, state) = client.await.unwrap();
    assert!(
        matches!(result, Err(TransferError::TransportClosed)),
        "expected TransportClosed, got: {result:?}"
    );
    assert_eq!(state, SenderState::Transmitting, "transfer must not report completion");
}

#[tokio::test]
async fn hangup_with_stranded_gap_fails_the_receiver() {
    let (scripted_io, server_io) = pipe();
    let mut scripted = PacketStream::new(scripted_io);

    let server = tokio::spawn(async move {
        Receiver::new(server_io, ReceiverConfig::new(8).unwrap())
            .run()
            .await
    });

    scripted.send(&Packet::size_request()).await.unwrap();
    assert_eq!(scripted.read_packet().await.unwrap(), Packet::size_response(8));

    // Only an out-of-order segment ever arrives; the prefix never completes.
    scripted.send(&Packet::data(3, b"tail".to_vec())).await.unwrap();
    drop(scripted);

    let result = server.await.unwrap();
    assert!(
        matches!(result, Err(TransferError::TransportClosed)),
        "expected TransportClosed, got: {result:?}"
    );
}
