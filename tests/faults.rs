//! Recovery tests under deterministic channel faults.
//!
//! All faults are injected on the sender's outbound path with counter-based
//! plans, so a failing run replays identically.  The drop and corrupt
//! periods are 7, which is larger than the window: a timeout cycle
//! retransmits at most `window_size` (5) datagrams, so no period-multiple
//! can line up with a whole retransmission batch and mangle the same
//! head-of-window segment every cycle.  A period that divides the batch
//! size would livelock the transfer: the receiver would discard the same
//! retransmitted segment forever and keep re-ACKing a stale value.  The
//! first fault also lands well past the SYN and ESTABLISH datagrams of a
//! clean handshake.

use std::net::SocketAddr;
use std::time::Duration;

use rdt_over_udp::faults::{FaultPlan, FaultyChannel};
use rdt_over_udp::state::SenderState;
use rdt_over_udp::stats::TransferStats;
use rdt_over_udp::{Channel, Receiver, Sender, TransportConfig, UdpChannel};

async fn ephemeral() -> UdpChannel {
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    UdpChannel::bind(addr).await.expect("bind failed")
}

fn fast_config() -> TransportConfig {
    TransportConfig {
        timeout: Duration::from_millis(50),
        ..Default::default()
    }
}

async fn spawn_receiver() -> (
    SocketAddr,
    tokio::task::JoinHandle<(Vec<u8>, Receiver<UdpChannel, TransferStats>)>,
) {
    let channel = ephemeral().await;
    let addr = channel.local_addr();
    let handle = tokio::spawn(async move {
        let mut receiver = Receiver::new(channel, TransferStats::new());
        let message = receiver.receive_message().await.expect("receive failed");
        (message, receiver)
    });
    (addr, handle)
}

fn test_message() -> Vec<u8> {
    (0..400).map(|i| i.to_string()).collect::<Vec<_>>().join(" ").into_bytes()
}

/// Dropping every 7th outbound datagram loses DATA segments, but
/// timeout-driven go-back-N retransmission still delivers the complete,
/// correctly ordered payload.
#[tokio::test]
async fn delivers_despite_periodic_drops() {
    let message = test_message();
    let (receiver_addr, receiver_task) = spawn_receiver().await;

    let lossy = FaultyChannel::new(ephemeral().await, FaultPlan::drop_every(7));
    let mut sender = Sender::new(lossy, receiver_addr, fast_config(), TransferStats::new());
    tokio::time::timeout(Duration::from_secs(30), sender.send_message(&message))
        .await
        .expect("transfer did not converge")
        .expect("send failed");

    assert_eq!(sender.state(), SenderState::Done);
    assert!(sender.channel().dropped() > 0, "plan never fired");
    assert!(
        sender.stats().retransmissions > 0,
        "drops must force retransmission"
    );

    let (received, _) = tokio::time::timeout(Duration::from_secs(5), receiver_task)
        .await
        .expect("receiver timed out")
        .expect("receiver task panicked");
    assert_eq!(received, message);
}

/// Duplicating every datagram re-delivers already-acknowledged segments.
/// The receiver must re-emit its cumulative ACK without re-advancing
/// `expected` or corrupting assembled data.
#[tokio::test]
async fn duplicated_datagrams_do_not_corrupt_delivery() {
    let message = test_message();
    let (receiver_addr, receiver_task) = spawn_receiver().await;

    let noisy = FaultyChannel::new(ephemeral().await, FaultPlan::duplicate_every(1));
    let mut sender = Sender::new(noisy, receiver_addr, fast_config(), TransferStats::new());
    tokio::time::timeout(Duration::from_secs(30), sender.send_message(&message))
        .await
        .expect("transfer did not converge")
        .expect("send failed");

    let (received, receiver) = tokio::time::timeout(Duration::from_secs(5), receiver_task)
        .await
        .expect("receiver timed out")
        .expect("receiver task panicked");
    assert_eq!(received, message);
    assert!(
        receiver.stats().duplicates_discarded > 0,
        "every DATA arrived twice; the copies must be discarded and re-ACKed"
    );
}

/// Corrupting every 7th outbound datagram: the additive checksum catches
/// each mangled DATA segment, the receiver drops it without an ACK, and the
/// window timeout recovers the loss.
#[tokio::test]
async fn corrupted_datagrams_are_detected_and_recovered() {
    let message = test_message();
    let (receiver_addr, receiver_task) = spawn_receiver().await;

    let noisy = FaultyChannel::new(ephemeral().await, FaultPlan::corrupt_every(7));
    let mut sender = Sender::new(noisy, receiver_addr, fast_config(), TransferStats::new());
    tokio::time::timeout(Duration::from_secs(30), sender.send_message(&message))
        .await
        .expect("transfer did not converge")
        .expect("send failed");

    let (received, receiver) = tokio::time::timeout(Duration::from_secs(5), receiver_task)
        .await
        .expect("receiver timed out")
        .expect("receiver task panicked");
    assert_eq!(received, message);
    assert!(
        receiver.stats().corrupt_discarded > 0,
        "the checksum must have rejected the mangled datagrams"
    );
}
