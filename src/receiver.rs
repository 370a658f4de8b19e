//! Responder (passive opener) endpoint.
//!
//! [`Receiver`] answers one connection:
//!
//! 1. **Listening**: wait for a checksum-valid SYN, reply SYN_ACK, and pin
//!    the peer address; every later datagram from another address is
//!    ignored.
//! 2. **AwaitEstablish**: wait for the ESTABLISH packet whose `ack` field
//!    carries the total segment count.  A retransmitted SYN here means our
//!    SYN_ACK was lost, so it is answered again; anything else is logged
//!    and ignored without advancing the state.
//! 3. **Receiving**: accept in-order DATA, discard duplicates and
//!    out-of-order segments, and answer every DATA packet with a cumulative
//!    ACK.  Corrupt datagrams are dropped *without* an ACK; the sender's
//!    timeout is the recovery path.
//!
//! A passive responder has no retransmission obligation of its own, so the
//! receive loop blocks without a timeout.  The returned future is
//! cancel-safe; layer `tokio::time::timeout` on top for an overall
//! deadline.

use std::net::SocketAddr;

use crate::channel::Channel;
use crate::config::MAX_DATAGRAM;
use crate::error::TransportError;
use crate::packet::{Packet, PacketType};
use crate::reassembly::ReassemblyBuffer;
use crate::state::ReceiverState;
use crate::stats::StatsSink;

/// The receiving endpoint of one connection.
///
/// The responder has no tunables: the window lives on the sending side and
/// the passive role never arms a timeout, so no [`TransportConfig`] is
/// taken.
///
/// [`TransportConfig`]: crate::config::TransportConfig
pub struct Receiver<C, S> {
    channel: C,
    state: ReceiverState,
    stats: S,
    peer: Option<SocketAddr>,
}

impl<C: Channel, S: StatsSink> Receiver<C, S> {
    pub fn new(channel: C, stats: S) -> Self {
        Self {
            channel,
            state: ReceiverState::Listening,
            stats,
            peer: None,
        }
    }

    pub fn state(&self) -> ReceiverState {
        self.state
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn stats(&self) -> &S {
        &self.stats
    }

    /// Address of the connected peer, once the handshake has started.
    pub fn peer(&self) -> Option<SocketAddr> {
        self.peer
    }

    /// Answer one handshake and receive one complete message.
    ///
    /// Returns the reassembled payload bytes, which may be empty when the
    /// peer announced a zero-segment transfer.
    pub async fn receive_message(&mut self) -> Result<Vec<u8>, TransportError> {
        if self.state != ReceiverState::Listening {
            return Err(TransportError::BadState);
        }

        let peer = self.listen().await?;
        self.peer = Some(peer);
        self.state = ReceiverState::AwaitEstablish;

        let total = self.await_establish(peer).await?;
        self.state = ReceiverState::Receiving;
        log::debug!("[receiver] established with {peer}; expecting {} segment(s)", total - 1);

        let message = self.receive_segments(peer, total).await?;
        self.state = ReceiverState::Done;
        log::info!(
            "[receiver] transfer complete: {} byte(s) reassembled from {peer}",
            message.len()
        );
        Ok(message)
    }

    /// Block until a valid SYN arrives, answer it, and return the peer.
    async fn listen(&mut self) -> Result<SocketAddr, TransportError> {
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            let (n, addr) = self.channel.recv_from(&mut buf).await?;
            match Packet::decode(&buf[..n]) {
                Err(e) => {
                    self.stats.on_corrupt_discarded();
                    log::debug!("[receiver] discarding corrupt datagram while listening: {e}");
                }
                Ok(pkt) if pkt.kind == PacketType::Syn => {
                    log::debug!("[receiver] ← SYN from {addr}; → SYN_ACK");
                    self.send_syn_ack(addr).await?;
                    return Ok(addr);
                }
                Ok(pkt) => {
                    log::warn!("[receiver] unexpected {} from {addr} while listening", pkt.kind);
                }
            }
        }
    }

    /// Block until the ESTABLISH packet delivers the total segment count.
    async fn await_establish(&mut self, peer: SocketAddr) -> Result<u16, TransportError> {
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            let (n, addr) = self.channel.recv_from(&mut buf).await?;
            if addr != peer {
                continue;
            }
            match Packet::decode(&buf[..n]) {
                Err(e) => {
                    self.stats.on_corrupt_discarded();
                    log::debug!("[receiver] discarding corrupt datagram before establish: {e}");
                }
                Ok(pkt) if pkt.kind == PacketType::Establish => {
                    log::debug!("[receiver] ← ESTABLISH total={}", pkt.ack);
                    // `ack` is the exclusive index bound; at least the
                    // reserved index 0 always exists.
                    return Ok(pkt.ack.max(1));
                }
                Ok(pkt) if pkt.kind == PacketType::Syn => {
                    // Our SYN_ACK was lost and the peer retried; answer
                    // again without changing state.
                    log::debug!("[receiver] ← duplicate SYN; → SYN_ACK again");
                    self.send_syn_ack(peer).await?;
                }
                Ok(pkt) => {
                    log::warn!("[receiver] unexpected {} before establish", pkt.kind);
                }
            }
        }
    }

    /// The in-order delivery + cumulative-ACK loop.
    async fn receive_segments(
        &mut self,
        peer: SocketAddr,
        total: u16,
    ) -> Result<Vec<u8>, TransportError> {
        let mut buffer = ReassemblyBuffer::new(total);
        let mut buf = [0u8; MAX_DATAGRAM];

        while !buffer.is_complete() {
            let (n, addr) = self.channel.recv_from(&mut buf).await?;
            if addr != peer {
                continue;
            }

            let pkt = match Packet::decode(&buf[..n]) {
                Err(e) => {
                    // No ACK for a corrupt datagram: the sender times out
                    // and retransmits.
                    self.stats.on_corrupt_discarded();
                    log::debug!("[receiver] discarding corrupt datagram: {e}");
                    continue;
                }
                Ok(pkt) => pkt,
            };
            if pkt.kind != PacketType::Data {
                log::debug!("[receiver] ignoring {} during transfer", pkt.kind);
                continue;
            }

            if buffer.on_data(pkt.seq, &pkt.payload) {
                log::debug!(
                    "[receiver] ← DATA seq={} len={}; → ACK {}",
                    pkt.seq,
                    pkt.payload.len(),
                    buffer.ack_value()
                );
            } else {
                self.stats.on_duplicate_discarded();
                log::debug!(
                    "[receiver] ← out-of-order/duplicate seq={} (expecting {}); → ACK {} again",
                    pkt.seq,
                    buffer.expected(),
                    buffer.ack_value()
                );
            }
            // Cumulative ACK after every DATA packet, accepted or not.
            let ack = Packet::control(PacketType::Ack, 0, buffer.ack_value()).encode();
            self.channel.send_to(&ack, peer).await?;
        }

        buffer.into_message()
    }

    async fn send_syn_ack(&self, dest: SocketAddr) -> Result<(), TransportError> {
        let syn_ack = Packet::control(PacketType::SynAck, 0, 0).encode();
        self.channel.send_to(&syn_ack, dest).await?;
        Ok(())
    }
}
