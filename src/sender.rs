//! Initiator (active opener) endpoint.
//!
//! [`Sender`] drives one complete transfer:
//!
//! 1. **Handshake**: send SYN, await SYN_ACK within a bounded retry budget,
//!    then confirm with an ESTABLISH packet carrying the total segment
//!    count.
//! 2. **Transfer**: the go-back-N loop. Fill the window with DATA
//!    segments, block for one ACK round, and on timeout retransmit the
//!    *entire* in-flight window.  A single timeout never retransmits
//!    selectively.
//!
//! The whole transfer runs on one control loop; the only blocking point is
//! "await the next inbound datagram or the round timeout".  The returned
//! future is cancel-safe, so a caller-supplied overall deadline can be
//! layered on top with `tokio::time::timeout`.
//!
//! Timeouts are recovered locally and are not errors.  Fatal conditions
//! (an exhausted handshake budget or a failed channel) surface as
//! [`TransportError`] and leave the endpoint in
//! [`SenderState::Aborted`].

use std::net::SocketAddr;
use std::time::Instant;

use crate::channel::Channel;
use crate::config::{TransportConfig, MAX_DATAGRAM};
use crate::error::TransportError;
use crate::packet::{Packet, PacketType};
use crate::segment::{split_message, Segment};
use crate::state::SenderState;
use crate::stats::StatsSink;
use crate::window::SendWindow;

/// What one blocking wait round produced.
enum RoundOutcome {
    /// The deadline elapsed with no valid ACK; go back N.
    TimedOut,
    /// A decoded ACK arrived (fresh or stale) and completed the round.
    AckProcessed,
}

/// The sending endpoint of one connection.
pub struct Sender<C, S> {
    channel: C,
    peer: SocketAddr,
    config: TransportConfig,
    state: SenderState,
    stats: S,
}

impl<C: Channel, S: StatsSink> Sender<C, S> {
    pub fn new(channel: C, peer: SocketAddr, config: TransportConfig, stats: S) -> Self {
        Self {
            channel,
            peer,
            config,
            state: SenderState::Idle,
            stats,
        }
    }

    pub fn state(&self) -> SenderState {
        self.state
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn stats(&self) -> &S {
        &self.stats
    }

    /// Consume the endpoint and hand back its stats sink.
    pub fn into_stats(self) -> S {
        self.stats
    }

    /// Segment `data` with the configured bounds and deliver it reliably.
    ///
    /// Empty input means "nothing to transfer": the handshake still runs
    /// (announcing zero segments) and the call succeeds without sending any
    /// DATA.
    pub async fn send_message(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.config.validate()?;
        let segments = split_message(
            data,
            self.config.min_segment_len,
            self.config.max_segment_len,
            &mut rand::rng(),
        )?;
        self.send_segments(segments).await
    }

    /// Deliver pre-cut segments reliably.
    ///
    /// The segments must be 1-based and contiguous, as produced by
    /// [`split_message`].  The configuration is validated before anything
    /// touches the wire, so a zero window or an oversized segment bound is
    /// reported as an error rather than tripping an assertion mid-transfer.
    pub async fn send_segments(&mut self, segments: Vec<Segment>) -> Result<(), TransportError> {
        if self.state != SenderState::Idle {
            return Err(TransportError::BadState);
        }
        self.config.validate()?;
        // Indices 1..=n plus the reserved index 0: total is the exclusive
        // upper bound the peer's loop conditions run against.
        let total = segments.len() as u16 + 1;

        self.state = SenderState::Handshaking;
        if let Err(e) = self.handshake(total).await {
            self.state = SenderState::Aborted;
            return Err(e);
        }

        self.state = SenderState::Transferring;
        if let Err(e) = self.transfer(&segments, total).await {
            self.state = SenderState::Aborted;
            return Err(e);
        }

        self.state = SenderState::Done;
        log::info!(
            "[sender] transfer complete: {} segment(s) acknowledged",
            segments.len()
        );
        Ok(())
    }

    /// Bounded-retry three-way handshake.
    ///
    /// Each attempt sends one SYN and waits `config.timeout` against a fixed
    /// deadline.  Corrupt or unexpected replies do not refresh the deadline;
    /// they are simply not the SYN_ACK we are waiting for.
    async fn handshake(&mut self, total: u16) -> Result<(), TransportError> {
        let syn = Packet::control(PacketType::Syn, 0, 0).encode();
        let mut buf = [0u8; MAX_DATAGRAM];

        for attempt in 1..=self.config.max_handshake_retries {
            self.channel.send_to(&syn, self.peer).await?;
            log::debug!("[sender] → SYN (attempt {attempt})");

            let deadline = tokio::time::Instant::now() + self.config.timeout;
            loop {
                let recv = tokio::time::timeout_at(deadline, self.channel.recv_from(&mut buf));
                let (n, addr) = match recv.await {
                    Err(_elapsed) => {
                        log::debug!("[sender] handshake attempt {attempt} timed out");
                        break; // outer retry
                    }
                    Ok(Err(e)) => return Err(e.into()),
                    Ok(Ok(received)) => received,
                };
                if addr != self.peer {
                    continue;
                }

                match Packet::decode(&buf[..n]) {
                    Err(e) => {
                        self.stats.on_corrupt_discarded();
                        log::debug!("[sender] discarding corrupt handshake reply: {e}");
                    }
                    Ok(pkt) if pkt.kind == PacketType::SynAck => {
                        log::debug!("[sender] ← SYN_ACK; → ESTABLISH total={total}");
                        let establish =
                            Packet::control(PacketType::Establish, 0, total).encode();
                        self.channel.send_to(&establish, self.peer).await?;
                        return Ok(());
                    }
                    Ok(pkt) => {
                        log::warn!("[sender] unexpected {} during handshake", pkt.kind);
                    }
                }
                // Not a valid reply yet; keep waiting on the same deadline.
            }
        }

        Err(TransportError::HandshakeExhausted {
            attempts: self.config.max_handshake_retries,
        })
    }

    /// The go-back-N fill/await loop.
    async fn transfer(
        &mut self,
        segments: &[Segment],
        total: u16,
    ) -> Result<(), TransportError> {
        let mut window = SendWindow::new(total, self.config.window_size);

        while !window.is_complete() {
            // Fill: transmit new segments while the window has room.
            while window.can_fill() {
                let index = window.next_seq();
                let segment = &segments[usize::from(index) - 1];
                let encoded = Packet::data(index, segment.bytes.clone()).encode();
                self.channel.send_to(&encoded, self.peer).await?;
                window.register_send(encoded, segment.offset, Instant::now());
                self.stats.on_initial_send();
                log::debug!(
                    "[sender] → DATA seq={index} bytes {}..{} in_flight={}",
                    segment.offset,
                    segment.offset + segment.bytes.len(),
                    window.in_flight_len()
                );
            }

            // Await: block for one ACK round or the timeout.
            match self.await_ack_round(&mut window).await? {
                RoundOutcome::AckProcessed => {}
                RoundOutcome::TimedOut => self.go_back_n(&mut window).await?,
            }
        }
        Ok(())
    }

    /// Block until a decoded ACK arrives or the round deadline elapses.
    ///
    /// Corrupt datagrams and non-ACK packets are noise: they neither change
    /// window state nor refresh the deadline, so the round timeout stays the
    /// only recovery path for their loss.
    async fn await_ack_round(
        &mut self,
        window: &mut SendWindow,
    ) -> Result<RoundOutcome, TransportError> {
        let mut buf = [0u8; MAX_DATAGRAM];
        let deadline = tokio::time::Instant::now() + self.config.timeout;

        loop {
            let recv = tokio::time::timeout_at(deadline, self.channel.recv_from(&mut buf));
            let (n, addr) = match recv.await {
                Err(_elapsed) => return Ok(RoundOutcome::TimedOut),
                Ok(Err(e)) => return Err(e.into()),
                Ok(Ok(received)) => received,
            };
            if addr != self.peer {
                continue;
            }

            match Packet::decode(&buf[..n]) {
                Err(e) => {
                    self.stats.on_corrupt_discarded();
                    log::debug!("[sender] discarding corrupt datagram: {e}");
                }
                Ok(pkt) if pkt.kind == PacketType::Ack => {
                    match window.on_ack(pkt.ack, Instant::now()) {
                        None => {
                            log::debug!(
                                "[sender] ← stale ACK {} (base {})",
                                pkt.ack,
                                window.base()
                            );
                        }
                        Some(rtts) => {
                            for rtt in &rtts {
                                self.stats.on_rtt_sample(*rtt);
                            }
                            log::debug!(
                                "[sender] ← ACK {} covering {} segment(s); base now {}",
                                pkt.ack,
                                rtts.len(),
                                window.base()
                            );
                        }
                    }
                    // Fresh or stale, a decoded ACK completes the round.
                    return Ok(RoundOutcome::AckProcessed);
                }
                Ok(pkt) => {
                    log::debug!("[sender] ignoring unexpected {} during transfer", pkt.kind);
                }
            }
        }
    }

    /// Retransmit every in-flight segment, oldest first.
    async fn go_back_n(&mut self, window: &mut SendWindow) -> Result<(), TransportError> {
        let snapshot = window.snapshot();
        log::debug!(
            "[sender] timeout at base {}, retransmitting {} segment(s)",
            window.base(),
            snapshot.len()
        );
        for (index, encoded, offset) in &snapshot {
            self.channel.send_to(encoded, self.peer).await?;
            log::debug!("[sender] ↻ DATA seq={index} offset={offset}");
        }
        window.mark_retransmitted(Instant::now());
        self.stats.on_retransmit(snapshot.len());
        Ok(())
    }
}
