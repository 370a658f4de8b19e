//! Go-Back-N send-side window state.
//!
//! [`SendWindow`] tracks up to `window_size` in-flight segments.  ACKs are
//! **cumulative**: `ack = K` means the receiver has accepted every segment
//! with index ≤ K.  On timeout the caller retransmits **all** in-flight
//! segments from `base` onwards (go back N), never a selective subset.
//!
//! Segment indices are 1-based; `total` is the exclusive upper bound of the
//! index range, so a transfer of `n` segments has `total = n + 1` and is
//! complete when `base == total`.
//!
//! Invariant: `base ≤ next_seq ≤ base + window_size`, and every index in
//! `[base, next_seq)` is in the in-flight map until an ACK removes it.
//!
//! This module only manages state; all socket I/O and clock reads are the
//! caller's responsibility.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// A single in-flight segment occupying one window slot.
#[derive(Debug, Clone)]
struct InFlight {
    /// The encoded datagram, kept verbatim for retransmission.
    encoded: Vec<u8>,
    /// Most recent transmission time (the RTT sampling anchor).
    sent_at: Instant,
    /// Byte offset of the segment within the original message.
    offset: usize,
}

/// Go-Back-N send window for one transfer.
#[derive(Debug)]
pub struct SendWindow {
    /// Oldest unacknowledged segment index (left window edge).
    base: u16,
    /// Index the next new segment will use.
    next_seq: u16,
    /// Exclusive upper bound of segment indices.
    total: u16,
    /// Maximum number of in-flight segments (N).
    window_size: u16,
    /// In-flight segments keyed by index.
    in_flight: BTreeMap<u16, InFlight>,
}

impl SendWindow {
    /// Create a window for a transfer of `total − 1` segments.
    pub fn new(total: u16, window_size: u16) -> Self {
        assert!(window_size >= 1, "window_size must be at least 1");
        assert!(total >= 1, "total is an exclusive bound over 1-based indices");
        Self {
            base: 1,
            next_seq: 1,
            total,
            window_size,
            in_flight: BTreeMap::new(),
        }
    }

    pub fn base(&self) -> u16 {
        self.base
    }

    pub fn next_seq(&self) -> u16 {
        self.next_seq
    }

    pub fn total(&self) -> u16 {
        self.total
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    /// `true` once every segment has been acknowledged.
    pub fn is_complete(&self) -> bool {
        self.base == self.total
    }

    /// `true` while another new segment may be sent: there are unsent
    /// indices left and the window has a free slot.
    pub fn can_fill(&self) -> bool {
        self.next_seq < self.total
            && u32::from(self.next_seq) < u32::from(self.base) + u32::from(self.window_size)
    }

    /// Record the first transmission of the next segment and advance
    /// `next_seq`.  Returns the index that was consumed.
    ///
    /// Check [`can_fill`](Self::can_fill) first; in debug builds a full
    /// window panics.
    pub fn register_send(&mut self, encoded: Vec<u8>, offset: usize, now: Instant) -> u16 {
        debug_assert!(
            self.can_fill(),
            "register_send on a closed window ({} in flight / {})",
            self.in_flight.len(),
            self.window_size
        );
        let index = self.next_seq;
        self.in_flight.insert(
            index,
            InFlight {
                encoded,
                sent_at: now,
                offset,
            },
        );
        self.next_seq += 1;
        index
    }

    /// Process a cumulative ACK.
    ///
    /// Returns `None` for a stale ACK (`ack < base`), which must cause no
    /// state change.  Otherwise removes every covered in-flight entry,
    /// advances `base` to `ack + 1`, and returns one RTT sample per newly
    /// acknowledged segment (time from its most recent transmission).
    pub fn on_ack(&mut self, ack: u16, now: Instant) -> Option<Vec<Duration>> {
        if ack < self.base {
            return None;
        }

        let mut rtts = Vec::new();
        let covered: Vec<u16> = self
            .in_flight
            .range(..=ack)
            .map(|(&idx, _)| idx)
            .collect();
        for idx in covered {
            let entry = self.in_flight.remove(&idx).expect("index just observed");
            rtts.push(now.saturating_duration_since(entry.sent_at));
        }
        // An ACK can never legitimately cover unsent indices; clamp so the
        // window invariant holds even against a broken peer.
        self.base = ack.saturating_add(1).min(self.next_seq);
        Some(rtts)
    }

    /// Clone every in-flight datagram, oldest first, for a full-window
    /// retransmission.  Call [`mark_retransmitted`](Self::mark_retransmitted)
    /// once they are back on the wire.
    pub fn snapshot(&self) -> Vec<(u16, Vec<u8>, usize)> {
        self.in_flight
            .iter()
            .map(|(&idx, e)| (idx, e.encoded.clone(), e.offset))
            .collect()
    }

    /// Refresh the send timestamp of every in-flight segment after a
    /// go-back-N retransmission, so RTT samples measure the latest copy.
    pub fn mark_retransmitted(&mut self, now: Instant) {
        for entry in self.in_flight.values_mut() {
            entry.sent_at = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> Instant {
        Instant::now()
    }

    #[test]
    fn initial_state() {
        let w = SendWindow::new(10, 5);
        assert_eq!(w.base(), 1);
        assert_eq!(w.next_seq(), 1);
        assert!(w.can_fill());
        assert!(!w.is_complete());
        assert_eq!(w.in_flight_len(), 0);
    }

    #[test]
    fn empty_transfer_is_immediately_complete() {
        // total = 1 means zero real segments.
        let w = SendWindow::new(1, 5);
        assert!(w.is_complete());
        assert!(!w.can_fill());
    }

    #[test]
    fn register_send_advances_next_seq() {
        let mut w = SendWindow::new(10, 5);
        let idx = w.register_send(vec![1, 2, 3], 0, now());
        assert_eq!(idx, 1);
        assert_eq!(w.next_seq(), 2);
        assert_eq!(w.base(), 1); // not acked yet
        assert_eq!(w.in_flight_len(), 1);
    }

    #[test]
    fn window_full_blocks_fill() {
        let mut w = SendWindow::new(10, 2);
        w.register_send(vec![0], 0, now());
        w.register_send(vec![1], 1, now());
        assert!(!w.can_fill());
        assert_eq!(w.in_flight_len(), 2);
    }

    #[test]
    fn fill_stops_at_total() {
        let mut w = SendWindow::new(3, 5); // two real segments
        w.register_send(vec![0], 0, now());
        w.register_send(vec![1], 1, now());
        assert!(!w.can_fill(), "no indices left below total");
    }

    #[test]
    fn cumulative_ack_slides_multiple() {
        let mut w = SendWindow::new(10, 5);
        for i in 0..3 {
            w.register_send(vec![i as u8], i, now());
        }
        let rtts = w.on_ack(3, now()).expect("fresh ack");
        assert_eq!(rtts.len(), 3);
        assert_eq!(w.base(), 4);
        assert_eq!(w.in_flight_len(), 0);
    }

    #[test]
    fn partial_ack_keeps_tail_in_flight() {
        let mut w = SendWindow::new(10, 5);
        for i in 0..4 {
            w.register_send(vec![i as u8], i, now());
        }
        let rtts = w.on_ack(2, now()).unwrap();
        assert_eq!(rtts.len(), 2);
        assert_eq!(w.base(), 3);
        assert_eq!(w.in_flight_len(), 2);
        assert!(w.can_fill(), "sliding must reopen the window");
    }

    #[test]
    fn stale_ack_is_ignored() {
        let mut w = SendWindow::new(10, 5);
        w.register_send(vec![0], 0, now());
        w.on_ack(1, now()).unwrap();
        assert_eq!(w.base(), 2);

        // ack below base: no state change, reported as stale.
        assert!(w.on_ack(1, now()).is_none());
        assert!(w.on_ack(0, now()).is_none());
        assert_eq!(w.base(), 2);
    }

    #[test]
    fn ack_beyond_next_seq_is_clamped() {
        let mut w = SendWindow::new(10, 5);
        w.register_send(vec![0], 0, now());
        let rtts = w.on_ack(9, now()).unwrap();
        assert_eq!(rtts.len(), 1);
        assert_eq!(w.base(), w.next_seq(), "base may never pass next_seq");
    }

    #[test]
    fn completion_at_base_equals_total() {
        let mut w = SendWindow::new(3, 5);
        w.register_send(vec![0], 0, now());
        w.register_send(vec![1], 1, now());
        w.on_ack(2, now()).unwrap();
        assert!(w.is_complete());
    }

    #[test]
    fn snapshot_returns_oldest_first() {
        let mut w = SendWindow::new(10, 5);
        w.register_send(vec![0xAA], 0, now());
        w.register_send(vec![0xBB], 1, now());
        let snap = w.snapshot();
        assert_eq!(snap.len(), 2);
        assert_eq!(snap[0].0, 1);
        assert_eq!(snap[0].1, vec![0xAA]);
        assert_eq!(snap[1].0, 2);
    }

    #[test]
    fn retransmit_refreshes_rtt_anchor() {
        let mut w = SendWindow::new(10, 5);
        let t0 = now();
        w.register_send(vec![0], 0, t0);

        let t1 = t0 + Duration::from_millis(500);
        w.mark_retransmitted(t1);

        let t2 = t1 + Duration::from_millis(10);
        let rtts = w.on_ack(1, t2).unwrap();
        assert_eq!(rtts, vec![Duration::from_millis(10)]);
    }
}
