//! Receive-side in-order delivery state.
//!
//! [`ReassemblyBuffer`] implements the receiver half of the sliding-window
//! protocol:
//!
//! - Only the **in-order** segment (`seq == expected`) is accepted.
//! - Out-of-order and duplicate segments are discarded; the caller re-sends
//!   the current cumulative ACK so the sender's window state converges.
//! - After accepting a segment, `expected` is drained forward across any
//!   already-stored successors.  Under strict go-back-N sending segments
//!   never arrive ahead of `expected`, so the drain is a safety net that
//!   normally advances exactly one step.
//!
//! This module only manages state; socket I/O is the caller's responsibility
//! (the same split as [`crate::window`] on the send side).

use std::collections::BTreeMap;

use crate::error::TransportError;

/// In-order segment store for one transfer.
#[derive(Debug)]
pub struct ReassemblyBuffer {
    /// Next in-order segment index required.
    expected: u16,
    /// Exclusive upper bound of segment indices (from the handshake).
    total: u16,
    /// Stored payloads keyed by index; every index `< expected` is present.
    stored: BTreeMap<u16, Vec<u8>>,
}

impl ReassemblyBuffer {
    /// Create a buffer expecting `total − 1` segments (indices `1..total`).
    pub fn new(total: u16) -> Self {
        assert!(total >= 1, "total is an exclusive bound over 1-based indices");
        Self {
            expected: 1,
            total,
            stored: BTreeMap::new(),
        }
    }

    pub fn expected(&self) -> u16 {
        self.expected
    }

    pub fn total(&self) -> u16 {
        self.total
    }

    /// Cumulative acknowledgement value: the highest index delivered
    /// in order so far.
    pub fn ack_value(&self) -> u16 {
        self.expected - 1
    }

    /// `true` once every segment has been delivered.
    pub fn is_complete(&self) -> bool {
        self.expected == self.total
    }

    /// Process one DATA segment.
    ///
    /// Returns `true` when the segment was the expected one and was stored
    /// (advancing `expected`); `false` for a duplicate or out-of-order
    /// segment, which is **not** stored.  Either way the caller should send
    /// a cumulative ACK carrying [`ack_value`](Self::ack_value).
    pub fn on_data(&mut self, seq: u16, payload: &[u8]) -> bool {
        if seq != self.expected {
            return false;
        }
        self.stored.insert(seq, payload.to_vec());
        // Drain forward over any buffered successors.
        while self.stored.contains_key(&self.expected) {
            self.expected += 1;
        }
        true
    }

    /// Concatenate the stored payloads for indices `1..total` in order.
    ///
    /// A missing index is a broken invariant and is surfaced as
    /// [`TransportError::SegmentGap`], never papered over with placeholder
    /// bytes.
    pub fn into_message(self) -> Result<Vec<u8>, TransportError> {
        let mut message = Vec::new();
        for index in 1..self.total {
            match self.stored.get(&index) {
                Some(payload) => message.extend_from_slice(payload),
                None => return Err(TransportError::SegmentGap { index }),
            }
        }
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let r = ReassemblyBuffer::new(5);
        assert_eq!(r.expected(), 1);
        assert_eq!(r.ack_value(), 0);
        assert!(!r.is_complete());
    }

    #[test]
    fn empty_transfer_is_immediately_complete() {
        let r = ReassemblyBuffer::new(1);
        assert!(r.is_complete());
        assert_eq!(r.into_message().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn in_order_segment_accepted() {
        let mut r = ReassemblyBuffer::new(3);
        assert!(r.on_data(1, b"hello"));
        assert_eq!(r.expected(), 2);
        assert_eq!(r.ack_value(), 1);
    }

    #[test]
    fn out_of_order_segment_discarded() {
        let mut r = ReassemblyBuffer::new(5);
        assert!(!r.on_data(3, b"future"));
        assert_eq!(r.expected(), 1, "expected must not advance");
        assert_eq!(r.ack_value(), 0, "cumulative ACK unchanged");
    }

    #[test]
    fn duplicate_segment_discarded_without_side_effects() {
        let mut r = ReassemblyBuffer::new(3);
        assert!(r.on_data(1, b"once"));
        assert!(!r.on_data(1, b"AGAIN"));
        assert_eq!(r.expected(), 2);
        // The original payload must survive the duplicate.
        assert!(r.on_data(2, b"!"));
        assert_eq!(r.into_message().unwrap(), b"once!");
    }

    #[test]
    fn sequential_segments_complete_the_transfer() {
        let mut r = ReassemblyBuffer::new(4);
        assert!(r.on_data(1, b"a"));
        assert!(r.on_data(2, b"bc"));
        assert!(r.on_data(3, b"def"));
        assert!(r.is_complete());
        assert_eq!(r.ack_value(), 3);
        assert_eq!(r.into_message().unwrap(), b"abcdef");
    }

    #[test]
    fn gap_is_reported_not_patched() {
        // Force a broken invariant by building a buffer whose expected index
        // advanced without index 1 being present.
        let r = ReassemblyBuffer {
            expected: 3,
            total: 3,
            stored: [(2u16, b"two".to_vec())].into_iter().collect(),
        };
        match r.into_message() {
            Err(TransportError::SegmentGap { index }) => assert_eq!(index, 1),
            other => panic!("expected SegmentGap, got {other:?}"),
        }
    }
}
