//! Deterministic fault injection for testing.
//!
//! Real networks drop, duplicate, and corrupt datagrams.  To exercise the
//! recovery mechanisms without depending on actual network conditions,
//! [`FaultyChannel`] wraps any [`Channel`] and applies a configurable fault
//! plan to **outbound** datagrams:
//!
//! | Fault       | Behaviour                                            |
//! |-------------|------------------------------------------------------|
//! | Drop        | Every Nth send is silently discarded.                |
//! | Corruption  | Every Nth send has one byte flipped.                 |
//! | Duplication | Every Nth send is delivered twice.                   |
//!
//! The plan is counter-based, not probabilistic, so failing tests replay
//! identically.  The protocol endpoints never see this type; they only
//! observe that the channel lost or mangled a datagram.

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;

use crate::channel::Channel;

/// Which outbound datagrams to affect.
///
/// A period of `Some(n)` affects the nth, 2nth, … datagram (1-based count);
/// `Some(1)` affects every datagram, `None` disables the fault.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultPlan {
    pub drop_period: Option<u64>,
    pub corrupt_period: Option<u64>,
    pub duplicate_period: Option<u64>,
}

impl FaultPlan {
    /// A plan that never interferes (transparent pass-through).
    pub fn none() -> Self {
        Self::default()
    }

    /// Drop every `n`th outbound datagram.
    pub fn drop_every(n: u64) -> Self {
        Self {
            drop_period: Some(n),
            ..Self::default()
        }
    }

    /// Flip one byte in every `n`th outbound datagram.
    pub fn corrupt_every(n: u64) -> Self {
        Self {
            corrupt_period: Some(n),
            ..Self::default()
        }
    }

    /// Send every `n`th outbound datagram twice.
    pub fn duplicate_every(n: u64) -> Self {
        Self {
            duplicate_period: Some(n),
            ..Self::default()
        }
    }
}

fn hits(period: Option<u64>, count: u64) -> bool {
    matches!(period, Some(n) if n > 0 && count % n == 0)
}

/// A fault-injecting decorator around any [`Channel`].
#[derive(Debug)]
pub struct FaultyChannel<C> {
    inner: C,
    plan: FaultPlan,
    sent: AtomicU64,
    dropped: AtomicU64,
}

impl<C: Channel> FaultyChannel<C> {
    pub fn new(inner: C, plan: FaultPlan) -> Self {
        Self {
            inner,
            plan,
            sent: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    /// Number of send attempts observed so far (including dropped ones).
    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::SeqCst)
    }

    /// Number of datagrams the plan discarded.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<C: Channel> Channel for FaultyChannel<C> {
    async fn send_to(&self, buf: &[u8], dest: SocketAddr) -> io::Result<()> {
        let count = self.sent.fetch_add(1, Ordering::SeqCst) + 1;

        if hits(self.plan.drop_period, count) {
            self.dropped.fetch_add(1, Ordering::SeqCst);
            log::debug!("[faults] dropping datagram #{count} ({} bytes)", buf.len());
            return Ok(());
        }

        if hits(self.plan.corrupt_period, count) && !buf.is_empty() {
            let mut mangled = buf.to_vec();
            // Flip the middle byte; deterministic and always detectable by
            // the additive checksum.
            let pos = mangled.len() / 2;
            mangled[pos] ^= 0xFF;
            log::debug!("[faults] corrupting datagram #{count} at byte {pos}");
            return self.inner.send_to(&mangled, dest).await;
        }

        self.inner.send_to(buf, dest).await?;

        if hits(self.plan.duplicate_period, count) {
            log::debug!("[faults] duplicating datagram #{count}");
            self.inner.send_to(buf, dest).await?;
        }

        Ok(())
    }

    async fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        self.inner.recv_from(buf).await
    }

    fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_arithmetic() {
        assert!(hits(Some(1), 1));
        assert!(hits(Some(1), 2));
        assert!(hits(Some(3), 3));
        assert!(hits(Some(3), 6));
        assert!(!hits(Some(3), 4));
        assert!(!hits(None, 3));
        assert!(!hits(Some(0), 3)); // degenerate period disables the fault
    }

    #[test]
    fn plans_compose_defaults() {
        let plan = FaultPlan::drop_every(2);
        assert_eq!(plan.drop_period, Some(2));
        assert!(plan.corrupt_period.is_none());
        assert!(plan.duplicate_period.is_none());
    }
}
