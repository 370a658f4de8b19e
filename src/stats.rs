//! Transfer statistics.
//!
//! The protocol endpoints emit timestamped events (RTT samples, initial
//! transmissions, retransmissions, discarded corrupt datagrams) to a
//! [`StatsSink`].  Aggregation and presentation happen entirely on the sink
//! side; the protocol loops never format or print anything themselves.

use std::time::Duration;

/// Consumer of protocol events.
///
/// All methods default to no-ops so a sink only implements what it cares
/// about.
pub trait StatsSink {
    /// One measured round-trip time: segment send to covering ACK.
    fn on_rtt_sample(&mut self, _rtt: Duration) {}

    /// First transmission of a segment.
    fn on_initial_send(&mut self) {}

    /// `count` segments were retransmitted after a window timeout.
    fn on_retransmit(&mut self, _count: usize) {}

    /// A datagram failed checksum or framing validation and was discarded.
    fn on_corrupt_discarded(&mut self) {}

    /// A duplicate or out-of-order segment was discarded and re-ACKed.
    fn on_duplicate_discarded(&mut self) {}
}

/// Sink that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStats;

impl StatsSink for NoStats {}

/// Collecting sink with a summary over the whole transfer.
#[derive(Debug, Default)]
pub struct TransferStats {
    rtts: Vec<Duration>,
    pub initial_sends: u64,
    pub retransmissions: u64,
    pub corrupt_discarded: u64,
    pub duplicates_discarded: u64,
}

impl TransferStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rtt_samples(&self) -> &[Duration] {
        &self.rtts
    }

    /// Fraction of transmissions that were retransmissions, in `[0, 1]`.
    pub fn retransmission_rate(&self) -> f64 {
        let total = self.initial_sends + self.retransmissions;
        if total == 0 {
            0.0
        } else {
            self.retransmissions as f64 / total as f64
        }
    }

    pub fn min_rtt(&self) -> Option<Duration> {
        self.rtts.iter().min().copied()
    }

    pub fn max_rtt(&self) -> Option<Duration> {
        self.rtts.iter().max().copied()
    }

    pub fn mean_rtt(&self) -> Option<Duration> {
        if self.rtts.is_empty() {
            return None;
        }
        let total: Duration = self.rtts.iter().sum();
        Some(total / self.rtts.len() as u32)
    }

    /// Population standard deviation of the RTT samples, in milliseconds.
    pub fn stddev_rtt_ms(&self) -> Option<f64> {
        if self.rtts.is_empty() {
            return None;
        }
        let ms: Vec<f64> = self.rtts.iter().map(|d| d.as_secs_f64() * 1000.0).collect();
        let mean = ms.iter().sum::<f64>() / ms.len() as f64;
        let var = ms.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / ms.len() as f64;
        Some(var.sqrt())
    }
}

impl StatsSink for TransferStats {
    fn on_rtt_sample(&mut self, rtt: Duration) {
        self.rtts.push(rtt);
    }

    fn on_initial_send(&mut self) {
        self.initial_sends += 1;
    }

    fn on_retransmit(&mut self, count: usize) {
        self.retransmissions += count as u64;
    }

    fn on_corrupt_discarded(&mut self) {
        self.corrupt_discarded += 1;
    }

    fn on_duplicate_discarded(&mut self) {
        self.duplicates_discarded += 1;
    }
}
