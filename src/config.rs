//! Connection configuration.
//!
//! Every tunable of the protocol lives in one [`TransportConfig`] value that
//! is passed into the endpoint constructors.  There is deliberately no
//! process-wide mutable configuration.
//!
//! The timeout is a fixed wall-clock duration per wait; there is no RTT
//! estimation, back-off, or other adaptation.

use std::time::Duration;

use crate::packet::HEADER_LEN;

/// Largest datagram either endpoint will send or buffer on receive.
///
/// Matches the 1024-byte receive buffers of the wire peers this protocol
/// interoperates with; a segment that would not fit is rejected before the
/// transfer starts.
pub const MAX_DATAGRAM: usize = 1024;

/// Tunables for one connection, shared by both endpoint roles.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Go-Back-N window capacity in segments.
    pub window_size: u16,
    /// Fixed timeout for one handshake reply or one ACK round.
    pub timeout: Duration,
    /// SYN attempts before the connection attempt is abandoned.
    pub max_handshake_retries: u32,
    /// Minimum segment length handed to the segmenter.
    pub min_segment_len: usize,
    /// Maximum segment length handed to the segmenter.
    pub max_segment_len: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            window_size: 5,
            timeout: Duration::from_millis(300),
            max_handshake_retries: 5,
            min_segment_len: 40,
            max_segment_len: 80,
        }
    }
}

/// A configuration that cannot drive a transfer.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A window of zero segments can never have anything in flight.
    ZeroWindow,
    /// `min_segment_len` is zero or exceeds `max_segment_len`.
    BadSegmentBounds { min_len: usize, max_len: usize },
    /// A maximal segment plus header would not fit in [`MAX_DATAGRAM`].
    OversizedSegment { max_len: usize },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ZeroWindow => write!(f, "window size must be at least 1"),
            ConfigError::BadSegmentBounds { min_len, max_len } => {
                write!(f, "invalid segment bounds: min {min_len}, max {max_len}")
            }
            ConfigError::OversizedSegment { max_len } => write!(
                f,
                "segment of {max_len} bytes plus header exceeds the {MAX_DATAGRAM}-byte datagram cap"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

impl TransportConfig {
    /// Reject configurations whose segments could exceed [`MAX_DATAGRAM`] or
    /// whose window cannot hold a single segment.
    ///
    /// Called by the sender before segmentation starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.min_segment_len == 0 || self.min_segment_len > self.max_segment_len {
            return Err(ConfigError::BadSegmentBounds {
                min_len: self.min_segment_len,
                max_len: self.max_segment_len,
            });
        }
        if HEADER_LEN + self.max_segment_len > MAX_DATAGRAM {
            return Err(ConfigError::OversizedSegment {
                max_len: self.max_segment_len,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(TransportConfig::default().validate().is_ok());
    }

    #[test]
    fn oversized_segment_rejected() {
        let cfg = TransportConfig {
            max_segment_len: MAX_DATAGRAM, // header would not fit
            min_segment_len: 40,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_window_rejected() {
        let cfg = TransportConfig {
            window_size: 0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn inverted_bounds_rejected() {
        let cfg = TransportConfig {
            min_segment_len: 90,
            max_segment_len: 80,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
