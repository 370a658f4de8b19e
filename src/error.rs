//! Transport-level error taxonomy shared by both endpoint roles.
//!
//! Timeouts are deliberately absent: a timeout is the designed trigger for
//! retransmission and is recovered locally, never surfaced.

use crate::config::ConfigError;
use crate::segment::SegmentError;

/// Fatal conditions surfaced to the caller of a transfer.
#[derive(Debug)]
pub enum TransportError {
    /// The handshake retry budget was exhausted without a valid SYN_ACK.
    /// No partial transfer was attempted.
    HandshakeExhausted { attempts: u32 },
    /// A segment index was missing at reassembly time.  Under the protocol
    /// invariants this cannot happen; it is reported rather than patched
    /// with placeholder data.
    SegmentGap { index: u16 },
    /// The operation does not fit the endpoint's current state.
    BadState,
    /// The supplied [`TransportConfig`](crate::config::TransportConfig)
    /// cannot drive a transfer.
    Config(ConfigError),
    /// Segmentation of the outgoing message failed.
    Segmentation(SegmentError),
    /// The datagram channel failed (e.g. unreachable peer).  No automatic
    /// reconnection is attempted.
    Io(std::io::Error),
}

impl std::fmt::Display for TransportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportError::HandshakeExhausted { attempts } => {
                write!(f, "handshake failed after {attempts} attempts")
            }
            TransportError::SegmentGap { index } => {
                write!(f, "segment {index} missing at reassembly")
            }
            TransportError::BadState => write!(f, "operation invalid in current state"),
            TransportError::Config(e) => write!(f, "invalid configuration: {e}"),
            TransportError::Segmentation(e) => write!(f, "segmentation error: {e}"),
            TransportError::Io(e) => write!(f, "channel error: {e}"),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Config(e) => Some(e),
            TransportError::Segmentation(e) => Some(e),
            TransportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for TransportError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<SegmentError> for TransportError {
    fn from(e: SegmentError) -> Self {
        Self::Segmentation(e)
    }
}

impl From<ConfigError> for TransportError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
