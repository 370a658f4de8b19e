//! Endpoint finite-state machine types.
//!
//! Transitions are not implemented here (they live in [`crate::sender`] and
//! [`crate::receiver`]), but keeping the state sets in their own module makes
//! it easy to add guard logic or tracing without touching the control loops.

/// States of the active opener ([`crate::sender::Sender`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SenderState {
    /// No handshake attempted yet; initial state.
    #[default]
    Idle,
    /// SYN sent; waiting for SYN_ACK within the retry budget.
    Handshaking,
    /// Handshake complete; Go-Back-N transfer in progress.
    Transferring,
    /// Every segment sent and acknowledged.
    Done,
    /// Handshake retries exhausted or the channel failed; nothing was
    /// transferred.
    Aborted,
}

/// States of the passive responder ([`crate::receiver::Receiver`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiverState {
    /// Waiting for a SYN; initial state.
    #[default]
    Listening,
    /// SYN_ACK sent; waiting for the ESTABLISH packet with the total count.
    AwaitEstablish,
    /// Accepting in-order DATA segments and emitting cumulative ACKs.
    Receiving,
    /// Every expected segment delivered.
    Done,
}

impl std::fmt::Display for SenderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

impl std::fmt::Display for ReceiverState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
