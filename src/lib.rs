//! `rdt-over-udp`: a reliable, ordered byte stream over unreliable UDP.
//!
//! A miniature transport protocol in the spirit of a simplified TCP: a
//! three-way handshake (SYN / SYN_ACK / ESTABLISH), a Go-Back-N sliding
//! window with timeout-driven retransmission on the sending side, in-order
//! delivery with cumulative acknowledgements on the receiving side, and an
//! additive checksum to detect corrupted datagrams.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────┐   DATA segments   ┌──────────┐
//!  │  Sender  │──────────────────▶│ Receiver │
//!  │ (opener) │◀──────────────────│(responder)│
//!  └────┬─────┘  cumulative ACKs  └─────┬────┘
//!       │                               │
//!  SendWindow                    ReassemblyBuffer
//!  (pure state)                    (pure state)
//!       │                               │
//!  ┌────▼───────────────────────────────▼────┐
//!  │                Channel                  │
//!  │  (unordered, lossy datagram transport)  │
//!  └─────────────────────────────────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`packet`]: wire format (serialise / deserialise / checksum)
//! - [`segment`]: randomised-length message splitting
//! - [`window`]: Go-Back-N outbound window state machine
//! - [`reassembly`]: inbound in-order delivery state machine
//! - [`sender`]: initiator control loop (handshake + transfer)
//! - [`receiver`]: responder control loop (handshake + delivery)
//! - [`state`]: endpoint finite-state-machine types
//! - [`channel`]: datagram channel trait + async UDP implementation
//! - [`faults`]: deterministic lossy/corrupting channel for testing
//! - [`config`]: per-connection tunables
//! - [`stats`]: RTT samples and transfer counters
//! - [`error`]: transport error taxonomy

pub mod channel;
pub mod config;
pub mod error;
pub mod faults;
pub mod packet;
pub mod reassembly;
pub mod receiver;
pub mod segment;
pub mod sender;
pub mod state;
pub mod stats;
pub mod window;

pub use channel::{Channel, UdpChannel};
pub use config::TransportConfig;
pub use error::TransportError;
pub use receiver::Receiver;
pub use sender::Sender;
