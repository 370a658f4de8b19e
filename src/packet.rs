//! Wire-format definitions for protocol packets.
//!
//! Every datagram exchanged between peers is one [`Packet`].  This module is
//! responsible for:
//! - Defining the on-wire binary layout (type, counters, payload).
//! - Serialising a [`Packet`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Packet`], returning errors
//!   for truncated, malformed, or corrupted input.
//!
//! No I/O happens here; this is pure data transformation.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  0               1               2
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |     Type      |        Sequence Number        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      Acknowledgment Number    |  Payload Len  …
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! …               |            Checksum           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                  Payload ...                  |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Total header size: [`HEADER_LEN`] = 9 bytes.
//! type(1) + seq(2) + ack(2) + payload_len(2) + checksum(2)
//!
//! The checksum is the sum of every byte of the packet (with the checksum
//! field itself zeroed) modulo 65536.  It is a data-integrity check that
//! catches single-byte transmission errors with high probability; it is
//! **not** a security mechanism and offers no protection against deliberate
//! tampering.

/// Byte length of the fixed-size header on the wire.
pub const HEADER_LEN: usize = 9;

// Byte offsets of each field within the serialised header.
const OFF_TYPE: usize = 0;
const OFF_SEQ: usize = 1;
const OFF_ACK: usize = 3;
const OFF_PAYLOAD_LEN: usize = 5;
const OFF_CHECKSUM: usize = 7;

/// Discriminant of each packet kind as it appears in the `type` byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    /// Handshake initiation (active opener → passive responder).
    Syn = 0,
    /// Handshake reply (responder → opener).
    SynAck = 1,
    /// One payload segment, numbered by `seq`.
    Data = 2,
    /// Cumulative acknowledgement; `ack` is the highest in-order index.
    Ack = 3,
    /// Handshake completion; `ack` carries the total segment count.
    Establish = 4,
}

impl PacketType {
    /// Map a raw wire byte back to a [`PacketType`].
    fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(Self::Syn),
            1 => Some(Self::SynAck),
            2 => Some(Self::Data),
            3 => Some(Self::Ack),
            4 => Some(Self::Establish),
            _ => None,
        }
    }
}

impl std::fmt::Display for PacketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Syn => "SYN",
            Self::SynAck => "SYN_ACK",
            Self::Data => "DATA",
            Self::Ack => "ACK",
            Self::Establish => "ESTABLISH",
        };
        write!(f, "{name}")
    }
}

/// A complete protocol datagram: header fields + payload bytes.
///
/// `payload_len` and `checksum` are not stored; [`Packet::encode`] computes
/// both from the actual payload and [`Packet::decode`] validates them before
/// a packet is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub kind: PacketType,
    /// Segment index for DATA; unused (zero) for the other kinds.
    pub seq: u16,
    /// Cumulative ack index for ACK; total segment count for ESTABLISH.
    pub ack: u16,
    /// Raw payload bytes; empty for every control packet.
    pub payload: Vec<u8>,
}

impl Packet {
    /// Convenience constructor for a control packet (no payload).
    pub fn control(kind: PacketType, seq: u16, ack: u16) -> Self {
        Self {
            kind,
            seq,
            ack,
            payload: Vec::new(),
        }
    }

    /// Convenience constructor for a DATA packet.
    pub fn data(seq: u16, payload: Vec<u8>) -> Self {
        Self {
            kind: PacketType::Data,
            seq,
            ack: 0,
            payload,
        }
    }

    /// Serialise this packet into a newly allocated byte vector.
    ///
    /// The checksum field is zero while the checksum is computed, then the
    /// real value is written back, the same order of operations the decoder
    /// reverses.
    pub fn encode(&self) -> Vec<u8> {
        let payload_len = self.payload.len();
        let mut buf = vec![0u8; HEADER_LEN + payload_len];

        buf[OFF_TYPE] = self.kind as u8;
        buf[OFF_SEQ..OFF_SEQ + 2].copy_from_slice(&self.seq.to_be_bytes());
        buf[OFF_ACK..OFF_ACK + 2].copy_from_slice(&self.ack.to_be_bytes());
        buf[OFF_PAYLOAD_LEN..OFF_PAYLOAD_LEN + 2]
            .copy_from_slice(&(payload_len as u16).to_be_bytes());
        // Checksum field stays zero while the checksum is computed.
        buf[HEADER_LEN..].copy_from_slice(&self.payload);

        let csum = additive_checksum(&buf);
        buf[OFF_CHECKSUM..OFF_CHECKSUM + 2].copy_from_slice(&csum.to_be_bytes());

        buf
    }

    /// Parse a [`Packet`] from a raw byte slice.
    ///
    /// Returns [`Err`] if:
    /// - `buf` is shorter than [`HEADER_LEN`],
    /// - the `payload_len` field disagrees with `buf.len()`,
    /// - the type byte is not a known [`PacketType`], or
    /// - the recomputed checksum does not match the embedded one.
    ///
    /// A packet that fails any of these checks must be discarded without
    /// being interpreted; whether the *type* fits the caller's protocol
    /// state is the caller's responsibility.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < HEADER_LEN {
            return Err(PacketError::TooShort);
        }

        let payload_len =
            u16::from_be_bytes(buf[OFF_PAYLOAD_LEN..OFF_PAYLOAD_LEN + 2].try_into().unwrap());
        if buf.len() != HEADER_LEN + payload_len as usize {
            return Err(PacketError::LengthMismatch);
        }

        // Verify the checksum before trusting any other field: zero the
        // stored field, recompute, compare.
        let embedded =
            u16::from_be_bytes(buf[OFF_CHECKSUM..OFF_CHECKSUM + 2].try_into().unwrap());
        let mut scratch = buf.to_vec();
        scratch[OFF_CHECKSUM..OFF_CHECKSUM + 2].copy_from_slice(&0u16.to_be_bytes());
        if additive_checksum(&scratch) != embedded {
            return Err(PacketError::ChecksumMismatch);
        }

        let kind = PacketType::from_wire(buf[OFF_TYPE]).ok_or(PacketError::UnknownType)?;
        let seq = u16::from_be_bytes(buf[OFF_SEQ..OFF_SEQ + 2].try_into().unwrap());
        let ack = u16::from_be_bytes(buf[OFF_ACK..OFF_ACK + 2].try_into().unwrap());

        Ok(Packet {
            kind,
            seq,
            ack,
            payload: buf[HEADER_LEN..].to_vec(),
        })
    }
}

/// Errors that can arise when parsing a raw datagram.
#[derive(Debug, PartialEq, Eq)]
pub enum PacketError {
    /// Buffer shorter than the fixed header size.
    TooShort,
    /// `payload_len` field does not match the actual remaining bytes.
    LengthMismatch,
    /// The type byte is outside the known range.
    UnknownType,
    /// Recomputed checksum did not match the embedded value.
    ChecksumMismatch,
}

impl std::fmt::Display for PacketError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PacketError::TooShort => write!(f, "buffer too short to contain a header"),
            PacketError::LengthMismatch => {
                write!(f, "payload_len field does not match remaining bytes")
            }
            PacketError::UnknownType => write!(f, "unknown packet type byte"),
            PacketError::ChecksumMismatch => write!(f, "checksum verification failed"),
        }
    }
}

impl std::error::Error for PacketError {}

/// Sum of every byte of `data`, modulo 65536.
///
/// The caller must zero the checksum field within `data` before calling.
fn additive_checksum(data: &[u8]) -> u16 {
    let sum: u32 = data.iter().map(|&b| u32::from(b)).sum();
    (sum % 65536) as u16
}
