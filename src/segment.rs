//! Message segmentation.
//!
//! Before transmission a message is cut into [`Segment`]s of randomised
//! length, bounded by the configured minimum and maximum.  Segment indices
//! are **1-based and contiguous**; index 0 is reserved so that a cumulative
//! acknowledgement number reads directly as "segments acknowledged so far".
//!
//! Splitting is pure: given the same input and the same RNG state it
//! produces the same cuts, which keeps fault-injection tests reproducible.

use rand::Rng;

/// One slice of the original message.
///
/// Produced once by [`split_message`] and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// 1-based segment index; assigned contiguously in message order.
    pub index: u16,
    /// Offset of the first byte of this segment within the message.
    pub offset: usize,
    /// The segment's bytes.
    pub bytes: Vec<u8>,
}

/// Errors raised before any cutting starts.
#[derive(Debug, PartialEq, Eq)]
pub enum SegmentError {
    /// `min_len` is zero or exceeds `max_len`.
    BadBounds { min_len: usize, max_len: usize },
    /// The message needs more segments than the 16-bit index space holds.
    TooManySegments,
}

impl std::fmt::Display for SegmentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SegmentError::BadBounds { min_len, max_len } => {
                write!(f, "invalid segment bounds: min {min_len}, max {max_len}")
            }
            SegmentError::TooManySegments => {
                write!(f, "message would exceed the u16 segment index space")
            }
        }
    }
}

impl std::error::Error for SegmentError {}

/// Cut `data` into segments of random length in `[min_len, max_len]`.
///
/// Starting at offset 0: when the remaining bytes are at most `min_len` they
/// form the final segment; otherwise a uniformly random length in
/// `[min_len, min(max_len, remaining)]` is drawn.  Every segment except
/// possibly the last therefore has a length within the bounds, and
/// concatenating the output in index order reconstructs `data` exactly.
///
/// Empty input yields an empty vector, "nothing to transfer", which the
/// caller must not treat as a protocol error.
pub fn split_message(
    data: &[u8],
    min_len: usize,
    max_len: usize,
    rng: &mut impl Rng,
) -> Result<Vec<Segment>, SegmentError> {
    if min_len == 0 || min_len > max_len {
        return Err(SegmentError::BadBounds { min_len, max_len });
    }
    // Worst case every segment is min_len bytes; indices must fit in u16
    // with index 0 reserved.
    if data.len().div_ceil(min_len) > usize::from(u16::MAX) - 1 {
        return Err(SegmentError::TooManySegments);
    }

    let mut segments = Vec::new();
    let mut offset = 0usize;
    let mut index = 1u16;

    while offset < data.len() {
        let remaining = data.len() - offset;
        let len = if remaining <= min_len {
            remaining
        } else {
            rng.random_range(min_len..=max_len.min(remaining))
        };
        segments.push(Segment {
            index,
            offset,
            bytes: data[offset..offset + len].to_vec(),
        });
        offset += len;
        index += 1;
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng(seed: u64) -> StdRng {
        StdRng::seed_from_u64(seed)
    }

    #[test]
    fn concatenation_reconstructs_input() {
        let data: Vec<u8> = (0..=255u8).cycle().take(4000).collect();
        let segments = split_message(&data, 40, 80, &mut rng(7)).unwrap();

        let mut rebuilt = Vec::new();
        for seg in &segments {
            assert_eq!(seg.offset, rebuilt.len());
            rebuilt.extend_from_slice(&seg.bytes);
        }
        assert_eq!(rebuilt, data);
    }

    #[test]
    fn lengths_stay_within_bounds_except_last() {
        let data = vec![7u8; 1000];
        let segments = split_message(&data, 40, 80, &mut rng(1)).unwrap();
        for seg in &segments[..segments.len() - 1] {
            assert!((40..=80).contains(&seg.bytes.len()), "len {}", seg.bytes.len());
        }
        assert!(segments.last().unwrap().bytes.len() <= 80);
    }

    #[test]
    fn indices_are_one_based_and_contiguous() {
        let data = vec![0u8; 500];
        let segments = split_message(&data, 40, 80, &mut rng(2)).unwrap();
        for (i, seg) in segments.iter().enumerate() {
            assert_eq!(usize::from(seg.index), i + 1);
        }
    }

    #[test]
    fn deterministic_given_same_seed() {
        let data = vec![3u8; 2000];
        let a = split_message(&data, 40, 80, &mut rng(42)).unwrap();
        let b = split_message(&data, 40, 80, &mut rng(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn empty_input_yields_zero_segments() {
        let segments = split_message(&[], 40, 80, &mut rng(0)).unwrap();
        assert!(segments.is_empty());
    }

    #[test]
    fn input_shorter_than_min_is_one_segment() {
        let segments = split_message(b"tiny", 40, 80, &mut rng(0)).unwrap();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].bytes, b"tiny");
        assert_eq!(segments[0].index, 1);
    }

    #[test]
    fn min_greater_than_max_fails_fast() {
        let res = split_message(b"data", 80, 40, &mut rng(0));
        assert_eq!(
            res,
            Err(SegmentError::BadBounds {
                min_len: 80,
                max_len: 40
            })
        );
    }

    #[test]
    fn zero_min_fails_fast() {
        let res = split_message(b"data", 0, 40, &mut rng(0));
        assert!(matches!(res, Err(SegmentError::BadBounds { .. })));
    }

    #[test]
    fn equal_bounds_cut_fixed_lengths() {
        let data = vec![1u8; 100];
        let segments = split_message(&data, 25, 25, &mut rng(0)).unwrap();
        assert_eq!(segments.len(), 4);
        assert!(segments.iter().all(|s| s.bytes.len() == 25));
    }
}
