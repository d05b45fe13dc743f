//! Little-endian record decoding for XRM containers
//!
//! Records are raw byte streams with no self-describing header. This module
//! turns them into typed values:
//!
//! 1. Fixed-width scalars (`u16`, `u32`, `i32`, `f32`, `f64`)
//! 2. NUL-terminated text
//! 3. Per-frame `f32` arrays, with a contiguous layout and a padded-stride
//!    layout written by some firmware revisions
//!
//! All functions are pure over byte slices so they can be tested and fuzzed
//! without a container on disk.

use byteorder::{ByteOrder, LittleEndian};

/// Size in bytes of one per-frame array element
pub const FLOAT_WIDTH: usize = 4;

/// Padding bytes preceding every element after the first in the
/// padded-stride layout.
pub const PADDED_STRIDE_PADDING: usize = 36;

/// Errors that can occur while decoding a record
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Record length does not match the layout
    #[error("Invalid data length: expected {expected}, got {actual}")]
    InvalidLength {
        /// Length the layout requires
        expected: usize,
        /// Length of the record
        actual: usize,
    },

    /// Record is shorter than the value it should hold
    #[error("Record too short: need at least {required} bytes, got {actual}")]
    TooShort {
        /// Minimum length
        required: usize,
        /// Length of the record
        actual: usize,
    },

    /// Declared frame dimensions overflow the addressable size
    #[error("Frame of {rows}x{cols} pixels is too large")]
    FrameTooLarge {
        /// Declared rows
        rows: usize,
        /// Declared columns
        cols: usize,
    },

    /// An empty strategy list was passed to [`decode_with_fallback`]
    #[error("No decode strategy was supplied")]
    NoStrategy,
}

/// A fixed-width value that can be read from little-endian bytes.
pub trait LeScalar: Sized + Copy {
    /// Encoded width in bytes
    const WIDTH: usize;

    /// Decode from exactly `WIDTH` bytes.
    fn from_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_le_scalar {
    ($ty:ty, $width:expr, $read:ident) => {
        impl LeScalar for $ty {
            const WIDTH: usize = $width;

            fn from_le(bytes: &[u8]) -> Self {
                LittleEndian::$read(bytes)
            }
        }
    };
}

impl_le_scalar!(u16, 2, read_u16);
impl_le_scalar!(u32, 4, read_u32);
impl_le_scalar!(i32, 4, read_i32);
impl_le_scalar!(f32, 4, read_f32);
impl_le_scalar!(f64, 8, read_f64);

/// Decode the leading scalar of a record.
///
/// Some firmware stores scalar fields in records padded past the value
/// width, so trailing bytes are ignored.
pub fn decode_scalar<T: LeScalar>(bytes: &[u8]) -> Result<T, DecodeError> {
    if bytes.len() < T::WIDTH {
        return Err(DecodeError::TooShort {
            required: T::WIDTH,
            actual: bytes.len(),
        });
    }
    Ok(T::from_le(&bytes[..T::WIDTH]))
}

/// Decode NUL-separated text into its non-empty, trimmed parts.
///
/// Bytes are interpreted as UTF-8 with lossy replacement; vendor strings are
/// plain ASCII in practice.
pub fn decode_texts(bytes: &[u8]) -> Vec<String> {
    bytes
        .split(|&b| b == 0)
        .map(|part| String::from_utf8_lossy(part).trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

/// Decode the first NUL-terminated string of a record.
pub fn decode_text(bytes: &[u8]) -> Option<String> {
    decode_texts(bytes).into_iter().next()
}

/// Decode a whitespace/NUL separated list of names.
pub fn decode_name_list(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    text.split(|c: char| c == '\0' || c.is_whitespace())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Decode every complete `f32` in a record, ignoring a trailing partial value.
pub fn decode_f32_all(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(FLOAT_WIDTH)
        .map(LittleEndian::read_f32)
        .collect()
}

/// Layout of a per-frame `f32` array record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStrategy {
    /// `frame_count` packed floats
    Contiguous,
    /// One leading float followed by `frame_count - 1` blocks of
    /// `padding` bytes plus one float
    PaddedStride {
        /// Padding bytes before each element after the first
        padding: usize,
    },
}

/// Strategies tried, in order, for every per-frame array field.
pub const PER_FRAME_STRATEGIES: [DecodeStrategy; 2] = [
    DecodeStrategy::Contiguous,
    DecodeStrategy::PaddedStride {
        padding: PADDED_STRIDE_PADDING,
    },
];

impl DecodeStrategy {
    /// The padded-stride layout with the standard padding width.
    pub fn padded_stride() -> Self {
        DecodeStrategy::PaddedStride {
            padding: PADDED_STRIDE_PADDING,
        }
    }

    /// Exact byte length of a record holding `frame_count` elements.
    pub fn record_len(&self, frame_count: usize) -> usize {
        match *self {
            DecodeStrategy::Contiguous => frame_count * FLOAT_WIDTH,
            DecodeStrategy::PaddedStride { padding } => match frame_count {
                0 => 0,
                n => FLOAT_WIDTH + (n - 1) * (padding + FLOAT_WIDTH),
            },
        }
    }

    /// Decode `frame_count` floats, requiring the exact record length.
    pub fn decode(&self, bytes: &[u8], frame_count: usize) -> Result<Vec<f32>, DecodeError> {
        let expected = self.record_len(frame_count);
        if bytes.len() != expected {
            return Err(DecodeError::InvalidLength {
                expected,
                actual: bytes.len(),
            });
        }

        match *self {
            DecodeStrategy::Contiguous => Ok(decode_f32_all(bytes)),
            DecodeStrategy::PaddedStride { padding } => {
                let mut values = Vec::with_capacity(frame_count);
                if frame_count == 0 {
                    return Ok(values);
                }
                values.push(LittleEndian::read_f32(&bytes[..FLOAT_WIDTH]));
                let stride = padding + FLOAT_WIDTH;
                for block in 0..frame_count - 1 {
                    let offset = FLOAT_WIDTH + block * stride + padding;
                    values.push(LittleEndian::read_f32(&bytes[offset..offset + FLOAT_WIDTH]));
                }
                Ok(values)
            }
        }
    }
}

/// Decode a per-frame array trying each strategy in order.
///
/// Returns the values and the strategy that succeeded. When every strategy
/// fails, the error of the last one is returned.
pub fn decode_with_fallback(
    bytes: &[u8],
    frame_count: usize,
    strategies: &[DecodeStrategy],
) -> Result<(Vec<f32>, DecodeStrategy), DecodeError> {
    let mut last_error = DecodeError::NoStrategy;
    for strategy in strategies {
        match strategy.decode(bytes, frame_count) {
            Ok(values) => return Ok((values, *strategy)),
            Err(e) => last_error = e,
        }
    }
    Err(last_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contiguous(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn padded(values: &[f32], padding: usize) -> Vec<u8> {
        let mut bytes = Vec::new();
        for (i, v) in values.iter().enumerate() {
            if i > 0 {
                bytes.extend(std::iter::repeat(0xAAu8).take(padding));
            }
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    #[test]
    fn test_decode_scalars() {
        assert_eq!(decode_scalar::<u32>(&7u32.to_le_bytes()).unwrap(), 7);
        assert_eq!(decode_scalar::<f32>(&1.5f32.to_le_bytes()).unwrap(), 1.5);
        assert_eq!(decode_scalar::<f64>(&(-2.25f64).to_le_bytes()).unwrap(), -2.25);

        // trailing padding is ignored
        let mut padded = 42u16.to_le_bytes().to_vec();
        padded.extend_from_slice(&[0xFF, 0xFF]);
        assert_eq!(decode_scalar::<u16>(&padded).unwrap(), 42);
    }

    #[test]
    fn test_decode_scalar_too_short() {
        let err = decode_scalar::<u32>(&[1, 2]).unwrap_err();
        assert_eq!(err, DecodeError::TooShort { required: 4, actual: 2 });
    }

    #[test]
    fn test_decode_texts() {
        let bytes = b"01/02/23 10:00:00\0\0 01/02/23 10:00:05\0\0\0";
        assert_eq!(
            decode_texts(bytes),
            vec!["01/02/23 10:00:00".to_string(), "01/02/23 10:00:05".to_string()]
        );
        assert_eq!(decode_text(b"sample_a\0junk"), Some("sample_a".to_string()));
        assert_eq!(decode_text(b"\0\0\0"), None);
    }

    #[test]
    fn test_decode_name_list() {
        let bytes = b"SampleX  SampleY\tDetEnc\0Energy\0\0";
        assert_eq!(decode_name_list(bytes), vec!["SampleX", "SampleY", "DetEnc", "Energy"]);
    }

    #[test]
    fn test_contiguous_decode() {
        let values = [1.0, 2.5, -3.0];
        let decoded = DecodeStrategy::Contiguous.decode(&contiguous(&values), 3).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_contiguous_rejects_length_mismatch() {
        let err = DecodeStrategy::Contiguous
            .decode(&contiguous(&[1.0, 2.0]), 3)
            .unwrap_err();
        assert_eq!(err, DecodeError::InvalidLength { expected: 12, actual: 8 });
    }

    #[test]
    fn test_padded_stride_decode() {
        let values = [10.0, 20.0, 30.0, 40.0];
        let bytes = padded(&values, PADDED_STRIDE_PADDING);
        assert_eq!(bytes.len(), 4 + 3 * 40);
        let decoded = DecodeStrategy::padded_stride().decode(&bytes, 4).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn test_fallback_order_prefers_contiguous() {
        let bytes = contiguous(&[1.0, 2.0]);
        let (values, used) = decode_with_fallback(&bytes, 2, &PER_FRAME_STRATEGIES).unwrap();
        assert_eq!(values, vec![1.0, 2.0]);
        assert_eq!(used, DecodeStrategy::Contiguous);
    }

    #[test]
    fn test_fallback_to_padded_stride() {
        let bytes = padded(&[0.5, 1.5, 2.5], PADDED_STRIDE_PADDING);
        let (values, used) = decode_with_fallback(&bytes, 3, &PER_FRAME_STRATEGIES).unwrap();
        assert_eq!(values[0], 0.5);
        assert_eq!(values, vec![0.5, 1.5, 2.5]);
        assert_eq!(used, DecodeStrategy::padded_stride());
    }

    #[test]
    fn test_single_frame_strategies_agree() {
        let bytes = contiguous(&[123.25]);
        let a = DecodeStrategy::Contiguous.decode(&bytes, 1).unwrap();
        let b = DecodeStrategy::padded_stride().decode(&bytes, 1).unwrap();
        assert_eq!(a, b);
        assert_eq!(a[0], 123.25);
    }

    #[test]
    fn test_fallback_failure_reports_last_strategy() {
        let err = decode_with_fallback(&[0u8; 7], 3, &PER_FRAME_STRATEGIES).unwrap_err();
        assert_eq!(err, DecodeError::InvalidLength { expected: 84, actual: 7 });
        assert_eq!(
            decode_with_fallback(&[], 0, &[]).unwrap_err(),
            DecodeError::NoStrategy
        );
    }

    #[test]
    fn test_zero_frames() {
        for strategy in PER_FRAME_STRATEGIES {
            assert!(strategy.decode(&[], 0).unwrap().is_empty());
        }
    }
}
