//! I/Q sample byte format
//!
//! The SDR transport exchanges interleaved signed 16-bit little-endian I and
//! Q (the SigMF "ci16_le" layout): four bytes per complex sample, I first,
//! at exactly 2 168 000 samples/s. These helpers convert between that byte
//! stream, [`RawIQ`] pairs, and `Complex64` baseband used by the DSP.
//!
//! | direction | layout |
//! |---|---|
//! | wire → DSP | `[i_lo, i_hi, q_lo, q_hi]` per sample |
//! | DSP → wire | same, values as produced by the modulator (±16 383 full scale) |

use crate::types::{Complex, RawIQ};

/// Bytes per complex sample on the wire.
pub const BYTES_PER_SAMPLE: usize = 4;

/// Parse ci16_le bytes into raw I/Q pairs.
///
/// Only whole samples are consumed; up to three trailing bytes (a partial
/// sample, e.g. a short read) are ignored. Callers carrying streams across
/// reads should buffer to multiples of [`BYTES_PER_SAMPLE`].
pub fn bytes_to_raw(bytes: &[u8]) -> Vec<RawIQ> {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|c| RawIQ {
            i: i16::from_le_bytes([c[0], c[1]]),
            q: i16::from_le_bytes([c[2], c[3]]),
        })
        .collect()
}

/// Serialize raw I/Q pairs to ci16_le bytes.
pub fn raw_to_bytes(samples: &[RawIQ]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * BYTES_PER_SAMPLE);
    for s in samples {
        bytes.extend_from_slice(&s.i.to_le_bytes());
        bytes.extend_from_slice(&s.q.to_le_bytes());
    }
    bytes
}

/// Widen raw pairs to complex baseband without rescaling.
pub fn raw_to_complex(samples: &[RawIQ]) -> Vec<Complex> {
    samples.iter().map(|s| s.to_complex()).collect()
}

/// Parse ci16_le bytes straight to complex baseband.
pub fn bytes_to_complex(bytes: &[u8]) -> Vec<Complex> {
    bytes
        .chunks_exact(BYTES_PER_SAMPLE)
        .map(|c| {
            Complex::new(
                i16::from_le_bytes([c[0], c[1]]) as f64,
                i16::from_le_bytes([c[2], c[3]]) as f64,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let samples = vec![
            RawIQ::new(0, 0),
            RawIQ::new(16383, -16383),
            RawIQ::new(-32768, 32767),
            RawIQ::new(1, -1),
        ];
        let bytes = raw_to_bytes(&samples);
        assert_eq!(bytes.len(), samples.len() * BYTES_PER_SAMPLE);
        assert_eq!(bytes_to_raw(&bytes), samples);
    }

    #[test]
    fn test_little_endian_layout() {
        let bytes = raw_to_bytes(&[RawIQ::new(0x0102, 0x0304)]);
        assert_eq!(bytes, vec![0x02, 0x01, 0x04, 0x03]);
    }

    #[test]
    fn test_partial_sample_ignored() {
        let mut bytes = raw_to_bytes(&[RawIQ::new(5, 6)]);
        bytes.extend_from_slice(&[0xAA, 0xBB]);
        let samples = bytes_to_raw(&bytes);
        assert_eq!(samples, vec![RawIQ::new(5, 6)]);
    }

    #[test]
    fn test_bytes_to_complex() {
        let bytes = raw_to_bytes(&[RawIQ::new(100, -200)]);
        let complex = bytes_to_complex(&bytes);
        assert_eq!(complex[0].re, 100.0);
        assert_eq!(complex[0].im, -200.0);
    }
}
