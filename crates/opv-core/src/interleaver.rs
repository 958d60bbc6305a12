//! 67×32 row-column block interleaver
//!
//! Disperses adjacent coded bits so channel burst errors arrive at the
//! Viterbi decoder as scattered single-bit errors. The 2144-bit frame is
//! written into a 67-row × 32-column array row-major and read column-major,
//! placing input bit `i` at intermediate position `(i mod 32)·67 + i/32`
//! (consecutive bits land 67 positions apart).
//!
//! On the air, bits are packed into bytes MSB first, so the intermediate
//! position is corrected to on-air order within each output byte:
//! `out = (p/8)·8 + (7 − p mod 8)`. The deinterleaver applies the exact
//! inverse; `deinterleave(interleave(x)) == x` for every 2144-bit buffer.

use crate::params::{ENCODED_BITS, INTERLEAVER_COLS, INTERLEAVER_ROWS};

/// Interleaved position of input bit `i`, including the MSB-first in-byte
/// correction.
#[inline]
pub fn interleave_index(i: usize) -> usize {
    debug_assert!(i < ENCODED_BITS);
    let p = (i % INTERLEAVER_COLS) * INTERLEAVER_ROWS + i / INTERLEAVER_COLS;
    (p / 8) * 8 + (7 - p % 8)
}

/// Block interleaver / deinterleaver over one coded frame.
///
/// Stateless apart from a scratch buffer; works on hard bits on the transmit
/// side and on soft or quantized values on the receive side.
#[derive(Debug, Clone, Default)]
pub struct BlockInterleaver;

impl BlockInterleaver {
    pub fn new() -> Self {
        Self
    }

    /// Permute a 2144-element bit buffer into on-air order.
    pub fn interleave(&self, bits: &mut [u8; ENCODED_BITS]) {
        let mut out = [0u8; ENCODED_BITS];
        for (i, &bit) in bits.iter().enumerate() {
            out[interleave_index(i)] = bit;
        }
        *bits = out;
    }

    /// Invert the permutation on a received buffer of values.
    ///
    /// Generic over the element type so it serves both hard bits and
    /// quantized soft decisions. `values` must hold exactly one coded frame.
    pub fn deinterleave<T: Copy + Default>(&self, values: &[T]) -> Vec<T> {
        debug_assert_eq!(values.len(), ENCODED_BITS);
        let mut out = vec![T::default(); ENCODED_BITS];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = values[interleave_index(i)];
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_is_bijection() {
        let mut seen = [false; ENCODED_BITS];
        for i in 0..ENCODED_BITS {
            let j = interleave_index(i);
            assert!(!seen[j], "position {j} hit twice");
            seen[j] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_adjacent_bits_dispersed() {
        // Without the in-byte correction, consecutive inputs land 67 apart;
        // the correction keeps them in distinct output bytes.
        for i in 0..100 {
            let a = interleave_index(i) / 8;
            let b = interleave_index(i + 1) / 8;
            assert_ne!(a, b, "bits {i} and {} share an output byte", i + 1);
        }
    }

    #[test]
    fn test_first_column_mapping() {
        // Input bit 0: p = 0, corrected to bit 7 of byte 0.
        assert_eq!(interleave_index(0), 7);
        // Input bit 1: p = 67, corrected to (8*8) + (7 - 3) = 68.
        assert_eq!(interleave_index(1), 68);
        // Input bit 32 starts the second row: p = 1, corrected to 6.
        assert_eq!(interleave_index(32), 6);
    }

    #[test]
    fn test_round_trip_bits() {
        let interleaver = BlockInterleaver::new();
        let mut bits = [0u8; ENCODED_BITS];
        for (i, b) in bits.iter_mut().enumerate() {
            *b = ((i * 31 + 7) % 2) as u8;
        }
        let original = bits;
        interleaver.interleave(&mut bits);
        assert_ne!(bits[..64], original[..64]);
        let restored = interleaver.deinterleave(&bits);
        assert_eq!(&restored[..], &original[..]);
    }

    #[test]
    fn test_round_trip_soft() {
        let interleaver = BlockInterleaver::new();
        let soft: Vec<f64> = (0..ENCODED_BITS).map(|i| i as f64 - 1000.0).collect();
        let mut on_air = [0.0f64; ENCODED_BITS];
        for (i, &v) in soft.iter().enumerate() {
            on_air[interleave_index(i)] = v;
        }
        let restored = interleaver.deinterleave(&on_air);
        assert_eq!(&restored[..], &soft[..]);
    }
}
