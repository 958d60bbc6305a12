//! Soft-decision Viterbi decoder
//!
//! Maximum-likelihood decoder for the K=7 rate-1/2 code of
//! [`crate::convolutional`]. The 64-state trellis tables are generated by
//! [`Trellis::new`] from the encoder's own branch function, so encoder and
//! decoder share one source of truth for the polynomial masks and the state
//! update rule.
//!
//! ## Soft metrics
//!
//! Received soft decisions are quantized to integers in [0, 7]
//! (`SOFT_MAX` = 7) against the frame's average soft magnitude:
//! `q = clip(round((−soft/avg)·3.5 + 3.5))`, so q = 0 means a confident
//! bit 0 and q = 7 a confident bit 1. The branch metric for an expected bit
//! `e` is `q` when e = 0 and `SOFT_MAX − q` when e = 1; each trellis step
//! costs the sum of the G1 and G2 metrics.
//!
//! The code runs unterminated: path metrics start at 0 for state 0 and +∞
//! elsewhere, survivors cover the full frame (no windowed traceback), and
//! traceback begins from the state with the globally minimum metric. The
//! minimum metric is returned as the frame cost — zero on a clean channel,
//! and a degradation signal for the tracker's watchdog when it stays high.

use crate::convolutional::{Trellis, NUM_STATES};
use crate::types::SoftSymbol;

/// Maximum quantized soft value.
pub const SOFT_MAX: i32 = 7;

const METRIC_INF: i32 = i32::MAX;

/// Quantize soft decisions to [0, 7] against their average magnitude.
///
/// Returns `None` when the buffer has no usable energy (degenerate input
/// that would otherwise quantize to all-middle values).
pub fn quantize_soft(soft: &[SoftSymbol]) -> Option<Vec<i32>> {
    if soft.is_empty() {
        return Some(Vec::new());
    }
    let avg = soft.iter().map(|s| s.abs()).sum::<f64>() / soft.len() as f64;
    if avg < 1e-10 {
        return None;
    }
    Some(
        soft.iter()
            .map(|&s| {
                let n = (-s / avg) * 3.5 + 3.5;
                ((n + 0.5) as i32).clamp(0, SOFT_MAX)
            })
            .collect(),
    )
}

/// 64-state soft-decision Viterbi decoder.
#[derive(Debug, Clone)]
pub struct ViterbiDecoder {
    trellis: Trellis,
}

impl Default for ViterbiDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ViterbiDecoder {
    pub fn new() -> Self {
        Self {
            trellis: Trellis::new(),
        }
    }

    /// Decode quantized soft pairs into information bits.
    ///
    /// `soft` holds (g1, g2) quanta per trellis step, each in [0, 7]; its
    /// length must be even. Returns the decoded bits in chronological order
    /// together with the minimum path metric. Empty input decodes to an
    /// empty output at cost zero.
    pub fn decode(&self, soft: &[i32]) -> (Vec<u8>, i32) {
        debug_assert!(soft.len() % 2 == 0, "soft input must hold (g1, g2) pairs");
        let num_steps = soft.len() / 2;
        if num_steps == 0 {
            return (Vec::new(), 0);
        }

        let mut metrics = [METRIC_INF; NUM_STATES];
        metrics[0] = 0;

        // decisions[t][s]: whether the survivor into state s at step t came
        // from the upper predecessor.
        let mut decisions: Vec<[u8; NUM_STATES]> = vec![[0; NUM_STATES]; num_steps];

        for (t, decision_row) in decisions.iter_mut().enumerate() {
            let sg1 = soft[t * 2];
            let sg2 = soft[t * 2 + 1];
            let mut next = [METRIC_INF; NUM_STATES];

            for state in 0..NUM_STATES {
                let (p0, p1, input) = Trellis::predecessors(state);
                let input = input as usize;

                let (e1_0, e2_0) = self.trellis.output[p0][input];
                let (e1_1, e2_1) = self.trellis.output[p1][input];

                let bm0 = branch_metric(e1_0, sg1) + branch_metric(e2_0, sg2);
                let bm1 = branch_metric(e1_1, sg1) + branch_metric(e2_1, sg2);

                let m0 = saturating_path(metrics[p0], bm0);
                let m1 = saturating_path(metrics[p1], bm1);

                if m0 <= m1 {
                    next[state] = m0;
                    decision_row[state] = 0;
                } else {
                    next[state] = m1;
                    decision_row[state] = 1;
                }
            }
            metrics = next;
        }

        // The code is unterminated: trace back from the globally best state,
        // not from state 0.
        let mut best_state = 0;
        for state in 1..NUM_STATES {
            if metrics[state] < metrics[best_state] {
                best_state = state;
            }
        }
        let cost = metrics[best_state];

        let mut bits = vec![0u8; num_steps];
        let mut state = best_state;
        for t in (0..num_steps).rev() {
            bits[t] = (state & 1) as u8;
            state = if decisions[t][state] == 0 {
                state >> 1
            } else {
                (state >> 1) + NUM_STATES / 2
            };
        }

        (bits, cost)
    }
}

#[inline]
fn branch_metric(expected: u8, q: i32) -> i32 {
    if expected == 0 {
        q
    } else {
        SOFT_MAX - q
    }
}

#[inline]
fn saturating_path(metric: i32, branch: i32) -> i32 {
    if metric >= METRIC_INF - 16 {
        METRIC_INF
    } else {
        metric + branch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convolutional::ConvolutionalEncoder;

    /// Encode bits and map the output to confident quanta.
    fn encode_to_quanta(bits: &[u8]) -> Vec<i32> {
        let mut enc = ConvolutionalEncoder::new();
        let mut quanta = Vec::with_capacity(bits.len() * 2);
        for &b in bits {
            let (g1, g2) = enc.encode_bit(b);
            quanta.push(g1 as i32 * SOFT_MAX);
            quanta.push(g2 as i32 * SOFT_MAX);
        }
        quanta
    }

    fn test_pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| ((i * 29 + 11) % 7 % 2) as u8).collect()
    }

    #[test]
    fn test_clean_round_trip() {
        let bits = test_pattern(1072);
        let quanta = encode_to_quanta(&bits);
        let decoder = ViterbiDecoder::new();
        let (decoded, cost) = decoder.decode(&quanta);
        assert_eq!(decoded, bits);
        assert_eq!(cost, 0);
    }

    #[test]
    fn test_empty_input() {
        let decoder = ViterbiDecoder::new();
        let (decoded, cost) = decoder.decode(&[]);
        assert!(decoded.is_empty());
        assert_eq!(cost, 0);
    }

    #[test]
    fn test_single_error_corrected() {
        let bits = test_pattern(256);
        let mut quanta = encode_to_quanta(&bits);
        quanta[100] = SOFT_MAX - quanta[100]; // one confident wrong bit
        let decoder = ViterbiDecoder::new();
        let (decoded, cost) = decoder.decode(&quanta);
        assert_eq!(decoded, bits);
        assert_eq!(cost, SOFT_MAX);
    }

    #[test]
    fn test_scattered_errors_corrected() {
        let bits = test_pattern(512);
        let mut quanta = encode_to_quanta(&bits);
        // Well-separated single-bit errors are each within the code's
        // correcting power.
        for &idx in &[40, 300, 601, 950] {
            quanta[idx] = SOFT_MAX - quanta[idx];
        }
        let decoder = ViterbiDecoder::new();
        let (decoded, cost) = decoder.decode(&quanta);
        assert_eq!(decoded, bits);
        assert_eq!(cost, 4 * SOFT_MAX);
    }

    #[test]
    fn test_weak_soft_bits_still_decode() {
        let bits = test_pattern(128);
        let quanta: Vec<i32> = encode_to_quanta(&bits)
            .iter()
            .map(|&q| if q == 0 { 2 } else { 5 }) // low confidence
            .collect();
        let decoder = ViterbiDecoder::new();
        let (decoded, cost) = decoder.decode(&quanta);
        assert_eq!(decoded, bits);
        // Every branch on the winning path costs 2 per bit.
        assert_eq!(cost, 2 * 2 * 128);
    }

    #[test]
    fn test_unterminated_tail_decodes() {
        // No tail bits are appended; the final information bits must still
        // come out right via the global-minimum traceback.
        let mut bits = test_pattern(64);
        bits[63] = 1;
        bits[62] = 1;
        let quanta = encode_to_quanta(&bits);
        let decoder = ViterbiDecoder::new();
        let (decoded, _) = decoder.decode(&quanta);
        assert_eq!(decoded[62..], bits[62..]);
    }

    #[test]
    fn test_quantize_extremes() {
        // Symmetric soft values: avg = 1, so ±1 map to the rails.
        let soft = vec![1.0, -1.0, 1.0, -1.0];
        let q = quantize_soft(&soft).unwrap();
        assert_eq!(q, vec![0, 7, 0, 7]);
    }

    #[test]
    fn test_quantize_midpoint() {
        let soft = vec![0.0, 1.0, -1.0, 0.0];
        let q = quantize_soft(&soft).unwrap();
        // avg = 0.5; zeros sit at the midpoint 3.5, rounding to 4.
        assert_eq!(q[0], 4);
        assert_eq!(q[3], 4);
        assert_eq!(q[1], 0);
        assert_eq!(q[2], 7);
    }

    #[test]
    fn test_quantize_degenerate() {
        assert!(quantize_soft(&[0.0; 16]).is_none());
        assert_eq!(quantize_soft(&[]).unwrap(), Vec::<i32>::new());
    }

    #[test]
    fn test_quantize_clipped() {
        // Outliers beyond ±avg clip to the rails.
        let soft = vec![10.0, -10.0, 0.1, -0.1];
        let q = quantize_soft(&soft).unwrap();
        assert_eq!(q[0], 0);
        assert_eq!(q[1], 7);
    }
}
