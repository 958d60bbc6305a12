//! Frame decoder: soft symbols to payload bytes
//!
//! Inverts the transmit coding chain for one frame of 2144 soft decisions
//! gated out by the sync tracker:
//!
//! ```text
//! soft ──► quantize [0,7] ──► deinterleave ──► Viterbi ──► pack bytes ──► derandomize
//! ```
//!
//! Byte packing reverses the encoder's byte order (the encoder consumes
//! frame bytes 133 down to 0, MSB first), so decoded bit 0 is the MSB of
//! frame byte 133.
//!
//! The returned [`DecodedFrame`] carries the two per-frame diagnostics the
//! consumer gets: the Viterbi path cost (0 on a clean channel) and the sync
//! correlation that governed the frame's acquisition.

use tracing::debug;

use crate::frame::Frame;
use crate::interleaver::BlockInterleaver;
use crate::params::{ENCODED_BITS, FRAME_BITS, FRAME_BYTES};
use crate::randomizer::FrameRandomizer;
use crate::types::{ModemError, ModemResult, SoftSymbol};
use crate::viterbi::{quantize_soft, ViterbiDecoder};

/// A decoded frame with its receive diagnostics.
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub frame: Frame,
    /// Minimum Viterbi path metric; 0 means a perfect frame.
    pub viterbi_cost: i32,
    /// Normalized sync correlation at acquisition, in [-1, 1].
    pub sync_quality: f64,
}

/// Decoder for one frame of soft decisions.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    interleaver: BlockInterleaver,
    viterbi: ViterbiDecoder,
    randomizer: FrameRandomizer,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            interleaver: BlockInterleaver::new(),
            viterbi: ViterbiDecoder::new(),
            randomizer: FrameRandomizer::new(),
        }
    }

    /// Decode 2144 soft decisions into a frame and its Viterbi cost.
    ///
    /// Fails with [`ModemError::DecodeFailure`] when the soft buffer is
    /// degenerate (no energy, so no viable path discrimination).
    pub fn decode(&mut self, soft: &[SoftSymbol]) -> ModemResult<(Frame, i32)> {
        if soft.len() != ENCODED_BITS {
            return Err(ModemError::BadFrameLength {
                expected: ENCODED_BITS,
                actual: soft.len(),
            });
        }

        let quantized = quantize_soft(soft)
            .ok_or_else(|| ModemError::DecodeFailure("soft buffer has no energy".into()))?;

        let deinterleaved = self.interleaver.deinterleave(&quantized);
        let (bits, cost) = self.viterbi.decode(&deinterleaved);
        debug_assert_eq!(bits.len(), FRAME_BITS);

        let mut bytes = pack_decoded_bits(&bits);
        self.randomizer.derandomize(&mut bytes);

        debug!(cost, "frame decoded");
        Ok((Frame::from_bytes(bytes), cost))
    }
}

/// Pack decoded information bits into frame bytes, inverting the encoder's
/// reversed byte order.
fn pack_decoded_bits(bits: &[u8]) -> [u8; FRAME_BYTES] {
    let mut bytes = [0u8; FRAME_BYTES];
    for (byte_idx, byte) in bytes.iter_mut().enumerate() {
        let mut b = 0u8;
        for j in 0..8 {
            b |= bits[FRAME_BITS - 1 - byte_idx * 8 - j] << j;
        }
        *byte = b;
    }
    bytes
}
