//! OPV transmit chain
//!
//! Assembles the full modulation pipeline:
//!
//! ```text
//! 134-byte Frame
//!    │
//!    ▼
//! ┌─────────────┐
//! │ Randomizer  │  CCSDS LFSR whitening, reseeded per frame
//! └─────────────┘
//!    │
//!    ▼
//! ┌─────────────┐
//! │ Conv K=7    │  rate 1/2, bytes 133→0, MSB first
//! └─────────────┘
//!    │
//!    ▼
//! ┌─────────────┐
//! │ Interleave  │  67×32 row-column, MSB-first packing
//! └─────────────┘
//!    │
//!    ▼
//! ┌─────────────┐
//! │ Sync + MSK  │  0x02B8DB then 2144 bits, 40 samples/symbol
//! └─────────────┘
//!    │
//!    ▼
//! int16 I/Q at 2.168 MS/s
//! ```
//!
//! The MSK modulator's NCO phases and FSM registers persist across frames:
//! consecutive frames emit contiguous I/Q with no padding or phase
//! discontinuity. One [`Modulator`] owns one transmit session's state.

use crate::convolutional::ConvolutionalEncoder;
use crate::frame::Frame;
use crate::interleaver::BlockInterleaver;
use crate::modulator::MskModulator;
use crate::params::{ModemParams, ENCODED_BITS};
use crate::randomizer::FrameRandomizer;
use crate::types::RawIQ;

/// Full OPV transmit pipeline.
#[derive(Debug, Clone)]
pub struct Modulator {
    randomizer: FrameRandomizer,
    encoder: ConvolutionalEncoder,
    interleaver: BlockInterleaver,
    msk: MskModulator,
    samples_per_frame: usize,
}

impl Modulator {
    pub fn new(params: &ModemParams) -> Self {
        Self {
            randomizer: FrameRandomizer::new(),
            encoder: ConvolutionalEncoder::new(),
            interleaver: BlockInterleaver::new(),
            msk: MskModulator::new(params),
            samples_per_frame: params.samples_per_frame(),
        }
    }

    /// Run the coding chain only: payload to 2144 interleaved bits.
    ///
    /// Exposed separately so tests and diagnostics can inject errors between
    /// coding and modulation.
    pub fn encode_frame(&mut self, frame: &Frame) -> Vec<u8> {
        let mut randomized = *frame.as_bytes();
        self.randomizer.randomize(&mut randomized);

        let encoded = self.encoder.encode_frame(&randomized);

        let mut bits = [0u8; ENCODED_BITS];
        bits.copy_from_slice(&encoded);
        self.interleaver.interleave(&mut bits);
        bits.to_vec()
    }

    /// Modulate pre-encoded bits as one on-air frame: sync word first, then
    /// the 2144 payload bits.
    pub fn modulate_encoded(&mut self, bits: &[u8]) -> Vec<RawIQ> {
        let mut samples = Vec::with_capacity(self.samples_per_frame);
        self.msk.modulate_sync_into(&mut samples);
        for &bit in bits {
            self.msk.modulate_bit_into(bit, &mut samples);
        }
        samples
    }

    /// Modulate one frame: the complete TX chain.
    pub fn modulate(&mut self, frame: &Frame) -> Vec<RawIQ> {
        let encoded = self.encode_frame(frame);
        self.modulate_encoded(&encoded)
    }

    /// Access the underlying MSK modulator (preamble and carrier
    /// generation).
    pub fn msk(&mut self) -> &mut MskModulator {
        &mut self.msk
    }

    /// Restore start-of-transmission state.
    pub fn reset(&mut self) {
        self.encoder.reset();
        self.msk.reset();
    }
}
