//! # Opulent Voice Modem Core
//!
//! This crate implements the signal-processing core of the Opulent Voice
//! (OPV) digital radio modem: the transmit chain that turns a 134-byte frame
//! into complex baseband I/Q, and the streaming receive chain that inverts
//! it from noisy samples back into frames.
//!
//! ## Signal Flow
//!
//! ```text
//! TX: Frame → Randomize → Conv K=7 → Interleave 67×32 → Sync + MSK → I/Q
//! RX: I/Q → Coarse AFC → Symbol Demod → Sync Track → De-interleave
//!        → Viterbi → Derandomize → Frame
//! ```
//!
//! The coding chain is bit-exact with the FPGA reference implementation:
//! CCSDS whitening from seed 0xFF, the 0x4F/0x6D generator masks in
//! byte-reversed frame order, and the MSB-first 67×32 interleaver. The
//! modulator is the parallel-tone dual-NCO construction with the reference
//! differential-encoding state machine, phase-continuous across frames.
//!
//! ## Example
//!
//! ```rust,no_run
//! use opv_core::{Demodulator, Frame, ModemParams, Modulator};
//!
//! let params = ModemParams::builder().build().unwrap();
//!
//! let frame = Frame::builder()
//!     .station_id("W5NYV")
//!     .token(0xBBAADD)
//!     .data(b"hello")
//!     .build()
//!     .unwrap();
//!
//! // One modulator owns one TX session's state (phase persists across
//! // frames); one demodulator owns one RX session's state.
//! let mut tx = Modulator::new(&params);
//! let samples = tx.modulate(&frame);
//!
//! let mut rx = Demodulator::new(&params);
//! for decoded in rx.process(&samples) {
//!     println!(
//!         "{} cost={} sync={:.2}",
//!         decoded.frame.station_id(),
//!         decoded.viterbi_cost,
//!         decoded.sync_quality
//!     );
//! }
//! ```
//!
//! The crate is silent by default; install a `tracing` subscriber to see
//! acquisition, sync-state, and confidence diagnostics.

pub mod callsign;
pub mod convolutional;
pub mod demodulation;
pub mod demodulator;
pub mod frame;
pub mod frame_decoder;
pub mod interleaver;
pub mod io;
pub mod modulation;
pub mod modulator;
pub mod params;
pub mod randomizer;
pub mod sync_tracker;
pub mod types;
pub mod viterbi;

pub use callsign::{decode_callsign, encode_callsign};
pub use convolutional::{ConvolutionalEncoder, Trellis};
pub use demodulation::Demodulator;
pub use demodulator::SymbolDemodulator;
pub use frame::{Frame, FrameBuilder, FLAG_BERT, FLAG_LAST_FRAME};
pub use frame_decoder::{DecodedFrame, FrameDecoder};
pub use interleaver::BlockInterleaver;
pub use modulation::Modulator;
pub use modulator::MskModulator;
pub use params::{ModemParams, FRAME_BYTES, SAMPLE_RATE, SYMBOL_RATE, SYNC_WORD};
pub use randomizer::{CcsdsLfsr, FrameRandomizer};
pub use sync_tracker::{SyncState, SyncTracker, TrackedFrame};
pub use types::{Complex, IQSample, ModemError, ModemResult, RawIQ, SoftSymbol};
pub use viterbi::ViterbiDecoder;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::demodulation::Demodulator;
    pub use crate::frame::Frame;
    pub use crate::frame_decoder::DecodedFrame;
    pub use crate::modulation::Modulator;
    pub use crate::params::ModemParams;
    pub use crate::sync_tracker::SyncState;
    pub use crate::types::{Complex, ModemError, ModemResult, RawIQ};
}
