//! OPV receive chain
//!
//! Assembles the streaming demodulation pipeline:
//!
//! ```text
//! int16 I/Q at 2.168 MS/s
//!    │
//!    ▼
//! ┌──────────────────┐
//! │ Coarse AFC       │  grid search, once per acquisition
//! └──────────────────┘
//!    │
//!    ▼
//! ┌──────────────────┐
//! │ Symbol demod     │  dual-tone integrate-and-dump + DD-AFC
//! └──────────────────┘
//!    │ soft decisions
//!    ▼
//! ┌──────────────────┐
//! │ Sync tracker     │  HUNTING → VERIFYING → LOCKED, flywheel
//! └──────────────────┘
//!    │ 2144-soft frames
//!    ▼
//! ┌──────────────────┐
//! │ Frame decoder    │  deinterleave → Viterbi → derandomize
//! └──────────────────┘
//!    │
//!    ▼
//! 134-byte frames + diagnostics
//! ```
//!
//! Samples may arrive in arbitrary bounded chunks; the coarse frequency
//! search runs on the first chunk (which per the external contract holds at
//! least one frame), and the per-symbol pipeline runs continuously
//! thereafter. Frames are emitted in sync-word order, each with its Viterbi
//! cost and acquisition correlation.
//!
//! A low-confidence watchdog counts consecutive frames whose cost exceeds
//! the configured watermark; at the limit it forces the tracker back to
//! HUNTING (LO phases and the AFC estimate are preserved to speed
//! reacquisition). Frames that fail to decode outright are dropped with a
//! warning; everything else is delivered and left to the consumer to
//! validate.

use tracing::{debug, warn};

use crate::demodulator::SymbolDemodulator;
use crate::frame_decoder::{DecodedFrame, FrameDecoder};
use crate::params::ModemParams;
use crate::sync_tracker::{SyncState, SyncTracker};
use crate::types::{Complex, RawIQ};

/// Full OPV receive pipeline.
#[derive(Debug)]
pub struct Demodulator {
    symbol_demod: SymbolDemodulator,
    tracker: SyncTracker,
    decoder: FrameDecoder,
    coarse_done: bool,
    coarse_offset: f64,
    high_cost_run: u32,
    high_cost_watermark: i32,
    high_cost_limit: u32,
}

impl Demodulator {
    pub fn new(params: &ModemParams) -> Self {
        Self {
            symbol_demod: SymbolDemodulator::new(params),
            tracker: SyncTracker::new(params),
            decoder: FrameDecoder::new(),
            coarse_done: false,
            coarse_offset: 0.0,
            high_cost_run: 0,
            high_cost_watermark: params.high_cost_watermark,
            high_cost_limit: params.high_cost_limit,
        }
    }

    /// Current sync tracker state.
    pub fn sync_state(&self) -> SyncState {
        self.tracker.state()
    }

    /// Current AFC residual-offset estimate in Hz.
    pub fn freq_offset(&self) -> f64 {
        self.symbol_demod.freq_offset()
    }

    /// The coarse grid-search estimate from acquisition, in Hz.
    pub fn coarse_offset(&self) -> f64 {
        self.coarse_offset
    }

    /// Total frames gated out by the tracker so far.
    pub fn frames_detected(&self) -> u64 {
        self.tracker.frames_detected()
    }

    /// Restore the whole receive chain to its initial state, including the
    /// AFC estimate; the next chunk re-runs coarse acquisition.
    pub fn reset(&mut self) {
        self.symbol_demod.reset();
        self.tracker.reset();
        self.coarse_done = false;
        self.coarse_offset = 0.0;
        self.high_cost_run = 0;
    }

    /// Consume a chunk of complex samples, returning any frames completed.
    pub fn process_complex(&mut self, samples: &[Complex]) -> Vec<DecodedFrame> {
        if !self.coarse_done && !samples.is_empty() {
            let offset = self.symbol_demod.estimate_offset(samples);
            self.symbol_demod.set_freq_offset(offset);
            self.coarse_offset = offset;
            self.coarse_done = true;
            debug!(offset_hz = offset, "coarse acquisition complete");
        }

        let soft = self.symbol_demod.process(samples);

        let mut frames = Vec::new();
        for s in soft {
            let Some(tracked) = self.tracker.process(s) else {
                continue;
            };
            match self.decoder.decode(&tracked.soft) {
                Ok((frame, cost)) => {
                    self.watch_confidence(cost);
                    frames.push(DecodedFrame {
                        frame,
                        viterbi_cost: cost,
                        sync_quality: tracked.sync_quality,
                    });
                }
                Err(e) => {
                    warn!(error = %e, "frame dropped");
                }
            }
        }
        frames
    }

    /// Consume a chunk of raw int16 I/Q pairs.
    pub fn process(&mut self, samples: &[RawIQ]) -> Vec<DecodedFrame> {
        let complex: Vec<Complex> = samples.iter().map(|s| s.to_complex()).collect();
        self.process_complex(&complex)
    }

    /// Track consecutive high-cost frames; force reacquisition at the limit.
    fn watch_confidence(&mut self, cost: i32) {
        if cost > self.high_cost_watermark {
            self.high_cost_run += 1;
            warn!(
                cost,
                run = self.high_cost_run,
                "low-confidence frame delivered"
            );
            if self.high_cost_run >= self.high_cost_limit {
                warn!("sustained low confidence, forcing reacquisition");
                self.tracker.force_hunting();
                self.high_cost_run = 0;
            }
        } else {
            self.high_cost_run = 0;
        }
    }
}
