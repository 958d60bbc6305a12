//! Dual-tone MSK symbol demodulator with AFC
//!
//! Converts raw complex baseband samples into one soft decision per 40-sample
//! symbol interval. Two local oscillators track the MSK tones at
//! (−13 550 + Δf) and (+13 550 + Δf) Hz; over each symbol the input is
//! correlated against both (integrate-and-dump), and the soft decision is the
//! tone energy difference `|corr_f2|² − |corr_f1|²` — positive favors bit 0,
//! negative favors bit 1, magnitude carries confidence.
//!
//! ## Frequency control
//!
//! Two mechanisms share the residual-offset estimate Δf:
//!
//! - **Coarse acquisition** ([`SymbolDemodulator::estimate_offset`]): a grid
//!   search over Δf ∈ [−1500, +1500] Hz in 25 Hz steps, refined ±30 Hz in
//!   5 Hz steps, maximizing total tone energy over the first ≤1000 symbols.
//!   Run once per acquisition.
//! - **Decision-directed AFC**: per symbol, the phase rotation of the
//!   dominant correlator relative to its previous value measures the
//!   frequency error; Δf integrates it with gain α (default 0.001), clamped
//!   to ±2000 Hz, and the LO increments are recomputed.
//!
//! The demodulator is streaming: samples may arrive in arbitrary chunks, and
//! a partial symbol is carried across calls. Symbol boundaries are assumed
//! sample-aligned.

use std::f64::consts::PI;

use num_complex::Complex64;
use tracing::debug;

use crate::params::ModemParams;
use crate::types::{complex_ops::wrap_phase, Complex, SoftSymbol};

/// Per-symbol dual-tone integrate-and-dump demodulator.
#[derive(Debug, Clone)]
pub struct SymbolDemodulator {
    sample_rate: f64,
    samples_per_symbol: usize,
    freq_dev: f64,
    afc_alpha: f64,
    afc_max_offset: f64,

    /// Residual carrier offset estimate, Hz.
    freq_offset: f64,
    /// LO phases, radians.
    phase_f1: f64,
    phase_f2: f64,
    /// Correlator outputs of the previous symbol, for the AFC discriminator.
    prev_corr_f1: Complex,
    prev_corr_f2: Complex,
    /// Symbols emitted since construction or reset.
    symbols_processed: u64,
    /// Partial-symbol samples carried between streaming calls.
    pending: Vec<Complex>,
}

impl SymbolDemodulator {
    pub fn new(params: &ModemParams) -> Self {
        Self {
            sample_rate: params.sample_rate,
            samples_per_symbol: params.samples_per_symbol,
            freq_dev: params.freq_dev,
            afc_alpha: params.afc_alpha,
            afc_max_offset: params.afc_max_offset,
            freq_offset: 0.0,
            phase_f1: 0.0,
            phase_f2: 0.0,
            prev_corr_f1: Complex64::new(0.0, 0.0),
            prev_corr_f2: Complex64::new(0.0, 0.0),
            symbols_processed: 0,
            pending: Vec::new(),
        }
    }

    /// Restore all state, including the AFC offset and LO phases.
    pub fn reset(&mut self) {
        self.freq_offset = 0.0;
        self.phase_f1 = 0.0;
        self.phase_f2 = 0.0;
        self.prev_corr_f1 = Complex64::new(0.0, 0.0);
        self.prev_corr_f2 = Complex64::new(0.0, 0.0);
        self.symbols_processed = 0;
        self.pending.clear();
    }

    /// Current residual-offset estimate in Hz.
    pub fn freq_offset(&self) -> f64 {
        self.freq_offset
    }

    /// Seed the offset estimate (normally from [`Self::estimate_offset`]).
    pub fn set_freq_offset(&mut self, offset: f64) {
        self.freq_offset = offset;
    }

    /// Override the AFC loop gain.
    pub fn set_afc_alpha(&mut self, alpha: f64) {
        self.afc_alpha = alpha;
    }

    fn symbol_rate(&self) -> f64 {
        self.sample_rate / self.samples_per_symbol as f64
    }

    /// Total tone energy of `samples` when demodulated at a trial offset.
    ///
    /// Sums `|corr_f1|² + |corr_f2|²` per symbol (MSK puts each symbol's
    /// energy in one tone or the other) over at most 1000 symbols.
    fn tone_energy(&self, samples: &[Complex], offset: f64) -> f64 {
        let inc_f1 = 2.0 * PI * (-self.freq_dev + offset) / self.sample_rate;
        let inc_f2 = 2.0 * PI * (self.freq_dev + offset) / self.sample_rate;
        let num_symbols = (samples.len() / self.samples_per_symbol).min(1000);

        let mut phase_f1 = 0.0f64;
        let mut phase_f2 = 0.0f64;
        let mut total = 0.0;
        for sym in 0..num_symbols {
            let mut corr_f1 = Complex64::new(0.0, 0.0);
            let mut corr_f2 = Complex64::new(0.0, 0.0);
            for i in 0..self.samples_per_symbol {
                let s = samples[sym * self.samples_per_symbol + i];
                corr_f1 += s * Complex64::new(phase_f1.cos(), phase_f1.sin()).conj();
                corr_f2 += s * Complex64::new(phase_f2.cos(), phase_f2.sin()).conj();
                phase_f1 += inc_f1;
                phase_f2 += inc_f2;
            }
            total += corr_f1.norm_sqr() + corr_f2.norm_sqr();
        }
        total
    }

    /// Coarse residual-carrier estimate by grid search.
    ///
    /// Scans [−1500, +1500] Hz in 25 Hz steps, then ±30 Hz around the best
    /// cell in 5 Hz steps. Returns the offset in Hz; does not modify state.
    /// The estimate seeds the decision-directed loop, which tracks out the
    /// residual it leaves.
    pub fn estimate_offset(&self, samples: &[Complex]) -> f64 {
        let mut best_offset = 0.0;
        let mut best_energy = 0.0;

        for step in 0..=120 {
            let offset = -1500.0 + 25.0 * step as f64;
            let energy = self.tone_energy(samples, offset);
            if energy > best_energy {
                best_energy = energy;
                best_offset = offset;
            }
        }

        let coarse_best = best_offset;
        for step in 0..=12 {
            let offset = coarse_best - 30.0 + 5.0 * step as f64;
            let energy = self.tone_energy(samples, offset);
            if energy > best_energy {
                best_energy = energy;
                best_offset = offset;
            }
        }

        debug!(offset_hz = best_offset, "coarse frequency estimate");
        best_offset
    }

    /// Demodulate a chunk of samples into soft decisions.
    ///
    /// Whole symbols are consumed; a trailing partial symbol is buffered for
    /// the next call. Symbols are emitted in strict input order.
    pub fn process(&mut self, samples: &[Complex]) -> Vec<SoftSymbol> {
        self.pending.extend_from_slice(samples);

        let sps = self.samples_per_symbol;
        let num_symbols = self.pending.len() / sps;
        let mut soft = Vec::with_capacity(num_symbols);

        let mut inc_f1 = 2.0 * PI * (-self.freq_dev + self.freq_offset) / self.sample_rate;
        let mut inc_f2 = 2.0 * PI * (self.freq_dev + self.freq_offset) / self.sample_rate;

        for sym in 0..num_symbols {
            let mut corr_f1 = Complex64::new(0.0, 0.0);
            let mut corr_f2 = Complex64::new(0.0, 0.0);

            for i in 0..sps {
                let s = self.pending[sym * sps + i];
                let lo_f1 = Complex64::new(self.phase_f1.cos(), self.phase_f1.sin());
                let lo_f2 = Complex64::new(self.phase_f2.cos(), self.phase_f2.sin());
                corr_f1 += s * lo_f1.conj();
                corr_f2 += s * lo_f2.conj();
                self.phase_f1 += inc_f1;
                self.phase_f2 += inc_f2;
            }
            self.phase_f1 = wrap_phase(self.phase_f1);
            self.phase_f2 = wrap_phase(self.phase_f2);

            let f1_energy = corr_f1.norm_sqr();
            let f2_energy = corr_f2.norm_sqr();
            soft.push(f2_energy - f1_energy);

            // Decision-directed AFC on the dominant tone's symbol-to-symbol
            // phase rotation.
            if self.symbols_processed > 0 {
                let (dominant, prev) = if f1_energy > f2_energy {
                    (corr_f1, self.prev_corr_f1)
                } else {
                    (corr_f2, self.prev_corr_f2)
                };
                let phase_diff = (dominant * prev.conj()).arg();
                let freq_err = phase_diff * self.symbol_rate() / (2.0 * PI);
                self.freq_offset = (self.freq_offset + self.afc_alpha * freq_err)
                    .clamp(-self.afc_max_offset, self.afc_max_offset);
                inc_f1 = 2.0 * PI * (-self.freq_dev + self.freq_offset) / self.sample_rate;
                inc_f2 = 2.0 * PI * (self.freq_dev + self.freq_offset) / self.sample_rate;
            }

            self.prev_corr_f1 = corr_f1;
            self.prev_corr_f2 = corr_f2;
            self.symbols_processed += 1;
        }

        self.pending.drain(..num_symbols * sps);
        soft
    }
}
