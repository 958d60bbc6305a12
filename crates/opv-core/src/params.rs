//! OPV numerology and modem configuration
//!
//! The OPV waveform is fixed-rate: 134-byte frames, rate-1/2 K=7 coding,
//! a 67×32 interleaver, 24-bit sync word, MSK at 54 200 symbols/s with
//! 40 samples per symbol. The constants here match the FPGA reference
//! implementation and must not drift; everything else in the crate derives
//! its sizing from them.
//!
//! ## Frame timing
//!
//! ```text
//! | sync (24 sym) |        payload (2144 sym)        |   = 2168 symbols
//! |<------------------- 40 ms ---------------------->|
//! ```
//!
//! Runtime-tunable behavior (AFC bandwidth, output amplitude, sync
//! thresholds, the low-confidence watchdog) lives in [`ModemParams`], built
//! through [`ModemParams::builder`]. Construction validates the configuration
//! and fails fast on nonsense like a zero sample rate.

use serde::{Deserialize, Serialize};

use crate::types::{ModemError, ModemResult};

/// Bytes in one frame before FEC (header + payload).
pub const FRAME_BYTES: usize = 134;
/// Information bits per frame.
pub const FRAME_BITS: usize = FRAME_BYTES * 8;
/// Coded bits per frame after rate-1/2 expansion.
pub const ENCODED_BITS: usize = FRAME_BITS * 2;

/// 24-bit sync word (PSLR optimized), sent MSB first.
pub const SYNC_WORD: u32 = 0x02B8DB;
/// Sync word length in bits.
pub const SYNC_BITS: usize = 24;
/// Symbols per on-air frame: sync plus coded payload.
pub const FRAME_SYMBOLS: usize = SYNC_BITS + ENCODED_BITS;

/// Row-column interleaver rows.
pub const INTERLEAVER_ROWS: usize = 67;
/// Row-column interleaver columns.
pub const INTERLEAVER_COLS: usize = 32;

/// Constraint length of the convolutional code (64 trellis states).
pub const CONV_K: usize = 7;
/// Generator mask for G1 = 171 octal against the {input, state} vector.
pub const G1_MASK: u8 = 0x4F;
/// Generator mask for G2 = 133 octal against the {input, state} vector.
pub const G2_MASK: u8 = 0x6D;

/// Baseband sample rate, samples per second.
pub const SAMPLE_RATE: f64 = 2_168_000.0;
/// Symbol (bit) rate, symbols per second.
pub const SYMBOL_RATE: f64 = 54_200.0;
/// Samples per symbol.
pub const SAMPLES_PER_SYMBOL: usize = 40;
/// MSK tone offset from center, Hz. Tones sit at ±13 550 Hz.
pub const FREQ_DEV: f64 = 13_550.0;

/// Full-scale int16 output amplitude (about 50% of range).
pub const DEFAULT_AMPLITUDE: f64 = 16_383.0;

const _: () = assert!(INTERLEAVER_ROWS * INTERLEAVER_COLS == ENCODED_BITS);
const _: () = assert!(FRAME_SYMBOLS == 2168);

/// Runtime modem configuration.
///
/// Defaults reproduce the reference numerology; the builder exposes the few
/// knobs that are legitimately tunable without breaking interoperability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModemParams {
    /// Sample rate in Hz.
    pub sample_rate: f64,
    /// Samples per symbol.
    pub samples_per_symbol: usize,
    /// Tone deviation from center in Hz.
    pub freq_dev: f64,
    /// TX output amplitude in int16 counts.
    pub amplitude: f64,
    /// Decision-directed AFC loop gain.
    pub afc_alpha: f64,
    /// AFC correction clamp in Hz.
    pub afc_max_offset: f64,
    /// Raw correlation threshold to leave HUNTING (inclusive).
    pub sync_raw_threshold: f64,
    /// Normalized correlation threshold to leave HUNTING (inclusive).
    pub sync_hunting_threshold: f64,
    /// Normalized correlation threshold to confirm sync while LOCKED.
    pub sync_locked_threshold: f64,
    /// Consecutive missed syncs tolerated before dropping to HUNTING.
    pub sync_miss_limit: u32,
    /// Viterbi cost above which a frame counts toward the low-confidence
    /// watchdog.
    pub high_cost_watermark: i32,
    /// Consecutive high-cost frames that force reacquisition.
    pub high_cost_limit: u32,
}

impl Default for ModemParams {
    fn default() -> Self {
        Self {
            sample_rate: SAMPLE_RATE,
            samples_per_symbol: SAMPLES_PER_SYMBOL,
            freq_dev: FREQ_DEV,
            amplitude: DEFAULT_AMPLITUDE,
            afc_alpha: 0.001,
            afc_max_offset: 2000.0,
            sync_raw_threshold: 5000.0,
            sync_hunting_threshold: 0.85,
            sync_locked_threshold: 0.40,
            sync_miss_limit: 5,
            high_cost_watermark: 1500,
            high_cost_limit: 3,
        }
    }
}

impl ModemParams {
    /// Create a builder seeded with the reference defaults.
    pub fn builder() -> ModemParamsBuilder {
        ModemParamsBuilder::default()
    }

    /// Symbol rate derived from sample rate and samples/symbol.
    pub fn symbol_rate(&self) -> f64 {
        self.sample_rate / self.samples_per_symbol as f64
    }

    /// Duration of one on-air frame in seconds.
    pub fn frame_duration(&self) -> f64 {
        FRAME_SYMBOLS as f64 / self.symbol_rate()
    }

    /// Samples per on-air frame.
    pub fn samples_per_frame(&self) -> usize {
        FRAME_SYMBOLS * self.samples_per_symbol
    }

    fn validate(&self) -> ModemResult<()> {
        if !(self.sample_rate > 0.0) {
            return Err(ModemError::InvalidConfig(format!(
                "sample rate must be positive, got {}",
                self.sample_rate
            )));
        }
        if self.samples_per_symbol < 2 {
            return Err(ModemError::InvalidConfig(format!(
                "need at least 2 samples per symbol, got {}",
                self.samples_per_symbol
            )));
        }
        if !(self.freq_dev > 0.0) || self.freq_dev >= self.sample_rate / 2.0 {
            return Err(ModemError::InvalidConfig(format!(
                "tone deviation {} Hz out of range for sample rate {}",
                self.freq_dev, self.sample_rate
            )));
        }
        if !(self.afc_alpha > 0.0) || self.afc_alpha > 1.0 {
            return Err(ModemError::InvalidConfig(format!(
                "AFC gain must be in (0, 1], got {}",
                self.afc_alpha
            )));
        }
        if self.sync_miss_limit == 0 {
            return Err(ModemError::InvalidConfig(
                "sync miss limit must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`ModemParams`].
#[derive(Debug, Default)]
pub struct ModemParamsBuilder {
    params: ModemParams,
}

impl ModemParamsBuilder {
    pub fn sample_rate(mut self, hz: f64) -> Self {
        self.params.sample_rate = hz;
        self
    }

    pub fn samples_per_symbol(mut self, n: usize) -> Self {
        self.params.samples_per_symbol = n;
        self
    }

    pub fn amplitude(mut self, counts: f64) -> Self {
        self.params.amplitude = counts;
        self
    }

    pub fn afc_alpha(mut self, alpha: f64) -> Self {
        self.params.afc_alpha = alpha;
        self
    }

    pub fn afc_max_offset(mut self, hz: f64) -> Self {
        self.params.afc_max_offset = hz;
        self
    }

    pub fn high_cost_watermark(mut self, cost: i32) -> Self {
        self.params.high_cost_watermark = cost;
        self
    }

    /// Validate and produce the final parameter set.
    pub fn build(self) -> ModemResult<ModemParams> {
        self.params.validate()?;
        Ok(self.params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_valid() {
        let params = ModemParams::builder().build().unwrap();
        assert_eq!(params.sample_rate, 2_168_000.0);
        assert_eq!(params.samples_per_symbol, 40);
    }

    #[test]
    fn test_symbol_rate() {
        let params = ModemParams::default();
        assert_eq!(params.symbol_rate(), 54_200.0);
    }

    #[test]
    fn test_frame_duration() {
        let params = ModemParams::default();
        assert!((params.frame_duration() - 0.04).abs() < 1e-12);
        assert_eq!(params.samples_per_frame(), 86_720);
    }

    #[test]
    fn test_zero_sample_rate_rejected() {
        let err = ModemParams::builder().sample_rate(0.0).build();
        assert!(err.is_err());
    }

    #[test]
    fn test_too_few_samples_per_symbol_rejected() {
        let err = ModemParams::builder().samples_per_symbol(1).build();
        assert!(err.is_err());
    }

    #[test]
    fn test_sizes_consistent() {
        assert_eq!(ENCODED_BITS, 2144);
        assert_eq!(FRAME_BITS, 1072);
        assert_eq!(INTERLEAVER_ROWS * INTERLEAVER_COLS, ENCODED_BITS);
    }
}
