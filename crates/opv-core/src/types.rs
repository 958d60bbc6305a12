//! Core types for the OPV modem
//!
//! This module defines the fundamental types shared by the transmit and
//! receive chains: complex I/Q samples, soft decisions, and the error type
//! returned by fallible operations.
//!
//! ## Sample conventions
//!
//! Baseband math uses `Complex64` throughout. On the wire (both directions)
//! samples are interleaved signed 16-bit little-endian I and Q at
//! 2 168 000 samples/s, with a full-scale target amplitude of 16 383
//! (about half the int16 range); see [`crate::io`] for the byte conversion.
//!
//! A soft decision is one real scalar per symbol: the sign selects the hard
//! bit (positive favors bit 0), the magnitude carries confidence for the
//! Viterbi decoder.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Type alias for complex baseband samples using f64 precision.
pub type Complex = Complex64;

/// A single complex I/Q sample point.
pub type IQSample = Complex64;

/// One soft decision: sign → hard bit, magnitude → confidence.
pub type SoftSymbol = f64;

/// A raw int16 I/Q pair as exchanged with the SDR transport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawIQ {
    pub i: i16,
    pub q: i16,
}

impl RawIQ {
    pub fn new(i: i16, q: i16) -> Self {
        Self { i, q }
    }

    /// Widen to a complex sample without rescaling.
    #[inline]
    pub fn to_complex(self) -> Complex {
        Complex::new(self.i as f64, self.q as f64)
    }
}

/// Result type for modem operations.
pub type ModemResult<T> = Result<T, ModemError>;

/// Errors that can occur in the modem core.
///
/// Routine receive events (missed sync, low-confidence frames) are reported
/// through diagnostics rather than this enum; only conditions the caller must
/// handle appear here.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ModemError {
    #[error("frame must be {expected} bytes, got {actual}")]
    BadFrameLength { expected: usize, actual: usize },

    #[error("invalid Base-40 character {0:?} in callsign")]
    InvalidCallsignChar(char),

    #[error("callsign too long: {0} characters (maximum 9)")]
    CallsignTooLong(usize),

    #[error("invalid modem configuration: {0}")]
    InvalidConfig(String),

    #[error("frame decode failed: {0}")]
    DecodeFailure(String),
}

/// Helper functions for working with complex samples.
pub mod complex_ops {
    use super::*;
    use std::f64::consts::PI;

    /// Create a complex number from magnitude and phase.
    #[inline]
    pub fn from_polar(magnitude: f64, phase: f64) -> Complex {
        Complex::new(magnitude * phase.cos(), magnitude * phase.sin())
    }

    /// Power (magnitude squared) of a complex number.
    #[inline]
    pub fn power(c: Complex) -> f64 {
        c.norm_sqr()
    }

    /// Average power of a signal.
    pub fn average_power(samples: &[IQSample]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().map(|s| power(*s)).sum::<f64>() / samples.len() as f64
    }

    /// Wrap a phase accumulator to [-π, π].
    #[inline]
    pub fn wrap_phase(mut phase: f64) -> f64 {
        while phase > PI {
            phase -= 2.0 * PI;
        }
        while phase < -PI {
            phase += 2.0 * PI;
        }
        phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_from_polar() {
        let c = complex_ops::from_polar(1.0, PI / 4.0);
        assert_relative_eq!(c.re, 0.7071067811865476, epsilon = 1e-10);
        assert_relative_eq!(c.im, 0.7071067811865476, epsilon = 1e-10);
    }

    #[test]
    fn test_average_power() {
        let samples = vec![
            Complex::new(1.0, 0.0),
            Complex::new(0.0, 1.0),
            Complex::new(-1.0, 0.0),
            Complex::new(0.0, -1.0),
        ];
        assert_relative_eq!(complex_ops::average_power(&samples), 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_wrap_phase() {
        assert_relative_eq!(complex_ops::wrap_phase(3.0 * PI), PI, epsilon = 1e-10);
        assert_relative_eq!(complex_ops::wrap_phase(-3.0 * PI), -PI, epsilon = 1e-10);
        assert_relative_eq!(complex_ops::wrap_phase(0.5), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_raw_iq_to_complex() {
        let s = RawIQ::new(100, -200);
        let c = s.to_complex();
        assert_eq!(c.re, 100.0);
        assert_eq!(c.im, -200.0);
    }
}
