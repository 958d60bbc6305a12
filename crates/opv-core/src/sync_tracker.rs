//! Sync word tracking state machine
//!
//! Locates sync words in the soft-symbol stream, gates payload collection,
//! and rides out noisy or missed syncs without losing stream alignment.
//!
//! ## States
//!
//! ```text
//!            raw ≥ 5000 && norm ≥ 0.85        2144 payload symbols
//! HUNTING ─────────────────────────► VERIFYING ───────────────────► LOCKED
//!    ▲                                                                │
//!    └──────────── 5 consecutive missed syncs ◄──────────────────────┘
//! ```
//!
//! - **HUNTING**: every new symbol updates a 24-deep correlation ring
//!   against the sync template; acquisition requires both a strong raw
//!   correlation (signal present) and a high normalized correlation (pattern
//!   match), both thresholds inclusive.
//! - **VERIFYING**: the 2144 symbols after the detected sync are collected
//!   and emitted as one frame, then the tracker locks.
//! - **LOCKED**: the next sync is expected exactly 2168 symbols after the
//!   previous one. At each expected position the ring is re-correlated with
//!   a relaxed threshold; a miss increments a counter but the tracker keeps
//!   clocking frames on the flywheel until five consecutive misses drop it
//!   back to HUNTING. Frames collected on the flywheel are still emitted.
//!
//! Falling back to HUNTING is a partial reset: the collected payload and the
//! miss counter are cleared, while the demodulator's LO phases and AFC
//! offset (owned elsewhere) are deliberately preserved to speed
//! reacquisition.

use tracing::{debug, warn};

use crate::params::{ModemParams, ENCODED_BITS, FRAME_SYMBOLS, SYNC_BITS, SYNC_WORD};
use crate::types::SoftSymbol;

/// Correlation energy below which the normalized value is meaningless.
const MIN_SYNC_ENERGY: f64 = 100.0;

/// Tracker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Hunting,
    Verifying,
    Locked,
}

/// One frame's worth of soft symbols, gated out of the stream by the
/// tracker.
#[derive(Debug, Clone)]
pub struct TrackedFrame {
    /// The 2144 payload soft decisions, in on-air order.
    pub soft: Vec<SoftSymbol>,
    /// Normalized sync correlation at the acquisition governing this frame.
    pub sync_quality: f64,
}

/// Three-state sync tracker with flywheel.
#[derive(Debug, Clone)]
pub struct SyncTracker {
    state: SyncState,
    /// Ring of the last 24 soft symbols.
    ring: [f64; SYNC_BITS],
    ring_idx: usize,
    /// ±1 template derived from the sync word, MSB first.
    template: [f64; SYNC_BITS],
    /// Payload accumulator for the frame in flight.
    payload: Vec<SoftSymbol>,
    /// Whether LOCKED is currently collecting payload symbols.
    collecting: bool,
    /// Symbols since the last confirmed (or flywheel) sync position.
    since_sync: usize,
    /// Total symbols observed; gates correlation until the ring is full.
    total_symbols: u64,
    missed: u32,
    sync_quality: f64,
    frames_detected: u64,

    raw_threshold: f64,
    hunting_threshold: f64,
    locked_threshold: f64,
    miss_limit: u32,
}

impl SyncTracker {
    pub fn new(params: &ModemParams) -> Self {
        let mut template = [0.0f64; SYNC_BITS];
        for (i, slot) in template.iter_mut().enumerate() {
            let bit = (SYNC_WORD >> (SYNC_BITS - 1 - i)) & 1;
            *slot = if bit == 1 { -1.0 } else { 1.0 };
        }
        Self {
            state: SyncState::Hunting,
            ring: [0.0; SYNC_BITS],
            ring_idx: 0,
            template,
            payload: Vec::with_capacity(ENCODED_BITS),
            collecting: false,
            since_sync: 0,
            total_symbols: 0,
            missed: 0,
            sync_quality: 0.0,
            frames_detected: 0,
            raw_threshold: params.sync_raw_threshold,
            hunting_threshold: params.sync_hunting_threshold,
            locked_threshold: params.sync_locked_threshold,
            miss_limit: params.sync_miss_limit,
        }
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn frames_detected(&self) -> u64 {
        self.frames_detected
    }

    pub fn missed_count(&self) -> u32 {
        self.missed
    }

    /// Full reset to HUNTING with all counters and buffers cleared.
    pub fn reset(&mut self) {
        self.state = SyncState::Hunting;
        self.ring = [0.0; SYNC_BITS];
        self.ring_idx = 0;
        self.payload.clear();
        self.collecting = false;
        self.since_sync = 0;
        self.total_symbols = 0;
        self.missed = 0;
        self.sync_quality = 0.0;
        self.frames_detected = 0;
    }

    /// Drop back to HUNTING, keeping the correlation ring.
    ///
    /// Used on sync loss and by the low-confidence watchdog; clears the
    /// payload in flight and the miss counter only.
    pub fn force_hunting(&mut self) {
        self.state = SyncState::Hunting;
        self.payload.clear();
        self.collecting = false;
        self.since_sync = 0;
        self.missed = 0;
    }

    /// Correlate the ring against the sync template.
    ///
    /// Returns `(raw, normalized)`; the normalized value is zero when the
    /// window energy is below [`MIN_SYNC_ENERGY`].
    fn correlate(&self) -> (f64, f64) {
        let mut raw = 0.0;
        let mut energy = 0.0;
        for i in 0..SYNC_BITS {
            let soft = self.ring[(self.ring_idx + i) % SYNC_BITS];
            raw += soft * self.template[i];
            energy += soft.abs();
        }
        let normalized = if energy < MIN_SYNC_ENERGY {
            0.0
        } else {
            raw / energy
        };
        (raw, normalized)
    }

    /// Feed one soft symbol; returns a frame when one completes.
    pub fn process(&mut self, soft: SoftSymbol) -> Option<TrackedFrame> {
        self.ring[self.ring_idx] = soft;
        self.ring_idx = (self.ring_idx + 1) % SYNC_BITS;
        self.total_symbols += 1;

        match self.state {
            SyncState::Hunting => {
                if self.total_symbols < SYNC_BITS as u64 {
                    return None;
                }
                let (raw, normalized) = self.correlate();
                if raw >= self.raw_threshold && normalized >= self.hunting_threshold {
                    debug!(raw, normalized, "HUNTING -> VERIFYING");
                    self.state = SyncState::Verifying;
                    self.payload.clear();
                    self.sync_quality = normalized;
                }
                None
            }

            SyncState::Verifying => {
                self.payload.push(soft);
                if self.payload.len() == ENCODED_BITS {
                    let frame = TrackedFrame {
                        soft: std::mem::take(&mut self.payload),
                        sync_quality: self.sync_quality,
                    };
                    self.frames_detected += 1;
                    debug!(frame = self.frames_detected, "VERIFYING -> LOCKED");
                    self.state = SyncState::Locked;
                    self.missed = 0;
                    // The sync word ended one payload ago; the next one is
                    // due 24 symbols from now.
                    self.since_sync = ENCODED_BITS;
                    self.collecting = false;
                    return Some(frame);
                }
                None
            }

            SyncState::Locked => {
                self.since_sync += 1;

                let mut emitted = None;
                if self.collecting {
                    self.payload.push(soft);
                    if self.payload.len() == ENCODED_BITS {
                        self.frames_detected += 1;
                        emitted = Some(TrackedFrame {
                            soft: std::mem::take(&mut self.payload),
                            sync_quality: self.sync_quality,
                        });
                        self.collecting = false;
                    }
                }

                if self.since_sync == FRAME_SYMBOLS {
                    let (_, normalized) = self.correlate();
                    if normalized >= self.locked_threshold {
                        debug!(normalized, "LOCKED: sync confirmed");
                        self.missed = 0;
                        self.sync_quality = normalized;
                    } else {
                        self.missed += 1;
                        debug!(normalized, missed = self.missed, "LOCKED: sync missed");
                        if self.missed >= self.miss_limit {
                            warn!(
                                missed = self.missed,
                                "sync lost, returning to HUNTING"
                            );
                            self.force_hunting();
                            return emitted;
                        }
                        // Flywheel: treat the expected position as sync.
                        self.sync_quality = normalized;
                    }
                    self.since_sync = 0;
                    self.payload.clear();
                    self.collecting = true;
                }

                emitted
            }
        }
    }

    /// Feed a slice of soft symbols, collecting completed frames.
    pub fn process_block(&mut self, soft: &[SoftSymbol]) -> Vec<TrackedFrame> {
        soft.iter().filter_map(|&s| self.process(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> SyncTracker {
        SyncTracker::new(&ModemParams::default())
    }

    /// Soft symbols reproducing the sync word at amplitude `amp`.
    fn sync_softs(amp: f64) -> Vec<f64> {
        (0..SYNC_BITS)
            .map(|i| {
                let bit = (SYNC_WORD >> (SYNC_BITS - 1 - i)) & 1;
                if bit == 1 {
                    -amp
                } else {
                    amp
                }
            })
            .collect()
    }

    /// A deterministic payload pattern at amplitude `amp`.
    fn payload_softs(amp: f64) -> Vec<f64> {
        (0..ENCODED_BITS)
            .map(|i| if (i * 13 + 5) % 3 == 0 { amp } else { -amp })
            .collect()
    }

    fn one_frame(amp: f64) -> Vec<f64> {
        let mut v = sync_softs(amp);
        v.extend(payload_softs(amp));
        v
    }

    #[test]
    fn test_acquisition_and_first_frame() {
        let mut t = tracker();
        assert_eq!(t.state(), SyncState::Hunting);

        let frames = t.process_block(&one_frame(300.0));
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].soft.len(), ENCODED_BITS);
        assert_eq!(frames[0].soft, payload_softs(300.0));
        assert!(frames[0].sync_quality >= 0.85);
        assert_eq!(t.state(), SyncState::Locked);
    }

    #[test]
    fn test_locked_resync_every_frame_interval() {
        let mut t = tracker();
        let mut frames = Vec::new();
        for _ in 0..10 {
            frames.extend(t.process_block(&one_frame(300.0)));
        }
        assert_eq!(frames.len(), 10);
        assert_eq!(t.state(), SyncState::Locked);
        assert_eq!(t.missed_count(), 0);
        for f in &frames {
            assert_eq!(f.soft, payload_softs(300.0));
        }
    }

    #[test]
    fn test_weak_signal_not_acquired() {
        // Perfect pattern but raw correlation below threshold: 24 × 100 =
        // 2400 < 5000.
        let mut t = tracker();
        let frames = t.process_block(&one_frame(100.0));
        assert!(frames.is_empty());
        assert_eq!(t.state(), SyncState::Hunting);
    }

    #[test]
    fn test_exact_raw_threshold_accepted() {
        // 16 silent symbols then 8 matching the template tail at 625:
        // raw = 8 × 625 = 5000 exactly, normalized = 1.0. Inclusive
        // thresholds must accept.
        let mut t = tracker();
        for _ in 0..16 {
            t.process(0.0);
        }
        let tail: Vec<f64> = (16..SYNC_BITS)
            .map(|i| {
                let bit = (SYNC_WORD >> (SYNC_BITS - 1 - i)) & 1;
                if bit == 1 {
                    -625.0
                } else {
                    625.0
                }
            })
            .collect();
        for &s in &tail {
            t.process(s);
        }
        assert_eq!(t.state(), SyncState::Verifying);
    }

    #[test]
    fn test_just_below_raw_threshold_rejected() {
        let mut t = tracker();
        for _ in 0..16 {
            t.process(0.0);
        }
        for i in 16..SYNC_BITS {
            let bit = (SYNC_WORD >> (SYNC_BITS - 1 - i)) & 1;
            t.process(if bit == 1 { -624.0 } else { 624.0 });
        }
        assert_eq!(t.state(), SyncState::Hunting);
    }

    #[test]
    fn test_flywheel_then_sync_loss() {
        let mut t = tracker();
        t.process_block(&one_frame(300.0));
        assert_eq!(t.state(), SyncState::Locked);

        // Low-amplitude noise: window energy stays below the floor, every
        // expected sync is a miss.
        let mut flywheel_frames = 0;
        let mut symbols_fed = 0usize;
        while t.state() == SyncState::Locked && symbols_fed < FRAME_SYMBOLS * 8 {
            if t.process(0.5).is_some() {
                flywheel_frames += 1;
            }
            symbols_fed += 1;
        }

        assert_eq!(t.state(), SyncState::Hunting);
        // Misses 1 through 4 ride the flywheel and still clock out frames;
        // the fifth miss drops lock.
        assert_eq!(flywheel_frames, 4);
        assert!(symbols_fed <= FRAME_SYMBOLS * 5);
        assert_eq!(t.missed_count(), 0); // cleared by the partial reset
    }

    #[test]
    fn test_reacquisition_after_loss() {
        let mut t = tracker();
        t.process_block(&one_frame(300.0));
        for _ in 0..FRAME_SYMBOLS * 6 {
            t.process(0.5);
        }
        assert_eq!(t.state(), SyncState::Hunting);

        let frames = t.process_block(&one_frame(300.0));
        assert_eq!(frames.len(), 1);
        assert_eq!(t.state(), SyncState::Locked);
    }

    #[test]
    fn test_single_missed_sync_rides_flywheel() {
        let mut t = tracker();
        t.process_block(&one_frame(300.0));

        // One frame with a destroyed sync word but intact payload.
        let mut corrupted = vec![0.5; SYNC_BITS];
        corrupted.extend(payload_softs(300.0));
        let frames = t.process_block(&corrupted);

        assert_eq!(t.state(), SyncState::Locked);
        assert_eq!(t.missed_count(), 1);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].soft, payload_softs(300.0));

        // A clean frame clears the miss counter.
        t.process_block(&one_frame(300.0));
        assert_eq!(t.missed_count(), 0);
    }

    #[test]
    fn test_force_hunting_clears_payload_only() {
        let mut t = tracker();
        let mut stream = one_frame(300.0);
        stream.truncate(SYNC_BITS + 100); // mid-payload
        t.process_block(&stream);
        assert_eq!(t.state(), SyncState::Verifying);

        t.force_hunting();
        assert_eq!(t.state(), SyncState::Hunting);
        assert_eq!(t.missed_count(), 0);
        // Frame counter survives the partial reset.
        assert_eq!(t.frames_detected(), 0);
    }
}
