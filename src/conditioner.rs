//! Output signal conditioning.
//!
//! Models the analog conditioning applied to the generator's sampled output: a
//! one-pole IIR low-pass (a recursive exponential average) followed by a DC
//! offset correction.

use core::f32::consts::PI;
use core::fmt::Write as _;

use heapless::String;
use libm::expf;

/// Sampling rate the coefficient derivation assumes, in samples per second.
///
/// [`set_cutoff`](SignalConditioner::set_cutoff) maps a cutoff frequency to a
/// smoothing coefficient for a stream sampled at exactly this rate. Feeding
/// [`apply_filter`](SignalConditioner::apply_filter) at a different rate moves
/// the effective cutoff proportionally.
pub const SAMPLE_RATE: f32 = 1_000_000.0;

/// Lowest configurable cutoff frequency, in Hz.
pub const MIN_CUTOFF: f32 = 1_000.0;

/// Highest configurable cutoff frequency, in Hz.
pub const MAX_CUTOFF: f32 = 10_000_000.0;

/// Smoothing coefficient bounds. The lower bound keeps the filter moving, the
/// upper bound keeps it a filter at all.
const MIN_COEFFICIENT: f32 = 0.001;
const MAX_COEFFICIENT: f32 = 0.5;

/// Offset assigned by [`calibrate_offset`](SignalConditioner::calibrate_offset),
/// in volts.
const NOMINAL_OFFSET: f32 = 0.05;

/// One-pole low-pass filter state with a DC-offset term.
///
/// The filter is stateful and order-dependent: each call to
/// [`apply_filter`](Self::apply_filter) blends the new sample into the running
/// state, so samples must arrive in true temporal order from a single owner.
/// Reordering or interleaving producers changes the result.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalConditioner {
    state: f32,
    cutoff: f32,
    coefficient: f32,
    offset: f32,
}

impl Default for SignalConditioner {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalConditioner {
    /// A conditioner with firmware defaults: 1 MHz cutoff, zero offset.
    pub fn new() -> Self {
        Self {
            state: 0.0,
            cutoff: 1_000_000.0,
            coefficient: 0.1,
            offset: 0.0,
        }
    }

    /// Blend `raw` into the running average and return the conditioned value.
    ///
    /// Updates `state = (1 - k) * state + k * raw` and returns
    /// `state + offset`.
    pub fn apply_filter(&mut self, raw: f32) -> f32 {
        self.state = (1.0 - self.coefficient) * self.state + self.coefficient * raw;
        self.state + self.offset
    }

    /// Set the low-pass cutoff frequency and derive the smoothing coefficient.
    ///
    /// `cutoff` is clamped to [[`MIN_CUTOFF`], [`MAX_CUTOFF`]] Hz. The
    /// coefficient comes from a discrete-time approximation of a continuous RC
    /// low-pass at [`SAMPLE_RATE`]: `T = 1 / (2π·cutoff)`,
    /// `k = 1 - e^(-1 / (T·rate))`, clamped to [0.001, 0.5].
    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff = cutoff.clamp(MIN_CUTOFF, MAX_CUTOFF);

        let time_constant = 1.0 / (2.0 * PI * self.cutoff);
        let coefficient = 1.0 - expf(-1.0 / (time_constant * SAMPLE_RATE));
        self.coefficient = coefficient.clamp(MIN_COEFFICIENT, MAX_COEFFICIENT);
    }

    /// Assign the DC offset.
    ///
    /// Placeholder calibration: stores the nominal bench value instead of
    /// measuring the live output. A real routine would sample the output and
    /// compute the offset from its mean; keep the signature (no arguments,
    /// idempotent, updates the offset term) so callers are unaffected when
    /// that lands.
    pub fn calibrate_offset(&mut self) {
        self.offset = NOMINAL_OFFSET;
    }

    /// Human-readable cutoff and offset summary.
    ///
    /// Cutoff is scaled to kHz below 1 MHz and to MHz at or above; offset is
    /// reported in millivolts. Display text only, not a parseable contract.
    pub fn status_text(&self) -> String<64> {
        let mut text = String::new();
        if self.cutoff < 1_000_000.0 {
            let _ = write!(
                text,
                "LPF: {:.2} kHz | DC: {:.2} mV",
                self.cutoff / 1_000.0,
                self.offset * 1_000.0
            );
        } else {
            let _ = write!(
                text,
                "LPF: {:.2} MHz | DC: {:.2} mV",
                self.cutoff / 1_000_000.0,
                self.offset * 1_000.0
            );
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let conditioner = SignalConditioner::new();
        assert_eq!(conditioner.state, 0.0);
        assert_eq!(conditioner.cutoff, 1_000_000.0);
        assert_eq!(conditioner.coefficient, 0.1);
        assert_eq!(conditioner.offset, 0.0);
    }

    #[test]
    fn constant_input_converges_monotonically() {
        let mut conditioner = SignalConditioner::new();
        let target = 2.5;

        let mut previous = conditioner.apply_filter(target);
        for _ in 0..200 {
            let current = conditioner.apply_filter(target);
            assert!(current >= previous, "state must not overshoot backwards");
            previous = current;
        }
        assert!((previous - target).abs() < 1e-3);
    }

    #[test]
    fn converges_for_small_coefficients() {
        // 1 kHz cutoff derives the slowest legal coefficient (~0.0063); the
        // state must still close on the input given enough samples.
        let mut conditioner = SignalConditioner::new();
        conditioner.set_cutoff(1_000.0);

        let target = -1.25;
        let mut output = 0.0;
        for _ in 0..20_000 {
            output = conditioner.apply_filter(target);
        }
        assert!((output - target).abs() < 1e-3);
    }

    #[test]
    fn cutoff_clamps_low_and_high() {
        let mut low = SignalConditioner::new();
        low.set_cutoff(500.0);
        let mut floor = SignalConditioner::new();
        floor.set_cutoff(1_000.0);
        assert_eq!(low.coefficient, floor.coefficient);
        assert_eq!(low.cutoff, 1_000.0);

        let mut high = SignalConditioner::new();
        high.set_cutoff(50_000_000.0);
        let mut ceiling = SignalConditioner::new();
        ceiling.set_cutoff(10_000_000.0);
        assert_eq!(high.coefficient, ceiling.coefficient);
        assert_eq!(high.cutoff, 10_000_000.0);
    }

    #[test]
    fn coefficient_stays_in_bounds() {
        let mut conditioner = SignalConditioner::new();
        for cutoff in [1_000.0f32, 5_000.0, 25_000.0, 100_000.0, 1_000_000.0, 5_000_000.0, 10_000_000.0] {
            conditioner.set_cutoff(cutoff);
            assert!(
                (MIN_COEFFICIENT..=MAX_COEFFICIENT).contains(&conditioner.coefficient),
                "cutoff {cutoff} -> coefficient {}",
                conditioner.coefficient
            );
        }
    }

    #[test]
    fn high_cutoff_hits_coefficient_ceiling() {
        let mut conditioner = SignalConditioner::new();
        conditioner.set_cutoff(10_000_000.0);
        assert_eq!(conditioner.coefficient, MAX_COEFFICIENT);
    }

    #[test]
    fn calibration_is_idempotent_and_applied() {
        let mut conditioner = SignalConditioner::new();
        conditioner.calibrate_offset();
        let offset = conditioner.offset;
        conditioner.calibrate_offset();
        assert_eq!(conditioner.offset, offset);

        // With zero state, the conditioned value is dominated by the offset.
        let out = conditioner.apply_filter(0.0);
        assert!((out - NOMINAL_OFFSET).abs() < 1e-6);
    }

    #[test]
    fn status_scales_to_megahertz() {
        let conditioner = SignalConditioner::new();
        assert_eq!(conditioner.status_text().as_str(), "LPF: 1.00 MHz | DC: 0.00 mV");
    }

    #[test]
    fn status_scales_to_kilohertz() {
        let mut conditioner = SignalConditioner::new();
        conditioner.set_cutoff(250_000.0);
        conditioner.calibrate_offset();
        assert_eq!(conditioner.status_text().as_str(), "LPF: 250.00 kHz | DC: 50.00 mV");
    }
}
