//! Non-linear mixer and output filtering.
//!
//! Channel samples combine through the documented non-linear network,
//! then pass a 37 Hz one-pole high-pass (DC removal) and a 14 kHz
//! one-pole low-pass before being decimated to the fixed upstream rate
//! the resampler consumes.

use std::f32::consts::PI;

/// 2A03 clock (NTSC).
pub const APU_CLOCK_HZ: f32 = 1_789_773.0;

/// High-pass cutoff removing the DC offset.
const HIGHPASS_HZ: f32 = 37.0;
/// Low-pass cutoff ahead of the resampler.
const LOWPASS_HZ: f32 = 14_000.0;

/// One-pole filter coefficient for a cutoff at the APU clock.
fn alpha(cutoff: f32) -> f32 {
    let dt = 1.0 / APU_CLOCK_HZ;
    let rc = 1.0 / (2.0 * PI * cutoff);
    dt / (rc + dt)
}

/// Mixer state: filters plus the decimating accumulator that produces
/// upstream-rate blocks.
pub struct Mixer {
    hpf_alpha: f32,
    lpf_alpha: f32,
    hpf_state: f32,
    lpf_state: f32,
    /// Fractional put-cycle accumulator.
    accum: f64,
    /// Put cycles per upstream sample.
    delta: f64,
    block: Vec<f32>,
    block_len: usize,
}

impl Mixer {
    /// Mixer producing `block_len`-sample blocks at `upstream_rate` Hz.
    #[must_use]
    pub fn new(block_len: usize, upstream_rate: u32) -> Self {
        Self {
            hpf_alpha: alpha(HIGHPASS_HZ),
            lpf_alpha: alpha(LOWPASS_HZ),
            hpf_state: 0.0,
            lpf_state: 0.0,
            accum: 0.0,
            delta: f64::from(APU_CLOCK_HZ / 2.0) / f64::from(upstream_rate),
            block: Vec::with_capacity(block_len.min(1 << 16)),
            block_len,
        }
    }

    /// Mix one put-cycle worth of channel output. Returns true when a
    /// full upstream block is ready.
    pub fn mix(&mut self, pulse1: u8, pulse2: u8, triangle: u8, noise: u8, dmc: u8) -> bool {
        let pulse_sum = f32::from(pulse1) + f32::from(pulse2);
        let pulse_out = if pulse_sum == 0.0 {
            0.0
        } else {
            95.88 / (8128.0 / pulse_sum + 100.0)
        };

        let tnd_sum = f32::from(triangle) / 8227.0
            + f32::from(noise) / 12_241.0
            + f32::from(dmc) / 22_638.0;
        let tnd_out = if tnd_sum == 0.0 {
            0.0
        } else {
            159.79 / (1.0 / tnd_sum + 100.0)
        };

        let raw = pulse_out + tnd_out;
        // Track the DC component and subtract it, then low-pass what is
        // left for the resampler.
        self.hpf_state = self.hpf_alpha * raw + (1.0 - self.hpf_alpha) * self.hpf_state;
        self.lpf_state =
            self.lpf_alpha * (raw - self.hpf_state) + (1.0 - self.lpf_alpha) * self.lpf_state;

        self.accum += 1.0;
        if self.accum >= self.delta {
            self.accum -= self.delta;
            self.block.push(self.lpf_state);
        }
        self.block.len() >= self.block_len
    }

    /// The completed upstream block.
    #[must_use]
    pub fn block(&self) -> &[f32] {
        &self.block
    }

    /// Discard the block after handing it to the resampler.
    pub fn clear_block(&mut self) {
        self.block.clear();
    }
}
