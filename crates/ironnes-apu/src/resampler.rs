//! Pluggable resampling from the mixer's upstream rate to the host
//! rate.
//!
//! The mixer produces mono samples at exactly three times the host rate;
//! a resampler turns each upstream block into a host-rate block of s16
//! samples. The default is rubato's FFT resampler; if it cannot be
//! constructed the core falls back to linear interpolation and keeps
//! running.

use log::warn;
use rubato::{FftFixedInOut, Resampler as RubatoResampler};

/// Upstream rate factor: the mixer runs at `output_rate * 3`.
pub const UPSTREAM_FACTOR: u32 = 3;

/// Block-based resampler contract: push one upstream block, collect the
/// host-rate samples it produces.
pub trait Resampler: Send {
    /// Exact number of input samples each `process` call expects.
    fn input_block_len(&self) -> usize;

    /// Resample `input` (of `input_block_len` samples) into `output`.
    fn process(&mut self, input: &[f32], output: &mut Vec<i16>);
}

#[inline]
fn to_s16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32_767.0) as i16
}

/// Band-limited FFT resampler (rubato).
pub struct SincResampler {
    inner: FftFixedInOut<f32>,
}

impl SincResampler {
    /// Build a 3:1 resampler for the given host rate.
    pub fn new(output_rate: u32) -> Result<Self, rubato::ResamplerConstructionError> {
        let inner = FftFixedInOut::new(
            (output_rate * UPSTREAM_FACTOR) as usize,
            output_rate as usize,
            1024,
            1,
        )?;
        Ok(Self { inner })
    }
}

impl Resampler for SincResampler {
    fn input_block_len(&self) -> usize {
        self.inner.input_frames_next()
    }

    fn process(&mut self, input: &[f32], output: &mut Vec<i16>) {
        match self.inner.process(&[input], None) {
            Ok(blocks) => output.extend(blocks[0].iter().copied().map(to_s16)),
            Err(err) => warn!("resampler error, dropping block: {err}"),
        }
    }
}

/// Linear-interpolation fallback used when the FFT resampler cannot be
/// built. Audibly worse, functionally sufficient.
pub struct LinearResampler {
    /// Input samples per output sample.
    step: f64,
    /// Position carried across blocks.
    pos: f64,
}

impl LinearResampler {
    /// New fallback resampler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            step: f64::from(UPSTREAM_FACTOR),
            pos: 0.0,
        }
    }
}

impl Default for LinearResampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Resampler for LinearResampler {
    fn input_block_len(&self) -> usize {
        1024
    }

    fn process(&mut self, input: &[f32], output: &mut Vec<i16>) {
        while self.pos < input.len() as f64 {
            let index = self.pos as usize;
            let frac = (self.pos - index as f64) as f32;
            let a = input[index];
            let b = *input.get(index + 1).unwrap_or(&a);
            output.push(to_s16(a * (1.0 - frac) + b * frac));
            self.pos += self.step;
        }
        self.pos -= input.len() as f64;
    }
}

/// Build the best available resampler for a host rate.
#[must_use]
pub fn create(output_rate: u32) -> Box<dyn Resampler> {
    match SincResampler::new(output_rate) {
        Ok(resampler) => Box::new(resampler),
        Err(err) => {
            warn!("falling back to linear resampling: {err}");
            Box::new(LinearResampler::new())
        }
    }
}
