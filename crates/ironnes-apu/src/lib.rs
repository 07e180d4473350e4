//! NES 2A03 APU emulation.
//!
//! Five channels (two pulses, triangle, noise, DMC), the frame
//! sequencer, the documented non-linear mixer with one-pole output
//! filters, and a pluggable resampler producing host-rate mono s16
//! audio through the [`AudioSink`] callback.
//!
//! The APU ticks once per CPU cycle and halves internally. DMC sample
//! fetches are raised as DMA requests for the system bus to service, so
//! the CPU stall cycles land in the right place.

mod apu;
mod dmc;
mod envelope;
mod frame_counter;
mod length_counter;
mod mixer;
mod noise;
mod pulse;
pub mod resampler;
mod sweep;
mod timer;
mod triangle;

pub use apu::{Apu, AudioSink};
pub use resampler::{LinearResampler, Resampler, SincResampler, UPSTREAM_FACTOR};
