//! Dot-accurate Ricoh 2C02 PPU emulation.
//!
//! The PPU is driven one dot at a time by the system bus (three dots per
//! CPU cycle) and renders into a double-buffered 256x240 ARGB8888 frame.
//! Pattern and nametable traffic goes through the [`PpuBus`] trait so
//! the cartridge mapper can bank CHR and observe A12 transitions.

mod background;
mod oam;
pub mod palette;
mod ppu;
mod registers;
mod scroll;
mod sprites;

pub use palette::PaletteKind;
pub use ppu::{FRAME_HEIGHT, FRAME_WIDTH, Ppu, PpuBus};
pub use registers::{PpuCtrl, PpuMask, PpuStatus};
