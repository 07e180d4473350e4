//! Core configuration knobs.

use ironnes_ppu::PaletteKind;

/// Options the core itself recognizes. Everything else (windowing,
/// input mapping, CLI) belongs to the host.
#[derive(Debug, Clone, Copy)]
pub struct Config {
    /// Host audio sample rate in Hz.
    pub sample_rate: u32,
    /// Use the famiclone pulse duty tables (25%/50% swapped).
    pub swap_duty_cycles: bool,
    /// Report vblank clear for the first ~29658 CPU cycles after reset,
    /// as a cold 2C02 does.
    pub ppu_warmup_delay: bool,
    /// Which PPU palette the board expects (stock 2C02 or a Vs. 2C04).
    pub palette: PaletteKind,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            swap_duty_cycles: false,
            ppu_warmup_delay: false,
            palette: PaletteKind::Rp2c02,
        }
    }
}
