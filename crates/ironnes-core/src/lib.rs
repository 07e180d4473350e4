//! IronNES core: cycle-accurate co-execution of CPU, PPU, APU, and
//! cartridge on a shared bus.
//!
//! The bus is the single owner of simulated time: every CPU memory
//! access advances one CPU cycle, which ticks the APU once and the PPU
//! three dots, samples the /NMI edge between the first and second dot,
//! and latches the PPU's derived rendering state at the end. OAM DMA
//! and DMC DMA are bus-level stall sequences whose cycles interleave
//! with everything else.
//!
//! ```no_run
//! use ironnes_core::{Cartridge, Config, Console, Mirroring};
//!
//! let cart = Cartridge {
//!     prg_rom: std::fs::read("game.prg").unwrap(),
//!     chr_rom: std::fs::read("game.chr").unwrap(),
//!     mapper: 0,
//!     submapper: 0,
//!     mirroring: Mirroring::Vertical,
//!     battery: false,
//!     name: "game".into(),
//! };
//! let mut console = Console::new(&cart, &Config::default()).unwrap();
//!
//! loop {
//!     console.set_buttons(&[false; 16]);
//!     console.run_frame();
//!     let _pixels: &[u32] = console.frame(); // 256x240 ARGB8888
//! }
//! ```

mod bus;
mod config;
mod console;
mod joypad;
pub mod sram;

pub use bus::NesBus;
pub use config::Config;
pub use console::{Console, ConsoleError};
pub use joypad::{Button, JoyPad};

// Re-export the component crates' surfaces the host needs.
pub use ironnes_apu::{Apu, AudioSink};
pub use ironnes_cpu::{Bus, Cpu};
pub use ironnes_mappers::{create_mapper, Cartridge, CartridgeError, Mapper, Mirroring};
pub use ironnes_ppu::{PaletteKind, Ppu, FRAME_HEIGHT, FRAME_WIDTH};

/// Timing constants for the NTSC console.
pub mod timing {
    /// Master clock (NTSC).
    pub const MASTER_CLOCK_NTSC: u32 = 21_477_272;
    /// CPU clock: master / 12.
    pub const CPU_CLOCK_NTSC: u32 = MASTER_CLOCK_NTSC / 12;
    /// PPU dot clock: master / 4 (three dots per CPU cycle).
    pub const PPU_CLOCK_NTSC: u32 = MASTER_CLOCK_NTSC / 4;
    /// Dots per scanline.
    pub const DOTS_PER_SCANLINE: u16 = 341;
    /// Scanlines per frame, pre-render included.
    pub const SCANLINES_PER_FRAME: u16 = 262;
}

#[cfg(test)]
mod tests {
    use super::timing;

    #[test]
    fn clock_relationships() {
        assert_eq!(timing::CPU_CLOCK_NTSC, 1_789_772);
        assert_eq!(timing::PPU_CLOCK_NTSC, 5_369_318);
        assert_eq!(
            u32::from(timing::DOTS_PER_SCANLINE) * u32::from(timing::SCANLINES_PER_FRAME),
            89_342
        );
    }
}
