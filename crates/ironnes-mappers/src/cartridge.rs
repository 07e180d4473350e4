//! The pre-parsed cartridge descriptor.
//!
//! File-format concerns (iNES/NES 2.0 headers, trainers, file I/O) live
//! in the host; the core consumes this populated description and only
//! validates that the sizes make sense for the mapper hardware.

use thiserror::Error;

use crate::mirroring::Mirroring;

/// 8 KiB of cartridge work RAM at $6000-$7FFF.
pub const PRG_RAM_SIZE: usize = 8 * 1024;
/// 8 KiB of CHR-RAM when the cartridge carries no CHR-ROM.
pub const CHR_RAM_SIZE: usize = 8 * 1024;

/// Reasons a cartridge cannot be installed.
#[derive(Debug, Clone, Error)]
pub enum CartridgeError {
    /// The mapper number has no implementation.
    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u16),

    /// PRG-ROM must be a non-zero multiple of 16 KiB.
    #[error("bad PRG-ROM size {0}: expected a non-zero multiple of 16 KiB")]
    BadPrgSize(usize),

    /// CHR-ROM must be empty (CHR-RAM) or a multiple of 8 KiB.
    #[error("bad CHR-ROM size {0}: expected a multiple of 8 KiB")]
    BadChrSize(usize),
}

/// A loaded cartridge, ready for mapper installation.
#[derive(Debug, Clone)]
pub struct Cartridge {
    /// Program ROM; a non-zero multiple of 16 KiB.
    pub prg_rom: Vec<u8>,
    /// Character ROM; empty means the board carries 8 KiB of CHR-RAM.
    pub chr_rom: Vec<u8>,
    /// iNES mapper number.
    pub mapper: u16,
    /// NES 2.0 submapper (0 when unknown).
    pub submapper: u8,
    /// Mirroring soldered on the board; mappers may override at runtime.
    pub mirroring: Mirroring,
    /// PRG-RAM is battery-backed and should persist.
    pub battery: bool,
    /// Cartridge name, used to derive the save-file path.
    pub name: String,
}

impl Cartridge {
    /// Check size invariants before installation.
    pub fn validate(&self) -> Result<(), CartridgeError> {
        if self.prg_rom.is_empty() || self.prg_rom.len() % (16 * 1024) != 0 {
            return Err(CartridgeError::BadPrgSize(self.prg_rom.len()));
        }
        if self.chr_rom.len() % (8 * 1024) != 0 {
            return Err(CartridgeError::BadChrSize(self.chr_rom.len()));
        }
        Ok(())
    }

    /// The board uses CHR-RAM instead of CHR-ROM.
    #[must_use]
    pub fn chr_is_ram(&self) -> bool {
        self.chr_rom.is_empty()
    }

    /// CHR storage for a mapper: the ROM contents, or zeroed CHR-RAM.
    #[must_use]
    pub fn chr(&self) -> Vec<u8> {
        if self.chr_is_ram() {
            vec![0; CHR_RAM_SIZE]
        } else {
            self.chr_rom.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart(prg: usize, chr: usize) -> Cartridge {
        Cartridge {
            prg_rom: vec![0; prg],
            chr_rom: vec![0; chr],
            mapper: 0,
            submapper: 0,
            mirroring: Mirroring::Vertical,
            battery: false,
            name: "test".into(),
        }
    }

    #[test]
    fn valid_sizes_pass() {
        assert!(cart(16 * 1024, 8 * 1024).validate().is_ok());
        assert!(cart(32 * 1024, 0).validate().is_ok());
        assert!(cart(512 * 1024, 256 * 1024).validate().is_ok());
    }

    #[test]
    fn bad_sizes_fail() {
        assert!(matches!(
            cart(0, 0).validate(),
            Err(CartridgeError::BadPrgSize(0))
        ));
        assert!(matches!(
            cart(1000, 0).validate(),
            Err(CartridgeError::BadPrgSize(1000))
        ));
        assert!(matches!(
            cart(16 * 1024, 5).validate(),
            Err(CartridgeError::BadChrSize(5))
        ));
    }

    #[test]
    fn chr_ram_detection() {
        assert!(cart(16 * 1024, 0).chr_is_ram());
        assert!(!cart(16 * 1024, 8 * 1024).chr_is_ram());
        assert_eq!(cart(16 * 1024, 0).chr().len(), CHR_RAM_SIZE);
    }
}
