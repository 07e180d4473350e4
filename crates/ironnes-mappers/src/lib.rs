//! Cartridge descriptor and mapper implementations.
//!
//! The mapper is a polymorphic value behind the [`Mapper`] trait; each
//! board keeps exactly its own registers rather than sharing one
//! aggregate of every variant's state.
//!
//! # Supported boards
//!
//! | Mapper | Board | Banking |
//! |--------|-------|---------|
//! | 0 | NROM | none |
//! | 1 | MMC1 | serial registers, 16/32K PRG, 4/8K CHR |
//! | 2 | UxROM | 16K PRG, last bank fixed |
//! | 3 | CNROM | 8K CHR |
//! | 4 | MMC3 | 8K PRG, 1/2K CHR, scanline IRQ |
//! | 7 | AxROM | 32K PRG, single-screen mirroring |
//! | 11 | Color Dreams | 32K PRG + 8K CHR, bus conflicts |
//! | 34 | BNROM / NINA-001 | 32K PRG (+4K CHR pair on NINA) |

mod axrom;
mod bnrom;
mod cartridge;
mod cnrom;
mod color_dreams;
mod mapper;
mod mirroring;
mod mmc1;
mod mmc3;
mod nrom;
mod uxrom;

pub use axrom::Axrom;
pub use bnrom::Bnrom;
pub use cartridge::{Cartridge, CartridgeError, CHR_RAM_SIZE, PRG_RAM_SIZE};
pub use cnrom::Cnrom;
pub use color_dreams::ColorDreams;
pub use mapper::Mapper;
pub use mirroring::Mirroring;
pub use mmc1::Mmc1;
pub use mmc3::Mmc3;
pub use nrom::Nrom;
pub use uxrom::Uxrom;

/// Validate a cartridge and build its mapper.
pub fn create_mapper(cart: &Cartridge) -> Result<Box<dyn Mapper>, CartridgeError> {
    cart.validate()?;
    let mapper: Box<dyn Mapper> = match cart.mapper {
        0 => Box::new(Nrom::new(cart)),
        1 => Box::new(Mmc1::new(cart)),
        2 => Box::new(Uxrom::new(cart)),
        3 => Box::new(Cnrom::new(cart)),
        4 => Box::new(Mmc3::new(cart)),
        7 => Box::new(Axrom::new(cart)),
        11 => Box::new(ColorDreams::new(cart)),
        34 => Box::new(Bnrom::new(cart)),
        n => return Err(CartridgeError::UnsupportedMapper(n)),
    };
    log::info!("installed mapper {} ({})", cart.mapper, mapper.name());
    Ok(mapper)
}

/// Mapper numbers this crate implements.
#[must_use]
pub fn supported_mappers() -> &'static [u16] {
    &[0, 1, 2, 3, 4, 7, 11, 34]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart(mapper: u16) -> Cartridge {
        Cartridge {
            prg_rom: vec![0; 32 * 1024],
            chr_rom: vec![0; 8 * 1024],
            mapper,
            submapper: 0,
            mirroring: Mirroring::Vertical,
            battery: false,
            name: "test".into(),
        }
    }

    #[test]
    fn all_supported_mappers_install() {
        for &number in supported_mappers() {
            let mapper = create_mapper(&cart(number)).unwrap();
            assert!(!mapper.name().is_empty());
        }
    }

    #[test]
    fn unsupported_mapper_is_refused() {
        assert!(matches!(
            create_mapper(&cart(5)),
            Err(CartridgeError::UnsupportedMapper(5))
        ));
    }

    #[test]
    fn invalid_sizes_are_refused_at_install() {
        let mut bad = cart(0);
        bad.prg_rom = vec![0; 1000];
        assert!(matches!(
            create_mapper(&bad),
            Err(CartridgeError::BadPrgSize(1000))
        ));
    }
}
