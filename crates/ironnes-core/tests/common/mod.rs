//! Shared cartridge builders for the integration tests.

use ironnes_core::{Cartridge, Mirroring};

/// Code fragments for a hand-assembled test ROM.
#[derive(Default)]
pub struct Program {
    /// Placed at $8000; reset vector points here.
    pub main: Vec<u8>,
    /// Placed at $9000; NMI vector points here.
    pub nmi: Vec<u8>,
    /// Placed at $9800; IRQ/BRK vector points here.
    pub irq: Vec<u8>,
}

/// Build a 32 KiB NROM image around the given program.
pub fn nrom(program: &Program) -> Cartridge {
    let mut prg = vec![0xEA; 32 * 1024]; // NOP filler
    prg[..program.main.len()].copy_from_slice(&program.main);
    prg[0x1000..0x1000 + program.nmi.len()].copy_from_slice(&program.nmi);
    prg[0x1800..0x1800 + program.irq.len()].copy_from_slice(&program.irq);

    // Vectors: NMI $9000, reset $8000, IRQ $9800.
    prg[0x7FFA] = 0x00;
    prg[0x7FFB] = 0x90;
    prg[0x7FFC] = 0x00;
    prg[0x7FFD] = 0x80;
    prg[0x7FFE] = 0x00;
    prg[0x7FFF] = 0x98;

    Cartridge {
        prg_rom: prg,
        chr_rom: vec![0; 8 * 1024],
        mapper: 0,
        submapper: 0,
        mirroring: Mirroring::Vertical,
        battery: false,
        name: "integration".into(),
    }
}

/// An infinite `JMP $8000`-style loop at the given address.
pub fn jmp_loop(addr: u16) -> [u8; 3] {
    [0x4C, (addr & 0xFF) as u8, (addr >> 8) as u8]
}
