//! Mapper 4: MMC3. 8 KiB PRG banks, 1/2 KiB CHR banks with A12
//! inversion, and the scanline IRQ counter.
//!
//! The IRQ counter clocks on a rising edge of PPU A12, filtered: the
//! line must have been sampled low at least three times since the last
//! rise. With the usual configuration (background at $0000, sprites at
//! $1000) the sprite fetch window produces exactly one filtered rise
//! per rendered scanline.

use crate::cartridge::{Cartridge, PRG_RAM_SIZE};
use crate::mapper::Mapper;
use crate::mirroring::Mirroring;

const PRG_BANK: usize = 8 * 1024;
const CHR_BANK: usize = 1024;

/// Low samples of A12 required before a rise clocks the counter.
const A12_FILTER: u8 = 3;

/// MMC3 board.
pub struct Mmc3 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    prg_ram: Vec<u8>,
    chr_is_ram: bool,
    battery: bool,
    prg_bank_count: usize,
    chr_bank_count: usize,

    /// Which bank register the next $8001 write updates.
    bank_select: u8,
    /// $C000 window holds the switchable bank instead of $8000.
    prg_swap: bool,
    /// CHR layout flipped between the two pattern tables.
    chr_inversion: bool,
    /// R0-R7: two 2 KiB CHR, four 1 KiB CHR, two 8 KiB PRG.
    regs: [u8; 8],

    mirroring: Mirroring,
    prg_ram_enabled: bool,
    prg_ram_protect: bool,

    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq: bool,

    /// Consecutive low samples of A12 since the last rising edge.
    a12_low_count: u8,
}

impl Mmc3 {
    /// Install from a cartridge descriptor.
    #[must_use]
    pub fn new(cart: &Cartridge) -> Self {
        let chr = cart.chr();
        Self {
            prg_bank_count: (cart.prg_rom.len() / PRG_BANK).max(1),
            chr_bank_count: (chr.len() / CHR_BANK).max(1),
            prg_rom: cart.prg_rom.clone(),
            chr,
            prg_ram: vec![0; PRG_RAM_SIZE],
            chr_is_ram: cart.chr_is_ram(),
            battery: cart.battery,
            bank_select: 0,
            prg_swap: false,
            chr_inversion: false,
            regs: [0, 2, 4, 5, 6, 7, 0, 1],
            mirroring: cart.mirroring,
            prg_ram_enabled: true,
            prg_ram_protect: false,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq: false,
            a12_low_count: A12_FILTER,
        }
    }

    fn prg_offset(&self, addr: u16) -> usize {
        let last = self.prg_bank_count - 1;
        let bank = match (addr >> 13) & 0x03 {
            // $8000: switchable, or second-to-last when swapped.
            0 => {
                if self.prg_swap {
                    last - 1
                } else {
                    usize::from(self.regs[6])
                }
            }
            // $A000: always switchable.
            1 => usize::from(self.regs[7]),
            // $C000: second-to-last, or switchable when swapped.
            2 => {
                if self.prg_swap {
                    usize::from(self.regs[6])
                } else {
                    last - 1
                }
            }
            // $E000: always the last bank.
            _ => last,
        };
        (bank % self.prg_bank_count) * PRG_BANK + (addr & 0x1FFF) as usize
    }

    fn chr_offset(&self, addr: u16) -> usize {
        let mut region = (addr >> 10) & 0x07;
        if self.chr_inversion {
            region ^= 4;
        }
        // Regions 0-3 are the two 2 KiB windows (R0/R1), 4-7 the four
        // 1 KiB windows (R2-R5).
        let bank = match region {
            0 => usize::from(self.regs[0] & 0xFE),
            1 => usize::from(self.regs[0] | 0x01),
            2 => usize::from(self.regs[1] & 0xFE),
            3 => usize::from(self.regs[1] | 0x01),
            region => usize::from(self.regs[(region - 2) as usize]),
        };
        (bank % self.chr_bank_count) * CHR_BANK + (addr & 0x03FF) as usize
    }

    /// Filtered-rising-edge clock of the scanline counter.
    fn clock_irq_counter(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }
        if self.irq_counter == 0 && self.irq_enabled {
            self.irq = true;
        }
    }
}

impl Mapper for Mmc3 {
    fn prg_read(&self, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enabled {
                    self.prg_ram[(addr & 0x1FFF) as usize]
                } else {
                    0
                }
            }
            0x8000..=0xFFFF => self.prg_rom[self.prg_offset(addr)],
            _ => 0,
        }
    }

    fn prg_write(&mut self, addr: u16, val: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enabled && !self.prg_ram_protect {
                    self.prg_ram[(addr & 0x1FFF) as usize] = val;
                }
            }
            0x8000..=0x9FFF => {
                if addr & 1 == 0 {
                    self.bank_select = val & 0x07;
                    self.prg_swap = val & 0x40 != 0;
                    self.chr_inversion = val & 0x80 != 0;
                } else {
                    let index = usize::from(self.bank_select);
                    self.regs[index] = if index >= 6 { val & 0x3F } else { val };
                }
            }
            0xA000..=0xBFFF => {
                if addr & 1 == 0 {
                    // Four-screen boards ignore this register.
                    if self.mirroring != Mirroring::FourScreen {
                        self.mirroring = if val & 1 != 0 {
                            Mirroring::Horizontal
                        } else {
                            Mirroring::Vertical
                        };
                    }
                } else {
                    self.prg_ram_enabled = val & 0x80 != 0;
                    self.prg_ram_protect = val & 0x40 != 0;
                }
            }
            0xC000..=0xDFFF => {
                if addr & 1 == 0 {
                    self.irq_latch = val;
                } else {
                    self.irq_counter = 0;
                    self.irq_reload = true;
                }
            }
            0xE000..=0xFFFF => {
                if addr & 1 == 0 {
                    self.irq_enabled = false;
                    self.irq = false;
                } else {
                    self.irq_enabled = true;
                }
            }
            _ => {}
        }
    }

    fn chr_read(&self, addr: u16) -> u8 {
        self.chr[self.chr_offset(addr)]
    }

    fn chr_write(&mut self, addr: u16, val: u8) {
        if self.chr_is_ram {
            let offset = self.chr_offset(addr);
            self.chr[offset] = val;
        }
    }

    fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn irq_asserted(&self) -> bool {
        self.irq
    }

    fn notify_a12(&mut self, high: bool) {
        if high {
            if self.a12_low_count >= A12_FILTER {
                self.clock_irq_counter();
            }
            self.a12_low_count = 0;
        } else {
            self.a12_low_count = self.a12_low_count.saturating_add(1);
        }
    }

    fn name(&self) -> &'static str {
        "MMC3"
    }

    fn battery_ram(&self) -> Option<&[u8]> {
        self.battery.then_some(self.prg_ram.as_slice())
    }

    fn load_battery_ram(&mut self, data: &[u8]) {
        let len = data.len().min(self.prg_ram.len());
        self.prg_ram[..len].copy_from_slice(&data[..len]);
    }

    fn reset(&mut self) {
        self.bank_select = 0;
        self.prg_swap = false;
        self.chr_inversion = false;
        self.regs = [0, 2, 4, 5, 6, 7, 0, 1];
        self.irq_latch = 0;
        self.irq_counter = 0;
        self.irq_reload = false;
        self.irq_enabled = false;
        self.irq = false;
        self.a12_low_count = A12_FILTER;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cart(prg_banks: usize, chr_banks: usize) -> Cartridge {
        let mut prg = vec![0; prg_banks * PRG_BANK];
        for bank in 0..prg_banks {
            prg[bank * PRG_BANK] = bank as u8;
        }
        let mut chr = vec![0; chr_banks * CHR_BANK];
        for bank in 0..chr_banks {
            chr[bank * CHR_BANK] = bank as u8;
        }
        Cartridge {
            prg_rom: prg,
            chr_rom: chr,
            mapper: 4,
            submapper: 0,
            mirroring: Mirroring::Vertical,
            battery: true,
            name: "mmc3".into(),
        }
    }

    /// One filtered rising edge: a long low stretch then a rise.
    fn a12_scanline_edge(mapper: &mut Mmc3) {
        for _ in 0..8 {
            mapper.notify_a12(false);
        }
        mapper.notify_a12(true);
    }

    #[test]
    fn power_on_prg_layout() {
        let mapper = Mmc3::new(&cart(32, 32));
        assert_eq!(mapper.prg_read(0x8000), 0);
        assert_eq!(mapper.prg_read(0xA000), 1);
        assert_eq!(mapper.prg_read(0xC000), 30);
        assert_eq!(mapper.prg_read(0xE000), 31);
    }

    #[test]
    fn prg_swap_mode() {
        let mut mapper = Mmc3::new(&cart(32, 32));
        mapper.prg_write(0x8000, 6);
        mapper.prg_write(0x8001, 5);
        assert_eq!(mapper.prg_read(0x8000), 5);
        assert_eq!(mapper.prg_read(0xC000), 30);

        mapper.prg_write(0x8000, 0x46); // swap bit
        assert_eq!(mapper.prg_read(0x8000), 30);
        assert_eq!(mapper.prg_read(0xC000), 5);
    }

    #[test]
    fn chr_layout_and_inversion() {
        let mut mapper = Mmc3::new(&cart(32, 32));
        // R0 = 8 (2 KiB pair 8/9 at $0000), R2 = 20 (1 KiB at $1000).
        mapper.prg_write(0x8000, 0);
        mapper.prg_write(0x8001, 8);
        mapper.prg_write(0x8000, 2);
        mapper.prg_write(0x8001, 20);

        assert_eq!(mapper.chr_read(0x0000), 8);
        assert_eq!(mapper.chr_read(0x0400), 9);
        assert_eq!(mapper.chr_read(0x1000), 20);

        // Inversion swaps the halves.
        mapper.prg_write(0x8000, 0x80);
        assert_eq!(mapper.chr_read(0x1000), 8);
        assert_eq!(mapper.chr_read(0x0000), 20);
    }

    #[test]
    fn odd_two_kib_bank_is_aligned() {
        let mut mapper = Mmc3::new(&cart(32, 32));
        mapper.prg_write(0x8000, 0);
        mapper.prg_write(0x8001, 9); // low bit dropped -> bank 8
        assert_eq!(mapper.chr_read(0x0000), 8);
    }

    #[test]
    fn irq_after_n_plus_one_edges() {
        let mut mapper = Mmc3::new(&cart(32, 32));
        mapper.prg_write(0xC000, 5); // latch
        mapper.prg_write(0xC001, 0); // reload
        mapper.prg_write(0xE001, 0); // enable

        // Edge 1 reloads to 5; edges 2-6 count 4,3,2,1,0.
        for edge in 1..=6 {
            assert!(!mapper.irq_asserted(), "edge {edge}");
            a12_scanline_edge(&mut mapper);
        }
        assert!(mapper.irq_asserted());
    }

    #[test]
    fn short_low_periods_are_filtered() {
        let mut mapper = Mmc3::new(&cart(32, 32));
        mapper.prg_write(0xC000, 0);
        mapper.prg_write(0xC001, 0);
        mapper.prg_write(0xE001, 0);

        // Rapid toggling without a long low stretch never clocks.
        a12_scanline_edge(&mut mapper); // first legitimate edge
        for _ in 0..10 {
            mapper.notify_a12(false);
            mapper.notify_a12(true); // only one low sample: filtered
        }
        // A latch of 0 clocks to zero on every edge; had the toggles
        // counted, the IRQ would have fired from them alone. Disable
        // and re-enable to prove only filtered edges assert it.
        assert!(mapper.irq_asserted()); // from the legitimate edge
        mapper.prg_write(0xE000, 0); // ack + disable
        mapper.prg_write(0xE001, 0);
        for _ in 0..10 {
            mapper.notify_a12(false);
            mapper.notify_a12(true);
        }
        assert!(!mapper.irq_asserted());
    }

    #[test]
    fn disable_acknowledges_irq() {
        let mut mapper = Mmc3::new(&cart(32, 32));
        mapper.prg_write(0xC000, 0);
        mapper.prg_write(0xC001, 0);
        mapper.prg_write(0xE001, 0);
        a12_scanline_edge(&mut mapper);
        assert!(mapper.irq_asserted());

        mapper.prg_write(0xE000, 0);
        assert!(!mapper.irq_asserted());
    }

    #[test]
    fn mirroring_register() {
        let mut mapper = Mmc3::new(&cart(32, 32));
        assert_eq!(mapper.mirroring(), Mirroring::Vertical);
        mapper.prg_write(0xA000, 1);
        assert_eq!(mapper.mirroring(), Mirroring::Horizontal);
        mapper.prg_write(0xA000, 0);
        assert_eq!(mapper.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn prg_ram_protect_bits() {
        let mut mapper = Mmc3::new(&cart(32, 32));
        mapper.prg_write(0x6000, 0x42);
        assert_eq!(mapper.prg_read(0x6000), 0x42);

        mapper.prg_write(0xA001, 0x00); // disabled
        assert_eq!(mapper.prg_read(0x6000), 0);

        mapper.prg_write(0xA001, 0xC0); // enabled + write protect
        assert_eq!(mapper.prg_read(0x6000), 0x42);
        mapper.prg_write(0x6000, 0xFF);
        assert_eq!(mapper.prg_read(0x6000), 0x42);
    }
}
