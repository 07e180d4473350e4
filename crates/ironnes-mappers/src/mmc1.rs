//! Mapper 1: MMC1. Serial-loaded registers, 16/32 KiB PRG banking,
//! 4/8 KiB CHR banking, runtime mirroring control.
//!
//! Writes to $8000-$FFFF shift bit 0 into a 5-bit register; the fifth
//! write commits to the register selected by address bits 13-14. A
//! write with bit 7 set resets the shifter and forces the fix-last PRG
//! mode (control OR $0C). The serial port also ignores the second of
//! two writes on back-to-back CPU cycles, which read-modify-write
//! instructions trigger with their double write.

use crate::cartridge::{Cartridge, PRG_RAM_SIZE};
use crate::mapper::Mapper;
use crate::mirroring::Mirroring;

const PRG_BANK: usize = 16 * 1024;
const CHR_BANK: usize = 4 * 1024;

/// PRG banking mode (control bits 2-3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrgMode {
    /// Switch the whole 32 KiB window; bank low bit ignored.
    Switch32K,
    /// $8000 fixed to the first bank, $C000 switched.
    FixFirst,
    /// $C000 fixed to the last bank, $8000 switched.
    FixLast,
}

/// CHR banking mode (control bit 4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChrMode {
    /// One 8 KiB bank; bank low bit ignored.
    Switch8K,
    /// Two independent 4 KiB banks.
    Switch4K,
}

/// MMC1 board.
pub struct Mmc1 {
    prg_rom: Vec<u8>,
    chr: Vec<u8>,
    prg_ram: Vec<u8>,
    chr_is_ram: bool,
    battery: bool,
    prg_bank_count: usize,
    chr_bank_count: usize,

    shift: u8,
    shift_count: u8,
    /// CPU cycles since the last accepted serial write; the port drops
    /// a write arriving on the very next cycle.
    cycles_since_write: u8,

    mirroring: Mirroring,
    prg_mode: PrgMode,
    chr_mode: ChrMode,
    chr_bank_0: u8,
    chr_bank_1: u8,
    prg_bank: u8,
    prg_ram_enabled: bool,
}

impl Mmc1 {
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
            shift: 0,
            shift_count: 0,
            cycles_since_write: u8::MAX,
            mirroring: cart.mirroring,
            prg_mode: PrgMode::FixLast,
            chr_mode: ChrMode::Switch8K,
            chr_bank_0: 0,
            chr_bank_1: 0,
            prg_bank: 0,
            prg_ram_enabled: true,
        }
    }

    fn serial_write(&mut self, addr: u16, val: u8) {
        if val & 0x80 != 0 {
            self.shift = 0;
            self.shift_count = 0;
            self.prg_mode = PrgMode::FixLast;
            return;
        }

        self.shift |= (val & 1) << self.shift_count;
        self.shift_count += 1;
        if self.shift_count < 5 {
            return;
        }

        let value = self.shift;
        self.shift = 0;
        self.shift_count = 0;
        match (addr >> 13) & 0x03 {
            0 => self.write_control(value),
            1 => self.chr_bank_0 = value,
            2 => self.chr_bank_1 = value,
            3 => {
                self.prg_bank = value & 0x0F;
                self.prg_ram_enabled = value & 0x10 == 0;
            }
            _ => unreachable!(),
        }
    }

    fn write_control(&mut self, value: u8) {
        self.mirroring = match value & 0x03 {
            0 => Mirroring::SingleScreenLower,
            1 => Mirroring::SingleScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        };
        self.prg_mode = match (value >> 2) & 0x03 {
            0 | 1 => PrgMode::Switch32K,
            2 => PrgMode::FixFirst,
            _ => PrgMode::FixLast,
        };
        self.chr_mode = if value & 0x10 != 0 {
            ChrMode::Switch4K
        } else {
            ChrMode::Switch8K
        };
    }

    fn prg_offset(&self, addr: u16) -> usize {
        let low_half = addr < 0xC000;
        let bank = match self.prg_mode {
            PrgMode::Switch32K => {
                let base = usize::from(self.prg_bank & 0x0E);
                if low_half { base } else { base + 1 }
            }
            PrgMode::FixFirst => {
                if low_half {
                    0
                } else {
                    usize::from(self.prg_bank)
                }
            }
            PrgMode::FixLast => {
                if low_half {
                    usize::from(self.prg_bank)
                } else {
                    self.prg_bank_count - 1
                }
            }
        };
        (bank % self.prg_bank_count) * PRG_BANK + (addr & 0x3FFF) as usize
    }

    fn chr_offset(&self, addr: u16) -> usize {
        let bank = match self.chr_mode {
            ChrMode::Switch8K => usize::from(self.chr_bank_0 & 0x1E) + usize::from(addr >= 0x1000),
            ChrMode::Switch4K => {
                if addr < 0x1000 {
                    usize::from(self.chr_bank_0)
                } else {
                    usize::from(self.chr_bank_1)
                }
            }
        };
        (bank % self.chr_bank_count) * CHR_BANK + (addr & 0x0FFF) as usize
    }
}

impl Mapper for Mmc1 {
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
                if self.prg_ram_enabled {
                    self.prg_ram[(addr & 0x1FFF) as usize] = val;
                }
            }
            0x8000..=0xFFFF => {
                // One write per CPU cycle pair: the second write of an
                // RMW instruction is ignored by the serial port.
                if self.cycles_since_write >= 2 {
                    self.serial_write(addr, val);
                }
                self.cycles_since_write = 0;
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

    fn clock_cpu(&mut self) {
        self.cycles_since_write = self.cycles_since_write.saturating_add(1);
    }

    fn name(&self) -> &'static str {
        "MMC1"
    }

    fn battery_ram(&self) -> Option<&[u8]> {
        self.battery.then_some(self.prg_ram.as_slice())
    }

    fn load_battery_ram(&mut self, data: &[u8]) {
        let len = data.len().min(self.prg_ram.len());
        self.prg_ram[..len].copy_from_slice(&data[..len]);
    }

    fn reset(&mut self) {
        self.shift = 0;
        self.shift_count = 0;
        self.prg_mode = PrgMode::FixLast;
        self.cycles_since_write = u8::MAX;
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
            mapper: 1,
            submapper: 0,
            mirroring: Mirroring::Horizontal,
            battery: true,
            name: "mmc1".into(),
        }
    }

    /// Shift a 5-bit value in serially, spacing the writes out so the
    /// write lockout never triggers.
    fn serial(mapper: &mut Mmc1, addr: u16, value: u8) {
        for bit in 0..5 {
            mapper.prg_write(addr, (value >> bit) & 1);
            for _ in 0..4 {
                mapper.clock_cpu();
            }
        }
    }

    #[test]
    fn five_writes_commit_a_register() {
        let mut mapper = Mmc1::new(&cart(8, 8));
        serial(&mut mapper, 0x8000, 0x02); // control: vertical mirroring
        assert_eq!(mapper.mirroring(), Mirroring::Vertical);
        serial(&mut mapper, 0x8000, 0x03);
        assert_eq!(mapper.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn reset_bit_restores_fix_last() {
        let mut mapper = Mmc1::new(&cart(8, 8));
        serial(&mut mapper, 0x8000, 0x00); // 32K mode
        assert_eq!(mapper.prg_mode, PrgMode::Switch32K);

        mapper.clock_cpu();
        mapper.clock_cpu();
        mapper.prg_write(0x8000, 0x80);
        assert_eq!(mapper.prg_mode, PrgMode::FixLast);
        assert_eq!(mapper.shift_count, 0);
    }

    #[test]
    fn fix_last_banking() {
        let mut mapper = Mmc1::new(&cart(8, 8));
        serial(&mut mapper, 0xE000, 0x03); // PRG bank 3
        assert_eq!(mapper.prg_read(0x8000), 3);
        assert_eq!(mapper.prg_read(0xC000), 7); // fixed last
    }

    #[test]
    fn switch_32k_ignores_low_bit() {
        let mut mapper = Mmc1::new(&cart(8, 8));
        serial(&mut mapper, 0x8000, 0x00); // control: 32K mode
        serial(&mut mapper, 0xE000, 0x03); // bank 3 -> pair (2, 3)
        assert_eq!(mapper.prg_read(0x8000), 2);
        assert_eq!(mapper.prg_read(0xC000), 3);
    }

    #[test]
    fn chr_4k_banks() {
        let mut mapper = Mmc1::new(&cart(8, 8));
        serial(&mut mapper, 0x8000, 0x10); // 4K CHR mode
        serial(&mut mapper, 0xA000, 0x02);
        serial(&mut mapper, 0xC000, 0x05);
        assert_eq!(mapper.chr_read(0x0000), 2);
        assert_eq!(mapper.chr_read(0x1000), 5);
    }

    #[test]
    fn consecutive_cycle_write_is_dropped() {
        let mut mapper = Mmc1::new(&cart(8, 8));
        // Two writes with no cycle gap: the second must not shift.
        mapper.prg_write(0x8000, 1);
        mapper.clock_cpu();
        mapper.prg_write(0x8000, 1);
        assert_eq!(mapper.shift_count, 1);

        // With a two-cycle gap the write is accepted.
        mapper.clock_cpu();
        mapper.clock_cpu();
        mapper.prg_write(0x8000, 1);
        assert_eq!(mapper.shift_count, 2);
    }

    #[test]
    fn prg_ram_enable_bit() {
        let mut mapper = Mmc1::new(&cart(8, 8));
        mapper.prg_write(0x6000, 0x42);
        assert_eq!(mapper.prg_read(0x6000), 0x42);

        serial(&mut mapper, 0xE000, 0x10); // RAM disable
        assert_eq!(mapper.prg_read(0x6000), 0);
    }

    #[test]
    fn battery_round_trip() {
        let mut mapper = Mmc1::new(&cart(8, 8));
        mapper.prg_write(0x6000, 0xAB);
        let saved = mapper.battery_ram().unwrap().to_vec();

        let mut restored = Mmc1::new(&cart(8, 8));
        restored.load_battery_ram(&saved);
        assert_eq!(restored.prg_read(0x6000), 0xAB);
    }
}
