//! The system bus: the only place simulated time advances.
//!
//! Every CPU memory access is one CPU cycle. A cycle performs the
//! memory operation first, then ticks the APU once and the PPU three
//! dots, sampling the /NMI edge between the first and second dot and
//! latching the PPU's derived rendering state afterwards. OAM DMA and
//! DMC DMA are modelled here as bus-level stall-and-drive sequences, so
//! their cycles interleave with everything else correctly.
//!
//! Address decode is by the top three address bits:
//!
//! ```text
//! $0000-$1FFF  2 KiB internal RAM, mirrored
//! $2000-$3FFF  PPU registers, mirrored every 8
//! $4000-$5FFF  APU + IO registers ($4018-$5FFF open bus)
//! $6000-$7FFF  cartridge work RAM / mapper registers
//! $8000-$FFFF  cartridge PRG
//! ```

use ironnes_apu::Apu;
use ironnes_cpu::Bus;
use ironnes_mappers::Mapper;
use ironnes_ppu::{Ppu, PpuBus};

use crate::config::Config;
use crate::joypad::JoyPad;

/// PPU-side memory adapter: pattern tables via the mapper, nametables
/// in CIRAM with the mapper's mirroring, and A12 reported on every
/// access for the MMC3 scanline counter.
struct PpuMem<'a> {
    mapper: &'a mut dyn Mapper,
    ciram: &'a mut [u8; 0x800],
}

impl PpuBus for PpuMem<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        self.mapper.notify_a12(addr & 0x1000 != 0);
        match addr {
            0x0000..=0x1FFF => self.mapper.chr_read(addr),
            0x2000..=0x3EFF => {
                let index = self.mapper.mirroring().ciram_index(addr);
                self.ciram[index]
            }
            _ => 0,
        }
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.mapper.notify_a12(addr & 0x1000 != 0);
        match addr {
            0x0000..=0x1FFF => self.mapper.chr_write(addr, val),
            0x2000..=0x3EFF => {
                let index = self.mapper.mirroring().ciram_index(addr);
                self.ciram[index] = val;
            }
            _ => {}
        }
    }
}

/// The NES system bus.
pub struct NesBus {
    ram: [u8; 0x800],
    ciram: [u8; 0x800],
    /// Picture processor.
    pub ppu: Ppu,
    /// Audio processor.
    pub apu: Apu,
    /// Cartridge hardware.
    pub mapper: Box<dyn Mapper>,
    /// Controller in port 1.
    pub joypad1: JoyPad,
    /// Controller in port 2.
    pub joypad2: JoyPad,

    /// Last byte driven on the data bus, for open-bus reads.
    bus_data: u8,
    /// CPU cycles elapsed.
    cycles: u64,

    /// Previously sampled /NMI level (true = asserted).
    nmi_level: bool,
    /// Edge latch consumed by the CPU at instruction boundaries.
    nmi_pending: bool,

    /// The APU asked for a DMC sample byte.
    dmc_dma_pending: bool,
}

impl NesBus {
    /// Build the bus around an installed mapper.
    #[must_use]
    pub fn new(mapper: Box<dyn Mapper>, config: &Config) -> Self {
        Self {
            ram: [0; 0x800],
            ciram: [0; 0x800],
            ppu: Ppu::new(config.palette, config.ppu_warmup_delay),
            apu: Apu::new(config.sample_rate, config.swap_duty_cycles),
            mapper,
            joypad1: JoyPad::new(),
            joypad2: JoyPad::new(),
            bus_data: 0,
            cycles: 0,
            nmi_level: false,
            nmi_pending: false,
            dmc_dma_pending: false,
        }
    }

    /// Reset-line behavior: components reset, RAM contents survive.
    pub fn reset(&mut self) {
        self.ppu.reset();
        self.apu.reset();
        self.mapper.reset();
        self.nmi_level = false;
        self.nmi_pending = false;
        self.dmc_dma_pending = false;
    }

    /// CPU cycles elapsed since power-on.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Advance one CPU cycle: APU tick, three PPU dots with the NMI
    /// edge sampled after the first, then the PPU's end-of-cycle latch.
    fn advance_cycle(&mut self) {
        self.cycles += 1;

        self.apu.tick();
        if self.apu.dmc_needs_dma() {
            self.dmc_dma_pending = true;
        }
        self.mapper.clock_cpu();

        self.ppu_dot();
        self.poll_nmi();
        self.ppu_dot();
        self.ppu_dot();
        self.ppu.end_cpu_cycle();
    }

    fn ppu_dot(&mut self) {
        let mut mem = PpuMem {
            mapper: &mut *self.mapper,
            ciram: &mut self.ciram,
        };
        self.ppu.tick(&mut mem);
    }

    /// Edge-detect the /NMI line: the latch sets on the falling edge
    /// (level going asserted) and stays until the CPU takes it.
    fn poll_nmi(&mut self) {
        let level = self.ppu.nmi_asserted();
        if level && !self.nmi_level {
            self.nmi_pending = true;
        }
        self.nmi_level = level;
    }

    /// One read cycle: decode, drive the bus, tick the clock.
    fn read_cycle(&mut self, addr: u16) -> u8 {
        let value = match addr >> 13 {
            0 => self.ram[(addr & 0x07FF) as usize],
            1 => {
                let open_bus = self.bus_data;
                let mut mem = PpuMem {
                    mapper: &mut *self.mapper,
                    ciram: &mut self.ciram,
                };
                self.ppu.read_register(addr, open_bus, &mut mem)
            }
            2 => match addr {
                0x4015 => self.apu.read_status(self.bus_data),
                0x4016 => (self.bus_data & 0xE0) | (self.joypad1.read() & 0x1F),
                0x4017 => (self.bus_data & 0xE0) | (self.joypad2.read() & 0x1F),
                // Write-only APU/IO registers and $4018-$5FFF.
                _ => self.bus_data,
            },
            _ => self.mapper.prg_read(addr),
        };

        self.bus_data = value;
        self.advance_cycle();
        value
    }

    /// One write cycle: drive the bus, decode, tick the clock. OAM DMA
    /// runs after its trigger cycle completes.
    fn write_cycle(&mut self, addr: u16, val: u8) {
        self.bus_data = val;
        let mut oam_dma_page = None;

        match addr >> 13 {
            0 => self.ram[(addr & 0x07FF) as usize] = val,
            1 => {
                let mut mem = PpuMem {
                    mapper: &mut *self.mapper,
                    ciram: &mut self.ciram,
                };
                self.ppu.write_register(addr, val, &mut mem);
            }
            2 => match addr {
                0x4014 => oam_dma_page = Some(val),
                0x4016 => {
                    self.joypad1.write_strobe(val);
                    self.joypad2.write_strobe(val);
                }
                0x4000..=0x4013 | 0x4015 | 0x4017 => self.apu.write(addr, val),
                _ => {}
            },
            _ => self.mapper.prg_write(addr, val),
        }

        self.advance_cycle();

        if let Some(page) = oam_dma_page {
            self.oam_dma(page);
        }
    }

    /// OAM DMA: halt cycle, an alignment cycle when the trigger write
    /// landed on an odd CPU cycle, then 256 read/write pairs into
    /// OAMDATA. 513 or 514 cycles on top of the triggering write. DMC
    /// fetches coming due mid-transfer steal their cycles in between.
    fn oam_dma(&mut self, page: u8) {
        let odd = self.cycles & 1 == 1;
        self.advance_cycle();
        if odd {
            self.advance_cycle();
        }

        let base = u16::from(page) << 8;
        for i in 0..256 {
            if self.dmc_dma_pending {
                self.run_dmc_dma();
            }
            let data = self.read_cycle(base + i);
            self.bus_data = data;
            let mut mem = PpuMem {
                mapper: &mut *self.mapper,
                ciram: &mut self.ciram,
            };
            self.ppu.write_register(0x2004, data, &mut mem);
            self.advance_cycle();
        }
    }

    /// DMC DMA: three stall cycles (one more on odd alignment), then
    /// the sample fetch itself as a normal bus read. The request flag
    /// clears only after the byte lands: the stall cycles themselves
    /// re-latch it, since the channel keeps asking until its buffer is
    /// filled.
    fn run_dmc_dma(&mut self) {
        // A $4015 write can cancel the fetch between the request latch
        // and the CPU's next read.
        if !self.apu.dmc_needs_dma() {
            self.dmc_dma_pending = false;
            return;
        }
        self.advance_cycle();
        self.advance_cycle();
        self.advance_cycle();
        if self.cycles & 1 == 1 {
            self.advance_cycle();
        }
        let addr = self.apu.dmc_dma_addr();
        let value = self.read_cycle(addr);
        self.apu.dmc_dma_load(value);
        self.dmc_dma_pending = false;
    }

    /// Side-effect-free memory view for debugging: no clock advance, no
    /// register side effects.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        match addr >> 13 {
            0 => self.ram[(addr & 0x07FF) as usize],
            1 => self.bus_data,
            2 => match addr {
                0x4015 => self.apu.peek_status(self.bus_data),
                _ => self.bus_data,
            },
            _ => self.mapper.prg_read(addr),
        }
    }
}

impl Bus for NesBus {
    fn read(&mut self, addr: u16) -> u8 {
        // The DMC halts the CPU at its next read cycle.
        if self.dmc_dma_pending {
            self.run_dmc_dma();
        }
        self.read_cycle(addr)
    }

    fn write(&mut self, addr: u16, val: u8) {
        self.write_cycle(addr, val);
    }

    fn tick(&mut self) {
        self.advance_cycle();
    }

    fn take_nmi(&mut self) -> bool {
        std::mem::take(&mut self.nmi_pending)
    }

    fn irq_asserted(&mut self) -> bool {
        self.apu.irq_asserted() || self.mapper.irq_asserted()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ironnes_mappers::{create_mapper, Cartridge, Mirroring};

    fn test_bus() -> NesBus {
        let cart = Cartridge {
            prg_rom: vec![0; 32 * 1024],
            chr_rom: vec![0; 8 * 1024],
            mapper: 0,
            submapper: 0,
            mirroring: Mirroring::Vertical,
            battery: false,
            name: "bus-test".into(),
        };
        NesBus::new(create_mapper(&cart).unwrap(), &Config::default())
    }

    #[test]
    fn ram_is_mirrored_every_2k() {
        let mut bus = test_bus();
        bus.write(0x0000, 0x42);
        assert_eq!(bus.read(0x0800), 0x42);
        assert_eq!(bus.read(0x1000), 0x42);
        assert_eq!(bus.read(0x1800), 0x42);

        bus.write(0x1234, 0xAB);
        assert_eq!(bus.read(0x0234), 0xAB);
    }

    #[test]
    fn each_access_is_three_ppu_dots() {
        let mut bus = test_bus();
        let start = (bus.ppu.scanline(), bus.ppu.dot());
        assert_eq!(start, (-1, 0));

        bus.read(0x0000);
        assert_eq!(bus.ppu.dot(), 3);
        bus.write(0x0000, 0);
        assert_eq!(bus.ppu.dot(), 6);
        bus.tick();
        assert_eq!(bus.ppu.dot(), 9);
        assert_eq!(bus.cycles(), 3);
    }

    #[test]
    fn open_bus_returns_last_driven_byte() {
        let mut bus = test_bus();
        bus.write(0x0000, 0xA5);
        let _ = bus.read(0x0000);
        // $4000 is write-only: the read sees the residue.
        assert_eq!(bus.read(0x4000), 0xA5);
        // $5000 is unmapped on NROM.
        assert_eq!(bus.read(0x5000), 0xA5);
    }

    #[test]
    fn ppustatus_low_bits_are_open_bus() {
        let mut bus = test_bus();
        bus.write(0x0000, 0x5F);
        let _ = bus.read(0x0000); // bus_data = $5F
        let status = bus.read(0x2002);
        assert_eq!(status & 0x1F, 0x1F);
    }

    #[test]
    fn controller_round_trip() {
        use crate::joypad::Button;

        let mut bus = test_bus();
        bus.joypad1.set_button(Button::A, true);
        bus.joypad1.set_button(Button::Start, true);

        bus.write(0x4016, 1);
        bus.write(0x4016, 0);

        let expected = [1, 0, 0, 1, 0, 0, 0, 0];
        for (i, &want) in expected.iter().enumerate() {
            assert_eq!(bus.read(0x4016) & 1, want, "button {i}");
        }
        assert_eq!(bus.read(0x4016) & 1, 1); // saturated
    }

    #[test]
    fn controller_upper_bits_are_open_bus() {
        let mut bus = test_bus();
        bus.write(0x0000, 0xFF);
        let _ = bus.read(0x0000);
        let value = bus.read(0x4016);
        assert_eq!(value & 0xE0, 0xE0);
    }

    #[test]
    fn ppudata_writes_reach_nametables() {
        let mut bus = test_bus();
        bus.write(0x2006, 0x20);
        bus.write(0x2006, 0x00);
        for value in [0x11u8, 0x22, 0x33] {
            bus.write(0x2007, value);
        }

        bus.write(0x2006, 0x20);
        bus.write(0x2006, 0x00);
        let _ = bus.read(0x2007); // prime the buffer
        assert_eq!(bus.read(0x2007), 0x11);
        assert_eq!(bus.read(0x2007), 0x22);
        assert_eq!(bus.read(0x2007), 0x33);
    }

    /// Absolute dot position, for asserting PPU progress across stalls.
    fn dot_index(bus: &NesBus) -> u64 {
        (bus.ppu.scanline() + 1) as u64 * 341 + u64::from(bus.ppu.dot())
    }

    #[test]
    fn dmc_dma_stalls_the_next_read_and_fills_the_buffer() {
        let mut prg = vec![0; 32 * 1024];
        prg[0x4000] = 0x5A; // $C000, the programmed sample address
        let cart = Cartridge {
            prg_rom: prg,
            chr_rom: vec![0; 8 * 1024],
            mapper: 0,
            submapper: 0,
            mirroring: Mirroring::Vertical,
            battery: false,
            name: "dmc-dma".into(),
        };
        let mut bus = NesBus::new(create_mapper(&cart).unwrap(), &Config::default());

        bus.write(0x4012, 0x00); // sample address $C000
        bus.write(0x4013, 0x00); // sample length 1 byte
        bus.write(0x4015, 0x10); // DMC on: restart pending
        // Give the APU a get cycle to apply the restart and raise the
        // fetch request.
        bus.tick();
        bus.tick();
        assert!(bus.dmc_dma_pending);

        let before = bus.cycles();
        let apu_before = bus.apu.cycles();
        let dots_before = dot_index(&bus);
        let _ = bus.read(0x0000);
        let taken = bus.cycles() - before;

        // Three stall cycles (one more on odd alignment), the sample
        // fetch, then the read the CPU actually asked for.
        let odd = (before + 3) & 1 == 1;
        assert_eq!(taken, 3 + u64::from(odd) + 1 + 1);
        assert!(!bus.dmc_dma_pending);
        // The fetched byte landed in the channel's sample buffer.
        assert_eq!(bus.apu.dmc_sample_buffer(), Some(0x5A));

        // The stall is real simulated time: APU and PPU tick through it.
        assert_eq!(bus.apu.cycles() - apu_before, taken);
        assert_eq!(dot_index(&bus) - dots_before, 3 * taken);
    }

    #[test]
    fn disabling_dmc_cancels_a_latched_fetch() {
        let mut bus = test_bus();
        bus.write(0x4012, 0x00);
        bus.write(0x4013, 0x00);
        bus.write(0x4015, 0x10);
        bus.tick();
        bus.tick();
        assert!(bus.dmc_dma_pending);

        // DMC switched off before the CPU's next read: no stall, no
        // fetch.
        bus.write(0x4015, 0x00);
        let before = bus.cycles();
        let _ = bus.read(0x0000);
        assert_eq!(bus.cycles() - before, 1);
        assert!(!bus.dmc_dma_pending);
        assert_eq!(bus.apu.dmc_sample_buffer(), None);
    }

    #[test]
    fn oam_dma_takes_513_or_514_cycles() {
        let mut bus = test_bus();
        for i in 0..256u16 {
            bus.write(0x0200 + i, i as u8);
        }

        let before = bus.cycles();
        let odd_at_trigger = (before + 1) & 1 == 1;
        bus.write(0x4014, 0x02);
        let taken = bus.cycles() - before;
        // 1 trigger write + 513/514 DMA cycles.
        assert_eq!(taken, 1 + 513 + u64::from(odd_at_trigger));
    }

    #[test]
    fn nmi_edge_is_latched_once() {
        let mut bus = test_bus();
        bus.write(0x2000, 0x80); // NMI enable

        // Run until safely past the vblank set point, far enough that
        // the following cycle's edge sample has also happened.
        while !(bus.ppu.scanline() == 241 && bus.ppu.dot() >= 6) {
            bus.tick();
        }
        assert!(bus.take_nmi());
        assert!(!bus.take_nmi()); // consumed
    }

    #[test]
    fn enabling_nmi_during_vblank_raises_edge() {
        let mut bus = test_bus();
        // Enter vblank with NMI disabled.
        while !(bus.ppu.scanline() == 242) {
            bus.tick();
        }
        assert!(!bus.take_nmi());

        bus.write(0x2000, 0x80);
        assert!(bus.take_nmi());
    }
}
