//! DMC: 1-bit delta-coded sample playback fed by bus-level DMA.
//!
//! The channel itself never touches memory. When its one-byte sample
//! buffer runs dry it raises a DMA request that the system bus services
//! at the CPU's next read cycle, stalling the CPU and handing the
//! fetched byte back through [`Dmc::dma_load`].

/// NTSC rate table, already halved to APU cycles (the channel is
/// clocked every second CPU cycle).
const PERIODS: [u16; 16] = [
    214, 190, 170, 160, 143, 127, 113, 107, 95, 80, 71, 64, 53, 42, 36, 27,
];

/// Delta modulation channel.
#[derive(Debug, Clone, Copy)]
pub struct Dmc {
    irq_enabled: bool,
    loop_enabled: bool,
    timer_period: u16,
    timer: u16,

    /// 7-bit DAC level.
    output_level: u8,

    /// Programmed sample start ($4012) and length ($4013).
    sample_addr: u16,
    sample_length: u16,
    /// Live fetch address and countdown.
    current_addr: u16,
    bytes_remaining: u16,

    shift: u8,
    bits_remaining: u8,
    silence: bool,

    sample_buffer: u8,
    buffer_empty: bool,

    /// Reload address/length on the next APU get cycle.
    restart: bool,

    enabled: bool,
    irq: bool,
}

impl Dmc {
    /// New idle channel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            irq_enabled: false,
            loop_enabled: false,
            timer_period: PERIODS[0] - 1,
            timer: 0,
            output_level: 0,
            sample_addr: 0xC000,
            sample_length: 1,
            current_addr: 0xC000,
            bytes_remaining: 0,
            shift: 0,
            bits_remaining: 8,
            silence: true,
            sample_buffer: 0,
            buffer_empty: true,
            restart: false,
            enabled: false,
            irq: false,
        }
    }

    /// $4010: IRQ enable, loop, rate select.
    pub fn write_ctrl(&mut self, value: u8) {
        self.irq_enabled = value & 0x80 != 0;
        self.loop_enabled = value & 0x40 != 0;
        self.timer_period = PERIODS[(value & 0x0F) as usize] - 1;
        if !self.irq_enabled {
            self.irq = false;
        }
    }

    /// $4011: direct DAC load.
    pub fn write_direct_load(&mut self, value: u8) {
        self.output_level = value & 0x7F;
    }

    /// $4012: sample address = $C000 + 64 * value.
    pub fn write_sample_addr(&mut self, value: u8) {
        self.sample_addr = 0xC000 + u16::from(value) * 64;
    }

    /// $4013: sample length = 16 * value + 1 bytes.
    pub fn write_sample_length(&mut self, value: u8) {
        self.sample_length = u16::from(value) * 16 + 1;
    }

    /// $4015 DMC bit. Clearing stops the fetcher; setting restarts the
    /// sample only if it had finished.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.bytes_remaining = 0;
        } else if self.bytes_remaining == 0 {
            self.restart = true;
        }
    }

    /// Apply a pending restart (APU get cycle).
    pub fn apply_restart(&mut self) {
        if self.restart {
            self.restart = false;
            self.current_addr = self.sample_addr;
            self.bytes_remaining = self.sample_length;
        }
    }

    /// The sample buffer needs a byte fetched over the bus.
    #[must_use]
    pub fn needs_dma(&self) -> bool {
        self.enabled && self.buffer_empty && self.bytes_remaining > 0
    }

    /// Address the DMA unit should fetch from.
    #[must_use]
    pub fn dma_addr(&self) -> u16 {
        self.current_addr
    }

    /// Complete a DMA fetch: fill the buffer, advance the address
    /// (wrapping $FFFF to $8000), and finish or loop the sample.
    pub fn dma_load(&mut self, value: u8) {
        self.sample_buffer = value;
        self.buffer_empty = false;
        self.current_addr = if self.current_addr == 0xFFFF {
            0x8000
        } else {
            self.current_addr + 1
        };
        self.bytes_remaining -= 1;
        if self.bytes_remaining == 0 {
            if self.loop_enabled {
                self.restart = true;
            } else if self.irq_enabled {
                self.irq = true;
            }
        }
    }

    /// APU-rate output clock.
    pub fn clock_timer(&mut self) {
        if self.timer > 0 {
            self.timer -= 1;
            return;
        }
        self.timer = self.timer_period;

        if !self.silence {
            if self.shift & 1 != 0 {
                if self.output_level <= 125 {
                    self.output_level += 2;
                }
            } else if self.output_level >= 2 {
                self.output_level -= 2;
            }
        }
        self.shift >>= 1;
        self.bits_remaining -= 1;

        if self.bits_remaining == 0 {
            self.bits_remaining = 8;
            if self.buffer_empty {
                self.silence = true;
            } else {
                self.silence = false;
                self.shift = self.sample_buffer;
                self.buffer_empty = true;
            }
        }
    }

    /// Bytes remaining non-zero ($4015 status bit).
    #[must_use]
    pub fn active(&self) -> bool {
        self.bytes_remaining > 0
    }

    /// Contents of the one-byte sample buffer, if filled.
    #[must_use]
    pub fn sample_buffer(&self) -> Option<u8> {
        (!self.buffer_empty).then_some(self.sample_buffer)
    }

    /// DMC IRQ latch.
    #[must_use]
    pub fn irq(&self) -> bool {
        self.irq
    }

    /// $4015 write side effect.
    pub fn clear_irq(&mut self) {
        self.irq = false;
    }

    /// Current DAC level (0-127).
    #[must_use]
    pub fn output(&self) -> u8 {
        self.output_level
    }
}

impl Default for Dmc {
    fn default() -> Self {
        Self::new()
    }
}
