//! Triangle channel: 32-step sequence gated by a linear counter.

use crate::length_counter::LengthCounter;
use crate::timer::Timer;

const SEQUENCE: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11,
    12, 13, 14, 15,
];

/// Triangle channel. The timer clocks at the full CPU rate, one octave
/// below the pulse channels for the same period value.
#[derive(Debug, Clone, Copy)]
pub struct Triangle {
    timer: Timer,
    length: LengthCounter,
    linear_counter: u8,
    linear_reload_value: u8,
    linear_reload: bool,
    /// Control bit: halts the length counter and keeps the linear
    /// counter reloading.
    control: bool,
    step: u8,
    /// Latched sample. The sequence holds its last value when gated off
    /// rather than dropping to zero.
    output: u8,
}

impl Triangle {
    /// New silent triangle channel.
    #[must_use]
    pub fn new() -> Self {
        Self {
            timer: Timer::new(),
            length: LengthCounter::new(),
            linear_counter: 0,
            linear_reload_value: 0,
            linear_reload: false,
            control: false,
            step: 0,
            output: 0,
        }
    }

    /// $4008: control flag and linear counter reload value.
    pub fn write_linear(&mut self, value: u8) {
        self.control = value & 0x80 != 0;
        self.length.set_halt(self.control);
        self.linear_reload_value = value & 0x7F;
    }

    /// $400A: timer low.
    pub fn write_timer_lo(&mut self, value: u8) {
        self.timer.set_period_lo(value);
    }

    /// $400B: timer high + length load; flags a linear counter reload.
    pub fn write_timer_hi(&mut self, value: u8) {
        self.timer.set_period_hi(value);
        self.length.load(value >> 3);
        self.linear_reload = true;
    }

    /// $4015 enable bit.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.length.set_enabled(enabled);
    }

    /// Length counter still running ($4015 status bit).
    #[must_use]
    pub fn active(&self) -> bool {
        self.length.active()
    }

    /// CPU-rate timer clock.
    pub fn clock_timer(&mut self) {
        let gate = self.length.active() && self.linear_counter > 0;
        if self.timer.clock() && gate {
            self.step = (self.step + 1) & 0x1F;
        }
        // Ultrasonic periods are silenced outright; otherwise the last
        // sequence value holds while the gate is closed.
        if self.timer.period < 2 {
            self.output = 0;
        } else if gate {
            self.output = SEQUENCE[self.step as usize];
        }
    }

    /// Quarter-frame linear counter clock.
    pub fn clock_linear(&mut self) {
        if self.linear_reload {
            self.linear_counter = self.linear_reload_value;
        } else if self.linear_counter > 0 {
            self.linear_counter -= 1;
        }
        if !self.control {
            self.linear_reload = false;
        }
    }

    /// Half-frame length clock.
    pub fn clock_length(&mut self) {
        self.length.clock();
    }

    /// Current sample (0-15).
    #[must_use]
    pub fn output(&self) -> u8 {
        self.output
    }
}

impl Default for Triangle {
    fn default() -> Self {
        Self::new()
    }
}
