//! The console: CPU plus bus, and the host-facing run loop.

use ironnes_apu::AudioSink;
use ironnes_cpu::Cpu;
use ironnes_mappers::{create_mapper, Cartridge, CartridgeError};
use thiserror::Error;

use crate::bus::NesBus;
use crate::config::Config;
use crate::joypad::Button;
use crate::sram;

/// Errors surfaced when installing a cartridge. Nothing after
/// construction fails: stray bus traffic degrades to open-bus values
/// exactly as the hardware does.
#[derive(Debug, Error)]
pub enum ConsoleError {
    /// The cartridge descriptor was rejected.
    #[error(transparent)]
    Cartridge(#[from] CartridgeError),
}

/// Button order of the host-facing input array: A, B, Up, Down, Left,
/// Right, Start, Select for controller 1, then the same for
/// controller 2.
const BUTTON_LAYOUT: [Button; 8] = [
    Button::A,
    Button::B,
    Button::Up,
    Button::Down,
    Button::Left,
    Button::Right,
    Button::Start,
    Button::Select,
];

/// A complete NES.
pub struct Console {
    cpu: Cpu,
    bus: NesBus,
    cart_name: String,
    has_battery: bool,
}

impl Console {
    /// Install a cartridge and power on. Battery RAM is read back from
    /// `<name>.sav` when present.
    pub fn new(cart: &Cartridge, config: &Config) -> Result<Self, ConsoleError> {
        let mut mapper = create_mapper(cart)?;
        if cart.battery {
            if let Some(data) = sram::load(&cart.name) {
                mapper.load_battery_ram(&data);
            }
        }

        let mut bus = NesBus::new(mapper, config);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        Ok(Self {
            cpu,
            bus,
            cart_name: cart.name.clone(),
            has_battery: cart.battery,
        })
    }

    /// Run until the PPU finishes the next frame.
    pub fn run_frame(&mut self) {
        self.bus.ppu.ack_frame();
        while !self.bus.ppu.frame_finished() {
            self.cpu.step(&mut self.bus);
        }
    }

    /// Execute a single CPU instruction (debug stepping).
    pub fn step_instruction(&mut self) {
        self.cpu.step(&mut self.bus);
    }

    /// Pull the reset line.
    pub fn reset(&mut self) {
        self.bus.reset();
        self.cpu.reset(&mut self.bus);
    }

    /// Flush battery RAM to disk. Call once when tearing down.
    pub fn shutdown(&mut self) {
        if !self.has_battery {
            return;
        }
        if let Some(data) = self.bus.mapper.battery_ram() {
            if let Err(err) = sram::save(&self.cart_name, data) {
                log::warn!("failed to write save RAM: {err}");
            }
        }
    }

    /// Update both controllers from the host's 16-entry button array
    /// (A, B, Up, Down, Left, Right, Start, Select per pad).
    pub fn set_buttons(&mut self, buttons: &[bool; 16]) {
        for (i, &button) in BUTTON_LAYOUT.iter().enumerate() {
            self.bus.joypad1.set_button(button, buttons[i]);
            self.bus.joypad2.set_button(button, buttons[i + 8]);
        }
    }

    /// Install the audio callback.
    pub fn set_audio_sink(&mut self, sink: Box<dyn AudioSink>) {
        self.bus.apu.set_sink(sink);
    }

    /// The last completed frame: 256x240 pixels, ARGB8888.
    #[must_use]
    pub fn frame(&self) -> &[u32] {
        self.bus.ppu.frame()
    }

    /// CPU cycles elapsed since power-on.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.bus.cycles()
    }

    /// Completed frame count.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.bus.ppu.frames()
    }

    /// Side-effect-free memory read for debugging.
    #[must_use]
    pub fn peek(&self, addr: u16) -> u8 {
        self.bus.peek(addr)
    }

    /// CPU register view for debugging.
    #[must_use]
    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    /// Bus access for debugging and tests.
    #[must_use]
    pub fn bus(&self) -> &NesBus {
        &self.bus
    }

    /// Mutable bus access for debugging and tests.
    pub fn bus_mut(&mut self) -> &mut NesBus {
        &mut self.bus
    }
}
