//! 6502 core.
//!
//! Every cycle of every instruction is a call into the [`Bus`]: operand
//! fetches, dummy reads on indexed writes, the double write of
//! read-modify-write instructions, and pure internal cycles via
//! [`Bus::tick`]. The executor never adds cycles out of band, so the
//! documented per-instruction timings (including page-cross and taken-
//! branch penalties) are a property of the access sequence itself.

use log::warn;

use crate::addressing::AddrMode;
use crate::bus::Bus;
use crate::opcodes::{Op, OPCODE_TABLE};
use crate::status::Status;

/// NMI vector location.
pub const NMI_VECTOR: u16 = 0xFFFA;
/// Reset vector location.
pub const RESET_VECTOR: u16 = 0xFFFC;
/// IRQ/BRK vector location.
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// How an instruction uses its effective address. Write and
/// read-modify-write forms always pay the indexed dummy read; plain
/// reads pay it only when the index crosses a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Read,
    Write,
    Modify,
}

/// MOS 6502 CPU registers and execution state.
pub struct Cpu {
    /// Accumulator.
    pub a: u8,
    /// X index register.
    pub x: u8,
    /// Y index register.
    pub y: u8,
    /// Stack pointer, offset into page $0100.
    pub sp: u8,
    /// Program counter.
    pub pc: u16,
    /// Status register.
    pub status: Status,
    /// I-flag value sampled one instruction ago. IRQ polling uses this
    /// rather than the live flag, which gives CLI/SEI/PLP/RTI their
    /// one-instruction latency.
    prev_irq_inhibit: bool,
    /// Opcode bytes already reported as unimplemented.
    unknown_logged: [bool; 256],
}

impl Cpu {
    /// Create a CPU in power-on state. The program counter is loaded by
    /// [`Cpu::reset`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: Status::POWER_ON,
            prev_irq_inhibit: true,
            unknown_logged: [false; 256],
        }
    }

    /// Run the reset sequence: S is decremented by 3 with no writes, I is
    /// set, and PC is fetched from the reset vector. Takes 7 cycles.
    pub fn reset(&mut self, bus: &mut impl Bus) {
        self.sp = self.sp.wrapping_sub(3);
        self.status.insert(Status::I);
        self.prev_irq_inhibit = true;
        for _ in 0..5 {
            bus.tick();
        }
        self.pc = bus.read_u16(RESET_VECTOR);
    }

    /// Execute one instruction, or service a pending interrupt instead.
    ///
    /// Interrupts are sampled at the instruction boundary from the bus
    /// latches the system updates mid-cycle; NMI wins over IRQ, and IRQ
    /// honours the I flag with its one-instruction write latency.
    pub fn step(&mut self, bus: &mut impl Bus) {
        if bus.take_nmi() {
            self.prev_irq_inhibit = true;
            self.service_interrupt(bus, NMI_VECTOR);
            return;
        }

        let irq_blocked = self.prev_irq_inhibit;
        self.prev_irq_inhibit = self.status.contains(Status::I);

        if !irq_blocked && bus.irq_asserted() {
            self.prev_irq_inhibit = true;
            self.service_interrupt(bus, IRQ_VECTOR);
            return;
        }

        let opcode = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        let info = OPCODE_TABLE[opcode as usize];
        self.execute(opcode, info.op, info.mode, bus);
    }

    /// Seven-cycle NMI/IRQ entry: two internal cycles, three pushes
    /// (status with B = 0), then the vector fetch. Sets I.
    fn service_interrupt(&mut self, bus: &mut impl Bus, vector: u16) {
        bus.tick();
        bus.tick();
        self.push(bus, (self.pc >> 8) as u8);
        self.push(bus, (self.pc & 0xFF) as u8);
        self.push(bus, self.status.pushed(false));
        self.status.insert(Status::I);
        self.pc = bus.read_u16(vector);
    }

    // ---------------------------------------------------------------
    // Stack helpers (each one bus cycle)
    // ---------------------------------------------------------------

    fn push(&mut self, bus: &mut impl Bus, value: u8) {
        bus.write(0x0100 | u16::from(self.sp), value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        bus.read(0x0100 | u16::from(self.sp))
    }

    // ---------------------------------------------------------------
    // Effective-address resolution
    // ---------------------------------------------------------------

    /// Resolve the operand address for memory-addressed modes,
    /// performing every fetch and dummy access the hardware does.
    fn effective_addr(&mut self, bus: &mut impl Bus, mode: AddrMode, access: Access) -> u16 {
        match mode {
            AddrMode::ZeroPage => {
                let addr = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                u16::from(addr)
            }
            AddrMode::ZeroPageX => {
                let base = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                let _ = bus.read(u16::from(base));
                u16::from(base.wrapping_add(self.x))
            }
            AddrMode::ZeroPageY => {
                let base = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                let _ = bus.read(u16::from(base));
                u16::from(base.wrapping_add(self.y))
            }
            AddrMode::Absolute => {
                let addr = bus.read_u16(self.pc);
                self.pc = self.pc.wrapping_add(2);
                addr
            }
            AddrMode::AbsoluteX => self.indexed_absolute(bus, self.x, access),
            AddrMode::AbsoluteY => self.indexed_absolute(bus, self.y, access),
            AddrMode::Indirect => {
                let ptr = bus.read_u16(self.pc);
                self.pc = self.pc.wrapping_add(2);
                bus.read_u16_wrapped(ptr)
            }
            AddrMode::IndirectX => {
                let zp = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                let _ = bus.read(u16::from(zp));
                let ptr = zp.wrapping_add(self.x);
                let lo = u16::from(bus.read(u16::from(ptr)));
                let hi = u16::from(bus.read(u16::from(ptr.wrapping_add(1))));
                hi << 8 | lo
            }
            AddrMode::IndirectY => {
                let zp = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                let lo = u16::from(bus.read(u16::from(zp)));
                let hi = u16::from(bus.read(u16::from(zp.wrapping_add(1))));
                let base = hi << 8 | lo;
                self.index_with_penalty(bus, base, self.y, access)
            }
            AddrMode::Implied
            | AddrMode::Accumulator
            | AddrMode::Immediate
            | AddrMode::Relative => unreachable!("mode has no effective address"),
        }
    }

    fn indexed_absolute(&mut self, bus: &mut impl Bus, index: u8, access: Access) -> u16 {
        let base = bus.read_u16(self.pc);
        self.pc = self.pc.wrapping_add(2);
        self.index_with_penalty(bus, base, index, access)
    }

    /// Apply an index register to a base address. Reads pay the extra
    /// cycle only on a page crossing; writes and read-modify-writes
    /// always perform the dummy read at the un-fixed address.
    fn index_with_penalty(&mut self, bus: &mut impl Bus, base: u16, index: u8, access: Access) -> u16 {
        let addr = base.wrapping_add(u16::from(index));
        let crossed = addr & 0xFF00 != base & 0xFF00;
        if access != Access::Read || crossed {
            let _ = bus.read(base & 0xFF00 | addr & 0x00FF);
        }
        addr
    }

    /// Fetch the operand value for a read-class instruction.
    fn read_operand(&mut self, bus: &mut impl Bus, mode: AddrMode) -> u8 {
        if mode == AddrMode::Immediate {
            let value = bus.read(self.pc);
            self.pc = self.pc.wrapping_add(1);
            value
        } else {
            let addr = self.effective_addr(bus, mode, Access::Read);
            bus.read(addr)
        }
    }

    // ---------------------------------------------------------------
    // Execution
    // ---------------------------------------------------------------

    #[allow(clippy::too_many_lines)]
    fn execute(&mut self, opcode: u8, op: Op, mode: AddrMode, bus: &mut impl Bus) {
        match op {
            // Loads
            Op::Lda => {
                self.a = self.read_operand(bus, mode);
                self.status.set_zn(self.a);
            }
            Op::Ldx => {
                self.x = self.read_operand(bus, mode);
                self.status.set_zn(self.x);
            }
            Op::Ldy => {
                self.y = self.read_operand(bus, mode);
                self.status.set_zn(self.y);
            }

            // Stores
            Op::Sta => self.store(bus, mode, self.a),
            Op::Stx => self.store(bus, mode, self.x),
            Op::Sty => self.store(bus, mode, self.y),

            // Transfers (one internal cycle each)
            Op::Tax => {
                bus.tick();
                self.x = self.a;
                self.status.set_zn(self.x);
            }
            Op::Tay => {
                bus.tick();
                self.y = self.a;
                self.status.set_zn(self.y);
            }
            Op::Tsx => {
                bus.tick();
                self.x = self.sp;
                self.status.set_zn(self.x);
            }
            Op::Txa => {
                bus.tick();
                self.a = self.x;
                self.status.set_zn(self.a);
            }
            Op::Txs => {
                bus.tick();
                self.sp = self.x;
            }
            Op::Tya => {
                bus.tick();
                self.a = self.y;
                self.status.set_zn(self.a);
            }

            // Stack
            Op::Pha => {
                bus.tick();
                self.push(bus, self.a);
            }
            Op::Php => {
                bus.tick();
                let value = self.status.pushed(true);
                self.push(bus, value);
            }
            Op::Pla => {
                bus.tick();
                bus.tick();
                self.a = self.pull(bus);
                self.status.set_zn(self.a);
            }
            Op::Plp => {
                bus.tick();
                bus.tick();
                let value = self.pull(bus);
                self.status = Status::pulled(value);
            }

            // Arithmetic
            Op::Adc => {
                let value = self.read_operand(bus, mode);
                self.adc(value);
            }
            Op::Sbc => {
                let value = self.read_operand(bus, mode);
                self.adc(!value);
            }

            // Logic
            Op::And => {
                self.a &= self.read_operand(bus, mode);
                self.status.set_zn(self.a);
            }
            Op::Eor => {
                self.a ^= self.read_operand(bus, mode);
                self.status.set_zn(self.a);
            }
            Op::Ora => {
                self.a |= self.read_operand(bus, mode);
                self.status.set_zn(self.a);
            }
            Op::Bit => {
                let value = self.read_operand(bus, mode);
                self.status.set(Status::Z, self.a & value == 0);
                self.status.set(Status::V, value & 0x40 != 0);
                self.status.set(Status::N, value & 0x80 != 0);
            }

            // Compares
            Op::Cmp => {
                let value = self.read_operand(bus, mode);
                self.compare(self.a, value);
            }
            Op::Cpx => {
                let value = self.read_operand(bus, mode);
                self.compare(self.x, value);
            }
            Op::Cpy => {
                let value = self.read_operand(bus, mode);
                self.compare(self.y, value);
            }

            // Register increments / decrements
            Op::Inx => {
                bus.tick();
                self.x = self.x.wrapping_add(1);
                self.status.set_zn(self.x);
            }
            Op::Iny => {
                bus.tick();
                self.y = self.y.wrapping_add(1);
                self.status.set_zn(self.y);
            }
            Op::Dex => {
                bus.tick();
                self.x = self.x.wrapping_sub(1);
                self.status.set_zn(self.x);
            }
            Op::Dey => {
                bus.tick();
                self.y = self.y.wrapping_sub(1);
                self.status.set_zn(self.y);
            }

            // Memory increments / decrements
            Op::Inc => {
                self.modify(bus, mode, |cpu, v| {
                    let r = v.wrapping_add(1);
                    cpu.status.set_zn(r);
                    r
                });
            }
            Op::Dec => {
                self.modify(bus, mode, |cpu, v| {
                    let r = v.wrapping_sub(1);
                    cpu.status.set_zn(r);
                    r
                });
            }

            // Shifts / rotates
            Op::Asl => self.shift(bus, mode, Self::asl_value),
            Op::Lsr => self.shift(bus, mode, Self::lsr_value),
            Op::Rol => self.shift(bus, mode, Self::rol_value),
            Op::Ror => self.shift(bus, mode, Self::ror_value),

            // Jumps
            Op::Jmp => {
                self.pc = self.effective_addr(bus, mode, Access::Read);
            }
            Op::Jsr => {
                let lo = bus.read(self.pc);
                self.pc = self.pc.wrapping_add(1);
                bus.tick();
                self.push(bus, (self.pc >> 8) as u8);
                self.push(bus, (self.pc & 0xFF) as u8);
                let hi = bus.read(self.pc);
                self.pc = u16::from(hi) << 8 | u16::from(lo);
            }
            Op::Rts => {
                bus.tick();
                bus.tick();
                let lo = self.pull(bus);
                let hi = self.pull(bus);
                bus.tick();
                self.pc = (u16::from(hi) << 8 | u16::from(lo)).wrapping_add(1);
            }
            Op::Rti => {
                bus.tick();
                bus.tick();
                let value = self.pull(bus);
                self.status = Status::pulled(value);
                // Interrupts restored as masked block immediately.
                if self.status.contains(Status::I) {
                    self.prev_irq_inhibit = true;
                }
                let lo = self.pull(bus);
                let hi = self.pull(bus);
                self.pc = u16::from(hi) << 8 | u16::from(lo);
            }
            Op::Brk => self.brk(bus),

            // Branches
            Op::Bcc => self.branch(bus, !self.status.contains(Status::C)),
            Op::Bcs => self.branch(bus, self.status.contains(Status::C)),
            Op::Beq => self.branch(bus, self.status.contains(Status::Z)),
            Op::Bmi => self.branch(bus, self.status.contains(Status::N)),
            Op::Bne => self.branch(bus, !self.status.contains(Status::Z)),
            Op::Bpl => self.branch(bus, !self.status.contains(Status::N)),
            Op::Bvc => self.branch(bus, !self.status.contains(Status::V)),
            Op::Bvs => self.branch(bus, self.status.contains(Status::V)),

            // Flags
            Op::Clc => {
                bus.tick();
                self.status.remove(Status::C);
            }
            Op::Cld => {
                bus.tick();
                self.status.remove(Status::D);
            }
            Op::Cli => {
                bus.tick();
                self.status.remove(Status::I);
            }
            Op::Clv => {
                bus.tick();
                self.status.remove(Status::V);
            }
            Op::Sec => {
                bus.tick();
                self.status.insert(Status::C);
            }
            Op::Sed => {
                bus.tick();
                self.status.insert(Status::D);
            }
            Op::Sei => {
                bus.tick();
                self.status.insert(Status::I);
            }

            // NOPs still perform their addressing-mode accesses.
            Op::Nop => match mode {
                AddrMode::Implied => bus.tick(),
                _ => {
                    let _ = self.read_operand(bus, mode);
                }
            },

            // Stable unofficial opcodes
            Op::Lax => {
                let value = self.read_operand(bus, mode);
                self.a = value;
                self.x = value;
                self.status.set_zn(value);
            }
            Op::Sax => self.store(bus, mode, self.a & self.x),
            Op::Dcp => {
                self.modify(bus, mode, |cpu, v| {
                    let r = v.wrapping_sub(1);
                    cpu.compare(cpu.a, r);
                    r
                });
            }
            Op::Isc => {
                self.modify(bus, mode, |cpu, v| {
                    let r = v.wrapping_add(1);
                    cpu.adc(!r);
                    r
                });
            }
            Op::Slo => {
                self.modify(bus, mode, |cpu, v| {
                    let r = cpu.asl_value(v);
                    cpu.a |= r;
                    cpu.status.set_zn(cpu.a);
                    r
                });
            }
            Op::Rla => {
                self.modify(bus, mode, |cpu, v| {
                    let r = cpu.rol_value(v);
                    cpu.a &= r;
                    cpu.status.set_zn(cpu.a);
                    r
                });
            }
            Op::Sre => {
                self.modify(bus, mode, |cpu, v| {
                    let r = cpu.lsr_value(v);
                    cpu.a ^= r;
                    cpu.status.set_zn(cpu.a);
                    r
                });
            }
            Op::Rra => {
                self.modify(bus, mode, |cpu, v| {
                    let r = cpu.ror_value(v);
                    cpu.adc(r);
                    r
                });
            }
            Op::Anc => {
                self.a &= self.read_operand(bus, mode);
                self.status.set_zn(self.a);
                self.status.set(Status::C, self.a & 0x80 != 0);
            }
            Op::Alr => {
                self.a &= self.read_operand(bus, mode);
                self.a = self.lsr_value(self.a);
            }
            Op::Arr => {
                self.a &= self.read_operand(bus, mode);
                let carry_in = u8::from(self.status.contains(Status::C));
                self.a = self.a >> 1 | carry_in << 7;
                self.status.set_zn(self.a);
                self.status.set(Status::C, self.a & 0x40 != 0);
                self.status
                    .set(Status::V, (self.a >> 6 ^ self.a >> 5) & 1 != 0);
            }
            Op::Axs => {
                let value = self.read_operand(bus, mode);
                let masked = self.a & self.x;
                self.status.set(Status::C, masked >= value);
                self.x = masked.wrapping_sub(value);
                self.status.set_zn(self.x);
            }
            Op::Las => {
                let value = self.read_operand(bus, mode);
                let result = value & self.sp;
                self.a = result;
                self.x = result;
                self.sp = result;
                self.status.set_zn(result);
            }

            Op::Unknown => {
                if !self.unknown_logged[opcode as usize] {
                    self.unknown_logged[opcode as usize] = true;
                    warn!("unimplemented opcode ${opcode:02X} at ${:04X}, treating as NOP", self.pc.wrapping_sub(1));
                }
                bus.tick();
            }
        }
    }

    /// BRK: two-byte instruction whose padding byte is fetched and
    /// discarded. Pushes PC+2 and status with B = 1, sets I, then
    /// vectors — through $FFFA instead of $FFFE when an NMI arrives in
    /// time to hijack the sequence.
    fn brk(&mut self, bus: &mut impl Bus) {
        let _ = bus.read(self.pc);
        self.pc = self.pc.wrapping_add(1);
        self.push(bus, (self.pc >> 8) as u8);
        self.push(bus, (self.pc & 0xFF) as u8);
        let vector = if bus.take_nmi() { NMI_VECTOR } else { IRQ_VECTOR };
        self.push(bus, self.status.pushed(true));
        self.status.insert(Status::I);
        self.pc = bus.read_u16(vector);
    }

    fn store(&mut self, bus: &mut impl Bus, mode: AddrMode, value: u8) {
        let addr = self.effective_addr(bus, mode, Access::Write);
        bus.write(addr, value);
    }

    /// Read-modify-write: read, write back the stale value, write the
    /// result. Both writes are real bus cycles.
    fn modify(
        &mut self,
        bus: &mut impl Bus,
        mode: AddrMode,
        f: impl FnOnce(&mut Self, u8) -> u8,
    ) {
        let addr = self.effective_addr(bus, mode, Access::Modify);
        let value = bus.read(addr);
        bus.write(addr, value);
        let result = f(self, value);
        bus.write(addr, result);
    }

    /// Shift/rotate: accumulator forms are a single internal cycle,
    /// memory forms are read-modify-write.
    fn shift(&mut self, bus: &mut impl Bus, mode: AddrMode, f: impl Fn(&mut Self, u8) -> u8) {
        if mode == AddrMode::Accumulator {
            bus.tick();
            self.a = f(self, self.a);
        } else {
            self.modify(bus, mode, |cpu, v| f(cpu, v));
        }
    }

    fn branch(&mut self, bus: &mut impl Bus, taken: bool) {
        let offset = bus.read(self.pc) as i8;
        self.pc = self.pc.wrapping_add(1);
        if taken {
            bus.tick();
            let target = self.pc.wrapping_add(offset as u16);
            if target & 0xFF00 != self.pc & 0xFF00 {
                bus.tick();
            }
            self.pc = target;
        }
    }

    // ---------------------------------------------------------------
    // ALU helpers
    // ---------------------------------------------------------------

    fn adc(&mut self, value: u8) {
        let carry = u16::from(self.status.contains(Status::C));
        let sum = u16::from(self.a) + u16::from(value) + carry;
        let result = sum as u8;
        self.status.set(Status::C, sum > 0xFF);
        self.status
            .set(Status::V, (!(self.a ^ value) & (self.a ^ result) & 0x80) != 0);
        self.a = result;
        self.status.set_zn(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.status.set(Status::C, register >= value);
        self.status.set_zn(register.wrapping_sub(value));
    }

    fn asl_value(&mut self, value: u8) -> u8 {
        self.status.set(Status::C, value & 0x80 != 0);
        let result = value << 1;
        self.status.set_zn(result);
        result
    }

    fn lsr_value(&mut self, value: u8) -> u8 {
        self.status.set(Status::C, value & 0x01 != 0);
        let result = value >> 1;
        self.status.set_zn(result);
        result
    }

    fn rol_value(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.status.contains(Status::C));
        self.status.set(Status::C, value & 0x80 != 0);
        let result = value << 1 | carry_in;
        self.status.set_zn(result);
        result
    }

    fn ror_value(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.status.contains(Status::C));
        self.status.set(Status::C, value & 0x01 != 0);
        let result = value >> 1 | carry_in << 7;
        self.status.set_zn(result);
        result
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}
