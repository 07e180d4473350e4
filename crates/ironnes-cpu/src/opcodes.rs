//! Opcode decode table.
//!
//! Each entry names the operation and its addressing mode, nothing else.
//! There is deliberately no cycle column: timing is a consequence of the
//! bus accesses the executor performs, so a stored count would only be a
//! second source of truth to drift out of sync.

use crate::addressing::AddrMode;

/// Operation mnemonic.
///
/// The official set plus the stable unofficial opcodes games actually
/// use. Anything not listed decodes to [`Op::Unknown`] and executes as a
/// two-cycle NOP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)] // mnemonics are self-describing
pub enum Op {
    // Official
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs,
    Clc, Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx,
    Iny, Jmp, Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp,
    Rol, Ror, Rti, Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay,
    Tsx, Txa, Txs, Tya,
    // Stable unofficial
    Lax, Sax, Dcp, Isc, Slo, Rla, Sre, Rra, Anc, Alr, Arr, Axs, Las,
    /// Unimplemented/unstable opcode; runs as a 2-cycle NOP.
    Unknown,
}

/// One decoded table entry.
#[derive(Debug, Clone, Copy)]
pub struct OpcodeInfo {
    /// Operation to perform.
    pub op: Op,
    /// How the operand is addressed.
    pub mode: AddrMode,
}

const fn e(op: Op, mode: AddrMode) -> OpcodeInfo {
    OpcodeInfo { op, mode }
}

/// Decode table for all 256 opcode bytes.
pub static OPCODE_TABLE: [OpcodeInfo; 256] = build_table();

#[allow(clippy::too_many_lines)]
const fn build_table() -> [OpcodeInfo; 256] {
    use AddrMode::{
        Absolute, AbsoluteX, AbsoluteY, Accumulator, Immediate, Implied, Indirect, IndirectX,
        IndirectY, Relative, ZeroPage, ZeroPageX, ZeroPageY,
    };

    let mut t = [e(Op::Unknown, Implied); 256];

    // Loads / stores
    t[0xA9] = e(Op::Lda, Immediate);
    t[0xA5] = e(Op::Lda, ZeroPage);
    t[0xB5] = e(Op::Lda, ZeroPageX);
    t[0xAD] = e(Op::Lda, Absolute);
    t[0xBD] = e(Op::Lda, AbsoluteX);
    t[0xB9] = e(Op::Lda, AbsoluteY);
    t[0xA1] = e(Op::Lda, IndirectX);
    t[0xB1] = e(Op::Lda, IndirectY);
    t[0xA2] = e(Op::Ldx, Immediate);
    t[0xA6] = e(Op::Ldx, ZeroPage);
    t[0xB6] = e(Op::Ldx, ZeroPageY);
    t[0xAE] = e(Op::Ldx, Absolute);
    t[0xBE] = e(Op::Ldx, AbsoluteY);
    t[0xA0] = e(Op::Ldy, Immediate);
    t[0xA4] = e(Op::Ldy, ZeroPage);
    t[0xB4] = e(Op::Ldy, ZeroPageX);
    t[0xAC] = e(Op::Ldy, Absolute);
    t[0xBC] = e(Op::Ldy, AbsoluteX);
    t[0x85] = e(Op::Sta, ZeroPage);
    t[0x95] = e(Op::Sta, ZeroPageX);
    t[0x8D] = e(Op::Sta, Absolute);
    t[0x9D] = e(Op::Sta, AbsoluteX);
    t[0x99] = e(Op::Sta, AbsoluteY);
    t[0x81] = e(Op::Sta, IndirectX);
    t[0x91] = e(Op::Sta, IndirectY);
    t[0x86] = e(Op::Stx, ZeroPage);
    t[0x96] = e(Op::Stx, ZeroPageY);
    t[0x8E] = e(Op::Stx, Absolute);
    t[0x84] = e(Op::Sty, ZeroPage);
    t[0x94] = e(Op::Sty, ZeroPageX);
    t[0x8C] = e(Op::Sty, Absolute);

    // Transfers
    t[0xAA] = e(Op::Tax, Implied);
    t[0xA8] = e(Op::Tay, Implied);
    t[0xBA] = e(Op::Tsx, Implied);
    t[0x8A] = e(Op::Txa, Implied);
    t[0x9A] = e(Op::Txs, Implied);
    t[0x98] = e(Op::Tya, Implied);

    // Stack
    t[0x48] = e(Op::Pha, Implied);
    t[0x08] = e(Op::Php, Implied);
    t[0x68] = e(Op::Pla, Implied);
    t[0x28] = e(Op::Plp, Implied);

    // Arithmetic
    t[0x69] = e(Op::Adc, Immediate);
    t[0x65] = e(Op::Adc, ZeroPage);
    t[0x75] = e(Op::Adc, ZeroPageX);
    t[0x6D] = e(Op::Adc, Absolute);
    t[0x7D] = e(Op::Adc, AbsoluteX);
    t[0x79] = e(Op::Adc, AbsoluteY);
    t[0x61] = e(Op::Adc, IndirectX);
    t[0x71] = e(Op::Adc, IndirectY);
    t[0xE9] = e(Op::Sbc, Immediate);
    t[0xE5] = e(Op::Sbc, ZeroPage);
    t[0xF5] = e(Op::Sbc, ZeroPageX);
    t[0xED] = e(Op::Sbc, Absolute);
    t[0xFD] = e(Op::Sbc, AbsoluteX);
    t[0xF9] = e(Op::Sbc, AbsoluteY);
    t[0xE1] = e(Op::Sbc, IndirectX);
    t[0xF1] = e(Op::Sbc, IndirectY);
    t[0xEB] = e(Op::Sbc, Immediate); // unofficial alias

    // Logic
    t[0x29] = e(Op::And, Immediate);
    t[0x25] = e(Op::And, ZeroPage);
    t[0x35] = e(Op::And, ZeroPageX);
    t[0x2D] = e(Op::And, Absolute);
    t[0x3D] = e(Op::And, AbsoluteX);
    t[0x39] = e(Op::And, AbsoluteY);
    t[0x21] = e(Op::And, IndirectX);
    t[0x31] = e(Op::And, IndirectY);
    t[0x49] = e(Op::Eor, Immediate);
    t[0x45] = e(Op::Eor, ZeroPage);
    t[0x55] = e(Op::Eor, ZeroPageX);
    t[0x4D] = e(Op::Eor, Absolute);
    t[0x5D] = e(Op::Eor, AbsoluteX);
    t[0x59] = e(Op::Eor, AbsoluteY);
    t[0x41] = e(Op::Eor, IndirectX);
    t[0x51] = e(Op::Eor, IndirectY);
    t[0x09] = e(Op::Ora, Immediate);
    t[0x05] = e(Op::Ora, ZeroPage);
    t[0x15] = e(Op::Ora, ZeroPageX);
    t[0x0D] = e(Op::Ora, Absolute);
    t[0x1D] = e(Op::Ora, AbsoluteX);
    t[0x19] = e(Op::Ora, AbsoluteY);
    t[0x01] = e(Op::Ora, IndirectX);
    t[0x11] = e(Op::Ora, IndirectY);
    t[0x24] = e(Op::Bit, ZeroPage);
    t[0x2C] = e(Op::Bit, Absolute);

    // Compares
    t[0xC9] = e(Op::Cmp, Immediate);
    t[0xC5] = e(Op::Cmp, ZeroPage);
    t[0xD5] = e(Op::Cmp, ZeroPageX);
    t[0xCD] = e(Op::Cmp, Absolute);
    t[0xDD] = e(Op::Cmp, AbsoluteX);
    t[0xD9] = e(Op::Cmp, AbsoluteY);
    t[0xC1] = e(Op::Cmp, IndirectX);
    t[0xD1] = e(Op::Cmp, IndirectY);
    t[0xE0] = e(Op::Cpx, Immediate);
    t[0xE4] = e(Op::Cpx, ZeroPage);
    t[0xEC] = e(Op::Cpx, Absolute);
    t[0xC0] = e(Op::Cpy, Immediate);
    t[0xC4] = e(Op::Cpy, ZeroPage);
    t[0xCC] = e(Op::Cpy, Absolute);

    // Increments / decrements
    t[0xE6] = e(Op::Inc, ZeroPage);
    t[0xF6] = e(Op::Inc, ZeroPageX);
    t[0xEE] = e(Op::Inc, Absolute);
    t[0xFE] = e(Op::Inc, AbsoluteX);
    t[0xC6] = e(Op::Dec, ZeroPage);
    t[0xD6] = e(Op::Dec, ZeroPageX);
    t[0xCE] = e(Op::Dec, Absolute);
    t[0xDE] = e(Op::Dec, AbsoluteX);
    t[0xE8] = e(Op::Inx, Implied);
    t[0xC8] = e(Op::Iny, Implied);
    t[0xCA] = e(Op::Dex, Implied);
    t[0x88] = e(Op::Dey, Implied);

    // Shifts / rotates
    t[0x0A] = e(Op::Asl, Accumulator);
    t[0x06] = e(Op::Asl, ZeroPage);
    t[0x16] = e(Op::Asl, ZeroPageX);
    t[0x0E] = e(Op::Asl, Absolute);
    t[0x1E] = e(Op::Asl, AbsoluteX);
    t[0x4A] = e(Op::Lsr, Accumulator);
    t[0x46] = e(Op::Lsr, ZeroPage);
    t[0x56] = e(Op::Lsr, ZeroPageX);
    t[0x4E] = e(Op::Lsr, Absolute);
    t[0x5E] = e(Op::Lsr, AbsoluteX);
    t[0x2A] = e(Op::Rol, Accumulator);
    t[0x26] = e(Op::Rol, ZeroPage);
    t[0x36] = e(Op::Rol, ZeroPageX);
    t[0x2E] = e(Op::Rol, Absolute);
    t[0x3E] = e(Op::Rol, AbsoluteX);
    t[0x6A] = e(Op::Ror, Accumulator);
    t[0x66] = e(Op::Ror, ZeroPage);
    t[0x76] = e(Op::Ror, ZeroPageX);
    t[0x6E] = e(Op::Ror, Absolute);
    t[0x7E] = e(Op::Ror, AbsoluteX);

    // Jumps / returns
    t[0x4C] = e(Op::Jmp, Absolute);
    t[0x6C] = e(Op::Jmp, Indirect);
    t[0x20] = e(Op::Jsr, Absolute);
    t[0x60] = e(Op::Rts, Implied);
    t[0x40] = e(Op::Rti, Implied);
    t[0x00] = e(Op::Brk, Implied);

    // Branches
    t[0x90] = e(Op::Bcc, Relative);
    t[0xB0] = e(Op::Bcs, Relative);
    t[0xF0] = e(Op::Beq, Relative);
    t[0x30] = e(Op::Bmi, Relative);
    t[0xD0] = e(Op::Bne, Relative);
    t[0x10] = e(Op::Bpl, Relative);
    t[0x50] = e(Op::Bvc, Relative);
    t[0x70] = e(Op::Bvs, Relative);

    // Flags
    t[0x18] = e(Op::Clc, Implied);
    t[0xD8] = e(Op::Cld, Implied);
    t[0x58] = e(Op::Cli, Implied);
    t[0xB8] = e(Op::Clv, Implied);
    t[0x38] = e(Op::Sec, Implied);
    t[0xF8] = e(Op::Sed, Implied);
    t[0x78] = e(Op::Sei, Implied);

    // NOPs, official and unofficial
    t[0xEA] = e(Op::Nop, Implied);
    t[0x1A] = e(Op::Nop, Implied);
    t[0x3A] = e(Op::Nop, Implied);
    t[0x5A] = e(Op::Nop, Implied);
    t[0x7A] = e(Op::Nop, Implied);
    t[0xDA] = e(Op::Nop, Implied);
    t[0xFA] = e(Op::Nop, Implied);
    t[0x80] = e(Op::Nop, Immediate);
    t[0x82] = e(Op::Nop, Immediate);
    t[0x89] = e(Op::Nop, Immediate);
    t[0xC2] = e(Op::Nop, Immediate);
    t[0xE2] = e(Op::Nop, Immediate);
    t[0x04] = e(Op::Nop, ZeroPage);
    t[0x44] = e(Op::Nop, ZeroPage);
    t[0x64] = e(Op::Nop, ZeroPage);
    t[0x14] = e(Op::Nop, ZeroPageX);
    t[0x34] = e(Op::Nop, ZeroPageX);
    t[0x54] = e(Op::Nop, ZeroPageX);
    t[0x74] = e(Op::Nop, ZeroPageX);
    t[0xD4] = e(Op::Nop, ZeroPageX);
    t[0xF4] = e(Op::Nop, ZeroPageX);
    t[0x0C] = e(Op::Nop, Absolute);
    t[0x1C] = e(Op::Nop, AbsoluteX);
    t[0x3C] = e(Op::Nop, AbsoluteX);
    t[0x5C] = e(Op::Nop, AbsoluteX);
    t[0x7C] = e(Op::Nop, AbsoluteX);
    t[0xDC] = e(Op::Nop, AbsoluteX);
    t[0xFC] = e(Op::Nop, AbsoluteX);

    // Stable unofficial opcodes
    t[0xA7] = e(Op::Lax, ZeroPage);
    t[0xB7] = e(Op::Lax, ZeroPageY);
    t[0xAF] = e(Op::Lax, Absolute);
    t[0xBF] = e(Op::Lax, AbsoluteY);
    t[0xA3] = e(Op::Lax, IndirectX);
    t[0xB3] = e(Op::Lax, IndirectY);
    t[0x87] = e(Op::Sax, ZeroPage);
    t[0x97] = e(Op::Sax, ZeroPageY);
    t[0x8F] = e(Op::Sax, Absolute);
    t[0x83] = e(Op::Sax, IndirectX);
    t[0xC7] = e(Op::Dcp, ZeroPage);
    t[0xD7] = e(Op::Dcp, ZeroPageX);
    t[0xCF] = e(Op::Dcp, Absolute);
    t[0xDF] = e(Op::Dcp, AbsoluteX);
    t[0xDB] = e(Op::Dcp, AbsoluteY);
    t[0xC3] = e(Op::Dcp, IndirectX);
    t[0xD3] = e(Op::Dcp, IndirectY);
    t[0xE7] = e(Op::Isc, ZeroPage);
    t[0xF7] = e(Op::Isc, ZeroPageX);
    t[0xEF] = e(Op::Isc, Absolute);
    t[0xFF] = e(Op::Isc, AbsoluteX);
    t[0xFB] = e(Op::Isc, AbsoluteY);
    t[0xE3] = e(Op::Isc, IndirectX);
    t[0xF3] = e(Op::Isc, IndirectY);
    t[0x07] = e(Op::Slo, ZeroPage);
    t[0x17] = e(Op::Slo, ZeroPageX);
    t[0x0F] = e(Op::Slo, Absolute);
    t[0x1F] = e(Op::Slo, AbsoluteX);
    t[0x1B] = e(Op::Slo, AbsoluteY);
    t[0x03] = e(Op::Slo, IndirectX);
    t[0x13] = e(Op::Slo, IndirectY);
    t[0x27] = e(Op::Rla, ZeroPage);
    t[0x37] = e(Op::Rla, ZeroPageX);
    t[0x2F] = e(Op::Rla, Absolute);
    t[0x3F] = e(Op::Rla, AbsoluteX);
    t[0x3B] = e(Op::Rla, AbsoluteY);
    t[0x23] = e(Op::Rla, IndirectX);
    t[0x33] = e(Op::Rla, IndirectY);
    t[0x47] = e(Op::Sre, ZeroPage);
    t[0x57] = e(Op::Sre, ZeroPageX);
    t[0x4F] = e(Op::Sre, Absolute);
    t[0x5F] = e(Op::Sre, AbsoluteX);
    t[0x5B] = e(Op::Sre, AbsoluteY);
    t[0x43] = e(Op::Sre, IndirectX);
    t[0x53] = e(Op::Sre, IndirectY);
    t[0x67] = e(Op::Rra, ZeroPage);
    t[0x77] = e(Op::Rra, ZeroPageX);
    t[0x6F] = e(Op::Rra, Absolute);
    t[0x7F] = e(Op::Rra, AbsoluteX);
    t[0x7B] = e(Op::Rra, AbsoluteY);
    t[0x63] = e(Op::Rra, IndirectX);
    t[0x73] = e(Op::Rra, IndirectY);
    t[0x0B] = e(Op::Anc, Immediate);
    t[0x2B] = e(Op::Anc, Immediate);
    t[0x4B] = e(Op::Alr, Immediate);
    t[0x6B] = e(Op::Arr, Immediate);
    t[0xCB] = e(Op::Axs, Immediate);
    t[0xBB] = e(Op::Las, AbsoluteY);

    t
}
