//! CPU status register (P) flags.
//!
//! ```text
//! 7  6  5  4  3  2  1  0
//! N  V  U  B  D  I  Z  C
//! ```
//!
//! B and U do not exist as physical storage; they only appear in the byte
//! pushed to the stack (B = 1 for PHP/BRK, 0 for IRQ/NMI, U always 1).

use bitflags::bitflags;

bitflags! {
    /// 6502 processor status flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status: u8 {
        /// Carry.
        const C = 1 << 0;
        /// Zero.
        const Z = 1 << 1;
        /// Interrupt disable. Masks IRQ, never NMI.
        const I = 1 << 2;
        /// Decimal mode. Stored but ignored by the 2A03 ALU.
        const D = 1 << 3;
        /// Break. Only meaningful in pushed copies of the register.
        const B = 1 << 4;
        /// Unused. Always 1 in pushed copies of the register.
        const U = 1 << 5;
        /// Overflow.
        const V = 1 << 6;
        /// Negative.
        const N = 1 << 7;
    }
}

impl Status {
    /// Register value after power-on: I and U set.
    pub const POWER_ON: Self = Self::I.union(Self::U);

    /// Update Z and N from a result byte.
    #[inline]
    pub fn set_zn(&mut self, value: u8) {
        self.set(Self::Z, value == 0);
        self.set(Self::N, value & 0x80 != 0);
    }

    /// Byte as pushed to the stack. U is forced on; B depends on the
    /// push source (true for PHP/BRK, false for IRQ/NMI).
    #[inline]
    #[must_use]
    pub const fn pushed(self, brk: bool) -> u8 {
        let mut bits = self.bits() | Self::U.bits();
        if brk {
            bits |= Self::B.bits();
        }
        bits
    }

    /// Register restored from a stack byte (PLP/RTI). B is discarded,
    /// U forced on.
    #[inline]
    #[must_use]
    pub fn pulled(value: u8) -> Self {
        Self::from_bits_truncate((value & !Self::B.bits()) | Self::U.bits())
    }
}
