//! The CPU-visible PPU control, mask, and status registers.

use bitflags::bitflags;

bitflags! {
    /// PPUCTRL ($2000).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuCtrl: u8 {
        /// Base nametable select, low bit.
        const NAMETABLE_LO = 1 << 0;
        /// Base nametable select, high bit.
        const NAMETABLE_HI = 1 << 1;
        /// VRAM address increment: 0 = +1 (across), 1 = +32 (down).
        const VRAM_INCREMENT = 1 << 2;
        /// Sprite pattern table for 8x8 sprites: $0000 or $1000.
        const SPRITE_TABLE = 1 << 3;
        /// Background pattern table: $0000 or $1000.
        const BACKGROUND_TABLE = 1 << 4;
        /// Sprite size: 8x8 or 8x16.
        const SPRITE_SIZE = 1 << 5;
        /// EXT pin direction (unused on a stock console).
        const MASTER_SLAVE = 1 << 6;
        /// Generate NMI at the start of vertical blank.
        const NMI_ENABLE = 1 << 7;
    }
}

impl PpuCtrl {
    /// PPUDATA address increment.
    #[must_use]
    pub fn vram_increment(self) -> u16 {
        if self.contains(Self::VRAM_INCREMENT) { 32 } else { 1 }
    }

    /// Pattern table base for 8x8 sprites.
    #[must_use]
    pub fn sprite_table(self) -> u16 {
        if self.contains(Self::SPRITE_TABLE) { 0x1000 } else { 0x0000 }
    }

    /// Pattern table base for background tiles.
    #[must_use]
    pub fn background_table(self) -> u16 {
        if self.contains(Self::BACKGROUND_TABLE) { 0x1000 } else { 0x0000 }
    }

    /// Sprite height in scanlines (8 or 16).
    #[must_use]
    pub fn sprite_height(self) -> u16 {
        if self.contains(Self::SPRITE_SIZE) { 16 } else { 8 }
    }

    /// Whether vblank raises /NMI.
    #[must_use]
    pub fn nmi_enabled(self) -> bool {
        self.contains(Self::NMI_ENABLE)
    }
}

bitflags! {
    /// PPUMASK ($2001).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuMask: u8 {
        /// Grayscale: palette indices are masked to the gray column.
        const GRAYSCALE = 1 << 0;
        /// Show background in the leftmost 8 pixels.
        const BACKGROUND_LEFT = 1 << 1;
        /// Show sprites in the leftmost 8 pixels.
        const SPRITES_LEFT = 1 << 2;
        /// Enable background rendering.
        const BACKGROUND = 1 << 3;
        /// Enable sprite rendering.
        const SPRITES = 1 << 4;
        /// Emphasize red.
        const EMPHASIZE_RED = 1 << 5;
        /// Emphasize green.
        const EMPHASIZE_GREEN = 1 << 6;
        /// Emphasize blue.
        const EMPHASIZE_BLUE = 1 << 7;
    }
}

impl PpuMask {
    /// True when the background or sprite pipeline is on. This gates
    /// scroll updates, sprite evaluation, and the odd-frame dot skip.
    #[must_use]
    pub fn rendering_enabled(self) -> bool {
        self.intersects(Self::BACKGROUND | Self::SPRITES)
    }
}

bitflags! {
    /// PPUSTATUS ($2002). Only the top three bits are driven; the low
    /// five read back as CPU open bus.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PpuStatus: u8 {
        /// More than eight sprites were found on a scanline.
        const SPRITE_OVERFLOW = 1 << 5;
        /// Sprite 0 opaque pixel overlapped an opaque background pixel.
        const SPRITE_ZERO_HIT = 1 << 6;
        /// Currently in vertical blank.
        const VBLANK = 1 << 7;
    }
}
