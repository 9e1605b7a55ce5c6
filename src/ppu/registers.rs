//! PPU register bitfields as plain integers with accessor methods.
//!
//! See [PPU registers](https://www.nesdev.org/wiki/PPU_registers) and
//! [PPU scrolling](https://www.nesdev.org/wiki/PPU_scrolling) for the `v`/`t` layout.

/// PPUCTRL ($2000), write-only.
///
/// ```text
/// 7  bit  0
/// V-HB SINN
/// | || |||+-- NN: base nametable (also t bits 10-11)
/// | || ||+--- I: VRAM increment (0: +1 across, 1: +32 down)
/// | || |+---- S: 8×8 sprite pattern table ($0000 / $1000)
/// | || +----- B: background pattern table ($0000 / $1000)
/// | |+------- H: sprite size (0: 8×8, 1: 8×16)
/// +---------- V: NMI at start of vblank
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Control(pub u8);

impl Control {
    pub fn nametable_select(self) -> u8 {
        self.0 & 0x03
    }

    pub fn vram_increment(self) -> u16 {
        if self.0 & 0x04 != 0 { 32 } else { 1 }
    }

    pub fn sprite_pattern_base(self) -> u16 {
        if self.0 & 0x08 != 0 { 0x1000 } else { 0x0000 }
    }

    pub fn background_pattern_base(self) -> u16 {
        if self.0 & 0x10 != 0 { 0x1000 } else { 0x0000 }
    }

    pub fn sprite_height(self) -> u16 {
        if self.0 & 0x20 != 0 { 16 } else { 8 }
    }

    pub fn nmi_enabled(self) -> bool {
        self.0 & 0x80 != 0
    }
}

/// PPUMASK ($2001), write-only. Colour emphasis bits 5-7 are stored but not rendered.
///
/// ```text
/// 7  bit  0
/// BGRs bMmG
///      |||+- grayscale
///      ||+-- show background in leftmost 8 pixels
///      |+--- show sprites in leftmost 8 pixels
///      +---- show background
///    +------ show sprites
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Mask(pub u8);

impl Mask {
    pub fn grayscale(self) -> bool {
        self.0 & 0x01 != 0
    }

    pub fn show_background_left(self) -> bool {
        self.0 & 0x02 != 0
    }

    pub fn show_sprites_left(self) -> bool {
        self.0 & 0x04 != 0
    }

    pub fn show_background(self) -> bool {
        self.0 & 0x08 != 0
    }

    pub fn show_sprites(self) -> bool {
        self.0 & 0x10 != 0
    }

    /// Either layer enabled; scroll counters only move while this holds.
    pub fn rendering_enabled(self) -> bool {
        self.0 & 0x18 != 0
    }
}

/// PPUSTATUS ($2002). Only bits 5-7 are real; the low five read back as open bus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    pub const SPRITE_OVERFLOW: u8 = 0x20;
    pub const SPRITE_ZERO_HIT: u8 = 0x40;
    pub const VBLANK: u8 = 0x80;

    pub fn vblank(self) -> bool {
        self.0 & Self::VBLANK != 0
    }

    pub fn sprite_zero_hit(self) -> bool {
        self.0 & Self::SPRITE_ZERO_HIT != 0
    }

    pub fn sprite_overflow(self) -> bool {
        self.0 & Self::SPRITE_OVERFLOW != 0
    }

    pub fn set(&mut self, bit: u8, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}

/// Internal 15-bit scroll/address register (`v` or `t`).
///
/// ```text
/// yyy NN YYYYY XXXXX
/// ||| || ||||| +++++-- coarse X (0-31)
/// ||| || +++++-------- coarse Y (0-29, 30/31 reachable by writes)
/// ||| ++-------------- nametable select
/// +++----------------- fine Y (0-7)
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Loopy(pub u16);

impl Loopy {
    const COARSE_X: u16 = 0x001F;
    const COARSE_Y: u16 = 0x03E0;
    const NAMETABLE_X: u16 = 0x0400;
    const NAMETABLE_Y: u16 = 0x0800;
    const FINE_Y: u16 = 0x7000;
    const HORIZONTAL: u16 = Self::COARSE_X | Self::NAMETABLE_X;
    const VERTICAL: u16 = Self::COARSE_Y | Self::NAMETABLE_Y | Self::FINE_Y;

    pub fn coarse_x(self) -> u16 {
        self.0 & Self::COARSE_X
    }

    pub fn set_coarse_x(&mut self, value: u8) {
        self.0 = (self.0 & !Self::COARSE_X) | (value as u16 & 0x1F);
    }

    pub fn coarse_y(self) -> u16 {
        (self.0 & Self::COARSE_Y) >> 5
    }

    pub fn set_coarse_y(&mut self, value: u8) {
        self.0 = (self.0 & !Self::COARSE_Y) | ((value as u16 & 0x1F) << 5);
    }

    pub fn nametable(self) -> u16 {
        (self.0 >> 10) & 0x03
    }

    pub fn set_nametable(&mut self, value: u8) {
        self.0 = (self.0 & !(Self::NAMETABLE_X | Self::NAMETABLE_Y)) | ((value as u16 & 0x03) << 10);
    }

    pub fn fine_y(self) -> u16 {
        (self.0 & Self::FINE_Y) >> 12
    }

    pub fn set_fine_y(&mut self, value: u8) {
        self.0 = (self.0 & !Self::FINE_Y) | ((value as u16 & 0x07) << 12);
    }

    /// Nametable byte for the tile under `v`.
    pub fn tile_address(self) -> u16 {
        0x2000 | (self.0 & 0x0FFF)
    }

    /// Attribute byte covering the 32×32 area around the tile under `v`.
    pub fn attribute_address(self) -> u16 {
        0x23C0 | (self.0 & 0x0C00) | ((self.0 >> 4) & 0x38) | ((self.0 >> 2) & 0x07)
    }

    /// Shift selecting this tile's 2-bit palette from its attribute byte.
    pub fn attribute_shift(self) -> u16 {
        ((self.coarse_y() & 0x02) << 1) | (self.coarse_x() & 0x02)
    }

    /// Next tile to the right, wrapping into the horizontally adjacent nametable.
    pub fn increment_x(&mut self) {
        if self.coarse_x() == 31 {
            self.0 &= !Self::COARSE_X;
            self.0 ^= Self::NAMETABLE_X;
        } else {
            self.0 += 1;
        }
    }

    /// Next pixel row. Coarse Y wraps at 30 into the vertically adjacent nametable; a coarse Y
    /// of 31 (attribute rows) wraps to 0 without switching.
    pub fn increment_y(&mut self) {
        if self.fine_y() < 7 {
            self.0 += 0x1000;
            return;
        }
        self.0 &= !Self::FINE_Y;
        match self.coarse_y() {
            29 => {
                self.set_coarse_y(0);
                self.0 ^= Self::NAMETABLE_Y;
            }
            31 => self.set_coarse_y(0),
            y => self.set_coarse_y(y as u8 + 1),
        }
    }

    pub fn copy_horizontal(&mut self, t: Loopy) {
        self.0 = (self.0 & !Self::HORIZONTAL) | (t.0 & Self::HORIZONTAL);
    }

    pub fn copy_vertical(&mut self, t: Loopy) {
        self.0 = (self.0 & !Self::VERTICAL) | (t.0 & Self::VERTICAL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coarse_x_wraps_into_next_nametable() {
        let mut v = Loopy(0);
        v.set_coarse_x(31);
        v.increment_x();
        assert_eq!(v.coarse_x(), 0);
        assert_eq!(v.nametable(), 1);
        v.set_coarse_x(31);
        v.increment_x();
        assert_eq!(v.nametable(), 0);
    }

    #[test]
    fn coarse_y_wraps_at_thirty() {
        let mut v = Loopy(0);
        v.set_fine_y(7);
        v.set_coarse_y(29);
        v.increment_y();
        assert_eq!((v.fine_y(), v.coarse_y(), v.nametable()), (0, 0, 2));
    }

    #[test]
    fn coarse_y_31_wraps_without_switching() {
        let mut v = Loopy(0);
        v.set_fine_y(7);
        v.set_coarse_y(31);
        v.increment_y();
        assert_eq!((v.coarse_y(), v.nametable()), (0, 0));
    }

    #[test]
    fn fine_y_carries_into_coarse_y() {
        let mut v = Loopy(0);
        for _ in 0..8 {
            v.increment_y();
        }
        assert_eq!((v.fine_y(), v.coarse_y()), (0, 1));
    }

    #[test]
    fn attribute_address_and_shift() {
        let mut v = Loopy(0);
        v.set_nametable(1);
        v.set_coarse_x(6);
        v.set_coarse_y(10);
        assert_eq!(v.tile_address(), 0x2400 + 10 * 32 + 6);
        assert_eq!(v.attribute_address(), 0x27C0 + (10 / 4) * 8 + 6 / 4);
        // Odd 16×16 quadrant both ways: bottom-right.
        assert_eq!(v.attribute_shift(), 6);
    }

    #[test]
    fn copies_only_their_bits() {
        let mut v = Loopy(0);
        let t = Loopy(0x7FFF);
        v.copy_horizontal(t);
        assert_eq!(v.0, 0x041F);
        v.copy_vertical(t);
        assert_eq!(v.0, 0x7FFF);
    }

    #[test]
    fn control_fields() {
        let c = Control(0b1011_0110);
        assert_eq!(c.nametable_select(), 2);
        assert_eq!(c.vram_increment(), 32);
        assert_eq!(c.sprite_pattern_base(), 0);
        assert_eq!(c.background_pattern_base(), 0x1000);
        assert_eq!(c.sprite_height(), 16);
        assert!(c.nmi_enabled());
    }
}
