//! NES PPU (2C02) stepped one dot per `tick`.
//!
//! Visible lines draw one pixel per dot from the loopy `v` register plus a running fine-X
//! counter; sprites for the next line are evaluated at dot 257 into an 8-slot buffer. Vblank
//! starts at 241/1 and raises NMI through an [`NmiLine`]. Registers $2000–$2007 are exposed as a
//! [`BusDevice`] mirrored across $2000–$3FFF by the memory map.

use crate::{
    bus::{BusDevice, BusError},
    config::{DOTS_PER_SCANLINE, SCANLINES_PER_FRAME},
    ppu::{
        memory::PpuMemory,
        palette,
        registers::{Control, Loopy, Mask, Status},
    },
};

pub const SCREEN_WIDTH: usize = 256;
pub const SCREEN_HEIGHT: usize = 240;

/// OAM: 64 sprites × 4 bytes (Y, tile, attributes, X).
pub const OAM_LEN: usize = 256;

const PRE_RENDER_LINE: u16 = SCANLINES_PER_FRAME - 1;
const VBLANK_LINE: u16 = 241;

/// The PPU's wire back into the CPU. Entry must finish before `raise_nmi` returns.
pub trait NmiLine {
    type Error;

    fn raise_nmi(&mut self) -> Result<(), Self::Error>;
}

/// A sprite picked for the next scanline, with its pattern row already fetched.
#[derive(Debug, Clone, Copy, Default)]
struct SpriteSlot {
    oam_index: u8,
    x: u8,
    attributes: u8,
    pattern_lo: u8,
    pattern_hi: u8,
}

impl SpriteSlot {
    /// 2-bit colour at screen column `x`, if the sprite covers it.
    fn pixel_at(&self, x: u16) -> Option<u8> {
        let column = x.checked_sub(self.x as u16)?;
        if column >= 8 {
            return None;
        }
        let bit = if self.attributes & 0x40 != 0 {
            column
        } else {
            7 - column
        };
        Some((((self.pattern_hi >> bit) & 1) << 1) | ((self.pattern_lo >> bit) & 1))
    }
}

pub struct Ppu {
    memory: PpuMemory,
    oam: [u8; OAM_LEN],
    oam_addr: u8,
    secondary: [SpriteSlot; 8],
    sprite_count: usize,

    control: Control,
    mask: Mask,
    status: Status,

    /// Current VRAM address / scroll position.
    v: Loopy,
    /// Temporary address; top-left of the screen.
    t: Loopy,
    fine_x: u8,
    /// Write toggle shared by $2005 and $2006.
    w: bool,
    /// Fine X within the tile being drawn; reloaded from `fine_x` at dot 257.
    fine_x_counter: u8,
    /// PPUDATA read buffer.
    data_buffer: u8,
    /// Last value driven onto the register bus.
    latch: u8,

    dot: u16,
    scanline: u16,
    frame_count: u64,

    /// System palette indices, row-major.
    frame: Vec<u8>,
    /// `frame` converted to 0xRRGGBB at the end of each visible frame.
    framebuffer: Vec<u32>,
    frame_ready: bool,
}

impl Ppu {
    pub fn new(memory: PpuMemory) -> Self {
        Ppu {
            memory,
            oam: [0; OAM_LEN],
            oam_addr: 0,
            secondary: [SpriteSlot::default(); 8],
            sprite_count: 0,
            control: Control::default(),
            mask: Mask::default(),
            status: Status::default(),
            v: Loopy::default(),
            t: Loopy::default(),
            fine_x: 0,
            w: false,
            fine_x_counter: 0,
            data_buffer: 0,
            latch: 0,
            dot: 0,
            scanline: 0,
            frame_count: 0,
            frame: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            framebuffer: vec![0; SCREEN_WIDTH * SCREEN_HEIGHT],
            frame_ready: false,
        }
    }

    /// Advance one dot, then perform that dot's work.
    pub fn tick<L: NmiLine>(&mut self, line: &mut L) -> Result<(), L::Error> {
        self.dot += 1;
        if self.dot == DOTS_PER_SCANLINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline == SCANLINES_PER_FRAME {
                self.scanline = 0;
                self.frame_count += 1;
            }
        }

        let rendering = self.mask.rendering_enabled();
        match self.scanline {
            0..=239 => {
                if self.dot < SCREEN_WIDTH as u16 {
                    self.render_pixel();
                }
                if rendering {
                    match self.dot {
                        256 => self.v.increment_y(),
                        257 => {
                            self.reload_horizontal();
                            self.evaluate_sprites();
                        }
                        _ => {}
                    }
                }
            }
            240 if self.dot == 0 => self.finish_frame(),
            VBLANK_LINE if self.dot == 1 => {
                self.status.set(Status::VBLANK, true);
                if self.control.nmi_enabled() {
                    line.raise_nmi()?;
                }
            }
            PRE_RENDER_LINE => {
                if self.dot == 1 {
                    self.status.set(Status::VBLANK, false);
                    self.status.set(Status::SPRITE_ZERO_HIT, false);
                    self.status.set(Status::SPRITE_OVERFLOW, false);
                    self.sprite_count = 0;
                }
                if rendering {
                    match self.dot {
                        257 => self.reload_horizontal(),
                        280..=304 => self.v.copy_vertical(self.t),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn reload_horizontal(&mut self) {
        self.v.copy_horizontal(self.t);
        self.fine_x_counter = self.fine_x;
    }

    /// 2-bit background colour and its palette select at the current `v` / fine X.
    fn background_pixel(&self) -> (u8, u8) {
        let tile = self.memory.read(self.v.tile_address()) as u16;
        let attribute = self.memory.read(self.v.attribute_address());
        let palette = (attribute >> self.v.attribute_shift()) & 0x03;

        let row = self.control.background_pattern_base() + tile * 16 + self.v.fine_y();
        let lo = self.memory.read(row);
        let hi = self.memory.read(row + 8);
        let bit = 7 - self.fine_x_counter;
        let pixel = (((hi >> bit) & 1) << 1) | ((lo >> bit) & 1);
        (pixel, palette)
    }

    fn render_pixel(&mut self) {
        let x = self.dot;
        let y = self.scanline as usize;

        let mut background = (0, 0);
        if self.mask.show_background() && (x >= 8 || self.mask.show_background_left()) {
            background = self.background_pixel();
        }

        // First opaque sprite in OAM order wins.
        let mut sprite = None;
        if self.mask.show_sprites() && (x >= 8 || self.mask.show_sprites_left()) {
            sprite = self.secondary[..self.sprite_count]
                .iter()
                .find_map(|slot| match slot.pixel_at(x) {
                    Some(pixel) if pixel != 0 => Some((pixel, *slot)),
                    _ => None,
                });
        }

        let (bg_pixel, bg_palette) = background;
        let entry = match sprite {
            Some((pixel, slot)) => {
                if slot.oam_index == 0 && bg_pixel != 0 && x != 255 {
                    self.status.set(Status::SPRITE_ZERO_HIT, true);
                }
                let behind = slot.attributes & 0x20 != 0;
                if behind && bg_pixel != 0 {
                    (bg_palette << 2) | bg_pixel
                } else {
                    0x10 | ((slot.attributes & 0x03) << 2) | pixel
                }
            }
            None if bg_pixel != 0 => (bg_palette << 2) | bg_pixel,
            None => 0,
        };

        let mut index = self.memory.read(0x3F00 + entry as u16) & 0x3F;
        if self.mask.grayscale() {
            index &= 0x30;
        }
        self.frame[y * SCREEN_WIDTH + x as usize] = index;

        if self.mask.rendering_enabled() {
            self.fine_x_counter += 1;
            if self.fine_x_counter == 8 {
                self.fine_x_counter = 0;
                self.v.increment_x();
            }
        }
    }

    /// Pick up to eight sprites whose rows cover this line; they draw on the next one
    /// (OAM Y is one less than the sprite's first visible line).
    fn evaluate_sprites(&mut self) {
        let height = self.control.sprite_height();
        let line = self.scanline;
        self.sprite_count = 0;

        for (index, entry) in self.oam.chunks_exact(4).enumerate() {
            let row = line.wrapping_sub(entry[0] as u16);
            if row >= height {
                continue;
            }
            if self.sprite_count == self.secondary.len() {
                self.status.set(Status::SPRITE_OVERFLOW, true);
                break;
            }

            let (tile, attributes, x) = (entry[1] as u16, entry[2], entry[3]);
            let row = if attributes & 0x80 != 0 {
                height - 1 - row
            } else {
                row
            };
            let address = if height == 16 {
                let table = (tile & 1) * 0x1000;
                let tile = (tile & 0xFE) + (row >> 3);
                table + tile * 16 + (row & 7)
            } else {
                self.control.sprite_pattern_base() + tile * 16 + row
            };

            self.secondary[self.sprite_count] = SpriteSlot {
                oam_index: index as u8,
                x,
                attributes,
                pattern_lo: self.memory.read(address),
                pattern_hi: self.memory.read(address + 8),
            };
            self.sprite_count += 1;
        }
    }

    fn finish_frame(&mut self) {
        palette::to_rgb(&self.frame, &mut self.framebuffer);
        self.frame_ready = true;
        tracing::trace!("frame {} complete", self.frame_count);
    }

    /// (scanline, dot)
    pub fn position(&self) -> (u16, u16) {
        (self.scanline, self.dot)
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn frame_ready(&self) -> bool {
        self.frame_ready
    }

    pub fn clear_frame_ready(&mut self) {
        self.frame_ready = false;
    }

    /// Last completed frame as 0xRRGGBB.
    pub fn framebuffer(&self) -> &[u32] {
        &self.framebuffer
    }

    /// Frame being drawn, as system palette indices.
    pub fn frame_indices(&self) -> &[u8] {
        &self.frame
    }

    pub fn oam(&self) -> &[u8; OAM_LEN] {
        &self.oam
    }

    pub fn control(&self) -> Control {
        self.control
    }

    pub fn mask(&self) -> Mask {
        self.mask
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// `v` as the CPU last left it (or as rendering moved it).
    pub fn vram_address(&self) -> u16 {
        self.v.0
    }

    /// Side-effect-free look into PPU memory.
    pub fn peek(&self, addr: u16) -> u8 {
        self.memory.read(addr)
    }

    pub fn memory(&self) -> &PpuMemory {
        &self.memory
    }

    fn read_data(&mut self) -> u8 {
        let addr = self.v.0 & 0x3FFF;
        let result = if addr >= 0x3F00 {
            // Palette reads bypass the buffer; the buffer picks up the nametable underneath.
            self.data_buffer = self.memory.read(addr - 0x1000);
            self.memory.read(addr)
        } else {
            let buffered = self.data_buffer;
            self.data_buffer = self.memory.read(addr);
            buffered
        };
        self.advance_vram_address();
        result
    }

    fn write_data(&mut self, data: u8) {
        self.memory.write(self.v.0 & 0x3FFF, data);
        self.advance_vram_address();
    }

    fn advance_vram_address(&mut self) {
        self.v.0 = self.v.0.wrapping_add(self.control.vram_increment()) & 0x7FFF;
    }
}

/// CPU-facing register port. Addresses are relative to $2000; the map mounts one copy per 8 bytes.
impl BusDevice for Ppu {
    fn read(&mut self, addr: u16) -> Result<u8, BusError> {
        let data = match addr {
            // PPUSTATUS
            2 => {
                let data = (self.status.0 & 0xE0) | (self.latch & 0x1F);
                self.status.set(Status::VBLANK, false);
                self.w = false;
                data
            }
            // OAMDATA
            4 => self.oam[self.oam_addr as usize],
            // PPUDATA
            7 => self.read_data(),
            // Write-only registers read back the bus latch.
            0 | 1 | 3 | 5 | 6 => self.latch,
            _ => return Err(BusError::OutOfBounds { address: addr }),
        };
        self.latch = data;
        Ok(data)
    }

    fn write(&mut self, addr: u16, data: u8) -> Result<(), BusError> {
        if addr > 7 {
            return Err(BusError::OutOfBounds { address: addr });
        }
        self.latch = data;
        match addr {
            // PPUCTRL
            0 => {
                self.control = Control(data);
                self.t.set_nametable(data);
            }
            // PPUMASK
            1 => self.mask = Mask(data),
            2 => tracing::warn!("write to read-only PPUSTATUS: ${:02X}", data),
            // OAMADDR
            3 => self.oam_addr = data,
            // OAMDATA
            4 => {
                self.oam[self.oam_addr as usize] = data;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            // PPUSCROLL
            5 => {
                if !self.w {
                    self.t.set_coarse_x(data >> 3);
                    self.fine_x = data & 0x07;
                } else {
                    self.t.set_fine_y(data & 0x07);
                    self.t.set_coarse_y(data >> 3);
                }
                self.w = !self.w;
            }
            // PPUADDR
            6 => {
                if !self.w {
                    self.t.0 = (self.t.0 & 0x00FF) | (((data & 0x3F) as u16) << 8);
                } else {
                    self.t.0 = (self.t.0 & 0xFF00) | data as u16;
                    self.v = self.t;
                }
                self.w = !self.w;
            }
            // PPUDATA
            _ => self.write_data(data),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::cartridge::Mirroring;

    /// Counts NMI pulses instead of running a CPU.
    #[derive(Default)]
    struct Pulses(u32);

    impl NmiLine for Pulses {
        type Error = std::convert::Infallible;

        fn raise_nmi(&mut self) -> Result<(), Self::Error> {
            self.0 += 1;
            Ok(())
        }
    }

    fn ppu() -> Ppu {
        Ppu::new(PpuMemory::new(&[], Mirroring::Horizontal, true))
    }

    fn run(ppu: &mut Ppu, line: &mut Pulses, dots: u32) {
        for _ in 0..dots {
            ppu.tick(line).unwrap();
        }
    }

    fn set_address(ppu: &mut Ppu, addr: u16) {
        ppu.write(6, (addr >> 8) as u8).unwrap();
        ppu.write(6, addr as u8).unwrap();
    }

    fn fill(ppu: &mut Ppu, addr: u16, bytes: &[u8]) {
        set_address(ppu, addr);
        for &b in bytes {
            ppu.write(7, b).unwrap();
        }
    }

    #[test]
    fn full_frame_returns_to_origin() {
        let mut ppu = ppu();
        let mut line = Pulses::default();
        run(&mut ppu, &mut line, 341 * 262);
        assert_eq!(ppu.position(), (0, 0));
        assert_eq!(ppu.frame_count(), 1);
    }

    #[test]
    fn vblank_set_at_241_and_cleared_at_pre_render() {
        let mut ppu = ppu();
        let mut line = Pulses::default();

        run(&mut ppu, &mut line, 241 * 341);
        assert_eq!(ppu.position(), (241, 0));
        assert!(!ppu.status().vblank());
        run(&mut ppu, &mut line, 1);
        assert_eq!(ppu.position(), (241, 1));
        assert!(ppu.status().vblank());

        run(&mut ppu, &mut line, 20 * 341 - 1);
        assert_eq!(ppu.position(), (261, 0));
        assert!(ppu.status().vblank());
        run(&mut ppu, &mut line, 1);
        assert_eq!(ppu.position(), (261, 1));
        assert!(!ppu.status().vblank());
        assert_eq!(line.0, 0);
    }

    #[test]
    fn nmi_raised_only_when_enabled() {
        let mut ppu = ppu();
        let mut line = Pulses::default();
        ppu.write(0, 0x80).unwrap();
        run(&mut ppu, &mut line, 341 * 262 * 2);
        assert_eq!(line.0, 2);
    }

    #[test]
    fn frame_ready_at_line_240() {
        let mut ppu = ppu();
        let mut line = Pulses::default();
        run(&mut ppu, &mut line, 240 * 341 - 1);
        assert!(!ppu.frame_ready());
        run(&mut ppu, &mut line, 1);
        assert!(ppu.frame_ready());
        ppu.clear_frame_ready();
        assert!(!ppu.frame_ready());
    }

    #[test]
    fn status_read_clears_vblank_and_toggle() {
        let mut ppu = ppu();
        ppu.status.set(Status::VBLANK, true);
        ppu.write(6, 0x21).unwrap(); // first PPUADDR write sets w
        let status = ppu.read(2).unwrap();
        assert_eq!(status & 0x80, 0x80);
        assert!(!ppu.status().vblank());
        assert!(!ppu.w);
        // Low bits come from the bus latch (the last write).
        assert_eq!(status & 0x1F, 0x21 & 0x1F);
    }

    #[test]
    fn data_reads_are_buffered_except_palette() {
        let mut ppu = ppu();
        fill(&mut ppu, 0x2000, &[0x11, 0x22]);
        fill(&mut ppu, 0x3F00, &[0x0F, 0x30]);

        set_address(&mut ppu, 0x2000);
        let _stale = ppu.read(7).unwrap();
        assert_eq!(ppu.read(7).unwrap(), 0x11);
        assert_eq!(ppu.read(7).unwrap(), 0x22);

        set_address(&mut ppu, 0x3F01);
        assert_eq!(ppu.read(7).unwrap(), 0x30);
    }

    #[test]
    fn increment_32_walks_down() {
        let mut ppu = ppu();
        ppu.write(0, 0x04).unwrap();
        set_address(&mut ppu, 0x2000);
        ppu.write(7, 1).unwrap();
        ppu.write(7, 2).unwrap();
        assert_eq!(ppu.peek(0x2000), 1);
        assert_eq!(ppu.peek(0x2020), 2);
        assert_eq!(ppu.vram_address(), 0x2040);
    }

    #[test]
    fn scroll_writes_fill_t_and_fine_x() {
        let mut ppu = ppu();
        ppu.write(0, 0x03).unwrap();
        ppu.write(5, 0x7D).unwrap(); // X = 125: coarse 15, fine 5
        ppu.write(5, 0x5E).unwrap(); // Y = 94: coarse 11, fine 6
        assert_eq!(ppu.t.coarse_x(), 15);
        assert_eq!(ppu.fine_x, 5);
        assert_eq!(ppu.t.coarse_y(), 11);
        assert_eq!(ppu.t.fine_y(), 6);
        assert_eq!(ppu.t.nametable(), 3);
    }

    #[test]
    fn scroll_and_address_writes_share_one_toggle() {
        let mut ppu = ppu();

        // PPUSCROLL first, PPUADDR second: the address write is the low byte and copies t to v.
        ppu.write(5, 0x7D).unwrap();
        assert!(ppu.w);
        ppu.write(6, 0x05).unwrap();
        assert!(!ppu.w);
        assert_eq!(ppu.t.0, 0x0005);
        assert_eq!(ppu.vram_address(), 0x0005);
        assert_eq!(ppu.fine_x, 5);

        // PPUADDR first, PPUSCROLL second: the scroll write sets Y and leaves v alone.
        ppu.write(6, 0x21).unwrap();
        assert!(ppu.w);
        ppu.write(5, 0x5E).unwrap();
        assert!(!ppu.w);
        assert_eq!(ppu.t.fine_y(), 6);
        assert_eq!(ppu.t.coarse_y(), 11);
        // High byte $21 with the earlier low byte $05, then Y replaced.
        assert_eq!(ppu.t.0, 0x6165);
        assert_eq!(ppu.vram_address(), 0x0005);

        // The pair is complete, so the next PPUADDR write is a high byte again.
        ppu.write(6, 0x3F).unwrap();
        assert!(ppu.w);
        assert_eq!(ppu.vram_address(), 0x0005);
    }

    #[test]
    fn oam_data_writes_advance_address() {
        let mut ppu = ppu();
        ppu.write(3, 0xFE).unwrap();
        ppu.write(4, 0xAA).unwrap();
        ppu.write(4, 0xBB).unwrap();
        assert_eq!(ppu.oam()[0xFE], 0xAA);
        assert_eq!(ppu.oam()[0xFF], 0xBB);
        ppu.write(3, 0xFE).unwrap();
        assert_eq!(ppu.read(4).unwrap(), 0xAA);
    }

    #[test]
    fn register_port_is_eight_bytes() {
        let mut ppu = ppu();
        assert_eq!(ppu.read(8), Err(BusError::OutOfBounds { address: 8 }));
        assert_eq!(ppu.write(8, 0), Err(BusError::OutOfBounds { address: 8 }));
    }

    #[test]
    fn background_tile_draws_expected_palette_indices() {
        let mut ppu = ppu();
        let mut line = Pulses::default();

        // Tile 1, row 0: plane 0 = 0b1010_0101, plane 1 = 0b1100_0011.
        fill(&mut ppu, 0x0010, &[0xA5]);
        fill(&mut ppu, 0x0018, &[0xC3]);
        // Nametable 0 (0,0) = tile 1; attribute: top-left quadrant palette 2.
        fill(&mut ppu, 0x2000, &[0x01]);
        fill(&mut ppu, 0x23C0, &[0x02]);
        // Palette 2: colours 1..3.
        fill(&mut ppu, 0x3F00, &[0x0F]);
        fill(&mut ppu, 0x3F09, &[0x16, 0x27, 0x38]);

        set_address(&mut ppu, 0x0000);
        ppu.write(1, 0x0A).unwrap(); // background on, left column on

        // Pre-render reload then line 0.
        run(&mut ppu, &mut line, 341 * 262 + 8);

        let expected = [0x38, 0x27, 0x16, 0x0F, 0x0F, 0x16, 0x27, 0x38];
        assert_eq!(&ppu.frame_indices()[..8], &expected);
        assert_eq!(ppu.frame_indices()[8], 0x0F);
    }

    #[test]
    fn pre_render_copies_scroll_into_v() {
        let mut ppu = ppu();
        let mut line = Pulses::default();

        // Solid tile 1 at nametable column 1, row 2.
        fill(&mut ppu, 0x0010, &[0xFF; 8]);
        fill(&mut ppu, 0x2000 + 2 * 32 + 1, &[0x01]);
        fill(&mut ppu, 0x3F00, &[0x0F, 0x21]);

        // X = 11: coarse 1, fine 3. Y = 21: coarse 2, fine 5.
        ppu.write(0, 0x00).unwrap();
        ppu.write(5, 11).unwrap();
        ppu.write(5, 21).unwrap();
        ppu.write(1, 0x0A).unwrap();

        // Line 0 of the second frame starts from the copies made on pre-render
        // (vertical at 280..=304, horizontal at 257).
        run(&mut ppu, &mut line, 341 * 262 + 341 * 4);
        assert_eq!(ppu.position(), (4, 0));

        let indices = ppu.frame_indices();
        // Tile rows 5..=7 cover lines 0..=2; its columns 3..=7 cover x 0..=4.
        let tile_rows = [0x21, 0x21, 0x21, 0x21, 0x21, 0x0F, 0x0F, 0x0F];
        for y in 0..3 {
            assert_eq!(&indices[y * 256..y * 256 + 8], &tile_rows, "line {y}");
        }
        // Line 3 is nametable row 3, which is empty.
        assert!(indices[3 * 256..4 * 256].iter().all(|&i| i == 0x0F));
    }

    #[test]
    fn opaque_sprite_zero_over_background_sets_hit() {
        let mut ppu = ppu();
        let mut line = Pulses::default();

        // Solid tile 1 for both layers.
        fill(&mut ppu, 0x0010, &[0xFF; 8]);
        fill(&mut ppu, 0x2000, &[0x01; 64]);
        fill(&mut ppu, 0x3F00, &[0x0F, 0x01]);
        fill(&mut ppu, 0x3F11, &[0x25]);
        // Sprite 0 at Y=9 (visible from line 10), tile 1, X=20.
        ppu.write(3, 0).unwrap();
        for b in [9, 1, 0, 20] {
            ppu.write(4, b).unwrap();
        }
        set_address(&mut ppu, 0x0000);
        ppu.write(1, 0x1E).unwrap();

        // The first frame also hits; pre-render clears it.
        run(&mut ppu, &mut line, 341 * 262 + 341 * 10 + 19);
        assert_eq!(ppu.position(), (10, 19));
        assert!(!ppu.status().sprite_zero_hit());
        run(&mut ppu, &mut line, 1);
        assert!(ppu.status().sprite_zero_hit());
        assert_eq!(ppu.frame_indices()[10 * 256 + 20], 0x25);
        assert_eq!(ppu.frame_indices()[10 * 256 + 19], 0x01);
    }

    #[test]
    fn ninth_sprite_on_a_line_sets_overflow() {
        let mut ppu = ppu();
        let mut line = Pulses::default();
        ppu.write(3, 0).unwrap();
        for i in 0..9u8 {
            for b in [30, 0, 0, i * 10] {
                ppu.write(4, b).unwrap();
            }
        }
        for _ in 9..64 {
            for b in [0xF0, 0, 0, 0] {
                ppu.write(4, b).unwrap();
            }
        }
        ppu.write(1, 0x10).unwrap();

        run(&mut ppu, &mut line, 341 * 262 + 341 * 30 + 257);
        assert!(ppu.status().sprite_overflow());
        assert_eq!(ppu.sprite_count, 8);
    }
}
