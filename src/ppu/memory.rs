//! PPU address space ($0000–$3FFF) backed by 16 KiB.
//!
//! - $0000–$1FFF: pattern tables (cartridge CHR, copied in)
//! - $2000–$2FFF: nametables, folded onto two physical 1 KiB pages per [`Mirroring`];
//!   $3000–$3EFF mirrors them
//! - $3F00–$3F1F: palette RAM, mirrored up to $3FFF; $3F10/$14/$18/$1C alias $3F00/$04/$08/$0C
//!
//! See [PPU memory map](https://www.nesdev.org/wiki/PPU_memory_map).

use crate::cartridge::cartridge::Mirroring;

pub const PPU_MEMORY_SIZE: usize = 0x4000;

pub struct PpuMemory {
    data: Vec<u8>,
    mirroring: Mirroring,
    /// Boards without CHR ROM carry 8 KiB of CHR RAM instead.
    chr_writable: bool,
}

impl PpuMemory {
    /// `chr` beyond 8 KiB is ignored (no bank switching).
    pub fn new(chr: &[u8], mirroring: Mirroring, chr_writable: bool) -> Self {
        let mut data = vec![0; PPU_MEMORY_SIZE];
        let len = chr.len().min(0x2000);
        data[..len].copy_from_slice(&chr[..len]);
        PpuMemory {
            data,
            mirroring,
            chr_writable,
        }
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    pub fn read(&self, addr: u16) -> u8 {
        self.data[Self::index(addr, self.mirroring)]
    }

    pub fn write(&mut self, addr: u16, data: u8) {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF if !self.chr_writable => {
                tracing::trace!("ignored CHR ROM write ${:04X} <- ${:02X}", addr, data);
            }
            0x3F00..=0x3FFF => self.data[Self::index(addr, self.mirroring)] = data & 0x3F,
            _ => self.data[Self::index(addr, self.mirroring)] = data,
        }
    }

    /// Physical offset of a PPU address.
    fn index(addr: u16, mirroring: Mirroring) -> usize {
        let addr = addr & 0x3FFF;
        match addr {
            0x0000..=0x1FFF => addr as usize,
            0x2000..=0x3EFF => {
                let relative = (addr - 0x2000) & 0x0FFF;
                let table = relative / 0x400;
                let offset = relative & 0x3FF;
                let page = match mirroring {
                    Mirroring::Vertical => table & 1,
                    Mirroring::Horizontal => table >> 1,
                };
                0x2000 + (page * 0x400 + offset) as usize
            }
            _ => {
                let mut entry = addr & 0x1F;
                if entry & 0x13 == 0x10 {
                    entry &= !0x10;
                }
                0x3F00 + entry as usize
            }
        }
    }
}
