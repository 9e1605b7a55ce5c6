//! NES cartridge loading from iNES format (.nes files).
//!
//! Implements the [iNES](https://www.nesdev.org/wiki/INES) format: 16-byte header (magic "NES\x1A",
//! PRG size in 16 KiB units, CHR size in 8 KiB units, flags 6–7 for mirroring, trainer and mapper),
//! an optional 512-byte trainer, then PRG ROM, then CHR ROM.

use std::{fs, path::Path};

use thiserror::Error;

pub const HEADER_SIZE: usize = 16;
pub const TRAINER_SIZE: usize = 512;
pub const PRG_BANK_SIZE: usize = 16 * 1024;
pub const CHR_BANK_SIZE: usize = 8 * 1024;

const MAGIC: [u8; 4] = [b'N', b'E', b'S', 0x1A];

/// Nametable mirroring mode for the PPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mirroring {
    /// $2000 = $2400, $2800 = $2C00 (vertical scrolling games).
    Horizontal,
    /// $2000 = $2800, $2400 = $2C00 (horizontal scrolling games).
    Vertical,
}

#[derive(Debug, Error)]
pub enum CartridgeError {
    #[error("failed to read ROM: {0}")]
    Io(#[from] std::io::Error),
    #[error("not an iNES file (bad magic)")]
    BadMagic,
    #[error("ROM truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("unsupported mapper {0} (only NROM is supported)")]
    UnsupportedMapper(u8),
}

/// PRG and CHR as the CPU and PPU see them on an NROM board.
#[derive(Debug, Clone)]
pub struct Cartridge {
    pub prg: Vec<u8>,
    /// Pattern tables. 8 KiB of zeroed CHR RAM when the header declares no CHR ROM.
    pub chr: Vec<u8>,
    pub chr_ram: bool,
    pub mirroring: Mirroring,
}

impl Cartridge {
    /// Read and parse an iNES file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CartridgeError> {
        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Parse an in-memory iNES image. Header bytes 4–5 = PRG/CHR size; byte 6 bit 0 = mirroring,
    /// bit 2 = trainer, bit 3 = four-screen; mapper = high nibbles of bytes 6 and 7.
    pub fn from_bytes(data: &[u8]) -> Result<Self, CartridgeError> {
        if data.len() < HEADER_SIZE {
            return Err(CartridgeError::Truncated {
                expected: HEADER_SIZE,
                actual: data.len(),
            });
        }
        if data[..4] != MAGIC {
            return Err(CartridgeError::BadMagic);
        }

        let flags6 = data[6];
        let flags7 = data[7];
        let mapper = (flags6 >> 4) | (flags7 & 0xF0);
        if mapper != 0 {
            return Err(CartridgeError::UnsupportedMapper(mapper));
        }

        let prg_size = data[4] as usize * PRG_BANK_SIZE;
        let chr_size = data[5] as usize * CHR_BANK_SIZE;
        let prg_start = HEADER_SIZE + if flags6 & 0x04 != 0 { TRAINER_SIZE } else { 0 };
        let chr_start = prg_start + prg_size;
        let end = chr_start + chr_size;
        if data.len() < end {
            return Err(CartridgeError::Truncated {
                expected: end,
                actual: data.len(),
            });
        }

        // Four-screen boards carry extra VRAM we don't model; vertical is the closest layout.
        let mirroring = if flags6 & 0x09 != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let prg = data[prg_start..chr_start].to_vec();
        let (chr, chr_ram) = if chr_size > 0 {
            (data[chr_start..end].to_vec(), false)
        } else {
            (vec![0; CHR_BANK_SIZE], true)
        };

        tracing::debug!(
            "iNES: PRG {} KiB, CHR {} KiB{}, {:?} mirroring",
            prg.len() / 1024,
            chr.len() / 1024,
            if chr_ram { " (RAM)" } else { "" },
            mirroring
        );

        Ok(Cartridge {
            prg,
            chr,
            chr_ram,
            mirroring,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(prg_banks: u8, chr_banks: u8, flags6: u8, flags7: u8) -> Vec<u8> {
        let mut data = vec![b'N', b'E', b'S', 0x1A, prg_banks, chr_banks, flags6, flags7];
        data.resize(HEADER_SIZE, 0);
        if flags6 & 0x04 != 0 {
            data.extend(std::iter::repeat_n(0xEE, TRAINER_SIZE));
        }
        data.extend(std::iter::repeat_n(0xAA, prg_banks as usize * PRG_BANK_SIZE));
        data.extend(std::iter::repeat_n(0xCC, chr_banks as usize * CHR_BANK_SIZE));
        data
    }

    #[test]
    fn nrom_128_with_chr_rom() {
        let cart = Cartridge::from_bytes(&image(1, 1, 0x01, 0)).unwrap();
        assert_eq!(cart.prg.len(), PRG_BANK_SIZE);
        assert_eq!(cart.chr.len(), CHR_BANK_SIZE);
        assert!(!cart.chr_ram);
        assert_eq!(cart.mirroring, Mirroring::Vertical);
        assert!(cart.prg.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn missing_chr_rom_becomes_chr_ram() {
        let cart = Cartridge::from_bytes(&image(2, 0, 0x00, 0)).unwrap();
        assert_eq!(cart.prg.len(), 2 * PRG_BANK_SIZE);
        assert!(cart.chr_ram);
        assert_eq!(cart.chr, vec![0; CHR_BANK_SIZE]);
        assert_eq!(cart.mirroring, Mirroring::Horizontal);
    }

    #[test]
    fn trainer_is_skipped() {
        let cart = Cartridge::from_bytes(&image(1, 1, 0x04, 0)).unwrap();
        assert!(cart.prg.iter().all(|&b| b == 0xAA));
        assert!(cart.chr.iter().all(|&b| b == 0xCC));
    }

    #[test]
    fn four_screen_maps_to_vertical() {
        let cart = Cartridge::from_bytes(&image(1, 1, 0x08, 0)).unwrap();
        assert_eq!(cart.mirroring, Mirroring::Vertical);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut data = image(1, 1, 0, 0);
        data[3] = 0x1B;
        assert!(matches!(Cartridge::from_bytes(&data), Err(CartridgeError::BadMagic)));
    }

    #[test]
    fn rejects_truncated_prg() {
        let mut data = image(2, 1, 0, 0);
        data.truncate(HEADER_SIZE + PRG_BANK_SIZE);
        let expected = HEADER_SIZE + 2 * PRG_BANK_SIZE + CHR_BANK_SIZE;
        assert!(matches!(
            Cartridge::from_bytes(&data),
            Err(CartridgeError::Truncated { expected: e, actual }) if e == expected && actual == HEADER_SIZE + PRG_BANK_SIZE
        ));
    }

    #[test]
    fn rejects_banked_mappers() {
        // MMC1: low nibble in flags 6, high nibble in flags 7.
        assert!(matches!(
            Cartridge::from_bytes(&image(1, 1, 0x10, 0)),
            Err(CartridgeError::UnsupportedMapper(1))
        ));
        assert!(matches!(
            Cartridge::from_bytes(&image(1, 1, 0x40, 0x00)),
            Err(CartridgeError::UnsupportedMapper(4))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            Cartridge::load("/nonexistent/rom.nes"),
            Err(CartridgeError::Io(_))
        ));
    }
}
