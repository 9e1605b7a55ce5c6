//! NES cartridge loading.
//!
//! - **cartridge**: Loads iNES (.nes) files into flat PRG/CHR buffers plus nametable mirroring.
//!   Only NROM (mapper 0) boards are accepted; there is no bank switching.

pub mod cartridge;
