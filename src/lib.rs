//! Jane: a cycle-stepped NES (Nintendo Entertainment System) core written in Rust.
//!
//! Implements the NES chipset as documented on the
//! [NESdev Wiki](https://www.nesdev.org/wiki/NES_reference_guide): the Ricoh 2A03 CPU with its
//! undocumented opcodes, a device-agnostic CPU memory map, and the 2C02 PPU stepped three dots
//! per CPU cycle.
//!
//! ## Modules (NESdev references)
//!
//! - **apu** – [APU registers](https://www.nesdev.org/wiki/APU_registers) latched without
//!   synthesis; owns the two controller ports
//! - **bus** – [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map): `BusDevice` trait and
//!   the nearest-base-below `MemoryMap`, watchpoints
//! - **cartridge** – [iNES](https://www.nesdev.org/wiki/INES) loading, NROM only
//! - **config** – clock constants, power-up state, run options
//! - **console** – device ownership and the CPU/PPU lockstep driver
//! - **controller** – [Controller reading](https://www.nesdev.org/wiki/Controller_reading): strobe, shift-out
//! - **cpu** – [6502](https://www.nesdev.org/wiki/CPU) / 2A03: 256-entry opcode table, [NMI](https://www.nesdev.org/wiki/NMI), OAM DMA, trace
//! - **memory** – RAM, ROM and open-bus devices
//! - **ppu** – [PPU](https://www.nesdev.org/wiki/PPU), [PPU registers](https://www.nesdev.org/wiki/PPU_registers), OAM, nametables, 256×240

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod config;
pub mod console;
pub mod controller;
pub mod cpu;
pub mod memory;
pub mod ppu;
