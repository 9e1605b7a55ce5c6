//! 6502 CPU emulation for the NES.
//!
//! Table-driven decode (explicit 256-entry opcode table, undocumented opcodes included),
//! nestest-compatible timing, NMI entry, and the OAM DMA port. All memory access goes through a
//! [`MemoryMap`](crate::bus::MemoryMap).

pub mod addressing;
pub mod cpu;
pub mod flags;
pub mod instruction;
pub mod trace;
