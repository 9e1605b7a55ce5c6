//! NES APU register block ($4000–$4017).
//!
//! Sound synthesis is not emulated. The block latches channel and frame-counter writes so games
//! can program it freely, and owns the two controller ports at $4016/$4017.

pub mod apu;
