//! nestest-style trace lines.
//!
//! `C000  4C F5 C5  JMP $C5F5                        A:00 X:00 Y:00 P:24 SP:FD CYC:7`
//!
//! Only the register and cycle columns are meant for comparison; the disassembly column uses this
//! crate's own syntax.

use crate::cpu::cpu::{Cpu, CpuError};

/// Trace line for the instruction at the current PC, before it executes.
pub fn trace_line(cpu: &mut Cpu<'_>) -> Result<String, CpuError> {
    let instr = cpu.decode(cpu.pc)?;
    let bytes = instr
        .bytes()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ");
    Ok(format!(
        "{:04X}  {:<8}  {:<32}A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
        cpu.pc,
        bytes,
        instr.to_string(),
        cpu.a,
        cpu.x,
        cpu.y,
        cpu.status,
        cpu.sp,
        cpu.total_cycles
    ))
}

/// The comparable columns of one trace line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceFields {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub p: u8,
    pub sp: u8,
    pub cycles: u64,
}

impl TraceFields {
    /// Parse a line in this crate's format or the reference nestest.log format (which adds a
    /// `PPU:` column before `CYC:`).
    pub fn parse(line: &str) -> Option<TraceFields> {
        let line = line.trim();
        let pc = u16::from_str_radix(line.get(0..4)?, 16).ok()?;
        let registers = line.get(line.find("A:")?..)?;
        let cycles = registers.get(registers.find("CYC:")? + 4..)?;
        Some(TraceFields {
            pc,
            a: hex_field(registers, "A:")?,
            x: hex_field(registers, "X:")?,
            y: hex_field(registers, "Y:")?,
            p: hex_field(registers, "P:")?,
            sp: hex_field(registers, "SP:")?,
            cycles: cycles.split_whitespace().next()?.parse().ok()?,
        })
    }
}

fn hex_field(s: &str, prefix: &str) -> Option<u8> {
    // Leading space so `P:` never matches the tail of `SP:`.
    let start = if s.starts_with(prefix) {
        prefix.len()
    } else {
        s.find(&format!(" {prefix}"))? + prefix.len() + 1
    };
    u8::from_str_radix(s.get(start..start + 2)?, 16).ok()
}
