//! Operand resolution.
//!
//! Two entry points: [`Cpu::operand_value`] for read-type instructions (pays the page-cross cycle
//! on abs,X / abs,Y / (ind),Y) and [`Cpu::operand_address`] for stores and read-modify-write
//! instructions, whose base cycle counts already include the extra cycle.

use crate::cpu::{
    cpu::{Cpu, CpuError},
    instruction::{AddressingMode, Instruction},
};

/// True when `a` and `b` are on different 256-byte pages.
pub fn page_crossed(a: u16, b: u16) -> bool {
    (a & 0xFF00) != (b & 0xFF00)
}

fn indexed(base: u16, index: u8) -> (u16, bool) {
    let addr = base.wrapping_add(index as u16);
    (addr, page_crossed(base, addr))
}

impl<'a> Cpu<'a> {
    pub(super) fn operand_value(&mut self, instr: &Instruction) -> Result<u8, CpuError> {
        match instr.definition.mode {
            AddressingMode::Immediate => Ok(instr.byte()),
            AddressingMode::Accumulator => Ok(self.a),
            _ => {
                let (addr, crossed) = self.effective_address(instr)?;
                if crossed {
                    self.spend(1);
                }
                self.read(addr)
            }
        }
    }

    pub(super) fn operand_address(&mut self, instr: &Instruction) -> Result<u16, CpuError> {
        Ok(self.effective_address(instr)?.0)
    }

    /// Read, transform with `op`, write back; on the accumulator for `ASL A` and friends.
    /// Returns the written value.
    pub(super) fn modify(
        &mut self,
        instr: &Instruction,
        op: fn(&mut Cpu<'a>, u8) -> u8,
    ) -> Result<u8, CpuError> {
        if instr.definition.mode == AddressingMode::Accumulator {
            let value = self.a;
            let result = op(self, value);
            self.a = result;
            return Ok(result);
        }
        let addr = self.operand_address(instr)?;
        let value = self.read(addr)?;
        let result = op(self, value);
        self.write(addr, result)?;
        Ok(result)
    }

    /// Branch destination, relative to the address after the instruction.
    pub(super) fn relative_target(&self, instr: &Instruction) -> u16 {
        self.pc.wrapping_add(instr.byte() as i8 as u16)
    }

    /// Effective address, and whether indexing carried into the high byte.
    fn effective_address(&mut self, instr: &Instruction) -> Result<(u16, bool), CpuError> {
        let resolved = match instr.definition.mode {
            AddressingMode::ZeroPage => (instr.byte() as u16, false),
            // Zero-page indexing never leaves page 0
            AddressingMode::ZeroPageX => (instr.byte().wrapping_add(self.x) as u16, false),
            AddressingMode::ZeroPageY => (instr.byte().wrapping_add(self.y) as u16, false),
            AddressingMode::Absolute => (instr.word(), false),
            AddressingMode::AbsoluteX => indexed(instr.word(), self.x),
            AddressingMode::AbsoluteY => indexed(instr.word(), self.y),
            AddressingMode::Indirect => (self.read_word_page_wrapped(instr.word())?, false),
            AddressingMode::IndirectX => {
                let pointer = instr.byte().wrapping_add(self.x);
                (self.read_zero_page_word(pointer)?, false)
            }
            AddressingMode::IndirectY => {
                let base = self.read_zero_page_word(instr.byte())?;
                indexed(base, self.y)
            }
            AddressingMode::Relative => (self.relative_target(instr), false),
            mode @ (AddressingMode::Implied
            | AddressingMode::Accumulator
            | AddressingMode::Immediate) => {
                unreachable!("{mode:?} operand has no effective address")
            }
        };
        Ok(resolved)
    }

    /// Pointer in page 0; the high byte wraps to $00 after $FF.
    fn read_zero_page_word(&mut self, pointer: u8) -> Result<u16, CpuError> {
        let lo = self.read(pointer as u16)? as u16;
        let hi = self.read(pointer.wrapping_add(1) as u16)? as u16;
        Ok((hi << 8) | lo)
    }

    /// JMP ($xxFF) fetches its high byte from $xx00, not the next page.
    fn read_word_page_wrapped(&mut self, pointer: u16) -> Result<u16, CpuError> {
        let lo = self.read(pointer)? as u16;
        let hi_addr = (pointer & 0xFF00) | (pointer.wrapping_add(1) & 0x00FF);
        let hi = self.read(hi_addr)? as u16;
        Ok((hi << 8) | lo)
    }
}
