use thiserror::Error;

use crate::{
    bus::{BusError, MemoryMap},
    config::{OAM_DMA_CYCLES, PowerUpState},
    cpu::{
        flags::{
            FLAG_BREAK, FLAG_CARRY, FLAG_DECIMAL, FLAG_INTERRUPT_DISABLE, FLAG_NEGATIVE,
            FLAG_OVERFLOW, FLAG_UNUSED, FLAG_ZERO,
        },
        instruction::{AddressingMode, Instruction, InstructionTable, Mnemonic},
    },
    ppu::ppu::NmiLine,
};

pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

/// Writing page number N here copies $N00–$NFF into OAM.
pub const OAM_DMA_PORT: u16 = 0x4014;
/// PPU OAMDATA as seen by the CPU.
pub const OAM_DATA_PORT: u16 = 0x2004;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CpuError {
    #[error("illegal opcode ${opcode:02X} at ${pc:04X}")]
    IllegalOpcode { opcode: u8, pc: u16 },
    #[error("bus fault while executing ${pc:04X}: {source}")]
    Bus { pc: u16, source: BusError },
}

/// Register snapshot for tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
}

/// Ricoh 2A03 CPU core. Decodes through a borrowed [`InstructionTable`] and reaches every device
/// through its [`MemoryMap`].
pub struct Cpu<'a> {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub status: u8,
    /// Cycles consumed by the last `step`, NMI and DMA stalls included.
    pub cycles: u32,
    pub total_cycles: u64,
    pub(crate) map: MemoryMap<'a>,
    table: &'a InstructionTable,
    power_up: PowerUpState,
    /// Cycles spent outside an instruction (NMI entry, DMA), reported by the next `step`.
    stall_cycles: u32,
    /// Address of the instruction in flight, for fault reports.
    fault_pc: u16,
}

impl<'a> Cpu<'a> {
    pub fn new(map: MemoryMap<'a>, table: &'a InstructionTable) -> Self {
        Cpu {
            a: 0,
            x: 0,
            y: 0,
            sp: 0xFD,
            pc: 0,
            status: FLAG_INTERRUPT_DISABLE | FLAG_UNUSED,
            cycles: 0,
            total_cycles: 0,
            map,
            table,
            power_up: PowerUpState::default(),
            stall_cycles: 0,
            fault_pc: 0,
        }
    }

    pub fn with_power_up(mut self, power_up: PowerUpState) -> Self {
        self.power_up = power_up;
        self
    }

    pub fn reset(&mut self) -> Result<(), CpuError> {
        let state = self.power_up;
        self.begin(self.pc);
        self.pc = match state.pc {
            Some(pc) => pc,
            None => self.read_word(RESET_VECTOR)?,
        };

        self.sp = state.sp;
        self.status = state.status | FLAG_UNUSED;
        self.a = 0;
        self.x = 0;
        self.y = 0;

        self.cycles = 0;
        self.stall_cycles = 0;
        self.total_cycles = state.cycles;

        tracing::debug!("reset: PC=${:04X} SP=${:02X} P=${:02X}", self.pc, self.sp, self.status);
        Ok(())
    }

    /// Non-maskable interrupt entry: push PC and P (B clear), set I, jump through $FFFA.
    pub fn trigger_nmi(&mut self) -> Result<(), CpuError> {
        self.begin(self.pc);
        self.push_word(self.pc)?;
        self.push((self.status & !FLAG_BREAK) | FLAG_UNUSED)?;
        self.status |= FLAG_INTERRUPT_DISABLE;
        self.pc = self.read_word(NMI_VECTOR)?;

        self.total_cycles += 7;
        self.stall_cycles += 7;
        tracing::trace!("NMI -> ${:04X}", self.pc);
        Ok(())
    }

    /// Tag fault reports and watchpoint hits with `pc` until the next instruction.
    fn begin(&mut self, pc: u16) {
        self.fault_pc = pc;
        self.map.set_pc(pc);
    }

    /// Fetch the instruction at `pc` without executing it.
    pub fn decode(&mut self, pc: u16) -> Result<Instruction, CpuError> {
        let opcode = self.read(pc)?;
        let definition = *self.table.get(opcode);
        let operand_count = definition.operand_count();

        let mut operands = [0; 2];
        for (i, operand) in operands.iter_mut().take(operand_count as usize).enumerate() {
            *operand = self.read(pc.wrapping_add(1 + i as u16))?;
        }

        Ok(Instruction {
            opcode,
            operands,
            operand_count,
            definition,
        })
    }

    /// Decode and execute one instruction. Returns the cycles it took, plus any stall
    /// (NMI entry, OAM DMA) accumulated since the previous step.
    pub fn step(&mut self) -> Result<u32, CpuError> {
        let pc = self.pc;
        self.begin(pc);
        self.cycles = 0;

        let instr = self.decode(pc)?;
        self.pc = pc.wrapping_add(instr.len());
        self.execute(&instr)?;

        self.cycles += std::mem::take(&mut self.stall_cycles);
        Ok(self.cycles)
    }

    /// Run `instr`. `pc` must already point past it (as `step` arranges).
    pub fn execute(&mut self, instr: &Instruction) -> Result<(), CpuError> {
        let def = instr.definition;
        if !def.valid {
            return Err(CpuError::IllegalOpcode {
                opcode: instr.opcode,
                pc: self.fault_pc,
            });
        }
        self.spend(def.cycles as u32);

        match def.mnemonic {
            Mnemonic::LDA => {
                self.a = self.operand_value(instr)?;
                self.update_zero_and_negative_flags(self.a);
            }
            Mnemonic::LDX => {
                self.x = self.operand_value(instr)?;
                self.update_zero_and_negative_flags(self.x);
            }
            Mnemonic::LDY => {
                self.y = self.operand_value(instr)?;
                self.update_zero_and_negative_flags(self.y);
            }
            Mnemonic::LAX => {
                let value = self.operand_value(instr)?;
                self.a = value;
                self.x = value;
                self.update_zero_and_negative_flags(value);
            }

            Mnemonic::STA => {
                let addr = self.operand_address(instr)?;
                self.write(addr, self.a)?;
            }
            Mnemonic::STX => {
                let addr = self.operand_address(instr)?;
                self.write(addr, self.x)?;
            }
            Mnemonic::STY => {
                let addr = self.operand_address(instr)?;
                self.write(addr, self.y)?;
            }
            Mnemonic::SAX => {
                let addr = self.operand_address(instr)?;
                self.write(addr, self.a & self.x)?;
            }

            Mnemonic::ADC => {
                let value = self.operand_value(instr)?;
                self.adc(value);
            }
            Mnemonic::SBC => {
                let value = self.operand_value(instr)?;
                self.sbc(value);
            }
            Mnemonic::AND => {
                let value = self.operand_value(instr)?;
                self.and(value);
            }
            Mnemonic::ORA => {
                let value = self.operand_value(instr)?;
                self.ora(value);
            }
            Mnemonic::EOR => {
                let value = self.operand_value(instr)?;
                self.eor(value);
            }
            Mnemonic::CMP => {
                let value = self.operand_value(instr)?;
                self.compare(self.a, value);
            }
            Mnemonic::CPX => {
                let value = self.operand_value(instr)?;
                self.compare(self.x, value);
            }
            Mnemonic::CPY => {
                let value = self.operand_value(instr)?;
                self.compare(self.y, value);
            }
            Mnemonic::BIT => {
                let value = self.operand_value(instr)?;
                self.set_flag(FLAG_ZERO, self.a & value == 0);
                self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
                self.set_flag(FLAG_OVERFLOW, value & 0x40 != 0);
            }

            Mnemonic::ASL => {
                self.modify(instr, Self::asl)?;
            }
            Mnemonic::LSR => {
                self.modify(instr, Self::lsr)?;
            }
            Mnemonic::ROL => {
                self.modify(instr, Self::rol)?;
            }
            Mnemonic::ROR => {
                self.modify(instr, Self::ror)?;
            }
            Mnemonic::INC => {
                self.modify(instr, Self::inc)?;
            }
            Mnemonic::DEC => {
                self.modify(instr, Self::dec)?;
            }

            // Unofficial read-modify-write pairs: the memory primitive, then the accumulator one.
            Mnemonic::DCP => {
                let value = self.modify(instr, Self::dec)?;
                self.compare(self.a, value);
            }
            Mnemonic::ISC => {
                let value = self.modify(instr, Self::inc)?;
                self.sbc(value);
            }
            Mnemonic::SLO => {
                let value = self.modify(instr, Self::asl)?;
                self.ora(value);
            }
            Mnemonic::RLA => {
                let value = self.modify(instr, Self::rol)?;
                self.and(value);
            }
            Mnemonic::SRE => {
                let value = self.modify(instr, Self::lsr)?;
                self.eor(value);
            }
            Mnemonic::RRA => {
                let value = self.modify(instr, Self::ror)?;
                self.adc(value);
            }

            Mnemonic::INX => {
                self.x = self.x.wrapping_add(1);
                self.update_zero_and_negative_flags(self.x);
            }
            Mnemonic::INY => {
                self.y = self.y.wrapping_add(1);
                self.update_zero_and_negative_flags(self.y);
            }
            Mnemonic::DEX => {
                self.x = self.x.wrapping_sub(1);
                self.update_zero_and_negative_flags(self.x);
            }
            Mnemonic::DEY => {
                self.y = self.y.wrapping_sub(1);
                self.update_zero_and_negative_flags(self.y);
            }

            Mnemonic::TAX => {
                self.x = self.a;
                self.update_zero_and_negative_flags(self.x);
            }
            Mnemonic::TAY => {
                self.y = self.a;
                self.update_zero_and_negative_flags(self.y);
            }
            Mnemonic::TXA => {
                self.a = self.x;
                self.update_zero_and_negative_flags(self.a);
            }
            Mnemonic::TYA => {
                self.a = self.y;
                self.update_zero_and_negative_flags(self.a);
            }
            Mnemonic::TSX => {
                self.x = self.sp;
                self.update_zero_and_negative_flags(self.x);
            }
            Mnemonic::TXS => self.sp = self.x,

            Mnemonic::PHA => self.push(self.a)?,
            Mnemonic::PHP => self.push(self.status | FLAG_BREAK | FLAG_UNUSED)?,
            Mnemonic::PLA => {
                self.a = self.pop()?;
                self.update_zero_and_negative_flags(self.a);
            }
            Mnemonic::PLP => {
                let status = self.pop()?;
                self.status = (status & !FLAG_BREAK) | FLAG_UNUSED;
            }

            Mnemonic::CLC => self.set_flag(FLAG_CARRY, false),
            Mnemonic::SEC => self.set_flag(FLAG_CARRY, true),
            Mnemonic::CLI => self.set_flag(FLAG_INTERRUPT_DISABLE, false),
            Mnemonic::SEI => self.set_flag(FLAG_INTERRUPT_DISABLE, true),
            Mnemonic::CLD => self.set_flag(FLAG_DECIMAL, false),
            Mnemonic::SED => self.set_flag(FLAG_DECIMAL, true),
            Mnemonic::CLV => self.set_flag(FLAG_OVERFLOW, false),

            Mnemonic::BCC => self.branch(instr, self.status & FLAG_CARRY == 0),
            Mnemonic::BCS => self.branch(instr, self.status & FLAG_CARRY != 0),
            Mnemonic::BNE => self.branch(instr, self.status & FLAG_ZERO == 0),
            Mnemonic::BEQ => self.branch(instr, self.status & FLAG_ZERO != 0),
            Mnemonic::BPL => self.branch(instr, self.status & FLAG_NEGATIVE == 0),
            Mnemonic::BMI => self.branch(instr, self.status & FLAG_NEGATIVE != 0),
            Mnemonic::BVC => self.branch(instr, self.status & FLAG_OVERFLOW == 0),
            Mnemonic::BVS => self.branch(instr, self.status & FLAG_OVERFLOW != 0),

            Mnemonic::JMP => self.pc = self.operand_address(instr)?,
            Mnemonic::JSR => {
                let target = self.operand_address(instr)?;
                self.push_word(self.pc.wrapping_sub(1))?;
                self.pc = target;
            }
            Mnemonic::RTS => self.pc = self.pop_word()?.wrapping_add(1),
            Mnemonic::RTI => {
                let status = self.pop()?;
                self.status = (status & !FLAG_BREAK) | FLAG_UNUSED;
                self.pc = self.pop_word()?;
            }
            Mnemonic::BRK => {
                // Skip the padding byte after the opcode.
                self.push_word(self.pc.wrapping_add(1))?;
                self.push(self.status | FLAG_BREAK | FLAG_UNUSED)?;
                self.status |= FLAG_INTERRUPT_DISABLE;
                self.pc = self.read_word(IRQ_VECTOR)?;
            }

            Mnemonic::NOP => {
                // Multi-byte NOPs still perform their read (and pay the page-cross cycle).
                if def.mode != AddressingMode::Implied {
                    self.operand_value(instr)?;
                }
            }

            Mnemonic::ANC
            | Mnemonic::ALR
            | Mnemonic::ARR
            | Mnemonic::AXS
            | Mnemonic::SHY
            | Mnemonic::SHX
            | Mnemonic::TAS
            | Mnemonic::LAS
            | Mnemonic::XAA
            | Mnemonic::AHX
            | Mnemonic::KIL => {
                return Err(CpuError::IllegalOpcode {
                    opcode: instr.opcode,
                    pc: self.fault_pc,
                });
            }
        }
        Ok(())
    }

    /// OAM DMA: copy `page`*$100..+$FF into OAMDATA. Returns the stolen cycles, which are also
    /// reported by the current (or next) `step`.
    pub fn do_dma(&mut self, page: u8) -> Result<u32, CpuError> {
        let base = (page as u16) << 8;
        for i in 0..=0xFF_u16 {
            let value = self.read(base | i)?;
            let pc = self.fault_pc;
            self.map
                .write(OAM_DATA_PORT, value)
                .map_err(|source| CpuError::Bus { pc, source })?;
        }

        let cost = OAM_DMA_CYCLES + (self.total_cycles & 1) as u32;
        self.total_cycles += cost as u64;
        self.stall_cycles += cost;
        tracing::trace!("OAM DMA from ${:04X} ({} cycles)", base, cost);
        Ok(cost)
    }

    pub fn registers(&self) -> Registers {
        Registers {
            a: self.a,
            x: self.x,
            y: self.y,
            sp: self.sp,
            pc: self.pc,
            status: self.status,
        }
    }

    pub fn map(&self) -> &MemoryMap<'a> {
        &self.map
    }

    pub fn map_mut(&mut self) -> &mut MemoryMap<'a> {
        &mut self.map
    }

    pub fn table(&self) -> &'a InstructionTable {
        self.table
    }

    pub(super) fn spend(&mut self, cycles: u32) {
        self.cycles += cycles;
        self.total_cycles += cycles as u64;
    }

    pub(super) fn read(&mut self, addr: u16) -> Result<u8, CpuError> {
        let pc = self.fault_pc;
        self.map
            .read(addr)
            .map_err(|source| CpuError::Bus { pc, source })
    }

    pub(super) fn write(&mut self, addr: u16, data: u8) -> Result<(), CpuError> {
        if addr == OAM_DMA_PORT {
            self.do_dma(data)?;
            return Ok(());
        }
        let pc = self.fault_pc;
        self.map
            .write(addr, data)
            .map_err(|source| CpuError::Bus { pc, source })
    }

    pub(super) fn read_word(&mut self, addr: u16) -> Result<u16, CpuError> {
        let lo = self.read(addr)? as u16;
        let hi = self.read(addr.wrapping_add(1))? as u16;
        Ok((hi << 8) | lo)
    }

    pub(super) fn push(&mut self, value: u8) -> Result<(), CpuError> {
        let addr = 0x0100 | self.sp as u16;
        self.write(addr, value)?;
        self.sp = self.sp.wrapping_sub(1);
        Ok(())
    }

    pub(super) fn pop(&mut self) -> Result<u8, CpuError> {
        self.sp = self.sp.wrapping_add(1);
        let addr = 0x0100 | self.sp as u16;
        self.read(addr)
    }

    fn push_word(&mut self, value: u16) -> Result<(), CpuError> {
        self.push((value >> 8) as u8)?;
        self.push(value as u8)
    }

    fn pop_word(&mut self) -> Result<u16, CpuError> {
        let lo = self.pop()? as u16;
        let hi = self.pop()? as u16;
        Ok((hi << 8) | lo)
    }

    fn branch(&mut self, instr: &Instruction, condition: bool) {
        if !condition {
            return;
        }
        let target = self.relative_target(instr);
        self.spend(1);
        if super::addressing::page_crossed(self.pc, target) {
            self.spend(1);
        }
        self.pc = target;
    }

    fn set_flag(&mut self, flag: u8, on: bool) {
        if on {
            self.status |= flag;
        } else {
            self.status &= !flag;
        }
    }

    pub(super) fn update_zero_and_negative_flags(&mut self, value: u8) {
        self.set_flag(FLAG_ZERO, value == 0);
        self.set_flag(FLAG_NEGATIVE, value & 0x80 != 0);
    }

    // Primitive operations. The unofficial opcodes are compositions of these.

    pub(super) fn adc(&mut self, value: u8) {
        let carry = self.status & FLAG_CARRY;
        let sum = self.a as u16 + value as u16 + carry as u16;
        let signed = self.a as i8 as i16 + value as i8 as i16 + carry as i16;
        let result = sum as u8;

        self.set_flag(FLAG_CARRY, sum > 0xFF);
        self.set_flag(FLAG_OVERFLOW, !(-128..=127).contains(&signed));
        self.a = result;
        self.update_zero_and_negative_flags(result);
    }

    /// Binary subtract: A + !value + C. Decimal mode is ignored.
    pub(super) fn sbc(&mut self, value: u8) {
        self.adc(!value);
    }

    fn and(&mut self, value: u8) {
        self.a &= value;
        self.update_zero_and_negative_flags(self.a);
    }

    fn ora(&mut self, value: u8) {
        self.a |= value;
        self.update_zero_and_negative_flags(self.a);
    }

    fn eor(&mut self, value: u8) {
        self.a ^= value;
        self.update_zero_and_negative_flags(self.a);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.set_flag(FLAG_CARRY, register >= value);
        self.update_zero_and_negative_flags(register.wrapping_sub(value));
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.set_flag(FLAG_CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.set_flag(FLAG_CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = self.status & FLAG_CARRY;
        self.set_flag(FLAG_CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = (self.status & FLAG_CARRY) << 7;
        self.set_flag(FLAG_CARRY, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.update_zero_and_negative_flags(result);
        result
    }

    fn inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.update_zero_and_negative_flags(result);
        result
    }

    fn dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.update_zero_and_negative_flags(result);
        result
    }
}

/// The PPU raises vblank NMI straight into the CPU, completing entry before its tick returns.
impl NmiLine for Cpu<'_> {
    type Error = CpuError;

    fn raise_nmi(&mut self) -> Result<(), CpuError> {
        self.trigger_nmi()
    }
}
