//! System assembly and the lockstep driver.
//!
//! [`Devices`] owns every bus device; [`Console`] borrows them, wires the CPU memory map
//! ([CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map)) and alternates one CPU
//! instruction with three PPU dots per CPU cycle.

use std::cell::{Ref, RefCell, RefMut};

use thiserror::Error;

use crate::{
    apu::apu::Apu,
    bus::{BusError, MemoryMap},
    cartridge::cartridge::{Cartridge, PRG_BANK_SIZE},
    config::{EmulatorConfig, PPU_DOTS_PER_CPU_CYCLE},
    cpu::{
        cpu::{Cpu, CpuError},
        instruction::InstructionTable,
    },
    memory::{OpenBus, Ram, Rom},
    ppu::{memory::PpuMemory, ppu::Ppu},
};

pub const INTERNAL_RAM_SIZE: usize = 0x0800;
pub const PRG_RAM_SIZE: usize = 0x2000;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("memory map: {0}")]
    Bus(#[from] BusError),
    #[error(transparent)]
    Cpu(#[from] CpuError),
}

/// Receives each completed frame.
pub trait FrameSink {
    /// `rgb` is 0xRRGGBB, `indices` the matching system palette indices; both 256×240 row-major.
    fn present(&mut self, rgb: &[u32], indices: &[u8]);
}

/// Every device on the CPU bus, plus the opcode table the CPU decodes with.
pub struct Devices {
    pub ram: RefCell<Ram>,
    pub prg_ram: RefCell<Ram>,
    pub prg: RefCell<Rom>,
    pub ppu: RefCell<Ppu>,
    pub apu: RefCell<Apu>,
    pub open_bus: RefCell<OpenBus>,
    pub table: InstructionTable,
    /// 16 KiB carts are mirrored into $C000.
    prg_mirrored: bool,
}

impl Devices {
    pub fn new(cart: &Cartridge) -> Self {
        Devices {
            ram: RefCell::new(Ram::new(INTERNAL_RAM_SIZE)),
            prg_ram: RefCell::new(Ram::new(PRG_RAM_SIZE)),
            prg: RefCell::new(Rom::new(cart.prg.clone())),
            ppu: RefCell::new(Ppu::new(PpuMemory::new(
                &cart.chr,
                cart.mirroring,
                cart.chr_ram,
            ))),
            apu: RefCell::new(Apu::new()),
            open_bus: RefCell::new(OpenBus),
            table: InstructionTable::new(),
            prg_mirrored: cart.prg.len() <= PRG_BANK_SIZE,
        }
    }

    /// $0000 RAM ×4, $2000 PPU registers ×1024, $4000 APU/pads, $4018 open bus, $6000 PRG RAM,
    /// $8000 PRG ROM (again at $C000 for NROM-128).
    pub fn map(&self) -> Result<MemoryMap<'_>, BusError> {
        let mut map = MemoryMap::new();
        map.mount_mirrored(0x0000, 0x2000, INTERNAL_RAM_SIZE as u16, &self.ram)?;
        map.mount_mirrored(0x2000, 0x2000, 8, &self.ppu)?;
        map.mount(0x4000, &self.apu, 0x4000)?;
        map.mount(0x4018, &self.open_bus, 0x4018)?;
        map.mount(0x6000, &self.prg_ram, 0x6000)?;
        map.mount(0x8000, &self.prg, 0x8000)?;
        if self.prg_mirrored {
            map.mount(0xC000, &self.prg, 0xC000)?;
        }
        tracing::debug!("memory map: {} entries", map.len());
        Ok(map)
    }
}

pub struct Console<'a> {
    cpu: Cpu<'a>,
    ppu: &'a RefCell<Ppu>,
    apu: &'a RefCell<Apu>,
    instructions: u64,
}

impl<'a> Console<'a> {
    /// Wire the map, install watchpoints and reset the CPU.
    pub fn new(devices: &'a Devices, config: &EmulatorConfig) -> Result<Self, ConsoleError> {
        let mut map = devices.map()?;
        for &address in &config.read_watches {
            map.watch_read(address);
        }
        for &address in &config.write_watches {
            map.watch_write(address);
        }

        let mut cpu = Cpu::new(map, &devices.table).with_power_up(config.power_up);
        cpu.reset()?;
        Ok(Console {
            cpu,
            ppu: &devices.ppu,
            apu: &devices.apu,
            instructions: 0,
        })
    }

    /// One CPU instruction, then 3 PPU dots for every cycle it took. A vblank NMI raised by the
    /// PPU is entered before this returns; its cost is charged to the next step.
    pub fn step(&mut self) -> Result<u32, CpuError> {
        let cycles = self.cpu.step()?;
        self.instructions += 1;

        let ppu = self.ppu;
        let mut ppu = ppu.try_borrow_mut().map_err(|_| CpuError::Bus {
            pc: self.cpu.pc,
            source: BusError::DeviceBusy { address: 0x2000 },
        })?;
        for _ in 0..cycles * PPU_DOTS_PER_CPU_CYCLE {
            ppu.tick(&mut self.cpu)?;
        }
        Ok(cycles)
    }

    pub fn frame_ready(&self) -> bool {
        self.ppu.borrow().frame_ready()
    }

    /// Hand a finished frame to `sink` and clear the flag. Returns whether one was ready.
    pub fn present_frame(&mut self, sink: &mut dyn FrameSink) -> bool {
        let mut ppu = self.ppu.borrow_mut();
        if !ppu.frame_ready() {
            return false;
        }
        sink.present(ppu.framebuffer(), ppu.frame_indices());
        ppu.clear_frame_ready();
        true
    }

    /// Step until the PPU finishes its visible lines, then present.
    pub fn run_frame(&mut self, sink: &mut dyn FrameSink) -> Result<(), CpuError> {
        while !self.frame_ready() {
            self.step()?;
        }
        self.present_frame(sink);
        Ok(())
    }

    pub fn cpu(&self) -> &Cpu<'a> {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Cpu<'a> {
        &mut self.cpu
    }

    pub fn ppu(&self) -> Ref<'_, Ppu> {
        self.ppu.borrow()
    }

    /// The APU block, for setting pad state between steps.
    pub fn apu(&self) -> RefMut<'_, Apu> {
        self.apu.borrow_mut()
    }

    /// Instructions executed since power-up.
    pub fn instructions(&self) -> u64 {
        self.instructions
    }
}
