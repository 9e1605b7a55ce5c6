//! APU register pass-through and controller ports.

use crate::{
    bus::{BusDevice, BusError},
    controller::Controller,
};

/// Registers $4000–$4017, device-relative.
pub const APU_REGISTER_COUNT: usize = 0x18;

const STATUS: u16 = 0x15;
const JOY1: u16 = 0x16;
const JOY2: u16 = 0x17;

/// Controller port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Port {
    /// $4016.
    One,
    /// $4017.
    Two,
}

impl Port {
    fn index(self) -> usize {
        match self {
            Port::One => 0,
            Port::Two => 1,
        }
    }
}

/// Mounted at $4000 with offset $4000, so `addr` is the low byte of the CPU address. $4014 is
/// claimed by the CPU for OAM DMA and never arrives here.
#[derive(Debug, Default)]
pub struct Apu {
    registers: [u8; APU_REGISTER_COUNT],
    controllers: [Controller; 2],
}

impl Apu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn controller(&self, port: Port) -> &Controller {
        &self.controllers[port.index()]
    }

    pub fn controller_mut(&mut self, port: Port) -> &mut Controller {
        &mut self.controllers[port.index()]
    }

    /// Last value written to a register (the frame counter for $17).
    pub fn register(&self, addr: u16) -> Option<u8> {
        self.registers.get(addr as usize).copied()
    }
}

impl BusDevice for Apu {
    /// $16/$17 shift out one pad bit each. Everything else, $15 status included, reads 0.
    fn read(&mut self, addr: u16) -> Result<u8, BusError> {
        match addr {
            JOY1 => Ok(self.controllers[Port::One.index()].read()),
            JOY2 => Ok(self.controllers[Port::Two.index()].read()),
            0..=STATUS => Ok(0),
            _ => Err(BusError::OutOfBounds { address: addr }),
        }
    }

    /// $16 strobes both pads; $17 writes go to the frame counter.
    fn write(&mut self, addr: u16, data: u8) -> Result<(), BusError> {
        let slot = self
            .registers
            .get_mut(addr as usize)
            .ok_or(BusError::OutOfBounds { address: addr })?;
        *slot = data;
        if addr == JOY1 {
            for pad in &mut self.controllers {
                pad.write(data);
            }
        }
        Ok(())
    }
}
