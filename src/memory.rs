//! Plain storage devices: work RAM, cartridge PRG ROM, and an open-bus filler.

use crate::bus::{BusDevice, BusError};

/// Writable byte array. Both reads and writes past the end are out of bounds.
pub struct Ram {
    data: Vec<u8>,
}

impl Ram {
    pub fn new(size: usize) -> Self {
        Ram {
            data: vec![0; size],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Tooling access; panics past the end like a slice index.
    pub fn peek(&self, addr: u16) -> u8 {
        self.data[addr as usize]
    }
}

impl BusDevice for Ram {
    fn read(&mut self, addr: u16) -> Result<u8, BusError> {
        self.data
            .get(addr as usize)
            .copied()
            .ok_or(BusError::OutOfBounds { address: addr })
    }

    fn write(&mut self, addr: u16, data: u8) -> Result<(), BusError> {
        let slot = self
            .data
            .get_mut(addr as usize)
            .ok_or(BusError::OutOfBounds { address: addr })?;
        *slot = data;
        Ok(())
    }
}

/// Read-only byte array. Writes are dropped (the chip is physically unwritable).
pub struct Rom {
    data: Vec<u8>,
}

impl Rom {
    pub fn new(data: Vec<u8>) -> Self {
        Rom { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl BusDevice for Rom {
    fn read(&mut self, addr: u16) -> Result<u8, BusError> {
        self.data
            .get(addr as usize)
            .copied()
            .ok_or(BusError::OutOfBounds { address: addr })
    }

    fn write(&mut self, addr: u16, data: u8) -> Result<(), BusError> {
        tracing::trace!("ignored ROM write ${:04X} <- ${:02X}", addr, data);
        Ok(())
    }
}

/// Unclaimed expansion space ($4018–$5FFF): reads 0, writes vanish.
#[derive(Default)]
pub struct OpenBus;

impl BusDevice for OpenBus {
    fn read(&mut self, _addr: u16) -> Result<u8, BusError> {
        Ok(0)
    }

    fn write(&mut self, _addr: u16, _data: u8) -> Result<(), BusError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ram_reads_back_writes() {
        let mut ram = Ram::new(0x800);
        ram.write(0x7FF, 0xAB).unwrap();
        assert_eq!(ram.read(0x7FF), Ok(0xAB));
        assert_eq!(ram.read(0x800), Err(BusError::OutOfBounds { address: 0x800 }));
    }

    #[test]
    fn rom_ignores_writes() {
        let mut rom = Rom::new(vec![0x11, 0x22]);
        assert_eq!(rom.write(0x0001, 0xFF), Ok(()));
        assert_eq!(rom.read(0x0001), Ok(0x22));
        assert_eq!(rom.write(0x4000, 0xFF), Ok(()));
        assert_eq!(rom.read(0x0002), Err(BusError::OutOfBounds { address: 0x0002 }));
    }
}
