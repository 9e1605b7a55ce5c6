//! Bus devices and the CPU memory map.
//!
//! Every memory or I/O region implements [`BusDevice`]. The [`MemoryMap`] routes a CPU address to
//! the mounted entry with the highest base address ≤ the target and hands the device
//! `address - offset`. Mirroring is modelled by mounting the same device at several bases
//! (see [CPU memory map](https://www.nesdev.org/wiki/CPU_memory_map)).

use std::cell::RefCell;

use thiserror::Error;

/// Faults raised by bus devices and the memory map. All of them are fatal for the access in
/// progress; the driving loop decides what to do next.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// No device is mounted at or below this address.
    #[error("no device mapped at ${address:04X}")]
    Unmapped { address: u16 },
    /// The device-relative address is outside the device's declared size.
    #[error("address out of bounds: ${address:04X}")]
    OutOfBounds { address: u16 },
    /// Two mounts share a base address.
    #[error("a device is already mounted at ${base:04X}")]
    DuplicateMount { base: u16 },
    /// The device is already borrowed (the map is wired so that a device calls back into itself).
    #[error("device at ${address:04X} is busy")]
    DeviceBusy { address: u16 },
}

/// A byte-addressed memory or I/O region.
///
/// `read` takes `&mut self`: some devices change state when read (PPU status clears vblank,
/// PPU data advances its address, controllers shift out the next button).
pub trait BusDevice {
    fn read(&mut self, addr: u16) -> Result<u8, BusError>;
    fn write(&mut self, addr: u16, data: u8) -> Result<(), BusError>;
}

/// Kind of access that tripped a watchpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Watch {
    Read,
    Write,
}

/// A watchpoint hit, recorded after the access has fully completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchHit {
    pub kind: Watch,
    pub address: u16,
    pub data: u8,
    /// Instruction (or interrupt entry) that made the access.
    pub pc: u16,
}

struct MapEntry<'a> {
    base: u16,
    offset: u16,
    device: &'a RefCell<dyn BusDevice + 'a>,
}

/// CPU address router. Holds non-owning handles to devices owned by the assembling code.
#[derive(Default)]
pub struct MemoryMap<'a> {
    /// Sorted by `base`, unique.
    entries: Vec<MapEntry<'a>>,
    read_watches: Vec<u16>,
    write_watches: Vec<u16>,
    /// In access order; drained by `take_watch_hits`.
    watch_hits: Vec<WatchHit>,
    /// Tagged onto hits. Set by the CPU as each instruction begins.
    pc: u16,
}

impl<'a> MemoryMap<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount `device` at `base`. Accesses at `base..next_base` reach the device as `addr - offset`.
    pub fn mount(
        &mut self,
        base: u16,
        device: &'a RefCell<dyn BusDevice + 'a>,
        offset: u16,
    ) -> Result<(), BusError> {
        let index = self.entries.partition_point(|e| e.base < base);
        if self.entries.get(index).is_some_and(|e| e.base == base) {
            return Err(BusError::DuplicateMount { base });
        }
        self.entries.insert(
            index,
            MapEntry {
                base,
                offset,
                device,
            },
        );
        Ok(())
    }

    /// Mount `device` every `stride` bytes across `base..base + window`, each mirror seeing the
    /// device from address 0.
    pub fn mount_mirrored(
        &mut self,
        base: u16,
        window: u32,
        stride: u16,
        device: &'a RefCell<dyn BusDevice + 'a>,
    ) -> Result<(), BusError> {
        let mut mirror = u32::from(base);
        let end = u32::from(base) + window;
        while mirror < end && mirror <= 0xFFFF {
            let mirror_base = mirror as u16;
            self.mount(mirror_base, device, mirror_base)?;
            mirror += u32::from(stride);
        }
        tracing::debug!(
            "mounted {} mirrors at ${:04X} (stride ${:X})",
            window / u32::from(stride),
            base,
            stride
        );
        Ok(())
    }

    fn lookup(&self, address: u16) -> Result<&MapEntry<'a>, BusError> {
        let index = self.entries.partition_point(|e| e.base <= address);
        if index == 0 {
            return Err(BusError::Unmapped { address });
        }
        Ok(&self.entries[index - 1])
    }

    pub fn read(&mut self, address: u16) -> Result<u8, BusError> {
        let entry = self.lookup(address)?;
        let data = entry
            .device
            .try_borrow_mut()
            .map_err(|_| BusError::DeviceBusy { address })?
            .read(address.wrapping_sub(entry.offset))?;
        if self.read_watches.contains(&address) {
            self.watch_hits.push(WatchHit {
                kind: Watch::Read,
                address,
                data,
                pc: self.pc,
            });
        }
        Ok(data)
    }

    pub fn write(&mut self, address: u16, data: u8) -> Result<(), BusError> {
        let entry = self.lookup(address)?;
        entry
            .device
            .try_borrow_mut()
            .map_err(|_| BusError::DeviceBusy { address })?
            .write(address.wrapping_sub(entry.offset), data)?;
        if self.write_watches.contains(&address) {
            self.watch_hits.push(WatchHit {
                kind: Watch::Write,
                address,
                data,
                pc: self.pc,
            });
        }
        Ok(())
    }

    /// Little-endian word at `address`, `address + 1`.
    pub fn read_word(&mut self, address: u16) -> Result<u16, BusError> {
        let lo = self.read(address)? as u16;
        let hi = self.read(address.wrapping_add(1))? as u16;
        Ok((hi << 8) | lo)
    }

    pub fn watch_read(&mut self, address: u16) {
        if !self.read_watches.contains(&address) {
            self.read_watches.push(address);
        }
    }

    pub fn watch_write(&mut self, address: u16) {
        if !self.write_watches.contains(&address) {
            self.write_watches.push(address);
        }
    }

    pub fn clear_watches(&mut self) {
        self.read_watches.clear();
        self.write_watches.clear();
        self.watch_hits.clear();
    }

    /// Address reported with any hit recorded from now on.
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    /// Every watchpoint hit since the last call, oldest first.
    pub fn take_watch_hits(&mut self) -> Vec<WatchHit> {
        std::mem::take(&mut self.watch_hits)
    }

    /// Number of mounted entries (mirrors included).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
