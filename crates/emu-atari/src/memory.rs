//! Plain RAM and ROM bus devices.

use emu_core::{AccessContext, Device, DeviceSnapshot, SnapshotError};

/// Byte-addressed RAM, mirrored every `len` bytes across whatever ranges it
/// is mapped at.
pub struct Ram {
    name: &'static str,
    bytes: Vec<u8>,
}

impl Ram {
    /// `size` must be a power of two.
    #[must_use]
    pub fn new(name: &'static str, size: usize) -> Self {
        debug_assert!(size.is_power_of_two());
        Self {
            name,
            bytes: vec![0; size],
        }
    }

    fn index(&self, address: u16) -> usize {
        usize::from(address) & (self.bytes.len() - 1)
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl Device for Ram {
    fn name(&self) -> &str {
        self.name
    }

    fn reset(&mut self) {
        self.bytes.fill(0);
    }

    fn read(&mut self, address: u16, _ctx: &mut AccessContext) -> u8 {
        self.bytes[self.index(address)]
    }

    fn write(&mut self, address: u16, value: u8, _ctx: &mut AccessContext) {
        let index = self.index(address);
        self.bytes[index] = value;
    }

    fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            name: self.name.to_string(),
            registers: Vec::new(),
            ram: self.bytes.clone(),
        }
    }

    fn check_snapshot(&self, snapshot: &DeviceSnapshot) -> Result<(), SnapshotError> {
        if snapshot.ram.len() != self.bytes.len() {
            return Err(SnapshotError::RamSizeMismatch {
                device: self.name.to_string(),
                found: snapshot.ram.len(),
                expected: self.bytes.len(),
            });
        }
        Ok(())
    }

    fn restore(&mut self, snapshot: &DeviceSnapshot) -> Result<(), SnapshotError> {
        self.check_snapshot(snapshot)?;
        self.bytes.copy_from_slice(&snapshot.ram);
        Ok(())
    }
}

/// Read-only image (the 7800 BIOS). Writes are dropped.
pub struct Rom {
    name: &'static str,
    bytes: Vec<u8>,
}

impl Rom {
    /// `image.len()` must be a power of two.
    #[must_use]
    pub fn new(name: &'static str, image: &[u8]) -> Self {
        debug_assert!(image.len().is_power_of_two());
        Self {
            name,
            bytes: image.to_vec(),
        }
    }
}

impl Device for Rom {
    fn name(&self) -> &str {
        self.name
    }

    fn read(&mut self, address: u16, _ctx: &mut AccessContext) -> u8 {
        self.bytes[usize::from(address) & (self.bytes.len() - 1)]
    }

    fn write(&mut self, _address: u16, _value: u8, _ctx: &mut AccessContext) {}
}
