//! The generic bank-switched cartridge device.

use emu_core::{AccessContext, Device, DeviceSnapshot, Mapping, SnapshotError};

use crate::scheme::{AccessKind, Scheme, Window};
use crate::{CartridgeError, MachineFamily, SchemeId, detect};

/// A cartridge interpreting one [`Scheme`] over an immutable ROM image.
pub struct Cartridge {
    scheme: &'static Scheme,
    name: String,
    /// Bus addresses the whole slot has been mapped at (mirrors included).
    /// Empty until mapped, in which case the scheme's base applies.
    bases: Vec<u16>,
    rom: Vec<u8>,
    bank_count: u16,
    /// Current bank per bank register.
    banks: Vec<u16>,
    ram: Vec<u8>,
}

impl Cartridge {
    /// Build a cartridge for `id` from a raw image (no container header).
    ///
    /// The image must hold at least one window. Shorter than the scheme's
    /// nominal size, it is mirrored up to it; a trailing partial window is
    /// filled with $FF.
    pub fn new(id: SchemeId, image: &[u8]) -> Result<Self, CartridgeError> {
        let scheme = id.scheme();
        let window = scheme.window_size();
        if image.len() < window {
            return Err(CartridgeError::RomTooShort {
                scheme: id,
                size: image.len(),
                minimum: window,
            });
        }

        let mut rom: Vec<u8> = image
            .iter()
            .copied()
            .cycle()
            .take(image.len().max(scheme.rom_size))
            .collect();
        rom.resize(rom.len().div_ceil(window) * window, 0xFF);

        let bank_count = u16::try_from(rom.len() / window).unwrap_or(u16::MAX);
        let ram = vec![0; scheme.ram.map_or(0, |ram| ram.size)];

        let mut cartridge = Self {
            scheme,
            name: format!("cart-{}", id.tag()),
            bases: Vec::new(),
            rom,
            bank_count,
            banks: Vec::with_capacity(scheme.defaults.len()),
            ram,
        };
        cartridge.select_defaults();
        Ok(cartridge)
    }

    /// Detect the scheme of `image` (stripping an A78 header) and build it.
    pub fn from_image(image: &[u8], family: MachineFamily) -> Result<Self, CartridgeError> {
        let (id, rom) = detect(image, family)?;
        Self::for_family(id, rom, family)
    }

    /// Build `id`, refusing schemes that belong to another console.
    pub fn for_family(id: SchemeId, rom: &[u8], family: MachineFamily) -> Result<Self, CartridgeError> {
        let expected = id.scheme().family;
        if expected != family {
            return Err(CartridgeError::SchemeMachineMismatch {
                scheme: id,
                expected,
                found: family,
            });
        }
        Self::new(id, rom)
    }

    #[must_use]
    pub const fn scheme(&self) -> &'static Scheme {
        self.scheme
    }

    #[must_use]
    pub fn id(&self) -> SchemeId {
        self.scheme.id
    }

    /// Number of windows-sized banks in the (padded) image.
    #[must_use]
    pub const fn bank_count(&self) -> u16 {
        self.bank_count
    }

    /// Bank currently selected by bank register `register`.
    #[must_use]
    pub fn bank(&self, register: usize) -> Option<u16> {
        self.banks.get(register).copied()
    }

    #[must_use]
    pub fn rom(&self) -> &[u8] {
        &self.rom
    }

    #[must_use]
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }

    fn select_defaults(&mut self) {
        self.banks.clear();
        self.banks.extend(
            self.scheme
                .defaults
                .iter()
                .map(|bank| bank.resolve(self.bank_count) % self.bank_count),
        );
    }

    /// Offset into the slot, when `address` is inside one of its mappings.
    fn offset(&self, address: u16) -> Option<u16> {
        let within = |base: u16| {
            address
                .checked_sub(base)
                .filter(|&offset| u32::from(offset) < self.scheme.size)
        };
        if self.bases.is_empty() {
            within(self.scheme.base)
        } else {
            self.bases.iter().find_map(|&base| within(base))
        }
    }

    /// Hotspot tables use the scheme's own addresses; translate accesses
    /// inside the slot to them. Snooped accesses outside pass through.
    fn fire_triggers(&mut self, address: u16, access: AccessKind, value: Option<u8>) {
        let address = self
            .offset(address)
            .map_or(address, |offset| self.scheme.base.wrapping_add(offset));
        for trigger in self.scheme.triggers {
            if let Some(bank) = trigger.fire(address, access, value, self.bank_count)
                && let Some(slot) = self.banks.get_mut(trigger.register)
            {
                *slot = bank % self.bank_count;
            }
        }
    }

    fn rom_byte(&self, offset: u16) -> u8 {
        let bits = self.scheme.window_bits;
        let windows = self.scheme.windows;
        let window = usize::from(offset >> bits) % windows.len();
        let bank = match windows[window] {
            Window::Register(register) => self.banks.get(register).copied().unwrap_or(0),
            Window::Fixed(bank) => bank.resolve(self.bank_count),
        };
        let within = usize::from(offset) & (self.scheme.window_size() - 1);
        let index = (usize::from(bank % self.bank_count) << bits) | within;
        self.rom[index % self.rom.len()]
    }
}

impl Device for Cartridge {
    fn name(&self) -> &str {
        &self.name
    }

    /// Bank registers go back to their power-on values. RAM keeps its
    /// contents, as on the real boards.
    fn reset(&mut self) {
        self.select_defaults();
    }

    /// Mappings covering the whole slot decide where it decodes. Smaller
    /// ones (a BIOS swapped out over part of the slot) are mirrors of a
    /// range already known.
    fn on_mapped(&mut self, mapping: Mapping) {
        if mapping.size >= self.scheme.size && !self.bases.contains(&mapping.base) {
            self.bases.push(mapping.base);
        }
    }

    fn read(&mut self, address: u16, ctx: &mut AccessContext) -> u8 {
        let offset = self.offset(address);
        if let (Some(offset), Some(ram)) = (offset, self.scheme.ram) {
            if let Some(index) = ram.read_index(offset) {
                return self.ram[index];
            }
            if ram.write_index(offset).is_some() {
                // Reading the write port only drives the bus.
                return ctx.data_bus();
            }
        }

        self.fire_triggers(address, AccessKind::Read, None);
        offset.map_or_else(|| ctx.data_bus(), |offset| self.rom_byte(offset))
    }

    fn write(&mut self, address: u16, value: u8, _ctx: &mut AccessContext) {
        if let (Some(offset), Some(ram)) = (self.offset(address), self.scheme.ram)
            && let Some(index) = ram.write_index(offset)
        {
            self.ram[index] = value;
            return;
        }
        // ROM itself ignores the write.
        self.fire_triggers(address, AccessKind::Write, Some(value));
    }

    fn wants_bus_snooping(&self) -> bool {
        self.scheme.snoops
    }

    fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot {
            name: self.name.clone(),
            registers: self.banks.clone(),
            ram: self.ram.clone(),
        }
    }

    fn check_snapshot(&self, snapshot: &DeviceSnapshot) -> Result<(), SnapshotError> {
        if snapshot.registers.len() != self.banks.len() {
            return Err(SnapshotError::RegisterCountMismatch {
                device: self.name.clone(),
                found: snapshot.registers.len(),
                expected: self.banks.len(),
            });
        }
        if snapshot.ram.len() != self.ram.len() {
            return Err(SnapshotError::RamSizeMismatch {
                device: self.name.clone(),
                found: snapshot.ram.len(),
                expected: self.ram.len(),
            });
        }
        Ok(())
    }

    fn restore(&mut self, snapshot: &DeviceSnapshot) -> Result<(), SnapshotError> {
        self.check_snapshot(snapshot)?;
        self.banks
            .iter_mut()
            .zip(&snapshot.registers)
            .for_each(|(bank, saved)| *bank = saved % self.bank_count);
        self.ram.copy_from_slice(&snapshot.ram);
        Ok(())
    }
}

impl std::fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cartridge")
            .field("scheme", &self.scheme.id)
            .field("bases", &self.bases)
            .field("rom_len", &self.rom.len())
            .field("banks", &self.banks)
            .field("ram_len", &self.ram.len())
            .finish()
    }
}
