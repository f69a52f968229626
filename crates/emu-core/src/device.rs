//! Device contract for anything that sits on the bus.

use crate::{DeviceSnapshot, Signals, SnapshotError};

/// Handle to a device owned by an [`AddressSpace`](crate::AddressSpace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub(crate) usize);

impl DeviceId {
    /// The no-op device every page points at before anything is mapped.
    pub const NULL: Self = Self(0);

    /// Index of the device in attach order (the null device is 0).
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Describes one `map` call, handed to [`Device::on_mapped`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// First address covered.
    pub base: u16,
    /// Bytes covered; always a multiple of `page_size`.
    pub size: u32,
    /// Page size of the address space.
    pub page_size: u32,
    /// Mask applied to every address before dispatch.
    pub address_mask: u16,
}

impl Mapping {
    /// True when `address` falls inside this mapping.
    #[must_use]
    pub fn contains(&self, address: u16) -> bool {
        address >= self.base && u32::from(address - self.base) < self.size
    }
}

/// Per-access context handed to devices.
///
/// Carries the CPU clock and the open-bus latch in, and collects the
/// cycle-stealing and preemption requests a device raises on the way out.
#[derive(Debug, Default)]
pub struct AccessContext {
    clock: u64,
    data_bus: u8,
    signals: Signals,
}

impl AccessContext {
    /// CPU clock at the start of the current instruction.
    #[must_use]
    pub const fn clock(&self) -> u64 {
        self.clock
    }

    /// Last byte that crossed the data bus.
    #[must_use]
    pub const fn data_bus(&self) -> u8 {
        self.data_bus
    }

    /// Charge `cycles` host units against the CPU's remaining run budget.
    pub fn steal_cycles(&mut self, cycles: u32) {
        self.signals.stolen_cycles = self.signals.stolen_cycles.saturating_add(cycles);
    }

    /// Ask the CPU to end its run slice at the next instruction boundary.
    pub fn request_preempt(&mut self) {
        self.signals.preempt = true;
    }

    /// Raise an NMI edge.
    pub fn raise_nmi(&mut self) {
        self.signals.nmi = true;
    }

    /// Raise an IRQ edge.
    pub fn raise_irq(&mut self) {
        self.signals.irq = true;
    }

    pub(crate) fn set_clock(&mut self, clock: u64) {
        self.clock = clock;
    }

    pub(crate) fn set_data_bus(&mut self, value: u8) {
        self.data_bus = value;
    }

    pub(crate) fn take_signals(&mut self) -> Signals {
        std::mem::take(&mut self.signals)
    }

    #[cfg(test)]
    pub(crate) fn signals(&self) -> Signals {
        self.signals
    }
}

/// A component that answers bus reads and writes.
///
/// RAM, timers, video/audio chips and cartridges all implement this. Reads
/// and writes may have side effects beyond moving a byte (bank switches,
/// timer strobes, stolen cycles).
pub trait Device {
    /// Short name used in logs and snapshots.
    fn name(&self) -> &str;

    /// Return to power-on state.
    fn reset(&mut self) {}

    /// Called after the address space points a range of pages at this device.
    fn on_mapped(&mut self, _mapping: Mapping) {}

    /// Read a byte. `address` is the full (masked) bus address.
    fn read(&mut self, address: u16, ctx: &mut AccessContext) -> u8;

    /// Write a byte. `address` is the full (masked) bus address.
    fn write(&mut self, address: u16, value: u8, ctx: &mut AccessContext);

    /// A snooping device sees every bus access, not just its own pages.
    fn wants_bus_snooping(&self) -> bool {
        false
    }

    /// Capture mutable state.
    fn snapshot(&self) -> DeviceSnapshot {
        DeviceSnapshot::named(self.name())
    }

    /// Check that `snapshot` fits this device without touching any state.
    /// [`Device::restore`] must succeed whenever this does.
    fn check_snapshot(&self, _snapshot: &DeviceSnapshot) -> Result<(), SnapshotError> {
        Ok(())
    }

    /// Restore state captured by [`Device::snapshot`].
    fn restore(&mut self, _snapshot: &DeviceSnapshot) -> Result<(), SnapshotError> {
        Ok(())
    }
}

/// Placeholder for unmapped pages: reads return the open-bus value, writes
/// are dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDevice;

impl Device for NullDevice {
    fn name(&self) -> &str {
        "null"
    }

    fn read(&mut self, _address: u16, ctx: &mut AccessContext) -> u8 {
        ctx.data_bus()
    }

    fn write(&mut self, _address: u16, _value: u8, _ctx: &mut AccessContext) {}
}
