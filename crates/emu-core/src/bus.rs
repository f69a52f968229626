//! Memory bus interface.

/// Side effects raised by devices during bus accesses.
///
/// Devices record these on the [`AccessContext`](crate::AccessContext) while
/// servicing a read or write. The CPU drains them after each instruction,
/// before dispatching the next one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Signals {
    /// Host-unit cycles the bus was busy and the CPU could not overlap.
    pub stolen_cycles: u32,
    /// Stop the current run slice at the next instruction boundary.
    pub preempt: bool,
    /// Edge on the NMI line.
    pub nmi: bool,
    /// Edge on the IRQ line.
    pub irq: bool,
}

impl Signals {
    /// True when no device raised anything.
    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.stolen_cycles == 0 && !self.preempt && !self.nmi && !self.irq
    }
}

/// Memory bus interface.
///
/// The CPU accesses memory and memory-mapped chips through this trait. All
/// timing is charged by the CPU from its own cycle tables; the bus only
/// reports extra cycles stolen by devices through [`Bus::take_signals`].
pub trait Bus {
    /// Read a byte from the given address.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the given address.
    fn write(&mut self, address: u16, value: u8);

    /// Tell the bus the CPU clock at the start of the next instruction.
    ///
    /// Devices see this value through their access context.
    fn sync_clock(&mut self, _clock: u64) {}

    /// Drain the signals raised by devices since the last call.
    fn take_signals(&mut self) -> Signals {
        Signals::default()
    }
}
