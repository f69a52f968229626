//! Flat 64K RAM bus for CPU tests and tools.

use crate::{Bus, Signals};

/// One bus cycle seen by [`SimpleBus`] while tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusAccess {
    Read(u16, u8),
    Write(u16, u8),
}

/// 64K of RAM with no devices.
///
/// Signals queued with [`SimpleBus::raise`] are handed to the CPU on its
/// next drain, which lets tests model devices that steal cycles or preempt.
pub struct SimpleBus {
    memory: Box<[u8; 0x10000]>,
    pending: Signals,
    trace: Option<Vec<BusAccess>>,
    clock: u64,
}

impl SimpleBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            memory: Box::new([0; 0x10000]),
            pending: Signals::default(),
            trace: None,
            clock: 0,
        }
    }

    /// Copy `data` into memory starting at `address`, wrapping at $FFFF.
    pub fn load(&mut self, address: u16, data: &[u8]) {
        for (offset, &byte) in data.iter().enumerate() {
            self.memory[usize::from(address.wrapping_add(offset as u16))] = byte;
        }
    }

    /// Read without recording anything.
    #[must_use]
    pub fn peek(&self, address: u16) -> u8 {
        self.memory[usize::from(address)]
    }

    pub fn poke(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
    }

    /// Point the reset vector at `address`.
    pub fn set_reset_vector(&mut self, address: u16) {
        self.load(0xFFFC, &address.to_le_bytes());
    }

    /// Queue signals for the CPU's next drain.
    pub fn raise(&mut self, signals: Signals) {
        self.pending.stolen_cycles += signals.stolen_cycles;
        self.pending.preempt |= signals.preempt;
        self.pending.nmi |= signals.nmi;
        self.pending.irq |= signals.irq;
    }

    /// Start recording every access.
    pub fn start_trace(&mut self) {
        self.trace = Some(Vec::new());
    }

    /// Stop recording and return what was seen.
    pub fn take_trace(&mut self) -> Vec<BusAccess> {
        self.trace.take().unwrap_or_default()
    }

    /// Clock value last announced by the CPU.
    #[must_use]
    pub const fn clock(&self) -> u64 {
        self.clock
    }
}

impl Default for SimpleBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus for SimpleBus {
    fn read(&mut self, address: u16) -> u8 {
        let value = self.memory[usize::from(address)];
        if let Some(trace) = &mut self.trace {
            trace.push(BusAccess::Read(address, value));
        }
        value
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory[usize::from(address)] = value;
        if let Some(trace) = &mut self.trace {
            trace.push(BusAccess::Write(address, value));
        }
    }

    fn sync_clock(&mut self, clock: u64) {
        self.clock = clock;
    }

    fn take_signals(&mut self) -> Signals {
        std::mem::take(&mut self.pending)
    }
}
