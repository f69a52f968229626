//! Top-level machine: a 6502, the paged bus, RAM and the cartridge.
//!
//! Video, audio and I/O chips are not part of the core. A frame driver
//! attaches them with [`Machine::attach`] and then calls [`Machine::run`]
//! with one scanline's budget at a time; those devices slow the CPU down
//! (WSYNC, MARIA DMA) by stealing cycles or preempting the slice.

use std::rc::Rc;

use atari_cartridge::{Cartridge, MachineFamily, SchemeId, strip_a78_header};
use emu_core::{
    AddressSpace, BusSnapshot, Cpu, CpuSnapshot, Device, DeviceId, LogSink, Logger, Observable,
    SNAPSHOT_VERSION, SnapshotError, Value,
};
use mos_6502::Mos6502;
use serde::{Deserialize, Serialize};

use crate::memory::{Ram, Rom};
use crate::{MachineConfig, MachineError, MachineKind};

/// What a call to [`Machine::run`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    /// CPU cycles executed.
    pub cycles: u64,
    /// The CPU jammed or the machine was halted from outside.
    pub halted: bool,
    /// A device ended the slice early.
    pub preempted: bool,
}

/// Complete machine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    pub version: u32,
    pub kind: MachineKind,
    pub cpu: CpuSnapshot,
    pub bus: BusSnapshot,
    pub bios_enabled: bool,
}

#[derive(Debug, Clone, Copy)]
struct Bios {
    id: DeviceId,
    base: u16,
    size: u32,
}

/// An Atari 2600 or 7800.
pub struct Machine {
    kind: MachineKind,
    cpu: Mos6502,
    bus: AddressSpace,
    cartridge: DeviceId,
    scheme: SchemeId,
    cartridge_base: u16,
    bios: Option<Bios>,
    bios_enabled: bool,
    halt_requested: bool,
    logger: Logger,
}

impl Machine {
    /// Build the bus for `config.kind`, map RAM and the cartridge, and reset
    /// the CPU. Without a `sink` nothing is logged; pass
    /// [`LogFacade`](emu_core::LogFacade) to forward to the `log` crate.
    pub fn new(config: &MachineConfig, sink: Option<Rc<dyn LogSink>>) -> Result<Self, MachineError> {
        let kind = config.kind;
        let logger = sink.map_or_else(Logger::silent, Logger::new);
        let mut bus = AddressSpace::new(kind.address_bits(), kind.page_bits())?
            .with_logger(logger.clone());

        for block in kind.ram_layout() {
            let id = bus.add_device(Box::new(Ram::new(block.name, block.size)));
            for &(base, size) in block.mappings {
                bus.map(base, size, id)?;
            }
        }

        let family = kind.family();
        let cartridge = match config.scheme {
            Some(id) => {
                let (_, rom) = strip_a78_header(&config.rom);
                Cartridge::for_family(id, rom, family)?
            }
            None => Cartridge::from_image(&config.rom, family)?,
        };
        let scheme = cartridge.scheme();
        logger.info(
            "cartridge",
            format_args!(
                "{} cartridge ({}): {} bytes in {} banks",
                scheme.id,
                if config.scheme.is_some() { "forced" } else { "detected" },
                cartridge.rom().len(),
                cartridge.bank_count(),
            ),
        );
        let cartridge_id = bus.attach(scheme.base, scheme.size, Box::new(cartridge))?;

        let mut cpu = Mos6502::new().with_run_budget_multiple(kind.run_budget_multiple());
        cpu.set_logger(logger.clone());
        cpu.reset(&mut bus);

        Ok(Self {
            kind,
            cpu,
            bus,
            cartridge: cartridge_id,
            scheme: scheme.id,
            cartridge_base: scheme.base,
            bios: None,
            bios_enabled: false,
            halt_requested: false,
            logger,
        })
    }

    /// Add an external device (TIA, RIOT, MARIA, ...) and map it.
    pub fn attach(
        &mut self,
        base: u16,
        size: u32,
        device: Box<dyn Device>,
    ) -> Result<DeviceId, MachineError> {
        Ok(self.bus.attach(base, size, device)?)
    }

    /// Map an already attached device at another range.
    pub fn map(&mut self, base: u16, size: u32, id: DeviceId) -> Result<(), MachineError> {
        Ok(self.bus.map(base, size, id)?)
    }

    /// Run the CPU for `budget` host units, unless halted.
    pub fn run(&mut self, budget: i32) -> RunOutcome {
        if self.halt_requested {
            return RunOutcome {
                cycles: 0,
                halted: true,
                preempted: false,
            };
        }
        let cycles = self.cpu.run(&mut self.bus, budget);
        RunOutcome {
            cycles,
            halted: self.cpu.is_halted(),
            preempted: self.cpu.preempt_requested(),
        }
    }

    /// Run one scanline's worth of budget.
    pub fn run_scanline(&mut self) -> RunOutcome {
        self.run(self.kind.scanline_budget())
    }

    /// Stop running at the next `run` call. The CPU state is untouched.
    pub fn halt(&mut self) {
        self.halt_requested = true;
    }

    pub fn resume(&mut self) {
        self.halt_requested = false;
    }

    /// Halted from outside, or the CPU has jammed.
    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halt_requested || self.cpu.is_halted()
    }

    /// Reset every device and the CPU. A loaded BIOS is switched back in.
    pub fn reset(&mut self) -> Result<(), MachineError> {
        self.bus.reset_devices();
        if self.bios.is_some() {
            self.swap_bios(true)?;
        }
        self.cpu.reset(&mut self.bus);
        Ok(())
    }

    /// Map a 7800 BIOS over the top of memory and reset into it.
    pub fn load_bios(&mut self, image: &[u8]) -> Result<DeviceId, MachineError> {
        if self.kind.family() != MachineFamily::Atari7800 {
            return Err(MachineError::NoBiosSlot(self.kind));
        }
        if self.bios.is_some() {
            return Err(MachineError::BiosLoaded);
        }
        let size = match image.len() {
            0x1000 => 0x1000_u32,
            0x4000 => 0x4000,
            other => return Err(MachineError::BiosSize(other)),
        };
        let base = (0x1_0000 - size) as u16;
        let id = self.bus.attach(base, size, Box::new(Rom::new("bios", image)))?;
        self.bios = Some(Bios { id, base, size });
        self.bios_enabled = true;
        self.logger
            .info("bios", format_args!("{size}-byte BIOS at ${base:04X}"));
        self.reset()?;
        Ok(id)
    }

    /// Switch between the BIOS and the cartridge in the BIOS range. Parts
    /// of the range the cartridge does not cover become open bus.
    pub fn swap_bios(&mut self, enabled: bool) -> Result<(), MachineError> {
        let bios = self.bios.ok_or(MachineError::NoBios)?;
        if enabled {
            self.bus.map(bios.base, bios.size, bios.id)?;
        } else {
            let start = u32::from(bios.base);
            let end = start + bios.size;
            let split = u32::from(self.cartridge_base).clamp(start, end);
            if split > start {
                self.bus.unmap(bios.base, split - start)?;
            }
            if end > split {
                self.bus.map(split as u16, end - split, self.cartridge)?;
            }
        }
        if enabled != self.bios_enabled {
            self.logger.debug(
                "bios",
                format_args!("BIOS {}", if enabled { "mapped in" } else { "swapped out" }),
            );
        }
        self.bios_enabled = enabled;
        Ok(())
    }

    #[must_use]
    pub const fn bios_enabled(&self) -> bool {
        self.bios_enabled
    }

    #[must_use]
    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            version: SNAPSHOT_VERSION,
            kind: self.kind,
            cpu: self.cpu.snapshot(),
            bus: self.bus.snapshot(),
            bios_enabled: self.bios_enabled,
        }
    }

    /// Restore a snapshot taken on a machine built from the same config.
    pub fn restore(&mut self, snapshot: &MachineSnapshot) -> Result<(), MachineError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            }
            .into());
        }
        if snapshot.kind != self.kind {
            return Err(SnapshotError::MachineMismatch {
                found: snapshot.kind.to_string(),
                expected: self.kind.to_string(),
            }
            .into());
        }
        self.bus.restore(&snapshot.bus)?;
        if self.bios.is_some() {
            self.swap_bios(snapshot.bios_enabled)?;
        }
        self.cpu.restore(&snapshot.cpu);
        Ok(())
    }

    #[must_use]
    pub const fn kind(&self) -> MachineKind {
        self.kind
    }

    #[must_use]
    pub const fn scheme(&self) -> SchemeId {
        self.scheme
    }

    #[must_use]
    pub const fn cartridge_id(&self) -> DeviceId {
        self.cartridge
    }

    #[must_use]
    pub fn cpu(&self) -> &Mos6502 {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut Mos6502 {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &AddressSpace {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut AddressSpace {
        &mut self.bus
    }
}

impl Observable for Machine {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.query(rest)
        } else {
            match path {
                "halted" => Some(self.is_halted().into()),
                "bios" => Some(self.bios_enabled.into()),
                "data_bus" => Some(self.bus.data_bus_latch().into()),
                _ => None,
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.pc",
            "cpu.a",
            "cpu.x",
            "cpu.y",
            "cpu.s",
            "cpu.p",
            "cpu.flags.c",
            "cpu.flags.z",
            "cpu.flags.i",
            "cpu.flags.d",
            "cpu.flags.v",
            "cpu.flags.n",
            "cpu.clock",
            "cpu.halted",
            "halted",
            "bios",
            "data_bus",
        ]
    }
}

impl std::fmt::Debug for Machine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("kind", &self.kind)
            .field("scheme", &self.scheme)
            .field("cpu", &self.cpu)
            .field("bios_enabled", &self.bios_enabled)
            .field("halt_requested", &self.halt_requested)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}
