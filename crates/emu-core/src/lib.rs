//! Core traits and types for cycle-counted emulation.
//!
//! The CPU drives a [`Bus`]; the bus routes every access to a [`Device`].
//! Devices never hold a reference back to the machine. Anything they need
//! (the current CPU clock, a way to steal cycles or end the run slice early)
//! arrives through the [`AccessContext`] passed into each access.

mod address_space;
mod bus;
mod cpu;
mod device;
mod error;
mod observable;
mod simple_bus;
mod sink;
mod snapshot;

pub use address_space::AddressSpace;
pub use bus::{Bus, Signals};
pub use cpu::Cpu;
pub use device::{AccessContext, Device, DeviceId, Mapping, NullDevice};
pub use error::{BusError, SnapshotError};
pub use observable::{Observable, Value};
pub use simple_bus::{BusAccess, SimpleBus};
pub use sink::{LogEntry, LogFacade, LogSink, Logger, MemoryLog};
pub use snapshot::{BusSnapshot, CpuSnapshot, DeviceSnapshot, SNAPSHOT_VERSION};
