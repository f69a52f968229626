//! Plain-data save state records.
//!
//! These are decoupled from the live objects: components copy their state
//! in and out explicitly, and the records serialize with serde.

use serde::{Deserialize, Serialize};

/// Current snapshot layout version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// CPU registers and run-loop state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuSnapshot {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub s: u8,
    pub p: u8,
    pub clock: u64,
    pub run_budget: i64,
    pub halted: bool,
    pub nmi_pending: bool,
    pub irq_pending: bool,
}

/// Mutable state of one bus device.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSnapshot {
    /// Device name, checked on restore.
    pub name: String,
    /// Bank or control registers.
    pub registers: Vec<u16>,
    /// RAM contents.
    pub ram: Vec<u8>,
}

impl DeviceSnapshot {
    /// Empty snapshot for a stateless device.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

/// Address-space state: the data bus latch plus every attached device in
/// attach order (the null device excluded).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusSnapshot {
    pub data_bus_latch: u8,
    pub devices: Vec<DeviceSnapshot>,
}
