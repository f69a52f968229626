//! Machine construction and control errors.

use atari_cartridge::CartridgeError;
use emu_core::{BusError, SnapshotError};

use crate::MachineKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MachineError {
    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Cartridge(#[from] CartridgeError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("{0} has no BIOS")]
    NoBiosSlot(MachineKind),

    #[error("BIOS image must be 4096 or 16384 bytes, got {0}")]
    BiosSize(usize),

    #[error("a BIOS is already loaded")]
    BiosLoaded,

    #[error("no BIOS loaded")]
    NoBios,
}
