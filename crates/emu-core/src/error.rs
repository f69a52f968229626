//! Configuration and snapshot errors.

use crate::DeviceId;

/// Address-space configuration failure, reported while a machine is built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    #[error("invalid bus geometry: {address_bits} address bits, {page_bits} page bits")]
    InvalidGeometry { address_bits: u32, page_bits: u32 },

    #[error("mapping ${base:04X}+{size:#X} is not aligned to the {page_size}-byte page size")]
    UnalignedMapping { base: u16, size: u32, page_size: u32 },

    #[error("mapping ${base:04X}+{size:#X} runs past the end of a {limit:#X}-byte address space")]
    OutOfRange { base: u16, size: u32, limit: u32 },

    #[error("a snooping device ({existing}) is already mapped; cannot map {rejected}")]
    SecondSnooper { existing: String, rejected: String },

    #[error("no device with id {0:?}")]
    UnknownDevice(DeviceId),
}

/// Snapshot restore failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot version {found} is not supported (expected {expected})")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("snapshot holds {found} devices, bus has {expected}")]
    DeviceCountMismatch { found: usize, expected: usize },

    #[error("snapshot device {index} is {found}, bus has {expected}")]
    DeviceMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    #[error("{device}: snapshot has {found} RAM bytes, device has {expected}")]
    RamSizeMismatch {
        device: String,
        found: usize,
        expected: usize,
    },

    #[error("{device}: snapshot has {found} bank registers, device has {expected}")]
    RegisterCountMismatch {
        device: String,
        found: usize,
        expected: usize,
    },

    #[error("snapshot was taken on {found}, machine is {expected}")]
    MachineMismatch { found: String, expected: String },
}
