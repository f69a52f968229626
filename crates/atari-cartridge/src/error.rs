//! Cartridge load errors.

use crate::{MachineFamily, SchemeId};

/// Why a ROM image could not be turned into a cartridge.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartridgeError {
    #[error("no {family} cartridge scheme uses {size}-byte images")]
    UnrecognizedSize { size: usize, family: MachineFamily },

    #[error("{scheme} cartridge needs at least {minimum} bytes, image has {size}")]
    RomTooShort {
        scheme: SchemeId,
        size: usize,
        minimum: usize,
    },

    #[error("{scheme} is an {expected} scheme, machine is an {found}")]
    SchemeMachineMismatch {
        scheme: SchemeId,
        expected: MachineFamily,
        found: MachineFamily,
    },
}
