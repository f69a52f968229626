//! Atari 2600 and 7800 emulation core.
//!
//! Wires a [`Mos6502`](mos_6502::Mos6502) to a paged
//! [`AddressSpace`](emu_core::AddressSpace) holding the console RAM and a
//! bank-switched [`Cartridge`](atari_cartridge::Cartridge). The 2600 bus
//! is 13 bits wide and budgets in CPU cycles; the 7800 bus is 16 bits wide
//! and budgets in 7.16 MHz ticks, four per CPU cycle.

pub mod config;
mod error;
mod machine;
mod memory;

pub use atari_cartridge::{MachineFamily, SchemeId};
pub use config::{MachineConfig, MachineKind, RamBlock};
pub use error::MachineError;
pub use machine::{Machine, MachineSnapshot, RunOutcome};
pub use memory::{Ram, Rom};
