//! MOS 6502 CPU, as found in the Atari 2600 (6507) and 7800 (SALLY).
//!
//! Instruction-level: [`Mos6502::step`](emu_core::Cpu::step) runs one
//! whole instruction and charges its documented cycle cost, with page-cross
//! and branch penalties. Every bus cycle of the real chip is still issued,
//! dummy reads included, so read-triggered cartridge hotspots behave.
//!
//! Besides the documented set this executes the stable undocumented opcodes
//! (LAX, SAX, DCP, ISC, SLO, SRE, RLA, RRA, ANC, ALR, ARR, SBX, $EB SBC and
//! the multi-byte NOPs). JAM opcodes and the unstable ones halt the CPU
//! until the next reset.

mod addressing;
mod alu;
mod cpu;
mod execute;
pub mod flags;
mod registers;

pub use cpu::Mos6502;
pub use flags::Status;
pub use registers::Registers;
