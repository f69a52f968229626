//! 6502 register file.

use crate::Status;

/// A, X, Y, S, PC and P.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    /// Stack pointer; the stack lives at $0100-$01FF and grows down.
    pub s: u8,
    pub pc: u16,
    pub p: Status,
}

impl Registers {
    /// Register state after RESET: S=$FD, I set, everything else zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFD,
            pc: 0,
            p: Status::RESET,
        }
    }

    /// Address for the next push; post-decrements S.
    pub fn push_address(&mut self) -> u16 {
        let address = self.stack_address();
        self.s = self.s.wrapping_sub(1);
        address
    }

    /// Address for the next pull; pre-increments S.
    pub fn pull_address(&mut self) -> u16 {
        self.s = self.s.wrapping_add(1);
        self.stack_address()
    }

    #[must_use]
    pub const fn stack_address(&self) -> u16 {
        0x0100 | self.s as u16
    }
}

impl Default for Registers {
    fn default() -> Self {
        Self::new()
    }
}
