//! Operand fetch and effective-address calculation.
//!
//! Every bus cycle the real chip performs is issued here, including the
//! throwaway reads: zero-page indexing reads the unindexed address, indexed
//! modes read the address before the high-byte fix-up, and implied
//! instructions read the byte after the opcode. Cartridges whose hotspots
//! respond to reads depend on these.

use emu_core::Bus;

use crate::Mos6502;

/// Memory operand addressing modes.
///
/// Implied, accumulator, relative and JMP's absolute-indirect form are
/// handled by the instructions that use them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    /// `#$nn`
    Imm,
    /// `$nn`
    Zp,
    /// `$nn,X`, wraps within page zero.
    ZpX,
    /// `$nn,Y`, wraps within page zero.
    ZpY,
    /// `$nnnn`
    Abs,
    /// `$nnnn,X`
    AbsX,
    /// `$nnnn,Y`
    AbsY,
    /// `($nn,X)`
    IndX,
    /// `($nn),Y`
    IndY,
}

impl Mode {
    /// Modes whose store and read-modify-write forms always spend the
    /// high-byte fix-up cycle.
    const fn is_indexed_absolute(self) -> bool {
        matches!(self, Mode::AbsX | Mode::AbsY | Mode::IndY)
    }
}

impl Mos6502 {
    /// Read the byte at PC and advance PC.
    pub(crate) fn fetch(&mut self, bus: &mut impl Bus) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    pub(crate) fn fetch_word(&mut self, bus: &mut impl Bus) -> u16 {
        let low = self.fetch(bus);
        let high = self.fetch(bus);
        u16::from_le_bytes([low, high])
    }

    /// Throwaway read of the byte at PC, spent by every one-byte instruction.
    pub(crate) fn idle_read(&mut self, bus: &mut impl Bus) {
        let _ = bus.read(self.regs.pc);
    }

    pub(crate) fn read_word(bus: &mut impl Bus, address: u16) -> u16 {
        let low = bus.read(address);
        let high = bus.read(address.wrapping_add(1));
        u16::from_le_bytes([low, high])
    }

    /// Pointer read for `JMP ($nnnn)`: the high byte comes from the same
    /// page, so `JMP ($10FF)` reads $10FF and $1000.
    pub(crate) fn read_word_same_page(bus: &mut impl Bus, address: u16) -> u16 {
        let low = bus.read(address);
        let high = bus.read((address & 0xFF00) | (address.wrapping_add(1) & 0x00FF));
        u16::from_le_bytes([low, high])
    }

    /// Pointer read from page zero, wrapping at $FF.
    fn read_zero_page_word(bus: &mut impl Bus, pointer: u8) -> u16 {
        let low = bus.read(u16::from(pointer));
        let high = bus.read(u16::from(pointer.wrapping_add(1)));
        u16::from_le_bytes([low, high])
    }

    pub(crate) fn push(&mut self, bus: &mut impl Bus, value: u8) {
        let address = self.regs.push_address();
        bus.write(address, value);
    }

    pub(crate) fn pull(&mut self, bus: &mut impl Bus) -> u8 {
        let address = self.regs.pull_address();
        bus.read(address)
    }

    /// Push high byte first, so the low byte ends up at the lower address.
    pub(crate) fn push_word(&mut self, bus: &mut impl Bus, value: u16) {
        let [low, high] = value.to_le_bytes();
        self.push(bus, high);
        self.push(bus, low);
    }

    pub(crate) fn pull_word(&mut self, bus: &mut impl Bus) -> u16 {
        let low = self.pull(bus);
        let high = self.pull(bus);
        u16::from_le_bytes([low, high])
    }

    /// Resolve the effective address of a memory operand.
    ///
    /// Returns the address and whether indexing carried into the high byte.
    /// Immediate operands resolve to PC itself.
    fn operand_address(&mut self, bus: &mut impl Bus, mode: Mode) -> (u16, bool) {
        match mode {
            Mode::Imm => {
                let address = self.regs.pc;
                self.regs.pc = self.regs.pc.wrapping_add(1);
                (address, false)
            }
            Mode::Zp => (u16::from(self.fetch(bus)), false),
            Mode::ZpX | Mode::ZpY => {
                let base = self.fetch(bus);
                let _ = bus.read(u16::from(base));
                let index = if mode == Mode::ZpX {
                    self.regs.x
                } else {
                    self.regs.y
                };
                (u16::from(base.wrapping_add(index)), false)
            }
            Mode::Abs => (self.fetch_word(bus), false),
            Mode::AbsX | Mode::AbsY => {
                let base = self.fetch_word(bus);
                let index = if mode == Mode::AbsX {
                    self.regs.x
                } else {
                    self.regs.y
                };
                let address = base.wrapping_add(u16::from(index));
                (address, crosses_page(base, address))
            }
            Mode::IndX => {
                let base = self.fetch(bus);
                let _ = bus.read(u16::from(base));
                let address = Self::read_zero_page_word(bus, base.wrapping_add(self.regs.x));
                (address, false)
            }
            Mode::IndY => {
                let pointer = self.fetch(bus);
                let base = Self::read_zero_page_word(bus, pointer);
                let address = base.wrapping_add(u16::from(self.regs.y));
                (address, crosses_page(base, address))
            }
        }
    }

    /// Fetch a read operand. Returns the value and whether a page was
    /// crossed (one extra cycle for the indexed modes).
    pub(crate) fn load(&mut self, bus: &mut impl Bus, mode: Mode) -> (u8, bool) {
        let (address, crossed) = self.operand_address(bus, mode);
        if crossed {
            let _ = bus.read(address.wrapping_sub(0x100));
        }
        (bus.read(address), crossed)
    }

    /// Effective address for a store or read-modify-write. Indexed absolute
    /// modes always read the un-fixed address first.
    pub(crate) fn store_address(&mut self, bus: &mut impl Bus, mode: Mode) -> u16 {
        let (address, crossed) = self.operand_address(bus, mode);
        if mode.is_indexed_absolute() {
            let unfixed = if crossed {
                address.wrapping_sub(0x100)
            } else {
                address
            };
            let _ = bus.read(unfixed);
        }
        address
    }

    /// Conditional branch. Returns 2 cycles, 3 if taken, 4 if the target is
    /// on another page.
    pub(crate) fn branch(&mut self, bus: &mut impl Bus, condition: bool) -> u32 {
        let offset = self.fetch(bus) as i8;
        if !condition {
            return 2;
        }
        self.idle_read(bus);
        let target = self.regs.pc.wrapping_add_signed(i16::from(offset));
        let crossed = crosses_page(self.regs.pc, target);
        if crossed {
            let _ = bus.read((self.regs.pc & 0xFF00) | (target & 0x00FF));
        }
        self.regs.pc = target;
        if crossed { 4 } else { 3 }
    }
}

const fn crosses_page(from: u16, to: u16) -> bool {
    from & 0xFF00 != to & 0xFF00
}
