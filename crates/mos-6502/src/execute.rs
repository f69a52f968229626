//! Opcode dispatch.
//!
//! Every arm returns the cycle count of the instruction, including the
//! page-cross penalty where the mode has one. Undocumented opcodes cost the
//! same as the documented instruction sharing their addressing mode.

use emu_core::Bus;

use crate::Mos6502;
use crate::addressing::Mode;
use crate::flags::{self, Status};

/// Opcodes that lock the NMOS 6502 until reset (KIL/JAM).
const JAM: [u8; 12] = [
    0x02, 0x12, 0x22, 0x32, 0x42, 0x52, 0x62, 0x72, 0x92, 0xB2, 0xD2, 0xF2,
];

impl Mos6502 {
    /// Read-type instruction. `cycles` is the cost without a page cross.
    fn read_op<B: Bus>(
        &mut self,
        bus: &mut B,
        mode: Mode,
        cycles: u32,
        op: fn(&mut Self, u8),
    ) -> u32 {
        let (value, crossed) = self.load(bus, mode);
        op(self, value);
        cycles + u32::from(crossed)
    }

    fn store_op<B: Bus>(&mut self, bus: &mut B, mode: Mode, cycles: u32, value: u8) -> u32 {
        let address = self.store_address(bus, mode);
        bus.write(address, value);
        cycles
    }

    /// Read-modify-write: the old value is written back once before the
    /// new one, as the real chip does.
    fn rmw_op<B: Bus>(
        &mut self,
        bus: &mut B,
        mode: Mode,
        cycles: u32,
        op: fn(&mut Self, u8) -> u8,
    ) -> u32 {
        let address = self.store_address(bus, mode);
        let old = bus.read(address);
        bus.write(address, old);
        let new = op(self, old);
        bus.write(address, new);
        cycles
    }

    /// Single-byte instruction working on registers only.
    fn implied<B: Bus>(&mut self, bus: &mut B, op: fn(&mut Self)) -> u32 {
        self.idle_read(bus);
        op(self);
        2
    }

    /// ASL A, LSR A, ROL A, ROR A.
    fn accumulator<B: Bus>(&mut self, bus: &mut B, op: fn(&mut Self, u8) -> u8) -> u32 {
        self.idle_read(bus);
        let value = self.regs.a;
        self.regs.a = op(self, value);
        2
    }

    fn set_flag<B: Bus>(&mut self, bus: &mut B, flag: u8, value: bool) -> u32 {
        self.idle_read(bus);
        self.regs.p.set_if(flag, value);
        2
    }

    pub(crate) fn execute<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> u32 {
        match opcode {
            // LDA
            0xA9 => self.read_op(bus, Mode::Imm, 2, Self::lda),
            0xA5 => self.read_op(bus, Mode::Zp, 3, Self::lda),
            0xB5 => self.read_op(bus, Mode::ZpX, 4, Self::lda),
            0xAD => self.read_op(bus, Mode::Abs, 4, Self::lda),
            0xBD => self.read_op(bus, Mode::AbsX, 4, Self::lda),
            0xB9 => self.read_op(bus, Mode::AbsY, 4, Self::lda),
            0xA1 => self.read_op(bus, Mode::IndX, 6, Self::lda),
            0xB1 => self.read_op(bus, Mode::IndY, 5, Self::lda),

            // LDX
            0xA2 => self.read_op(bus, Mode::Imm, 2, Self::ldx),
            0xA6 => self.read_op(bus, Mode::Zp, 3, Self::ldx),
            0xB6 => self.read_op(bus, Mode::ZpY, 4, Self::ldx),
            0xAE => self.read_op(bus, Mode::Abs, 4, Self::ldx),
            0xBE => self.read_op(bus, Mode::AbsY, 4, Self::ldx),

            // LDY
            0xA0 => self.read_op(bus, Mode::Imm, 2, Self::ldy),
            0xA4 => self.read_op(bus, Mode::Zp, 3, Self::ldy),
            0xB4 => self.read_op(bus, Mode::ZpX, 4, Self::ldy),
            0xAC => self.read_op(bus, Mode::Abs, 4, Self::ldy),
            0xBC => self.read_op(bus, Mode::AbsX, 4, Self::ldy),

            // STA
            0x85 => self.store_op(bus, Mode::Zp, 3, self.regs.a),
            0x95 => self.store_op(bus, Mode::ZpX, 4, self.regs.a),
            0x8D => self.store_op(bus, Mode::Abs, 4, self.regs.a),
            0x9D => self.store_op(bus, Mode::AbsX, 5, self.regs.a),
            0x99 => self.store_op(bus, Mode::AbsY, 5, self.regs.a),
            0x81 => self.store_op(bus, Mode::IndX, 6, self.regs.a),
            0x91 => self.store_op(bus, Mode::IndY, 6, self.regs.a),

            // STX / STY
            0x86 => self.store_op(bus, Mode::Zp, 3, self.regs.x),
            0x96 => self.store_op(bus, Mode::ZpY, 4, self.regs.x),
            0x8E => self.store_op(bus, Mode::Abs, 4, self.regs.x),
            0x84 => self.store_op(bus, Mode::Zp, 3, self.regs.y),
            0x94 => self.store_op(bus, Mode::ZpX, 4, self.regs.y),
            0x8C => self.store_op(bus, Mode::Abs, 4, self.regs.y),

            // Transfers
            0xAA => self.implied(bus, |cpu| cpu.ldx(cpu.regs.a)),
            0xA8 => self.implied(bus, |cpu| cpu.ldy(cpu.regs.a)),
            0x8A => self.implied(bus, |cpu| cpu.lda(cpu.regs.x)),
            0x98 => self.implied(bus, |cpu| cpu.lda(cpu.regs.y)),
            0xBA => self.implied(bus, |cpu| cpu.ldx(cpu.regs.s)),
            0x9A => self.implied(bus, |cpu| cpu.regs.s = cpu.regs.x),

            // Stack
            0x48 => {
                self.idle_read(bus);
                self.push(bus, self.regs.a);
                3
            }
            0x08 => {
                self.idle_read(bus);
                self.push(bus, self.regs.p.pushed_by_software());
                3
            }
            0x68 => {
                self.idle_read(bus);
                let _ = bus.read(self.regs.stack_address());
                let value = self.pull(bus);
                self.lda(value);
                4
            }
            0x28 => {
                self.idle_read(bus);
                let _ = bus.read(self.regs.stack_address());
                let value = self.pull(bus);
                self.regs.p = Status::from_stack(value);
                4
            }

            // ORA / AND / EOR
            0x09 => self.read_op(bus, Mode::Imm, 2, Self::ora),
            0x05 => self.read_op(bus, Mode::Zp, 3, Self::ora),
            0x15 => self.read_op(bus, Mode::ZpX, 4, Self::ora),
            0x0D => self.read_op(bus, Mode::Abs, 4, Self::ora),
            0x1D => self.read_op(bus, Mode::AbsX, 4, Self::ora),
            0x19 => self.read_op(bus, Mode::AbsY, 4, Self::ora),
            0x01 => self.read_op(bus, Mode::IndX, 6, Self::ora),
            0x11 => self.read_op(bus, Mode::IndY, 5, Self::ora),

            0x29 => self.read_op(bus, Mode::Imm, 2, Self::and),
            0x25 => self.read_op(bus, Mode::Zp, 3, Self::and),
            0x35 => self.read_op(bus, Mode::ZpX, 4, Self::and),
            0x2D => self.read_op(bus, Mode::Abs, 4, Self::and),
            0x3D => self.read_op(bus, Mode::AbsX, 4, Self::and),
            0x39 => self.read_op(bus, Mode::AbsY, 4, Self::and),
            0x21 => self.read_op(bus, Mode::IndX, 6, Self::and),
            0x31 => self.read_op(bus, Mode::IndY, 5, Self::and),

            0x49 => self.read_op(bus, Mode::Imm, 2, Self::eor),
            0x45 => self.read_op(bus, Mode::Zp, 3, Self::eor),
            0x55 => self.read_op(bus, Mode::ZpX, 4, Self::eor),
            0x4D => self.read_op(bus, Mode::Abs, 4, Self::eor),
            0x5D => self.read_op(bus, Mode::AbsX, 4, Self::eor),
            0x59 => self.read_op(bus, Mode::AbsY, 4, Self::eor),
            0x41 => self.read_op(bus, Mode::IndX, 6, Self::eor),
            0x51 => self.read_op(bus, Mode::IndY, 5, Self::eor),

            // ADC / SBC (0xEB is the undocumented duplicate of 0xE9)
            0x69 => self.read_op(bus, Mode::Imm, 2, Self::adc),
            0x65 => self.read_op(bus, Mode::Zp, 3, Self::adc),
            0x75 => self.read_op(bus, Mode::ZpX, 4, Self::adc),
            0x6D => self.read_op(bus, Mode::Abs, 4, Self::adc),
            0x7D => self.read_op(bus, Mode::AbsX, 4, Self::adc),
            0x79 => self.read_op(bus, Mode::AbsY, 4, Self::adc),
            0x61 => self.read_op(bus, Mode::IndX, 6, Self::adc),
            0x71 => self.read_op(bus, Mode::IndY, 5, Self::adc),

            0xE9 | 0xEB => self.read_op(bus, Mode::Imm, 2, Self::sbc),
            0xE5 => self.read_op(bus, Mode::Zp, 3, Self::sbc),
            0xF5 => self.read_op(bus, Mode::ZpX, 4, Self::sbc),
            0xED => self.read_op(bus, Mode::Abs, 4, Self::sbc),
            0xFD => self.read_op(bus, Mode::AbsX, 4, Self::sbc),
            0xF9 => self.read_op(bus, Mode::AbsY, 4, Self::sbc),
            0xE1 => self.read_op(bus, Mode::IndX, 6, Self::sbc),
            0xF1 => self.read_op(bus, Mode::IndY, 5, Self::sbc),

            // Compares
            0xC9 => self.read_op(bus, Mode::Imm, 2, Self::cmp),
            0xC5 => self.read_op(bus, Mode::Zp, 3, Self::cmp),
            0xD5 => self.read_op(bus, Mode::ZpX, 4, Self::cmp),
            0xCD => self.read_op(bus, Mode::Abs, 4, Self::cmp),
            0xDD => self.read_op(bus, Mode::AbsX, 4, Self::cmp),
            0xD9 => self.read_op(bus, Mode::AbsY, 4, Self::cmp),
            0xC1 => self.read_op(bus, Mode::IndX, 6, Self::cmp),
            0xD1 => self.read_op(bus, Mode::IndY, 5, Self::cmp),

            0xE0 => self.read_op(bus, Mode::Imm, 2, Self::cpx),
            0xE4 => self.read_op(bus, Mode::Zp, 3, Self::cpx),
            0xEC => self.read_op(bus, Mode::Abs, 4, Self::cpx),
            0xC0 => self.read_op(bus, Mode::Imm, 2, Self::cpy),
            0xC4 => self.read_op(bus, Mode::Zp, 3, Self::cpy),
            0xCC => self.read_op(bus, Mode::Abs, 4, Self::cpy),

            0x24 => self.read_op(bus, Mode::Zp, 3, Self::bit),
            0x2C => self.read_op(bus, Mode::Abs, 4, Self::bit),

            // Register increments
            0xE8 => self.implied(bus, |cpu| cpu.regs.x = cpu.inc(cpu.regs.x)),
            0xC8 => self.implied(bus, |cpu| cpu.regs.y = cpu.inc(cpu.regs.y)),
            0xCA => self.implied(bus, |cpu| cpu.regs.x = cpu.dec(cpu.regs.x)),
            0x88 => self.implied(bus, |cpu| cpu.regs.y = cpu.dec(cpu.regs.y)),

            // Memory increments
            0xE6 => self.rmw_op(bus, Mode::Zp, 5, Self::inc),
            0xF6 => self.rmw_op(bus, Mode::ZpX, 6, Self::inc),
            0xEE => self.rmw_op(bus, Mode::Abs, 6, Self::inc),
            0xFE => self.rmw_op(bus, Mode::AbsX, 7, Self::inc),
            0xC6 => self.rmw_op(bus, Mode::Zp, 5, Self::dec),
            0xD6 => self.rmw_op(bus, Mode::ZpX, 6, Self::dec),
            0xCE => self.rmw_op(bus, Mode::Abs, 6, Self::dec),
            0xDE => self.rmw_op(bus, Mode::AbsX, 7, Self::dec),

            // Shifts and rotates
            0x0A => self.accumulator(bus, Self::asl),
            0x06 => self.rmw_op(bus, Mode::Zp, 5, Self::asl),
            0x16 => self.rmw_op(bus, Mode::ZpX, 6, Self::asl),
            0x0E => self.rmw_op(bus, Mode::Abs, 6, Self::asl),
            0x1E => self.rmw_op(bus, Mode::AbsX, 7, Self::asl),

            0x4A => self.accumulator(bus, Self::lsr),
            0x46 => self.rmw_op(bus, Mode::Zp, 5, Self::lsr),
            0x56 => self.rmw_op(bus, Mode::ZpX, 6, Self::lsr),
            0x4E => self.rmw_op(bus, Mode::Abs, 6, Self::lsr),
            0x5E => self.rmw_op(bus, Mode::AbsX, 7, Self::lsr),

            0x2A => self.accumulator(bus, Self::rol),
            0x26 => self.rmw_op(bus, Mode::Zp, 5, Self::rol),
            0x36 => self.rmw_op(bus, Mode::ZpX, 6, Self::rol),
            0x2E => self.rmw_op(bus, Mode::Abs, 6, Self::rol),
            0x3E => self.rmw_op(bus, Mode::AbsX, 7, Self::rol),

            0x6A => self.accumulator(bus, Self::ror),
            0x66 => self.rmw_op(bus, Mode::Zp, 5, Self::ror),
            0x76 => self.rmw_op(bus, Mode::ZpX, 6, Self::ror),
            0x6E => self.rmw_op(bus, Mode::Abs, 6, Self::ror),
            0x7E => self.rmw_op(bus, Mode::AbsX, 7, Self::ror),

            // Jumps and calls
            0x4C => {
                self.regs.pc = self.fetch_word(bus);
                3
            }
            0x6C => {
                let pointer = self.fetch_word(bus);
                self.regs.pc = Self::read_word_same_page(bus, pointer);
                5
            }
            0x20 => {
                // The pushed return address is the last byte of the JSR.
                let low = self.fetch(bus);
                let _ = bus.read(self.regs.stack_address());
                self.push_word(bus, self.regs.pc);
                let high = self.fetch(bus);
                self.regs.pc = u16::from_le_bytes([low, high]);
                6
            }
            0x60 => {
                self.idle_read(bus);
                let _ = bus.read(self.regs.stack_address());
                self.regs.pc = self.pull_word(bus);
                self.idle_read(bus);
                self.regs.pc = self.regs.pc.wrapping_add(1);
                6
            }
            0x40 => {
                self.idle_read(bus);
                let _ = bus.read(self.regs.stack_address());
                let status = self.pull(bus);
                self.regs.p = Status::from_stack(status);
                self.regs.pc = self.pull_word(bus);
                6
            }
            0x00 => {
                // BRK skips a padding byte.
                let _ = self.fetch(bus);
                self.push_word(bus, self.regs.pc);
                self.push(bus, self.regs.p.pushed_by_software());
                self.regs.p.set_if(flags::I, true);
                self.regs.pc = Self::read_word(bus, 0xFFFE);
                7
            }

            // Branches
            0x10 => self.branch(bus, !self.regs.p.is_set(flags::N)),
            0x30 => self.branch(bus, self.regs.p.is_set(flags::N)),
            0x50 => self.branch(bus, !self.regs.p.is_set(flags::V)),
            0x70 => self.branch(bus, self.regs.p.is_set(flags::V)),
            0x90 => self.branch(bus, !self.regs.p.is_set(flags::C)),
            0xB0 => self.branch(bus, self.regs.p.is_set(flags::C)),
            0xD0 => self.branch(bus, !self.regs.p.is_set(flags::Z)),
            0xF0 => self.branch(bus, self.regs.p.is_set(flags::Z)),

            // Flag operations
            0x18 => self.set_flag(bus, flags::C, false),
            0x38 => self.set_flag(bus, flags::C, true),
            0x58 => self.set_flag(bus, flags::I, false),
            0x78 => self.set_flag(bus, flags::I, true),
            0xD8 => self.set_flag(bus, flags::D, false),
            0xF8 => self.set_flag(bus, flags::D, true),
            0xB8 => self.set_flag(bus, flags::V, false),

            // NOPs, documented and not. The multi-byte forms still read
            // their operand.
            0xEA | 0x1A | 0x3A | 0x5A | 0x7A | 0xDA | 0xFA => self.implied(bus, |_| {}),
            0x80 | 0x82 | 0x89 | 0xC2 | 0xE2 => self.read_op(bus, Mode::Imm, 2, |_, _| {}),
            0x04 | 0x44 | 0x64 => self.read_op(bus, Mode::Zp, 3, |_, _| {}),
            0x14 | 0x34 | 0x54 | 0x74 | 0xD4 | 0xF4 => {
                self.read_op(bus, Mode::ZpX, 4, |_, _| {})
            }
            0x0C => self.read_op(bus, Mode::Abs, 4, |_, _| {}),
            0x1C | 0x3C | 0x5C | 0x7C | 0xDC | 0xFC => {
                self.read_op(bus, Mode::AbsX, 4, |_, _| {})
            }

            // LAX
            0xA7 => self.read_op(bus, Mode::Zp, 3, Self::lax),
            0xB7 => self.read_op(bus, Mode::ZpY, 4, Self::lax),
            0xAF => self.read_op(bus, Mode::Abs, 4, Self::lax),
            0xBF => self.read_op(bus, Mode::AbsY, 4, Self::lax),
            0xA3 => self.read_op(bus, Mode::IndX, 6, Self::lax),
            0xB3 => self.read_op(bus, Mode::IndY, 5, Self::lax),

            // SAX
            0x87 => self.store_op(bus, Mode::Zp, 3, self.regs.a & self.regs.x),
            0x97 => self.store_op(bus, Mode::ZpY, 4, self.regs.a & self.regs.x),
            0x8F => self.store_op(bus, Mode::Abs, 4, self.regs.a & self.regs.x),
            0x83 => self.store_op(bus, Mode::IndX, 6, self.regs.a & self.regs.x),

            // Immediate-only combinations
            0x0B | 0x2B => self.read_op(bus, Mode::Imm, 2, Self::anc),
            0x4B => self.read_op(bus, Mode::Imm, 2, Self::alr),
            0x6B => self.read_op(bus, Mode::Imm, 2, Self::arr),
            0xCB => self.read_op(bus, Mode::Imm, 2, Self::sbx),

            // Read-modify-write combinations
            0x07 => self.rmw_op(bus, Mode::Zp, 5, Self::slo),
            0x17 => self.rmw_op(bus, Mode::ZpX, 6, Self::slo),
            0x0F => self.rmw_op(bus, Mode::Abs, 6, Self::slo),
            0x1F => self.rmw_op(bus, Mode::AbsX, 7, Self::slo),
            0x1B => self.rmw_op(bus, Mode::AbsY, 7, Self::slo),
            0x03 => self.rmw_op(bus, Mode::IndX, 8, Self::slo),
            0x13 => self.rmw_op(bus, Mode::IndY, 8, Self::slo),

            0x27 => self.rmw_op(bus, Mode::Zp, 5, Self::rla),
            0x37 => self.rmw_op(bus, Mode::ZpX, 6, Self::rla),
            0x2F => self.rmw_op(bus, Mode::Abs, 6, Self::rla),
            0x3F => self.rmw_op(bus, Mode::AbsX, 7, Self::rla),
            0x3B => self.rmw_op(bus, Mode::AbsY, 7, Self::rla),
            0x23 => self.rmw_op(bus, Mode::IndX, 8, Self::rla),
            0x33 => self.rmw_op(bus, Mode::IndY, 8, Self::rla),

            0x47 => self.rmw_op(bus, Mode::Zp, 5, Self::sre),
            0x57 => self.rmw_op(bus, Mode::ZpX, 6, Self::sre),
            0x4F => self.rmw_op(bus, Mode::Abs, 6, Self::sre),
            0x5F => self.rmw_op(bus, Mode::AbsX, 7, Self::sre),
            0x5B => self.rmw_op(bus, Mode::AbsY, 7, Self::sre),
            0x43 => self.rmw_op(bus, Mode::IndX, 8, Self::sre),
            0x53 => self.rmw_op(bus, Mode::IndY, 8, Self::sre),

            0x67 => self.rmw_op(bus, Mode::Zp, 5, Self::rra),
            0x77 => self.rmw_op(bus, Mode::ZpX, 6, Self::rra),
            0x6F => self.rmw_op(bus, Mode::Abs, 6, Self::rra),
            0x7F => self.rmw_op(bus, Mode::AbsX, 7, Self::rra),
            0x7B => self.rmw_op(bus, Mode::AbsY, 7, Self::rra),
            0x63 => self.rmw_op(bus, Mode::IndX, 8, Self::rra),
            0x73 => self.rmw_op(bus, Mode::IndY, 8, Self::rra),

            0xC7 => self.rmw_op(bus, Mode::Zp, 5, Self::dcp),
            0xD7 => self.rmw_op(bus, Mode::ZpX, 6, Self::dcp),
            0xCF => self.rmw_op(bus, Mode::Abs, 6, Self::dcp),
            0xDF => self.rmw_op(bus, Mode::AbsX, 7, Self::dcp),
            0xDB => self.rmw_op(bus, Mode::AbsY, 7, Self::dcp),
            0xC3 => self.rmw_op(bus, Mode::IndX, 8, Self::dcp),
            0xD3 => self.rmw_op(bus, Mode::IndY, 8, Self::dcp),

            0xE7 => self.rmw_op(bus, Mode::Zp, 5, Self::isc),
            0xF7 => self.rmw_op(bus, Mode::ZpX, 6, Self::isc),
            0xEF => self.rmw_op(bus, Mode::Abs, 6, Self::isc),
            0xFF => self.rmw_op(bus, Mode::AbsX, 7, Self::isc),
            0xFB => self.rmw_op(bus, Mode::AbsY, 7, Self::isc),
            0xE3 => self.rmw_op(bus, Mode::IndX, 8, Self::isc),
            0xF3 => self.rmw_op(bus, Mode::IndY, 8, Self::isc),

            // JAM, plus the unstable opcodes whose result depends on the
            // individual chip (ANE, SHA, TAS, SHY, SHX, LXA, LAS).
            _ => {
                debug_assert!(
                    JAM.contains(&opcode)
                        || matches!(opcode, 0x8B | 0x93 | 0x9B | 0x9C | 0x9E | 0x9F | 0xAB | 0xBB)
                );
                self.jam(opcode)
            }
        }
    }
}
