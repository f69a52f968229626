//! Arithmetic, logic and shift operations, including the stable
//! undocumented combinations.

use crate::Mos6502;
use crate::flags::{C, D, N, V, Z};

impl Mos6502 {
    pub(crate) fn lda(&mut self, value: u8) {
        self.regs.a = value;
        self.regs.p.update_nz(value);
    }

    pub(crate) fn ldx(&mut self, value: u8) {
        self.regs.x = value;
        self.regs.p.update_nz(value);
    }

    pub(crate) fn ldy(&mut self, value: u8) {
        self.regs.y = value;
        self.regs.p.update_nz(value);
    }

    pub(crate) fn ora(&mut self, value: u8) {
        self.lda(self.regs.a | value);
    }

    pub(crate) fn and(&mut self, value: u8) {
        self.lda(self.regs.a & value);
    }

    pub(crate) fn eor(&mut self, value: u8) {
        self.lda(self.regs.a ^ value);
    }

    pub(crate) fn bit(&mut self, value: u8) {
        self.regs.p.set_if(Z, self.regs.a & value == 0);
        self.regs.p.set_if(N, value & 0x80 != 0);
        self.regs.p.set_if(V, value & 0x40 != 0);
    }

    pub(crate) fn compare(&mut self, register: u8, value: u8) {
        self.regs.p.set_if(C, register >= value);
        self.regs.p.update_nz(register.wrapping_sub(value));
    }

    pub(crate) fn cmp(&mut self, value: u8) {
        self.compare(self.regs.a, value);
    }

    pub(crate) fn cpx(&mut self, value: u8) {
        self.compare(self.regs.x, value);
    }

    pub(crate) fn cpy(&mut self, value: u8) {
        self.compare(self.regs.y, value);
    }

    /// ADC. In decimal mode Z comes from the binary sum, while N and V come
    /// from the sum after the low-nibble fix-up but before the high-nibble
    /// one, as on the NMOS part.
    pub(crate) fn adc(&mut self, value: u8) {
        let a = u16::from(self.regs.a);
        let operand = u16::from(value);
        let carry = u16::from(self.regs.p.is_set(C));
        let binary = a + operand + carry;

        if !self.regs.p.is_set(D) {
            let result = binary as u8;
            self.regs.p.set_if(C, binary > 0xFF);
            self.regs
                .p
                .set_if(V, (a ^ binary) & (operand ^ binary) & 0x80 != 0);
            self.lda(result);
            return;
        }

        let mut low = (a & 0x0F) + (operand & 0x0F) + carry;
        if low > 0x09 {
            low += 0x06;
        }
        let mut high = (a >> 4) + (operand >> 4) + u16::from(low > 0x0F);
        let intermediate = (high << 4) | (low & 0x0F);

        self.regs.p.set_if(Z, binary & 0xFF == 0);
        self.regs.p.set_if(N, intermediate & 0x80 != 0);
        self.regs
            .p
            .set_if(V, !(a ^ operand) & (a ^ intermediate) & 0x80 != 0);

        if high > 0x09 {
            high += 0x06;
        }
        self.regs.p.set_if(C, high > 0x0F);
        self.regs.a = ((high << 4) | (low & 0x0F)) as u8;
    }

    /// SBC. Flags always follow the binary subtraction; decimal mode only
    /// changes the value left in A.
    pub(crate) fn sbc(&mut self, value: u8) {
        let a = i16::from(self.regs.a);
        let operand = i16::from(value);
        let borrow = i16::from(!self.regs.p.is_set(C));
        let binary = a - operand - borrow;
        let result = binary as u8;

        self.regs.p.set_if(C, binary >= 0);
        self.regs
            .p
            .set_if(V, (self.regs.a ^ value) & (self.regs.a ^ result) & 0x80 != 0);
        self.regs.p.update_nz(result);

        if self.regs.p.is_set(D) {
            let mut low = (a & 0x0F) - (operand & 0x0F) - borrow;
            if low < 0 {
                low = ((low - 0x06) & 0x0F) - 0x10;
            }
            let mut full = (a & 0xF0) - (operand & 0xF0) + low;
            if full < 0 {
                full -= 0x60;
            }
            self.regs.a = full as u8;
        } else {
            self.regs.a = result;
        }
    }

    pub(crate) fn asl(&mut self, value: u8) -> u8 {
        self.regs.p.set_if(C, value & 0x80 != 0);
        let result = value << 1;
        self.regs.p.update_nz(result);
        result
    }

    pub(crate) fn lsr(&mut self, value: u8) -> u8 {
        self.regs.p.set_if(C, value & 0x01 != 0);
        let result = value >> 1;
        self.regs.p.update_nz(result);
        result
    }

    pub(crate) fn rol(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.regs.p.is_set(C));
        self.regs.p.set_if(C, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.regs.p.update_nz(result);
        result
    }

    pub(crate) fn ror(&mut self, value: u8) -> u8 {
        let carry_in = u8::from(self.regs.p.is_set(C)) << 7;
        self.regs.p.set_if(C, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.regs.p.update_nz(result);
        result
    }

    pub(crate) fn inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.regs.p.update_nz(result);
        result
    }

    pub(crate) fn dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.regs.p.update_nz(result);
        result
    }

    // Undocumented opcodes. Each is the side-by-side execution of two
    // documented operations that share the decode line.

    /// LAX: LDA and LDX at once.
    pub(crate) fn lax(&mut self, value: u8) {
        self.lda(value);
        self.regs.x = value;
    }

    /// SLO: ASL memory, then ORA.
    pub(crate) fn slo(&mut self, value: u8) -> u8 {
        let result = self.asl(value);
        self.ora(result);
        result
    }

    /// RLA: ROL memory, then AND.
    pub(crate) fn rla(&mut self, value: u8) -> u8 {
        let result = self.rol(value);
        self.and(result);
        result
    }

    /// SRE: LSR memory, then EOR.
    pub(crate) fn sre(&mut self, value: u8) -> u8 {
        let result = self.lsr(value);
        self.eor(result);
        result
    }

    /// RRA: ROR memory, then ADC with the rotated-out carry.
    pub(crate) fn rra(&mut self, value: u8) -> u8 {
        let result = self.ror(value);
        self.adc(result);
        result
    }

    /// DCP: DEC memory, then CMP.
    pub(crate) fn dcp(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.cmp(result);
        result
    }

    /// ISC: INC memory, then SBC.
    pub(crate) fn isc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.sbc(result);
        result
    }

    /// ANC: AND, then copy N into C.
    pub(crate) fn anc(&mut self, value: u8) {
        self.and(value);
        self.regs.p.set_if(C, self.regs.a & 0x80 != 0);
    }

    /// ALR: AND, then LSR A.
    pub(crate) fn alr(&mut self, value: u8) {
        let masked = self.regs.a & value;
        self.regs.a = self.lsr(masked);
    }

    /// ARR: AND, then ROR A, with C and V taken from bits 6 and 5 of the
    /// result. Decimal mode adds a BCD fix-up of each nibble.
    pub(crate) fn arr(&mut self, value: u8) {
        let masked = self.regs.a & value;
        let carry_in = u8::from(self.regs.p.is_set(C)) << 7;
        let result = (masked >> 1) | carry_in;

        if !self.regs.p.is_set(D) {
            self.regs.p.update_nz(result);
            self.regs.p.set_if(C, result & 0x40 != 0);
            self.regs
                .p
                .set_if(V, ((result >> 6) ^ (result >> 5)) & 0x01 != 0);
            self.regs.a = result;
            return;
        }

        self.regs.p.update_nz(result);
        self.regs.p.set_if(V, (masked ^ result) & 0x40 != 0);

        let mut adjusted = result;
        if (masked & 0x0F) + (masked & 0x01) > 0x05 {
            adjusted = (adjusted & 0xF0) | (adjusted.wrapping_add(0x06) & 0x0F);
        }
        let high_fixup = u16::from(masked & 0xF0) + u16::from(masked & 0x10) > 0x50;
        if high_fixup {
            adjusted = adjusted.wrapping_add(0x60);
        }
        self.regs.p.set_if(C, high_fixup);
        self.regs.a = adjusted;
    }

    /// SBX: X = (A & X) - operand, flags as CMP, no borrow in.
    pub(crate) fn sbx(&mut self, value: u8) {
        let masked = self.regs.a & self.regs.x;
        self.regs.p.set_if(C, masked >= value);
        self.regs.x = masked.wrapping_sub(value);
        self.regs.p.update_nz(self.regs.x);
    }
}

#[cfg(test)]
mod tests {
    use crate::Mos6502;
    use crate::flags::{C, D, N, V, Z};

    fn cpu_with(a: u8, flags: u8) -> Mos6502 {
        let mut cpu = Mos6502::new();
        cpu.regs.a = a;
        cpu.regs.p.0 = flags | crate::flags::U;
        cpu
    }

    #[test]
    fn binary_adc_sets_overflow_on_sign_change() {
        let mut cpu = cpu_with(0x50, 0);
        cpu.adc(0x50);
        assert_eq!(cpu.regs.a, 0xA0);
        assert!(cpu.regs.p.is_set(V));
        assert!(cpu.regs.p.is_set(N));
        assert!(!cpu.regs.p.is_set(C));
    }

    #[test]
    fn decimal_adc_carries_into_hundreds() {
        let mut cpu = cpu_with(0x58, D | C);
        cpu.adc(0x46);
        assert_eq!(cpu.regs.a, 0x05);
        assert!(cpu.regs.p.is_set(C));
    }

    #[test]
    fn decimal_adc_zero_flag_follows_binary_sum() {
        // 99 + 01 = 00 with carry in BCD, but the binary sum is $9A.
        let mut cpu = cpu_with(0x99, D);
        cpu.adc(0x01);
        assert_eq!(cpu.regs.a, 0x00);
        assert!(cpu.regs.p.is_set(C));
        assert!(!cpu.regs.p.is_set(Z));
    }

    #[test]
    fn decimal_sbc() {
        let mut cpu = cpu_with(0x46, D | C);
        cpu.sbc(0x12);
        assert_eq!(cpu.regs.a, 0x34);
        assert!(cpu.regs.p.is_set(C));

        let mut cpu = cpu_with(0x12, D | C);
        cpu.sbc(0x21);
        assert_eq!(cpu.regs.a, 0x91);
        assert!(!cpu.regs.p.is_set(C));
    }

    #[test]
    fn sbx_ignores_carry_in() {
        let mut cpu = cpu_with(0xFF, 0);
        cpu.regs.x = 0x0F;
        cpu.sbx(0x05);
        assert_eq!(cpu.regs.x, 0x0A);
        assert!(cpu.regs.p.is_set(C));
    }

    #[test]
    fn arr_binary_flags() {
        let mut cpu = cpu_with(0xFF, C);
        cpu.arr(0xC0);
        assert_eq!(cpu.regs.a, 0xE0);
        assert!(cpu.regs.p.is_set(C), "C is bit 6 of the result");
        assert!(!cpu.regs.p.is_set(V), "V is bit 6 xor bit 5");
        assert!(cpu.regs.p.is_set(N));
    }

    #[test]
    fn anc_copies_negative_into_carry() {
        let mut cpu = cpu_with(0x80, 0);
        cpu.anc(0xFF);
        assert!(cpu.regs.p.is_set(C));
        assert!(cpu.regs.p.is_set(N));
    }
}
