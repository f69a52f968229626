//! Processor status register (P), laid out NV-BDIZC.

use std::fmt;

/// Carry.
pub const C: u8 = 0x01;
/// Zero.
pub const Z: u8 = 0x02;
/// IRQ disable.
pub const I: u8 = 0x04;
/// Decimal mode: ADC and SBC work in BCD.
pub const D: u8 = 0x08;
/// Break. Only exists in the copy of P pushed to the stack.
pub const B: u8 = 0x10;
/// Unused, reads back as 1.
pub const U: u8 = 0x20;
/// Overflow.
pub const V: u8 = 0x40;
/// Negative.
pub const N: u8 = 0x80;

/// The status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    /// Power-on value: I and U set.
    pub const RESET: Self = Self(U | I);

    /// Status as restored by PLP/RTI: B dropped, U forced.
    #[must_use]
    pub const fn from_stack(value: u8) -> Self {
        Self((value | U) & !B)
    }

    /// Byte pushed by BRK and PHP.
    #[must_use]
    pub const fn pushed_by_software(self) -> u8 {
        self.0 | U | B
    }

    /// Byte pushed by NMI and IRQ entry.
    #[must_use]
    pub const fn pushed_by_interrupt(self) -> u8 {
        (self.0 | U) & !B
    }

    #[must_use]
    pub const fn is_set(self, flag: u8) -> bool {
        self.0 & flag != 0
    }

    pub fn set_if(&mut self, flag: u8, condition: bool) {
        if condition {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }

    /// Set N and Z from a result byte.
    pub fn update_nz(&mut self, value: u8) {
        self.set_if(N, value & 0x80 != 0);
        self.set_if(Z, value == 0);
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::RESET
    }
}

impl fmt::Display for Status {
    /// `NV-BDIZC`, upper case when set.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const NAMES: [(u8, char); 8] = [
            (N, 'N'),
            (V, 'V'),
            (U, '-'),
            (B, 'B'),
            (D, 'D'),
            (I, 'I'),
            (Z, 'Z'),
            (C, 'C'),
        ];
        for (flag, name) in NAMES {
            let shown = if self.is_set(flag) || flag == U {
                name
            } else {
                name.to_ascii_lowercase()
            };
            write!(f, "{shown}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_images() {
        let p = Status(C | Z);
        assert_eq!(p.pushed_by_software(), C | Z | U | B);
        assert_eq!(p.pushed_by_interrupt(), C | Z | U);
        assert_eq!(Status::from_stack(0xFF), Status(0xFF & !B));
    }

    #[test]
    fn display() {
        assert_eq!(Status(N | U | I | C).to_string(), "Nv-bdIzC");
    }
}
