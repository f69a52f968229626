//! Machine configuration: model selection, timing and memory layout.

use std::fmt;

use atari_cartridge::{MachineFamily, SchemeId};
use serde::{Deserialize, Serialize};

/// Console model and video standard.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MachineKind {
    /// NTSC 2600: 262 lines, 1,193,182 Hz CPU.
    #[default]
    Atari2600Ntsc,
    /// PAL 2600: 312 lines, 1,182,298 Hz CPU.
    Atari2600Pal,
    /// NTSC 7800: 263 lines, 1,789,773 Hz CPU.
    Atari7800Ntsc,
    /// PAL 7800: 313 lines, 1,773,447 Hz CPU.
    Atari7800Pal,
}

/// One RAM chip and the ranges it answers on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamBlock {
    pub name: &'static str,
    /// Bytes; a power of two.
    pub size: usize,
    /// `(base, size)` pairs, the first one being the chip's home range.
    pub mappings: &'static [(u16, u32)],
}

/// RIOT RAM, with the stack page mirror.
const RAM_2600: &[RamBlock] = &[RamBlock {
    name: "riot-ram",
    size: 0x80,
    mappings: &[(0x0080, 0x80), (0x0180, 0x80)],
}];

/// Two 2K chips; the second also shows through zero page and the stack page.
const RAM_7800: &[RamBlock] = &[
    RamBlock {
        name: "ram-1800",
        size: 0x800,
        mappings: &[(0x1800, 0x800)],
    },
    RamBlock {
        name: "ram-2000",
        size: 0x800,
        mappings: &[(0x2000, 0x800), (0x0040, 0xC0), (0x0140, 0xC0)],
    },
];

impl MachineKind {
    #[must_use]
    pub const fn family(self) -> MachineFamily {
        match self {
            Self::Atari2600Ntsc | Self::Atari2600Pal => MachineFamily::Atari2600,
            Self::Atari7800Ntsc | Self::Atari7800Pal => MachineFamily::Atari7800,
        }
    }

    /// The 2600's 6507 only brings out 13 address lines.
    #[must_use]
    pub const fn address_bits(self) -> u32 {
        match self.family() {
            MachineFamily::Atari2600 => 13,
            MachineFamily::Atari7800 => 16,
        }
    }

    /// 64-byte pages: the finest granularity either memory map needs.
    #[must_use]
    pub const fn page_bits(self) -> u32 {
        6
    }

    /// Host units per CPU cycle. The 7800 budgets in 7.16 MHz ticks.
    #[must_use]
    pub const fn run_budget_multiple(self) -> u32 {
        match self.family() {
            MachineFamily::Atari2600 => 1,
            MachineFamily::Atari7800 => 4,
        }
    }

    #[must_use]
    pub const fn reset_vector(self) -> u16 {
        0xFFFC
    }

    /// CPU frequency in Hz.
    #[must_use]
    pub const fn cpu_hz(self) -> u32 {
        match self {
            Self::Atari2600Ntsc => 1_193_182,
            Self::Atari2600Pal => 1_182_298,
            Self::Atari7800Ntsc => 1_789_773,
            Self::Atari7800Pal => 1_773_447,
        }
    }

    #[must_use]
    pub const fn scanlines_per_frame(self) -> u16 {
        match self {
            Self::Atari2600Ntsc => 262,
            Self::Atari2600Pal => 312,
            Self::Atari7800Ntsc => 263,
            Self::Atari7800Pal => 313,
        }
    }

    /// Run budget for one scanline, in host units: 76 CPU cycles on the
    /// 2600, 454 MARIA ticks on the 7800.
    #[must_use]
    pub const fn scanline_budget(self) -> i32 {
        match self.family() {
            MachineFamily::Atari2600 => 76,
            MachineFamily::Atari7800 => 454,
        }
    }

    #[must_use]
    pub const fn ram_layout(self) -> &'static [RamBlock] {
        match self.family() {
            MachineFamily::Atari2600 => RAM_2600,
            MachineFamily::Atari7800 => RAM_7800,
        }
    }
}

impl fmt::Display for MachineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Atari2600Ntsc => "Atari 2600 (NTSC)",
            Self::Atari2600Pal => "Atari 2600 (PAL)",
            Self::Atari7800Ntsc => "Atari 7800 (NTSC)",
            Self::Atari7800Pal => "Atari 7800 (PAL)",
        })
    }
}

/// Configuration for constructing a [`Machine`](crate::Machine).
pub struct MachineConfig {
    pub kind: MachineKind,
    /// Cartridge image, optionally with an A78 header.
    pub rom: Vec<u8>,
    /// Force a scheme instead of detecting one from the image size.
    pub scheme: Option<SchemeId>,
}
