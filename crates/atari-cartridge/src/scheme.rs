//! Bank-switching schemes as data.
//!
//! Every scheme is a [`Scheme`] table: where the cartridge sits on the bus,
//! how its address range is cut into windows, which bank register (or fixed
//! bank) feeds each window, the optional RAM ports, and the triggers that
//! rewrite the bank registers. One generic device interprets all of them.

use std::fmt;

/// Console family a scheme belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineFamily {
    Atari2600,
    Atari7800,
}

impl fmt::Display for MachineFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Atari2600 => "Atari 2600",
            Self::Atari7800 => "Atari 7800",
        })
    }
}

/// Identifies a scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemeId {
    /// 2K image mirrored twice across the 4K slot.
    A2K,
    /// Plain 4K.
    A4K,
    /// Atari 8K: two 4K banks, strobes at $1FF8/$1FF9.
    F8,
    /// F8 plus 128 bytes of Superchip RAM.
    F8Sc,
    /// Atari 16K: four banks, strobes at $1FF6-$1FF9.
    F6,
    F6Sc,
    /// Atari 32K: eight banks, strobes at $1FF4-$1FFB.
    F4,
    F4Sc,
    /// Parker Brothers: three switchable 1K windows and a fixed one.
    E0,
    /// Tigervision: the bank is the value written to $00-$3F.
    Tigervision3F,
    /// CBS RAM Plus: three 4K banks and 256 bytes of RAM.
    Fa,
    /// 7800 flat images.
    A7808,
    A7816,
    A7832,
    A7848,
    /// 7800 SuperGame: 16K window at $8000 switched by writes there.
    SuperGame,
    /// SuperGame with 16K of RAM at $4000.
    SuperGameRam,
}

impl SchemeId {
    pub const ALL: [Self; 17] = [
        Self::A2K,
        Self::A4K,
        Self::F8,
        Self::F8Sc,
        Self::F6,
        Self::F6Sc,
        Self::F4,
        Self::F4Sc,
        Self::E0,
        Self::Tigervision3F,
        Self::Fa,
        Self::A7808,
        Self::A7816,
        Self::A7832,
        Self::A7848,
        Self::SuperGame,
        Self::SuperGameRam,
    ];

    /// Short tag as used by ROM databases (`"F8SC"`, `"78SG"`, ...).
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::A2K => "2K",
            Self::A4K => "4K",
            Self::F8 => "F8",
            Self::F8Sc => "F8SC",
            Self::F6 => "F6",
            Self::F6Sc => "F6SC",
            Self::F4 => "F4",
            Self::F4Sc => "F4SC",
            Self::E0 => "E0",
            Self::Tigervision3F => "3F",
            Self::Fa => "FA",
            Self::A7808 => "7808",
            Self::A7816 => "7816",
            Self::A7832 => "7832",
            Self::A7848 => "7848",
            Self::SuperGame => "78SG",
            Self::SuperGameRam => "78SGR",
        }
    }

    /// Look a scheme up by tag, ignoring case.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|id| id.tag().eq_ignore_ascii_case(tag))
    }

    #[must_use]
    pub fn scheme(self) -> &'static Scheme {
        match self {
            Self::A2K => &A2K,
            Self::A4K => &A4K,
            Self::F8 => &F8,
            Self::F8Sc => &F8SC,
            Self::F6 => &F6,
            Self::F6Sc => &F6SC,
            Self::F4 => &F4,
            Self::F4Sc => &F4SC,
            Self::E0 => &E0,
            Self::Tigervision3F => &TIGERVISION_3F,
            Self::Fa => &FA,
            Self::A7808 => &A7808,
            Self::A7816 => &A7816,
            Self::A7832 => &A7832,
            Self::A7848 => &A7848,
            Self::SuperGame => &SUPER_GAME,
            Self::SuperGameRam => &SUPER_GAME_RAM,
        }
    }
}

impl fmt::Display for SchemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A bank number, counted from either end of the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    Index(u16),
    /// `FromLast(0)` is the last bank, `FromLast(1)` the one before it.
    FromLast(u16),
}

impl Bank {
    /// Resolve against an image of `bank_count` banks.
    #[must_use]
    pub const fn resolve(self, bank_count: u16) -> u16 {
        match self {
            Self::Index(bank) => bank,
            Self::FromLast(back) => bank_count.saturating_sub(1 + back),
        }
    }
}

/// What feeds one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// The bank held in bank register `n`.
    Register(usize),
    /// Hard-wired.
    Fixed(Bank),
}

/// Cartridge RAM: separate read and write ports (cartridge-relative byte
/// ranges) over the same storage. They may coincide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RamWindow {
    pub size: usize,
    pub write_port: u16,
    pub read_port: u16,
}

impl RamWindow {
    fn port_index(&self, port: u16, offset: u16) -> Option<usize> {
        let index = usize::from(offset.checked_sub(port)?);
        (index < self.size).then_some(index)
    }

    /// RAM index when `offset` hits the read port.
    #[must_use]
    pub fn read_index(&self, offset: u16) -> Option<usize> {
        self.port_index(self.read_port, offset)
    }

    /// RAM index when `offset` hits the write port.
    #[must_use]
    pub fn write_index(&self, offset: u16) -> Option<usize> {
        self.port_index(self.write_port, offset)
    }
}

/// Which accesses fire a trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Read,
    Write,
    Any,
}

impl AccessKind {
    const fn fires_on(self, access: AccessKind) -> bool {
        matches!(
            (self, access),
            (Self::Any, _) | (Self::Read, Self::Read) | (Self::Write, Self::Write)
        )
    }
}

/// How a trigger picks the new bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    /// An access to exactly `address` selects `bank`.
    Equality { address: u16, bank: u16 },
    /// An access in `first..=last` selects bank `address - first`.
    Range { first: u16, last: u16 },
    /// A write in `first..=last` selects bank `value % bank_count`.
    ValueDerived { first: u16, last: u16 },
}

/// One row of a scheme's trigger table. Addresses are bus addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub kind: TriggerKind,
    pub register: usize,
    pub on: AccessKind,
}

impl Trigger {
    /// New bank for bank register `self.register`, if this access fires.
    #[must_use]
    pub fn fire(&self, address: u16, access: AccessKind, value: Option<u8>, bank_count: u16) -> Option<u16> {
        if !self.on.fires_on(access) {
            return None;
        }
        match self.kind {
            TriggerKind::Equality { address: hotspot, bank } => (address == hotspot).then_some(bank),
            TriggerKind::Range { first, last } => {
                (first..=last).contains(&address).then(|| address - first)
            }
            TriggerKind::ValueDerived { first, last } => {
                let value = value?;
                (first..=last)
                    .contains(&address)
                    .then(|| u16::from(value) % bank_count.max(1))
            }
        }
    }
}

/// A complete bank-switching scheme.
#[derive(Debug, PartialEq, Eq)]
pub struct Scheme {
    pub id: SchemeId,
    pub family: MachineFamily,
    /// Bus address of the first cartridge byte.
    pub base: u16,
    /// Bytes of address space the cartridge occupies.
    pub size: u32,
    /// log2 of the window size.
    pub window_bits: u32,
    /// One entry per window, in address order from `base`.
    pub windows: &'static [Window],
    /// Power-on value of each bank register.
    pub defaults: &'static [Bank],
    pub ram: Option<RamWindow>,
    pub triggers: &'static [Trigger],
    /// The triggers sit outside the cartridge's own address range.
    pub snoops: bool,
    /// Nominal image size; shorter images are padded up to it.
    pub rom_size: usize,
}

impl Scheme {
    #[must_use]
    pub const fn window_size(&self) -> usize {
        1 << self.window_bits
    }
}

const fn hotspot(address: u16, bank: u16) -> Trigger {
    Trigger {
        kind: TriggerKind::Equality { address, bank },
        register: 0,
        on: AccessKind::Any,
    }
}

const fn hotspots(first: u16, last: u16, register: usize) -> Trigger {
    Trigger {
        kind: TriggerKind::Range { first, last },
        register,
        on: AccessKind::Any,
    }
}

const fn value_writes(first: u16, last: u16) -> Trigger {
    Trigger {
        kind: TriggerKind::ValueDerived { first, last },
        register: 0,
        on: AccessKind::Write,
    }
}

const SINGLE_WINDOW: &[Window] = &[Window::Register(0)];

/// Superchip: 128 bytes, write at $1000, read at $1080.
const SUPERCHIP: Option<RamWindow> = Some(RamWindow {
    size: 128,
    write_port: 0x0000,
    read_port: 0x0080,
});

const fn atari_2600(
    id: SchemeId,
    window_bits: u32,
    windows: &'static [Window],
    defaults: &'static [Bank],
    ram: Option<RamWindow>,
    triggers: &'static [Trigger],
    rom_size: usize,
) -> Scheme {
    Scheme {
        id,
        family: MachineFamily::Atari2600,
        base: 0x1000,
        size: 0x1000,
        window_bits,
        windows,
        defaults,
        ram,
        triggers,
        snoops: false,
        rom_size,
    }
}

const fn flat_7800(id: SchemeId, rom_size: usize, windows: &'static [Window]) -> Scheme {
    Scheme {
        id,
        family: MachineFamily::Atari7800,
        base: (0x10000 - rom_size) as u16,
        size: rom_size as u32,
        window_bits: if rom_size == 0x2000 { 13 } else { 14 },
        windows,
        defaults: &[],
        ram: None,
        triggers: &[],
        snoops: false,
        rom_size,
    }
}

pub static A2K: Scheme = atari_2600(
    SchemeId::A2K,
    11,
    &[Window::Fixed(Bank::Index(0)), Window::Fixed(Bank::Index(0))],
    &[],
    None,
    &[],
    0x0800,
);

pub static A4K: Scheme = atari_2600(
    SchemeId::A4K,
    12,
    &[Window::Fixed(Bank::Index(0))],
    &[],
    None,
    &[],
    0x1000,
);

const F8_TRIGGERS: &[Trigger] = &[hotspot(0x1FF8, 0), hotspot(0x1FF9, 1)];

pub static F8: Scheme = atari_2600(
    SchemeId::F8,
    12,
    SINGLE_WINDOW,
    &[Bank::Index(1)],
    None,
    F8_TRIGGERS,
    0x2000,
);

pub static F8SC: Scheme = atari_2600(
    SchemeId::F8Sc,
    12,
    SINGLE_WINDOW,
    &[Bank::Index(1)],
    SUPERCHIP,
    F8_TRIGGERS,
    0x2000,
);

const F6_TRIGGERS: &[Trigger] = &[hotspots(0x1FF6, 0x1FF9, 0)];

pub static F6: Scheme = atari_2600(
    SchemeId::F6,
    12,
    SINGLE_WINDOW,
    &[Bank::Index(0)],
    None,
    F6_TRIGGERS,
    0x4000,
);

pub static F6SC: Scheme = atari_2600(
    SchemeId::F6Sc,
    12,
    SINGLE_WINDOW,
    &[Bank::Index(0)],
    SUPERCHIP,
    F6_TRIGGERS,
    0x4000,
);

const F4_TRIGGERS: &[Trigger] = &[hotspots(0x1FF4, 0x1FFB, 0)];

pub static F4: Scheme = atari_2600(
    SchemeId::F4,
    12,
    SINGLE_WINDOW,
    &[Bank::Index(0)],
    None,
    F4_TRIGGERS,
    0x8000,
);

pub static F4SC: Scheme = atari_2600(
    SchemeId::F4Sc,
    12,
    SINGLE_WINDOW,
    &[Bank::Index(0)],
    SUPERCHIP,
    F4_TRIGGERS,
    0x8000,
);

pub static E0: Scheme = atari_2600(
    SchemeId::E0,
    10,
    &[
        Window::Register(0),
        Window::Register(1),
        Window::Register(2),
        Window::Fixed(Bank::FromLast(0)),
    ],
    &[Bank::Index(4), Bank::Index(5), Bank::Index(6)],
    None,
    &[
        hotspots(0x1FE0, 0x1FE7, 0),
        hotspots(0x1FE8, 0x1FEF, 1),
        hotspots(0x1FF0, 0x1FF7, 2),
    ],
    0x2000,
);

pub static TIGERVISION_3F: Scheme = Scheme {
    id: SchemeId::Tigervision3F,
    family: MachineFamily::Atari2600,
    base: 0x1000,
    size: 0x1000,
    window_bits: 11,
    windows: &[Window::Register(0), Window::Fixed(Bank::FromLast(0))],
    defaults: &[Bank::Index(0)],
    ram: None,
    triggers: &[value_writes(0x0000, 0x003F)],
    snoops: true,
    rom_size: 0x2000,
};

/// CBS RAM Plus powers up in its last bank, like F8.
pub static FA: Scheme = atari_2600(
    SchemeId::Fa,
    12,
    SINGLE_WINDOW,
    &[Bank::FromLast(0)],
    Some(RamWindow {
        size: 256,
        write_port: 0x0000,
        read_port: 0x0100,
    }),
    &[hotspots(0x1FF8, 0x1FFA, 0)],
    0x3000,
);

pub static A7808: Scheme = flat_7800(SchemeId::A7808, 0x2000, &[Window::Fixed(Bank::Index(0))]);

pub static A7816: Scheme = flat_7800(SchemeId::A7816, 0x4000, &[Window::Fixed(Bank::Index(0))]);

pub static A7832: Scheme = flat_7800(
    SchemeId::A7832,
    0x8000,
    &[Window::Fixed(Bank::Index(0)), Window::Fixed(Bank::Index(1))],
);

pub static A7848: Scheme = flat_7800(
    SchemeId::A7848,
    0xC000,
    &[
        Window::Fixed(Bank::Index(0)),
        Window::Fixed(Bank::Index(1)),
        Window::Fixed(Bank::Index(2)),
    ],
);

const SUPER_GAME_WINDOWS: &[Window] = &[
    Window::Fixed(Bank::FromLast(1)),
    Window::Register(0),
    Window::Fixed(Bank::FromLast(0)),
];

const SUPER_GAME_ROM: Scheme = Scheme {
    id: SchemeId::SuperGame,
    family: MachineFamily::Atari7800,
    base: 0x4000,
    size: 0xC000,
    window_bits: 14,
    windows: SUPER_GAME_WINDOWS,
    defaults: &[Bank::Index(0)],
    ram: None,
    triggers: &[value_writes(0x8000, 0xBFFF)],
    snoops: false,
    rom_size: 0x20000,
};

pub static SUPER_GAME: Scheme = SUPER_GAME_ROM;

pub static SUPER_GAME_RAM: Scheme = Scheme {
    id: SchemeId::SuperGameRam,
    ram: Some(RamWindow {
        size: 0x4000,
        write_port: 0x0000,
        read_port: 0x0000,
    }),
    ..SUPER_GAME_ROM
};
