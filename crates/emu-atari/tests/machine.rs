use std::rc::Rc;

use atari_cartridge::CartridgeError;
use emu_core::{
    AccessContext, Bus, Device, LogFacade, MemoryLog, Observable, SnapshotError, Value,
};
use emu_atari::{
    Machine, MachineConfig, MachineError, MachineFamily, MachineKind, MachineSnapshot, SchemeId,
};

/// 4K image with `program` at $F000 and the reset vector pointing at it.
fn rom_4k(program: &[u8]) -> Vec<u8> {
    let mut rom = vec![0xEA; 0x1000];
    rom[..program.len()].copy_from_slice(program);
    rom[0xFFC] = 0x00;
    rom[0xFFD] = 0xF0;
    rom
}

fn machine(kind: MachineKind, rom: Vec<u8>) -> (Machine, Rc<MemoryLog>) {
    let log = Rc::new(MemoryLog::new());
    let config = MachineConfig {
        kind,
        rom,
        scheme: None,
    };
    let machine = Machine::new(&config, Some(log.clone())).unwrap();
    (machine, log)
}

/// Stand-in for the TIA: WSYNC ($02) preempts the running slice.
struct Wsync;

impl Device for Wsync {
    fn name(&self) -> &str {
        "wsync"
    }

    fn read(&mut self, _address: u16, ctx: &mut AccessContext) -> u8 {
        ctx.data_bus()
    }

    fn write(&mut self, address: u16, _value: u8, ctx: &mut AccessContext) {
        if address & 0x3F == 0x02 {
            ctx.request_preempt();
        }
    }
}

#[test]
fn atari_2600_runs_from_the_cartridge_reset_vector() {
    // LDA #$42; STA $80; JMP $F004
    let (mut machine, _) = machine(
        MachineKind::Atari2600Ntsc,
        rom_4k(&[0xA9, 0x42, 0x85, 0x80, 0x4C, 0x04, 0xF0]),
    );
    assert_eq!(machine.scheme(), SchemeId::A4K);
    assert_eq!(machine.cpu().regs.pc, 0xF000);

    let outcome = machine.run(20);
    assert!(!outcome.halted);
    assert!(outcome.cycles >= 20);

    let bus = machine.bus_mut();
    assert_eq!(bus.read(0x0080), 0x42);
    assert_eq!(bus.read(0x0180), 0x42, "stack page mirror");
}

#[test]
fn atari_2600_switches_banks_mid_program() {
    let mut rom = vec![0xEA; 0x2000];
    // Bank 1 (power-on): LDA $1FF8 switches to bank 0 under the CPU.
    rom[0x1000..0x1003].copy_from_slice(&[0xAD, 0xF8, 0x1F]);
    rom[0x1FFC] = 0x00;
    rom[0x1FFD] = 0xF0;
    // Bank 0 continues at $F003: LDA #$55; STA $81; JMP $F007
    rom[0x0003..0x000A].copy_from_slice(&[0xA9, 0x55, 0x85, 0x81, 0x4C, 0x07, 0xF0]);

    let (mut machine, log) = machine(MachineKind::Atari2600Pal, rom);
    assert_eq!(machine.scheme(), SchemeId::F8);
    assert!(log.contains("F8 cartridge (detected)"));

    machine.run(40);
    assert_eq!(machine.bus_mut().read(0x0081), 0x55);
}

#[test]
fn jam_halts_the_machine_and_is_logged() {
    let (mut machine, log) = machine(MachineKind::Atari2600Ntsc, rom_4k(&[0xEA, 0x02]));

    let outcome = machine.run(100);
    assert!(outcome.halted);
    assert!(machine.is_halted());
    assert_eq!(machine.query("cpu.halted"), Some(Value::Bool(true)));
    assert!(log.contains("halted on opcode $02 at $F001"));

    machine.reset().unwrap();
    assert!(!machine.is_halted());
}

#[test]
fn external_halt_stops_runs() {
    let (mut machine, _) = machine(MachineKind::Atari2600Ntsc, rom_4k(&[0x4C, 0x00, 0xF0]));
    machine.halt();
    let outcome = machine.run(1000);
    assert_eq!(outcome.cycles, 0);
    assert!(outcome.halted);

    machine.resume();
    assert!(machine.run(10).cycles > 0);
}

#[test]
fn attached_device_preempts_the_slice() {
    // STA WSYNC; NOP; NOP; JMP $F000
    let (mut machine, _) = machine(
        MachineKind::Atari2600Ntsc,
        rom_4k(&[0x85, 0x02, 0xEA, 0xEA, 0x4C, 0x00, 0xF0]),
    );
    machine
        .attach(0x0000, 0x80, Box::new(Wsync))
        .unwrap();

    let outcome = machine.run_scanline();
    assert!(outcome.preempted);
    assert_eq!(outcome.cycles, 3);
    assert_eq!(machine.cpu().regs.pc, 0xF002);
}

#[test]
fn atari_7800_ram_mirrors_and_budget_multiple() {
    let mut rom = vec![0xEA; 0x4000];
    // LDA #$77; STA $2050; STA $2150; JMP $C008
    rom[..11].copy_from_slice(&[
        0xA9, 0x77, 0x8D, 0x50, 0x20, 0x8D, 0x50, 0x21, 0x4C, 0x08, 0xC0,
    ]);
    rom[0x3FFC] = 0x00;
    rom[0x3FFD] = 0xC0;
    let (mut machine, _) = machine(MachineKind::Atari7800Ntsc, rom);
    assert_eq!(machine.scheme(), SchemeId::A7816);

    // 40 host units = 10 CPU cycles at four units per cycle.
    let outcome = machine.run(40);
    assert!((10..=12).contains(&outcome.cycles));

    let bus = machine.bus_mut();
    assert_eq!(bus.read(0x2050), 0x77);
    assert_eq!(bus.read(0x0050), 0x77, "zero page mirror");
    assert_eq!(bus.read(0x2150), 0x77);
    assert_eq!(bus.read(0x0150), 0x77, "stack page mirror");
    assert_eq!(bus.read(0x1850), 0x00, "other chip");
}

#[test]
fn bios_swaps_with_the_cartridge() {
    let mut rom = vec![0xCA; 0x8000];
    rom[0x7FFC] = 0x00;
    rom[0x7FFD] = 0x80;
    let (mut machine, _) = machine(MachineKind::Atari7800Ntsc, rom);

    let mut bios = vec![0xB1; 0x1000];
    bios[0xFFC] = 0x00;
    bios[0xFFD] = 0xF0;
    machine.load_bios(&bios).unwrap();
    assert!(machine.bios_enabled());
    assert_eq!(machine.cpu().regs.pc, 0xF000, "reset through the BIOS");
    assert_eq!(machine.bus_mut().read(0xF000), 0xB1);

    machine.swap_bios(false).unwrap();
    assert_eq!(machine.bus_mut().read(0xF000), 0xCA);
    assert_eq!(machine.bus_mut().read(0x8000), 0xCA);

    machine.reset().unwrap();
    assert!(machine.bios_enabled());
    assert_eq!(machine.bus_mut().read(0xF000), 0xB1);
}

#[test]
fn atari_2600_has_no_bios() {
    let (mut machine, _) = machine(MachineKind::Atari2600Ntsc, rom_4k(&[]));
    assert_eq!(
        machine.load_bios(&[0; 0x1000]),
        Err(MachineError::NoBiosSlot(MachineKind::Atari2600Ntsc))
    );
}

#[test]
fn snapshot_round_trips_through_json() {
    // INC $80; JMP $F000
    let (mut machine, _) = machine(
        MachineKind::Atari2600Ntsc,
        rom_4k(&[0xE6, 0x80, 0x4C, 0x00, 0xF0]),
    );
    machine.run(80);
    let saved = machine.snapshot();
    let count = machine.bus_mut().read(0x0080);

    let json = serde_json::to_string(&saved).unwrap();
    let parsed: MachineSnapshot = serde_json::from_str(&json).unwrap();

    machine.run(800);
    assert_ne!(machine.bus_mut().read(0x0080), count);

    machine.restore(&parsed).unwrap();
    assert_eq!(machine.bus_mut().read(0x0080), count);
    assert_eq!(machine.cpu().snapshot(), saved.cpu);
}

#[test]
fn snapshot_from_another_machine_is_rejected() {
    let (machine_2600, _) = machine(MachineKind::Atari2600Ntsc, rom_4k(&[]));
    let (mut machine_pal, _) = machine(MachineKind::Atari2600Pal, rom_4k(&[]));

    let result = machine_pal.restore(&machine_2600.snapshot());
    assert!(matches!(
        result,
        Err(MachineError::Snapshot(SnapshotError::MachineMismatch { .. }))
    ));

    let mut stale = machine_pal.snapshot();
    stale.version += 1;
    assert!(matches!(
        machine_pal.restore(&stale),
        Err(MachineError::Snapshot(SnapshotError::VersionMismatch { .. }))
    ));
}

#[test]
fn unknown_image_size_is_a_cartridge_error() {
    let config = MachineConfig {
        kind: MachineKind::Atari2600Ntsc,
        rom: vec![0; 0x1800],
        scheme: None,
    };
    let error = Machine::new(&config, None).unwrap_err();
    assert_eq!(
        error,
        MachineError::Cartridge(CartridgeError::UnrecognizedSize {
            size: 0x1800,
            family: MachineFamily::Atari2600,
        })
    );
}

#[test]
fn forced_scheme_overrides_detection() {
    let config = MachineConfig {
        kind: MachineKind::Atari2600Ntsc,
        rom: vec![0; 0x2000],
        scheme: Some(SchemeId::Tigervision3F),
    };
    let machine = Machine::new(&config, None).unwrap();
    assert_eq!(machine.scheme(), SchemeId::Tigervision3F);
    assert_eq!(machine.bus().snooper(), Some(machine.cartridge_id()));
}

#[test]
fn rejected_snapshot_leaves_the_machine_untouched() {
    // INC $80; JMP $F000
    let (mut machine, _) = machine(
        MachineKind::Atari2600Ntsc,
        rom_4k(&[0xE6, 0x80, 0x4C, 0x00, 0xF0]),
    );
    let mut bad = machine.snapshot();
    machine.run(80);
    let count = machine.bus_mut().read(0x0080);
    let cpu = machine.cpu().snapshot();

    // RAM comes first and would restore cleanly; the cartridge does not fit.
    bad.bus.devices[0].ram[0] = 0x99;
    bad.bus.devices.last_mut().unwrap().ram.push(0);
    assert!(matches!(
        machine.restore(&bad),
        Err(MachineError::Snapshot(SnapshotError::RamSizeMismatch { .. }))
    ));
    assert_eq!(machine.bus_mut().read(0x0080), count);
    assert_eq!(machine.cpu().snapshot(), cpu);
}

#[test]
fn no_sink_means_no_logging() {
    let config = MachineConfig {
        kind: MachineKind::Atari2600Ntsc,
        rom: rom_4k(&[]),
        scheme: None,
    };
    let quiet = Machine::new(&config, None).unwrap();
    assert!(format!("{quiet:?}").contains("Logger { attached: false }"));

    let forwarded = Machine::new(&config, Some(Rc::new(LogFacade))).unwrap();
    assert!(format!("{forwarded:?}").contains("Logger { attached: true }"));
}
