//! Klaus Dormann's 6502 functional and decimal tests.
//!
//! Both binaries are assembled for load address $0000 and finish by
//! branching to themselves. The functional test succeeds when that trap is
//! at $3469; the decimal test stores a nonzero error flag at $000B on
//! failure.

use emu_core::{Cpu, SimpleBus};
use mos_6502::Mos6502;

/// Step until PC stops moving. Returns the trap address, or `None` when the
/// instruction limit runs out first or the CPU halts.
fn run_to_trap(cpu: &mut Mos6502, bus: &mut SimpleBus, limit: u64) -> Option<u16> {
    let mut previous = cpu.regs.pc;
    for instructions in 0..limit {
        cpu.step(bus);
        if cpu.is_halted() {
            eprintln!("halted at ${:04X} after {instructions} instructions", cpu.regs.pc);
            return None;
        }
        if cpu.regs.pc == previous {
            eprintln!(
                "trapped at ${previous:04X} after {instructions} instructions ({} cycles)",
                cpu.clock()
            );
            return Some(previous);
        }
        previous = cpu.regs.pc;
    }
    None
}

fn load(path: &str) -> Option<Vec<u8>> {
    let binary = std::fs::read(path).ok();
    if binary.is_none() {
        eprintln!("{path} not found - download it from Klaus Dormann's 6502 test suite");
    }
    binary
}

#[test]
#[ignore]
fn dormann_functional() {
    let Some(binary) = load("tests/data/6502_functional_test.bin") else {
        return;
    };
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &binary);
    let mut cpu = Mos6502::new();
    cpu.regs.pc = 0x0400;

    assert_eq!(run_to_trap(&mut cpu, &mut bus, 100_000_000), Some(0x3469));
}

#[test]
#[ignore]
fn dormann_decimal() {
    let Some(binary) = load("tests/data/6502_decimal_test.bin") else {
        return;
    };
    let mut bus = SimpleBus::new();
    bus.load(0x0000, &binary);
    let mut cpu = Mos6502::new();
    cpu.regs.pc = 0x0200;

    assert!(run_to_trap(&mut cpu, &mut bus, 50_000_000).is_some());
    assert_eq!(bus.peek(0x000B), 0, "decimal test error flag");
}
