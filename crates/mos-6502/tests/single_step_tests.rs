//! Tom Harte's `SingleStepTests` for the NMOS 6502.
//!
//! Each opcode file holds 10,000 random initial states with the expected
//! final state and bus cycle list. The CPU is instruction-level, so the
//! comparison covers registers, memory and the total cycle count.
//!
//! Test data lives in `test-data/65x02/6502/v1/XX.json` at the workspace
//! root.

use emu_core::{Cpu, SimpleBus};
use mos_6502::{Mos6502, Status};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Opcodes this core halts on instead of executing.
const HALTING: [u8; 20] = [
    0x02, 0x12, 0x22, 0x32, 0x42, 0x52, 0x62, 0x72, 0x92, 0xB2, 0xD2, 0xF2, 0x8B, 0x93, 0x9B,
    0x9C, 0x9E, 0x9F, 0xAB, 0xBB,
];

#[derive(Deserialize)]
struct TestCase {
    name: String,
    initial: CpuState,
    #[serde(rename = "final")]
    final_state: CpuState,
    cycles: Vec<(u16, u8, String)>,
}

#[derive(Deserialize)]
struct CpuState {
    pc: u16,
    s: u8,
    a: u8,
    x: u8,
    y: u8,
    p: u8,
    ram: Vec<(u16, u8)>,
}

fn setup(cpu: &mut Mos6502, bus: &mut SimpleBus, state: &CpuState) {
    for &(address, value) in &state.ram {
        bus.poke(address, value);
    }
    cpu.regs.pc = state.pc;
    cpu.regs.s = state.s;
    cpu.regs.a = state.a;
    cpu.regs.x = state.x;
    cpu.regs.y = state.y;
    cpu.regs.p = Status(state.p | 0x20);
}

fn compare(cpu: &Mos6502, bus: &SimpleBus, expected: &CpuState) -> Vec<String> {
    let mut errors = Vec::new();

    let registers = [
        ("A", cpu.regs.a, expected.a),
        ("X", cpu.regs.x, expected.x),
        ("Y", cpu.regs.y, expected.y),
        ("S", cpu.regs.s, expected.s),
        ("P", cpu.regs.p.0, expected.p | 0x20),
    ];
    for (name, got, want) in registers {
        if got != want {
            errors.push(format!("{name}: got ${got:02X}, want ${want:02X}"));
        }
    }
    if cpu.regs.pc != expected.pc {
        errors.push(format!(
            "PC: got ${:04X}, want ${:04X}",
            cpu.regs.pc, expected.pc
        ));
    }

    for &(address, want) in &expected.ram {
        let got = bus.peek(address);
        if got != want {
            errors.push(format!("RAM[${address:04X}]: got ${got:02X}, want ${want:02X}"));
        }
    }

    errors
}

#[test]
#[ignore = "requires test-data/65x02 — run with --ignored"]
fn run_all() {
    let test_dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .expect("parent of crate dir")
        .parent()
        .expect("workspace root")
        .join("test-data/65x02/6502/v1");

    if !test_dir.exists() {
        eprintln!("Test data not found at {}", test_dir.display());
        eprintln!("Skipping SingleStepTests.");
        return;
    }

    let mut total_pass = 0u64;
    let mut total_fail = 0u64;

    for opcode in 0..=0xFF_u8 {
        if HALTING.contains(&opcode) {
            continue;
        }
        let filename = format!("{opcode:02x}.json");
        let path = test_dir.join(&filename);
        if !path.exists() {
            continue;
        }

        let data = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));
        let tests: Vec<TestCase> = serde_json::from_str(&data)
            .unwrap_or_else(|e| panic!("Failed to parse {}: {e}", path.display()));

        let mut file_fail = 0u32;
        let mut first_failures = Vec::new();

        for test in &tests {
            let mut cpu = Mos6502::new();
            let mut bus = SimpleBus::new();
            setup(&mut cpu, &mut bus, &test.initial);

            let cycles = cpu.step(&mut bus) as usize;

            let mut errors = compare(&cpu, &bus, &test.final_state);
            if cycles != test.cycles.len() {
                errors.push(format!("cycles: got {cycles}, want {}", test.cycles.len()));
            }

            if errors.is_empty() {
                total_pass += 1;
            } else {
                file_fail += 1;
                if first_failures.len() < 5 {
                    first_failures.push(format!("  FAIL [{}]: {}", test.name, errors.join(", ")));
                }
            }
        }

        if file_fail > 0 {
            println!("Opcode ${opcode:02X}: {file_fail}/{} failed", tests.len());
            for message in &first_failures {
                println!("{message}");
            }
        }
        total_fail += u64::from(file_fail);
    }

    println!("SingleStepTests: {total_pass} passed, {total_fail} failed");
    assert_eq!(total_fail, 0, "{total_fail} tests failed");
}
