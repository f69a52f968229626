//! CPU state, the budgeted run loop and interrupt entry.

use std::rc::Rc;

use emu_core::{Bus, Cpu, CpuSnapshot, LogSink, Logger, Observable, Signals, Value};

use crate::flags::{self, Status};
use crate::Registers;

const NMI_VECTOR: u16 = 0xFFFA;
const RESET_VECTOR: u16 = 0xFFFC;
const IRQ_VECTOR: u16 = 0xFFFE;

/// Instruction-level NMOS 6502.
///
/// Each call to [`Cpu::step`] executes one whole instruction or interrupt
/// entry and returns its cycle count. [`Cpu::run`] repeats that against a
/// budget expressed in host units: every CPU cycle costs
/// `run_budget_multiple` units, so a 7800 (whose bus clock is four times
/// the 6502's cycle) runs with a multiple of 4 and a 2600 with 1.
pub struct Mos6502 {
    pub regs: Registers,
    clock: u64,
    run_budget: i64,
    run_budget_multiple: u32,
    halted: bool,
    preempt_requested: bool,
    nmi_pending: bool,
    irq_pending: bool,
    logger: Logger,
}

impl Mos6502 {
    #[must_use]
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            clock: 0,
            run_budget: 0,
            run_budget_multiple: 1,
            halted: false,
            preempt_requested: false,
            nmi_pending: false,
            irq_pending: false,
            logger: Logger::silent(),
        }
    }

    /// Host units charged per CPU cycle (1 or 4 on Atari hardware).
    #[must_use]
    pub fn with_run_budget_multiple(mut self, multiple: u32) -> Self {
        self.run_budget_multiple = multiple.max(1);
        self
    }

    pub fn set_logger(&mut self, logger: Logger) {
        self.logger = logger;
    }

    pub fn set_log_sink(&mut self, sink: Rc<dyn LogSink>) {
        self.logger = Logger::new(sink);
    }

    /// CPU cycles executed since power-on.
    #[must_use]
    pub const fn clock(&self) -> u64 {
        self.clock
    }

    /// Host units left in the current slice; negative after an overshoot.
    #[must_use]
    pub const fn run_budget(&self) -> i64 {
        self.run_budget
    }

    #[must_use]
    pub const fn run_budget_multiple(&self) -> u32 {
        self.run_budget_multiple
    }

    /// True once an opcode the core does not execute has stopped the CPU.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        self.halted
    }

    /// Latch an NMI; it is taken before the next instruction.
    pub fn nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Latch an IRQ; it waits while I is set.
    pub fn interrupt(&mut self) {
        self.irq_pending = true;
    }

    /// True when the last `run` ended because a device asked it to.
    #[must_use]
    pub const fn preempt_requested(&self) -> bool {
        self.preempt_requested
    }

    #[must_use]
    pub const fn registers(&self) -> &Registers {
        &self.regs
    }

    #[must_use]
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            pc: self.regs.pc,
            a: self.regs.a,
            x: self.regs.x,
            y: self.regs.y,
            s: self.regs.s,
            p: self.regs.p.0,
            clock: self.clock,
            run_budget: self.run_budget,
            halted: self.halted,
            nmi_pending: self.nmi_pending,
            irq_pending: self.irq_pending,
        }
    }

    pub fn restore(&mut self, snapshot: &CpuSnapshot) {
        self.regs = Registers {
            a: snapshot.a,
            x: snapshot.x,
            y: snapshot.y,
            s: snapshot.s,
            pc: snapshot.pc,
            p: Status(snapshot.p | flags::U),
        };
        self.clock = snapshot.clock;
        self.run_budget = snapshot.run_budget;
        self.halted = snapshot.halted;
        self.nmi_pending = snapshot.nmi_pending;
        self.irq_pending = snapshot.irq_pending;
        self.preempt_requested = false;
    }

    /// Stop on an opcode the core does not execute. Only `reset` clears it.
    pub(crate) fn jam(&mut self, opcode: u8) -> u32 {
        let at = self.regs.pc.wrapping_sub(1);
        self.halted = true;
        self.logger.warn(
            "cpu",
            format_args!("halted on opcode ${opcode:02X} at ${at:04X}"),
        );
        2
    }

    /// Push PC and P, then load PC from `vector`. 7 cycles.
    fn enter_interrupt(&mut self, bus: &mut impl Bus, vector: u16) -> u32 {
        self.idle_read(bus);
        self.idle_read(bus);
        self.push_word(bus, self.regs.pc);
        self.push(bus, self.regs.p.pushed_by_interrupt());
        self.regs.pc = Self::read_word(bus, vector);
        7
    }

    fn apply(&mut self, signals: Signals) {
        self.run_budget -= i64::from(signals.stolen_cycles);
        self.preempt_requested |= signals.preempt;
        self.nmi_pending |= signals.nmi;
        self.irq_pending |= signals.irq;
    }
}

impl Default for Mos6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: Bus> Cpu<B> for Mos6502 {
    fn step(&mut self, bus: &mut B) -> u32 {
        if self.halted {
            return 0;
        }
        bus.sync_clock(self.clock);

        let cycles = if self.nmi_pending {
            // Taken regardless of I, and I is left as it was.
            self.nmi_pending = false;
            self.enter_interrupt(bus, NMI_VECTOR)
        } else if self.irq_pending && !self.regs.p.is_set(flags::I) {
            self.irq_pending = false;
            let cycles = self.enter_interrupt(bus, IRQ_VECTOR);
            self.regs.p.set_if(flags::I, true);
            cycles
        } else {
            let opcode = self.fetch(bus);
            self.execute(bus, opcode)
        };

        self.clock += u64::from(cycles);
        let signals = bus.take_signals();
        self.apply(signals);
        cycles
    }

    fn run(&mut self, bus: &mut B, budget: i32) -> u64 {
        self.preempt_requested = false;
        self.run_budget += i64::from(budget);
        let start = self.clock;

        while self.run_budget > 0 && !self.halted && !self.preempt_requested {
            let cycles = self.step(bus);
            self.run_budget -= i64::from(cycles) * i64::from(self.run_budget_multiple);
        }

        // Overshoot carries into the next slice; an early exit forfeits
        // whatever was left.
        self.run_budget = self.run_budget.min(0);
        self.clock - start
    }

    fn reset(&mut self, bus: &mut B) {
        self.regs = Registers::new();
        self.regs.pc = Self::read_word(bus, RESET_VECTOR);
        self.halted = false;
        self.preempt_requested = false;
        self.nmi_pending = false;
        self.irq_pending = false;
        self.run_budget = 0;
        self.clock += 7;
        let _ = bus.take_signals();
    }

    fn interrupt(&mut self) {
        Mos6502::interrupt(self);
    }

    fn nmi(&mut self) {
        Mos6502::nmi(self);
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn is_halted(&self) -> bool {
        Mos6502::is_halted(self)
    }
}

impl Observable for Mos6502 {
    fn query(&self, path: &str) -> Option<Value> {
        let flag = |bit| Some(Value::Bool(self.regs.p.is_set(bit)));
        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "s" => Some(self.regs.s.into()),
            "p" => Some(self.regs.p.0.into()),
            "flags.c" => flag(flags::C),
            "flags.z" => flag(flags::Z),
            "flags.i" => flag(flags::I),
            "flags.d" => flag(flags::D),
            "flags.v" => flag(flags::V),
            "flags.n" => flag(flags::N),
            "clock" => Some(self.clock.into()),
            "halted" => Some(self.halted.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "pc", "a", "x", "y", "s", "p", "flags.c", "flags.z", "flags.i", "flags.d", "flags.v",
            "flags.n", "clock", "halted",
        ]
    }
}

impl std::fmt::Debug for Mos6502 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "PC=${:04X} A=${:02X} X=${:02X} Y=${:02X} S=${:02X} P={} clock={}",
            self.regs.pc, self.regs.a, self.regs.x, self.regs.y, self.regs.s, self.regs.p, self.clock
        )?;
        if self.halted {
            write!(f, " HALTED")?;
        }
        Ok(())
    }
}
