use crate::Bus;

/// A CPU that executes instructions against a bus.
///
/// The type parameter `B` is the bus type this CPU operates on. The bus is
/// passed in rather than owned so the machine can keep the bus and its
/// devices addressable between run slices.
pub trait Cpu<B: Bus> {
    /// Execute one unit of work (an instruction or an interrupt entry).
    /// Returns CPU cycles consumed.
    fn step(&mut self, bus: &mut B) -> u32;

    /// Run until the budget (in host units) is spent, the CPU halts, or a
    /// device requests preemption. Returns CPU cycles consumed.
    fn run(&mut self, bus: &mut B, budget: i32) -> u64;

    /// Reset the CPU and load the program counter from the reset vector.
    fn reset(&mut self, bus: &mut B);

    /// Latch a maskable interrupt request.
    fn interrupt(&mut self);

    /// Latch a non-maskable interrupt request.
    fn nmi(&mut self);

    /// Get the current program counter.
    fn pc(&self) -> u16;

    /// Returns true once an undefined opcode has jammed the CPU.
    fn is_halted(&self) -> bool;
}
