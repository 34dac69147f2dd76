//! CPU core trait.

use crate::Bus;

/// A CPU core.
///
/// CPUs take a bus reference in their step method because they need to
/// access memory on specific cycles. The bus is passed in, not owned, so
/// the same bus can also be driven by the peripheral chips.
pub trait Cpu {
    /// The type used for register inspection.
    type Registers;

    /// Advance the CPU by exactly one bus cycle.
    ///
    /// Returns true when this cycle completed an instruction (or an
    /// interrupt entry sequence).
    fn step_cycle<B: Bus>(&mut self, bus: &mut B) -> bool;

    /// Returns the current program counter.
    fn pc(&self) -> u16;

    /// Returns a snapshot of all registers for inspection.
    fn registers(&self) -> Self::Registers;

    /// Returns true if the CPU has locked up and needs a reset.
    fn is_jammed(&self) -> bool;

    /// Reset the CPU. Reads the reset vector through the bus.
    fn reset<B: Bus>(&mut self, bus: &mut B);
}
