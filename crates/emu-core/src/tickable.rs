//! Trait for components that can be advanced by clock ticks.

use crate::Ticks;

/// A component advanced once per bus cycle.
///
/// Peripheral chips implement this. The driver ticks every chip before
/// stepping the CPU in the same cycle.
pub trait Tickable {
    /// Advance the component by one bus cycle.
    fn tick(&mut self);

    /// Advance the component by multiple cycles.
    ///
    /// Default implementation calls `tick()` in a loop. Components may
    /// override for efficiency, but must produce identical results.
    fn tick_n(&mut self, count: Ticks) {
        for _ in 0..count.get() {
            self.tick();
        }
    }
}
