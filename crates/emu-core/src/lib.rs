//! Core traits and types for cycle-stepped emulation.
//!
//! One bus cycle is the unit of time. Peripheral chips tick first, then the
//! CPU steps, once per cycle, and nothing else advances the machine.

mod bus;
mod clock;
mod cpu;
mod observable;
mod tickable;

pub use bus::{Bus, SimpleBus};
pub use clock::{MasterClock, Ticks};
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use tickable::Tickable;
