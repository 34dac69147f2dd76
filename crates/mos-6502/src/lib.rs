//! Cycle-stepped NMOS 6502 CPU.
//!
//! Every bus access goes through [`emu_core::Bus`]. The CPU executes the
//! documented instruction set and, when configured, the undocumented
//! opcodes of NMOS silicon including the unstable ones. Lock-up opcodes
//! freeze the CPU until reset.
//!
//! Debug support is optional: attach a [`Debugger`] for breakpoints,
//! address brackets, single-step, step-over, interrupt notifications and
//! per-instruction trace records.

mod addressing;
mod alu;
mod config;
mod cpu;
mod debugger;
pub mod flags;
pub mod opcodes;
mod poke;
mod registers;
mod trace;

pub use config::{CpuConfig, InstructionSet};
pub use cpu::{CpuStatus, Interrupt, Jam, Mos6502};
pub use debugger::{Bracket, Debugger, HaltReason, InterruptEvent, InterruptReturn, RunLevel};
pub use flags::Status;
pub use poke::{PokeError, RegisterName, parse_value};
pub use registers::Registers;
pub use trace::{TraceEntry, TraceLog};
