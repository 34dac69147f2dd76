//! Debugger attach point and stop conditions.
//!
//! A host attaches a [`Debugger`] to receive notifications. Stop conditions
//! (breakpoints, address brackets, single-step, step-over, trapped
//! undocumented opcodes) are evaluated at instruction boundaries and
//! reported through [`Debugger::halt`]. Nothing in the CPU pauses itself;
//! the host stops calling `step_cycle` when it sees a halt.

use std::collections::BTreeSet;

use crate::cpu::{CpuStatus, Interrupt};
use crate::trace::TraceEntry;

/// Receiver for CPU debug notifications.
pub trait Debugger {
    /// A stop condition was reached at an instruction boundary.
    fn halt(&mut self, reason: HaltReason, status: &CpuStatus);

    /// An instruction was decoded.
    fn trace(&mut self, _entry: &TraceEntry) {}

    /// An IRQ or NMI sequence started.
    fn interrupt(&mut self, _event: &InterruptEvent) {}

    /// RTI returned from the handler of an earlier IRQ or NMI.
    fn interrupt_return(&mut self, _event: &InterruptReturn) {}

    /// The CPU is locked up. Sent once per cycle while jammed.
    fn jam(&mut self, _address: u16, _opcode: u8) {}
}

/// How eagerly the CPU reports stop conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunLevel {
    /// No stop conditions are checked. Only an explicit stop request halts.
    #[default]
    Off,
    /// Breakpoints, brackets and trapped opcodes halt.
    Continuous,
    /// As `Continuous`, plus halt once the stack is back at or above the
    /// depth it had when this level was selected (step over subroutines).
    Next,
    /// Halt after every instruction.
    Step,
}

/// Inclusive address range that reports when execution enters or leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bracket {
    pub start: u16,
    pub end: u16,
}

impl Bracket {
    #[must_use]
    pub fn new(start: u16, end: u16) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    #[must_use]
    pub fn contains(&self, address: u16) -> bool {
        (self.start..=self.end).contains(&address)
    }
}

/// Why a halt was reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HaltReason {
    Breakpoint(u16),
    BracketEnter(Bracket),
    BracketExit(Bracket),
    /// Undocumented opcode decoded while trapping is on. The opcode still
    /// executes.
    IllegalOpcode(u8),
    Step,
    Next,
    /// Host asked for a stop.
    Stop,
}

/// IRQ or NMI entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptEvent {
    pub kind: Interrupt,
    /// Address execution resumes at after the handler returns.
    pub return_pc: u16,
    /// Vector target.
    pub handler_pc: u16,
    /// Cycle count when the sequence started.
    pub cycle: u64,
}

/// Return from an IRQ or NMI handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptReturn {
    pub kind: Interrupt,
    pub handler_pc: u16,
    pub return_pc: u16,
    /// Cycles from interrupt entry to the end of RTI.
    pub elapsed: u64,
}

/// Stop-condition bookkeeping.
#[derive(Debug, Clone, Default)]
pub(crate) struct DebugState {
    pub run_level: RunLevel,
    pub trap_illegal: bool,
    breakpoints: BTreeSet<u16>,
    brackets: Vec<(Bracket, bool)>,
    next_depth: u8,
    stop_requested: bool,
}

impl DebugState {
    pub fn set_run_level(&mut self, level: RunLevel, stack: u8) {
        self.run_level = level;
        self.next_depth = stack;
    }

    pub fn add_breakpoint(&mut self, address: u16) -> bool {
        self.breakpoints.insert(address)
    }

    pub fn remove_breakpoint(&mut self, address: u16) -> bool {
        self.breakpoints.remove(&address)
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = u16> + '_ {
        self.breakpoints.iter().copied()
    }

    pub fn clear_breakpoints(&mut self) {
        self.breakpoints.clear();
    }

    pub fn add_bracket(&mut self, bracket: Bracket, pc: u16) {
        if !self.brackets.iter().any(|(b, _)| *b == bracket) {
            self.brackets.push((bracket, bracket.contains(pc)));
        }
    }

    pub fn remove_bracket(&mut self, bracket: Bracket) -> bool {
        let before = self.brackets.len();
        self.brackets.retain(|(b, _)| *b != bracket);
        self.brackets.len() != before
    }

    pub fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    /// Forget transient state, keeping breakpoints and brackets.
    pub fn reset(&mut self, pc: u16) {
        self.stop_requested = false;
        self.run_level = RunLevel::Off;
        for (bracket, inside) in &mut self.brackets {
            *inside = bracket.contains(pc);
        }
    }

    /// Halt reason for an undocumented opcode, if trapping.
    pub fn illegal(&self, opcode: u8) -> Option<HaltReason> {
        (self.trap_illegal && self.run_level != RunLevel::Off)
            .then_some(HaltReason::IllegalOpcode(opcode))
    }

    /// Evaluate stop conditions at an instruction boundary.
    ///
    /// Bracket membership is updated on every call so a transition is only
    /// reported once.
    pub fn check(&mut self, pc: u16, stack: u8) -> Option<HaltReason> {
        let active = self.run_level != RunLevel::Off;
        let mut reason = std::mem::take(&mut self.stop_requested).then_some(HaltReason::Stop);

        for (bracket, inside) in &mut self.brackets {
            let now = bracket.contains(pc);
            if now == *inside {
                continue;
            }
            *inside = now;
            if active && reason.is_none() {
                reason = Some(if now {
                    HaltReason::BracketEnter(*bracket)
                } else {
                    HaltReason::BracketExit(*bracket)
                });
            }
        }

        if !active || reason.is_some() {
            return reason;
        }
        if self.breakpoints.contains(&pc) {
            return Some(HaltReason::Breakpoint(pc));
        }
        match self.run_level {
            RunLevel::Step => Some(HaltReason::Step),
            RunLevel::Next if stack >= self.next_depth => Some(HaltReason::Next),
            _ => None,
        }
    }
}
