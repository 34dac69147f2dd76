//! 6502 CPU implementation.
//!
//! `step_cycle()` advances exactly one bus cycle. An instruction is decoded
//! and its register effects computed on its first cycle; the remaining
//! cycles count down. Read-modify-write instructions read, write back the
//! unmodified value, and write the result on their last two cycles. Stores
//! land on the final cycle. Interrupts are sampled only at instruction
//! boundaries.

use emu_core::{Bus, Cpu, Observable, Ticks, Value};
use log::{debug, trace, warn};

use crate::addressing::Operand;
use crate::config::CpuConfig;
use crate::debugger::{
    Bracket, DebugState, Debugger, HaltReason, InterruptEvent, InterruptReturn, RunLevel,
};
use crate::flags::{C, D, I, N, V, Z};
use crate::opcodes::{self, AddrMode, Instruction, Opcode};
use crate::trace::{TraceEntry, TraceLog};
use crate::{Registers, Status};

const NMI_VECTOR: u16 = 0xFFFA;
const RESET_VECTOR: u16 = 0xFFFC;
const IRQ_VECTOR: u16 = 0xFFFE;

/// Hardware interrupt sequence length.
const INTERRUPT_CYCLES: u8 = 7;

/// Interrupt levels, lowest to highest priority. A jam outranks everything:
/// once locked up, only reset recovers the CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Interrupt {
    Break,
    Irq,
    Nmi,
    Jam,
}

/// Lock-up location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jam {
    /// Address of the lock-up opcode.
    pub address: u16,
    pub opcode: u8,
}

/// Register snapshot handed to debuggers and hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CpuStatus {
    pub pc: u16,
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    /// Architectural P (B and U read as 1).
    pub sr: u8,
    /// Cycles since construction.
    pub cycles: u64,
    pub jammed: bool,
}

impl CpuStatus {
    #[must_use]
    pub fn flag(&self, mask: u8) -> bool {
        self.sr & mask != 0
    }
}

/// Memory read-modify-write armed at decode, run on the penultimate cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Deferred {
    instruction: Instruction,
    address: u16,
}

/// Open IRQ/NMI handler, closed by the RTI that restores its stack depth.
#[derive(Debug, Clone, Copy)]
struct InterruptFrame {
    kind: Interrupt,
    handler_pc: u16,
    return_pc: u16,
    stack: u8,
    entered_at: Ticks,
}

/// NMOS 6502 CPU.
pub struct Mos6502 {
    /// CPU registers.
    pub regs: Registers,
    config: CpuConfig,
    table: &'static [Opcode; 256],
    /// Current opcode.
    opcode: u8,
    /// Cycles left in the current instruction. Zero at a boundary.
    cycles: u8,
    /// Branch and page-cross cycles added during decode.
    extra_cycles: u8,
    deferred: Option<Deferred>,
    /// Store waiting for the instruction's last cycle.
    pending_write: Option<(u16, u8)>,
    /// NMI line level on the previous cycle.
    nmi_line: bool,
    /// Latched NMI edge.
    nmi_pending: bool,
    /// Previous instruction was a taken branch that stayed in its page.
    short_branch: bool,
    jam: Option<Jam>,
    total_cycles: Ticks,
    frames: Vec<InterruptFrame>,
    trace: Option<TraceLog>,
    debug: DebugState,
    debugger: Option<Box<dyn Debugger>>,
}

impl Default for Mos6502 {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Mos6502 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mos6502")
            .field("regs", &self.regs)
            .field("opcode", &self.opcode)
            .field("cycles", &self.cycles)
            .field("jam", &self.jam)
            .field("total_cycles", &self.total_cycles)
            .field("debugger", &self.debugger.is_some())
            .finish_non_exhaustive()
    }
}

impl Mos6502 {
    /// Create a CPU with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(CpuConfig::default())
    }

    #[must_use]
    pub fn with_config(config: CpuConfig) -> Self {
        Self {
            regs: Registers::new(),
            config,
            table: opcodes::table(config.instruction_set),
            opcode: 0,
            cycles: 0,
            extra_cycles: 0,
            deferred: None,
            pending_write: None,
            nmi_line: false,
            nmi_pending: false,
            short_branch: false,
            jam: None,
            total_cycles: Ticks::ZERO,
            frames: Vec::new(),
            trace: (config.trace_capacity > 0).then(|| TraceLog::new(config.trace_capacity)),
            debug: DebugState::default(),
            debugger: None,
        }
    }

    #[must_use]
    pub fn config(&self) -> &CpuConfig {
        &self.config
    }

    /// Reset: load PC from $FFFC, clear A/X/Y, S=$FF, P=$34, clear any jam.
    pub fn reset<B: Bus>(&mut self, bus: &mut B) {
        self.regs = Registers::new();
        self.regs.pc = Self::read_word(bus, RESET_VECTOR);
        self.opcode = 0;
        self.cycles = 0;
        self.extra_cycles = 0;
        self.deferred = None;
        self.pending_write = None;
        self.nmi_line = bus.nmi_signal();
        self.nmi_pending = false;
        self.short_branch = false;
        self.jam = None;
        self.frames.clear();
        self.debug.reset(self.regs.pc);
        bus.set_cpu_jammed(false);
        debug!("6502 reset, PC=${:04X}", self.regs.pc);
    }

    /// Advance one bus cycle. Returns true when an instruction or interrupt
    /// sequence finished on this cycle.
    pub fn step_cycle<B: Bus>(&mut self, bus: &mut B) -> bool {
        self.total_cycles += Ticks::ONE;

        let nmi = bus.nmi_signal();
        if nmi && !self.nmi_line {
            self.nmi_pending = true;
        }
        self.nmi_line = nmi;

        if let Some(jam) = self.jam {
            bus.set_cpu_jammed(true);
            if let Some(debugger) = self.debugger.as_mut() {
                debugger.jam(jam.address, jam.opcode);
            }
            return false;
        }

        if self.cycles == 0 {
            self.dispatch(bus);
            if self.jam.is_some() {
                return false;
            }
        }

        self.cycles -= 1;
        if self.cycles == 1 {
            if let Some(deferred) = self.deferred.take() {
                self.read_modify_write(bus, deferred);
            }
        }
        if self.cycles > 0 {
            return false;
        }

        if let Some((address, value)) = self.pending_write.take() {
            bus.write(address, value);
        }
        self.boundary();
        true
    }

    /// True when the next cycle starts a new instruction.
    #[must_use]
    pub fn is_instruction_complete(&self) -> bool {
        self.cycles == 0
    }

    /// Opcode of the instruction in progress (or last executed).
    #[must_use]
    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    #[must_use]
    pub fn total_cycles(&self) -> Ticks {
        self.total_cycles
    }

    #[must_use]
    pub fn jam(&self) -> Option<Jam> {
        self.jam
    }

    #[must_use]
    pub fn is_jammed(&self) -> bool {
        self.jam.is_some()
    }

    // ========================================================================
    // Register access
    // ========================================================================

    #[must_use]
    pub fn pc(&self) -> u16 {
        self.regs.pc
    }

    #[must_use]
    pub fn a(&self) -> u8 {
        self.regs.a
    }

    #[must_use]
    pub fn x(&self) -> u8 {
        self.regs.x
    }

    #[must_use]
    pub fn y(&self) -> u8 {
        self.regs.y
    }

    #[must_use]
    pub fn sp(&self) -> u8 {
        self.regs.s
    }

    /// Architectural status byte.
    #[must_use]
    pub fn sr(&self) -> u8 {
        self.regs.p.to_byte()
    }

    #[must_use]
    pub fn flag(&self, mask: u8) -> bool {
        self.regs.p.is_set(mask)
    }

    pub fn set_pc(&mut self, value: u16) {
        self.regs.pc = value;
    }

    pub fn set_a(&mut self, value: u8) {
        self.regs.a = value;
    }

    pub fn set_x(&mut self, value: u8) {
        self.regs.x = value;
    }

    pub fn set_y(&mut self, value: u8) {
        self.regs.y = value;
    }

    pub fn set_sp(&mut self, value: u8) {
        self.regs.s = value;
    }

    pub fn set_sr(&mut self, value: u8) {
        self.regs.p = Status::from_byte(value);
    }

    pub fn set_flag(&mut self, mask: u8, on: bool) {
        self.regs.p.set_if(mask, on);
    }

    #[must_use]
    pub fn status(&self) -> CpuStatus {
        CpuStatus {
            pc: self.regs.pc,
            a: self.regs.a,
            x: self.regs.x,
            y: self.regs.y,
            sp: self.regs.s,
            sr: self.sr(),
            cycles: self.total_cycles.get(),
            jammed: self.jam.is_some(),
        }
    }

    // ========================================================================
    // Debugger and trace
    // ========================================================================

    pub fn attach_debugger(&mut self, debugger: Box<dyn Debugger>) {
        self.debugger = Some(debugger);
    }

    pub fn detach_debugger(&mut self) -> Option<Box<dyn Debugger>> {
        self.debugger.take()
    }

    #[must_use]
    pub fn run_level(&self) -> RunLevel {
        self.debug.run_level
    }

    /// Select the run level. `Next` records the current stack depth.
    pub fn set_run_level(&mut self, level: RunLevel) {
        self.debug.set_run_level(level, self.regs.s);
    }

    pub fn set_trap_illegal(&mut self, trap: bool) {
        self.debug.trap_illegal = trap;
    }

    pub fn add_breakpoint(&mut self, address: u16) -> bool {
        self.debug.add_breakpoint(address)
    }

    pub fn remove_breakpoint(&mut self, address: u16) -> bool {
        self.debug.remove_breakpoint(address)
    }

    pub fn clear_breakpoints(&mut self) {
        self.debug.clear_breakpoints();
    }

    #[must_use]
    pub fn breakpoints(&self) -> Vec<u16> {
        self.debug.breakpoints().collect()
    }

    pub fn add_bracket(&mut self, start: u16, end: u16) -> Bracket {
        let bracket = Bracket::new(start, end);
        self.debug.add_bracket(bracket, self.regs.pc);
        bracket
    }

    pub fn remove_bracket(&mut self, bracket: Bracket) -> bool {
        self.debug.remove_bracket(bracket)
    }

    /// Report a [`HaltReason::Stop`] at the next instruction boundary.
    pub fn request_stop(&mut self) {
        self.debug.request_stop();
    }

    #[must_use]
    pub fn trace_log(&self) -> Option<&TraceLog> {
        self.trace.as_ref()
    }

    pub fn trace_log_mut(&mut self) -> Option<&mut TraceLog> {
        self.trace.as_mut()
    }

    fn halt(&mut self, reason: HaltReason) {
        let status = self.status();
        if let Some(debugger) = self.debugger.as_mut() {
            trace!("halt {reason:?} at ${:04X}", status.pc);
            debugger.halt(reason, &status);
        }
    }

    /// End-of-instruction stop checks.
    fn boundary(&mut self) {
        if self.debugger.is_none() {
            return;
        }
        if let Some(reason) = self.debug.check(self.regs.pc, self.regs.s) {
            self.halt(reason);
        }
    }

    fn record_trace<B: Bus>(&mut self, bus: &B, pc: u16) {
        if self.trace.is_none() && self.debugger.is_none() {
            return;
        }
        let [pcl, pch] = pc.to_le_bytes();
        let entry = TraceEntry {
            pcl,
            pch,
            opcode: self.opcode,
            operand1: bus.peek(pc.wrapping_add(1)),
            operand2: bus.peek(pc.wrapping_add(2)),
            a: self.regs.a,
            x: self.regs.x,
            y: self.regs.y,
            s: self.regs.s,
            p: self.regs.p.to_byte(),
        };
        if let Some(log) = self.trace.as_mut() {
            log.record(entry);
        }
        if let Some(debugger) = self.debugger.as_mut() {
            debugger.trace(&entry);
        }
    }

    // ========================================================================
    // Decode
    // ========================================================================

    /// Start the next instruction or interrupt sequence.
    fn dispatch<B: Bus>(&mut self, bus: &mut B) {
        self.extra_cycles = 0;

        if self.nmi_pending {
            self.nmi_pending = false;
            self.cycles = self.interrupt(bus, Interrupt::Nmi);
            return;
        }
        if bus.irq_signal() && !self.regs.p.is_set(I) {
            self.cycles = self.interrupt(bus, Interrupt::Irq);
            return;
        }
        self.short_branch = false;

        let pc = self.regs.pc;
        self.opcode = bus.read(pc);
        let entry = self.table[self.opcode as usize];
        self.record_trace(&*bus, pc);

        let Some(instruction) = entry.instruction else {
            self.cycles = self.interrupt(bus, Interrupt::Jam);
            return;
        };

        if entry.undocumented {
            if let Some(reason) = self.debug.illegal(self.opcode) {
                debug!("undocumented opcode ${:02X} at ${pc:04X}", self.opcode);
                self.halt(reason);
            }
        }

        self.regs.pc = pc.wrapping_add(1);
        let operand = self.resolve(bus, entry.mode);
        if entry.page_penalty && operand.page_crossed {
            self.extra_cycles += 1;
        }

        if entry.deferred {
            self.deferred = Some(Deferred {
                instruction,
                address: operand.address,
            });
        } else {
            self.execute(bus, instruction, entry.mode, operand);
        }
        self.cycles = entry.cycles + self.extra_cycles;
    }

    /// Enter an interrupt level. Returns the sequence length in cycles.
    fn interrupt<B: Bus>(&mut self, bus: &mut B, kind: Interrupt) -> u8 {
        if kind == Interrupt::Jam {
            let jam = Jam {
                address: self.regs.pc,
                opcode: self.opcode,
            };
            warn!(
                "6502 jammed on opcode ${:02X} at ${:04X}",
                jam.opcode, jam.address
            );
            self.jam = Some(jam);
            self.deferred = None;
            self.pending_write = None;
            bus.set_cpu_jammed(true);
            if let Some(debugger) = self.debugger.as_mut() {
                debugger.jam(jam.address, jam.opcode);
            }
            return 0;
        }

        let stack = self.regs.s;
        let (return_pc, status) = if kind == Interrupt::Break {
            // Skip the padding byte after BRK.
            (self.regs.pc.wrapping_add(1), self.regs.p.to_byte_brk())
        } else {
            (self.regs.pc, self.regs.p.to_byte_irq())
        };
        self.push_word(bus, return_pc);
        self.push(bus, status);
        self.regs.p.set(I);

        let vector = if kind == Interrupt::Nmi {
            NMI_VECTOR
        } else {
            IRQ_VECTOR
        };
        self.regs.pc = Self::read_word(bus, vector);

        if kind == Interrupt::Break {
            return INTERRUPT_CYCLES;
        }

        // A taken branch that stays in its page hides one cycle of the
        // interrupt sequence.
        let cycles = INTERRUPT_CYCLES - u8::from(self.short_branch);
        self.short_branch = false;

        debug!(
            "{kind:?} from ${return_pc:04X} to ${:04X}",
            self.regs.pc
        );
        // Frames below the new one on the stack can no longer be returned to.
        self.frames.retain(|frame| frame.stack > stack);
        self.frames.push(InterruptFrame {
            kind,
            handler_pc: self.regs.pc,
            return_pc,
            stack,
            entered_at: self.total_cycles,
        });
        if let Some(debugger) = self.debugger.as_mut() {
            debugger.interrupt(&InterruptEvent {
                kind,
                return_pc,
                handler_pc: self.regs.pc,
                cycle: self.total_cycles.get(),
            });
        }
        cycles
    }

    fn interrupt_returned(&mut self) {
        let Some(frame) = self.frames.last().copied() else {
            return;
        };
        if frame.stack != self.regs.s {
            return;
        }
        self.frames.pop();
        // Called on RTI's first cycle; RTI ends five cycles later.
        let elapsed = (self.total_cycles + Ticks::new(6)).since(frame.entered_at).get();
        if let Some(debugger) = self.debugger.as_mut() {
            debugger.interrupt_return(&InterruptReturn {
                kind: frame.kind,
                handler_pc: frame.handler_pc,
                return_pc: frame.return_pc,
                elapsed,
            });
        }
    }

    // ========================================================================
    // Execute
    // ========================================================================

    /// Value read by a read-class instruction.
    fn operand_value<B: Bus>(&mut self, bus: &mut B, mode: AddrMode, operand: Operand) -> u8 {
        match mode {
            AddrMode::Accumulator => self.regs.a,
            _ => bus.read(operand.address),
        }
    }

    fn store(&mut self, address: u16, value: u8) {
        self.pending_write = Some((address, value));
    }

    fn branch(&mut self, taken: bool, operand: Operand) {
        if !taken {
            return;
        }
        self.extra_cycles += 1;
        if operand.page_crossed {
            self.extra_cycles += 1;
        } else {
            self.short_branch = true;
        }
        self.regs.pc = operand.address;
    }

    /// SHA/SHX/SHY/TAS store: value ANDed with the base high byte plus one.
    /// When indexing crossed a page the value also replaces the high byte
    /// of the target address.
    fn store_high_and(&mut self, value: u8, operand: Operand) {
        let high = (operand.base >> 8) as u8;
        let result = value & high.wrapping_add(1);
        let address = if operand.page_crossed {
            (u16::from(result) << 8) | (operand.address & 0x00FF)
        } else {
            operand.address
        };
        self.store(address, result);
    }

    fn read_modify_write<B: Bus>(&mut self, bus: &mut B, deferred: Deferred) {
        let address = deferred.address;
        let original = bus.read(address);
        bus.write(address, original);
        let result = self.modify(deferred.instruction, original);
        self.store(address, result);
    }

    /// Modify step of a read-modify-write, including the register half of
    /// the undocumented combined opcodes.
    fn modify(&mut self, instruction: Instruction, value: u8) -> u8 {
        match instruction {
            Instruction::Asl => self.asl(value),
            Instruction::Lsr => self.lsr(value),
            Instruction::Rol => self.rol(value),
            Instruction::Ror => self.ror(value),
            Instruction::Inc => {
                let result = value.wrapping_add(1);
                self.regs.p.update_nz(result);
                result
            }
            Instruction::Dec => {
                let result = value.wrapping_sub(1);
                self.regs.p.update_nz(result);
                result
            }
            Instruction::Slo => {
                let result = self.asl(value);
                self.regs.a |= result;
                self.regs.p.update_nz(self.regs.a);
                result
            }
            Instruction::Rla => {
                let result = self.rol(value);
                self.regs.a &= result;
                self.regs.p.update_nz(self.regs.a);
                result
            }
            Instruction::Sre => {
                let result = self.lsr(value);
                self.regs.a ^= result;
                self.regs.p.update_nz(self.regs.a);
                result
            }
            Instruction::Rra => {
                let result = self.ror(value);
                self.adc(result);
                result
            }
            Instruction::Dcp => {
                let result = value.wrapping_sub(1);
                self.compare(self.regs.a, result);
                result
            }
            Instruction::Isc => {
                let result = value.wrapping_add(1);
                self.sbc(result);
                result
            }
            _ => value,
        }
    }

    #[allow(clippy::too_many_lines)]
    fn execute<B: Bus>(
        &mut self,
        bus: &mut B,
        instruction: Instruction,
        mode: AddrMode,
        operand: Operand,
    ) {
        match instruction {
            // Loads
            Instruction::Lda => {
                self.regs.a = self.operand_value(bus, mode, operand);
                self.regs.p.update_nz(self.regs.a);
            }
            Instruction::Ldx => {
                self.regs.x = self.operand_value(bus, mode, operand);
                self.regs.p.update_nz(self.regs.x);
            }
            Instruction::Ldy => {
                self.regs.y = self.operand_value(bus, mode, operand);
                self.regs.p.update_nz(self.regs.y);
            }
            Instruction::Lax => {
                let value = self.operand_value(bus, mode, operand);
                self.regs.a = value;
                self.regs.x = value;
                self.regs.p.update_nz(value);
            }
            Instruction::Las => {
                let value = self.operand_value(bus, mode, operand) & self.regs.s;
                self.regs.a = value;
                self.regs.x = value;
                self.regs.s = value;
                self.regs.p.update_nz(value);
            }

            // Stores
            Instruction::Sta => self.store(operand.address, self.regs.a),
            Instruction::Stx => self.store(operand.address, self.regs.x),
            Instruction::Sty => self.store(operand.address, self.regs.y),
            Instruction::Sax => self.store(operand.address, self.regs.a & self.regs.x),
            Instruction::Sha => self.store_high_and(self.regs.a & self.regs.x, operand),
            Instruction::Shx => self.store_high_and(self.regs.x, operand),
            Instruction::Shy => self.store_high_and(self.regs.y, operand),
            Instruction::Tas => {
                self.regs.s = self.regs.a & self.regs.x;
                self.store_high_and(self.regs.s, operand);
            }

            // Arithmetic and logic
            Instruction::Adc => {
                let value = self.operand_value(bus, mode, operand);
                self.adc(value);
            }
            Instruction::Sbc => {
                let value = self.operand_value(bus, mode, operand);
                self.sbc(value);
            }
            Instruction::And => {
                self.regs.a &= self.operand_value(bus, mode, operand);
                self.regs.p.update_nz(self.regs.a);
            }
            Instruction::Ora => {
                self.regs.a |= self.operand_value(bus, mode, operand);
                self.regs.p.update_nz(self.regs.a);
            }
            Instruction::Eor => {
                self.regs.a ^= self.operand_value(bus, mode, operand);
                self.regs.p.update_nz(self.regs.a);
            }
            Instruction::Cmp => {
                let value = self.operand_value(bus, mode, operand);
                self.compare(self.regs.a, value);
            }
            Instruction::Cpx => {
                let value = self.operand_value(bus, mode, operand);
                self.compare(self.regs.x, value);
            }
            Instruction::Cpy => {
                let value = self.operand_value(bus, mode, operand);
                self.compare(self.regs.y, value);
            }
            Instruction::Bit => {
                let value = self.operand_value(bus, mode, operand);
                self.bit(value);
            }

            // Accumulator shifts; memory forms are deferred
            Instruction::Asl => self.regs.a = self.asl(self.regs.a),
            Instruction::Lsr => self.regs.a = self.lsr(self.regs.a),
            Instruction::Rol => self.regs.a = self.rol(self.regs.a),
            Instruction::Ror => self.regs.a = self.ror(self.regs.a),

            // Undocumented immediates
            Instruction::Anc => {
                self.regs.a &= self.operand_value(bus, mode, operand);
                self.regs.p.update_nz(self.regs.a);
                self.regs.p.set_if(C, self.regs.a & 0x80 != 0);
            }
            Instruction::Alr => {
                let value = self.regs.a & self.operand_value(bus, mode, operand);
                self.regs.a = self.lsr(value);
            }
            Instruction::Arr => {
                let value = self.operand_value(bus, mode, operand);
                self.arr(value);
            }
            Instruction::Ane => {
                let value = self.operand_value(bus, mode, operand);
                self.regs.a = (self.regs.a | self.config.unstable_magic) & self.regs.x & value;
                self.regs.p.update_nz(self.regs.a);
            }
            Instruction::Lxa => {
                let value = self.operand_value(bus, mode, operand);
                self.regs.a = (self.regs.a | self.config.unstable_magic) & value;
                self.regs.x = self.regs.a;
                self.regs.p.update_nz(self.regs.a);
            }
            Instruction::Sbx => {
                let value = self.operand_value(bus, mode, operand);
                let and = self.regs.a & self.regs.x;
                self.regs.p.set_if(C, and >= value);
                self.regs.x = and.wrapping_sub(value);
                self.regs.p.update_nz(self.regs.x);
            }

            // Register increments and transfers
            Instruction::Inx => {
                self.regs.x = self.regs.x.wrapping_add(1);
                self.regs.p.update_nz(self.regs.x);
            }
            Instruction::Iny => {
                self.regs.y = self.regs.y.wrapping_add(1);
                self.regs.p.update_nz(self.regs.y);
            }
            Instruction::Dex => {
                self.regs.x = self.regs.x.wrapping_sub(1);
                self.regs.p.update_nz(self.regs.x);
            }
            Instruction::Dey => {
                self.regs.y = self.regs.y.wrapping_sub(1);
                self.regs.p.update_nz(self.regs.y);
            }
            Instruction::Tax => {
                self.regs.x = self.regs.a;
                self.regs.p.update_nz(self.regs.x);
            }
            Instruction::Tay => {
                self.regs.y = self.regs.a;
                self.regs.p.update_nz(self.regs.y);
            }
            Instruction::Txa => {
                self.regs.a = self.regs.x;
                self.regs.p.update_nz(self.regs.a);
            }
            Instruction::Tya => {
                self.regs.a = self.regs.y;
                self.regs.p.update_nz(self.regs.a);
            }
            Instruction::Tsx => {
                self.regs.x = self.regs.s;
                self.regs.p.update_nz(self.regs.x);
            }
            Instruction::Txs => self.regs.s = self.regs.x,

            // Flags
            Instruction::Clc => self.regs.p.clear(C),
            Instruction::Sec => self.regs.p.set(C),
            Instruction::Cli => self.regs.p.clear(I),
            Instruction::Sei => self.regs.p.set(I),
            Instruction::Cld => self.regs.p.clear(D),
            Instruction::Sed => self.regs.p.set(D),
            Instruction::Clv => self.regs.p.clear(V),

            // Branches
            Instruction::Bpl => self.branch(!self.regs.p.is_set(N), operand),
            Instruction::Bmi => self.branch(self.regs.p.is_set(N), operand),
            Instruction::Bvc => self.branch(!self.regs.p.is_set(V), operand),
            Instruction::Bvs => self.branch(self.regs.p.is_set(V), operand),
            Instruction::Bcc => self.branch(!self.regs.p.is_set(C), operand),
            Instruction::Bcs => self.branch(self.regs.p.is_set(C), operand),
            Instruction::Bne => self.branch(!self.regs.p.is_set(Z), operand),
            Instruction::Beq => self.branch(self.regs.p.is_set(Z), operand),

            // Jumps and stack
            Instruction::Jmp => self.regs.pc = operand.address,
            Instruction::Jsr => {
                let return_addr = self.regs.pc.wrapping_sub(1);
                self.push_word(bus, return_addr);
                self.regs.pc = operand.address;
            }
            Instruction::Rts => {
                self.regs.pc = self.pull_word(bus).wrapping_add(1);
            }
            Instruction::Rti => {
                let status = self.pull(bus);
                self.regs.p = Status::from_byte(status);
                self.regs.pc = self.pull_word(bus);
                self.interrupt_returned();
            }
            Instruction::Brk => {
                self.interrupt(bus, Interrupt::Break);
            }
            Instruction::Pha => self.push(bus, self.regs.a),
            Instruction::Php => self.push(bus, self.regs.p.to_byte_brk()),
            Instruction::Pla => {
                self.regs.a = self.pull(bus);
                self.regs.p.update_nz(self.regs.a);
            }
            Instruction::Plp => {
                let status = self.pull(bus);
                self.regs.p = Status::from_byte(status);
            }

            Instruction::Nop => {
                // Undocumented NOPs with a memory operand still read it.
                if !matches!(
                    mode,
                    AddrMode::Implied | AddrMode::Accumulator | AddrMode::Immediate
                ) {
                    bus.read(operand.address);
                }
            }

            // Memory read-modify-write forms are armed in dispatch.
            Instruction::Inc
            | Instruction::Dec
            | Instruction::Slo
            | Instruction::Rla
            | Instruction::Sre
            | Instruction::Rra
            | Instruction::Dcp
            | Instruction::Isc => {}
        }
    }
}

impl Cpu for Mos6502 {
    type Registers = Registers;

    fn step_cycle<B: Bus>(&mut self, bus: &mut B) -> bool {
        Mos6502::step_cycle(self, bus)
    }

    fn pc(&self) -> u16 {
        self.regs.pc
    }

    fn registers(&self) -> Self::Registers {
        self.regs
    }

    fn is_jammed(&self) -> bool {
        self.jam.is_some()
    }

    fn reset<B: Bus>(&mut self, bus: &mut B) {
        Mos6502::reset(self, bus);
    }
}

const CPU_QUERY_PATHS: &[&str] = &[
    "pc",
    "a",
    "x",
    "y",
    "sp",
    "sr",
    "flags.c",
    "flags.z",
    "flags.i",
    "flags.d",
    "flags.v",
    "flags.n",
    "opcode",
    "cycles",
    "jammed",
];

impl Observable for Mos6502 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pc" => Some(self.regs.pc.into()),
            "a" => Some(self.regs.a.into()),
            "x" => Some(self.regs.x.into()),
            "y" => Some(self.regs.y.into()),
            "sp" | "s" => Some(self.regs.s.into()),
            "sr" | "p" => Some(self.sr().into()),
            "flags.c" => Some(self.regs.p.is_set(C).into()),
            "flags.z" => Some(self.regs.p.is_set(Z).into()),
            "flags.i" => Some(self.regs.p.is_set(I).into()),
            "flags.d" => Some(self.regs.p.is_set(D).into()),
            "flags.v" => Some(self.regs.p.is_set(V).into()),
            "flags.n" => Some(self.regs.p.is_set(N).into()),
            "opcode" => Some(self.opcode.into()),
            "cycles" => Some(self.total_cycles.get().into()),
            "jammed" => Some(self.jam.is_some().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        CPU_QUERY_PATHS
    }
}
