//! Operand resolution for the 13 addressing modes.
//!
//! Operand bytes and indirect pointers are read when the instruction is
//! decoded. The data access itself happens in the executor, or on the
//! penultimate cycle for read-modify-write instructions.

use emu_core::Bus;

use crate::cpu::Mos6502;
use crate::opcodes::AddrMode;

/// Resolved effective address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Operand {
    /// Effective address. For immediate mode this is the operand byte's
    /// address; for relative mode it is the branch target.
    pub address: u16,
    /// Address before indexing (the pointer target for `($nn),Y`, the
    /// fall-through PC for branches).
    pub base: u16,
    /// Indexing or the branch moved to a different page.
    pub page_crossed: bool,
}

impl Operand {
    fn direct(address: u16) -> Self {
        Self {
            address,
            base: address,
            page_crossed: false,
        }
    }

    fn indexed(base: u16, index: u8) -> Self {
        let address = base.wrapping_add(u16::from(index));
        Self {
            address,
            base,
            page_crossed: (base ^ address) & 0xFF00 != 0,
        }
    }
}

impl Mos6502 {
    /// Read the byte at PC and advance PC.
    pub(crate) fn fetch<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let value = bus.read(self.regs.pc);
        self.regs.pc = self.regs.pc.wrapping_add(1);
        value
    }

    fn fetch_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.fetch(bus);
        let hi = self.fetch(bus);
        u16::from_le_bytes([lo, hi])
    }

    /// Read a little-endian word.
    pub(crate) fn read_word<B: Bus>(bus: &mut B, address: u16) -> u16 {
        let lo = bus.read(address);
        let hi = bus.read(address.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    /// Read a word whose high byte comes from the same page as the low
    /// byte. Zero-page pointers and `JMP ($xxFF)` both wrap this way.
    fn read_word_in_page<B: Bus>(bus: &mut B, address: u16) -> u16 {
        let lo = bus.read(address);
        let hi_addr = (address & 0xFF00) | (address.wrapping_add(1) & 0x00FF);
        let hi = bus.read(hi_addr);
        u16::from_le_bytes([lo, hi])
    }

    /// Consume operand bytes and compute the effective address.
    pub(crate) fn resolve<B: Bus>(&mut self, bus: &mut B, mode: AddrMode) -> Operand {
        match mode {
            AddrMode::Implied | AddrMode::Accumulator => Operand::direct(self.regs.pc),
            AddrMode::Immediate => {
                let address = self.regs.pc;
                self.regs.pc = address.wrapping_add(1);
                Operand::direct(address)
            }
            AddrMode::ZeroPage => Operand::direct(u16::from(self.fetch(bus))),
            AddrMode::ZeroPageX => {
                let zp = self.fetch(bus).wrapping_add(self.regs.x);
                Operand::direct(u16::from(zp))
            }
            AddrMode::ZeroPageY => {
                let zp = self.fetch(bus).wrapping_add(self.regs.y);
                Operand::direct(u16::from(zp))
            }
            AddrMode::Absolute => Operand::direct(self.fetch_word(bus)),
            AddrMode::AbsoluteX => {
                let base = self.fetch_word(bus);
                Operand::indexed(base, self.regs.x)
            }
            AddrMode::AbsoluteY => {
                let base = self.fetch_word(bus);
                Operand::indexed(base, self.regs.y)
            }
            AddrMode::Indirect => {
                let pointer = self.fetch_word(bus);
                Operand::direct(Self::read_word_in_page(bus, pointer))
            }
            AddrMode::IndexedIndirect => {
                let zp = self.fetch(bus).wrapping_add(self.regs.x);
                Operand::direct(Self::read_word_in_page(bus, u16::from(zp)))
            }
            AddrMode::IndirectIndexed => {
                let zp = self.fetch(bus);
                let base = Self::read_word_in_page(bus, u16::from(zp));
                Operand::indexed(base, self.regs.y)
            }
            AddrMode::Relative => {
                let offset = self.fetch(bus) as i8;
                let base = self.regs.pc;
                let address = base.wrapping_add(offset as u16);
                Operand {
                    address,
                    base,
                    page_crossed: (base ^ address) & 0xFF00 != 0,
                }
            }
        }
    }

    // ========================================================================
    // Stack
    // ========================================================================

    pub(crate) fn push<B: Bus>(&mut self, bus: &mut B, value: u8) {
        let address = self.regs.push();
        bus.write(address, value);
    }

    pub(crate) fn pull<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let address = self.regs.pop();
        bus.read(address)
    }

    pub(crate) fn push_word<B: Bus>(&mut self, bus: &mut B, value: u16) {
        let [lo, hi] = value.to_le_bytes();
        self.push(bus, hi);
        self.push(bus, lo);
    }

    pub(crate) fn pull_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        u16::from_le_bytes([lo, hi])
    }
}
