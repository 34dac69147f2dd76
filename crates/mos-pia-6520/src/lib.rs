//! MOS 6520 Peripheral Interface Adapter (PIA).
//!
//! Two 8-bit ports, each with a data direction register, an output
//! register, a control register and two control lines (C1 input only, C2
//! input or output). The PET has two: PIA1 scans the keyboard and sees
//! the vertical retrace on CB1; PIA2 drives the IEEE-488 data lines and
//! handshakes.
//!
//! # Registers (RS1 RS0)
//!
//! | Reg | CRx bit 2 = 0 | CRx bit 2 = 1 |
//! |-----|---------------|---------------|
//! | 0   | DDRA          | PRA           |
//! | 1   | CRA           | CRA           |
//! | 2   | DDRB          | PRB           |
//! | 3   | CRB           | CRB           |
//!
//! # Control register
//!
//! | Bit | Meaning                                            |
//! |-----|----------------------------------------------------|
//! | 7   | C1 active transition seen (read only)              |
//! | 6   | C2 active transition seen (read only, C2 input)    |
//! | 5-3 | C2 control                                         |
//! | 2   | 0 = DDR, 1 = data register                         |
//! | 1   | C1 active edge (0 = falling, 1 = rising)           |
//! | 0   | C1 interrupt enable                                |

use emu_core::{Observable, Tickable, Value};

pub const CR_IRQ1: u8 = 0x80;
pub const CR_IRQ2: u8 = 0x40;
const CR_C2_OUTPUT: u8 = 0x20;
const CR_C2_EDGE: u8 = 0x10;
const CR_C2_CONTROL: u8 = 0x08;
const CR_DATA: u8 = 0x04;
const CR_C1_EDGE: u8 = 0x02;
const CR_C1_ENABLE: u8 = 0x01;

/// One side of the PIA.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Port {
    or: u8,
    ddr: u8,
    cr: u8,
    c1: bool,
    c2_in: bool,
    c2_out: bool,
    c2_pulse: bool,
}

impl Port {
    fn new() -> Self {
        Self {
            or: 0,
            ddr: 0,
            cr: 0,
            c1: true,
            c2_in: true,
            c2_out: true,
            c2_pulse: false,
        }
    }

    fn pins(&self, external: u8) -> u8 {
        (self.or & self.ddr) | (external & !self.ddr)
    }

    fn irq(&self) -> bool {
        let c1 = self.cr & CR_IRQ1 != 0 && self.cr & CR_C1_ENABLE != 0;
        let c2 = self.cr & CR_IRQ2 != 0
            && self.cr & CR_C2_CONTROL != 0
            && self.cr & CR_C2_OUTPUT == 0;
        c1 || c2
    }

    fn write_cr(&mut self, value: u8) {
        self.cr = (self.cr & (CR_IRQ1 | CR_IRQ2)) | (value & 0x3F);
        if self.cr & CR_C2_OUTPUT == 0 {
            // C2 turned into an input: its flag stays, the output floats high.
            self.c2_out = true;
        } else {
            self.cr &= !CR_IRQ2;
            if self.cr & CR_C2_EDGE != 0 {
                self.c2_out = self.cr & CR_C2_CONTROL != 0;
            } else {
                self.c2_out = true;
            }
        }
    }

    /// Handshake or pulse output started by a data-register access.
    fn strobe(&mut self) {
        if self.cr & (CR_C2_OUTPUT | CR_C2_EDGE) == CR_C2_OUTPUT {
            self.c2_out = false;
            self.c2_pulse = self.cr & CR_C2_CONTROL != 0;
        }
    }

    fn set_c1(&mut self, level: bool) {
        let rising = self.cr & CR_C1_EDGE != 0;
        if edge(self.c1, level, rising) {
            self.cr |= CR_IRQ1;
            // Handshake mode: the peripheral's acknowledge ends the strobe.
            if self.cr & (CR_C2_OUTPUT | CR_C2_EDGE | CR_C2_CONTROL) == CR_C2_OUTPUT {
                self.c2_out = true;
            }
        }
        self.c1 = level;
    }

    fn set_c2(&mut self, level: bool) {
        if self.cr & CR_C2_OUTPUT == 0 && edge(self.c2_in, level, self.cr & CR_C2_EDGE != 0) {
            self.cr |= CR_IRQ2;
        }
        self.c2_in = level;
    }

    fn tick(&mut self) {
        if self.c2_pulse {
            self.c2_pulse = false;
            self.c2_out = true;
        }
    }

    fn c2_output(&self) -> bool {
        if self.cr & CR_C2_OUTPUT != 0 {
            self.c2_out
        } else {
            true
        }
    }
}

/// MOS 6520 Peripheral Interface Adapter.
#[derive(Debug, Clone)]
pub struct Pia6520 {
    a: Port,
    b: Port,
    /// External input lines for port A.
    pub external_a: u8,
    /// External input lines for port B.
    pub external_b: u8,
}

impl Pia6520 {
    /// Create a PIA in its reset state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            a: Port::new(),
            b: Port::new(),
            external_a: 0xFF,
            external_b: 0xFF,
        }
    }

    /// Reset line: all registers clear, C2 lines float high.
    pub fn reset(&mut self) {
        self.a = Port::new();
        self.b = Port::new();
    }

    /// Advance one cycle. Ends C2 output pulses.
    pub fn tick(&mut self) {
        self.a.tick();
        self.b.tick();
    }

    /// Read a PIA register.
    ///
    /// Reading a data register clears that port's interrupt flags. A read
    /// of port A starts a CA2 handshake or pulse.
    pub fn read(&mut self, reg: u8) -> u8 {
        let value = self.dump(reg);
        match reg & 0x03 {
            0x00 if self.a.cr & CR_DATA != 0 => {
                self.a.cr &= !(CR_IRQ1 | CR_IRQ2);
                self.a.strobe();
            }
            0x02 if self.b.cr & CR_DATA != 0 => {
                self.b.cr &= !(CR_IRQ1 | CR_IRQ2);
            }
            _ => {}
        }
        value
    }

    /// Register value as `read` would return it, with no side effects.
    #[must_use]
    pub fn dump(&self, reg: u8) -> u8 {
        match reg & 0x03 {
            0x00 if self.a.cr & CR_DATA != 0 => self.a.pins(self.external_a),
            0x00 => self.a.ddr,
            0x01 => self.a.cr,
            0x02 if self.b.cr & CR_DATA != 0 => self.b.pins(self.external_b),
            0x02 => self.b.ddr,
            _ => self.b.cr,
        }
    }

    /// Write a PIA register. A write of port B starts a CB2 handshake or
    /// pulse.
    pub fn write(&mut self, reg: u8, value: u8) {
        match reg & 0x03 {
            0x00 if self.a.cr & CR_DATA != 0 => self.a.or = value,
            0x00 => self.a.ddr = value,
            0x01 => self.a.write_cr(value),
            0x02 if self.b.cr & CR_DATA != 0 => {
                self.b.or = value;
                self.b.strobe();
            }
            0x02 => self.b.ddr = value,
            _ => self.b.write_cr(value),
        }
    }

    pub fn set_ca1(&mut self, level: bool) {
        self.a.set_c1(level);
    }

    pub fn set_ca2(&mut self, level: bool) {
        self.a.set_c2(level);
    }

    pub fn set_cb1(&mut self, level: bool) {
        self.b.set_c1(level);
    }

    pub fn set_cb2(&mut self, level: bool) {
        self.b.set_c2(level);
    }

    /// Port A pins as seen from outside.
    #[must_use]
    pub fn port_a_output(&self) -> u8 {
        self.a.pins(self.external_a)
    }

    /// Port B pins as seen from outside.
    #[must_use]
    pub fn port_b_output(&self) -> u8 {
        self.b.pins(self.external_b)
    }

    /// CA2 level. High whenever CA2 is an input.
    #[must_use]
    pub fn ca2_output(&self) -> bool {
        self.a.c2_output()
    }

    /// CB2 level. High whenever CB2 is an input.
    #[must_use]
    pub fn cb2_output(&self) -> bool {
        self.b.c2_output()
    }

    /// IRQA: a flag in CRA with its enable set.
    #[must_use]
    pub fn irq_a(&self) -> bool {
        self.a.irq()
    }

    /// IRQB: a flag in CRB with its enable set.
    #[must_use]
    pub fn irq_b(&self) -> bool {
        self.b.irq()
    }

    /// Either interrupt output asserted.
    #[must_use]
    pub fn irq_active(&self) -> bool {
        self.a.irq() || self.b.irq()
    }

    #[must_use]
    pub fn cra(&self) -> u8 {
        self.a.cr
    }

    #[must_use]
    pub fn crb(&self) -> u8 {
        self.b.cr
    }
}

/// True when `from -> to` is the selected edge.
fn edge(from: bool, to: bool, rising: bool) -> bool {
    if rising { !from && to } else { from && !to }
}

impl Default for Pia6520 {
    fn default() -> Self {
        Self::new()
    }
}

impl Tickable for Pia6520 {
    fn tick(&mut self) {
        Pia6520::tick(self);
    }
}

const PIA_QUERY_PATHS: &[&str] = &[
    "pra", "ddra", "cra", "prb", "ddrb", "crb", "ca2", "cb2", "irqa", "irqb",
];

impl Observable for Pia6520 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "pra" => Some(self.a.pins(self.external_a).into()),
            "ddra" => Some(self.a.ddr.into()),
            "cra" => Some(self.a.cr.into()),
            "prb" => Some(self.b.pins(self.external_b).into()),
            "ddrb" => Some(self.b.ddr.into()),
            "crb" => Some(self.b.cr.into()),
            "ca2" => Some(self.ca2_output().into()),
            "cb2" => Some(self.cb2_output().into()),
            "irqa" => Some(self.irq_a().into()),
            "irqb" => Some(self.irq_b().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        PIA_QUERY_PATHS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cr_bit2_selects_ddr_or_data() {
        let mut pia = Pia6520::new();
        pia.write(0, 0xF0); // DDRA
        assert_eq!(pia.read(0), 0xF0);

        pia.write(1, CR_DATA);
        pia.write(0, 0xAA); // PRA
        pia.external_a = 0x05;
        assert_eq!(pia.read(0), 0xA5, "outputs from PRA, inputs from pins");
        assert_eq!(pia.a.ddr, 0xF0);
    }

    #[test]
    fn control_register_flags_are_read_only() {
        let mut pia = Pia6520::new();
        pia.write(1, 0xFF);
        assert_eq!(pia.read(1), 0x3F);
    }

    #[test]
    fn c1_edge_sets_flag_and_irq_when_enabled() {
        let mut pia = Pia6520::new();
        pia.write(3, CR_DATA); // CB1 falling edge, IRQ disabled
        pia.set_cb1(false);
        assert_eq!(pia.crb() & CR_IRQ1, CR_IRQ1);
        assert!(!pia.irq_active());

        pia.write(3, CR_DATA | CR_C1_ENABLE);
        assert!(pia.irq_b(), "enabling with the flag pending asserts IRQ");

        let _ = pia.read(2);
        assert_eq!(pia.crb() & CR_IRQ1, 0, "data read acknowledges");
        assert!(!pia.irq_active());
    }

    #[test]
    fn rising_edge_polarity() {
        let mut pia = Pia6520::new();
        pia.write(1, CR_C1_EDGE | CR_C1_ENABLE);
        pia.set_ca1(false);
        assert!(!pia.irq_a());
        pia.set_ca1(true);
        assert!(pia.irq_a());
    }

    #[test]
    fn c2_input_edge_needs_enable_for_irq() {
        let mut pia = Pia6520::new();
        pia.write(1, 0x00);
        pia.set_ca2(false);
        assert_eq!(pia.cra() & CR_IRQ2, CR_IRQ2);
        assert!(!pia.irq_a());

        pia.write(1, CR_C2_CONTROL);
        assert!(pia.irq_a());
    }

    #[test]
    fn ddr_read_does_not_acknowledge() {
        let mut pia = Pia6520::new();
        pia.set_ca1(false);
        let _ = pia.read(0); // DDRA selected
        assert_eq!(pia.cra() & CR_IRQ1, CR_IRQ1);
    }

    #[test]
    fn manual_c2_output() {
        let mut pia = Pia6520::new();
        pia.write(1, 0x30); // CA2 manual low
        assert!(!pia.ca2_output());
        pia.write(1, 0x38); // CA2 manual high
        assert!(pia.ca2_output());
    }

    #[test]
    fn ca2_read_handshake() {
        let mut pia = Pia6520::new();
        pia.write(1, 0x20 | CR_DATA); // CA2 handshake on read
        assert!(pia.ca2_output());
        let _ = pia.read(0);
        assert!(!pia.ca2_output());
        pia.tick();
        assert!(!pia.ca2_output(), "handshake holds until CA1");
        pia.set_ca1(false);
        assert!(pia.ca2_output());
    }

    #[test]
    fn cb2_write_pulse() {
        let mut pia = Pia6520::new();
        pia.write(3, 0x28 | CR_DATA); // CB2 pulse on write
        pia.write(2, 0x55);
        assert!(!pia.cb2_output());
        pia.tick();
        assert!(pia.cb2_output());
    }

    #[test]
    fn dump_has_no_side_effects() {
        let mut pia = Pia6520::new();
        pia.write(1, CR_DATA);
        pia.set_ca1(false);
        let _ = pia.dump(0);
        assert_eq!(pia.cra() & CR_IRQ1, CR_IRQ1);
    }

    #[test]
    fn reset_clears_registers() {
        let mut pia = Pia6520::new();
        pia.write(1, 0x3F);
        pia.write(0, 0x12);
        pia.reset();
        assert_eq!(pia.read(1), 0);
        assert_eq!(pia.read(0), 0);
    }

    #[test]
    fn observable_paths_resolve() {
        let pia = Pia6520::new();
        for path in pia.query_paths() {
            assert!(pia.query(path).is_some(), "{path}");
        }
    }
}
