//! MOS 6522 Versatile Interface Adapter (VIA).
//!
//! The 6522 provides two 8-bit I/O ports with handshake lines, two 16-bit
//! timers, a serial shift register, and an interrupt controller. On the
//! PET it drives the user port, the character-set select line (CA2), the
//! cassette motor and the CB2 sound output.
//!
//! # Registers ($0-$F)
//!
//! | Reg | Name | Description                         |
//! |-----|------|-------------------------------------|
//! | $0  | ORB  | Port B data (handshake)             |
//! | $1  | ORA  | Port A data (handshake)             |
//! | $2  | DDRB | Port B data direction (1 = output)  |
//! | $3  | DDRA | Port A data direction (1 = output)  |
//! | $4  | T1CL | Timer 1 counter low (read clears T1 IRQ) |
//! | $5  | T1CH | Timer 1 counter high (write starts T1) |
//! | $6  | T1LL | Timer 1 latch low                   |
//! | $7  | T1LH | Timer 1 latch high                  |
//! | $8  | T2CL | Timer 2 counter low (read clears T2 IRQ) |
//! | $9  | T2CH | Timer 2 counter high (write starts T2) |
//! | $A  | SR   | Shift register (access starts a transfer) |
//! | $B  | ACR  | Auxiliary control register           |
//! | $C  | PCR  | Peripheral control register          |
//! | $D  | IFR  | Interrupt flag register              |
//! | $E  | IER  | Interrupt enable register            |
//! | $F  | ORA  | Port A data (no handshake)           |

use emu_core::{Observable, Tickable, Value};
use rand::Rng;

// IFR/IER bit masks
pub const IFR_CA2: u8 = 0x01;
pub const IFR_CA1: u8 = 0x02;
pub const IFR_SR: u8 = 0x04;
pub const IFR_CB2: u8 = 0x08;
pub const IFR_CB1: u8 = 0x10;
pub const IFR_T2: u8 = 0x20;
pub const IFR_T1: u8 = 0x40;
/// Any enabled flag set.
pub const IFR_IRQ: u8 = 0x80;

/// Shift-register clocking, ACR bits 4-2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftMode {
    Disabled,
    InTimer2,
    InSystemClock,
    InExternal,
    OutFreeRunTimer2,
    OutTimer2,
    OutSystemClock,
    OutExternal,
}

impl ShiftMode {
    #[must_use]
    pub fn from_acr(acr: u8) -> Self {
        match (acr >> 2) & 0x07 {
            0 => Self::Disabled,
            1 => Self::InTimer2,
            2 => Self::InSystemClock,
            3 => Self::InExternal,
            4 => Self::OutFreeRunTimer2,
            5 => Self::OutTimer2,
            6 => Self::OutSystemClock,
            _ => Self::OutExternal,
        }
    }

    #[must_use]
    pub fn is_output(self) -> bool {
        matches!(
            self,
            Self::OutFreeRunTimer2 | Self::OutTimer2 | Self::OutSystemClock | Self::OutExternal
        )
    }

    fn uses_timer2(self) -> bool {
        matches!(self, Self::InTimer2 | Self::OutFreeRunTimer2 | Self::OutTimer2)
    }

    fn uses_system_clock(self) -> bool {
        matches!(self, Self::InSystemClock | Self::OutSystemClock)
    }

    fn uses_external_clock(self) -> bool {
        matches!(self, Self::InExternal | Self::OutExternal)
    }
}

/// Control-line (CA2/CB2) function, a 3-bit PCR field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineMode {
    /// Input; flag on the given edge (true = positive). `independent`
    /// keeps port accesses from clearing the flag.
    Input { positive: bool, independent: bool },
    /// Low after a port access, high again on the C1 active edge.
    Handshake,
    /// Low for one cycle after a port access.
    Pulse,
    Manual(bool),
}

impl LineMode {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Self::Input { positive: false, independent: false },
            1 => Self::Input { positive: false, independent: true },
            2 => Self::Input { positive: true, independent: false },
            3 => Self::Input { positive: true, independent: true },
            4 => Self::Handshake,
            5 => Self::Pulse,
            6 => Self::Manual(false),
            _ => Self::Manual(true),
        }
    }

    fn independent(self) -> bool {
        matches!(self, Self::Input { independent: true, .. })
    }
}

/// MOS 6522 Versatile Interface Adapter.
#[derive(Debug, Clone)]
pub struct Via6522 {
    /// Port A output register.
    ora: u8,
    /// Port B output register.
    orb: u8,
    /// Port A data direction register (1 = output).
    ddra: u8,
    /// Port B data direction register (1 = output).
    ddrb: u8,
    /// External input lines for port A.
    pub external_a: u8,
    /// External input lines for port B.
    pub external_b: u8,
    /// Port A pins captured on the CA1 active edge (ACR bit 0).
    ira_latch: u8,
    /// Port B pins captured on the CB1 active edge (ACR bit 1).
    irb_latch: u8,

    /// Timer 1 counter (16-bit, counts down).
    t1_counter: u16,
    /// Timer 1 latch.
    t1_latch: u16,
    /// One-shot: flag may still fire for this arming.
    t1_armed: bool,
    /// Free-run: counter reload happens on this tick instead of a decrement.
    t1_reload: bool,
    /// PB7 driven by Timer 1 when ACR bit 7 is set.
    pb7: bool,

    /// Timer 2 counter (16-bit, counts down).
    t2_counter: u16,
    /// Timer 2 latch low byte. Also the shift-register rate divider.
    t2_latch_lo: u8,
    t2_armed: bool,
    /// Last PB6 level, for pulse counting.
    pb6_prev: bool,

    /// Shift register.
    sr: u8,
    /// Remaining clock steps in the current transfer; zero when idle.
    sr_steps: u8,
    /// Shift clock level. Every active edge toggles it; bits move on the
    /// rising edge.
    sr_clock: bool,
    /// Bit last shifted out, carried on CB2.
    sr_out: bool,

    /// Auxiliary control register (ACR).
    /// Bits 7-6: T1 control (bit 6 free-run, bit 7 PB7 output)
    /// Bit 5: T2 control (0 = timed, 1 = count PB6 pulses)
    /// Bits 4-2: Shift register control
    /// Bit 1: PB latching enable
    /// Bit 0: PA latching enable
    acr: u8,

    /// Peripheral control register (PCR).
    /// Bits 7-5: CB2 control
    /// Bit 4: CB1 edge (0 = negative, 1 = positive)
    /// Bits 3-1: CA2 control
    /// Bit 0: CA1 edge (0 = negative, 1 = positive)
    pcr: u8,

    /// Interrupt flag register. Bit 7 is kept in step by `update_ifr`.
    ifr: u8,
    /// Interrupt enable register (bits 0-6).
    ier: u8,

    ca1: bool,
    ca2_in: bool,
    cb1: bool,
    cb2_in: bool,
    /// CA2 output level when PCR makes it an output.
    ca2_out: bool,
    /// CB2 output level when PCR makes it an output.
    cb2_out: bool,
    ca2_pulse: bool,
    cb2_pulse: bool,
}

impl Via6522 {
    /// Create a new VIA in its power-on state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            ora: 0,
            orb: 0,
            ddra: 0,
            ddrb: 0,
            external_a: 0xFF,
            external_b: 0xFF,
            ira_latch: 0xFF,
            irb_latch: 0xFF,
            t1_counter: 0xFFFF,
            t1_latch: 0xFFFF,
            t1_armed: false,
            t1_reload: false,
            pb7: false,
            t2_counter: 0xFFFF,
            t2_latch_lo: 0xFF,
            t2_armed: false,
            pb6_prev: true,
            sr: 0,
            sr_steps: 0,
            sr_clock: true,
            sr_out: true,
            acr: 0,
            pcr: 0,
            ifr: 0,
            ier: 0,
            ca1: true,
            ca2_in: true,
            cb1: true,
            cb2_in: true,
            ca2_out: true,
            cb2_out: true,
            ca2_pulse: false,
            cb2_pulse: false,
        }
    }

    /// Reset line. Control, direction, data and interrupt registers clear;
    /// the timers, their latches and the shift register power up with
    /// whatever the silicon holds, drawn from `rng`.
    pub fn reset(&mut self, rng: &mut impl Rng) {
        let external_a = self.external_a;
        let external_b = self.external_b;
        *self = Self::new();
        self.external_a = external_a;
        self.external_b = external_b;
        self.t1_counter = rng.r#gen();
        self.t1_latch = rng.r#gen();
        self.t2_counter = rng.r#gen();
        self.t2_latch_lo = rng.r#gen();
        self.sr = rng.r#gen();
    }

    /// Tick the VIA for one clock cycle.
    pub fn tick(&mut self) {
        if self.ca2_pulse {
            self.ca2_pulse = false;
            self.ca2_out = true;
        }
        if self.cb2_pulse {
            self.cb2_pulse = false;
            self.cb2_out = true;
        }

        self.tick_timer1();
        let t2_edge = self.tick_timer2();

        let mode = self.shift_mode();
        if (mode.uses_timer2() && t2_edge) || mode.uses_system_clock() {
            self.shift_edge();
        }
    }

    /// Check if the VIA has an active (and enabled) interrupt.
    #[must_use]
    pub fn irq_active(&self) -> bool {
        self.ifr & IFR_IRQ != 0
    }

    /// Read a VIA register.
    pub fn read(&mut self, reg: u8) -> u8 {
        let value = self.dump(reg);
        match reg & 0x0F {
            0x00 => {
                let independent = self.cb2_mode().independent();
                self.clear_flags(if independent { IFR_CB1 } else { IFR_CB1 | IFR_CB2 });
            }
            0x01 => {
                let independent = self.ca2_mode().independent();
                self.clear_flags(if independent { IFR_CA1 } else { IFR_CA1 | IFR_CA2 });
                self.ca2_handshake();
            }
            0x04 => self.clear_flags(IFR_T1),
            0x08 => self.clear_flags(IFR_T2),
            0x0A => self.start_shift(),
            _ => {}
        }
        value
    }

    /// Register value as `read` would return it, with no side effects.
    #[must_use]
    pub fn dump(&self, reg: u8) -> u8 {
        match reg & 0x0F {
            0x00 => self.read_port_b(),
            0x01 | 0x0F => self.read_port_a(),
            0x02 => self.ddrb,
            0x03 => self.ddra,
            0x04 => self.t1_counter as u8,
            0x05 => (self.t1_counter >> 8) as u8,
            0x06 => self.t1_latch as u8,
            0x07 => (self.t1_latch >> 8) as u8,
            0x08 => self.t2_counter as u8,
            0x09 => (self.t2_counter >> 8) as u8,
            0x0A => self.sr,
            0x0B => self.acr,
            0x0C => self.pcr,
            0x0D => self.ifr,
            // IER: bit 7 always reads as 1
            _ => self.ier | 0x80,
        }
    }

    /// Write a VIA register.
    pub fn write(&mut self, reg: u8, value: u8) {
        match reg & 0x0F {
            0x00 => {
                self.orb = value;
                let mode = self.cb2_mode();
                self.clear_flags(if mode.independent() { IFR_CB1 } else { IFR_CB1 | IFR_CB2 });
                match mode {
                    LineMode::Handshake => self.cb2_out = false,
                    LineMode::Pulse => {
                        self.cb2_out = false;
                        self.cb2_pulse = true;
                    }
                    _ => {}
                }
            }
            0x01 => {
                self.ora = value;
                let independent = self.ca2_mode().independent();
                self.clear_flags(if independent { IFR_CA1 } else { IFR_CA1 | IFR_CA2 });
                self.ca2_handshake();
            }
            0x02 => self.ddrb = value,
            0x03 => self.ddra = value,
            0x04 | 0x06 => {
                // Latch low byte only
                self.t1_latch = (self.t1_latch & 0xFF00) | u16::from(value);
            }
            0x05 => {
                // Latch high byte, load counter, arm, clear T1 flag.
                self.t1_latch = (self.t1_latch & 0x00FF) | (u16::from(value) << 8);
                self.t1_counter = self.t1_latch;
                self.t1_armed = true;
                self.t1_reload = false;
                self.clear_flags(IFR_T1);
                if self.acr & 0x80 != 0 {
                    self.pb7 = false;
                }
            }
            0x07 => {
                self.t1_latch = (self.t1_latch & 0x00FF) | (u16::from(value) << 8);
                self.clear_flags(IFR_T1);
            }
            0x08 => self.t2_latch_lo = value,
            0x09 => {
                self.t2_counter = u16::from(self.t2_latch_lo) | (u16::from(value) << 8);
                self.t2_armed = true;
                self.clear_flags(IFR_T2);
            }
            0x0A => {
                self.sr = value;
                self.start_shift();
            }
            0x0B => {
                let was_pb7 = self.acr & 0x80 != 0;
                self.acr = value;
                if value & 0x80 != 0 && !was_pb7 {
                    self.pb7 = true;
                }
                if self.shift_mode() == ShiftMode::Disabled {
                    self.sr_steps = 0;
                }
            }
            0x0C => {
                self.pcr = value;
                if let LineMode::Manual(level) = self.ca2_mode() {
                    self.ca2_out = level;
                } else if !matches!(self.ca2_mode(), LineMode::Handshake | LineMode::Pulse) {
                    self.ca2_out = true;
                }
                if let LineMode::Manual(level) = self.cb2_mode() {
                    self.cb2_out = level;
                } else if !matches!(self.cb2_mode(), LineMode::Handshake | LineMode::Pulse) {
                    self.cb2_out = true;
                }
            }
            0x0D => {
                // IFR: writing 1s clears the corresponding flags
                self.clear_flags(value & 0x7F);
            }
            0x0E => {
                // IER: bit 7 selects set (1) or clear (0) mode
                if value & 0x80 != 0 {
                    self.ier |= value & 0x7F;
                } else {
                    self.ier &= !(value & 0x7F);
                }
                self.update_ifr();
            }
            _ => {
                // ORA no-handshake
                self.ora = value;
            }
        }
    }

    /// Set the CA1 input line.
    ///
    /// The active edge (PCR bit 0) sets the CA1 flag, latches port A when
    /// ACR bit 0 is set, and ends a CA2 handshake.
    pub fn set_ca1(&mut self, level: bool) {
        let positive = self.pcr & 0x01 != 0;
        if edge(self.ca1, level, positive) {
            if self.acr & 0x01 != 0 {
                self.ira_latch = self.port_a_pins();
            }
            if self.ca2_mode() == LineMode::Handshake {
                self.ca2_out = true;
            }
            self.raise(IFR_CA1);
        }
        self.ca1 = level;
    }

    /// Set the CA2 input line. Only has an effect in CA2 input modes.
    pub fn set_ca2(&mut self, level: bool) {
        if let LineMode::Input { positive, .. } = self.ca2_mode() {
            if edge(self.ca2_in, level, positive) {
                self.raise(IFR_CA2);
            }
        }
        self.ca2_in = level;
    }

    /// Set the CB1 input line.
    ///
    /// Besides the CB1 flag and port B latching, CB1 is the shift clock in
    /// the external shift-register modes.
    pub fn set_cb1(&mut self, level: bool) {
        let positive = self.pcr & 0x10 != 0;
        if edge(self.cb1, level, positive) {
            if self.acr & 0x02 != 0 {
                self.irb_latch = self.port_b_pins();
            }
            if self.cb2_mode() == LineMode::Handshake {
                self.cb2_out = true;
            }
            self.raise(IFR_CB1);
        }
        if level != self.cb1 && self.shift_mode().uses_external_clock() {
            self.shift_edge();
        }
        self.cb1 = level;
    }

    /// Set the CB2 input line: shift-register data in the shift-in modes,
    /// otherwise an interrupt input when PCR selects one.
    pub fn set_cb2(&mut self, level: bool) {
        if self.shift_mode() == ShiftMode::Disabled {
            if let LineMode::Input { positive, .. } = self.cb2_mode() {
                if edge(self.cb2_in, level, positive) {
                    self.raise(IFR_CB2);
                }
            }
        }
        self.cb2_in = level;
    }

    /// Set the PB6 input level. Falling edges count down Timer 2 in
    /// pulse-counting mode (ACR bit 5).
    pub fn set_pb6(&mut self, level: bool) {
        let falling = self.pb6_prev && !level;
        self.pb6_prev = level;
        if !falling || self.acr & 0x20 == 0 {
            return;
        }
        self.t2_counter = self.t2_counter.wrapping_sub(1);
        if self.t2_counter == 0 && self.t2_armed {
            self.t2_armed = false;
            self.raise(IFR_T2);
        }
    }

    /// Port A pins as seen from outside.
    #[must_use]
    pub fn port_a_output(&self) -> u8 {
        self.port_a_pins()
    }

    /// Port B pins as seen from outside, PB7 included.
    #[must_use]
    pub fn port_b_output(&self) -> u8 {
        self.port_b_pins()
    }

    /// CA2 output level. High whenever CA2 is configured as an input.
    #[must_use]
    pub fn ca2_output(&self) -> bool {
        self.ca2_out
    }

    /// CB2 output level. In shift-out modes this is the bit last shifted
    /// out, which the PET uses as its sound output.
    #[must_use]
    pub fn cb2_output(&self) -> bool {
        if self.shift_mode().is_output() {
            self.sr_out
        } else {
            self.cb2_out
        }
    }

    /// Get the current IFR value (bit 7 included).
    #[must_use]
    pub fn ifr(&self) -> u8 {
        self.ifr
    }

    #[must_use]
    pub fn ier(&self) -> u8 {
        self.ier
    }

    #[must_use]
    pub fn acr(&self) -> u8 {
        self.acr
    }

    #[must_use]
    pub fn pcr(&self) -> u8 {
        self.pcr
    }

    #[must_use]
    pub fn timer1_counter(&self) -> u16 {
        self.t1_counter
    }

    #[must_use]
    pub fn timer2_counter(&self) -> u16 {
        self.t2_counter
    }

    #[must_use]
    pub fn shift_register(&self) -> u8 {
        self.sr
    }

    #[must_use]
    pub fn shift_mode(&self) -> ShiftMode {
        ShiftMode::from_acr(self.acr)
    }

    // --- Internal helpers ---

    fn ca2_mode(&self) -> LineMode {
        LineMode::from_bits(self.pcr >> 1)
    }

    fn cb2_mode(&self) -> LineMode {
        LineMode::from_bits(self.pcr >> 5)
    }

    fn raise(&mut self, mask: u8) {
        self.ifr |= mask;
        self.update_ifr();
    }

    fn clear_flags(&mut self, mask: u8) {
        self.ifr &= !mask;
        self.update_ifr();
    }

    /// Recompute IFR bit 7 from the flags and enables.
    fn update_ifr(&mut self) {
        if self.ifr & self.ier & 0x7F != 0 {
            self.ifr |= IFR_IRQ;
        } else {
            self.ifr &= !IFR_IRQ;
        }
    }

    fn ca2_handshake(&mut self) {
        match self.ca2_mode() {
            LineMode::Handshake => self.ca2_out = false,
            LineMode::Pulse => {
                self.ca2_out = false;
                self.ca2_pulse = true;
            }
            _ => {}
        }
    }

    fn port_a_pins(&self) -> u8 {
        (self.ora & self.ddra) | (self.external_a & !self.ddra)
    }

    fn port_b_pins(&self) -> u8 {
        let pins = (self.orb & self.ddrb) | (self.external_b & !self.ddrb);
        if self.acr & 0x80 != 0 {
            (pins & 0x7F) | if self.pb7 { 0x80 } else { 0 }
        } else {
            pins
        }
    }

    fn read_port_a(&self) -> u8 {
        if self.acr & 0x01 != 0 {
            self.ira_latch
        } else {
            self.port_a_pins()
        }
    }

    fn read_port_b(&self) -> u8 {
        if self.acr & 0x02 != 0 {
            // Output bits still read the output register.
            (self.orb & self.ddrb) | (self.irb_latch & !self.ddrb)
        } else {
            self.port_b_pins()
        }
    }

    /// Timer 1 reaches underflow N+1 ticks after being loaded with N.
    fn tick_timer1(&mut self) {
        if self.t1_reload {
            self.t1_reload = false;
            self.t1_counter = self.t1_latch;
            return;
        }
        if self.t1_counter != 0 {
            self.t1_counter -= 1;
            return;
        }

        if self.acr & 0x40 != 0 {
            // Free-run: flag every underflow, reload on the next tick.
            self.raise(IFR_T1);
            if self.acr & 0x80 != 0 {
                self.pb7 = !self.pb7;
            }
            self.t1_reload = true;
        } else {
            if self.t1_armed {
                self.t1_armed = false;
                self.raise(IFR_T1);
                if self.acr & 0x80 != 0 {
                    self.pb7 = true;
                }
            }
            self.t1_counter = 0xFFFF;
        }
    }

    /// Returns true when the low byte underflowed in a shift-register
    /// Timer 2 mode (one shift clock edge).
    fn tick_timer2(&mut self) -> bool {
        if self.acr & 0x20 != 0 {
            return false;
        }

        if self.t2_counter == 0 && self.t2_armed {
            self.t2_armed = false;
            self.raise(IFR_T2);
        }

        if self.shift_mode().uses_timer2() && self.t2_counter as u8 == 0 {
            let high = (self.t2_counter & 0xFF00).wrapping_sub(0x0100);
            self.t2_counter = high | u16::from(self.t2_latch_lo);
            return true;
        }
        self.t2_counter = self.t2_counter.wrapping_sub(1);
        false
    }

    /// Arm a transfer: eight steps out, nine in (the first rising edge
    /// only primes the input latch).
    fn start_shift(&mut self) {
        self.clear_flags(IFR_SR);
        let mode = self.shift_mode();
        self.sr_steps = match mode {
            ShiftMode::Disabled => 0,
            m if m.is_output() => 8,
            _ => 9,
        };
        if !mode.uses_external_clock() {
            self.sr_clock = true;
        }
    }

    /// One shift-clock edge.
    fn shift_edge(&mut self) {
        let mode = self.shift_mode();
        if self.sr_steps == 0 && mode != ShiftMode::OutFreeRunTimer2 {
            return;
        }
        self.sr_clock = !self.sr_clock;
        if !self.sr_clock {
            return;
        }

        if mode.is_output() {
            let bit = self.sr & 0x80 != 0;
            self.sr = (self.sr << 1) | u8::from(bit);
            self.sr_out = bit;
            if mode == ShiftMode::OutFreeRunTimer2 {
                return;
            }
        } else if self.sr_steps == 9 {
            // Priming edge.
            self.sr_steps -= 1;
            return;
        } else {
            self.sr = (self.sr << 1) | u8::from(self.cb2_in);
        }

        self.sr_steps -= 1;
        if self.sr_steps == 0 {
            self.raise(IFR_SR);
        }
    }
}

/// True when `from -> to` is the selected edge.
fn edge(from: bool, to: bool, positive: bool) -> bool {
    if positive { !from && to } else { from && !to }
}

impl Default for Via6522 {
    fn default() -> Self {
        Self::new()
    }
}

impl Tickable for Via6522 {
    fn tick(&mut self) {
        Via6522::tick(self);
    }
}

const VIA_QUERY_PATHS: &[&str] = &[
    "ora", "orb", "ddra", "ddrb", "t1", "t1_latch", "t2", "sr", "acr", "pcr", "ifr", "ier",
    "irq", "ca2", "cb2",
];

impl Observable for Via6522 {
    fn query(&self, path: &str) -> Option<Value> {
        match path {
            "ora" => Some(self.dump(0x01).into()),
            "orb" => Some(self.dump(0x00).into()),
            "ddra" => Some(self.ddra.into()),
            "ddrb" => Some(self.ddrb.into()),
            "t1" => Some(self.t1_counter.into()),
            "t1_latch" => Some(self.t1_latch.into()),
            "t2" => Some(self.t2_counter.into()),
            "sr" => Some(self.sr.into()),
            "acr" => Some(self.acr.into()),
            "pcr" => Some(self.pcr.into()),
            "ifr" => Some(self.ifr.into()),
            "ier" => Some((self.ier | 0x80).into()),
            "irq" => Some(self.irq_active().into()),
            "ca2" => Some(self.ca2_output().into()),
            "cb2" => Some(self.cb2_output().into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        VIA_QUERY_PATHS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn start_t1(via: &mut Via6522, count: u16) {
        via.write(0x04, count as u8);
        via.write(0x05, (count >> 8) as u8);
    }

    #[test]
    fn timer1_one_shot_fires_after_n_plus_one_ticks() {
        let mut via = Via6522::new();
        start_t1(&mut via, 3);

        for _ in 0..3 {
            via.tick();
            assert_eq!(via.ifr & IFR_T1, 0);
        }
        assert_eq!(via.t1_counter, 0);
        via.tick();
        assert_ne!(via.ifr & IFR_T1, 0);
        assert_eq!(via.t1_counter, 0xFFFF);
    }

    #[test]
    fn timer1_one_shot_fires_once_per_arming() {
        let mut via = Via6522::new();
        start_t1(&mut via, 2);
        for _ in 0..3 {
            via.tick();
        }
        assert_ne!(via.ifr & IFR_T1, 0);

        via.write(0x0D, IFR_T1);
        // Let the counter wrap all the way round.
        for _ in 0..0x10001 {
            via.tick();
        }
        assert_eq!(via.ifr & IFR_T1, 0, "no second flag without re-arming");

        start_t1(&mut via, 0);
        via.tick();
        assert_ne!(via.ifr & IFR_T1, 0);
    }

    #[test]
    fn timer1_irq_needs_enable() {
        let mut via = Via6522::new();
        start_t1(&mut via, 1);
        via.tick();
        via.tick();
        assert_ne!(via.ifr & IFR_T1, 0);
        assert!(!via.irq_active());
        assert_eq!(via.read(0x0D) & IFR_IRQ, 0);

        via.write(0x0E, 0x80 | IFR_T1);
        assert!(via.irq_active());
        assert_eq!(via.read(0x0D), IFR_IRQ | IFR_T1);

        let _ = via.read(0x04);
        assert!(!via.irq_active());
        assert_eq!(via.read(0x0D), 0);
    }

    #[test]
    fn timer1_free_run_reload_takes_a_cycle() {
        let mut via = Via6522::new();
        via.write(0x0B, 0x40);
        start_t1(&mut via, 2);

        via.tick(); // 2 -> 1
        via.tick(); // 1 -> 0
        via.tick(); // underflow
        assert_ne!(via.ifr & IFR_T1, 0);
        via.tick(); // reload
        assert_eq!(via.t1_counter, 2);

        via.write(0x0D, IFR_T1);
        via.tick();
        via.tick();
        via.tick();
        assert_ne!(via.ifr & IFR_T1, 0, "period is N + 2");
    }

    #[test]
    fn pb7_one_shot_goes_high_on_underflow() {
        let mut via = Via6522::new();
        via.write(0x0B, 0x80);
        start_t1(&mut via, 1);
        assert_eq!(via.port_b_output() & 0x80, 0);
        via.tick();
        via.tick();
        assert_eq!(via.port_b_output() & 0x80, 0x80);
    }

    #[test]
    fn pb7_toggles_in_free_run() {
        let mut via = Via6522::new();
        via.write(0x0B, 0xC0);
        start_t1(&mut via, 1);
        assert!(!via.pb7);
        via.tick(); // 1 -> 0
        via.tick(); // underflow, toggle
        assert!(via.pb7);
        via.tick(); // reload
        via.tick(); // 1 -> 0
        via.tick(); // underflow, toggle
        assert!(!via.pb7);
    }

    #[test]
    fn timer2_one_shot() {
        let mut via = Via6522::new();
        via.write(0x08, 3);
        via.write(0x09, 0);

        for _ in 0..3 {
            via.tick();
        }
        assert_eq!(via.ifr & IFR_T2, 0);
        via.tick();
        assert_ne!(via.ifr & IFR_T2, 0);

        via.write(0x0D, IFR_T2);
        for _ in 0..0x10001 {
            via.tick();
        }
        assert_eq!(via.ifr & IFR_T2, 0);
    }

    #[test]
    fn timer2_counts_pb6_pulses() {
        let mut via = Via6522::new();
        via.write(0x0B, 0x20);
        via.write(0x08, 2);
        via.write(0x09, 0);

        for _ in 0..10 {
            via.tick();
        }
        assert_eq!(via.t2_counter, 2, "ticks do not count in pulse mode");

        via.set_pb6(false);
        via.set_pb6(true);
        assert_eq!(via.ifr & IFR_T2, 0);
        via.set_pb6(false);
        assert_ne!(via.ifr & IFR_T2, 0);
    }

    #[test]
    fn shift_out_under_system_clock() {
        let mut via = Via6522::new();
        via.write(0x0B, 0x18); // shift out under phi2
        via.write(0x0A, 0b1010_0000);

        let mut bits = Vec::new();
        for _ in 0..16 {
            via.tick();
            if via.sr_clock {
                bits.push(via.cb2_output());
            }
        }
        assert_eq!(
            bits,
            vec![true, false, true, false, false, false, false, false]
        );
        assert_ne!(via.ifr & IFR_SR, 0);
        assert_eq!(via.sr, 0b1010_0000, "output recirculates");
    }

    #[test]
    fn shift_in_primes_on_first_rising_edge() {
        let mut via = Via6522::new();
        via.write(0x0B, 0x08); // shift in under phi2
        via.set_cb2(true);
        let _ = via.read(0x0A);

        // Priming step plus eight data steps, two edges each.
        for _ in 0..16 {
            via.tick();
        }
        assert_eq!(via.ifr & IFR_SR, 0, "only seven bits in after 16 edges");
        via.tick();
        via.tick();
        assert_ne!(via.ifr & IFR_SR, 0);
        assert_eq!(via.sr, 0xFF);
    }

    #[test]
    fn shift_out_free_running_never_completes() {
        let mut via = Via6522::new();
        via.write(0x08, 0); // divider 0: an edge every tick
        via.write(0x0B, 0x10);
        via.write(0x0A, 0x01);
        for _ in 0..100 {
            via.tick();
        }
        assert_eq!(via.ifr & IFR_SR, 0);
    }

    #[test]
    fn shift_under_timer2_uses_low_latch_as_divider() {
        let mut via = Via6522::new();
        via.write(0x08, 1);
        via.write(0x09, 0);
        via.write(0x0B, 0x14); // shift out under T2
        via.write(0x0A, 0xFF);

        // One edge every two ticks, two edges per bit, eight bits.
        for _ in 0..31 {
            via.tick();
        }
        assert_eq!(via.ifr & IFR_SR, 0);
        via.tick();
        assert_ne!(via.ifr & IFR_SR, 0);
    }

    #[test]
    fn shift_in_from_external_clock() {
        let mut via = Via6522::new();
        via.write(0x0B, 0x0C); // shift in under CB1
        let _ = via.read(0x0A);
        for bit in [true, true, false, true, false, false, true, false, true] {
            via.set_cb2(bit);
            via.set_cb1(false);
            via.set_cb1(true);
        }
        assert_ne!(via.ifr & IFR_SR, 0);
        // First rising edge primed; the remaining eight bits shifted in.
        assert_eq!(via.sr, 0b1010_0101);
    }

    #[test]
    fn ca1_latches_port_a() {
        let mut via = Via6522::new();
        via.write(0x0B, 0x01);
        via.external_a = 0x5A;
        via.set_ca1(false);
        via.external_a = 0x00;
        assert_eq!(via.read(0x0F), 0x5A);
        assert_ne!(via.ifr & IFR_CA1, 0);
    }

    #[test]
    fn ca2_handshake_output() {
        let mut via = Via6522::new();
        via.write(0x0C, 0x08); // CA2 handshake
        assert!(via.ca2_output());
        let _ = via.read(0x01);
        assert!(!via.ca2_output());
        via.set_ca1(false);
        assert!(via.ca2_output(), "CA1 edge ends the handshake");
    }

    #[test]
    fn cb2_pulse_lasts_one_cycle() {
        let mut via = Via6522::new();
        via.write(0x0C, 0xA0); // CB2 pulse
        via.write(0x00, 0x12);
        assert!(!via.cb2_output());
        via.tick();
        assert!(via.cb2_output());
    }

    #[test]
    fn ca2_manual_output() {
        let mut via = Via6522::new();
        via.write(0x0C, 0x0C);
        assert!(!via.ca2_output());
        via.write(0x0C, 0x0E);
        assert!(via.ca2_output());
    }

    #[test]
    fn independent_ca2_flag_survives_port_read() {
        let mut via = Via6522::new();
        via.write(0x0C, 0x02); // CA2 independent, negative edge
        via.set_ca2(false);
        assert_ne!(via.ifr & IFR_CA2, 0);
        let _ = via.read(0x01);
        assert_ne!(via.ifr & IFR_CA2, 0);
    }

    #[test]
    fn cb1_edges() {
        let mut via = Via6522::new();
        via.write(0x0C, 0x10); // CB1 positive edge
        via.set_cb1(false);
        assert_eq!(via.ifr & IFR_CB1, 0);
        via.set_cb1(true);
        assert_ne!(via.ifr & IFR_CB1, 0);

        let _ = via.read(0x00);
        assert_eq!(via.ifr & IFR_CB1, 0);
    }

    #[test]
    fn external_port_reads() {
        let mut via = Via6522::new();
        via.write(0x03, 0x0F);
        via.write(0x0F, 0xAB);
        via.external_a = 0xC0;
        // Output bits from ORA, input bits from the pins.
        assert_eq!(via.read(0x0F), 0xCB);
    }

    #[test]
    fn ifr_write_clears_flags() {
        let mut via = Via6522::new();
        via.write(0x0E, 0x80 | IFR_T2);
        via.raise(IFR_T1 | IFR_T2 | IFR_CA1);
        assert!(via.irq_active());
        via.write(0x0D, IFR_T2 | IFR_CA1);
        assert_eq!(via.ifr, IFR_T1);
        assert!(!via.irq_active());
    }

    #[test]
    fn ier_set_clear_mode() {
        let mut via = Via6522::new();
        via.write(0x0E, 0x80 | IFR_T1 | IFR_CB1);
        assert_eq!(via.ier, IFR_T1 | IFR_CB1);
        via.write(0x0E, IFR_T1);
        assert_eq!(via.ier, IFR_CB1);
        assert_eq!(via.read(0x0E), 0x80 | IFR_CB1);
    }

    #[test]
    fn dump_has_no_side_effects() {
        let mut via = Via6522::new();
        via.raise(IFR_T1 | IFR_CA1);
        for reg in 0..16 {
            let _ = via.dump(reg);
        }
        assert_eq!(via.ifr & 0x7F, IFR_T1 | IFR_CA1);
    }

    #[test]
    fn reset_is_deterministic_with_seeded_rng() {
        let mut a = Via6522::new();
        let mut b = Via6522::new();
        a.write(0x0E, 0xFF);
        a.reset(&mut StdRng::seed_from_u64(7));
        b.reset(&mut StdRng::seed_from_u64(7));
        assert_eq!(a.ier, 0);
        assert_eq!(a.t1_counter, b.t1_counter);
        assert_eq!(a.t1_latch, b.t1_latch);
        assert_eq!(a.sr, b.sr);
    }

    #[test]
    fn observable_paths_resolve() {
        let via = Via6522::new();
        for path in via.query_paths() {
            assert!(via.query(path).is_some(), "{path}");
        }
        assert_eq!(via.query("ier"), Some(Value::U8(0x80)));
    }
}
