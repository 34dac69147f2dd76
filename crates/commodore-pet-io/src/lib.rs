//! Commodore PET I/O block.
//!
//! Two PIAs and a VIA share `$E800-$E87F`. Address bits 4-6 are the chip
//! selects, one per chip, so several chips can answer the same access:
//!
//! | Bit | Chip | Base    | Wiring                                        |
//! |-----|------|---------|-----------------------------------------------|
//! | 4   | PIA1 | `$E810` | keyboard row out (PA0-3), columns in (PB), CB1 retrace, CA2 screen blank |
//! | 5   | PIA2 | `$E820` | IEEE-488 data, CA2 NDAC out, CB2 DAV out      |
//! | 6   | VIA  | `$E840` | PB5 retrace, CA2 character set, CB2 audio     |
//!
//! Nothing drives the data bus when no select bit is set; the read returns
//! whatever the address bus left there, which is the high byte.

mod config;

pub use config::PetIoConfig;

use emu_core::{Observable, Tickable, Value};
use log::{debug, trace};
use mos_pia_6520::Pia6520;
use mos_via_6522::Via6522;
use rand::Rng;

const SELECT_PIA1: u8 = 0x01;
const SELECT_PIA2: u8 = 0x02;
const SELECT_VIA: u8 = 0x04;

/// VIA PB5 reads the vertical retrace line.
const VIA_PB_RETRACE: u8 = 0x20;

/// A change of an output line that the rest of the machine acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoEvent {
    /// PIA1 CA2: low blanks the screen.
    ScreenBlank(bool),
    /// PIA2 CA2: IEEE-488 NDAC level.
    Ndac(bool),
    /// PIA2 CB2: IEEE-488 DAV level.
    Dav(bool),
    /// VIA CA2: high selects the lower-case character set.
    CharacterSet(bool),
}

/// Output line levels from the previous poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Lines {
    pia1_ca2: bool,
    pia2_ca2: bool,
    pia2_cb2: bool,
    via_ca2: bool,
}

impl Lines {
    fn sample(pia1: &Pia6520, pia2: &Pia6520, via: &Via6522) -> Self {
        Self {
            pia1_ca2: pia1.ca2_output(),
            pia2_ca2: pia2.ca2_output(),
            pia2_cb2: pia2.cb2_output(),
            via_ca2: via.ca2_output(),
        }
    }
}

/// The PET chip bank.
#[derive(Debug, Clone)]
pub struct PetIo {
    pub pia1: Pia6520,
    pub pia2: Pia6520,
    pub via: Via6522,
    config: PetIoConfig,
    irq: bool,
    /// Cycle within the current video frame.
    video_cycle: u32,
    /// Retrace line: high while the beam draws, low during vertical blank.
    sync: bool,
    lines: Lines,
    events: Vec<IoEvent>,
}

impl PetIo {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PetIoConfig::default())
    }

    #[must_use]
    pub fn with_config(config: PetIoConfig) -> Self {
        let pia1 = Pia6520::new();
        let pia2 = Pia6520::new();
        let via = Via6522::new();
        let lines = Lines::sample(&pia1, &pia2, &via);
        let mut io = Self {
            pia1,
            pia2,
            via,
            config,
            irq: false,
            video_cycle: 0,
            sync: true,
            lines,
            events: Vec::new(),
        };
        io.drive_sync();
        io
    }

    /// Reset all three chips. VIA timers and shift register come up with
    /// values drawn from `rng`.
    pub fn reset(&mut self, rng: &mut impl Rng) {
        self.pia1.reset();
        self.pia2.reset();
        self.via.reset(rng);
        self.video_cycle = 0;
        self.sync = true;
        self.drive_sync();
        self.lines = Lines::sample(&self.pia1, &self.pia2, &self.via);
        self.events.clear();
        self.update_irq();
        debug!("PET I/O reset");
    }

    #[must_use]
    pub fn config(&self) -> &PetIoConfig {
        &self.config
    }

    /// Advance one bus cycle.
    pub fn tick(&mut self) {
        self.pia1.tick();
        self.pia2.tick();
        self.via.tick();

        self.video_cycle += 1;
        if self.video_cycle >= self.config.cycles_per_frame {
            self.video_cycle = 0;
        }
        let level = self.video_cycle < self.config.display_cycles;
        if level != self.sync {
            self.sync = level;
            self.drive_sync();
        }

        self.poll_lines();
        self.update_irq();
    }

    /// Read an I/O register. Only address bits 0-6 decode.
    pub fn read(&mut self, addr: u16) -> u8 {
        let select = chip_select(addr);
        if select == 0 {
            return floating(addr);
        }
        let mut value = 0xFF;
        if select & SELECT_PIA1 != 0 {
            value &= self.pia1.read(addr as u8);
        }
        if select & SELECT_PIA2 != 0 {
            value &= self.pia2.read(addr as u8);
        }
        if select & SELECT_VIA != 0 {
            value &= self.via.read(addr as u8 & 0x0F);
        }
        self.poll_lines();
        self.update_irq();
        value
    }

    /// Register value as `read` would return it, with no side effects.
    #[must_use]
    pub fn dump(&self, addr: u16) -> u8 {
        let select = chip_select(addr);
        if select == 0 {
            return floating(addr);
        }
        let mut value = 0xFF;
        if select & SELECT_PIA1 != 0 {
            value &= self.pia1.dump(addr as u8);
        }
        if select & SELECT_PIA2 != 0 {
            value &= self.pia2.dump(addr as u8);
        }
        if select & SELECT_VIA != 0 {
            value &= self.via.dump(addr as u8 & 0x0F);
        }
        value
    }

    /// Write an I/O register. Every selected chip takes the write.
    pub fn write(&mut self, addr: u16, value: u8) {
        let select = chip_select(addr);
        if select == 0 {
            trace!("PET I/O write to unmapped ${addr:04X} = ${value:02X}");
            return;
        }
        if select & SELECT_PIA1 != 0 {
            self.pia1.write(addr as u8, value);
        }
        if select & SELECT_PIA2 != 0 {
            self.pia2.write(addr as u8, value);
        }
        if select & SELECT_VIA != 0 {
            self.via.write(addr as u8 & 0x0F, value);
        }
        self.poll_lines();
        self.update_irq();
    }

    /// Drive the retrace line from outside, e.g. from a video model that
    /// keeps its own beam position. Realigns the internal frame counter.
    pub fn sync(&mut self, level: bool) {
        self.video_cycle = if level { 0 } else { self.config.display_cycles };
        if level != self.sync {
            self.sync = level;
            self.drive_sync();
        }
        self.update_irq();
    }

    /// Current retrace line level.
    #[must_use]
    pub fn sync_level(&self) -> bool {
        self.sync
    }

    /// Keyboard column bits for the row currently selected, active low.
    pub fn set_keyboard_columns(&mut self, columns: u8) {
        self.pia1.external_b = columns;
    }

    /// Keyboard row selected by PIA1 PA0-3.
    #[must_use]
    pub fn keyboard_row(&self) -> u8 {
        self.pia1.port_a_output() & 0x0F
    }

    /// Take the line changes seen since the last call.
    pub fn drain_events(&mut self) -> Vec<IoEvent> {
        std::mem::take(&mut self.events)
    }

    /// IRQ line to the CPU.
    #[must_use]
    pub fn irq(&self) -> bool {
        self.irq
    }

    /// Recompute the IRQ line from all three chips.
    pub fn update_irq(&mut self) {
        self.irq = self.pia1.irq_active() || self.pia2.irq_active() || self.via.irq_active();
    }

    fn drive_sync(&mut self) {
        self.pia1.set_cb1(self.sync);
        if self.sync {
            self.via.external_b |= VIA_PB_RETRACE;
        } else {
            self.via.external_b &= !VIA_PB_RETRACE;
        }
    }

    fn poll_lines(&mut self) {
        let now = Lines::sample(&self.pia1, &self.pia2, &self.via);
        if now == self.lines {
            return;
        }
        if now.pia1_ca2 != self.lines.pia1_ca2 {
            debug!("PET screen blank line -> {}", now.pia1_ca2);
            self.events.push(IoEvent::ScreenBlank(now.pia1_ca2));
        }
        if now.pia2_ca2 != self.lines.pia2_ca2 {
            debug!("IEEE NDAC -> {}", now.pia2_ca2);
            self.events.push(IoEvent::Ndac(now.pia2_ca2));
        }
        if now.pia2_cb2 != self.lines.pia2_cb2 {
            debug!("IEEE DAV -> {}", now.pia2_cb2);
            self.events.push(IoEvent::Dav(now.pia2_cb2));
        }
        if now.via_ca2 != self.lines.via_ca2 {
            debug!("PET character set line -> {}", now.via_ca2);
            self.events.push(IoEvent::CharacterSet(now.via_ca2));
        }
        self.lines = now;
    }
}

fn chip_select(addr: u16) -> u8 {
    ((addr >> 4) & 0x07) as u8
}

fn floating(addr: u16) -> u8 {
    (addr >> 8) as u8
}

impl Default for PetIo {
    fn default() -> Self {
        Self::new()
    }
}

impl Tickable for PetIo {
    fn tick(&mut self) {
        PetIo::tick(self);
    }
}

const PET_IO_QUERY_PATHS: &[&str] = &[
    "irq",
    "sync",
    "video_cycle",
    "pia1.pra",
    "pia1.ddra",
    "pia1.cra",
    "pia1.prb",
    "pia1.ddrb",
    "pia1.crb",
    "pia1.ca2",
    "pia1.cb2",
    "pia1.irqa",
    "pia1.irqb",
    "pia2.pra",
    "pia2.ddra",
    "pia2.cra",
    "pia2.prb",
    "pia2.ddrb",
    "pia2.crb",
    "pia2.ca2",
    "pia2.cb2",
    "pia2.irqa",
    "pia2.irqb",
    "via.ora",
    "via.orb",
    "via.ddra",
    "via.ddrb",
    "via.t1",
    "via.t1_latch",
    "via.t2",
    "via.sr",
    "via.acr",
    "via.pcr",
    "via.ifr",
    "via.ier",
    "via.irq",
    "via.ca2",
    "via.cb2",
];

impl Observable for PetIo {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("pia1.") {
            return self.pia1.query(rest);
        }
        if let Some(rest) = path.strip_prefix("pia2.") {
            return self.pia2.query(rest);
        }
        if let Some(rest) = path.strip_prefix("via.") {
            return self.via.query(rest);
        }
        match path {
            "irq" => Some(self.irq.into()),
            "sync" => Some(self.sync.into()),
            "video_cycle" => Some(u64::from(self.video_cycle).into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        PET_IO_QUERY_PATHS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use emu_core::Ticks;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn make_io() -> PetIo {
        let mut io = PetIo::new();
        io.reset(&mut StdRng::seed_from_u64(7));
        io
    }

    #[test]
    fn region_zero_floats_high_byte() {
        let mut io = make_io();
        assert_eq!(io.read(0xE800), 0xE8);
        assert_eq!(io.read(0xE80F), 0xE8);
        io.write(0xE800, 0x12);
        assert_eq!(io.dump(0xE800), 0xE8);
    }

    #[test]
    fn retrace_reaches_pia1_cb1_and_via_pb5() {
        let mut io = PetIo::with_config(PetIoConfig {
            cycles_per_frame: 20,
            display_cycles: 10,
        });
        io.reset(&mut StdRng::seed_from_u64(1));
        io.write(0xE813, 0x05); // CRB: data, CB1 falling edge, IRQ on
        assert_eq!(io.dump(0xE840) & VIA_PB_RETRACE, VIA_PB_RETRACE);

        for _ in 0..10 {
            io.tick();
        }
        assert!(!io.sync_level());
        assert_eq!(io.dump(0xE840) & VIA_PB_RETRACE, 0);
        assert!(io.irq(), "retrace interrupt");

        let _ = io.read(0xE812);
        assert!(!io.irq(), "PIA1 port B read acknowledges");

        for _ in 0..10 {
            io.tick();
        }
        assert!(io.sync_level(), "new frame");
    }

    #[test]
    fn external_sync_realigns_frame() {
        let mut io = make_io();
        io.sync(false);
        assert!(!io.sync_level());
        assert_eq!(io.query("video_cycle"), Some(Value::U64(12_800)));
        io.sync(true);
        assert_eq!(io.query("video_cycle"), Some(Value::U64(0)));
    }

    #[test]
    fn keyboard_row_and_columns() {
        let mut io = make_io();
        io.write(0xE810, 0x0F); // DDRA: PA0-3 out
        io.write(0xE811, 0x3C); // CRA: data, CA2 high
        io.write(0xE810, 0xF3);
        assert_eq!(io.keyboard_row(), 0x03);

        io.write(0xE813, 0x04);
        io.set_keyboard_columns(0xFE);
        assert_eq!(io.read(0xE812), 0xFE);
    }

    #[test]
    fn c2_changes_become_events() {
        let mut io = make_io();
        io.write(0xE811, 0x34); // PIA1 CA2 manual low
        io.write(0xE821, 0x34); // PIA2 CA2 manual low
        io.write(0xE823, 0x34); // PIA2 CB2 manual low
        io.write(0xE84C, 0x0C); // VIA CA2 manual low
        assert_eq!(
            io.drain_events(),
            vec![
                IoEvent::ScreenBlank(false),
                IoEvent::Ndac(false),
                IoEvent::Dav(false),
                IoEvent::CharacterSet(false),
            ]
        );
        assert!(io.drain_events().is_empty());

        io.write(0xE811, 0x3C);
        assert_eq!(io.drain_events(), vec![IoEvent::ScreenBlank(true)]);
    }

    #[test]
    fn via_interrupt_reaches_irq_line() {
        let mut io = make_io();
        io.write(0xE84E, 0xC0); // IER: T1
        io.write(0xE844, 0x03);
        io.write(0xE845, 0x00); // one-shot, 3
        Tickable::tick_n(&mut io, Ticks::new(3));
        assert!(!io.irq());
        io.tick();
        assert!(io.irq());
    }

    #[test]
    fn observable_paths_resolve() {
        let io = make_io();
        for path in io.query_paths() {
            assert!(io.query(path).is_some(), "{path}");
        }
    }
}
