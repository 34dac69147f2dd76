//! Bus-cycle time.
//!
//! On the machines modelled here the CPU clock is the master clock, so a
//! tick, a bus cycle and a CPU cycle are the same thing.

use std::ops::{Add, AddAssign, Sub};

/// A count of bus cycles. Arithmetic saturates at zero going down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ticks(pub u64);

impl Ticks {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(1);

    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Cycles from `earlier` up to `self`, zero if `earlier` is later.
    #[must_use]
    pub const fn since(self, earlier: Ticks) -> Ticks {
        Self(self.0.saturating_sub(earlier.0))
    }
}

impl Add for Ticks {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Ticks {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for Ticks {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self.since(rhs)
    }
}

/// Clock frequency of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MasterClock {
    /// Bus cycles per second (`1_000_000` on a PET).
    pub frequency_hz: u64,
}

impl MasterClock {
    #[must_use]
    pub const fn new(frequency_hz: u64) -> Self {
        Self { frequency_hz }
    }

    /// Bus cycles per video frame at the given refresh rate, rounded down.
    #[must_use]
    pub const fn ticks_per_frame(&self, frames_per_second: u64) -> Ticks {
        Ticks::new(self.frequency_hz / frames_per_second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtraction_saturates() {
        assert_eq!(Ticks::new(3) - Ticks::new(5), Ticks::ZERO);
        assert_eq!(Ticks::new(10).since(Ticks::new(4)), Ticks::new(6));
    }

    #[test]
    fn pet_frame_length() {
        let clock = MasterClock::new(1_000_000);
        assert_eq!(clock.ticks_per_frame(60), Ticks::new(16_666));
        assert_eq!(clock.ticks_per_frame(50), Ticks::new(20_000));
    }
}
