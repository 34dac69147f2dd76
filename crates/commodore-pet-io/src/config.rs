//! Chip bank configuration.

use emu_core::MasterClock;

/// PET video timing as the chip bank sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PetIoConfig {
    /// Bus cycles per video frame.
    pub cycles_per_frame: u32,
    /// Cycles at the start of each frame with the retrace line high.
    pub display_cycles: u32,
}

impl Default for PetIoConfig {
    fn default() -> Self {
        Self {
            cycles_per_frame: MasterClock::new(1_000_000).ticks_per_frame(60).get() as u32,
            // 25 text rows of 8 scanlines at 64 cycles
            display_cycles: 25 * 8 * 64,
        }
    }
}
