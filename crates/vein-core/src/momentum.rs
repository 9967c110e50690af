//! Momentum: the decaying streak accumulator.
//!
//! Gains and decay share one timestamp; whichever ran last owns it, so there
//! is no double counting inside a single decay interval.

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MomentumState {
    level: u32,
    last_update_tick: u64,
}

impl MomentumState {
    pub fn level(&self) -> u32 {
        self.level
    }

    /// Gain multiplier as permille: `1000 + level` means `1 + level/1000`.
    pub fn multiplier_permille(&self) -> u64 {
        1000 + u64::from(self.level)
    }

    /// Register one harvest while the momentum effect is active.
    pub fn on_harvest(&mut self, effect_level: u32, ceiling: u32, now: u64) {
        let gain = (effect_level / 10).max(1);
        self.level = self.level.saturating_add(gain).min(ceiling);
        self.last_update_tick = now;
    }

    /// Decay one unit per whole interval elapsed since the last update and
    /// re-stamp the clock regardless, making repeated calls within the same
    /// interval no-ops. Returns the units shed.
    pub fn decay_if_idle(&mut self, interval_ticks: u64, now: u64) -> u32 {
        let elapsed = now.saturating_sub(self.last_update_tick);
        let units = if interval_ticks == 0 {
            0
        } else {
            elapsed / interval_ticks
        };
        let shed = u32::try_from(units).unwrap_or(u32::MAX).min(self.level);
        self.level -= shed;
        self.last_update_tick = now;
        shed
    }
}
