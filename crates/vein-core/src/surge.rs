//! The abundance window: a temporary global gain multiplier with monotonic
//! re-activation and lazy expiry.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurgeActivation {
    Started { end_tick: u64 },
    Extended { end_tick: u64 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurgeState {
    active: bool,
    end_tick: u64,
}

impl SurgeState {
    /// Open the window, or push an open window's end further out. The end
    /// never moves backward.
    pub fn activate(&mut self, now: u64, duration_ticks: u64) -> SurgeActivation {
        let proposed_end = now.saturating_add(duration_ticks);
        if self.active && self.end_tick > now {
            self.end_tick = self.end_tick.max(proposed_end);
            SurgeActivation::Extended {
                end_tick: self.end_tick,
            }
        } else {
            self.active = true;
            self.end_tick = proposed_end;
            SurgeActivation::Started {
                end_tick: self.end_tick,
            }
        }
    }

    /// Read the flag, deactivating first if the window has run out.
    pub fn is_active(&mut self, now: u64) -> bool {
        if self.active && self.end_tick <= now {
            self.active = false;
        }
        self.active
    }

    /// True exactly on the call that observes the expiry.
    pub fn expire_if_due(&mut self, now: u64) -> bool {
        if self.active && self.end_tick <= now {
            self.active = false;
            return true;
        }
        false
    }

    pub fn end_tick(&self) -> u64 {
        self.end_tick
    }

    pub fn raw_active_flag(&self) -> bool {
        self.active
    }
}
