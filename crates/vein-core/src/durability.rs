//! Tool durability: a damage counter that approaches but never reaches its
//! ceiling. At one hit from the ceiling the tool enters degraded mode, which
//! the destruction pipeline uses to suppress all but the core effect.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WearOutcome {
    /// The preservation roll skipped the damage entirely.
    Preserved,
    Worn { newly_degraded: bool },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurabilityState {
    damage: u32,
}

impl DurabilityState {
    pub fn damage(&self) -> u32 {
        self.damage
    }

    pub fn degraded(&self, max_damage: u32) -> bool {
        self.damage >= max_damage.saturating_sub(1)
    }

    /// Skip chance in basis points for a given preservation level.
    pub fn preservation_skip_bps(level: u32, per_level_bps: u32, cap_bps: u32) -> u32 {
        per_level_bps.saturating_mul(level).min(cap_bps)
    }

    /// Roll one harvesting action's wear. Damage clamps one short of the
    /// ceiling; the tool never fully breaks.
    pub fn apply_wear(
        &mut self,
        preservation_level: u32,
        per_level_bps: u32,
        cap_bps: u32,
        max_damage: u32,
        roll_bps: u32,
    ) -> WearOutcome {
        let skip_bps = Self::preservation_skip_bps(preservation_level, per_level_bps, cap_bps);
        if roll_bps < skip_bps {
            return WearOutcome::Preserved;
        }
        let was_degraded = self.degraded(max_damage);
        self.damage = self
            .damage
            .saturating_add(1)
            .min(max_damage.saturating_sub(1));
        WearOutcome::Worn {
            newly_degraded: !was_degraded && self.degraded(max_damage),
        }
    }

    /// External repair. Returns true when the repair left degraded mode.
    pub fn repair(&mut self, amount: u32, max_damage: u32) -> bool {
        let was_degraded = self.degraded(max_damage);
        self.damage = self.damage.saturating_sub(amount);
        was_degraded && !self.degraded(max_damage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAX: u32 = 10;

    fn worn(state: &mut DurabilityState, roll: u32) -> WearOutcome {
        state.apply_wear(0, 500, 9500, MAX, roll)
    }

    #[test]
    fn damage_never_reaches_the_ceiling() {
        let mut state = DurabilityState::default();
        for _ in 0..100 {
            worn(&mut state, 9999);
        }
        assert_eq!(state.damage(), MAX - 1);
        assert!(state.degraded(MAX));
    }

    #[test]
    fn degraded_flag_flips_exactly_at_the_threshold() {
        let mut state = DurabilityState::default();
        for _ in 0..(MAX - 2) {
            let outcome = worn(&mut state, 9999);
            assert_eq!(outcome, WearOutcome::Worn {
                newly_degraded: false
            });
        }
        assert!(!state.degraded(MAX));
        let outcome = worn(&mut state, 9999);
        assert_eq!(outcome, WearOutcome::Worn {
            newly_degraded: true
        });
        assert!(state.degraded(MAX));

        // Further wear at the ceiling reports no fresh transition.
        let outcome = worn(&mut state, 9999);
        assert_eq!(outcome, WearOutcome::Worn {
            newly_degraded: false
        });
    }

    #[test]
    fn preservation_roll_skips_wear() {
        let mut state = DurabilityState::default();
        // Level 10 at 500 bps each is a 50% skip chance; a roll of 4999
        // lands inside the skip window.
        let outcome = state.apply_wear(10, 500, 9500, MAX, 4999);
        assert_eq!(outcome, WearOutcome::Preserved);
        assert_eq!(state.damage(), 0);
        let outcome = state.apply_wear(10, 500, 9500, MAX, 5000);
        assert!(matches!(outcome, WearOutcome::Worn { .. }));
        assert_eq!(state.damage(), 1);
    }

    #[test]
    fn preservation_chance_caps_below_certainty() {
        assert_eq!(DurabilityState::preservation_skip_bps(19, 500, 9500), 9500);
        assert_eq!(
            DurabilityState::preservation_skip_bps(1000, 500, 9500),
            9500
        );
        assert_eq!(DurabilityState::preservation_skip_bps(3, 500, 9500), 1500);
    }

    #[test]
    fn repair_leaves_degraded_mode() {
        let mut state = DurabilityState::default();
        for _ in 0..20 {
            worn(&mut state, 9999);
        }
        assert!(state.degraded(MAX));
        assert!(state.repair(5, MAX));
        assert!(!state.degraded(MAX));
        assert_eq!(state.damage(), MAX - 1 - 5);

        // Repairing an undamaged region of the bar is a quiet no-op signal.
        assert!(!state.repair(100, MAX));
        assert_eq!(state.damage(), 0);
    }
}
