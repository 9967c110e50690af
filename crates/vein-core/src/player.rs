//! Per-agent state bundle. The world keys these by agent id and keeps each
//! one behind its own mutex so off-tick entry points serialize against the
//! tick thread without any cross-agent locking.

use std::collections::{BTreeMap, BTreeSet};

use contracts::{EffectId, Facing, Material, PlayerSnapshot, SimConfig};

use crate::durability::DurabilityState;
use crate::ledger::Wallet;
use crate::momentum::MomentumState;
use crate::surge::SurgeState;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Bounded inventory for harvested materials. Rejections are counted, not
/// errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Storage {
    capacity: u32,
    used: u32,
    overflowed: u64,
    contents: BTreeMap<Material, u32>,
}

impl Storage {
    pub fn with_capacity(capacity: u32) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn try_store(&mut self, material: Material, quantity: u32) -> bool {
        if self.used.saturating_add(quantity) > self.capacity {
            return false;
        }
        self.used += quantity;
        *self.contents.entry(material).or_insert(0) += quantity;
        true
    }

    pub fn record_overflow(&mut self, quantity: u32) {
        self.overflowed = self.overflowed.saturating_add(u64::from(quantity));
    }

    pub fn used(&self) -> u32 {
        self.used
    }

    pub fn overflowed(&self) -> u64 {
        self.overflowed
    }

    pub fn count(&self, material: Material) -> u32 {
        self.contents.get(&material).copied().unwrap_or(0)
    }
}

// ---------------------------------------------------------------------------
// PlayerState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub agent_id: String,
    pub wallet: Wallet,
    /// Effect levels; an absent entry is level zero.
    levels: BTreeMap<EffectId, u32>,
    /// Effects the agent toggled off. Everything is enabled by default.
    disabled: BTreeSet<EffectId>,
    /// Effects opted into automatic upgrading.
    auto_upgrade: BTreeSet<EffectId>,
    pub momentum: MomentumState,
    pub surge: SurgeState,
    pub durability: DurabilityState,
    pub storage: Storage,
    pub facing: Facing,
    pub connected_tick: u64,
}

impl PlayerState {
    pub fn new(agent_id: impl Into<String>, config: &SimConfig, connected_tick: u64) -> Self {
        Self {
            agent_id: agent_id.into(),
            wallet: Wallet::default(),
            levels: BTreeMap::new(),
            disabled: BTreeSet::new(),
            auto_upgrade: BTreeSet::new(),
            momentum: MomentumState::default(),
            surge: SurgeState::default(),
            durability: DurabilityState::default(),
            storage: Storage::with_capacity(config.storage_capacity),
            facing: Facing::North,
            connected_tick,
        }
    }

    pub fn level(&self, effect: EffectId) -> u32 {
        self.levels.get(&effect).copied().unwrap_or(0)
    }

    pub fn set_level(&mut self, effect: EffectId, level: u32) {
        if level == 0 {
            self.levels.remove(&effect);
        } else {
            self.levels.insert(effect, level);
        }
    }

    pub fn is_enabled(&self, effect: EffectId) -> bool {
        !self.disabled.contains(&effect)
    }

    pub fn set_enabled(&mut self, effect: EffectId, enabled: bool) {
        if enabled {
            self.disabled.remove(&effect);
        } else {
            self.disabled.insert(effect);
        }
    }

    /// Level as seen by the pipeline: zero when toggled off.
    pub fn active_level(&self, effect: EffectId) -> u32 {
        if self.is_enabled(effect) {
            self.level(effect)
        } else {
            0
        }
    }

    pub fn auto_upgrade_enabled(&self, effect: EffectId) -> bool {
        self.auto_upgrade.contains(&effect)
    }

    pub fn set_auto_upgrade(&mut self, effect: EffectId, enabled: bool) {
        if enabled {
            self.auto_upgrade.insert(effect);
        } else {
            self.auto_upgrade.remove(&effect);
        }
    }

    pub fn auto_upgrade_effects(&self) -> Vec<EffectId> {
        self.auto_upgrade.iter().copied().collect()
    }

    pub fn snapshot(&self, max_damage: u32) -> PlayerSnapshot {
        PlayerSnapshot {
            agent_id: self.agent_id.clone(),
            connected_tick: self.connected_tick,
            wallet: self.wallet.snapshot(),
            levels: self.levels.clone(),
            enabled: EffectId::all()
                .iter()
                .map(|effect| (*effect, self.is_enabled(*effect)))
                .collect(),
            auto_upgrade: EffectId::all()
                .iter()
                .map(|effect| (*effect, self.auto_upgrade_enabled(*effect)))
                .collect(),
            momentum_level: self.momentum.level(),
            surge_active: self.surge.raw_active_flag(),
            surge_end_tick: self.surge.end_tick(),
            damage: self.durability.damage(),
            degraded: self.durability.degraded(max_damage),
            storage_used: self.storage.used(),
            storage_overflowed: self.storage.overflowed(),
        }
    }
}
