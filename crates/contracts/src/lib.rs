//! v1 cross-boundary contracts for the vein kernel, CLI, and observatory.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod serde_u64_compat;

pub const SCHEMA_VERSION_V1: &str = "1.0";
pub const TICKS_PER_SECOND: u64 = 20;
/// Probabilities cross the boundary as basis points of this denominator.
pub const BPS_SCALE: u32 = 10_000;

// ---------------------------------------------------------------------------
// World geometry and materials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// Axis-aligned unit neighbors, in a stable order.
    pub fn neighbors(&self) -> [Position; 6] {
        [
            self.offset(-1, 0, 0),
            self.offset(1, 0, 0),
            self.offset(0, -1, 0),
            self.offset(0, 1, 0),
            self.offset(0, 0, -1),
            self.offset(0, 0, 1),
        ]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.x, self.y, self.z)
    }
}

/// A cardinal facing for directional cascade effects.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    North,
    South,
    East,
    West,
    Down,
}

impl Facing {
    pub fn step(&self) -> (i32, i32, i32) {
        match self {
            Facing::North => (0, 0, -1),
            Facing::South => (0, 0, 1),
            Facing::East => (1, 0, 0),
            Facing::West => (-1, 0, 0),
            Facing::Down => (0, -1, 0),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RegionId {
    Surface,
    UpperSeams,
    DeepSeams,
    MoltenRoots,
}

impl RegionId {
    pub fn all() -> &'static [RegionId] {
        &[
            RegionId::Surface,
            RegionId::UpperSeams,
            RegionId::DeepSeams,
            RegionId::MoltenRoots,
        ]
    }
}

/// A destructible node's material. `Warden` is the world's anchor material:
/// no effect in the system may destroy or replace it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Air,
    Stone,
    Coal,
    Iron,
    Gold,
    Diamond,
    Warden,
}

impl Material {
    /// Base economic value of one harvested node.
    pub fn base_value(&self) -> u64 {
        match self {
            Material::Air | Material::Warden => 0,
            Material::Stone => 1,
            Material::Coal => 4,
            Material::Iron => 10,
            Material::Gold => 18,
            Material::Diamond => 40,
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Material::Warden)
    }

    pub fn is_harvestable(&self) -> bool {
        !matches!(self, Material::Air | Material::Warden)
    }
}

// ---------------------------------------------------------------------------
// Currencies and effects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyKind {
    Coins,
    Tokens,
    Prestige,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EffectCategory {
    Economic,
    Efficiency,
    Mobility,
    Special,
}

/// The levelable effects a harvesting tool can carry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EffectId {
    /// Core coin-gain effect; the only effect alive in degraded mode.
    Greed,
    /// Secondary-currency gain.
    TokenGreed,
    /// Raises the trigger chance of every chance-gated effect.
    Luck,
    /// Feeds the momentum accumulator on each harvest.
    Combustion,
    /// Lowers the chance that a harvest wears the tool.
    Preservation,
    /// Movement boost; no role in the destruction pipeline.
    Swiftness,
    /// Small chance to open (or extend) the abundance window.
    Abundance,
    /// Draws a tiered prestige reward.
    Windfall,
    /// Destroys a line of nodes along the tool's facing.
    Drillshot,
    /// Destroys a bounded cubic volume around the node.
    Shatterburst,
    /// Destroys the connected vein of same-material nodes.
    Veinbreaker,
}

impl EffectId {
    pub fn all() -> &'static [EffectId] {
        &[
            EffectId::Greed,
            EffectId::TokenGreed,
            EffectId::Luck,
            EffectId::Combustion,
            EffectId::Preservation,
            EffectId::Swiftness,
            EffectId::Abundance,
            EffectId::Windfall,
            EffectId::Drillshot,
            EffectId::Shatterburst,
            EffectId::Veinbreaker,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectId::Greed => "greed",
            EffectId::TokenGreed => "token_greed",
            EffectId::Luck => "luck",
            EffectId::Combustion => "combustion",
            EffectId::Preservation => "preservation",
            EffectId::Swiftness => "swiftness",
            EffectId::Abundance => "abundance",
            EffectId::Windfall => "windfall",
            EffectId::Drillshot => "drillshot",
            EffectId::Shatterburst => "shatterburst",
            EffectId::Veinbreaker => "veinbreaker",
        }
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reward tiers for the windfall draw, ordered from most to least common.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RewardTier {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

impl RewardTier {
    pub fn prestige_bonus(&self) -> u64 {
        match self {
            RewardTier::Common => 1,
            RewardTier::Uncommon => 5,
            RewardTier::Rare => 25,
            RewardTier::Legendary => 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Run configuration and status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SimConfig {
    pub schema_version: String,
    pub run_id: String,
    #[serde(with = "serde_u64_compat")]
    pub seed: u64,
    pub duration_seconds: u32,
    /// Momentum accumulator ceiling.
    pub momentum_ceiling: u32,
    /// One momentum unit decays per this many idle ticks.
    pub momentum_decay_interval_ticks: u64,
    /// Length of one abundance window.
    pub surge_duration_ticks: u64,
    /// Gain multiplier while the abundance window is open.
    pub surge_boost: u32,
    /// Tool damage ceiling; damage never reaches this value.
    pub max_damage: u32,
    /// Effectiveness (percent) of the core economic effect in degraded mode.
    pub degraded_penalty_percent: u32,
    /// Preservation skip chance per level, in basis points.
    pub preservation_bps_per_level: u32,
    /// Preservation skip chance cap, in basis points.
    pub preservation_bps_cap: u32,
    pub autobuy_period_ticks: u64,
    /// Minimum ticks between successful automatic batches per agent/effect.
    pub autobuy_min_interval_ticks: u64,
    pub entitlement_ttl_ticks: u64,
    pub max_cascade_depth: u8,
    /// Queued cascade steps executed per tick, across all agents.
    pub cascade_steps_per_tick: u32,
    pub storage_capacity: u32,
    pub demo_agent_count: u16,
    /// Half-extent of the seeded demo field, in nodes.
    pub field_extent: i32,
    #[serde(default)]
    pub scenario_flags: BTreeMap<String, bool>,
    pub notes: Option<String>,
}

impl SimConfig {
    pub fn max_ticks(&self) -> u64 {
        u64::from(self.duration_seconds) * TICKS_PER_SECOND
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: "run_local_001".to_string(),
            seed: 1337,
            duration_seconds: 120,
            momentum_ceiling: 1000,
            momentum_decay_interval_ticks: TICKS_PER_SECOND,
            surge_duration_ticks: 30 * TICKS_PER_SECOND,
            surge_boost: 2,
            max_damage: 1000,
            degraded_penalty_percent: 10,
            preservation_bps_per_level: 500,
            preservation_bps_cap: 9500,
            autobuy_period_ticks: 5 * TICKS_PER_SECOND,
            autobuy_min_interval_ticks: 10 * TICKS_PER_SECOND,
            entitlement_ttl_ticks: 30 * TICKS_PER_SECOND,
            max_cascade_depth: 4,
            cascade_steps_per_tick: 2,
            storage_capacity: 1024,
            demo_agent_count: 3,
            field_extent: 10,
            scenario_flags: BTreeMap::new(),
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Running,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunStatus {
    pub schema_version: String,
    pub run_id: String,
    pub current_tick: u64,
    pub max_ticks: u64,
    pub mode: RunMode,
    /// Pending cascade tasks across all agents.
    pub queue_depth: usize,
}

impl RunStatus {
    pub fn is_complete(&self) -> bool {
        self.current_tick >= self.max_ticks
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={} tick={}/{} mode={:?} queue_depth={}",
            self.run_id, self.current_tick, self.max_ticks, self.mode, self.queue_depth
        )
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    AgentConnected,
    AgentDisconnected,
    NodeDestroyed,
    YieldStored,
    StorageOverflow,
    EffectFired,
    CurrencyGranted,
    RewardTierDrawn,
    SurgeActivated,
    SurgeExtended,
    SurgeExpired,
    ToolDamaged,
    ToolDegraded,
    ToolRepaired,
    CascadePrimed,
    CascadeStepped,
    CascadeFinished,
    CascadeDepthExceeded,
    UpgradePurchased,
    AutoUpgradeBatch,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    pub schema_version: String,
    pub run_id: String,
    pub tick: u64,
    pub event_id: String,
    pub sequence_in_tick: u64,
    pub event_type: EventType,
    pub agent_id: Option<String>,
    pub region_id: Option<RegionId>,
    pub position: Option<Position>,
    /// Parent event ids, nearest first.
    pub caused_by: Vec<String>,
    pub details: Option<Value>,
}

// ---------------------------------------------------------------------------
// Purchase receipts and notifications
// ---------------------------------------------------------------------------

/// Outcome of a successful purchase attempt. Ephemeral; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpgradeReceipt {
    pub effect: EffectId,
    pub currency: CurrencyKind,
    pub requested_levels: u32,
    pub levels_bought: u32,
    pub spent: u64,
    pub new_level: u32,
}

/// Agent-facing feedback line. Transient messages suppress ordinary ones
/// until their window closes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    pub tick: u64,
    pub text: String,
    pub transient: bool,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WalletSnapshot {
    pub coins: u64,
    pub tokens: u64,
    pub prestige: u64,
    pub coins_via_tool: u64,
    pub tokens_via_tool: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerSnapshot {
    pub agent_id: String,
    pub connected_tick: u64,
    pub wallet: WalletSnapshot,
    pub levels: BTreeMap<EffectId, u32>,
    pub enabled: BTreeMap<EffectId, bool>,
    pub auto_upgrade: BTreeMap<EffectId, bool>,
    pub momentum_level: u32,
    pub surge_active: bool,
    pub surge_end_tick: u64,
    pub damage: u32,
    pub degraded: bool,
    pub storage_used: u32,
    pub storage_overflowed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorldSummary {
    pub run_id: String,
    pub tick: u64,
    pub agent_count: usize,
    pub event_count: usize,
    pub nodes_destroyed: u64,
    pub pending_cascade_tasks: usize,
    #[serde(with = "serde_u64_compat")]
    pub replay_hash: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trips_through_json() {
        let config = SimConfig::default();
        let encoded = serde_json::to_string(&config).expect("serialize");
        let decoded: SimConfig = serde_json::from_str(&encoded).expect("deserialize");
        assert_eq!(config, decoded);
    }

    #[test]
    fn warden_material_is_protected_and_worthless() {
        assert!(Material::Warden.is_protected());
        assert!(!Material::Warden.is_harvestable());
        assert_eq!(Material::Warden.base_value(), 0);
    }

    #[test]
    fn facing_steps_are_unit_length() {
        for facing in [
            Facing::North,
            Facing::South,
            Facing::East,
            Facing::West,
            Facing::Down,
        ] {
            let (dx, dy, dz) = facing.step();
            assert_eq!(dx.abs() + dy.abs() + dz.abs(), 1);
        }
    }
}
