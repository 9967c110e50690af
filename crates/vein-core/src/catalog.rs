//! Effect catalog: one immutable table describing every levelable effect.
//!
//! Evaluation is a uniform walk over table entries; there is no per-effect
//! dispatch. The catalog is constructed once and passed by reference into
//! every component that needs it.

use std::collections::BTreeMap;

use contracts::{CurrencyKind, EffectCategory, EffectId, RewardTier, BPS_SCALE};

// ---------------------------------------------------------------------------
// Cost curves
// ---------------------------------------------------------------------------

/// Price of buying a given level. Both shapes are non-decreasing in the
/// level, which the greedy purchaser relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostCurve {
    Linear { base: u64, per_level: u64 },
    Quadratic { base: u64, per_level: u64 },
}

impl CostCurve {
    /// Cost of the purchase that raises the effect *to* `level`.
    pub fn cost(&self, level: u32) -> u64 {
        let level = u64::from(level);
        match self {
            CostCurve::Linear { base, per_level } => {
                base.saturating_add(per_level.saturating_mul(level))
            }
            CostCurve::Quadratic { base, per_level } => {
                base.saturating_add(per_level.saturating_mul(level.saturating_mul(level)))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Trigger chances
// ---------------------------------------------------------------------------

/// Chance gate for an effect, in basis points. The luck effect level widens
/// the gate; the sum is clamped to certainty rather than allowed past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerChance {
    pub base_bps: u32,
    pub luck_bonus_bps_per_level: u32,
}

impl TriggerChance {
    pub fn chance_bps(&self, luck_level: u32) -> u32 {
        self.base_bps
            .saturating_add(self.luck_bonus_bps_per_level.saturating_mul(luck_level))
            .min(BPS_SCALE)
    }
}

// ---------------------------------------------------------------------------
// Effect kinds
// ---------------------------------------------------------------------------

/// Shape of a cascading destruction effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeShape {
    /// Nodes along the tool's facing, one per effect level.
    Line { max_length: u32 },
    /// A cube around the origin, destroyed one layer per step; the radius
    /// grows with the level up to the cap.
    Burst { max_radius: u32 },
    /// Connected same-material nodes, breadth-first, capped.
    Vein { cap_per_level: u32, max_cap: u32 },
}

/// What an effect does when its gate opens (or passively, for ungated ones).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectKind {
    /// Currency grant scaled by level, node value, momentum, and surge.
    Gain {
        currency: CurrencyKind,
        level_coefficient: u64,
        block_multiplier: u64,
        via_tool: bool,
    },
    /// Widens every other effect's trigger gate. Passive.
    LuckAura,
    /// Feeds the momentum accumulator on each harvest. Passive.
    MomentumFeed,
    /// Lowers tool wear chance. Passive.
    Preservation,
    /// Movement modifier applied outside this kernel. Passive.
    Movement,
    /// Opens or extends the abundance window.
    SurgeTrigger,
    /// Draws a reward tier from cumulative probability bands and grants the
    /// tier's prestige bonus.
    RewardDraw { bands: [(RewardTier, u32); 4] },
    /// Destroys additional nodes, re-entering the destruction pipeline.
    Cascade(CascadeShape),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectDef {
    pub id: EffectId,
    pub category: EffectCategory,
    pub max_level: u32,
    pub purchase_currency: CurrencyKind,
    pub cost: CostCurve,
    /// `None` for passive effects that never roll.
    pub trigger: Option<TriggerChance>,
    pub kind: EffectKind,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct EffectCatalog {
    defs: BTreeMap<EffectId, EffectDef>,
}

impl EffectCatalog {
    pub fn new(defs: Vec<EffectDef>) -> Self {
        Self {
            defs: defs.into_iter().map(|def| (def.id, def)).collect(),
        }
    }

    pub fn get(&self, id: EffectId) -> Option<&EffectDef> {
        self.defs.get(&id)
    }

    pub fn defs(&self) -> impl Iterator<Item = &EffectDef> {
        self.defs.values()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn default_catalog() -> Self {
        use EffectCategory::*;
        use EffectId::*;

        Self::new(vec![
            EffectDef {
                id: Greed,
                category: Economic,
                max_level: u32::MAX,
                purchase_currency: CurrencyKind::Coins,
                cost: CostCurve::Linear {
                    base: 100,
                    per_level: 50,
                },
                trigger: Some(TriggerChance {
                    base_bps: 500,
                    luck_bonus_bps_per_level: 20,
                }),
                kind: EffectKind::Gain {
                    currency: CurrencyKind::Coins,
                    level_coefficient: 10,
                    block_multiplier: 2,
                    via_tool: true,
                },
            },
            EffectDef {
                id: TokenGreed,
                category: Economic,
                max_level: u32::MAX,
                purchase_currency: CurrencyKind::Tokens,
                cost: CostCurve::Quadratic {
                    base: 40,
                    per_level: 5,
                },
                trigger: Some(TriggerChance {
                    base_bps: 200,
                    luck_bonus_bps_per_level: 10,
                }),
                kind: EffectKind::Gain {
                    currency: CurrencyKind::Tokens,
                    level_coefficient: 4,
                    block_multiplier: 1,
                    via_tool: true,
                },
            },
            EffectDef {
                id: Luck,
                category: Efficiency,
                max_level: 100,
                purchase_currency: CurrencyKind::Coins,
                cost: CostCurve::Quadratic {
                    base: 250,
                    per_level: 25,
                },
                trigger: None,
                kind: EffectKind::LuckAura,
            },
            EffectDef {
                id: Combustion,
                category: Efficiency,
                max_level: 200,
                purchase_currency: CurrencyKind::Coins,
                cost: CostCurve::Linear {
                    base: 150,
                    per_level: 75,
                },
                trigger: None,
                kind: EffectKind::MomentumFeed,
            },
            EffectDef {
                id: Preservation,
                category: Efficiency,
                max_level: 19,
                purchase_currency: CurrencyKind::Tokens,
                cost: CostCurve::Quadratic {
                    base: 500,
                    per_level: 100,
                },
                trigger: None,
                kind: EffectKind::Preservation,
            },
            EffectDef {
                id: Swiftness,
                category: Mobility,
                max_level: 5,
                purchase_currency: CurrencyKind::Coins,
                cost: CostCurve::Linear {
                    base: 400,
                    per_level: 200,
                },
                trigger: None,
                kind: EffectKind::Movement,
            },
            EffectDef {
                id: Abundance,
                category: Special,
                max_level: 10,
                purchase_currency: CurrencyKind::Prestige,
                cost: CostCurve::Linear {
                    base: 20,
                    per_level: 10,
                },
                trigger: Some(TriggerChance {
                    base_bps: 10,
                    luck_bonus_bps_per_level: 1,
                }),
                kind: EffectKind::SurgeTrigger,
            },
            EffectDef {
                id: Windfall,
                category: Special,
                max_level: 50,
                purchase_currency: CurrencyKind::Prestige,
                cost: CostCurve::Linear {
                    base: 10,
                    per_level: 5,
                },
                trigger: Some(TriggerChance {
                    base_bps: 100,
                    luck_bonus_bps_per_level: 5,
                }),
                kind: EffectKind::RewardDraw {
                    bands: [
                        (RewardTier::Common, 6000),
                        (RewardTier::Uncommon, 8500),
                        (RewardTier::Rare, 9700),
                        (RewardTier::Legendary, BPS_SCALE),
                    ],
                },
            },
            EffectDef {
                id: Drillshot,
                category: Special,
                max_level: 8,
                purchase_currency: CurrencyKind::Tokens,
                cost: CostCurve::Quadratic {
                    base: 300,
                    per_level: 50,
                },
                trigger: Some(TriggerChance {
                    base_bps: 300,
                    luck_bonus_bps_per_level: 10,
                }),
                kind: EffectKind::Cascade(CascadeShape::Line { max_length: 8 }),
            },
            EffectDef {
                id: Shatterburst,
                category: Special,
                max_level: 3,
                purchase_currency: CurrencyKind::Prestige,
                cost: CostCurve::Quadratic {
                    base: 100,
                    per_level: 50,
                },
                trigger: Some(TriggerChance {
                    base_bps: 150,
                    luck_bonus_bps_per_level: 5,
                }),
                kind: EffectKind::Cascade(CascadeShape::Burst { max_radius: 3 }),
            },
            EffectDef {
                id: Veinbreaker,
                category: Special,
                max_level: 10,
                purchase_currency: CurrencyKind::Tokens,
                cost: CostCurve::Linear {
                    base: 600,
                    per_level: 150,
                },
                trigger: Some(TriggerChance {
                    base_bps: 400,
                    luck_bonus_bps_per_level: 10,
                }),
                kind: EffectKind::Cascade(CascadeShape::Vein {
                    cap_per_level: 8,
                    max_cap: 64,
                }),
            },
        ])
    }
}
