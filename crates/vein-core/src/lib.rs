//! Progression-economy kernel for an incremental node-harvesting game.
//!
//! A destroyed node enters the pipeline in [`world::VeinWorld::on_node_destroyed`]:
//! chance-gated effects draw against the deterministic roll stream, gains are
//! scaled by the momentum accumulator and the abundance window, the tool
//! durability state machine gates which effects run at all, and cascading
//! effects feed further destructions back into the same pipeline. A greedy
//! budget-constrained purchaser raises effect levels, both on demand and
//! through the periodic auto-upgrade driver.

pub mod autobuy;
pub mod catalog;
pub mod durability;
pub mod field;
pub mod ledger;
pub mod momentum;
pub mod player;
pub mod purchase;
pub mod roll;
pub mod surge;
pub mod world;

pub use autobuy::{AutoUpgradeScheduler, EntitlementProvider, StaticEntitlements};
pub use catalog::{CascadeShape, CostCurve, EffectCatalog, EffectDef, EffectKind, TriggerChance};
pub use durability::{DurabilityState, WearOutcome};
pub use field::{FieldError, NodeField};
pub use ledger::{LedgerError, Wallet};
pub use momentum::MomentumState;
pub use player::{PlayerState, Storage};
pub use purchase::{purchase, PurchaseError};
pub use roll::{mix_seed, RollStream};
pub use surge::{SurgeActivation, SurgeState};
pub use world::{PlayerHandle, StepMetrics, VeinWorld};
