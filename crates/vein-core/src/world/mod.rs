use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

mod cascade;
mod commands;
mod destroy;
mod events;
mod init;
mod inspect;
mod step;

use contracts::{
    EffectId, Event, EventType, Material, Notification, Position, RegionId, RunStatus, SimConfig,
    UpgradeReceipt,
};
use serde_json::{json, Value};

use crate::autobuy::{AutoUpgradeScheduler, StaticEntitlements};
use crate::catalog::EffectCatalog;
use crate::field::{FieldError, NodeField};
use crate::player::PlayerState;
use crate::roll::{mix_seed, RollStream};

pub use crate::purchase::PurchaseError;

/// Shared handle to one agent's state. Off-tick entry points lock it; the
/// tick thread locks it; two agents' handles never contend with each other.
pub type PlayerHandle = Arc<Mutex<PlayerState>>;

/// Lock a player handle, recovering from poisoning: the state is plain data
/// and every mutation path leaves it consistent, so a panicked peer does not
/// invalidate it.
pub(crate) fn lock_player(handle: &PlayerHandle) -> MutexGuard<'_, PlayerState> {
    handle
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepMetrics {
    pub processed_tick: u64,
    pub cascade_steps: u32,
    pub autobuy_purchases: u32,
    pub momentum_units_shed: u32,
}

/// One queued cascade in flight: plain data, resumed by an explicit step.
/// The outermost layers are destroyed last.
#[derive(Debug, Clone)]
struct CascadeTask {
    agent_id: String,
    effect: EffectId,
    region: RegionId,
    root_event_id: String,
    depth: u8,
    layers: VecDeque<Vec<Position>>,
}

// ---------------------------------------------------------------------------
// FeedbackBus
// ---------------------------------------------------------------------------

/// Agent-facing message queues. A transient message opens a suppression
/// window during which ordinary status messages are dropped.
#[derive(Debug, Default)]
struct FeedbackBus {
    inbox_by_agent: BTreeMap<String, VecDeque<Notification>>,
    suppress_until_by_agent: BTreeMap<String, u64>,
}

impl FeedbackBus {
    fn notify(&mut self, agent_id: &str, tick: u64, text: impl Into<String>) {
        if let Some(until) = self.suppress_until_by_agent.get(agent_id) {
            if tick < *until {
                return;
            }
        }
        self.push(agent_id, Notification {
            tick,
            text: text.into(),
            transient: false,
        });
    }

    fn notify_transient(
        &mut self,
        agent_id: &str,
        tick: u64,
        text: impl Into<String>,
        duration_ticks: u64,
    ) {
        let window_end = tick.saturating_add(duration_ticks);
        let entry = self
            .suppress_until_by_agent
            .entry(agent_id.to_string())
            .or_insert(0);
        *entry = (*entry).max(window_end);
        self.push(agent_id, Notification {
            tick,
            text: text.into(),
            transient: true,
        });
    }

    fn push(&mut self, agent_id: &str, notification: Notification) {
        let inbox = self
            .inbox_by_agent
            .entry(agent_id.to_string())
            .or_default();
        inbox.push_back(notification);
        while inbox.len() > 256 {
            let _ = inbox.pop_front();
        }
    }

    fn drain(&mut self, agent_id: &str) -> Vec<Notification> {
        self.inbox_by_agent
            .get_mut(agent_id)
            .map(|inbox| inbox.drain(..).collect())
            .unwrap_or_default()
    }

    fn pending_count(&self, agent_id: &str) -> usize {
        self.inbox_by_agent
            .get(agent_id)
            .map(VecDeque::len)
            .unwrap_or(0)
    }

    fn remove_agent(&mut self, agent_id: &str) {
        self.inbox_by_agent.remove(agent_id);
        self.suppress_until_by_agent.remove(agent_id);
    }
}

// ---------------------------------------------------------------------------
// VeinWorld
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct VeinWorld {
    config: SimConfig,
    status: RunStatus,
    catalog: EffectCatalog,
    players: BTreeMap<String, PlayerHandle>,
    field: NodeField,
    rolls: RollStream,
    event_log: Vec<Event>,
    event_index_by_id: BTreeMap<String, usize>,
    cascade_tasks: VecDeque<CascadeTask>,
    feedback: FeedbackBus,
    autobuy: AutoUpgradeScheduler,
    entitlements: StaticEntitlements,
    sequence_in_tick: u64,
    nodes_destroyed: u64,
    replay_hash: u64,
    last_step_metrics: StepMetrics,
}
