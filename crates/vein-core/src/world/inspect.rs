use super::*;

use contracts::{PlayerSnapshot, WorldSummary};

impl VeinWorld {
    pub fn player_snapshot(&self, agent_id: &str) -> Option<PlayerSnapshot> {
        self.players
            .get(agent_id)
            .map(|handle| lock_player(handle).snapshot(self.config.max_damage))
    }

    pub fn inspect_agent(&self, agent_id: &str) -> Option<Value> {
        let snapshot = self.player_snapshot(agent_id)?;
        let recent_events = self
            .event_log
            .iter()
            .rev()
            .filter(|event| event.agent_id.as_deref() == Some(agent_id))
            .take(16)
            .cloned()
            .collect::<Vec<_>>();
        Some(json!({
            "agent_id": agent_id,
            "tick": self.status.current_tick,
            "connected_tick": snapshot.connected_tick,
            "wallet": snapshot.wallet,
            "levels": snapshot.levels,
            "enabled": snapshot.enabled,
            "auto_upgrade": snapshot.auto_upgrade,
            "momentum_level": snapshot.momentum_level,
            "surge": {
                "active": snapshot.surge_active,
                "end_tick": snapshot.surge_end_tick,
            },
            "tool": {
                "damage": snapshot.damage,
                "max_damage": self.config.max_damage,
                "degraded": snapshot.degraded,
            },
            "storage": {
                "used": snapshot.storage_used,
                "capacity": self.config.storage_capacity,
                "overflowed": snapshot.storage_overflowed,
            },
            "pending_notifications": self.feedback.pending_count(agent_id),
            "recent_events": recent_events,
        }))
    }

    pub fn summary(&self) -> WorldSummary {
        WorldSummary {
            run_id: self.status.run_id.clone(),
            tick: self.status.current_tick,
            agent_count: self.players.len(),
            event_count: self.event_log.len(),
            nodes_destroyed: self.nodes_destroyed,
            pending_cascade_tasks: self.cascade_tasks.len(),
            replay_hash: self.replay_hash,
        }
    }

    /// Walk an event's `caused_by` chain back to its root. Bounded by the
    /// log length, so a malformed chain cannot loop forever.
    pub fn traverse_causal_chain(&self, event_id: &str) -> Vec<Event> {
        let mut chain = Vec::new();
        let mut cursor = self
            .event_index_by_id
            .get(event_id)
            .and_then(|idx| self.event_log.get(*idx))
            .cloned();
        let mut guard = 0_usize;

        while let Some(event) = cursor {
            if guard > self.event_log.len() + 1 {
                break;
            }
            guard += 1;
            let parent = event.caused_by.first().cloned();
            chain.push(event);
            cursor = parent.and_then(|parent_id| {
                self.event_index_by_id
                    .get(&parent_id)
                    .and_then(|idx| self.event_log.get(*idx))
                    .cloned()
            });
        }

        chain
    }
}
