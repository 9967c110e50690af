use super::*;

impl VeinWorld {
    pub fn start(&mut self) {
        if !self.status.is_complete() {
            self.status.mode = contracts::RunMode::Running;
        }
    }

    pub fn pause(&mut self) {
        self.status.mode = contracts::RunMode::Paused;
    }

    pub fn run_id(&self) -> &str {
        &self.status.run_id
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn catalog(&self) -> &EffectCatalog {
        &self.catalog
    }

    pub fn field(&self) -> &NodeField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut NodeField {
        &mut self.field
    }

    pub fn events(&self) -> &[Event] {
        &self.event_log
    }

    pub fn replay_hash(&self) -> u64 {
        self.replay_hash
    }

    pub fn nodes_destroyed(&self) -> u64 {
        self.nodes_destroyed
    }

    pub fn last_step_metrics(&self) -> StepMetrics {
        self.last_step_metrics
    }

    /// Advance the world one tick: expire surges, decay idle momentum on the
    /// decay cadence, run budgeted cascade steps, and drive the automatic
    /// upgrade cycle when due.
    pub fn step(&mut self) -> bool {
        if self.status.is_complete() {
            self.status.mode = contracts::RunMode::Paused;
            return false;
        }
        self.status.mode = contracts::RunMode::Running;
        let tick = self.status.current_tick.saturating_add(1);
        if tick > self.status.max_ticks {
            self.status.mode = contracts::RunMode::Paused;
            return false;
        }
        self.status.current_tick = tick;
        self.sequence_in_tick = 0;
        let mut metrics = StepMetrics {
            processed_tick: tick,
            ..StepMetrics::default()
        };

        let agent_ids: Vec<String> = self.players.keys().cloned().collect();
        let decay_due = tick % self.config.momentum_decay_interval_ticks.max(1) == 0;
        for agent_id in &agent_ids {
            let Some(handle) = self.players.get(agent_id).cloned() else {
                continue;
            };
            let mut player = lock_player(&handle);
            if player.surge.expire_if_due(tick) {
                self.push_event(
                    EventType::SurgeExpired,
                    Some(agent_id),
                    None,
                    None,
                    Vec::new(),
                    None,
                );
                self.feedback.notify(agent_id, tick, "the abundance fades");
            }
            if decay_due {
                metrics.momentum_units_shed += player
                    .momentum
                    .decay_if_idle(self.config.momentum_decay_interval_ticks, tick);
            }
        }

        metrics.cascade_steps = self.step_cascade_tasks();

        if self.autobuy.due(tick) {
            for agent_id in &agent_ids {
                let Some(handle) = self.players.get(agent_id).cloned() else {
                    continue;
                };
                let mut player = lock_player(&handle);
                let receipts = self.autobuy.attempt_for_agent(
                    &self.catalog,
                    &mut player,
                    &self.entitlements,
                    tick,
                );
                drop(player);
                if receipts.is_empty() {
                    continue;
                }
                let batch_event = self.push_event(
                    EventType::AutoUpgradeBatch,
                    Some(agent_id),
                    None,
                    None,
                    Vec::new(),
                    Some(json!({
                        "purchases": receipts.len(),
                        "spent_total": receipts.iter().map(|r| r.spent).sum::<u64>(),
                    })),
                );
                for receipt in &receipts {
                    self.push_event(
                        EventType::UpgradePurchased,
                        Some(agent_id),
                        None,
                        None,
                        vec![batch_event.clone()],
                        Some(json!({
                            "effect": receipt.effect,
                            "levels_bought": receipt.levels_bought,
                            "spent": receipt.spent,
                            "new_level": receipt.new_level,
                            "source": "auto",
                        })),
                    );
                }
                metrics.autobuy_purchases += receipts.len() as u32;
                self.feedback.notify(
                    agent_id,
                    tick,
                    format!("auto-upgrade bought {} batch(es)", receipts.len()),
                );
            }
        }

        self.last_step_metrics = metrics;
        if self.status.current_tick >= self.status.max_ticks {
            self.status.mode = contracts::RunMode::Paused;
        }
        true
    }

    pub fn step_n(&mut self, n: u64) -> u64 {
        let mut committed = 0_u64;
        for _ in 0..n {
            if !self.step() {
                break;
            }
            committed += 1;
        }
        committed
    }

    pub fn run_to_tick(&mut self, tick: u64) -> u64 {
        let mut committed = 0_u64;
        while self.status.current_tick < tick {
            if !self.step() {
                break;
            }
            committed += 1;
        }
        committed
    }

    pub(super) fn sync_queue_depth(&mut self) {
        self.status.queue_depth = self.cascade_tasks.len();
    }
}
