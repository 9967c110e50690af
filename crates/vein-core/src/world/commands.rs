use super::*;

impl VeinWorld {
    /// Create (or look up) an agent's state. First reference creates it.
    pub fn connect_agent(&mut self, agent_id: &str) -> PlayerHandle {
        if let Some(handle) = self.players.get(agent_id) {
            return handle.clone();
        }
        let player = PlayerState::new(agent_id, &self.config, self.status.current_tick);
        let handle: PlayerHandle = Arc::new(Mutex::new(player));
        self.players.insert(agent_id.to_string(), handle.clone());
        self.push_event(
            EventType::AgentConnected,
            Some(agent_id),
            None,
            None,
            Vec::new(),
            None,
        );
        handle
    }

    /// Evict an agent: state goes away, queued cascade work is cancelled
    /// before its next step, and the auto-upgrade driver forgets the agent.
    /// Persisting the state beforehand is the caller's concern.
    pub fn disconnect_agent(&mut self, agent_id: &str) -> bool {
        if self.players.remove(agent_id).is_none() {
            return false;
        }
        self.cascade_tasks.retain(|task| task.agent_id != agent_id);
        self.sync_queue_depth();
        self.feedback.remove_agent(agent_id);
        self.autobuy.forget_agent(agent_id);
        self.push_event(
            EventType::AgentDisconnected,
            Some(agent_id),
            None,
            None,
            Vec::new(),
            None,
        );
        true
    }

    /// Shared handle for off-tick callers. Mutations through it serialize
    /// with the tick thread on the agent's own mutex.
    pub fn player_handle(&self, agent_id: &str) -> Option<PlayerHandle> {
        self.players.get(agent_id).cloned()
    }

    /// Manual purchase request. The error, if any, is the caller's to
    /// present; nothing else in the pipeline reacts to a failed purchase.
    pub fn purchase(
        &mut self,
        agent_id: &str,
        effect: EffectId,
        requested_levels: u32,
    ) -> Result<UpgradeReceipt, PurchaseError> {
        self.ensure_player(agent_id);
        let Some(handle) = self.players.get(agent_id).cloned() else {
            return Err(PurchaseError::UnknownEffect(effect));
        };
        let mut player = lock_player(&handle);
        let result = crate::purchase::purchase(&self.catalog, &mut player, effect, requested_levels);
        if let Ok(receipt) = &result {
            let now = self.status.current_tick;
            self.push_event(
                EventType::UpgradePurchased,
                Some(agent_id),
                None,
                None,
                Vec::new(),
                Some(json!({
                    "effect": receipt.effect,
                    "levels_bought": receipt.levels_bought,
                    "spent": receipt.spent,
                    "new_level": receipt.new_level,
                    "source": "manual",
                })),
            );
            self.feedback.notify(
                agent_id,
                now,
                format!(
                    "{} upgraded to level {} ({} spent)",
                    receipt.effect, receipt.new_level, receipt.spent
                ),
            );
        }
        result
    }

    pub fn set_effect_enabled(&mut self, agent_id: &str, effect: EffectId, enabled: bool) {
        self.ensure_player(agent_id);
        if let Some(handle) = self.players.get(agent_id).cloned() {
            lock_player(&handle).set_enabled(effect, enabled);
        }
    }

    pub fn set_auto_upgrade_enabled(&mut self, agent_id: &str, effect: EffectId, enabled: bool) {
        self.ensure_player(agent_id);
        if let Some(handle) = self.players.get(agent_id).cloned() {
            lock_player(&handle).set_auto_upgrade(effect, enabled);
        }
    }

    /// Record an entitlement change and drop the stale cache entry so the
    /// next scheduler cycle sees it.
    pub fn set_auto_upgrade_entitlement(&mut self, agent_id: &str, entitled: bool) {
        if entitled {
            self.entitlements.grant(agent_id);
        } else {
            self.entitlements.revoke(agent_id);
        }
        self.autobuy.invalidate_entitlement(agent_id);
    }

    /// External repair action. Leaving degraded mode re-enables every
    /// effect, which the pipeline picks up on the next destruction.
    pub fn repair_tool(&mut self, agent_id: &str, amount: u32) {
        let Some(handle) = self.players.get(agent_id).cloned() else {
            return;
        };
        let mut player = lock_player(&handle);
        let restored = player.durability.repair(amount, self.config.max_damage);
        let damage = player.durability.damage();
        drop(player);
        let now = self.status.current_tick;
        self.push_event(
            EventType::ToolRepaired,
            Some(agent_id),
            None,
            None,
            Vec::new(),
            Some(json!({ "damage": damage, "restored": restored })),
        );
        if restored {
            self.feedback
                .notify(agent_id, now, "tool restored; all effects back online");
        }
    }

    pub fn set_facing(&mut self, agent_id: &str, facing: contracts::Facing) {
        self.ensure_player(agent_id);
        if let Some(handle) = self.players.get(agent_id).cloned() {
            lock_player(&handle).facing = facing;
        }
    }

    pub fn drain_notifications(&mut self, agent_id: &str) -> Vec<Notification> {
        self.feedback.drain(agent_id)
    }
}
