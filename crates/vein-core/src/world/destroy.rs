use super::*;

use contracts::CurrencyKind;

use crate::catalog::{EffectDef, EffectKind};
use crate::durability::WearOutcome;
use crate::surge::SurgeActivation;

/// Gain for one fired economic effect, in integer arithmetic.
///
/// `round((coeff * level + value * mult) * momentum * surge)`, where the
/// momentum multiplier arrives as permille. The degraded penalty, when
/// present, scales the result down last.
pub(super) fn scaled_gain(
    level_coefficient: u64,
    effect_level: u32,
    block_value: u64,
    block_multiplier: u64,
    momentum_permille: u64,
    surge_boost: u64,
    degraded_penalty_percent: Option<u32>,
) -> u64 {
    let base = level_coefficient
        .saturating_mul(u64::from(effect_level))
        .saturating_add(block_value.saturating_mul(block_multiplier));
    let with_momentum = base
        .saturating_mul(momentum_permille)
        .saturating_add(500)
        / 1000;
    let boosted = with_momentum.saturating_mul(surge_boost.max(1));
    match degraded_penalty_percent {
        Some(percent) => boosted
            .saturating_mul(u64::from(percent))
            .saturating_add(50)
            / 100,
        None => boosted,
    }
}

impl VeinWorld {
    /// Pipeline entry point: called once per primary destruction by the
    /// outside world, and again internally for every node a cascade takes.
    pub fn on_node_destroyed(
        &mut self,
        agent_id: &str,
        position: Position,
        material: Material,
        region: RegionId,
    ) {
        self.destroy_node(agent_id, position, material, region, None, 0, true);
    }

    /// Harvest whatever the field holds at `position`: read the material and
    /// region, clear the node, and run the pipeline. Empty cells and the
    /// protected anchor material harvest nothing; a position outside every
    /// region is the caller's mistake and comes back as an error.
    pub fn harvest_node(
        &mut self,
        agent_id: &str,
        position: Position,
    ) -> Result<Option<Material>, FieldError> {
        let region = self
            .field
            .region_of(position)
            .ok_or(FieldError::InvalidRegion(position))?;
        let material = self.field.material_at(position);
        if !material.is_harvestable() {
            return Ok(None);
        }
        self.field.replace_material(position, Material::Air);
        self.on_node_destroyed(agent_id, position, material, region);
        Ok(Some(material))
    }

    pub(super) fn destroy_node(
        &mut self,
        agent_id: &str,
        position: Position,
        material: Material,
        region: RegionId,
        caused_by: Option<String>,
        depth: u8,
        primary: bool,
    ) {
        // The anchor material is immune to everything, at any depth.
        if !material.is_harvestable() {
            return;
        }
        self.ensure_player(agent_id);
        let now = self.status.current_tick;

        let destroyed_event = self.push_event(
            EventType::NodeDestroyed,
            Some(agent_id),
            Some(region),
            Some(position),
            caused_by.into_iter().collect(),
            Some(json!({
                "material": material,
                "depth": depth,
                "primary": primary,
            })),
        );
        self.nodes_destroyed += 1;

        let Some(handle) = self.players.get(agent_id).cloned() else {
            return;
        };
        let mut player = lock_player(&handle);

        // Yield placement. A full store is a counted outcome, not a failure.
        if player.storage.try_store(material, 1) {
            self.push_event(
                EventType::YieldStored,
                Some(agent_id),
                Some(region),
                Some(position),
                vec![destroyed_event.clone()],
                Some(json!({ "material": material })),
            );
        } else {
            player.storage.record_overflow(1);
            self.push_event(
                EventType::StorageOverflow,
                Some(agent_id),
                Some(region),
                Some(position),
                vec![destroyed_event.clone()],
                Some(json!({ "material": material })),
            );
        }

        // Tool wear rolls only on the agent's own swing, never on nodes a
        // cascade takes.
        if primary {
            let preservation = player.active_level(EffectId::Preservation);
            let wear_roll = self.rolls.roll_bps();
            let outcome = player.durability.apply_wear(
                preservation,
                self.config.preservation_bps_per_level,
                self.config.preservation_bps_cap,
                self.config.max_damage,
                wear_roll,
            );
            if let WearOutcome::Worn { newly_degraded } = outcome {
                self.push_event(
                    EventType::ToolDamaged,
                    Some(agent_id),
                    Some(region),
                    Some(position),
                    vec![destroyed_event.clone()],
                    Some(json!({ "damage": player.durability.damage() })),
                );
                if newly_degraded {
                    self.push_event(
                        EventType::ToolDegraded,
                        Some(agent_id),
                        Some(region),
                        Some(position),
                        vec![destroyed_event.clone()],
                        None,
                    );
                    self.feedback.notify_transient(
                        agent_id,
                        now,
                        "tool critical: repair before it gives out",
                        contracts::TICKS_PER_SECOND * 5,
                    );
                }
            }
        }

        let degraded = player.durability.degraded(self.config.max_damage);
        let luck_level = if degraded {
            0
        } else {
            player.active_level(EffectId::Luck)
        };
        let momentum_permille = player.momentum.multiplier_permille();
        let surge_boost = if player.surge.is_active(now) {
            u64::from(self.config.surge_boost)
        } else {
            1
        };

        let defs: Vec<EffectDef> = self.catalog.defs().cloned().collect();
        let mut fired_cascades = Vec::new();
        for def in &defs {
            let level = player.active_level(def.id);
            if level == 0 {
                continue;
            }
            if degraded && def.id != EffectId::Greed {
                continue;
            }
            let Some(trigger) = def.trigger else {
                continue;
            };
            let chance_bps = trigger.chance_bps(luck_level);
            if self.rolls.roll_bps() >= chance_bps {
                continue;
            }
            let fired_event = self.push_event(
                EventType::EffectFired,
                Some(agent_id),
                Some(region),
                Some(position),
                vec![destroyed_event.clone()],
                Some(json!({ "effect": def.id, "level": level })),
            );

            match &def.kind {
                EffectKind::Gain {
                    currency,
                    level_coefficient,
                    block_multiplier,
                    via_tool,
                } => {
                    let penalty = degraded.then_some(self.config.degraded_penalty_percent);
                    let amount = scaled_gain(
                        *level_coefficient,
                        level,
                        material.base_value(),
                        *block_multiplier,
                        momentum_permille,
                        surge_boost,
                        penalty,
                    );
                    if amount > 0 {
                        if *via_tool {
                            player.wallet.credit_via_tool(*currency, amount);
                        } else {
                            player.wallet.credit(*currency, amount);
                        }
                        self.push_event(
                            EventType::CurrencyGranted,
                            Some(agent_id),
                            Some(region),
                            Some(position),
                            vec![fired_event.clone()],
                            Some(json!({
                                "currency": currency,
                                "amount": amount,
                                "via_tool": via_tool,
                            })),
                        );
                        self.feedback
                            .notify(agent_id, now, format!("+{amount} {currency:?}"));
                    }
                }
                EffectKind::SurgeTrigger => {
                    match player.surge.activate(now, self.config.surge_duration_ticks) {
                        SurgeActivation::Started { end_tick } => {
                            self.push_event(
                                EventType::SurgeActivated,
                                Some(agent_id),
                                Some(region),
                                Some(position),
                                vec![fired_event.clone()],
                                Some(json!({ "end_tick": end_tick })),
                            );
                            self.feedback.notify_transient(
                                agent_id,
                                now,
                                "abundance surges through the seam",
                                self.config.surge_duration_ticks.min(
                                    contracts::TICKS_PER_SECOND * 5,
                                ),
                            );
                        }
                        SurgeActivation::Extended { end_tick } => {
                            self.push_event(
                                EventType::SurgeExtended,
                                Some(agent_id),
                                Some(region),
                                Some(position),
                                vec![fired_event.clone()],
                                Some(json!({ "end_tick": end_tick })),
                            );
                        }
                    }
                }
                EffectKind::RewardDraw { bands } => {
                    let draw = self.rolls.roll_bps();
                    let tier = bands
                        .iter()
                        .find(|(_, ceiling)| draw < *ceiling)
                        .map(|(tier, _)| *tier)
                        .unwrap_or(contracts::RewardTier::Legendary);
                    let bonus = tier.prestige_bonus();
                    player.wallet.credit_via_tool(CurrencyKind::Prestige, bonus);
                    self.push_event(
                        EventType::RewardTierDrawn,
                        Some(agent_id),
                        Some(region),
                        Some(position),
                        vec![fired_event.clone()],
                        Some(json!({ "tier": tier, "prestige": bonus })),
                    );
                    self.feedback
                        .notify(agent_id, now, format!("windfall: {tier:?} (+{bonus} prestige)"));
                }
                EffectKind::Cascade(shape) => {
                    fired_cascades.push((def.id, *shape, level, fired_event));
                }
                EffectKind::LuckAura
                | EffectKind::MomentumFeed
                | EffectKind::Preservation
                | EffectKind::Movement => {}
            }
        }

        // Momentum feeds last, once per pipeline entry.
        if !degraded {
            let combustion = player.active_level(EffectId::Combustion);
            if combustion > 0 {
                player
                    .momentum
                    .on_harvest(combustion, self.config.momentum_ceiling, now);
            }
        }

        let facing = player.facing;
        drop(player);

        for (effect, shape, level, fired_event) in fired_cascades {
            self.prime_cascade(
                agent_id,
                effect,
                shape,
                level,
                position,
                material,
                region,
                facing,
                fired_event,
                depth,
            );
        }
    }

    /// Per-agent state is created on first reference.
    pub(super) fn ensure_player(&mut self, agent_id: &str) {
        if !self.players.contains_key(agent_id) {
            self.connect_agent(agent_id);
        }
    }
}
