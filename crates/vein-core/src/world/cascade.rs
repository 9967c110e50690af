use super::*;

use contracts::Facing;

use crate::catalog::CascadeShape;

/// Cube shells around an origin, innermost first. The origin itself is
/// excluded; it was the node that triggered the burst.
fn cube_layers(origin: Position, radius: i32) -> VecDeque<Vec<Position>> {
    let mut layers = VecDeque::new();
    for shell in 1..=radius {
        let mut layer = Vec::new();
        for dx in -shell..=shell {
            for dy in -shell..=shell {
                for dz in -shell..=shell {
                    if dx.abs().max(dy.abs()).max(dz.abs()) == shell {
                        layer.push(origin.offset(dx, dy, dz));
                    }
                }
            }
        }
        layers.push_back(layer);
    }
    layers
}

impl VeinWorld {
    /// Resolve a fired cascade effect. Line and vein shapes destroy their
    /// selection immediately; bursts become queued tasks that the tick loop
    /// steps one layer at a time.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn prime_cascade(
        &mut self,
        agent_id: &str,
        effect: EffectId,
        shape: CascadeShape,
        level: u32,
        origin: Position,
        material: Material,
        region: RegionId,
        facing: Facing,
        root_event_id: String,
        depth: u8,
    ) {
        if depth >= self.config.max_cascade_depth {
            self.push_event(
                EventType::CascadeDepthExceeded,
                Some(agent_id),
                Some(region),
                Some(origin),
                vec![root_event_id],
                Some(json!({ "effect": effect, "depth": depth })),
            );
            return;
        }

        match shape {
            CascadeShape::Line { max_length } => {
                let length = level.min(max_length) as i32;
                let (dx, dy, dz) = facing.step();
                let positions: Vec<Position> = (1..=length)
                    .map(|step| origin.offset(dx * step, dy * step, dz * step))
                    .collect();
                self.push_event(
                    EventType::CascadePrimed,
                    Some(agent_id),
                    Some(region),
                    Some(origin),
                    vec![root_event_id.clone()],
                    Some(json!({ "effect": effect, "shape": "line", "selected": positions.len() })),
                );
                let destroyed = self.destroy_positions(agent_id, &positions, &root_event_id, depth);
                self.push_event(
                    EventType::CascadeFinished,
                    Some(agent_id),
                    Some(region),
                    Some(origin),
                    vec![root_event_id],
                    Some(json!({ "effect": effect, "destroyed": destroyed })),
                );
            }
            CascadeShape::Vein {
                cap_per_level,
                max_cap,
            } => {
                let cap = cap_per_level.saturating_mul(level).min(max_cap);
                let positions = self.field.connected_same_material(origin, material, cap);
                self.push_event(
                    EventType::CascadePrimed,
                    Some(agent_id),
                    Some(region),
                    Some(origin),
                    vec![root_event_id.clone()],
                    Some(json!({ "effect": effect, "shape": "vein", "selected": positions.len() })),
                );
                let destroyed = self.destroy_positions(agent_id, &positions, &root_event_id, depth);
                self.push_event(
                    EventType::CascadeFinished,
                    Some(agent_id),
                    Some(region),
                    Some(origin),
                    vec![root_event_id],
                    Some(json!({ "effect": effect, "destroyed": destroyed })),
                );
            }
            CascadeShape::Burst { max_radius } => {
                let radius = level.min(max_radius) as i32;
                let layers = cube_layers(origin, radius);
                self.push_event(
                    EventType::CascadePrimed,
                    Some(agent_id),
                    Some(region),
                    Some(origin),
                    vec![root_event_id.clone()],
                    Some(json!({ "effect": effect, "shape": "burst", "layers": layers.len() })),
                );
                self.cascade_tasks.push_back(CascadeTask {
                    agent_id: agent_id.to_string(),
                    effect,
                    region,
                    root_event_id,
                    depth,
                    layers,
                });
                self.sync_queue_depth();
            }
        }
    }

    /// Destroy a selection of positions through the pipeline. Out-of-region
    /// positions, empty cells, and the protected anchor material are all
    /// skipped quietly. Returns how many nodes actually went.
    pub(super) fn destroy_positions(
        &mut self,
        agent_id: &str,
        positions: &[Position],
        caused_by: &str,
        depth: u8,
    ) -> u32 {
        let mut destroyed = 0_u32;
        for position in positions {
            let Some(region) = self.field.region_of(*position) else {
                continue;
            };
            let material = self.field.material_at(*position);
            if !material.is_harvestable() {
                continue;
            }
            if !self.field.replace_material(*position, Material::Air) {
                continue;
            }
            destroyed += 1;
            self.destroy_node(
                agent_id,
                *position,
                material,
                region,
                Some(caused_by.to_string()),
                depth.saturating_add(1),
                false,
            );
        }
        destroyed
    }

    /// Run queued cascade steps up to the per-tick budget. Tasks whose agent
    /// has disconnected are dropped before doing any work.
    pub(super) fn step_cascade_tasks(&mut self) -> u32 {
        let budget = self.config.cascade_steps_per_tick;
        let mut steps = 0_u32;
        while steps < budget {
            let Some(mut task) = self.cascade_tasks.pop_front() else {
                break;
            };
            if !self.players.contains_key(&task.agent_id) {
                continue;
            }
            let Some(layer) = task.layers.pop_front() else {
                continue;
            };
            let destroyed =
                self.destroy_positions(&task.agent_id, &layer, &task.root_event_id, task.depth);
            steps += 1;
            self.push_event(
                EventType::CascadeStepped,
                Some(task.agent_id.as_str()),
                Some(task.region),
                None,
                vec![task.root_event_id.clone()],
                Some(json!({
                    "effect": task.effect,
                    "destroyed": destroyed,
                    "remaining_layers": task.layers.len(),
                })),
            );
            if task.layers.is_empty() {
                self.push_event(
                    EventType::CascadeFinished,
                    Some(task.agent_id.as_str()),
                    Some(task.region),
                    None,
                    vec![task.root_event_id.clone()],
                    Some(json!({ "effect": task.effect })),
                );
            } else {
                self.cascade_tasks.push_back(task);
            }
        }
        self.sync_queue_depth();
        steps
    }
}

#[cfg(test)]
mod shape_tests {
    use super::*;

    #[test]
    fn cube_layers_cover_the_full_volume_without_the_origin() {
        let origin = Position::new(0, 0, 0);
        let layers = cube_layers(origin, 2);
        assert_eq!(layers.len(), 2);
        // Shell sizes: 3^3 - 1 = 26, then 5^3 - 3^3 = 98.
        assert_eq!(layers[0].len(), 26);
        assert_eq!(layers[1].len(), 98);
        assert!(!layers.iter().flatten().any(|p| *p == origin));
    }

    #[test]
    fn zero_radius_produces_no_layers() {
        assert!(cube_layers(Position::new(1, 2, 3), 0).is_empty());
    }
}
