use super::*;

use contracts::{CurrencyKind, Facing, RunMode, SCHEMA_VERSION_V1};

fn sample_range(seed: u64, stream: u64, min: u32, max: u32) -> u32 {
    if max <= min {
        return min;
    }
    let span = u64::from(max - min) + 1;
    min + (mix_seed(seed, stream) % span) as u32
}

fn seeded_facing(seed: u64) -> Facing {
    match mix_seed(seed, 77) % 5 {
        0 => Facing::North,
        1 => Facing::South,
        2 => Facing::East,
        3 => Facing::West,
        _ => Facing::Down,
    }
}

impl VeinWorld {
    pub fn new(config: SimConfig) -> Self {
        Self::with_catalog(config, EffectCatalog::default_catalog())
    }

    pub fn with_catalog(config: SimConfig, catalog: EffectCatalog) -> Self {
        let status = RunStatus {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: config.run_id.clone(),
            current_tick: 0,
            max_ticks: config.max_ticks(),
            mode: RunMode::Paused,
            queue_depth: 0,
        };

        // The demo roster comes with a seeded demo field; a world built
        // without demo agents starts with an empty field for its caller to
        // populate.
        let mut field = NodeField::new(config.field_extent);
        if config.demo_agent_count > 0 {
            let mut generation_rolls = RollStream::new(mix_seed(config.seed, 0xF1E7));
            for x in -config.field_extent..=config.field_extent {
                for z in -config.field_extent..=config.field_extent {
                    for y in -32..0 {
                        let position = Position::new(x, y, z);
                        let Some(region) = field.region_of(position) else {
                            continue;
                        };
                        let material =
                            field.random_material_for_region(region, &mut generation_rolls);
                        field.set_node(position, material);
                    }
                    // The anchor layer under everything.
                    field.set_node(Position::new(x, -33, z), Material::Warden);
                }
            }
        }

        let mut players = BTreeMap::new();
        let mut entitlements = StaticEntitlements::default();
        for idx in 0..config.demo_agent_count {
            let agent_id = format!("miner_{idx:03}");
            let agent_seed = mix_seed(config.seed, u64::from(idx) + 1);
            let mut player = PlayerState::new(&agent_id, &config, 0);
            player.wallet.credit(
                CurrencyKind::Coins,
                u64::from(sample_range(agent_seed, 10, 200, 600)),
            );
            player.wallet.credit(
                CurrencyKind::Tokens,
                u64::from(sample_range(agent_seed, 11, 50, 200)),
            );
            player.wallet.credit(
                CurrencyKind::Prestige,
                u64::from(sample_range(agent_seed, 12, 0, 40)),
            );
            player.set_level(EffectId::Greed, sample_range(agent_seed, 20, 1, 3));
            player.set_level(EffectId::Luck, sample_range(agent_seed, 21, 0, 4));
            player.set_level(EffectId::Combustion, sample_range(agent_seed, 22, 0, 2));
            player.set_level(EffectId::Preservation, sample_range(agent_seed, 23, 0, 2));
            player.facing = seeded_facing(agent_seed);
            if idx % 2 == 0 {
                player.set_auto_upgrade(EffectId::Greed, true);
                player.set_auto_upgrade(EffectId::Combustion, true);
            }
            entitlements.grant(&agent_id);
            players.insert(agent_id, Arc::new(Mutex::new(player)));
        }

        let rolls = RollStream::new(mix_seed(config.seed, 0xA11C));
        let autobuy = AutoUpgradeScheduler::new(&config);
        Self {
            status,
            catalog,
            players,
            field,
            rolls,
            event_log: Vec::new(),
            event_index_by_id: BTreeMap::new(),
            cascade_tasks: VecDeque::new(),
            feedback: FeedbackBus::default(),
            autobuy,
            entitlements,
            sequence_in_tick: 0,
            nodes_destroyed: 0,
            replay_hash: 0,
            last_step_metrics: StepMetrics::default(),
            config,
        }
    }
}
