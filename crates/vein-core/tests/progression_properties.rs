use contracts::{
    CurrencyKind, EffectCategory, EffectId, EventType, Material, Position, RegionId, SimConfig,
};
use proptest::prelude::*;
use vein_core::purchase::purchase;
use vein_core::{
    CostCurve, DurabilityState, EffectCatalog, EffectDef, EffectKind, MomentumState, PlayerState,
    SurgeState, VeinWorld,
};

fn one_effect_catalog(cost: CostCurve, max_level: u32) -> EffectCatalog {
    EffectCatalog::new(vec![EffectDef {
        id: EffectId::Greed,
        category: EffectCategory::Economic,
        max_level,
        purchase_currency: CurrencyKind::Coins,
        cost,
        trigger: None,
        kind: EffectKind::LuckAura,
    }])
}

fn funded_player(coins: u64) -> PlayerState {
    let mut player = PlayerState::new("miner_test", &SimConfig::default(), 0);
    player.wallet.credit(CurrencyKind::Coins, coins);
    player
}

#[test]
fn property_1_worked_purchase_example() {
    // Current level 0, cap 5, cost(l) = 100*l, balance 250, requested 5:
    // exactly one level lands for 100.
    let catalog = one_effect_catalog(
        CostCurve::Linear {
            base: 0,
            per_level: 100,
        },
        5,
    );
    let mut player = funded_player(250);
    let receipt = purchase(&catalog, &mut player, EffectId::Greed, 5).expect("one level");
    assert_eq!(
        (receipt.levels_bought, receipt.spent, receipt.new_level),
        (1, 100, 1)
    );
}

#[test]
fn property_2_worked_gain_example() {
    // base 5%, 10 luck levels at 0.2%: the gate is 7%. A forced fire with
    // coeff 10 * level 3 + value 10 * mult 2 grants exactly 50 to both the
    // main balance and the via-tool sub-total.
    let catalog = EffectCatalog::new(vec![EffectDef {
        id: EffectId::Greed,
        category: EffectCategory::Economic,
        max_level: u32::MAX,
        purchase_currency: CurrencyKind::Coins,
        cost: CostCurve::Linear {
            base: 0,
            per_level: 1,
        },
        trigger: Some(vein_core::TriggerChance {
            base_bps: contracts::BPS_SCALE,
            luck_bonus_bps_per_level: 0,
        }),
        kind: EffectKind::Gain {
            currency: CurrencyKind::Coins,
            level_coefficient: 10,
            block_multiplier: 2,
            via_tool: true,
        },
    }]);
    let config = SimConfig {
        demo_agent_count: 0,
        ..SimConfig::default()
    };
    let mut world = VeinWorld::with_catalog(config, catalog);
    world.connect_agent("miner_test");
    {
        let handle = world.player_handle("miner_test").expect("player");
        let mut player = handle.lock().expect("lock");
        player.set_level(EffectId::Greed, 3);
    }
    world.on_node_destroyed(
        "miner_test",
        Position::new(0, -5, 0),
        Material::Iron,
        RegionId::UpperSeams,
    );
    let snapshot = world.player_snapshot("miner_test").expect("snapshot");
    assert_eq!(snapshot.wallet.coins, 50);
    assert_eq!(snapshot.wallet.coins_via_tool, 50);
}

#[test]
fn property_3_momentum_decay_is_idempotent() {
    let mut momentum = MomentumState::default();
    momentum.on_harvest(120, 1000, 5);
    momentum.decay_if_idle(20, 145);
    let settled = momentum;
    let mut again = settled;
    assert_eq!(again.decay_if_idle(20, 145), 0);
    assert_eq!(again, settled);
}

#[test]
fn property_4_protected_material_survives_a_full_demo_run() {
    let config = SimConfig {
        duration_seconds: 10,
        ..SimConfig::default()
    };
    let extent = config.field_extent;
    let mut world = VeinWorld::new(config);
    {
        let handle = world.player_handle("miner_000").expect("demo agent");
        let mut player = handle.lock().expect("lock");
        player.set_level(EffectId::Veinbreaker, 3);
        player.set_level(EffectId::Shatterburst, 2);
        player.set_level(EffectId::Drillshot, 2);
    }

    // Hammer every column from above; cascades fire along the way.
    for x in -extent..=extent {
        for z in -extent..=extent {
            for y in (-32..0).rev() {
                world
                    .harvest_node("miner_000", Position::new(x, y, z))
                    .expect("inside the field");
            }
        }
        world.step();
    }
    world.step_n(64);

    for x in -extent..=extent {
        for z in -extent..=extent {
            assert_eq!(
                world.field().material_at(Position::new(x, -33, z)),
                Material::Warden,
                "anchor layer breached at x={x}, z={z}"
            );
        }
    }
    assert_eq!(
        world
            .events()
            .iter()
            .filter(|event| event.event_type == EventType::NodeDestroyed)
            .filter(|event| {
                event
                    .details
                    .as_ref()
                    .and_then(|details| details.get("material"))
                    .and_then(|material| material.as_str())
                    == Some("warden")
            })
            .count(),
        0
    );
}

#[test]
fn property_5_two_worlds_same_seed_same_log() {
    let build = || {
        let mut world = VeinWorld::new(SimConfig::default());
        world.on_node_destroyed(
            "miner_000",
            Position::new(1, -15, 2),
            Material::Diamond,
            RegionId::DeepSeams,
        );
        world.step_n(150);
        world
    };
    let a = build();
    let b = build();
    assert_eq!(a.events(), b.events());
    assert_eq!(a.replay_hash(), b.replay_hash());
}

proptest! {
    #[test]
    fn property_6_purchase_never_overspends_or_exceeds_cap(
        balance in 0_u64..50_000,
        requested in 0_u32..64,
        base in 0_u64..500,
        per_level in 1_u64..200,
        max_level in 1_u32..40,
        quadratic in proptest::bool::ANY,
    ) {
        let cost = if quadratic {
            CostCurve::Quadratic { base, per_level }
        } else {
            CostCurve::Linear { base, per_level }
        };
        let catalog = one_effect_catalog(cost, max_level);
        let mut player = funded_player(balance);

        match purchase(&catalog, &mut player, EffectId::Greed, requested) {
            Ok(receipt) => {
                prop_assert!(receipt.spent <= balance);
                prop_assert!(receipt.new_level <= max_level);
                prop_assert!(receipt.levels_bought <= requested);
                prop_assert_eq!(
                    player.wallet.balance(CurrencyKind::Coins),
                    balance - receipt.spent
                );
            }
            Err(_) => {
                prop_assert_eq!(player.wallet.balance(CurrencyKind::Coins), balance);
                prop_assert_eq!(player.level(EffectId::Greed), 0);
            }
        }
    }

    #[test]
    fn property_7_greedy_prefix_buys_the_maximal_level_count(
        balance in 0_u64..20_000,
        requested in 1_u32..32,
        base in 0_u64..300,
        per_level in 1_u64..150,
        max_level in 1_u32..32,
    ) {
        let cost = CostCurve::Quadratic { base, per_level };
        let catalog = one_effect_catalog(cost, max_level);
        let mut player = funded_player(balance);

        // With a non-decreasing curve, no selection of n levels can be
        // cheaper than the first n, so the affordable prefix length is the
        // best any selection can do.
        let target = requested.min(max_level);
        let mut cumulative = 0_u64;
        let mut best = 0_u32;
        for level in 1..=target {
            cumulative += cost.cost(level);
            if cumulative > balance {
                break;
            }
            best = level;
        }

        match purchase(&catalog, &mut player, EffectId::Greed, requested) {
            Ok(receipt) => prop_assert_eq!(receipt.levels_bought, best),
            Err(_) => prop_assert_eq!(best, 0),
        }
    }

    #[test]
    fn property_8_momentum_decay_twice_changes_nothing_extra(
        gains in proptest::collection::vec((0_u32..250, 0_u64..100), 1..20),
        idle in 0_u64..400,
    ) {
        let mut momentum = MomentumState::default();
        let mut now = 0_u64;
        for (level, delta) in gains {
            now += delta;
            momentum.on_harvest(level, 1000, now);
        }
        now += idle;
        momentum.decay_if_idle(20, now);
        let settled = momentum;
        let mut again = settled;
        prop_assert_eq!(again.decay_if_idle(20, now), 0);
        prop_assert_eq!(again, settled);
    }

    #[test]
    fn property_9_surge_reactivation_is_monotonic(
        deltas in proptest::collection::vec(0_u64..50, 1..24),
        duration in 1_u64..200,
    ) {
        let mut surge = SurgeState::default();
        let mut now = 0_u64;
        for delta in deltas {
            now += delta;
            let was_live = surge.raw_active_flag() && surge.end_tick() > now;
            let end_before = surge.end_tick();
            surge.activate(now, duration);
            if was_live {
                prop_assert!(surge.end_tick() >= end_before);
            }
            prop_assert!(surge.is_active(now));
        }
    }

    #[test]
    fn property_10_damage_never_reaches_the_ceiling(
        rolls in proptest::collection::vec(0_u32..10_000, 1..400),
        preservation in 0_u32..30,
        max_damage in 2_u32..50,
    ) {
        let mut durability = DurabilityState::default();
        for roll in rolls {
            durability.apply_wear(preservation, 500, 9500, max_damage, roll);
            prop_assert!(durability.damage() < max_damage);
            prop_assert_eq!(
                durability.degraded(max_damage),
                durability.damage() == max_damage - 1
            );
        }
    }

    #[test]
    fn property_11_config_round_trips_with_variations(
        seed in 0_u64..u64::MAX,
        duration in 1_u32..5000,
        ceiling in 1_u32..5000,
        depth in 0_u8..16,
    ) {
        let config = SimConfig {
            seed,
            duration_seconds: duration,
            momentum_ceiling: ceiling,
            max_cascade_depth: depth,
            ..SimConfig::default()
        };
        let encoded = serde_json::to_string(&config).expect("serialize");
        let decoded: SimConfig = serde_json::from_str(&encoded).expect("deserialize");
        prop_assert_eq!(config, decoded);
    }
}
