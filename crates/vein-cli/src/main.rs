use std::env;

use contracts::SimConfig;
use vein_core::VeinWorld;

fn print_usage() {
    println!("vein-cli <command>");
    println!("commands:");
    println!("  status");
    println!("  step [n]");
    println!("  run-to <tick>");
    println!("  inspect <agent_id> [ticks]");
    println!("    steps a demo world and prints the agent's JSON view");
    println!("  simulate <run_id> <seed> [ticks]");
    println!("    runs a deterministic demo session and prints the summary");
}

fn parse_u64(value: Option<&String>, label: &str) -> Result<u64, String> {
    let raw = value.ok_or_else(|| format!("missing {}", label))?;
    raw.parse::<u64>()
        .map_err(|_| format!("invalid {}: {}", label, raw))
}

fn demo_config(run_id: String, seed: u64, target_tick: u64) -> SimConfig {
    let ticks_per_second = contracts::TICKS_PER_SECOND;
    SimConfig {
        run_id,
        seed,
        duration_seconds: (target_tick.div_ceil(ticks_per_second)).max(1) as u32,
        ..SimConfig::default()
    }
}

fn run_simulation(args: &[String]) -> Result<(), String> {
    let run_id = args
        .get(2)
        .cloned()
        .ok_or_else(|| "missing run_id".to_string())?;
    let seed = parse_u64(args.get(3), "seed")?;
    let target_tick = args
        .get(4)
        .map(|value| {
            value
                .parse::<u64>()
                .map_err(|_| format!("invalid ticks: {value}"))
        })
        .transpose()?
        .unwrap_or(2_400);

    let mut world = VeinWorld::new(demo_config(run_id, seed, target_tick));
    world.start();

    // Drive the demo roster: each agent chews through its own column of the
    // field while the tick loop runs decay, cascades, and auto-upgrades.
    let extent = world.config().field_extent;
    let agent_count = world.config().demo_agent_count;
    let mut cursors: Vec<(String, i32, i32)> = (0..agent_count)
        .map(|idx| {
            let agent_id = format!("miner_{idx:03}");
            let x = -extent + i32::from(idx) % (2 * extent + 1);
            (agent_id, x, -1)
        })
        .collect();

    let mut committed = 0_u64;
    while world.status().current_tick < target_tick {
        if !world.step() {
            break;
        }
        committed += 1;
        for (agent_id, x, y) in &mut cursors {
            if *y < -32 {
                continue;
            }
            let position = contracts::Position::new(*x, *y, 0);
            world
                .harvest_node(agent_id, position)
                .map_err(|err| err.to_string())?;
            *y -= 1;
        }
    }
    world.pause();

    let summary = world.summary();
    println!(
        "simulated run_id={} seed={} committed={} tick={}/{} nodes_destroyed={} events={} replay_hash={:016x}",
        summary.run_id,
        seed,
        committed,
        world.status().current_tick,
        world.status().max_ticks,
        summary.nodes_destroyed,
        summary.event_count,
        summary.replay_hash,
    );
    for idx in 0..agent_count {
        let agent_id = format!("miner_{idx:03}");
        if let Some(snapshot) = world.player_snapshot(&agent_id) {
            println!(
                "  {agent_id}: coins={} (tool {}) tokens={} prestige={} momentum={} damage={}{}",
                snapshot.wallet.coins,
                snapshot.wallet.coins_via_tool,
                snapshot.wallet.tokens,
                snapshot.wallet.prestige,
                snapshot.momentum_level,
                snapshot.damage,
                if snapshot.degraded { " [degraded]" } else { "" },
            );
        }
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(String::as_str);

    match command {
        Some("status") => {
            let world = VeinWorld::new(SimConfig::default());
            println!("{}", world.status());
        }
        Some("step") => {
            let steps = args.get(2).and_then(|v| v.parse::<u64>().ok()).unwrap_or(1);
            let mut world = VeinWorld::new(SimConfig::default());
            let committed = world.step_n(steps);
            let metrics = world.last_step_metrics();
            println!(
                "stepped={} cascade_steps={} autobuy_purchases={} momentum_shed={} {}",
                committed,
                metrics.cascade_steps,
                metrics.autobuy_purchases,
                metrics.momentum_units_shed,
                world.status()
            );
        }
        Some("run-to") => match parse_u64(args.get(2), "tick") {
            Ok(target_tick) => {
                let mut world = VeinWorld::new(SimConfig::default());
                let committed = world.run_to_tick(target_tick);
                println!("committed={} {}", committed, world.status());
            }
            Err(err) => {
                eprintln!("error: {}", err);
                print_usage();
                std::process::exit(2);
            }
        },
        Some("inspect") => {
            let Some(agent_id) = args.get(2) else {
                eprintln!("error: missing agent_id");
                print_usage();
                std::process::exit(2);
            };
            let steps = args.get(3).and_then(|v| v.parse::<u64>().ok()).unwrap_or(0);
            let mut world = VeinWorld::new(SimConfig::default());
            world.step_n(steps);
            match world.inspect_agent(agent_id) {
                Some(view) => println!("{view}"),
                None => {
                    eprintln!("error: unknown agent {agent_id}");
                    std::process::exit(1);
                }
            }
        }
        Some("simulate") => {
            if let Err(err) = run_simulation(&args) {
                eprintln!("error: {err}");
                print_usage();
                std::process::exit(2);
            }
        }
        _ => {
            print_usage();
        }
    }
}
