//! citydemo — drive the simulation boundary on the built-in city grid.
//!
//! Spawns a commuter fleet, lets auto-spawn keep the population topped up,
//! injects an accident and a road closure mid-run, and prints the evolving
//! congestion picture.  Run with `RUST_LOG=tm_sim=debug` for engine traces.

use anyhow::Result;

use tm_api::SimHandle;
use tm_core::SimConfig;
use tm_sim::{SimBuilder, SpawnMix};

// ── Constants ─────────────────────────────────────────────────────────────────

const SEED: u64 = 2024;
const MAP: &str = "city";
const INITIAL_FLEET: usize = 20;
const TOTAL_TICKS: u64 = 400;
const REPORT_EVERY: u64 = 100;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = SimConfig {
        seed: SEED,
        auto_spawn: true,
        auto_spawn_target: 40,
        auto_spawn_batch: 3,
        ..SimConfig::default()
    };
    let engine = SimBuilder::new(config).map(MAP).build()?;
    let handle = SimHandle::new(engine);

    let ids = handle.spawn_multiple(INITIAL_FLEET, SpawnMix::default())?;
    println!("spawned {} vehicles on {MAP}", ids.len());

    for tick in 1..=TOTAL_TICKS {
        let state = handle.tick()?;

        // Shake things up mid-run.
        if tick == 120 {
            let accident = handle.create_accident(None, None, "severe")?;
            println!(
                "tick {tick}: severe accident on {} -> {}",
                accident.edge.from, accident.edge.to
            );
        }
        if tick == 200 {
            handle.block_road("CTR", "E", "roadworks")?;
            println!("tick {tick}: CTR -> E closed for roadworks");
        }
        if tick == 300 {
            handle.unblock_road("CTR", "E")?;
            println!("tick {tick}: CTR -> E reopened");
        }

        if tick % REPORT_EVERY == 0 {
            let stats = &state.vehicle_stats;
            println!(
                "tick {tick}: {} active ({} moving, {} stuck), {} arrived, {} reroutes, avg {:.1} u/s",
                stats.active,
                stats.moving,
                stats.stuck,
                stats.arrived,
                stats.total_reroutes,
                stats.average_speed,
            );
            for edge in handle.get_congestion_report().iter().take(3) {
                println!(
                    "  {} -> {}: {} ({} vehicles, p={:.2})",
                    edge.from, edge.to, edge.level, edge.vehicle_count, edge.congestion_probability
                );
            }
        }
    }

    println!("\nfinal statistics:");
    println!("{}", serde_json::to_string_pretty(&handle.get_traffic_statistics())?);
    Ok(())
}
