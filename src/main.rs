use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use petalgrid_core::bot::Bot;
use petalgrid_core::config::AppConfig;
use petalgrid_core::world::{World, WorldEvent};
use petalgrid_core::{init_logging, storage, Metrics};
use petalgrid_data::Pos;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Custom config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Tick budget; runs until interrupted when absent
    #[arg(long)]
    ticks: Option<u64>,

    /// Number of bots to spawn
    #[arg(long)]
    bots: Option<usize>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// World persistence file
    #[arg(long)]
    world: Option<String>,
}

fn main() -> Result<()> {
    init_logging();
    let args = Args::parse();
    let mut config = AppConfig::load(&args.config)?;
    if let Some(ticks) = args.ticks {
        config.sim.ticks = Some(ticks);
    }
    if let Some(bots) = args.bots {
        config.sim.bots = bots;
    }
    if let Some(seed) = args.seed {
        config.sim.seed = Some(seed);
    }
    if let Some(world) = args.world {
        config.sim.world_path = world;
    }

    let seed = config.sim.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    tracing::info!(seed, bots = config.sim.bots, "starting petalgrid simulation");

    let mut world = storage::load_or_create(config.world.clone(), &config.sim.world_path)?;
    let mut bots: Vec<Bot> = (0..config.sim.bots)
        .map(|index| {
            let id = world.add_player(
                format!("petal-bot-{index}"),
                config.bot.level,
                Pos::new(3, 3),
                &mut rng,
            );
            Bot::new(id, config.bot.clone(), world.now())
        })
        .collect();

    let metrics = Metrics::new();
    let mut tick = 0u64;
    while config.sim.ticks.is_none_or(|budget| tick < budget) {
        let started = Instant::now();
        world.tick(&mut rng);
        for bot in &mut bots {
            bot.timer_event(&mut world, &mut rng);
        }
        dispatch_events(&mut world, &mut bots);
        metrics.record_tick(started.elapsed(), world.flowers().count(), bots.len());
        tick += 1;
        if tick % config.sim.persist_interval == 0 {
            storage::save_world(&world, &config.sim.world_path)?;
        }
    }

    storage::save_world(&world, &config.sim.world_path)?;
    tracing::info!(ticks = tick, elapsed = ?metrics.elapsed(), "simulation finished");
    Ok(())
}

/// Routes removal notifications to the bots they concern.
fn dispatch_events(world: &mut World, bots: &mut [Bot]) {
    let now = world.now();
    for event in world.take_events() {
        match event {
            WorldEvent::FlowerRemoved {
                creator,
                remover,
                poisonous,
            } => {
                if let Some(bot) = bots.iter_mut().find(|bot| bot.id == creator) {
                    bot.flower_removed_event(poisonous, remover == creator, now);
                }
            }
            WorldEvent::Poisoned { victim, creator } => {
                if let Some(bot) = bots.iter_mut().find(|bot| bot.id == victim) {
                    bot.poison_event(creator, now);
                }
            }
        }
    }
}
