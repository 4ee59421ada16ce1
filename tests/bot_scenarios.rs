//! End-to-end controller scenarios driven through the public tick API.

use petalgrid_core::bot::Bot;
use petalgrid_core::config::{BotConfig, WorldConfig};
use petalgrid_core::plan::PlanMode;
use petalgrid_core::poison::PoisonStrategy;
use petalgrid_core::tile::Tile;
use petalgrid_core::world::{World, WorldEvent};
use petalgrid_data::Pos;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Config with every cadence tightened to one tick so scenarios can
/// observe single decisions.
fn eager_bot_config() -> BotConfig {
    BotConfig {
        act_interval: 1,
        mode_eval_interval: 1,
        rotation_eval_interval: 1,
        ..BotConfig::default()
    }
}

fn route_events(world: &mut World, bots: &mut [Bot]) {
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

#[test]
fn test_wall_across_path_forces_replan() {
    let mut world = World::new(WorldConfig::default());
    let mut rng = ChaCha8Rng::seed_from_u64(14);
    let id = world.add_player("bot", 7, Pos::new(3, 3), &mut rng);
    let rival = world.add_player("rival", 7, Pos::new(22, 22), &mut rng);
    let mut bot = Bot::new(id, eager_bot_config(), world.now());
    world
        .spawn_flower(Pos::new(3, 10), rival, false, 1, 300, 50)
        .unwrap();

    world.tick(&mut rng);
    bot.timer_event(&mut world, &mut rng);
    let planned: Vec<Pos> = bot
        .walk_path
        .as_ref()
        .expect("bot planned a path to the flower")
        .steps()
        .map(|step| step.pos)
        .collect();
    assert_eq!(*planned.last().unwrap(), Pos::new(3, 10));

    // A wall lands on a cell the remaining path crosses.
    let wall = planned[planned.len() - 3];
    world.set_foreground(wall, Tile::Block { tier: 0 });
    assert!(bot.walk_path.as_ref().unwrap().is_stale(&world));

    world.tick(&mut rng);
    bot.timer_event(&mut world, &mut rng);
    let replanned = bot.walk_path.as_ref().expect("bot replanned");
    assert!(!replanned.is_stale(&world));
    assert!(replanned.steps().all(|step| step.pos != wall));
}

#[test]
fn test_rotation_reverts_on_silence() {
    let mut world = World::new(WorldConfig {
        // Long ticks make the ten-minute window pass in a short run.
        tick_seconds: 20.0,
        ..WorldConfig::default()
    });
    let mut rng = ChaCha8Rng::seed_from_u64(15);
    let id = world.add_player("bot", 7, Pos::new(3, 3), &mut rng);
    let mut bot = Bot::new(id, eager_bot_config(), world.now());
    bot.strategy = PoisonStrategy::BlockAdjacency { next_to: true };
    bot.flower_removed_event(false, false, world.now());

    for _ in 0..31 {
        world.tick(&mut rng);
        bot.timer_event(&mut world, &mut rng);
    }
    assert!(bot.strategy.is_inert());
}

#[test]
fn test_visit_completion_restamps_normal_entry() {
    let mut world = World::new(WorldConfig::default());
    let mut rng = ChaCha8Rng::seed_from_u64(16);
    let id = world.add_player("bot", 7, Pos::new(18, 20), &mut rng);
    let other = world.add_player("other", 7, Pos::new(20, 20), &mut rng);
    let mut bot = Bot::new(id, eager_bot_config(), world.now());
    bot.mode = PlanMode::Visit(other);
    bot.normal_entered_at = -1.0;

    world.tick(&mut rng);
    bot.timer_event(&mut world, &mut rng);
    assert_eq!(bot.mode, PlanMode::Normal);
    assert!((bot.normal_entered_at - world.now()).abs() < f64::EPSILON);
}

#[test]
fn test_steering_queues_poison_verdict_planting() {
    let mut world = World::new(WorldConfig::default());
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let id = world.add_player("bot", 7, Pos::new(3, 3), &mut rng);
    let mut bot = Bot::new(id, eager_bot_config(), world.now());
    bot.strategy = PoisonStrategy::BlockAdjacency { next_to: true };
    // Three own benign sprouts: live ratio 0.0, below the band minimum.
    for (x, y) in [(20, 20), (20, 24), (24, 20)] {
        world.spawn_flower(Pos::new(x, y), id, false, 0, 0, 50).unwrap();
    }
    world.set_foreground(Pos::new(6, 6), Tile::Block { tier: 0 });

    world.tick(&mut rng);
    bot.timer_event(&mut world, &mut rng);
    let action = bot.target_action.expect("bot queued a planting");
    assert_eq!(
        bot.strategy.location_verdict(&world, id, action.pos),
        Some(true),
        "steering below the band must pick a poison-verdict cell"
    );
}

#[test]
fn test_two_bot_simulation_smoke() {
    let mut world = World::new(WorldConfig::default());
    let mut rng = ChaCha8Rng::seed_from_u64(18);
    let config = BotConfig::default();
    let mut bots: Vec<Bot> = (0..2)
        .map(|index| {
            let id = world.add_player(
                format!("petal-bot-{index}"),
                config.level,
                Pos::new(3, 3),
                &mut rng,
            );
            Bot::new(id, config.clone(), world.now())
        })
        .collect();

    let mut planted = false;
    for _ in 0..2000 {
        world.tick(&mut rng);
        for bot in &mut bots {
            bot.timer_event(&mut world, &mut rng);
        }
        route_events(&mut world, &mut bots);
        planted = planted || world.flowers().next().is_some();
    }
    // Bots stayed alive, kept acting, and gardened something.
    for bot in &bots {
        assert!(world.player(bot.id).is_some());
    }
    assert!(planted, "bots never planted a flower in 2000 ticks");
}
