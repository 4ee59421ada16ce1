//! # Petalgrid Core
//!
//! The simulation engine of petalgrid - a tile-based multiplayer world
//! where players grow, steal, and booby-trap flowers.
//!
//! This crate contains the deterministic world logic, including:
//! - The double-layer tile grid with its change feed and counters
//! - Least-cost grid search with destructive and non-destructive models
//! - Walk paths with terrain staleness detection
//! - Seed placement validation (crowding and pinch-point rules)
//! - Poison strategies and their rotation feedback loop
//! - The autonomous bot controller and its plan-mode machine
//!
//! ## Architecture
//!
//! The simulation is single-threaded and cooperative: the driver ticks
//! the world, then every bot, once per fixed step. Bots read the grid
//! freshly at each access and compensate for mid-tick mutation with path
//! staleness checks instead of locks. All randomness flows through an
//! `R: Rng` parameter so seeded runs are reproducible.
//!
//! ## Example
//!
//! ```
//! use petalgrid_core::bot::Bot;
//! use petalgrid_core::config::{AppConfig, BotConfig};
//! use petalgrid_core::world::World;
//! use petalgrid_data::Pos;
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let config = AppConfig::default();
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut world = World::new(config.world.clone());
//! let id = world.add_player("petal-bot", config.bot.level, Pos::new(3, 3), &mut rng);
//! let mut bot = Bot::new(id, config.bot.clone(), world.now());
//! for _ in 0..100 {
//!     world.tick(&mut rng);
//!     bot.timer_event(&mut world, &mut rng);
//! }
//! ```

/// The autonomous bot controller and its memories
pub mod bot;
/// Configuration management for simulation parameters
pub mod config;
/// Simulation metrics and logging setup
pub mod metrics;
/// Walk paths reconstructed from search back-pointers
pub mod path;
/// Plan modes and their transition machine
pub mod plan;
/// Seed placement validation
pub mod planting;
/// Poison strategies and ratio steering inputs
pub mod poison;
/// Least-cost search over the grid
pub mod search;
/// World persistence
pub mod storage;
/// The tile catalog and entity state
pub mod tile;
/// The shared world grid
pub mod world;

pub use bot::Bot;
pub use config::AppConfig;
pub use metrics::{init_logging, Metrics};
pub use plan::PlanMode;
pub use poison::PoisonStrategy;
pub use world::{World, WorldEvent};
