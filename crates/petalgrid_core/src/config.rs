//! Configuration management for the simulation.
//!
//! Strongly-typed structures that map to `config.toml`. Defaults are
//! hardcoded in the `Default` impls; a config file, when present,
//! overrides them.
//!
//! ## Example `config.toml`
//!
//! ```toml
//! [world]
//! size = 26
//! tick_seconds = 0.1
//!
//! [bot]
//! level = 7
//! normal_dwell_seconds = 300.0
//!
//! [sim]
//! bots = 2
//! seed = 42
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// World-level parameters: grid geometry and the shared clock.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Side length of the square grid.
    pub size: i32,
    /// Simulated seconds advanced per world tick.
    pub tick_seconds: f64,
    /// Chance per tick of a grass sprout appearing on the background.
    pub grass_growth_chance: f64,
    /// Maximum grass tiles as a fraction of empty foreground tiles.
    pub max_grass_ratio: f64,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            size: 26,
            tick_seconds: 0.1,
            grass_growth_chance: 0.02,
            max_grass_ratio: 30.0 / 676.0,
        }
    }
}

/// Bot behavior parameters. Cadences count controller acts; windows are
/// simulated seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Capability ceiling: caps tier draws for blocks and flowers.
    pub level: u8,
    /// World ticks between controller acts.
    pub act_interval: u32,
    /// Acts a plan may survive before a forced re-plan.
    pub max_plan_age: u32,
    /// Acts between plan-mode evaluations.
    pub mode_eval_interval: u32,
    /// Acts between poison-strategy rotation checks.
    pub rotation_eval_interval: u32,
    /// Dwell in Normal mode before considering a switch to Clear.
    pub normal_dwell_seconds: f64,
    /// How long a received hazard keeps a creator's flowers suspect.
    pub hazard_memory_seconds: f64,
    /// Removal silence after which the strategy reverts to inert.
    pub rotation_silence_seconds: f64,
    /// Chance per walking act of an opportunistic off-path action.
    pub off_path_action_chance: f64,
    /// World-wide cap on non-edge blocks for defensive building.
    pub center_block_cap: usize,
    /// Chebyshev distance at which a Visit target counts as reached.
    pub visit_radius: i32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            level: 7,
            act_interval: 4,
            max_plan_age: 9,
            mode_eval_interval: 6,
            rotation_eval_interval: 6,
            normal_dwell_seconds: 300.0,
            hazard_memory_seconds: 300.0,
            rotation_silence_seconds: 600.0,
            off_path_action_chance: 0.2,
            center_block_cap: 15,
            visit_radius: 3,
        }
    }
}

/// Driver parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Number of bots to spawn.
    pub bots: usize,
    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Tick budget; `None` runs until interrupted.
    pub ticks: Option<u64>,
    /// World persistence path.
    pub world_path: String,
    /// Ticks between world saves.
    pub persist_interval: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            bots: 2,
            seed: None,
            ticks: None,
            world_path: "world_tiles.json".to_string(),
            persist_interval: 600,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub world: WorldConfig,
    pub bot: BotConfig,
    pub sim: SimConfig,
}

impl AppConfig {
    /// Loads configuration from a toml file, falling back to defaults when
    /// the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }
}
