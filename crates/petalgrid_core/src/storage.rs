//! World persistence.
//!
//! The two tile layers serialize to a single JSON document; flowers carry
//! enough state to resume growth after a reload. Players are not part of
//! the world file; they re-enter through their own channel.

use std::path::Path;

use thiserror::Error;

use crate::config::WorldConfig;
use crate::world::World;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("world file i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("world file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

pub fn save_world(world: &World, path: impl AsRef<Path>) -> Result<(), StorageError> {
    let record = world.to_record();
    let text = serde_json::to_string(&record)?;
    std::fs::write(path.as_ref(), text)?;
    tracing::debug!(path = %path.as_ref().display(), "world saved");
    Ok(())
}

pub fn load_world(config: WorldConfig, path: impl AsRef<Path>) -> Result<World, StorageError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let record = serde_json::from_str(&text)?;
    tracing::info!(path = %path.as_ref().display(), "world loaded");
    Ok(World::from_record(config, &record))
}

/// Loads the world file when it exists, otherwise starts a fresh world.
pub fn load_or_create(
    config: WorldConfig,
    path: impl AsRef<Path>,
) -> Result<World, StorageError> {
    if path.as_ref().exists() {
        load_world(config, path)
    } else {
        Ok(World::new(config))
    }
}
