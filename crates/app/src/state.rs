//! Application state management

use std::path::Path;

use moyeora_core::{Database, LocalStore, RoomSession};
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;

/// Opened stores plus configuration for one command run
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub local: LocalStore,
}

impl AppState {
    pub fn open(config: Config) -> Result<Self> {
        let store_path = config.store_path()?;
        let local_path = config.local_path()?;
        ensure_parent(&store_path)?;
        ensure_parent(&local_path)?;

        info!(store = %store_path.display(), local = %local_path.display(), "Opening stores");
        let db = Database::open(&store_path)?;
        let local = LocalStore::open(&local_path)?;

        Ok(Self { config, db, local })
    }

    pub fn session(&self, room_id: Uuid) -> Result<RoomSession<'_, Database, LocalStore>> {
        Ok(RoomSession::load(&self.db, &self.local, room_id)?)
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}
