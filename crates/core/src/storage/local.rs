//! Client-local key/value state
//!
//! Holds the per-room host token and remembered nickname under the same
//! keys a browser client would use.

use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection};
use tracing::instrument;
use uuid::Uuid;

use super::migrations::{self, LOCAL_MIGRATIONS};
use super::parse::OptionalExt;
use super::traits::LocalStateRepository;
use crate::authority::{host_key, nickname_key};
use crate::error::Result;

pub struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        migrations::run_migrations(&conn, LOCAL_MIGRATIONS)?;
        Ok(Self { conn })
    }

    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run_migrations(&conn, LOCAL_MIGRATIONS)?;
        Ok(Self { conn })
    }
}

impl LocalStateRepository for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM local_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    #[instrument(skip(self, value))]
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO local_state (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

/// Typed accessors over the per-room keys
pub trait RoomLocalState: LocalStateRepository {
    fn host_token(&self, room_id: Uuid) -> Result<Option<String>> {
        self.get(&host_key(room_id))
    }

    fn save_host_token(&self, room_id: Uuid, token: &str) -> Result<()> {
        self.set(&host_key(room_id), token)
    }

    fn nickname(&self, room_id: Uuid) -> Result<Option<String>> {
        self.get(&nickname_key(room_id))
    }

    fn save_nickname(&self, room_id: Uuid, nickname: &str) -> Result<()> {
        self.set(&nickname_key(room_id), nickname)
    }
}

impl<T: LocalStateRepository + ?Sized> RoomLocalState for T {}
