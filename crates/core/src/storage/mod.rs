//! SQLite storage layer for Moyeora

mod local;
mod migrations;
mod parse;
mod participants;
mod rooms;
mod traits;

use std::collections::BTreeSet;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{LocationUpdate, NewRoom, Participant, Room};

pub use local::{LocalStore, RoomLocalState};
pub use participants::ParticipantStore;
pub use rooms::RoomStore;
pub use traits::{
    LocalStateRepository, ParticipantRepository, RoomRepository, Storage,
};

/// Shared room/participant database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        migrations::run_migrations(&self.conn, migrations::ROOM_MIGRATIONS)
    }

    /// Get current schema version
    pub fn schema_version(&self) -> Result<u32> {
        migrations::current_version(&self.conn)
    }

    pub fn rooms(&self) -> RoomStore<'_> {
        RoomStore::new(&self.conn)
    }

    pub fn participants(&self) -> ParticipantStore<'_> {
        ParticipantStore::new(&self.conn)
    }
}

impl RoomRepository for Database {
    fn create_room(&self, new_room: &NewRoom) -> Result<Room> {
        self.rooms().create(new_room)
    }

    fn find_room(&self, id: Uuid) -> Result<Option<Room>> {
        self.rooms().find_by_id(id)
    }

    fn update_roulette_title(&self, room_id: Uuid, title: &str) -> Result<()> {
        self.rooms().update_roulette_title(room_id, title)
    }

    fn claim_treasurer(&self, room_id: Uuid, winner: &str) -> Result<bool> {
        self.rooms().claim_treasurer(room_id, winner)
    }
}

impl ParticipantRepository for Database {
    fn create_participant(&self, participant: &Participant) -> Result<()> {
        self.participants().create(participant)
    }

    fn find_participant_by_nickname(
        &self,
        room_id: Uuid,
        nickname: &str,
    ) -> Result<Option<Participant>> {
        self.participants().find_by_nickname(room_id, nickname)
    }

    fn list_participants(&self, room_id: Uuid) -> Result<Vec<Participant>> {
        self.participants().list_for_room(room_id)
    }

    fn update_votes(&self, participant_id: Uuid, votes: &BTreeSet<NaiveDate>) -> Result<()> {
        self.participants().update_votes(participant_id, votes)
    }

    fn update_location(&self, participant_id: Uuid, update: &LocationUpdate) -> Result<()> {
        self.participants().update_location(participant_id, update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("moyeora.db");
        let room_id = {
            let db = Database::open(&path).unwrap();
            let new_room = NewRoom::new("파일", [NaiveDate::from_ymd_opt(2025, 6, 6).unwrap()]).unwrap();
            db.create_room(&new_room).unwrap().id
        };

        let db = Database::open(&path).unwrap();
        assert_eq!(db.schema_version().unwrap(), 1);
        assert!(db.find_room(room_id).unwrap().is_some());
    }
}
