//! Room storage operations

use chrono::Utc;
use rusqlite::{params, Connection, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use super::parse::{encode_date_set, parse_date_opt, parse_date_set, parse_datetime, parse_uuid, OptionalExt};
use crate::authority::generate_host_token;
use crate::error::{Error, Result};
use crate::models::{NewRoom, Room, DEFAULT_ROULETTE_TITLE};

const ROOM_COLUMNS: &str = "id, name, candidate_dates, confirmed_date, confirmed_location, treasurer,
     roulette_title, host_token, created_at, updated_at";

pub struct RoomStore<'a> {
    conn: &'a Connection,
}

fn room_from_row(row: &Row<'_>) -> rusqlite::Result<Room> {
    Ok(Room {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        candidate_dates: parse_date_set(&row.get::<_, String>(2)?)?,
        confirmed_date: parse_date_opt(row.get(3)?)?,
        confirmed_location: row.get(4)?,
        treasurer: row.get(5)?,
        roulette_title: row.get(6)?,
        host_token: row.get(7)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?)?,
        updated_at: parse_datetime(&row.get::<_, String>(9)?)?,
    })
}

impl<'a> RoomStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a room and issue its host token
    #[instrument(skip(self, new_room), fields(room_name = %new_room.name))]
    pub fn create(&self, new_room: &NewRoom) -> Result<Room> {
        let now = Utc::now();
        let room = Room {
            id: Uuid::new_v4(),
            name: new_room.name.clone(),
            candidate_dates: new_room.candidate_dates.clone(),
            confirmed_date: None,
            confirmed_location: None,
            treasurer: None,
            roulette_title: DEFAULT_ROULETTE_TITLE.to_string(),
            host_token: generate_host_token(),
            created_at: now,
            updated_at: now,
        };

        self.conn.execute(
            "INSERT INTO rooms (id, name, candidate_dates, roulette_title, host_token, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                room.id.to_string(),
                room.name,
                encode_date_set(&room.candidate_dates)?,
                room.roulette_title,
                room.host_token,
                room.created_at.to_rfc3339(),
                room.updated_at.to_rfc3339(),
            ],
        )?;

        debug!(room_id = %room.id, "Room created");
        Ok(room)
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Room>> {
        let sql = format!("SELECT {} FROM rooms WHERE id = ?1", ROOM_COLUMNS);
        let room = self
            .conn
            .query_row(&sql, params![id.to_string()], room_from_row)
            .optional()?;
        Ok(room)
    }

    #[instrument(skip(self))]
    pub fn update_roulette_title(&self, id: Uuid, title: &str) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE rooms SET roulette_title = ?1, updated_at = ?2 WHERE id = ?3",
            params![title, Utc::now().to_rfc3339(), id.to_string()],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("room {}", id)));
        }
        Ok(())
    }

    /// Record the treasurer unless one is already set
    ///
    /// Returns false when another writer got there first.
    #[instrument(skip(self))]
    pub fn claim_treasurer(&self, id: Uuid, winner: &str) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE rooms SET treasurer = ?1, updated_at = ?2 WHERE id = ?3 AND treasurer IS NULL",
            params![winner, Utc::now().to_rfc3339(), id.to_string()],
        )?;
        if updated == 0 && self.find_by_id(id)?.is_none() {
            return Err(Error::NotFound(format!("room {}", id)));
        }
        Ok(updated == 1)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{parse_date, NewRoom};
    use crate::storage::Database;

    fn new_room() -> NewRoom {
        NewRoom::new(
            "금요일 저녁",
            [parse_date("2025-06-07").unwrap(), parse_date("2025-06-06").unwrap()],
        )
        .unwrap()
    }

    #[test]
    fn test_create_and_find() {
        let db = Database::open_in_memory().unwrap();
        let room = db.rooms().create(&new_room()).unwrap();

        let found = db.rooms().find_by_id(room.id).unwrap().unwrap();
        assert_eq!(found.name, "금요일 저녁");
        assert_eq!(found.candidate_dates, room.candidate_dates);
        assert_eq!(found.roulette_title, "누가 쏴?");
        assert_eq!(found.host_token, room.host_token);
        assert_eq!(found.treasurer, None);
        assert_eq!(found.confirmed_date, None);
    }

    #[test]
    fn test_find_missing() {
        let db = Database::open_in_memory().unwrap();
        assert!(db.rooms().find_by_id(uuid::Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_claim_treasurer_once() {
        let db = Database::open_in_memory().unwrap();
        let room = db.rooms().create(&new_room()).unwrap();

        assert!(db.rooms().claim_treasurer(room.id, "alice").unwrap());
        assert!(!db.rooms().claim_treasurer(room.id, "bob").unwrap());

        let found = db.rooms().find_by_id(room.id).unwrap().unwrap();
        assert_eq!(found.treasurer.as_deref(), Some("alice"));
    }

    #[test]
    fn test_update_title() {
        let db = Database::open_in_memory().unwrap();
        let room = db.rooms().create(&new_room()).unwrap();

        db.rooms().update_roulette_title(room.id, "커피 내기").unwrap();
        let found = db.rooms().find_by_id(room.id).unwrap().unwrap();
        assert_eq!(found.roulette_title, "커피 내기");

        let err = db
            .rooms()
            .update_roulette_title(uuid::Uuid::new_v4(), "x")
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
