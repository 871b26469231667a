//! Participant storage operations

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{encode_date_set, is_unique_violation, parse_date_set, parse_datetime, parse_uuid, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{LocationUpdate, Participant};

const PARTICIPANT_COLUMNS: &str =
    "id, room_id, nickname, voted_dates, location_lat, location_lng, location_name, created_at";

pub struct ParticipantStore<'a> {
    conn: &'a Connection,
}

fn participant_from_row(row: &Row<'_>) -> rusqlite::Result<Participant> {
    Ok(Participant {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        room_id: parse_uuid(&row.get::<_, String>(1)?)?,
        nickname: row.get(2)?,
        voted_dates: parse_date_set(&row.get::<_, String>(3)?)?,
        location_lat: row.get(4)?,
        location_lng: row.get(5)?,
        location_name: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?)?,
    })
}

impl<'a> ParticipantStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Insert a participant
    ///
    /// A nickname already taken in the room yields `Error::Conflict`.
    #[instrument(skip(self, participant), fields(room_id = %participant.room_id, nickname = %participant.nickname))]
    pub fn create(&self, participant: &Participant) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO participants (id, room_id, nickname, voted_dates, location_lat, location_lng, location_name, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                participant.id.to_string(),
                participant.room_id.to_string(),
                participant.nickname,
                encode_date_set(&participant.voted_dates)?,
                participant.location_lat,
                participant.location_lng,
                participant.location_name,
                participant.created_at.to_rfc3339(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(Error::Conflict(format!(
                "nickname '{}' already in room {}",
                participant.nickname, participant.room_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Participant>> {
        let sql = format!("SELECT {} FROM participants WHERE id = ?1", PARTICIPANT_COLUMNS);
        let participant = self
            .conn
            .query_row(&sql, params![id.to_string()], participant_from_row)
            .optional()?;
        Ok(participant)
    }

    #[instrument(skip(self))]
    pub fn find_by_nickname(&self, room_id: Uuid, nickname: &str) -> Result<Option<Participant>> {
        let sql = format!(
            "SELECT {} FROM participants WHERE room_id = ?1 AND nickname = ?2",
            PARTICIPANT_COLUMNS
        );
        let participant = self
            .conn
            .query_row(&sql, params![room_id.to_string(), nickname], participant_from_row)
            .optional()?;
        Ok(participant)
    }

    /// All participants of a room in join order
    #[instrument(skip(self))]
    pub fn list_for_room(&self, room_id: Uuid) -> Result<Vec<Participant>> {
        let sql = format!(
            "SELECT {} FROM participants WHERE room_id = ?1 ORDER BY created_at, rowid",
            PARTICIPANT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let participants = stmt
            .query_map(params![room_id.to_string()], participant_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(participants)
    }

    /// Replace the whole vote set
    #[instrument(skip(self, votes), fields(votes = votes.len()))]
    pub fn update_votes(&self, id: Uuid, votes: &BTreeSet<NaiveDate>) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE participants SET voted_dates = ?1 WHERE id = ?2",
            params![encode_date_set(votes)?, id.to_string()],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("participant {}", id)));
        }
        Ok(())
    }

    /// Write all three location columns at once
    #[instrument(skip(self, update))]
    pub fn update_location(&self, id: Uuid, update: &LocationUpdate) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE participants SET location_lat = ?1, location_lng = ?2, location_name = ?3 WHERE id = ?4",
            params![update.lat, update.lng, update.name, id.to_string()],
        )?;
        if updated == 0 {
            return Err(Error::NotFound(format!("participant {}", id)));
        }
        Ok(())
    }
}
