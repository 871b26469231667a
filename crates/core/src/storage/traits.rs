//! Storage repository traits
//!
//! The room session and registry work against these, so a different
//! backend can stand in for SQLite.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{LocationUpdate, NewRoom, Participant, Room};

/// Room repository operations
pub trait RoomRepository {
    /// Create a room; the store issues the host token
    fn create_room(&self, new_room: &NewRoom) -> Result<Room>;

    fn find_room(&self, id: Uuid) -> Result<Option<Room>>;

    fn update_roulette_title(&self, room_id: Uuid, title: &str) -> Result<()>;

    /// Conditional write: false if a treasurer was already set
    fn claim_treasurer(&self, room_id: Uuid, winner: &str) -> Result<bool>;
}

/// Participant repository operations
pub trait ParticipantRepository {
    /// Fails with `Error::Conflict` when the nickname is taken in the room
    fn create_participant(&self, participant: &Participant) -> Result<()>;

    fn find_participant_by_nickname(&self, room_id: Uuid, nickname: &str)
        -> Result<Option<Participant>>;

    /// Participants of a room in join order
    fn list_participants(&self, room_id: Uuid) -> Result<Vec<Participant>>;

    fn update_votes(&self, participant_id: Uuid, votes: &BTreeSet<NaiveDate>) -> Result<()>;

    fn update_location(&self, participant_id: Uuid, update: &LocationUpdate) -> Result<()>;
}

/// Client-local key/value operations
pub trait LocalStateRepository {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Combined shared-store trait
pub trait Storage: RoomRepository + ParticipantRepository {}

// Blanket implementation: any type implementing all traits implements Storage
impl<T> Storage for T where T: RoomRepository + ParticipantRepository {}
