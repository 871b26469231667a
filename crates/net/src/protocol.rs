//! Change feed message types
//!
//! All messages are JSON-serialized and length-prefixed on the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which record set changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeSource {
    /// The room row itself
    Room,
    /// Any participant row of the room
    Participants,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Insert,
    Update,
}

/// Notification that something in a room changed
///
/// Carries no payload; receivers refetch the whole room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomChange {
    pub room_id: Uuid,
    pub source: ChangeSource,
    pub kind: ChangeKind,
    pub at: DateTime<Utc>,
}

impl RoomChange {
    pub fn new(room_id: Uuid, source: ChangeSource, kind: ChangeKind) -> Self {
        Self {
            room_id,
            source,
            kind,
            at: Utc::now(),
        }
    }
}

/// Feed protocol messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Message {
    /// Client wants notifications for a room
    Subscribe { room_id: Uuid },

    /// Server confirms a subscription
    Subscribed { room_id: Uuid },

    Unsubscribe { room_id: Uuid },

    /// Client reports a write it made
    Publish(RoomChange),

    /// Server forwards a write made by someone else
    Changed(RoomChange),

    Ping,

    Pong,

    /// Server is going away
    ServerShutdown,
}

impl Message {
    /// Serialize message to JSON bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize message from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
