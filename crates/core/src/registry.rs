//! Participant registry - joins a nickname to a room
//!
//! Joining with a nickname that already exists in the room adopts the
//! existing participant instead of failing.

use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::Participant;
use crate::storage::{LocalStateRepository, RoomLocalState, Storage};

/// Result of a join attempt
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    pub participant: Participant,
    /// True when an existing participant with the nickname was adopted
    pub rejoined: bool,
}

pub struct ParticipantRegistry<'a, S: ?Sized, L: ?Sized> {
    store: &'a S,
    local: &'a L,
}

impl<'a, S, L> ParticipantRegistry<'a, S, L>
where
    S: Storage + ?Sized,
    L: LocalStateRepository + ?Sized,
{
    pub fn new(store: &'a S, local: &'a L) -> Self {
        Self { store, local }
    }

    /// Join or rejoin a room under a nickname
    #[instrument(skip(self))]
    pub fn join(&self, room_id: Uuid, nickname: &str) -> Result<JoinOutcome> {
        let nickname = nickname.trim();
        if nickname.is_empty() {
            return Err(Error::Validation("nickname must not be empty".into()));
        }

        if self.store.find_room(room_id)?.is_none() {
            return Err(Error::NotFound(format!("room {}", room_id)));
        }

        let candidate = Participant::new(room_id, nickname.to_string());
        let outcome = match self.store.create_participant(&candidate) {
            Ok(()) => {
                info!(%room_id, nickname, "Participant joined");
                JoinOutcome {
                    participant: candidate,
                    rejoined: false,
                }
            }
            Err(e) if e.is_conflict() => {
                let existing = self
                    .store
                    .find_participant_by_nickname(room_id, nickname)?
                    .ok_or_else(|| {
                        Error::NotFound(format!("participant '{}' in room {}", nickname, room_id))
                    })?;
                info!(%room_id, nickname, participant_id = %existing.id, "Participant rejoined");
                JoinOutcome {
                    participant: existing,
                    rejoined: true,
                }
            }
            Err(e) => return Err(e),
        };

        self.local.save_nickname(room_id, nickname)?;
        Ok(outcome)
    }

    /// Participant remembered for this client, if it still exists
    pub fn current(&self, room_id: Uuid) -> Result<Option<Participant>> {
        match self.local.nickname(room_id)? {
            Some(nickname) => self.store.find_participant_by_nickname(room_id, &nickname),
            None => Ok(None),
        }
    }
}
