//! Room session
//!
//! Holds one client's view of a room. Every successful write and every
//! change notification is followed by a full reload of the room and its
//! participants; tally and midpoint are recomputed from that snapshot.

use chrono::NaiveDate;
use rand::Rng;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::authority::Authority;
use crate::error::{Error, Result};
use crate::invariants::assert_snapshot_invariants;
use crate::midpoint::{located_count, participant_midpoint};
use crate::models::{Coordinates, LocationUpdate, Participant, Room};
use crate::registry::{JoinOutcome, ParticipantRegistry};
use crate::roulette::{Roulette, Spin};
use crate::storage::{LocalStateRepository, RoomLocalState, Storage};
use crate::tally::VoteTally;

/// Outcome of persisting a roulette winner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreasurerCommit {
    Committed { winner: String },
    /// Another client recorded a treasurer first; theirs stands
    AlreadyDecided { treasurer: String },
}

impl TreasurerCommit {
    pub fn treasurer(&self) -> &str {
        match self {
            TreasurerCommit::Committed { winner } => winner,
            TreasurerCommit::AlreadyDecided { treasurer } => treasurer,
        }
    }
}

pub struct RoomSession<'a, S: ?Sized, L: ?Sized> {
    store: &'a S,
    local: &'a L,
    room: Room,
    participants: Vec<Participant>,
    current_nickname: Option<String>,
    authority: Authority,
    roulette: Roulette,
}

impl<'a, S, L> RoomSession<'a, S, L>
where
    S: Storage + ?Sized,
    L: LocalStateRepository + ?Sized,
{
    /// Fetch the room and its participants and restore local identity
    #[instrument(skip(store, local))]
    pub fn load(store: &'a S, local: &'a L, room_id: Uuid) -> Result<Self> {
        let room = store
            .find_room(room_id)?
            .ok_or_else(|| Error::NotFound(format!("room {}", room_id)))?;
        let participants = store.list_participants(room_id)?;
        assert_snapshot_invariants(&room, &participants);

        let authority = Authority::resolve(local.host_token(room_id)?.as_deref(), &room);
        let current_nickname = local.nickname(room_id)?;
        let roulette = Roulette::for_room(&room);

        Ok(Self {
            store,
            local,
            room,
            participants,
            current_nickname,
            authority,
            roulette,
        })
    }

    /// Refetch the whole aggregate
    #[instrument(skip(self), fields(room_id = %self.room.id))]
    pub fn reload(&mut self) -> Result<()> {
        let room_id = self.room.id;
        let room = self
            .store
            .find_room(room_id)?
            .ok_or_else(|| Error::NotFound(format!("room {}", room_id)))?;
        let participants = self.store.list_participants(room_id)?;
        assert_snapshot_invariants(&room, &participants);

        self.authority = Authority::resolve(self.local.host_token(room_id)?.as_deref(), &room);
        self.current_nickname = self.local.nickname(room_id)?;
        self.roulette.observe(room.treasurer.as_deref());
        self.room = room;
        self.participants = participants;
        Ok(())
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    pub fn roulette(&self) -> &Roulette {
        &self.roulette
    }

    /// This client's participant, if it joined and still exists
    pub fn current_participant(&self) -> Option<&Participant> {
        let nickname = self.current_nickname.as_deref()?;
        self.participants.iter().find(|p| p.nickname == nickname)
    }

    pub fn tally(&self) -> VoteTally {
        VoteTally::compute(&self.room, &self.participants)
    }

    pub fn midpoint(&self) -> Option<Coordinates> {
        participant_midpoint(&self.participants)
    }

    pub fn located_count(&self) -> usize {
        located_count(&self.participants)
    }

    pub fn join(&mut self, nickname: &str) -> Result<JoinOutcome> {
        let outcome = ParticipantRegistry::new(self.store, self.local).join(self.room.id, nickname)?;
        self.reload()?;
        Ok(outcome)
    }

    fn require_participant(&self) -> Result<&Participant> {
        self.current_participant()
            .ok_or_else(|| Error::InvalidOperation("join the room first".into()))
    }

    /// Flip this client's vote for one candidate date
    #[instrument(skip(self), fields(room_id = %self.room.id))]
    pub fn toggle_vote(&mut self, date: NaiveDate) -> Result<()> {
        if !self.room.is_candidate(date) {
            return Err(Error::Validation(format!("{} is not a candidate date", date)));
        }
        let participant = self.require_participant()?;
        let votes = participant.toggled_votes(date);
        self.store.update_votes(participant.id, &votes)?;
        self.reload()
    }

    #[instrument(skip(self, update), fields(room_id = %self.room.id))]
    pub fn set_location(&mut self, update: &LocationUpdate) -> Result<()> {
        let participant = self.require_participant()?;
        self.store.update_location(participant.id, update)?;
        self.reload()
    }

    pub fn clear_location(&mut self) -> Result<()> {
        self.set_location(&crate::location::cleared())
    }

    /// Rename the roulette; blank input keeps the current title
    ///
    /// Returns whether a write happened.
    #[instrument(skip(self), fields(room_id = %self.room.id))]
    pub fn set_roulette_title(&mut self, title: &str) -> Result<bool> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(false);
        }
        self.store.update_roulette_title(self.room.id, title)?;
        self.reload()?;
        Ok(true)
    }

    /// Draw the treasurer among current participants in join order
    pub fn start_roulette<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Spin> {
        let nicknames = self.participants.iter().map(|p| p.nickname.clone()).collect();
        self.roulette.start(nicknames, rng)
    }

    /// Settle the running spin and persist its winner
    ///
    /// A persistence error is returned, but the roulette stays settled on
    /// the drawn winner.
    #[instrument(skip(self), fields(room_id = %self.room.id))]
    pub fn finish_roulette(&mut self) -> Result<TreasurerCommit> {
        let winner = self.roulette.settle()?;
        self.commit_treasurer(&winner)
    }

    /// Conditionally record the treasurer
    pub fn commit_treasurer(&mut self, winner: &str) -> Result<TreasurerCommit> {
        let claimed = self.store.claim_treasurer(self.room.id, winner)?;
        self.reload()?;

        if claimed {
            return Ok(TreasurerCommit::Committed {
                winner: winner.to_string(),
            });
        }

        let treasurer = self.room.treasurer.clone().unwrap_or_default();
        warn!(
            room_id = %self.room.id,
            drawn = winner,
            existing = %treasurer,
            "Treasurer already decided by another client"
        );
        Ok(TreasurerCommit::AlreadyDecided { treasurer })
    }
}
