//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use std::collections::HashSet;

use crate::models::{Participant, Room};

/// Validate that a room's state is internally consistent
pub fn assert_room_invariants(room: &Room) {
    debug_assert!(!room.name.trim().is_empty(), "Room {} has empty name", room.id);

    debug_assert!(
        !room.candidate_dates.is_empty(),
        "Room {} has no candidate dates",
        room.id
    );

    debug_assert!(
        !room.host_token.is_empty(),
        "Room {} has empty host token",
        room.id
    );
}

/// Validate a participant against its room
pub fn assert_participant_invariants(participant: &Participant, room: &Room) {
    debug_assert!(
        participant.room_id == room.id,
        "Participant {} belongs to room {} but was loaded for room {}",
        participant.id,
        participant.room_id,
        room.id
    );

    // Coordinates are written as a pair
    debug_assert!(
        participant.location_lat.is_some() == participant.location_lng.is_some(),
        "Participant {} has a half-written location",
        participant.id
    );

    debug_assert!(
        participant.voted_dates.is_subset(&room.candidate_dates),
        "Participant {} voted for a date outside room {}",
        participant.id,
        room.id
    );
}

/// Validate a loaded room snapshot
pub fn assert_snapshot_invariants(room: &Room, participants: &[Participant]) {
    assert_room_invariants(room);

    let mut seen = HashSet::new();
    for participant in participants {
        assert_participant_invariants(participant, room);
        debug_assert!(
            seen.insert(participant.nickname.as_str()),
            "Room {} has duplicate nickname {}",
            room.id,
            participant.nickname
        );
    }
}
