//! Moyeora Core Library
//!
//! Rooms, participants, date voting, midpoint and treasurer roulette,
//! plus the SQLite stores behind them.

pub mod authority;
pub mod error;
pub mod invariants;
pub mod location;
pub mod midpoint;
pub mod models;
pub mod registry;
pub mod roulette;
pub mod session;
pub mod storage;
pub mod tally;

#[cfg(test)]
mod testing;

pub use authority::{generate_host_token, host_key, nickname_key, Authority};
pub use error::{Error, Result};
pub use location::{LocationWarning, CURRENT_LOCATION_LABEL};
pub use midpoint::{calculate_midpoint, map_link};
pub use models::*;
pub use registry::{JoinOutcome, ParticipantRegistry};
pub use roulette::{Roulette, Spin, SpinStep, SpinTiming};
pub use session::{RoomSession, TreasurerCommit};
pub use storage::{
    Database, LocalStateRepository, LocalStore, ParticipantRepository, RoomLocalState,
    RoomRepository, Storage,
};
pub use tally::{count_votes, DateTally, VoteTally};
