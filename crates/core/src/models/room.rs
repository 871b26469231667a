//! Room model - the shared scheduling session

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Label shown for the treasurer roulette until someone renames it
pub const DEFAULT_ROULETTE_TITLE: &str = "누가 쏴?";

/// A named scheduling session with candidate dates
///
/// The id doubles as the shareable join code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    /// Fixed at creation, iterated in ascending order
    pub candidate_dates: BTreeSet<NaiveDate>,
    /// Reserved: no operation populates it yet
    pub confirmed_date: Option<NaiveDate>,
    /// Reserved: no operation populates it yet
    pub confirmed_location: Option<String>,
    /// Nickname picked by the roulette; final once set
    pub treasurer: Option<String>,
    pub roulette_title: String,
    /// Possession of this value makes a client the room's host
    pub host_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Room {
    /// Roulette label, falling back to the default for blank titles
    pub fn display_roulette_title(&self) -> &str {
        let title = self.roulette_title.trim();
        if title.is_empty() {
            DEFAULT_ROULETTE_TITLE
        } else {
            title
        }
    }

    pub fn has_treasurer(&self) -> bool {
        self.treasurer.is_some()
    }

    pub fn is_candidate(&self, date: NaiveDate) -> bool {
        self.candidate_dates.contains(&date)
    }
}

/// Validated input for creating a room
///
/// The store assigns the id and the host token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRoom {
    pub name: String,
    pub candidate_dates: BTreeSet<NaiveDate>,
}

impl NewRoom {
    pub fn new<I>(name: &str, dates: I) -> Result<Self>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("Room name must not be empty".into()));
        }

        let candidate_dates: BTreeSet<NaiveDate> = dates.into_iter().collect();
        if candidate_dates.is_empty() {
            return Err(Error::Validation(
                "At least one candidate date is required".into(),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            candidate_dates,
        })
    }
}
