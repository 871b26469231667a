//! Participant model and location values

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// One identified member of a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: Uuid,
    pub room_id: Uuid,
    /// Unique within the room, not globally
    pub nickname: String,
    pub voted_dates: BTreeSet<NaiveDate>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    /// Display label, kept even when geocoding found no coordinates
    pub location_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Participant {
    /// Fresh participant with no votes and no location
    pub fn new(room_id: Uuid, nickname: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            nickname,
            voted_dates: BTreeSet::new(),
            location_lat: None,
            location_lng: None,
            location_name: None,
            created_at: Utc::now(),
        }
    }

    /// Coordinates eligible for the midpoint: both present and finite
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.location_lat, self.location_lng) {
            (Some(lat), Some(lng)) => {
                let coords = Coordinates::new(lat, lng);
                coords.is_finite().then_some(coords)
            }
            _ => None,
        }
    }

    /// True when either coordinates or a location label are registered
    pub fn has_location(&self) -> bool {
        self.coordinates().is_some() || self.location_name.is_some()
    }

    pub fn has_voted_for(&self, date: NaiveDate) -> bool {
        self.voted_dates.contains(&date)
    }

    /// Vote set after flipping one date
    pub fn toggled_votes(&self, date: NaiveDate) -> BTreeSet<NaiveDate> {
        let mut votes = self.voted_dates.clone();
        if !votes.remove(&date) {
            votes.insert(date);
        }
        votes
    }

    pub fn apply_location(&mut self, update: &LocationUpdate) {
        self.location_lat = update.lat;
        self.location_lng = update.lng;
        self.location_name = update.name.clone();
    }
}

/// The three location columns written together
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocationUpdate {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub name: Option<String>,
}

impl LocationUpdate {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_toggle_votes() {
        let mut p = Participant::new(Uuid::new_v4(), "alice".into());
        p.voted_dates = p.toggled_votes(date("2025-06-06"));
        assert!(p.has_voted_for(date("2025-06-06")));

        p.voted_dates = p.toggled_votes(date("2025-06-06"));
        assert!(p.voted_dates.is_empty());
    }

    #[test]
    fn test_coordinates_require_both_values() {
        let mut p = Participant::new(Uuid::new_v4(), "bob".into());
        p.location_lat = Some(37.5);
        assert!(p.coordinates().is_none());

        p.location_lng = Some(127.0);
        assert_eq!(p.coordinates(), Some(Coordinates::new(37.5, 127.0)));

        p.location_lng = Some(f64::NAN);
        assert!(p.coordinates().is_none());
    }

    #[test]
    fn test_name_only_location() {
        let mut p = Participant::new(Uuid::new_v4(), "carol".into());
        assert!(!p.has_location());

        p.apply_location(&LocationUpdate {
            lat: None,
            lng: None,
            name: Some("어딘가".into()),
        });
        assert!(p.has_location());
        assert!(p.coordinates().is_none());
    }
}
