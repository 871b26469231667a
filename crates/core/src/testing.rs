//! Shared fixtures for unit tests

use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{parse_date, Participant, Room, DEFAULT_ROULETTE_TITLE};

pub fn date(s: &str) -> NaiveDate {
    parse_date(s).unwrap()
}

pub fn room_with_dates(dates: &[&str]) -> Room {
    let now = Utc::now();
    Room {
        id: Uuid::new_v4(),
        name: "test room".to_string(),
        candidate_dates: dates.iter().map(|d| date(d)).collect(),
        confirmed_date: None,
        confirmed_location: None,
        treasurer: None,
        roulette_title: DEFAULT_ROULETTE_TITLE.to_string(),
        host_token: "host-token".to_string(),
        created_at: now,
        updated_at: now,
    }
}

pub fn participant_with_votes(room: &Room, nickname: &str, votes: &[&str]) -> Participant {
    let mut p = Participant::new(room.id, nickname.to_string());
    p.voted_dates = votes.iter().map(|d| date(d)).collect::<BTreeSet<_>>();
    p
}

pub fn participant_at(room: &Room, nickname: &str, lat: Option<f64>, lng: Option<f64>) -> Participant {
    let mut p = Participant::new(room.id, nickname.to_string());
    p.location_lat = lat;
    p.location_lng = lng;
    p
}
