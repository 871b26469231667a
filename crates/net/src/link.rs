//! Room share links
//!
//! Link format: `{base_url}/room/{room_id}`. The room id alone also works
//! as a join code.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::error::{Error, Result};

const ROOM_SEGMENT: &str = "/room/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomLink {
    pub base_url: String,
    pub room_id: Uuid,
}

impl RoomLink {
    pub fn new(base_url: &str, room_id: Uuid) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            room_id,
        }
    }

    pub fn to_url(&self) -> String {
        format!("{}{}{}", self.base_url, ROOM_SEGMENT, self.room_id)
    }

    /// Parse a full link
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let at = s
            .rfind(ROOM_SEGMENT)
            .ok_or_else(|| Error::Protocol(format!("Invalid room link: '{}'", s)))?;

        let room_id = parse_code(&s[at + ROOM_SEGMENT.len()..])?;
        Ok(Self::new(&s[..at], room_id))
    }

    /// Room id from either a full link or a bare code
    pub fn room_id_from(input: &str) -> Result<Uuid> {
        let input = input.trim();
        if input.contains(ROOM_SEGMENT) {
            Self::parse(input).map(|link| link.room_id)
        } else {
            parse_code(input)
        }
    }
}

/// Parse the id segment, ignoring a trailing slash, query or fragment
fn parse_code(segment: &str) -> Result<Uuid> {
    let code = segment
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');
    Uuid::from_str(code).map_err(|_| Error::Protocol(format!("Invalid room code: '{}'", code)))
}

impl fmt::Display for RoomLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_url())
    }
}

impl FromStr for RoomLink {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
