//! Room authority via a possession token
//!
//! Whoever holds the room's host token is its host. The token is compared
//! in the clear and never expires or rotates.

use rand::distributions::Alphanumeric;
use rand::Rng;
use uuid::Uuid;

use crate::models::Room;

/// Length of generated host tokens
pub const HOST_TOKEN_LEN: usize = 24;

/// Generate a fresh host token for a new room
pub fn generate_host_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(HOST_TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Client-local key holding the host token for a room
pub fn host_key(room_id: Uuid) -> String {
    format!("moyeora_host_{}", room_id)
}

/// Client-local key holding the remembered nickname for a room
pub fn nickname_key(room_id: Uuid) -> String {
    format!("moyeora_nickname_{}", room_id)
}

/// What a client may do in a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// Holds the room's current host token
    Host,
    Guest,
}

impl Authority {
    /// Resolve authority from the locally stored token
    pub fn resolve(stored_token: Option<&str>, room: &Room) -> Self {
        match stored_token {
            Some(token) if token == room.host_token => Authority::Host,
            _ => Authority::Guest,
        }
    }

    pub fn is_host(self) -> bool {
        self == Authority::Host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::room_with_dates;

    #[test]
    fn test_generated_tokens_are_distinct() {
        let a = generate_host_token();
        let b = generate_host_token();
        assert_eq!(a.len(), HOST_TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_scheme() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(host_key(id), "moyeora_host_550e8400-e29b-41d4-a716-446655440000");
        assert_eq!(
            nickname_key(id),
            "moyeora_nickname_550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn test_resolve_authority() {
        let room = room_with_dates(&["2025-06-06"]);

        assert_eq!(Authority::resolve(Some("host-token"), &room), Authority::Host);
        assert_eq!(Authority::resolve(Some("other"), &room), Authority::Guest);
        assert_eq!(Authority::resolve(None, &room), Authority::Guest);
        assert!(Authority::resolve(Some("host-token"), &room).is_host());
    }
}
