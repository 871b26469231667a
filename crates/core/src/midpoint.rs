//! Geographic midpoint of participant locations
//!
//! Planar arithmetic mean of latitudes and longitudes, with no
//! great-circle correction.

use crate::models::{Coordinates, Participant};

/// Mean latitude and mean longitude, or `None` for an empty list
pub fn calculate_midpoint(coords: &[Coordinates]) -> Option<Coordinates> {
    if coords.is_empty() {
        return None;
    }

    let (lat_sum, lng_sum) = coords
        .iter()
        .fold((0.0, 0.0), |(lat, lng), c| (lat + c.lat, lng + c.lng));
    let n = coords.len() as f64;

    Some(Coordinates::new(lat_sum / n, lng_sum / n))
}

/// Coordinates of participants eligible for the midpoint
///
/// Name-only locations (failed geocoding) are skipped.
pub fn eligible_coordinates(participants: &[Participant]) -> Vec<Coordinates> {
    participants.iter().filter_map(Participant::coordinates).collect()
}

/// Midpoint over a room's participants
pub fn participant_midpoint(participants: &[Participant]) -> Option<Coordinates> {
    calculate_midpoint(&eligible_coordinates(participants))
}

/// How many participants contribute coordinates
pub fn located_count(participants: &[Participant]) -> usize {
    participants
        .iter()
        .filter(|p| p.coordinates().is_some())
        .count()
}

/// Kakao map link pinning the midpoint
pub fn map_link(midpoint: Coordinates) -> String {
    format!(
        "https://map.kakao.com/link/map/중간지점,{},{}",
        midpoint.lat, midpoint.lng
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{participant_at, room_with_dates};

    fn round2(v: f64) -> f64 {
        (v * 100.0).round() / 100.0
    }

    #[test]
    fn test_empty_is_none() {
        assert!(calculate_midpoint(&[]).is_none());
    }

    #[test]
    fn test_two_point_example() {
        let mid = calculate_midpoint(&[
            Coordinates::new(37.50, 127.03),
            Coordinates::new(37.56, 126.97),
        ])
        .unwrap();

        assert_eq!(round2(mid.lat), 37.53);
        assert_eq!(round2(mid.lng), 127.00);
    }

    #[test]
    fn test_plain_mean_not_geodesic() {
        let coords = [
            Coordinates::new(10.0, 20.0),
            Coordinates::new(20.0, 40.0),
            Coordinates::new(60.0, 0.0),
        ];
        let mid = calculate_midpoint(&coords).unwrap();
        assert!((mid.lat - 30.0).abs() < 1e-12);
        assert!((mid.lng - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_name_only_participants_excluded() {
        let room = room_with_dates(&["2025-06-06"]);
        let mut unresolved = participant_at(&room, "C", None, None);
        unresolved.location_name = Some("모르는 곳".into());

        let participants = vec![
            participant_at(&room, "A", Some(37.50), Some(127.03)),
            participant_at(&room, "B", Some(37.56), Some(126.97)),
            unresolved,
            participant_at(&room, "D", Some(37.0), None),
        ];

        assert_eq!(eligible_coordinates(&participants).len(), 2);
        assert_eq!(located_count(&participants), 2);

        let mid = participant_midpoint(&participants).unwrap();
        assert_eq!(round2(mid.lat), 37.53);
    }

    #[test]
    fn test_map_link() {
        let link = map_link(Coordinates::new(37.5, 127.0));
        assert_eq!(link, "https://map.kakao.com/link/map/중간지점,37.5,127");
    }
}
