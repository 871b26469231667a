//! Location registration rules
//!
//! Both flows end in a single three-column write. Device and geocoding
//! lookups happen outside this module; only their outcomes come in.

use crate::models::{Coordinates, LocationUpdate};

/// Label stored for positions read from the device
pub const CURRENT_LOCATION_LABEL: &str = "현재 위치";

/// Non-fatal outcome the user should be told about
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationWarning {
    /// Geocoding found no match; the name is kept but the midpoint skips it
    Unresolved { input: String },
}

impl LocationWarning {
    pub fn message(&self) -> String {
        match self {
            LocationWarning::Unresolved { input } => format!(
                "'{}'의 정확한 좌표를 찾지 못했습니다. 중간지점 계산에서 제외될 수 있어요.",
                input
            ),
        }
    }
}

/// Device position with the placeholder label
pub fn gps(coords: Coordinates) -> LocationUpdate {
    LocationUpdate {
        lat: Some(coords.lat),
        lng: Some(coords.lng),
        name: Some(CURRENT_LOCATION_LABEL.to_string()),
    }
}

/// Free-text entry with whatever the geocoder resolved
///
/// Returns `None` for blank input.
pub fn manual(
    input: &str,
    resolved: Option<Coordinates>,
) -> Option<(LocationUpdate, Option<LocationWarning>)> {
    let name = input.trim();
    if name.is_empty() {
        return None;
    }

    let resolved = resolved.filter(Coordinates::is_finite);
    let warning = match resolved {
        Some(_) => None,
        None => Some(LocationWarning::Unresolved {
            input: name.to_string(),
        }),
    };

    let update = LocationUpdate {
        lat: resolved.map(|c| c.lat),
        lng: resolved.map(|c| c.lng),
        name: Some(name.to_string()),
    };

    Some((update, warning))
}

/// Reset all location columns
pub fn cleared() -> LocationUpdate {
    LocationUpdate::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gps_label() {
        let update = gps(Coordinates::new(37.5, 127.0));
        assert_eq!(update.name.as_deref(), Some(CURRENT_LOCATION_LABEL));
        assert_eq!(update.coordinates(), Some(Coordinates::new(37.5, 127.0)));
    }

    #[test]
    fn test_manual_resolved() {
        let (update, warning) = manual(" 강남역 ", Some(Coordinates::new(37.498, 127.027))).unwrap();
        assert!(warning.is_none());
        assert_eq!(update.name.as_deref(), Some("강남역"));
        assert_eq!(update.lat, Some(37.498));
    }

    #[test]
    fn test_manual_unresolved_keeps_name_without_coordinates() {
        let (update, warning) = manual("우리집", None).unwrap();
        assert_eq!(update.lat, None);
        assert_eq!(update.lng, None);
        assert_eq!(update.name.as_deref(), Some("우리집"));
        assert_eq!(
            warning,
            Some(LocationWarning::Unresolved {
                input: "우리집".into()
            })
        );
    }

    #[test]
    fn test_manual_blank_is_rejected() {
        assert!(manual("   ", None).is_none());
    }

    #[test]
    fn test_cleared() {
        assert_eq!(cleared(), LocationUpdate::default());
    }
}
