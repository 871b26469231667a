//! Device position source
//!
//! A terminal has no positioning hardware, so the "device" position comes
//! from `MOYEORA_DEVICE_LOCATION` or the `[device]` config section.

use moyeora_core::Coordinates;

use crate::config::DeviceConfig;
use crate::error::{AppError, Result};

pub const DEVICE_LOCATION_ENV: &str = "MOYEORA_DEVICE_LOCATION";

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceLocator {
    position: Option<Coordinates>,
}

impl DeviceLocator {
    /// Environment override first, then config
    pub fn from_env(config: &DeviceConfig) -> Result<Self> {
        Self::resolve(config, std::env::var(DEVICE_LOCATION_ENV).ok())
    }

    fn resolve(config: &DeviceConfig, env_value: Option<String>) -> Result<Self> {
        let position = match env_value {
            Some(value) if !value.trim().is_empty() => Some(parse_position(&value)?),
            _ => match (config.latitude, config.longitude) {
                (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
                _ => None,
            },
        };
        Ok(Self { position })
    }

    pub fn current_position(&self) -> Result<Coordinates> {
        self.position
            .filter(Coordinates::is_finite)
            .ok_or_else(|| AppError::Location("위치를 가져올 수 없습니다.".into()))
    }
}

/// Parse `lat,lng`
pub fn parse_position(value: &str) -> Result<Coordinates> {
    let invalid = || AppError::Usage(format!("Invalid position '{}': expected lat,lng", value));

    let (lat, lng) = value.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lng: f64 = lng.trim().parse().map_err(|_| invalid())?;
    Ok(Coordinates::new(lat, lng))
}
