//! Application error type
//!
//! Every error is scoped to the command that raised it.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] moyeora_core::Error),

    #[error("Feed error: {0}")]
    Net(#[from] moyeora_net::Error),

    #[error("Geocoding failed: {0}")]
    Geocoding(#[from] reqwest::Error),

    /// Device position unavailable or denied
    #[error("{0}")]
    Location(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("{0}")]
    Usage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn is_room_not_found(&self) -> bool {
        matches!(self, AppError::Core(e) if e.is_not_found())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
