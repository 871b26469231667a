//! Data models for Moyeora

mod date;
mod participant;
mod room;

pub use date::*;
pub use participant::*;
pub use room::*;
