//! Treasurer roulette
//!
//! The winner is drawn uniformly before the animation starts; the
//! animation is a deterministic sequence of highlights that ends on it.

use std::time::Duration;

use rand::Rng;

use crate::error::{Error, Result};
use crate::models::Room;

/// Highlights shown before the winner's offset is added
pub const BASE_SPINS: usize = 20;

/// Minimum participants needed to spin
pub const MIN_PARTICIPANTS: usize = 2;

/// Per-step delay schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpinTiming {
    pub base_delay: Duration,
    /// Added once per step so the highlight decelerates
    pub slowdown: Duration,
}

impl Default for SpinTiming {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(60),
            slowdown: Duration::from_millis(12),
        }
    }
}

impl SpinTiming {
    pub fn delay_for(&self, step: usize) -> Duration {
        self.base_delay + self.slowdown * step as u32
    }
}

/// One highlight of the animation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpinStep {
    /// 1-based step number
    pub step: usize,
    pub index: usize,
    pub nickname: String,
    /// Pause before showing the next step
    pub delay: Duration,
}

/// A spin in progress with its winner already fixed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spin {
    nicknames: Vec<String>,
    winner_index: usize,
}

impl Spin {
    pub fn winner_index(&self) -> usize {
        self.winner_index
    }

    pub fn winner(&self) -> &str {
        &self.nicknames[self.winner_index]
    }

    pub fn total_steps(&self) -> usize {
        BASE_SPINS + self.winner_index
    }

    /// Highlight sequence; the final step always lands on the winner
    pub fn steps(&self, timing: SpinTiming) -> Vec<SpinStep> {
        let n = self.nicknames.len();
        let total = self.total_steps();
        let start = (self.winner_index + n - total % n) % n;

        (1..=total)
            .map(|step| {
                let index = (start + step) % n;
                SpinStep {
                    step,
                    index,
                    nickname: self.nicknames[index].clone(),
                    delay: timing.delay_for(step),
                }
            })
            .collect()
    }
}

/// Roulette state for one room view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Roulette {
    Idle,
    Running(Spin),
    Settled { winner: String },
}

impl Roulette {
    /// Initial state derived from the stored room
    pub fn for_room(room: &Room) -> Self {
        match &room.treasurer {
            Some(winner) => Roulette::Settled {
                winner: winner.clone(),
            },
            None => Roulette::Idle,
        }
    }

    pub fn can_start(&self, participant_count: usize) -> bool {
        matches!(self, Roulette::Idle) && participant_count >= MIN_PARTICIPANTS
    }

    /// Draw a winner and begin spinning
    pub fn start<R: Rng + ?Sized>(&mut self, nicknames: Vec<String>, rng: &mut R) -> Result<Spin> {
        match self {
            Roulette::Idle => {}
            Roulette::Running(_) => {
                return Err(Error::InvalidOperation("roulette is already spinning".into()))
            }
            Roulette::Settled { winner } => {
                return Err(Error::InvalidOperation(format!(
                    "treasurer already decided: {}",
                    winner
                )))
            }
        }
        if nicknames.len() < MIN_PARTICIPANTS {
            return Err(Error::InvalidOperation(format!(
                "roulette needs at least {} participants",
                MIN_PARTICIPANTS
            )));
        }

        let winner_index = rng.gen_range(0..nicknames.len());
        let spin = Spin {
            nicknames,
            winner_index,
        };
        *self = Roulette::Running(spin.clone());
        Ok(spin)
    }

    /// Finish the animation and return the winner
    pub fn settle(&mut self) -> Result<String> {
        let winner = match self {
            Roulette::Running(spin) => spin.winner().to_string(),
            _ => return Err(Error::InvalidOperation("roulette is not spinning".into())),
        };
        *self = Roulette::Settled {
            winner: winner.clone(),
        };
        Ok(winner)
    }

    /// Adopt a treasurer observed from storage
    pub fn observe(&mut self, treasurer: Option<&str>) {
        if let Some(winner) = treasurer {
            if !matches!(self, Roulette::Running(_)) {
                *self = Roulette::Settled {
                    winner: winner.to_string(),
                };
            }
        }
    }

    pub fn winner(&self) -> Option<&str> {
        match self {
            Roulette::Settled { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Roulette::Running(_))
    }
}
