//! Player entity and the Rock-Paper-Scissors state machine

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ws::protocol::Controls;

use super::physics::ArenaRules;

/// Stable per-connection player identifier
pub type PlayerId = Uuid;

/// Death timer value meaning "not counting down"
pub const NO_DEATH_TIMER: f32 = -1.0;

/// Avatar state, sent on the wire as its integer code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum RpsState {
    Rock = 0,
    Paper = 1,
    Scissors = 2,
    Dead = 3,
}

/// Winner/loser pairs. Dead never appears here.
const DOMINANCE: [(RpsState, RpsState); 3] = [
    (RpsState::Rock, RpsState::Scissors),
    (RpsState::Paper, RpsState::Rock),
    (RpsState::Scissors, RpsState::Paper),
];

/// Rotation cycle, in `Next` order
const ALIVE_CYCLE: [RpsState; 3] = [RpsState::Rock, RpsState::Paper, RpsState::Scissors];

impl RpsState {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_dead(self) -> bool {
        self == RpsState::Dead
    }

    /// True if `self` wins a collision against `other`
    pub fn beats(self, other: RpsState) -> bool {
        DOMINANCE
            .iter()
            .any(|&(winner, loser)| winner == self && loser == other)
    }

    /// Shift one step around Rock -> Paper -> Scissors. Dead stays Dead.
    pub fn rotated(self, direction: RotateDirection) -> RpsState {
        let Some(idx) = ALIVE_CYCLE.iter().position(|&s| s == self) else {
            return self;
        };
        let len = ALIVE_CYCLE.len();
        let next = match direction {
            RotateDirection::Next => (idx + 1) % len,
            RotateDirection::Previous => (idx + len - 1) % len,
        };
        ALIVE_CYCLE[next]
    }

    /// Uniformly random non-Dead state
    pub fn random_alive<R: Rng + ?Sized>(rng: &mut R) -> RpsState {
        ALIVE_CYCLE[rng.gen_range(0..ALIVE_CYCLE.len())]
    }
}

impl From<RpsState> for u8 {
    fn from(state: RpsState) -> Self {
        state.code()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid player state code: {0}")]
pub struct InvalidStateCode(pub u8);

impl TryFrom<u8> for RpsState {
    type Error = InvalidStateCode;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(RpsState::Rock),
            1 => Ok(RpsState::Paper),
            2 => Ok(RpsState::Scissors),
            3 => Ok(RpsState::Dead),
            other => Err(InvalidStateCode(other)),
        }
    }
}

/// Direction of a state rotation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotateDirection {
    Previous,
    Next,
}

/// Authoritative player record. Serializes as the wire `PlayerRecord`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub v_x: f32,
    pub v_y: f32,
    /// Heading in degrees, derived from velocity every tick
    pub angle: f32,
    pub state: RpsState,
    /// Seconds until respawn while Dead, `NO_DEATH_TIMER` otherwise
    pub death_timer: f32,
    /// Last received input; `None` until the first `clientUpdate`
    pub controls: Option<Controls>,
}

impl Player {
    /// Player at rest at a fixed position
    pub fn new(x: f32, y: f32, state: RpsState) -> Self {
        Self {
            x,
            y,
            v_x: 0.0,
            v_y: 0.0,
            angle: 0.0,
            state,
            death_timer: NO_DEATH_TIMER,
            controls: None,
        }
    }

    /// Fresh player at a random position with a random alive state
    pub fn spawn<R: Rng + ?Sized>(rng: &mut R, rules: &ArenaRules) -> Self {
        let x = rng.gen_range(0.0..rules.width);
        let y = rng.gen_range(0.0..rules.height);
        Self::new(x, y, RpsState::random_alive(rng))
    }

    pub fn is_counting_down(&self) -> bool {
        self.death_timer > 0.0
    }

    /// Put the player into the death countdown
    pub fn kill(&mut self, timeout: f32) {
        self.state = RpsState::Dead;
        self.death_timer = timeout;
    }
}
