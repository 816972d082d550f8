//! Game simulation modules

pub mod arena;
pub mod combat;
pub mod physics;
pub mod player;
pub mod snapshot;
pub mod world;

pub use arena::{ArenaHandle, GameArena};
pub use physics::ArenaRules;
pub use player::{Player, PlayerId};

use crate::ws::protocol::ClientMsg;

/// Command delivered from a connection to the arena task
#[derive(Debug, Clone)]
pub struct ArenaInput {
    pub player_id: PlayerId,
    pub command: ArenaCommand,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArenaCommand {
    /// Connection accepted, spawn its player
    Join,
    /// Parsed client message
    Client(ClientMsg),
    /// Connection closed, remove its player
    Leave,
}
