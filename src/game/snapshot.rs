//! Snapshot building

use crate::ws::protocol::ServerMsg;

use super::world::WorldStore;

/// Builds the per-tick world snapshot
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    /// Snapshots built since startup
    built: u64,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a `state` message from the current world
    pub fn build(&mut self, world: &WorldStore) -> ServerMsg {
        self.built += 1;
        let (player_ids, players) = world.snapshot_keys_and_values();
        ServerMsg::State {
            player_ids,
            players,
        }
    }

    pub fn built(&self) -> u64 {
        self.built
    }
}
