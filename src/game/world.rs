//! World state store - the arena's player map

use std::collections::HashMap;

use super::player::{Player, PlayerId};

/// Player map with stable join-order iteration.
/// Owned by the arena task; nothing else mutates it.
#[derive(Debug, Default)]
pub struct WorldStore {
    players: HashMap<PlayerId, Player>,
    order: Vec<PlayerId>,
}

impl WorldStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a player. New ids go to the end of iteration order.
    pub fn upsert(&mut self, id: PlayerId, player: Player) {
        if self.players.insert(id, player).is_none() {
            self.order.push(id);
        }
    }

    pub fn remove(&mut self, id: &PlayerId) -> Option<Player> {
        let player = self.players.remove(id)?;
        self.order.retain(|other| other != id);
        Some(player)
    }

    pub fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn get_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Ids in iteration order
    pub fn ids(&self) -> &[PlayerId] {
        &self.order
    }

    /// Visit every player mutably, in iteration order
    pub fn for_each<F>(&mut self, mut f: F)
    where
        F: FnMut(&PlayerId, &mut Player),
    {
        for id in &self.order {
            if let Some(player) = self.players.get_mut(id) {
                f(id, player);
            }
        }
    }

    /// Parallel id and player sequences with matching indices
    pub fn snapshot_keys_and_values(&self) -> (Vec<PlayerId>, Vec<Player>) {
        let players = self
            .order
            .iter()
            .filter_map(|id| self.players.get(id).cloned())
            .collect();
        (self.order.clone(), players)
    }
}
