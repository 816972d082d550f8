//! Combat system - proximity Rock-Paper-Scissors and the death timer

use rand::Rng;
use tracing::debug;

use super::physics::{ArenaRules, PhysicsSystem};
use super::player::{Player, PlayerId, RpsState, NO_DEATH_TIMER};
use super::world::WorldStore;

/// Result of a decisive collision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CombatOutcome {
    pub winner: PlayerId,
    pub loser: PlayerId,
    pub winner_state: RpsState,
    pub loser_state: RpsState,
}

/// Combat system for collisions, deaths and respawns
pub struct CombatSystem;

impl CombatSystem {
    /// Count down a Dead player's timer. Returns true if the player respawned this tick.
    pub fn decay_death_timer<R: Rng + ?Sized>(player: &mut Player, dt: f32, rng: &mut R) -> bool {
        if !player.is_counting_down() {
            return false;
        }

        player.death_timer -= dt;
        if player.death_timer > 0.0 {
            return false;
        }

        player.state = RpsState::random_alive(rng);
        player.death_timer = NO_DEATH_TIMER;
        true
    }

    /// Colliders overlap
    pub fn colliding(a: &Player, b: &Player, rules: &ArenaRules) -> bool {
        let reach = rules.collider_radius * 2.0;
        PhysicsSystem::distance_sq(a, b) < reach * reach
    }

    /// Which side of a pair loses, if either. `None` for ties and Dead pairings.
    pub fn loser(a: RpsState, b: RpsState) -> Option<Side> {
        if a.beats(b) {
            Some(Side::Second)
        } else if b.beats(a) {
            Some(Side::First)
        } else {
            None
        }
    }

    /// Check every unordered pair once, in iteration order, killing losers as they occur
    pub fn resolve_collisions(world: &mut WorldStore, rules: &ArenaRules) -> Vec<CombatOutcome> {
        let ids = world.ids().to_vec();
        let mut outcomes = Vec::new();

        for (i, a_id) in ids.iter().enumerate() {
            for b_id in &ids[i + 1..] {
                let (Some(a), Some(b)) = (world.get(a_id), world.get(b_id)) else {
                    continue;
                };

                if !Self::colliding(a, b, rules) {
                    continue;
                }

                let outcome = match Self::loser(a.state, b.state) {
                    Some(Side::First) => CombatOutcome {
                        winner: *b_id,
                        loser: *a_id,
                        winner_state: b.state,
                        loser_state: a.state,
                    },
                    Some(Side::Second) => CombatOutcome {
                        winner: *a_id,
                        loser: *b_id,
                        winner_state: a.state,
                        loser_state: b.state,
                    },
                    None => continue,
                };

                if let Some(loser) = world.get_mut(&outcome.loser) {
                    loser.kill(rules.death_timeout);
                }

                debug!(
                    winner = %outcome.winner,
                    loser = %outcome.loser,
                    winner_state = ?outcome.winner_state,
                    loser_state = ?outcome.loser_state,
                    "Collision resolved"
                );
                outcomes.push(outcome);
            }
        }

        outcomes
    }
}

/// Position within a checked pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    First,
    Second,
}
