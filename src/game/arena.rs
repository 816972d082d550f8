//! Arena state and the authoritative tick loop

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::util::time::{tick_interval, TickClock};
use crate::ws::protocol::{ClientMsg, Controls, ServerMsg};

use super::combat::{CombatOutcome, CombatSystem};
use super::physics::{ArenaRules, PhysicsSystem};
use super::player::{Player, PlayerId, RotateDirection};
use super::snapshot::SnapshotBuilder;
use super::world::WorldStore;
use super::{ArenaCommand, ArenaInput};

/// Capacity of the inbound command queue
const INPUT_QUEUE_CAPACITY: usize = 1024;
/// Snapshots buffered per subscriber before it starts lagging
const SNAPSHOT_BUFFER: usize = 64;

/// Arena state (owned by the arena task)
pub struct Arena {
    world: WorldStore,
    rules: ArenaRules,
    rng: ChaCha8Rng,
    tick: u64,
}

impl Arena {
    pub fn new(rules: ArenaRules, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        Self {
            world: WorldStore::new(),
            rules,
            rng,
            tick: 0,
        }
    }

    pub fn world(&self) -> &WorldStore {
        &self.world
    }

    #[cfg(test)]
    pub fn world_mut(&mut self) -> &mut WorldStore {
        &mut self.world
    }

    #[cfg(test)]
    pub fn rules(&self) -> &ArenaRules {
        &self.rules
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Spawn a player for a newly accepted connection
    pub fn join(&mut self, id: PlayerId) -> Option<&Player> {
        if self.world.contains(&id) {
            warn!(player_id = %id, "Player already in arena");
            return None;
        }

        let player = Player::spawn(&mut self.rng, &self.rules);
        self.world.upsert(id, player);

        info!(
            player_id = %id,
            player_count = self.world.len(),
            "Player joined arena"
        );
        self.world.get(&id)
    }

    /// Remove a disconnected player
    pub fn leave(&mut self, id: &PlayerId) -> bool {
        if self.world.remove(id).is_none() {
            return false;
        }

        info!(
            player_id = %id,
            player_count = self.world.len(),
            "Player left arena"
        );
        true
    }

    /// Replace a player's controls. Unknown ids are ignored.
    pub fn apply_controls(&mut self, id: &PlayerId, controls: Controls) {
        if let Some(player) = self.world.get_mut(id) {
            player.controls = Some(controls);
        }
    }

    /// Rotate a living player's state. Dead players and unknown ids are ignored.
    pub fn rotate_state(&mut self, id: &PlayerId, direction: RotateDirection) {
        if let Some(player) = self.world.get_mut(id) {
            if player.state.is_dead() {
                return;
            }
            player.state = player.state.rotated(direction);
        }
    }

    /// Route one client message into the world
    pub fn handle_client_msg(&mut self, id: &PlayerId, msg: ClientMsg) {
        match msg {
            ClientMsg::ClientUpdate(controls) => self.apply_controls(id, controls),
            ClientMsg::PreviousState => self.rotate_state(id, RotateDirection::Previous),
            ClientMsg::NextState => self.rotate_state(id, RotateDirection::Next),
        }
    }

    /// Run a single simulation tick
    pub fn step(&mut self, dt: f32) -> Vec<CombatOutcome> {
        self.tick += 1;

        let rules = self.rules;
        let rng = &mut self.rng;
        self.world.for_each(|id, player| {
            PhysicsSystem::integrate(player, dt, &rules);

            if CombatSystem::decay_death_timer(player, dt, &mut *rng) {
                debug!(player_id = %id, state = ?player.state, "Player respawned");
            }
        });

        CombatSystem::resolve_collisions(&mut self.world, &rules)
    }
}

/// Handle to the running arena
#[derive(Clone)]
pub struct ArenaHandle {
    pub input_tx: mpsc::Sender<ArenaInput>,
    pub snapshot_tx: broadcast::Sender<ServerMsg>,
    pub player_count: Arc<AtomicUsize>,
}

impl ArenaHandle {
    pub fn player_count(&self) -> usize {
        self.player_count.load(Ordering::Relaxed)
    }

    /// Receive every snapshot broadcast from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMsg> {
        self.snapshot_tx.subscribe()
    }

    /// Queue a command for the arena task. Fails only once the arena has stopped.
    pub async fn send(
        &self,
        player_id: PlayerId,
        command: ArenaCommand,
    ) -> Result<(), mpsc::error::SendError<ArenaInput>> {
        self.input_tx.send(ArenaInput { player_id, command }).await
    }
}

/// The authoritative arena task
pub struct GameArena {
    arena: Arena,
    input_rx: mpsc::Receiver<ArenaInput>,
    snapshot_tx: broadcast::Sender<ServerMsg>,
    snapshot_builder: SnapshotBuilder,
    player_count: Arc<AtomicUsize>,
}

impl GameArena {
    /// Create a new arena
    pub fn new(rules: ArenaRules, seed: Option<u64>) -> (Self, ArenaHandle) {
        let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE_CAPACITY);
        let (snapshot_tx, _) = broadcast::channel(SNAPSHOT_BUFFER);
        let player_count = Arc::new(AtomicUsize::new(0));

        let handle = ArenaHandle {
            input_tx,
            snapshot_tx: snapshot_tx.clone(),
            player_count: player_count.clone(),
        };

        let game_arena = Self {
            arena: Arena::new(rules, seed),
            input_rx,
            snapshot_tx,
            snapshot_builder: SnapshotBuilder::new(),
            player_count,
        };

        (game_arena, handle)
    }

    /// Run the authoritative tick loop until every handle is dropped
    pub async fn run(mut self) {
        info!("Arena started");

        let period = tick_interval();
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut clock = TickClock::new();

        loop {
            ticker.tick().await;
            let started = Instant::now();

            // Drain input queue
            if !self.process_inputs() {
                break;
            }

            let dt = clock.delta_secs();
            self.arena.step(dt);

            // Broadcast to all connected clients
            let snapshot = self.snapshot_builder.build(self.arena.world());
            let _ = self.snapshot_tx.send(snapshot);

            let elapsed = started.elapsed();
            if elapsed > period {
                warn!(
                    tick = self.arena.tick_count(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Tick overran its interval"
                );
            }
        }

        info!(
            ticks = self.arena.tick_count(),
            snapshots = self.snapshot_builder.built(),
            "Arena stopped"
        );
    }

    /// Apply every queued command. Returns false once all senders are gone.
    fn process_inputs(&mut self) -> bool {
        loop {
            match self.input_rx.try_recv() {
                Ok(input) => self.apply(input),
                Err(mpsc::error::TryRecvError::Empty) => return true,
                Err(mpsc::error::TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn apply(&mut self, input: ArenaInput) {
        match input.command {
            ArenaCommand::Join => {
                self.arena.join(input.player_id);
            }
            ArenaCommand::Client(msg) => {
                self.arena.handle_client_msg(&input.player_id, msg);
            }
            ArenaCommand::Leave => {
                if self.arena.leave(&input.player_id) && self.arena.world().is_empty() {
                    debug!("Arena is empty");
                }
            }
        }
        self.player_count
            .store(self.arena.world().len(), Ordering::Relaxed);
    }
}
