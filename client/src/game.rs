//! Client-side simulation state: local prediction of the controlled tank,
//! reconciliation against authoritative corrections, and interpolation of every
//! other entity the server reports.

use log::debug;
use shared::entities::Aabb;
use shared::transform::normalize_rotation;
use shared::{
    apply_hull_movement, apply_turret_rotation, Player, Projectile, Transform, TICK_DT,
    INTERPOLATION_DELAY_MS, RECONCILIATION_EPSILON, WORLD_HEIGHT, WORLD_WIDTH,
};
use std::collections::{HashMap, VecDeque};

/// One tick's retained local input and the position/rotation it produced, kept
/// until the server acknowledges that tick by echoing it back in a `PlayerState`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputSnapshot {
    pub tick: u32,
    pub bits: u8,
    pub turret_rot: f32,
    pub position_after_apply: (f32, f32),
    pub rotation_after_apply: f32,
}

/// A single authoritative pose of a remote entity, timestamped by the server's
/// clock, used as an interpolation endpoint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionSnapshot {
    pub server_time: i64,
    pub position: (f32, f32),
    pub rotation: f32,
    pub turret_rotation: f32,
}

/// A non-local player entity. Holds the last two authoritative snapshots and an
/// accumulator the interpolator advances each tick to blend between them.
#[derive(Debug, Clone)]
pub struct RemoteEntity {
    pub snapshots: VecDeque<PositionSnapshot>,
    pub accumulator: f32,
    pub display_position: (f32, f32),
    pub display_rotation: f32,
    pub display_turret_rotation: f32,
}

impl RemoteEntity {
    fn new(snapshot: PositionSnapshot) -> Self {
        let mut snapshots = VecDeque::with_capacity(2);
        snapshots.push_back(snapshot);
        Self {
            snapshots,
            accumulator: 0.0,
            display_position: snapshot.position,
            display_rotation: snapshot.rotation,
            display_turret_rotation: snapshot.turret_rotation,
        }
    }

    fn push_snapshot(&mut self, snapshot: PositionSnapshot) {
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > 2 {
            self.snapshots.pop_front();
        }
        self.accumulator = 0.0;
    }

    /// Advances the interpolation accumulator and recomputes the displayed pose
    /// as a linear blend between the two most recent snapshots.
    fn interpolate(&mut self, dt: f32) {
        self.accumulator += dt;

        if self.snapshots.len() < 2 {
            if let Some(only) = self.snapshots.back() {
                self.display_position = only.position;
                self.display_rotation = only.rotation;
                self.display_turret_rotation = only.turret_rotation;
            }
            return;
        }

        let window = INTERPOLATION_DELAY_MS as f32 / 1000.0;
        let t = (self.accumulator / window).clamp(0.0, 1.0);
        let p0 = self.snapshots[0];
        let p1 = self.snapshots[1];

        self.display_position = (
            lerp(p0.position.0, p1.position.0, t),
            lerp(p0.position.1, p1.position.1, t),
        );
        self.display_rotation = lerp(p0.rotation, p1.rotation, t);
        self.display_turret_rotation = lerp(p0.turret_rotation, p1.turret_rotation, t);
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// All client-side simulation state: the locally predicted tank, retained input
/// history for reconciliation, every remote player's interpolation buffer, and
/// every remote projectile's locally-simulated flight.
pub struct ClientGameState {
    pub tick: u32,
    pub local_player: Player,
    pub input_snapshots: Vec<InputSnapshot>,
    pub last_known_server_tick: u32,
    pub misprediction_count: u32,
    pub remote_players: HashMap<u32, RemoteEntity>,
    pub remote_projectiles: HashMap<u32, Projectile>,
    pub last_server_time: i64,
    pub latency_ms: u64,
    bounds: Aabb,
}

/// Placeholder id for the locally predicted player. The wire protocol never
/// addresses the local player by id (`PlayerState` is implicitly "about me"), so
/// this value is never serialized; it only satisfies `Player`'s constructor.
const LOCAL_PLAYER_ID: u32 = 0;

impl ClientGameState {
    pub fn new(spawn_position: (f32, f32)) -> Self {
        Self {
            tick: 0,
            local_player: Player::new(
                LOCAL_PLAYER_ID,
                Transform::new(spawn_position.0, spawn_position.1, 0.0),
            ),
            input_snapshots: Vec::new(),
            last_known_server_tick: 0,
            misprediction_count: 0,
            remote_players: HashMap::new(),
            remote_projectiles: HashMap::new(),
            last_server_time: 0,
            latency_ms: 0,
            bounds: Aabb {
                min: (0.0, 0.0),
                max: (WORLD_WIDTH, WORLD_HEIGHT),
            },
        }
    }

    /// Applies this tick's sampled input to the local player, producing a
    /// predicted position/rotation immediately, and retains an `InputSnapshot`
    /// for later reconciliation.
    pub fn predict_tick(&mut self, bits: u8, turret_rot: f32, fire_requested: bool, dt: f32) {
        self.local_player.input_bits = bits;
        self.local_player.turret_target = turret_rot;
        self.local_player.fire_requested = fire_requested;

        apply_hull_movement(&mut self.local_player, dt, &self.bounds);
        apply_turret_rotation(&mut self.local_player);

        self.tick = self.tick.wrapping_add(1);
        self.input_snapshots.push(InputSnapshot {
            tick: self.tick,
            bits,
            turret_rot,
            position_after_apply: self.local_player.transform.position,
            rotation_after_apply: self.local_player.transform.rotation,
        });
    }

    /// Advances every remote entity's interpolator by `dt` and steps locally
    /// simulated projectiles, dropping any whose lifetime has expired.
    pub fn tick_remote_entities(&mut self, dt: f32) {
        for entity in self.remote_players.values_mut() {
            entity.interpolate(dt);
        }
        self.remote_projectiles.retain(|_, p| p.step(dt));
    }

    /// Records the server's clock and tick, and refreshes a moving estimate of
    /// round-trip latency from `now_ms - server_time`.
    pub fn on_server_tick(&mut self, server_time: i64, server_tick: u32, now_ms: i64) {
        if server_tick > self.last_known_server_tick {
            self.last_known_server_tick = server_tick;
        }
        self.last_server_time = server_time;
        let sample = (now_ms - server_time).max(0) as u64;
        self.latency_ms = ((self.latency_ms as f32 * 0.8) + (sample as f32 * 0.2)) as u64;
    }

    /// Reconciles the local player against an authoritative `PlayerState` for
    /// `server_tick`. If the recorded predicted position at that tick diverges
    /// from the authoritative one by more than `RECONCILIATION_EPSILON` on either
    /// axis, resets to the authoritative pose and replays every retained input
    /// with `tick > server_tick` on top of it.
    pub fn reconcile(
        &mut self,
        server_tick: u32,
        position_auth: (f32, f32),
        rotation_auth: f32,
        turret_rotation_auth: f32,
    ) {
        let recorded = self
            .input_snapshots
            .iter()
            .find(|s| s.tick == server_tick)
            .copied();

        if let Some(recorded) = recorded {
            let dx = (position_auth.0 - recorded.position_after_apply.0).abs();
            let dy = (position_auth.1 - recorded.position_after_apply.1).abs();

            if dx > RECONCILIATION_EPSILON || dy > RECONCILIATION_EPSILON {
                debug!(
                    "misprediction at tick {}: predicted {:?}, authoritative {:?}",
                    server_tick, recorded.position_after_apply, position_auth
                );
                self.misprediction_count += 1;

                self.local_player.transform.position = position_auth;
                self.local_player.transform.rotation = normalize_rotation(rotation_auth);
                self.local_player.turret_rotation = turret_rotation_auth;

                let mut replay: Vec<InputSnapshot> = self
                    .input_snapshots
                    .iter()
                    .filter(|s| s.tick > server_tick)
                    .copied()
                    .collect();
                replay.sort_by_key(|s| s.tick);

                for input in &replay {
                    self.local_player.input_bits = input.bits;
                    self.local_player.turret_target = input.turret_rot;
                    apply_hull_movement(&mut self.local_player, TICK_DT, &self.bounds);
                    apply_turret_rotation(&mut self.local_player);
                }
            }
        }

        self.input_snapshots.retain(|s| s.tick > server_tick);
    }

    /// Appends a fresh authoritative snapshot to a remote player's interpolation
    /// buffer, creating the entity if `id` is unknown.
    pub fn on_entity_state(
        &mut self,
        id: u32,
        position: (f32, f32),
        rotation: f32,
        turret_rotation: f32,
    ) {
        let snapshot = PositionSnapshot {
            server_time: self.last_server_time,
            position,
            rotation,
            turret_rotation,
        };

        self.remote_players
            .entry(id)
            .and_modify(|entity| entity.push_snapshot(snapshot))
            .or_insert_with(|| RemoteEntity::new(snapshot));
    }

    /// Creates a remote player at `position` if `id` is unknown; idempotent
    /// against a duplicate spawn for an id that already exists.
    pub fn on_player_spawn(&mut self, id: u32, position: (f32, f32)) {
        self.remote_players.entry(id).or_insert_with(|| {
            RemoteEntity::new(PositionSnapshot {
                server_time: self.last_server_time,
                position,
                rotation: 0.0,
                turret_rotation: 0.0,
            })
        });
    }

    pub fn on_player_disconnected(&mut self, id: u32) {
        self.remote_players.remove(&id);
    }

    /// Creates a locally-simulated projectile from a reliable spawn notification.
    /// Idempotent against a duplicate spawn for an id already present.
    pub fn on_projectile_spawn(&mut self, id: u32, owner: u32, position: (f32, f32), rotation: f32) {
        self.remote_projectiles.entry(id).or_insert_with(|| {
            let transform = Transform::new(position.0, position.1, rotation);
            let direction = transform.forward();
            Projectile {
                id,
                owner,
                transform,
                direction,
                speed: shared::PROJECTILE_SPEED,
                lifetime_remaining: shared::PROJECTILE_LIFETIME,
            }
        });
    }

    pub fn on_projectile_destroy(&mut self, id: u32) {
        self.remote_projectiles.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::entities::INPUT_UP;
    use shared::TANK_SPEED;

    #[test]
    fn prediction_with_zero_latency_matches_authoritative_state() {
        let mut state = ClientGameState::new((0.0, 0.0));
        for _ in 0..6 {
            state.predict_tick(INPUT_UP, 0.0, false, 1.0 / 60.0);
        }

        // Forward at rotation zero is -y; six ticks of full-speed forward motion.
        let expected_y = -TANK_SPEED * (1.0 / 60.0) * 6.0;
        let predicted = state.local_player.transform.position;
        assert!((predicted.1 - expected_y).abs() < 0.01);

        let recorded = state.input_snapshots.last().unwrap();
        state.reconcile(
            recorded.tick,
            recorded.position_after_apply,
            recorded.rotation_after_apply,
            0.0,
        );
        assert_eq!(state.misprediction_count, 0);
    }

    #[test]
    fn large_divergence_triggers_reconciliation_and_replay() {
        let mut state = ClientGameState::new((0.0, 0.0));
        for _ in 0..5 {
            state.predict_tick(INPUT_UP, 0.0, false, 1.0 / 60.0);
        }

        let predicted_at_tick_2 = state.input_snapshots[1];
        let authoritative_position = (
            predicted_at_tick_2.position_after_apply.0 - 50.0,
            predicted_at_tick_2.position_after_apply.1,
        );

        state.reconcile(predicted_at_tick_2.tick, authoritative_position, 0.0, 0.0);

        assert_eq!(state.misprediction_count, 1);
        assert!(state
            .input_snapshots
            .iter()
            .all(|s| s.tick > predicted_at_tick_2.tick));
    }

    #[test]
    fn snapshot_pruning_removes_acknowledged_ticks() {
        let mut state = ClientGameState::new((0.0, 0.0));
        for _ in 0..4 {
            state.predict_tick(0, 0.0, false, 1.0 / 60.0);
        }
        let ack_tick = state.input_snapshots[1].tick;

        state.reconcile(ack_tick, (0.0, 0.0), 0.0, 0.0);

        assert!(state.input_snapshots.iter().all(|s| s.tick > ack_tick));
    }

    #[test]
    fn entity_state_creates_unknown_remote_entity() {
        let mut state = ClientGameState::new((0.0, 0.0));
        state.on_entity_state(2, (10.0, 20.0), 0.0, 0.0);
        assert!(state.remote_players.contains_key(&2));
    }

    #[test]
    fn interpolation_stays_on_segment_between_two_snapshots() {
        let mut state = ClientGameState::new((0.0, 0.0));
        state.on_entity_state(2, (0.0, 0.0), 0.0, 0.0);
        state.on_entity_state(2, (100.0, 0.0), 0.0, 0.0);

        let window = INTERPOLATION_DELAY_MS as f32 / 1000.0;
        state.tick_remote_entities(window / 2.0);

        let entity = &state.remote_players[&2];
        assert!(entity.display_position.0 >= 0.0 && entity.display_position.0 <= 100.0);
    }

    #[test]
    fn player_spawn_is_idempotent_for_known_id() {
        let mut state = ClientGameState::new((0.0, 0.0));
        state.on_player_spawn(2, (5.0, 5.0));
        state.on_player_spawn(2, (999.0, 999.0));
        assert_eq!(state.remote_players[&2].display_position, (5.0, 5.0));
    }

    #[test]
    fn projectile_destroy_removes_locally_simulated_projectile() {
        let mut state = ClientGameState::new((0.0, 0.0));
        state.on_projectile_spawn(7, 1, (0.0, 0.0), 0.0);
        assert!(state.remote_projectiles.contains_key(&7));

        state.on_projectile_destroy(7);
        assert!(!state.remote_projectiles.contains_key(&7));
    }
}
