//! Authoritative server-side simulation: the tick loop described in full in the
//! simulation design, kept here as the single owner of all player and projectile
//! state.

use crate::client_manager::PendingInput;
use log::info;
use rand::Rng;
use shared::{
    apply_hull_movement, apply_turret_rotation, check_collision, Aabb, Player, Projectile,
    Transform, FIRE_DELAY, PROJECTILE_LIFETIME, WORLD_HEIGHT, WORLD_WIDTH,
};
use std::collections::HashMap;

/// Authoritative game state maintained by the server: every live player and
/// projectile, the current tick, and the static level geometry (empty until a
/// level loader exists) that movement is checked against in addition to the
/// screen bounds.
#[derive(Debug, Clone)]
pub struct GameState {
    pub tick: u32,
    pub players: HashMap<u32, Player>,
    pub projectiles: HashMap<u32, Projectile>,
    next_projectile_id: u32,
    obstacles: Vec<Aabb>,
}

/// A destroy notification raised by [`GameState::step`] for the caller to turn
/// into a reliable event and fan out.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    ProjectileSpawned(u32),
    ProjectileDestroyed(u32),
}

impl GameState {
    pub fn new() -> Self {
        Self {
            tick: 0,
            players: HashMap::new(),
            projectiles: HashMap::new(),
            next_projectile_id: 1,
            obstacles: Vec::new(),
        }
    }

    /// Constructs a game state with static level geometry. Movement that would
    /// make a player's body overlap one of `obstacles` is reverted the same way
    /// out-of-screen-bounds movement is, in addition to the screen-bounds check.
    /// No level file format is parsed anywhere in this crate; callers build the
    /// `Aabb` list themselves.
    pub fn with_obstacles(obstacles: Vec<Aabb>) -> Self {
        Self {
            obstacles,
            ..Self::new()
        }
    }

    fn level_bounds(&self) -> Aabb {
        Aabb {
            min: (0.0, 0.0),
            max: (WORLD_WIDTH, WORLD_HEIGHT),
        }
    }

    /// Adds a new player at a randomized spawn position, matching the original's
    /// `on_connect` randomized placement rather than a deterministic grid.
    pub fn add_player(&mut self, player_id: u32) {
        let mut rng = rand::thread_rng();
        let spawn_x = 20.0 + rng.gen_range(0..200) as f32;
        let spawn_y = 200.0 + rng.gen_range(0..100) as f32;

        let player = Player::new(player_id, Transform::new(spawn_x, spawn_y, 0.0));
        info!(
            "Added player {} at ({}, {})",
            player_id, player.transform.position.0, player.transform.position.1
        );
        self.players.insert(player_id, player);
    }

    pub fn remove_player(&mut self, player_id: u32) {
        self.players.remove(&player_id);
        info!("Removed player {}", player_id);
    }

    /// Applies one decoded `InputCommand`: latest-wins bits/turret target/fire
    /// request, held until the next tick's movement step consumes them.
    pub fn apply_input(&mut self, player_id: u32, input: &PendingInput) {
        if let Some(player) = self.players.get_mut(&player_id) {
            player.input_bits = input.bits;
            player.turret_target = input.turret_rot;
            player.fire_requested = input.fire;
        }
    }

    /// Advances the simulation by one fixed tick, per the ordered steps of the
    /// simulation design: apply input, revert out-of-bounds motion, integrate
    /// projectiles, fire-rate-gate new shots, resolve collisions, then apply all
    /// queued removals. Returns the spawn/destroy events raised this tick.
    pub fn step(&mut self, dt: f32) -> Vec<SimEvent> {
        let bounds = self.level_bounds();
        let mut events = Vec::new();

        for player in self.players.values_mut() {
            let before = player.transform.position;
            apply_hull_movement(player, dt, &bounds);
            if self.obstacles.iter().any(|o| player.aabb().overlaps(o)) {
                player.transform.position = before;
            }
            apply_turret_rotation(player);
        }

        let mut expired = Vec::new();
        for projectile in self.projectiles.values_mut() {
            if !projectile.step(dt) {
                expired.push(projectile.id);
            }
        }
        for id in expired {
            self.projectiles.remove(&id);
            events.push(SimEvent::ProjectileDestroyed(id));
        }

        let mut spawned = Vec::new();
        for player in self.players.values_mut() {
            player.fire_accumulator += dt;
            if player.fire_requested && player.fire_accumulator >= FIRE_DELAY {
                player.fire_accumulator = 0.0;
                let id = self.next_projectile_id;
                self.next_projectile_id += 1;
                spawned.push((id, Projectile::spawn(id, player)));
            }
        }
        for (id, projectile) in spawned {
            self.projectiles.insert(id, projectile);
            events.push(SimEvent::ProjectileSpawned(id));
        }

        let (hit_players, hit_projectiles) = self.find_collisions();
        for id in &hit_projectiles {
            self.projectiles.remove(id);
            events.push(SimEvent::ProjectileDestroyed(*id));
        }
        // Hit players are not removed from the simulation by a single shot; only
        // the projectile that struck them is consumed. `hit_players` is retained
        // for callers that want to react to the hit (e.g. damage/score), but this
        // crate's scope stops at collision detection and removal of the shell.
        let _ = hit_players;

        events
    }

    /// Every `(player, projectile)` pair whose AABBs overlap, exempting a
    /// projectile from colliding with the player who fired it.
    fn find_collisions(&self) -> (Vec<u32>, Vec<u32>) {
        let mut hit_players = Vec::new();
        let mut hit_projectiles = Vec::new();

        for player in self.players.values() {
            for projectile in self.projectiles.values() {
                if check_collision(player, projectile) {
                    hit_players.push(player.id);
                    hit_projectiles.push(projectile.id);
                }
            }
        }

        (hit_players, hit_projectiles)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::entities::{INPUT_LEFT, INPUT_UP};

    #[test]
    fn game_state_starts_empty() {
        let game_state = GameState::new();
        assert_eq!(game_state.tick, 0);
        assert!(game_state.players.is_empty());
        assert!(game_state.projectiles.is_empty());
    }

    #[test]
    fn add_player_inserts_a_live_player() {
        let mut game_state = GameState::new();
        game_state.add_player(1);

        assert_eq!(game_state.players.len(), 1);
        assert!(game_state.players.contains_key(&1));
    }

    #[test]
    fn input_rotates_hull_over_time() {
        let mut game_state = GameState::new();
        game_state.add_player(1);
        game_state.apply_input(
            1,
            &PendingInput {
                bits: INPUT_LEFT,
                turret_rot: 0.0,
                fire: false,
            },
        );

        let before = game_state.players[&1].transform.rotation;
        game_state.step(1.0 / 60.0);
        let after = game_state.players[&1].transform.rotation;
        assert_ne!(before, after);
    }

    #[test]
    fn input_moves_hull_forward() {
        let mut game_state = GameState::new();
        game_state.add_player(1);
        let start = game_state.players[&1].transform.position;
        game_state.apply_input(
            1,
            &PendingInput {
                bits: INPUT_UP,
                turret_rot: 0.0,
                fire: false,
            },
        );
        game_state.step(1.0 / 60.0);
        let moved = game_state.players[&1].transform.position;
        assert_ne!(start, moved);
    }

    #[test]
    fn out_of_bounds_motion_is_reverted() {
        let mut game_state = GameState::new();
        game_state.add_player(1);
        {
            let player = game_state.players.get_mut(&1).unwrap();
            player.transform = Transform::new(1.0, 1.0, std::f32::consts::PI);
        }
        game_state.apply_input(
            1,
            &PendingInput {
                bits: INPUT_UP,
                turret_rot: 0.0,
                fire: false,
            },
        );
        let before = game_state.players[&1].transform.position;
        game_state.step(1.0 / 60.0);
        let after = game_state.players[&1].transform.position;
        assert_eq!(before, after);
    }

    #[test]
    fn motion_into_static_obstacle_is_reverted() {
        let mut game_state = GameState::with_obstacles(vec![Aabb {
            min: (76.0, 175.0),
            max: (300.0, 400.0),
        }]);
        game_state.add_player(1);
        {
            let player = game_state.players.get_mut(&1).unwrap();
            // Facing +x; not yet touching the obstacle, which starts one unit
            // past this tank's edge.
            player.transform = Transform::new(0.0, 250.0, std::f32::consts::FRAC_PI_2);
        }
        game_state.apply_input(
            1,
            &PendingInput {
                bits: INPUT_UP,
                turret_rot: 0.0,
                fire: false,
            },
        );
        let before = game_state.players[&1].transform.position;
        game_state.step(1.0 / 60.0);
        let after = game_state.players[&1].transform.position;
        assert_eq!(before, after);
    }

    #[test]
    fn first_shot_is_not_gated_but_held_fire_then_is() {
        let mut game_state = GameState::new();
        game_state.add_player(1);
        game_state.apply_input(
            1,
            &PendingInput {
                bits: 0,
                turret_rot: 0.0,
                fire: true,
            },
        );

        // A freshly spawned player's accumulator starts pre-charged, so the
        // first held-fire tick shoots immediately rather than waiting out the
        // cooldown once before ever firing.
        game_state.step(1.0 / 60.0);
        assert_eq!(game_state.projectiles.len(), 1);

        game_state.step(0.5);
        assert_eq!(game_state.projectiles.len(), 1);

        game_state.step(FIRE_DELAY);
        assert_eq!(game_state.projectiles.len(), 2);
    }

    #[test]
    fn projectile_expires_after_its_lifetime() {
        let mut game_state = GameState::new();
        game_state.add_player(1);
        game_state
            .projectiles
            .insert(1, Projectile::spawn(1, &game_state.players[&1]));

        let mut alive = true;
        for _ in 0..((PROJECTILE_LIFETIME / (1.0 / 60.0)) as u32 + 10) {
            game_state.step(1.0 / 60.0);
            alive = game_state.projectiles.contains_key(&1);
            if !alive {
                break;
            }
        }
        assert!(!alive);
    }

    #[test]
    fn owner_projectile_never_hits_its_own_tank() {
        let mut game_state = GameState::new();
        game_state.add_player(1);
        let spawn_pos = game_state.players[&1].transform.position;
        let mut projectile = Projectile::spawn(1, &game_state.players[&1]);
        projectile.transform.position = spawn_pos;
        projectile.speed = 0.0;
        game_state.projectiles.insert(1, projectile);

        game_state.step(1.0 / 60.0);
        assert!(game_state.projectiles.contains_key(&1));
    }

    #[test]
    fn enemy_projectile_destroys_on_hit() {
        let mut game_state = GameState::new();
        game_state.add_player(1);
        game_state.add_player(2);
        let target_pos = game_state.players[&2].transform.position;

        let mut projectile = Projectile::spawn(1, &game_state.players[&1]);
        projectile.owner = 1;
        projectile.transform.position = target_pos;
        projectile.speed = 0.0;
        game_state.projectiles.insert(1, projectile);

        let events = game_state.step(1.0 / 60.0);
        assert!(!game_state.projectiles.contains_key(&1));
        assert!(events.contains(&SimEvent::ProjectileDestroyed(1)));
    }
}
