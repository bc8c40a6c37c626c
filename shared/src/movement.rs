//! Tank movement equations shared by the server's authoritative tick and the
//! client's local prediction, so the two stay deterministic given identical input
//! and starting state (see the simulation tick's numeric semantics).

use crate::constants::{TANK_SPEED, TANK_TURN_SPEED};
use crate::entities::{Aabb, Player, INPUT_DOWN, INPUT_LEFT, INPUT_RIGHT, INPUT_UP};
use crate::transform::normalize_rotation;

/// Applies one tick's hull rotation and translation from `player.input_bits`,
/// reverting the translation (but not the rotation) if the resulting AABB would
/// leave `bounds`.
pub fn apply_hull_movement(player: &mut Player, dt: f32, bounds: &Aabb) {
    let mut rotation = 0.0;
    if player.input_bits & INPUT_LEFT != 0 {
        rotation -= 1.0;
    }
    if player.input_bits & INPUT_RIGHT != 0 {
        rotation += 1.0;
    }
    if rotation != 0.0 {
        player.transform.rotate(rotation * TANK_TURN_SPEED * dt);
    }

    let mut direction = 0.0;
    if player.input_bits & INPUT_UP != 0 {
        direction += 1.0;
    }
    if player.input_bits & INPUT_DOWN != 0 {
        direction -= 1.0;
    }
    if direction != 0.0 {
        let before = player.transform.position;
        player.transform.advance(direction * TANK_SPEED * dt);
        if !player.aabb().within(bounds) {
            player.transform.position = before;
        }
    }
}

/// Copies `player.turret_target` (the absolute turret angle carried by the most
/// recent `InputCommand`) into `player.turret_rotation`. The turret has no
/// turn-speed budget: it snaps to the commanded angle every tick, the way the
/// hull's rotation and translation do not.
pub fn apply_turret_rotation(player: &mut Player) {
    player.turret_rotation = normalize_rotation(player.turret_target);
}
