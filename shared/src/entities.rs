//! Core simulated entities: tanks and the projectiles they fire.

use crate::constants::{FIRE_DELAY, PROJECTILE_HALF_EXTENT, PROJECTILE_LIFETIME, TANK_HALF_EXTENT};
use crate::transform::Transform;
use serde::{Deserialize, Serialize};

/// Hull-movement input bit for forward translation (along the tank's forward vector).
pub const INPUT_UP: u8 = 1 << 0;
/// Hull-movement input bit for backward translation.
pub const INPUT_DOWN: u8 = 1 << 1;
/// Hull-rotation input bit, turning the hull counter-clockwise.
pub const INPUT_LEFT: u8 = 1 << 2;
/// Hull-rotation input bit, turning the hull clockwise.
pub const INPUT_RIGHT: u8 = 1 << 3;

/// An axis-aligned bounding box, used for collision against both other entities and
/// the level's static obstacle list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: (f32, f32),
    pub max: (f32, f32),
}

impl Aabb {
    pub fn from_center(center: (f32, f32), half_extent: f32) -> Self {
        Self {
            min: (center.0 - half_extent, center.1 - half_extent),
            max: (center.0 + half_extent, center.1 + half_extent),
        }
    }

    /// Separating-axis overlap test. Boxes that only touch along an edge do not
    /// overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        !(self.max.0 <= other.min.0
            || other.max.0 <= self.min.0
            || self.max.1 <= other.min.1
            || other.max.1 <= self.min.1)
    }

    pub fn within(&self, bounds: &Aabb) -> bool {
        self.min.0 >= bounds.min.0
            && self.min.1 >= bounds.min.1
            && self.max.0 <= bounds.max.0
            && self.max.1 <= bounds.max.1
    }
}

/// A tank: hull transform, independently-rotating turret, accumulated input state,
/// and the fire-rate accumulator that gates shooting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    /// Server-assigned identifier, monotonically increasing, never reused for the
    /// lifetime of a server process.
    pub id: u32,
    pub transform: Transform,
    /// Turret rotation, radians, independent of hull `transform.rotation`.
    pub turret_rotation: f32,
    /// Most recently received hull-movement input bits (see `INPUT_*` constants).
    #[serde(skip)]
    pub input_bits: u8,
    /// Absolute turret rotation carried by the most recent `InputCommand`, copied
    /// into `turret_rotation` unthrottled on the next tick.
    #[serde(skip)]
    pub turret_target: f32,
    /// Whether the fire button was held in the most recent `InputCommand`.
    #[serde(skip)]
    pub fire_requested: bool,
    /// Seconds accumulated toward the next permitted shot; reset to zero on fire.
    /// Starts at `FIRE_DELAY` so a freshly spawned player can fire immediately
    /// rather than waiting out the cooldown once before its first shot.
    #[serde(skip)]
    pub fire_accumulator: f32,
}

impl Player {
    pub fn new(id: u32, transform: Transform) -> Self {
        Self {
            id,
            transform,
            turret_rotation: transform.rotation,
            input_bits: 0,
            turret_target: transform.rotation,
            fire_requested: false,
            fire_accumulator: FIRE_DELAY,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.transform.position, TANK_HALF_EXTENT)
    }

    /// Unit vector the turret currently points along, independent of the hull's
    /// own facing: `(sin(turret_rotation), -cos(turret_rotation))`.
    pub fn turret_forward(&self) -> (f32, f32) {
        (self.turret_rotation.sin(), -self.turret_rotation.cos())
    }

    /// The world position a projectile fired right now would spawn at: the tank's
    /// position offset along the turret's forward vector by half the body extent
    /// plus half the projectile extent, so shots don't spawn embedded in their own
    /// tank and leave from where the turret is actually aiming.
    pub fn muzzle_position(&self) -> (f32, f32) {
        let (fx, fy) = self.turret_forward();
        let offset = TANK_HALF_EXTENT + PROJECTILE_HALF_EXTENT;
        (
            self.transform.position.0 + fx * offset,
            self.transform.position.1 + fy * offset,
        )
    }
}

/// A projectile fired by a player. Travels in a straight line along the direction it
/// was fired; does not home or curve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Projectile {
    /// Own monotonic id space, distinct from player ids.
    pub id: u32,
    /// The firing player's id; exempted from collision against this projectile.
    pub owner: u32,
    pub transform: Transform,
    /// Unit vector fixed at spawn time; does not change as the projectile travels.
    pub direction: (f32, f32),
    pub speed: f32,
    pub lifetime_remaining: f32,
}

impl Projectile {
    /// Spawns a projectile owned by `shooter`, at its muzzle position, traveling
    /// along the turret's current forward vector (not the hull's).
    pub fn spawn(id: u32, shooter: &Player) -> Self {
        let direction = shooter.turret_forward();
        Self {
            id,
            owner: shooter.id,
            transform: Transform::new(
                shooter.muzzle_position().0,
                shooter.muzzle_position().1,
                shooter.turret_rotation,
            ),
            direction,
            speed: crate::constants::PROJECTILE_SPEED,
            lifetime_remaining: PROJECTILE_LIFETIME,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.transform.position, PROJECTILE_HALF_EXTENT)
    }

    /// Advances position by `direction * speed * dt` and decrements lifetime.
    /// Returns `true` while the projectile is still alive.
    pub fn step(&mut self, dt: f32) -> bool {
        self.transform.position.0 += self.direction.0 * self.speed * dt;
        self.transform.position.1 += self.direction.1 * self.speed * dt;
        self.lifetime_remaining -= dt;
        self.lifetime_remaining > 0.0
    }
}

/// Whether `player` and `projectile` collide, exempting a projectile from colliding
/// with the player who fired it.
pub fn check_collision(player: &Player, projectile: &Projectile) -> bool {
    if projectile.owner == player.id {
        return false;
    }
    player.aabb().overlaps(&projectile.aabb())
}
