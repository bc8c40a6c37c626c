//! Position and facing shared by players and projectiles.

use serde::{Deserialize, Serialize};

/// A 2D position plus a rotation, in radians, normalized to `[0, 2*PI)`.
///
/// Rotation zero points up-screen: the forward vector at rotation zero is
/// `(0.0, -1.0)`. This mirrors the original tank battle's `Transform`, which is
/// shared between the hull's own transform and (via `turret_rotation`) the turret's.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: (f32, f32),
    pub rotation: f32,
}

impl Transform {
    pub fn new(x: f32, y: f32, rotation: f32) -> Self {
        Self {
            position: (x, y),
            rotation: normalize_rotation(rotation),
        }
    }

    /// Unit vector this transform currently faces: `(sin(rotation), -cos(rotation))`.
    pub fn forward(&self) -> (f32, f32) {
        (self.rotation.sin(), -self.rotation.cos())
    }

    /// Rotates by `delta` radians, keeping rotation normalized to `[0, 2*PI)`.
    pub fn rotate(&mut self, delta: f32) {
        self.rotation = normalize_rotation(self.rotation + delta);
    }

    /// Translates along the current forward vector by `distance` world units.
    pub fn advance(&mut self, distance: f32) {
        let (fx, fy) = self.forward();
        self.position.0 += fx * distance;
        self.position.1 += fy * distance;
    }
}

/// Wraps `rotation` into `[0, 2*PI)`.
pub fn normalize_rotation(rotation: f32) -> f32 {
    let two_pi = std::f32::consts::PI * 2.0;
    let r = rotation % two_pi;
    if r < 0.0 {
        r + two_pi
    } else {
        r
    }
}
