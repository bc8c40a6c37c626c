//! # Client Input Sampling
//!
//! Samples keyboard and mouse state once per tick and packages it into the shape
//! the network layer sends as an `InputCommand`: hull movement bits, a target
//! turret rotation, and whether fire is held.
//!
//! ## Input Flow
//!
//! 1. **Sampling**: WASD/arrow keys for hull movement, mouse position for turret
//!    aim, left mouse button for fire.
//! 2. **Change Detection**: Only retransmit when the sampled state changed.
//! 3. **Keep-Alive**: Resend the last state periodically even if unchanged, so
//!    the connection doesn't look idle to the server's timeout checker.
//!
//! ## Debug Controls
//!
//! - **1/2/3**: Toggle client-side prediction / reconciliation / interpolation.
//! - **R**: Force client reconnection.

use macroquad::prelude::*;
use shared::entities::{INPUT_DOWN, INPUT_LEFT, INPUT_RIGHT, INPUT_UP};
use std::time::Duration;
use std::time::Instant;

/// One tick's worth of sampled local input, ready to be wrapped in an
/// `InputCommand` packet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledInput {
    pub bits: u8,
    pub turret_rot: f32,
    pub fire: bool,
}

/// Samples keyboard/mouse state into hull movement bits, a turret aim angle, and a
/// fire flag, resending periodically as a keep-alive even when input is unchanged.
pub struct InputManager {
    current_input: SampledInput,
    last_sent: Instant,

    prev_key_1: bool,
    prev_key_2: bool,
    prev_key_3: bool,
    prev_key_r: bool,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            current_input: SampledInput {
                bits: 0,
                turret_rot: 0.0,
                fire: false,
            },
            last_sent: Instant::now(),
            prev_key_1: false,
            prev_key_2: false,
            prev_key_3: false,
            prev_key_r: false,
        }
    }

    /// Samples this frame's input and returns `(toggles, input_to_send)`, where
    /// `toggles` is `(prediction, reconciliation, interpolation, reconnect)` edge
    /// triggers and `input_to_send` is `Some` only when the state changed or the
    /// keep-alive interval elapsed.
    pub fn update(&mut self, local_position: (f32, f32)) -> ((bool, bool, bool, bool), Option<SampledInput>) {
        let mut bits = 0u8;
        if is_key_down(KeyCode::W) || is_key_down(KeyCode::Up) {
            bits |= INPUT_UP;
        }
        if is_key_down(KeyCode::S) || is_key_down(KeyCode::Down) {
            bits |= INPUT_DOWN;
        }
        if is_key_down(KeyCode::A) || is_key_down(KeyCode::Left) {
            bits |= INPUT_LEFT;
        }
        if is_key_down(KeyCode::D) || is_key_down(KeyCode::Right) {
            bits |= INPUT_RIGHT;
        }

        let (mouse_x, mouse_y) = mouse_position();
        let turret_rot = (mouse_x - local_position.0).atan2(-(mouse_y - local_position.1));
        let fire = is_mouse_button_down(MouseButton::Left);

        let key_1 = is_key_down(KeyCode::Key1);
        let key_2 = is_key_down(KeyCode::Key2);
        let key_3 = is_key_down(KeyCode::Key3);
        let key_r = is_key_down(KeyCode::R);

        let mut toggles = (false, false, false, false);
        if key_1 && !self.prev_key_1 {
            toggles.0 = true;
        }
        if key_2 && !self.prev_key_2 {
            toggles.1 = true;
        }
        if key_3 && !self.prev_key_3 {
            toggles.2 = true;
        }
        if key_r && !self.prev_key_r {
            toggles.3 = true;
        }
        self.prev_key_1 = key_1;
        self.prev_key_2 = key_2;
        self.prev_key_3 = key_3;
        self.prev_key_r = key_r;

        let sampled = SampledInput {
            bits,
            turret_rot,
            fire,
        };
        let changed = sampled != self.current_input;
        let time_to_send = self.last_sent.elapsed() >= Duration::from_millis(16);

        let mut input_to_send = None;
        if changed || time_to_send {
            self.current_input = sampled;
            input_to_send = Some(sampled);
            self.last_sent = Instant::now();
        }

        (toggles, input_to_send)
    }

    /// The most recently sampled input, regardless of whether it was due to be
    /// (re)sent this call. Used to drive local prediction every tick even on
    /// ticks where nothing changed enough to retransmit.
    pub fn current(&self) -> SampledInput {
        self.current_input
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}
