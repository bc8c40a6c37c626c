//! Client rendering: draws every tank (hull + independently rotated turret),
//! every locally-simulated projectile, and a small netcode status overlay.
//!
//! ## Rendering Architecture
//!
//! The renderer follows a configuration-driven approach where all rendering
//! decisions are made from the provided `RenderConfig`, keeping rendering
//! separate from game state management.
//!
//! ## Color Coding
//!
//! - **Green**: Local player, good connection status, enabled features.
//! - **Red**: Remote players, poor connection, disabled features.
//! - **Yellow**: Projectiles, warnings, moderate latency.

use crate::game::ClientGameState;
use macroquad::prelude::*;
use shared::{Player, TANK_HALF_EXTENT};

/// Configuration for rendering a single frame: netcode feature toggles and
/// connection/latency status, independent of the entities being drawn.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub connected: bool,
    pub prediction_enabled: bool,
    pub reconciliation_enabled: bool,
    pub interpolation_enabled: bool,
    pub ping_ms: u64,
    pub fake_ping_ms: u64,
    pub player_count: usize,
}

/// Converts rendering decisions into draw calls. Holds no state between frames.
pub struct Renderer {}

impl Renderer {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Renderer {})
    }

    /// Renders a complete frame: background, every tank (local then remote),
    /// every projectile, then the status overlay.
    pub fn render(&mut self, state: &ClientGameState, config: RenderConfig) {
        clear_background(Color::from_rgba(26, 26, 26, 255));

        self.draw_tank(&state.local_player, GREEN);

        for entity in state.remote_players.values() {
            self.draw_tank_at(
                entity.display_position,
                entity.display_rotation,
                entity.display_turret_rotation,
                Color::from_rgba(255, 68, 68, 255),
            );
        }

        for projectile in state.remote_projectiles.values() {
            self.draw_projectile(projectile.transform.position, projectile.transform.rotation);
        }

        self.draw_ui(config);
    }

    fn draw_tank(&mut self, player: &Player, color: Color) {
        self.draw_tank_at(
            player.transform.position,
            player.transform.rotation,
            player.turret_rotation,
            color,
        );
    }

    /// Draws a hull as a rotated square and a turret as a line from its center,
    /// since macroquad has no built-in rotated-rectangle-with-barrel primitive.
    fn draw_tank_at(&mut self, position: (f32, f32), rotation: f32, turret_rotation: f32, color: Color) {
        let half = TANK_HALF_EXTENT;
        let corners = [(-half, -half), (half, -half), (half, half), (-half, half)];
        let rotated: Vec<(f32, f32)> = corners
            .iter()
            .map(|&(x, y)| rotate_point(x, y, rotation))
            .map(|(x, y)| (position.0 + x, position.1 + y))
            .collect();

        for i in 0..4 {
            let (x0, y0) = rotated[i];
            let (x1, y1) = rotated[(i + 1) % 4];
            draw_line(x0, y0, x1, y1, 2.0, color);
        }

        let barrel_length = half * 1.4;
        let (dx, dy) = rotate_point(0.0, -barrel_length, turret_rotation);
        draw_line(
            position.0,
            position.1,
            position.0 + dx,
            position.1 + dy,
            3.0,
            WHITE,
        );
    }

    fn draw_projectile(&mut self, position: (f32, f32), rotation: f32) {
        let _ = rotation;
        draw_circle(position.0, position.1, 4.0, YELLOW);
    }

    /// Renders a small debug UI: netcode feature indicators, connection status,
    /// a ping bar graph, and the connected player count.
    fn draw_ui(&mut self, config: RenderConfig) {
        let y_start = 10.0;
        let indicator_size = 12.0;
        let spacing = 25.0;

        let features = [
            ("P", config.prediction_enabled),
            ("R", config.reconciliation_enabled),
            ("I", config.interpolation_enabled),
        ];

        for (i, (label, enabled)) in features.iter().enumerate() {
            let x = 10.0 + (i as f32) * spacing;
            let color = if *enabled { GREEN } else { RED };

            draw_rectangle(x, y_start, indicator_size, indicator_size, color);
            draw_rectangle_lines(x, y_start, indicator_size, indicator_size, 1.0, WHITE);
            draw_text(label, x + 3.0, y_start + indicator_size + 12.0, 12.0, WHITE);
        }

        let connection_color = if config.connected { GREEN } else { RED };
        draw_rectangle(10.0, y_start + 35.0, 8.0, 8.0, connection_color);
        let connection_text = if config.connected { "CON" } else { "DIS" };
        draw_text(connection_text, 20.0, y_start + 35.0 + 8.0, 12.0, WHITE);

        if !config.connected {
            draw_text("Press R to reconnect", 10.0, y_start + 55.0, 12.0, YELLOW);
        }

        let ping_y = if config.connected {
            y_start + 50.0
        } else {
            y_start + 70.0
        };
        let total_ping = if config.fake_ping_ms > 0 {
            config.fake_ping_ms
        } else {
            config.ping_ms
        };
        let ping_bars = ((total_ping / 20).min(10)) as i32;

        for i in 0..10i32 {
            let bar_color = if i < ping_bars {
                if total_ping < 50 {
                    GREEN
                } else if total_ping < 100 {
                    YELLOW
                } else {
                    RED
                }
            } else {
                Color::from_rgba(51, 51, 51, 255)
            };
            draw_rectangle(10.0 + (i as f32) * 3.0, ping_y, 2.0, 8.0, bar_color);
        }

        let ping_text = format!("{}ms", total_ping);
        draw_text(&ping_text, 45.0, ping_y + 8.0, 12.0, WHITE);

        let player_y = ping_y + 15.0;
        for i in 0..(config.player_count.min(8)) {
            draw_rectangle(
                10.0 + (i as f32) * 4.0,
                player_y,
                3.0,
                3.0,
                Color::from_rgba(0, 170, 255, 255),
            );
        }
        let player_text = format!("{} players", config.player_count);
        draw_text(&player_text, 45.0, player_y + 3.0, 12.0, WHITE);
    }
}

fn rotate_point(x: f32, y: f32, rotation: f32) -> (f32, f32) {
    let (sin, cos) = rotation.sin_cos();
    (x * cos - y * sin, x * sin + y * cos)
}
