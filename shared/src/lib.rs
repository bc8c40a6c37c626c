//! # Shared Tank Battle Library
//!
//! This module contains all shared data structures, constants, and utilities used by both
//! the game client and server. It serves as the foundation for networked multiplayer
//! communication and ensures consistency across the distributed game architecture.
//!
//! ## Core Components
//!
//! ### Game Constants
//! Tank speed, turn speed, projectile speed/lifetime, fire delay, and world bounds,
//! in [`constants`].
//!
//! ### Transform
//! [`Transform`] carries position and rotation and derives the forward vector that
//! both movement and muzzle placement are built on.
//!
//! ### Game Entities
//! [`Player`] and [`Projectile`], plus [`Aabb`]-based collision helpers shared between
//! the authoritative server simulation and the client's local prediction.
//!
//! ### Network Protocol
//! [`protocol::Packet`] defines the complete wire format; [`codec`] wraps it with a
//! named, never-panicking decode path.
//!
//! ## Design Philosophy
//!
//! ### Deterministic Simulation
//! All movement calculations use consistent floating-point operations and constants
//! to ensure identical results on both client and server, enabling prediction
//! and reconciliation techniques.
//!
//! ### Serialization
//! All network data structures implement `Serialize` and `Deserialize` for efficient
//! binary encoding via the `bincode` crate, minimizing network bandwidth usage.
//!
//! ### Type Safety
//! Strong typing prevents common networking bugs like mixing up client ids, player
//! ids, and projectile ids across the client-server boundary.
//!
//! ## Usage Examples
//!
//! ```rust
//! use shared::*;
//!
//! let mut player = Player::new(1, Transform::new(100.0, 200.0, 0.0));
//! player.turret_rotation = 0.5;
//!
//! let projectile = Projectile::spawn(1, &player);
//! assert!(!check_collision(&player, &projectile));
//! ```

pub mod codec;
pub mod constants;
pub mod entities;
pub mod movement;
pub mod protocol;
pub mod transform;

pub use codec::{decode, decode_frame, encode, encode_frame, WireError};
pub use constants::*;
pub use entities::{check_collision, Aabb, Player, Projectile};
pub use movement::{apply_hull_movement, apply_turret_rotation};
pub use protocol::{Frame, Packet, PacketHeader};
pub use transform::Transform;
