//! World, timing, and tuning constants shared by server simulation and client prediction.
//!
//! Values are carried over from the original tank battle's `config.h` where that file
//! specifies them; values the original never named (e.g. reconciliation epsilon) are
//! chosen to match the behavior described for this crate and documented inline.

/// Fixed simulation rate. Both server authority and client-side prediction step at
/// this rate; network send rates are independent and slower (see [`SERVER_SEND_HZ`]
/// and [`CLIENT_SEND_HZ`]).
pub const TICK_RATE: u32 = 60;

/// Seconds per simulation tick, derived from [`TICK_RATE`].
pub const TICK_DT: f32 = 1.0 / TICK_RATE as f32;

/// How often the server broadcasts `ServerTick`/`PlayerState`/`EntityState` packets,
/// independent of the 60 Hz simulation rate.
pub const SERVER_SEND_HZ: u32 = 20;

/// How often the client resends `InputCommand` packets when input hasn't changed,
/// independent of the 60 Hz simulation rate.
pub const CLIENT_SEND_HZ: u32 = 10;

/// UDP port the server listens on.
pub const SERVER_PORT: u16 = 54345;

/// Broadcast/discovery address octets, `82.117.111.100`.
pub const BROADCAST_ADDR: (u8, u8, u8, u8) = (82, 117, 111, 100);

/// World width in world units (the original's `SCREEN_WIDTH`).
pub const WORLD_WIDTH: f32 = 640.0;

/// World height in world units (the original's `SCREEN_HEIGHT`).
pub const WORLD_HEIGHT: f32 = 480.0;

/// Tank hull translation speed, world units/second.
pub const TANK_SPEED: f32 = 100.0;

/// Tank hull rotation speed, radians/second.
pub const TANK_TURN_SPEED: f32 = 50.0;

/// Half-width/half-height of a tank's body collision box.
pub const TANK_HALF_EXTENT: f32 = 75.0;

/// Half-width/half-height of a projectile's collision box.
pub const PROJECTILE_HALF_EXTENT: f32 = 12.5;

/// Projectile travel speed, world units/second.
pub const PROJECTILE_SPEED: f32 = 600.0;

/// Projectile lifetime in seconds before it expires unhit.
pub const PROJECTILE_LIFETIME: f32 = 3.0;

/// Minimum seconds between shots fired by a single player, enforced via an
/// accumulator rather than a last-fired timestamp.
pub const FIRE_DELAY: f32 = 2.0;

/// Positional discrepancy, in world units, beyond which client-side reconciliation
/// snaps to the authoritative server position and replays retained input snapshots.
pub const RECONCILIATION_EPSILON: f32 = 5.0;

/// Delay, in milliseconds, behind the freshest snapshot that remote entities render
/// at when interpolating between position snapshots.
pub const INTERPOLATION_DELAY_MS: u64 = 200;

/// How many send intervals of silence from a peer are tolerated before the
/// connection is considered timed out. Expressed as a multiplier rather than a
/// flat duration because the threshold must scale with whatever send rate is
/// actually in effect (the server's `--send-rate` is configurable).
pub const CONNECTION_TIMEOUT_INTERVALS: u32 = 5;
