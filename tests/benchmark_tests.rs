//! # Performance Benchmark Test Suite
//!
//! This module contains comprehensive performance benchmarks for critical game systems
//! to ensure the networked multiplayer implementation meets real-time performance
//! requirements. These benchmarks validate that core algorithms can maintain 60+ FPS
//! gameplay even under stress conditions.
//!
//! ## Benchmark Categories
//!
//! ### Collision System Performance
//! Tests the computational efficiency of collision detection between tanks and
//! projectiles:
//! - **Detection Speed**: Measures AABB collision checking performance
//! - **Batch Processing**: Tests performance with many simultaneous projectiles
//!
//! ### Physics Simulation Benchmarks
//! Validates that movement calculations can run at real-time speeds:
//! - **Multiple Players**: Scaling behavior with increasing player count
//!
//! ### Network Protocol Benchmarks
//! Measures serialization and packet processing performance:
//! - **Serialization Speed**: Time to encode/decode a datagram carrying many messages
//!
//! ### Stress Testing
//! Evaluates system behavior under extreme conditions:
//! - **High Input Frequency**: Rapid input processing capabilities
//!
//! ## Performance Targets
//!
//! All benchmarks are designed against specific performance targets derived from
//! real-time gaming requirements:
//!
//! ### Frame Rate Requirements
//! - **60 FPS Minimum**: All operations must complete within 16.67ms budgets
//! - **Headroom**: Actual targets include a safety margin for real-world conditions
//!
//! ## Benchmark Methodology
//!
//! ### Measurement Accuracy
//! Benchmarks use high-precision timing and a high iteration count to reduce
//! measurement noise from OS scheduling jitter.
//!
//! ## Usage and Integration
//!
//! ```bash
//! cargo test --release benchmark_    # Run all benchmarks in release mode
//! ```

use shared::{apply_hull_movement, apply_turret_rotation, check_collision, Aabb};
use shared::{Player, Projectile, Transform};
use shared::{WORLD_HEIGHT, WORLD_WIDTH};
use std::time::Instant;

fn bounds() -> Aabb {
    Aabb {
        min: (0.0, 0.0),
        max: (WORLD_WIDTH, WORLD_HEIGHT),
    }
}

/// Benchmarks collision detection performance for real-time gameplay requirements
///
/// This test measures the computational efficiency of the axis-aligned bounding box
/// (AABB) collision check between a tank and a projectile, which is called for every
/// live projectile against every tank each simulation tick.
///
/// ## Performance Targets
///
/// - **Target**: Sub-microsecond collision detection (< 1000 ns per check)
/// - **Acceptable**: Under 100ms total for 100,000 iterations
/// - **Reasoning**: With 60 ticks/sec and multiple players and projectiles, many
///   collision checks may be needed per tick
#[test]
fn benchmark_collision_detection() {
    let target = Player::new(2, Transform::new(110.0, 110.0, 0.0));
    let shooter = Player::new(1, Transform::new(100.0, 100.0, 0.0));
    let mut projectile = Projectile::spawn(1, &shooter);
    projectile.transform.position = target.transform.position;

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let _ = check_collision(&target, &projectile);
    }

    let duration = start.elapsed();
    println!(
        "Collision detection: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 100);
}

/// Benchmarks hull movement and turret tracking performance under realistic load
///
/// This test measures the computational cost of applying hull movement and turret
/// rotation to a large number of players simultaneously, simulating the server's
/// authoritative tick under high player-count conditions.
///
/// ## Performance Targets
///
/// - **Target**: Complete a 100-player movement update in under 5ms
/// - **Frame Budget**: Must fit within the 16.67ms budget for 60 Hz simulation
#[test]
fn benchmark_physics_simulation() {
    let mut players: Vec<Player> = (0..100)
        .map(|i| Player::new(i, Transform::new((i as f32) * 5.0, 100.0, 0.0)))
        .collect();
    for player in &mut players {
        player.input_bits = shared::entities::INPUT_UP | shared::entities::INPUT_RIGHT;
        player.turret_target = 1.0;
    }

    let bounds = bounds();
    let dt = 1.0 / 60.0;
    let iterations = 1000;
    let start = Instant::now();

    for _ in 0..iterations {
        for player in &mut players {
            apply_hull_movement(player, dt, &bounds);
            apply_turret_rotation(player);
        }
    }

    let duration = start.elapsed();
    println!(
        "Physics simulation: {} players × {} ticks in {:?} ({:.2} us/tick)",
        players.len(),
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 5000);
}

/// Benchmarks network frame serialization and deserialization performance
///
/// This test measures the computational cost of converting a broadcast datagram to
/// and from binary format. A single server broadcast to one client packs a
/// `ServerTick`, the client's own `PlayerState`, and an `EntityState` for every
/// other connected player into one frame, so this represents a realistic
/// worst-case payload for a crowded server.
///
/// ## Performance Targets
///
/// - **Target**: Under 200 microseconds per serialization round-trip
/// - **Acceptable**: Under 2 seconds total for 10,000 iterations
#[test]
fn benchmark_frame_serialization() {
    use shared::{decode_frame, encode_frame, Frame, Packet, PacketHeader};

    let mut messages = vec![
        Packet::ServerTick {
            server_time: 1_234_567_890,
            server_tick: 12345,
        },
        Packet::PlayerState {
            position: (320.0, 240.0),
            rotation: 0.3,
            turret_rotation: 1.1,
        },
    ];
    for i in 0..49 {
        messages.push(Packet::EntityState {
            id: i,
            position: ((i as f32) * 10.0, 100.0),
            rotation: 0.0,
            turret_rotation: 0.0,
        });
    }

    let frame = Frame {
        header: PacketHeader {
            sequence: 500,
            remote_sequence: 499,
            ack_bits: 0xFFFF_FFFF,
        },
        messages,
    };

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let serialized = encode_frame(&frame);
        let _decoded = decode_frame(&serialized).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Frame serialization: {} iterations in {:?} ({:.2} us/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Stress tests input command processing performance under high-frequency scenarios
///
/// This test validates the system's ability to handle rapid encode/decode of
/// `InputCommand` packets, the most frequently sent message in the protocol, at a
/// volume representative of a burst of queued input after a reconnect.
///
/// ## Performance Targets
///
/// - **Target**: Process 1000 input commands in under 100ms
/// - **Real-Time Requirement**: Must not block the main simulation tick
#[test]
fn stress_test_many_inputs() {
    use shared::{encode, decode, Packet};

    let inputs: Vec<Packet> = (0..1000)
        .map(|i| Packet::InputCommand {
            bits: (i % 16) as u8,
            turret_rot: (i as f32) * 0.001,
            fire: i % 7 == 0,
        })
        .collect();

    let start = Instant::now();

    for input in &inputs {
        let bytes = encode(input);
        let _decoded = decode(&bytes).unwrap();
    }

    let duration = start.elapsed();
    println!("Input processing: {} inputs in {:?}", inputs.len(), duration);

    assert!(duration.as_millis() < 100);
}
