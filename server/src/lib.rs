//! # Game Server Library
//!
//! This library provides the authoritative server implementation for the networked
//! multiplayer game. It manages the canonical game state, processes client inputs,
//! and broadcasts updates to maintain synchronization across all connected clients.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! The server runs the definitive version of the game physics and state. All
//! game logic decisions are made here, with clients receiving and conforming
//! to the server's authoritative state updates.
//!
//! ### Client Management
//! Handles the complete lifecycle of client connections including:
//! - Connection establishment and player assignment
//! - Input processing
//! - Disconnection handling and cleanup via the silence timeout
//!
//! ### State Broadcasting
//! Regularly transmits the current game state to all connected clients,
//! enabling them to stay synchronized and perform reconciliation when
//! their predictions diverge from reality.
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! The server uses a single-threaded, event-driven architecture that processes
//! all network events and game updates sequentially. This eliminates race
//! conditions and ensures deterministic behavior while maintaining high
//! performance for the expected player count.
//!
//! ### UDP-Based Communication
//! Uses UDP sockets for low-latency communication with clients. The protocol
//! includes reliability mechanisms for critical data while allowing some
//! packets (like frequent state updates) to be lost without disrupting gameplay.
//!
//! ### Input Processing Pipeline
//! Client inputs are processed in sequence order to maintain fairness and
//! prevent temporal inconsistencies. The server tracks the last processed
//! input per client to enable proper reconciliation.
//!
//! ## Module Organization
//!
//! ### Client Manager Module (`client_manager`)
//! Manages individual client connections and their associated state:
//! - Connection tracking and player ID assignment
//! - Input queue management and processing
//! - Client timeout detection and cleanup
//! - Per-client statistics and monitoring
//!
//! ### Game Module (`game`)
//! Contains the authoritative game state and simulation logic:
//! - Master game state with all player positions and velocities
//! - Physics simulation identical to client prediction
//! - Collision detection and resolution
//! - Game rule enforcement and validation
//!
//! ### Network Module (`network`)
//! Handles all networking operations and protocol implementation:
//! - UDP socket management and packet processing
//! - Message serialization and deserialization
//! - Connection establishment and termination
//! - Reliable-event retransmission with ack tracking
//!
//! ## Performance Characteristics
//!
//! ### Tick Rate
//! The server runs at a fixed tick rate (typically 60Hz) to ensure consistent
//! simulation timing. Each tick processes all pending inputs and generates
//! a new game state snapshot.
//!
//! ### Scalability
//! Designed to handle multiple concurrent clients (typically 2-16 players)
//! with room for expansion. Memory usage and CPU requirements scale linearly
//! with player count.
//!
//! ### Latency Optimization
//! Minimizes processing time between input receipt and state broadcast to
//! reduce the total round-trip time experienced by clients.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let mut server = Server::new("0.0.0.0:54345", Duration::from_secs_f32(1.0 / 60.0), 16).await?;
//! server.run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Trust Boundaries
//!
//! ### Malformed Input
//! Datagrams that fail to decode are logged and dropped rather than panicking
//! the receive loop; a malformed frame from one client never affects another.
//!
//! ### State Authority
//! Clients send intent (input bits, turret angle, fire request), never
//! position. The server is the only writer of player and projectile
//! position, so a modified client cannot move its tank anywhere the
//! authoritative simulation wouldn't have put it. Cheat resistance beyond
//! this (e.g. detecting impossible input patterns) is out of scope.

pub mod client_manager;
pub mod connection;
pub mod game;
pub mod network;
pub mod reliable;

use thiserror::Error;

/// Named failure modes for the server session, matching the error-handling
/// taxonomy's policy table: most of the table's entries (`UnknownEntity`,
/// `DuplicateSpawn`, `Timeout`, `OutOfBoundsMotion`) are handled in place by
/// logging or reverting rather than propagating, so only the one genuinely
/// fatal startup condition gets a variant here.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to bind server socket to {addr}: {source}")]
    BindFailure {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}
