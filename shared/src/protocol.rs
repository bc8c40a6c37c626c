//! Wire protocol: the complete set of messages exchanged between client and server.
//!
//! Every variant is serialized with `bincode`, which prefixes enums with a
//! little-endian discriminant ahead of the payload fields, matching the original's
//! single leading tag byte plus payload layout.

use serde::{Deserialize, Serialize};

/// Connection-level header carried on every datagram, ahead of its payload
/// messages: our sequence number, the highest sequence we've seen from the peer,
/// and a bitfield of the preceding 32 remote sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketHeader {
    pub sequence: u16,
    pub remote_sequence: u16,
    pub ack_bits: u32,
}

/// A single datagram: one connection header followed by every tagged message
/// packed into it, exactly as the wire format concatenates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub header: PacketHeader,
    pub messages: Vec<Packet>,
}

/// Network message types exchanged over UDP between client and server.
///
/// Variant order is part of the wire format (`bincode` encodes enums by declaration
/// order) and must not be reordered without a protocol version bump.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum Packet {
    /// Server → client preamble, sent ahead of a tick's state updates.
    ServerTick { server_time: i64, server_tick: u32 },

    /// Server → client snapshot of a non-local entity's position, appended to the
    /// receiver's interpolation buffer for that id (or used to create the entity if
    /// it isn't known yet).
    EntityState {
        id: u32,
        position: (f32, f32),
        rotation: f32,
        turret_rotation: f32,
    },

    /// Client → server input for the next tick: hull movement bits, a turret
    /// rotation delta, and whether the fire button is held.
    InputCommand { bits: u8, turret_rot: f32, fire: bool },

    /// Server → client authoritative state for the receiving client's own player,
    /// used to reconcile local prediction.
    PlayerState {
        position: (f32, f32),
        rotation: f32,
        turret_rotation: f32,
    },

    /// Bidirectional spawn notification for a player: server → client on connect
    /// fan-out (new client, existing clients), queued as a reliable event until
    /// acknowledged.
    PlayerSpawn { id: u32, position: (f32, f32) },

    /// Client → server acknowledgment of a reliable spawn/destroy event, keyed by
    /// the event's own subject id rather than a transport sequence number.
    Ack { message_id: u32 },

    /// Server → client reliable spawn notification for a projectile.
    ProjectileSpawn {
        id: u32,
        owner: u32,
        position: (f32, f32),
        rotation: f32,
    },

    /// Server → client reliable notification that a player disconnected or timed
    /// out; receivers remove the entity if present.
    PlayerDisconnected { id: u32 },

    /// Server → client reliable notification that a projectile expired or hit
    /// something; receivers remove the entity if present.
    ProjectileDestroy { id: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_command_round_trips() {
        let packet = Packet::InputCommand {
            bits: 0b1010,
            turret_rot: 0.25,
            fire: true,
        };
        let encoded = bincode::serialize(&packet).unwrap();
        let decoded: Packet = bincode::deserialize(&encoded).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn player_spawn_round_trips() {
        let packet = Packet::PlayerSpawn {
            id: 3,
            position: (12.5, -4.0),
        };
        let encoded = bincode::serialize(&packet).unwrap();
        let decoded: Packet = bincode::deserialize(&encoded).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn ack_round_trips() {
        let packet = Packet::Ack { message_id: 99 };
        let encoded = bincode::serialize(&packet).unwrap();
        let decoded: Packet = bincode::deserialize(&encoded).unwrap();
        assert_eq!(decoded, packet);
    }
}
