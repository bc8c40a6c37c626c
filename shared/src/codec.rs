//! Encode/decode wrapper around `bincode`, so a malformed datagram produces a named
//! error instead of letting a `bincode::Error` escape to callers that don't expect one.

use crate::protocol::{Frame, Packet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed message: {0}")]
    MalformedMessage(#[from] bincode::Error),
}

/// Encodes a packet to its wire representation.
pub fn encode(packet: &Packet) -> Vec<u8> {
    bincode::serialize(packet).expect("Packet serialization is infallible for this protocol")
}

/// Decodes a datagram into a packet, returning `WireError::MalformedMessage` instead
/// of panicking on truncated or garbage input.
pub fn decode(bytes: &[u8]) -> Result<Packet, WireError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Encodes a whole datagram: connection header plus every message packed into it.
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    bincode::serialize(frame).expect("Frame serialization is infallible for this protocol")
}

/// Decodes a datagram into its header and concatenated messages.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, WireError> {
    Ok(bincode::deserialize(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_round_trips_encode() {
        let packet = Packet::Ack { message_id: 7 };
        let bytes = encode(&packet);
        assert_eq!(decode(&bytes).unwrap(), packet);
    }

    #[test]
    fn decode_rejects_truncated_input() {
        let packet = Packet::ProjectileSpawn {
            id: 1,
            owner: 2,
            position: (1.0, 2.0),
            rotation: 0.0,
        };
        let bytes = encode(&packet);
        let truncated = &bytes[..bytes.len() - 1];
        assert!(matches!(decode(truncated), Err(WireError::MalformedMessage(_))));
    }

    #[test]
    fn decode_rejects_empty_input() {
        assert!(decode(&[]).is_err());
    }

    #[test]
    fn frame_round_trips_multiple_messages() {
        use crate::protocol::PacketHeader;

        let frame = Frame {
            header: PacketHeader {
                sequence: 5,
                remote_sequence: 4,
                ack_bits: 0b111,
            },
            messages: vec![
                Packet::ServerTick {
                    server_time: 1000,
                    server_tick: 60,
                },
                Packet::PlayerState {
                    position: (1.0, 2.0),
                    rotation: 0.0,
                    turret_rotation: 0.0,
                },
            ],
        };
        let bytes = encode_frame(&frame);
        assert_eq!(decode_frame(&bytes).unwrap(), frame);
    }
}
