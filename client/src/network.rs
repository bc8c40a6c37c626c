//! Client-side network implementation for the real-time multiplayer tank game.
//!
//! This module handles:
//! - UDP connection management with timeout detection
//! - Artificial latency simulation for testing netcode
//! - Frame encoding/decoding and queuing for delayed transmission
//! - Integration with client-side prediction, reconciliation, and interpolation
//!
//! There is no explicit connect handshake in the wire protocol: the server
//! admits a new peer on the first datagram it receives from an unknown address.
//! The client simply starts sending `InputCommand` frames; it is "connected"
//! once the server's first reply arrives.

use crate::game::ClientGameState;
use crate::input::InputManager;
use crate::rendering::{RenderConfig, Renderer};
use log::{error, info, warn};
use macroquad::prelude::*;
use shared::{decode_frame, encode_frame, Frame, Packet, PacketHeader, CLIENT_SEND_HZ, TICK_DT};
use std::collections::VecDeque;
use std::net::{SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

/// Main client structure managing network communication and game state.
pub struct Client {
    socket: UdpSocket,
    server_addr: SocketAddr,
    connected: bool,

    our_sequence: u16,
    remote_sequence: u16,
    pending_acks: Vec<u32>,

    game_state: ClientGameState,
    input_manager: InputManager,
    renderer: Renderer,

    real_ping_ms: u64,
    fake_ping_ms: u64,
    ping_ms: u64,
    last_packet_received: Instant,
    connection_timeout: Duration,

    outgoing_packets: VecDeque<(Vec<u8>, Instant)>,
    incoming_packets: VecDeque<(Frame, Instant, Instant)>,

    prediction_enabled: bool,
    reconciliation_enabled: bool,
    interpolation_enabled: bool,
}

impl Client {
    pub async fn new(
        server_addr: &str,
        fake_ping_ms: u64,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_nonblocking(true)?;

        let server_addr = Self::resolve_address(server_addr)?;
        let renderer = Renderer::new()?;

        Ok(Client {
            socket,
            server_addr,
            connected: false,
            our_sequence: 0,
            remote_sequence: 0,
            pending_acks: Vec::new(),
            game_state: ClientGameState::new((
                shared::WORLD_WIDTH / 2.0,
                shared::WORLD_HEIGHT / 2.0,
            )),
            input_manager: InputManager::new(),
            renderer,
            real_ping_ms: 0,
            fake_ping_ms,
            ping_ms: 0,
            last_packet_received: Instant::now(),
            connection_timeout: Duration::from_secs_f32(
                shared::CONNECTION_TIMEOUT_INTERVALS as f32 / shared::SERVER_SEND_HZ as f32,
            ),
            outgoing_packets: VecDeque::new(),
            incoming_packets: VecDeque::new(),
            prediction_enabled: true,
            reconciliation_enabled: true,
            interpolation_enabled: true,
        })
    }

    /// Resolves a server address string to a `SocketAddr`, supporting both IP
    /// addresses and domain names.
    fn resolve_address(addr_str: &str) -> Result<SocketAddr, Box<dyn std::error::Error>> {
        if let Ok(addr) = addr_str.parse::<SocketAddr>() {
            return Ok(addr);
        }

        use std::net::ToSocketAddrs;
        let mut addrs = addr_str.to_socket_addrs()?;

        if let Some(addr) = addrs.next() {
            Ok(addr)
        } else {
            Err(format!("Failed to resolve address: {}", addr_str).into())
        }
    }

    /// Resets connection and game state, used both for the initial connection
    /// attempt and for a manually requested reconnect.
    pub fn reconnect(&mut self) {
        info!("(Re)connecting...");

        self.connected = false;
        self.our_sequence = 0;
        self.remote_sequence = 0;
        self.pending_acks.clear();
        self.last_packet_received = Instant::now();

        self.outgoing_packets.clear();
        self.incoming_packets.clear();

        self.game_state =
            ClientGameState::new((shared::WORLD_WIDTH / 2.0, shared::WORLD_HEIGHT / 2.0));
    }

    fn check_connection_health(&mut self) {
        if self.connected && self.last_packet_received.elapsed() > self.connection_timeout {
            warn!("Connection timeout detected, marking as disconnected");
            self.connected = false;
        }
    }

    /// Encodes a frame carrying `messages` plus any outstanding acks, and
    /// either sends it immediately or queues it for delayed transmission if
    /// artificial latency is enabled.
    fn send_frame(&mut self, mut messages: Vec<Packet>) -> Result<(), Box<dyn std::error::Error>> {
        for id in self.pending_acks.drain(..) {
            messages.push(Packet::Ack { message_id: id });
        }

        self.our_sequence = self.our_sequence.wrapping_add(1);
        let frame = Frame {
            header: PacketHeader {
                sequence: self.our_sequence,
                remote_sequence: self.remote_sequence,
                ack_bits: 0,
            },
            messages,
        };
        let data = encode_frame(&frame);

        if self.fake_ping_ms > 0 {
            let delay_ms = self.fake_ping_ms / 2;
            let send_time = Instant::now() + Duration::from_millis(delay_ms);
            self.outgoing_packets.push_back((data, send_time));
        } else {
            self.socket.send_to(&data, self.server_addr)?;
        }

        Ok(())
    }

    fn process_outgoing_packets(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let now = Instant::now();
        while let Some((_data, send_time)) = self.outgoing_packets.front() {
            if now >= *send_time {
                let (data, _) = self.outgoing_packets.pop_front().unwrap();
                self.socket.send_to(&data, self.server_addr)?;
            } else {
                break;
            }
        }
        Ok(())
    }

    fn process_incoming_packets(&mut self) {
        let now = Instant::now();
        while let Some((_frame, process_time, _receive_time)) = self.incoming_packets.front() {
            if now >= *process_time {
                let (frame, _, receive_time) = self.incoming_packets.pop_front().unwrap();
                self.handle_frame(frame, receive_time);
            } else {
                break;
            }
        }
    }

    /// Dispatches every message in a received frame, updating prediction,
    /// interpolation, and ping tracking, and queuing acks for reliable events.
    fn handle_frame(&mut self, frame: Frame, _receive_time: Instant) {
        self.last_packet_received = Instant::now();
        self.connected = true;
        if frame.header.sequence > self.remote_sequence {
            self.remote_sequence = frame.header.sequence;
        }

        let now_ms = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_millis() as i64;

        for message in frame.messages {
            match message {
                Packet::ServerTick {
                    server_time,
                    server_tick,
                } => {
                    self.game_state.on_server_tick(server_time, server_tick, now_ms);
                    self.real_ping_ms = self.game_state.latency_ms;
                    self.ping_ms = self.real_ping_ms + self.fake_ping_ms;
                }
                Packet::EntityState {
                    id,
                    position,
                    rotation,
                    turret_rotation,
                } => {
                    if self.interpolation_enabled {
                        self.game_state.on_entity_state(id, position, rotation, turret_rotation);
                    }
                }
                Packet::PlayerState {
                    position,
                    rotation,
                    turret_rotation,
                } => {
                    if self.reconciliation_enabled {
                        let server_tick = self.game_state.last_known_server_tick;
                        self.game_state
                            .reconcile(server_tick, position, rotation, turret_rotation);
                    }
                }
                Packet::PlayerSpawn { id, position } => {
                    self.game_state.on_player_spawn(id, position);
                    self.pending_acks.push(id);
                }
                Packet::ProjectileSpawn {
                    id,
                    owner,
                    position,
                    rotation,
                } => {
                    self.game_state.on_projectile_spawn(id, owner, position, rotation);
                    self.pending_acks.push(id);
                }
                Packet::PlayerDisconnected { id } => {
                    self.game_state.on_player_disconnected(id);
                    self.pending_acks.push(id);
                }
                Packet::ProjectileDestroy { id } => {
                    self.game_state.on_projectile_destroy(id);
                    self.pending_acks.push(id);
                }
                other => {
                    warn!("Unexpected message from server: {:?}", other);
                }
            }
        }
    }

    /// Handles runtime toggling of netcode features and manual reconnection.
    /// Returns true if reconnection was requested.
    fn handle_toggles(&mut self, toggles: (bool, bool, bool, bool)) -> bool {
        if toggles.0 {
            self.prediction_enabled = !self.prediction_enabled;
            info!("Client-side prediction: {}", self.prediction_enabled);
        }
        if toggles.1 {
            self.reconciliation_enabled = !self.reconciliation_enabled;
            info!("Server reconciliation: {}", self.reconciliation_enabled);
        }
        if toggles.2 {
            self.interpolation_enabled = !self.interpolation_enabled;
            info!("Interpolation: {}", self.interpolation_enabled);
        }
        toggles.3
    }

    /// Main client loop: network I/O, fixed-tick prediction, input transmission,
    /// interpolation, and rendering.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.reconnect();

        let mut last_tick_time = Instant::now();
        let tick_interval = Duration::from_secs_f32(TICK_DT);
        let send_interval = Duration::from_secs_f32(1.0 / CLIENT_SEND_HZ as f32);
        let mut last_send_time = Instant::now();

        let mut buffer = [0u8; 2048];

        loop {
            if let Err(e) = self.process_outgoing_packets() {
                error!("Error processing outgoing packets: {}", e);
            }

            match self.socket.recv_from(&mut buffer) {
                Ok((len, _)) => {
                    let receive_time = Instant::now();
                    match decode_frame(&buffer[..len]) {
                        Ok(frame) => {
                            if self.fake_ping_ms > 0 {
                                let delay_ms = self.fake_ping_ms / 2;
                                let process_time = receive_time + Duration::from_millis(delay_ms);
                                self.incoming_packets
                                    .push_back((frame, process_time, receive_time));
                            } else {
                                self.handle_frame(frame, receive_time);
                            }
                        }
                        Err(e) => warn!("Malformed datagram from server: {}", e),
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {}
                Err(e) => error!("Error receiving datagram: {}", e),
            }

            self.process_incoming_packets();

            if last_tick_time.elapsed() >= tick_interval {
                last_tick_time = Instant::now();

                let (toggles, input_to_send) =
                    self.input_manager.update(self.game_state.local_player.transform.position);

                if self.handle_toggles(toggles) {
                    self.reconnect();
                }

                if self.prediction_enabled {
                    let sampled = self.input_manager.current();
                    self.game_state
                        .predict_tick(sampled.bits, sampled.turret_rot, sampled.fire, TICK_DT);
                }
                self.game_state.tick_remote_entities(TICK_DT);

                if let Some(input) = input_to_send {
                    if last_send_time.elapsed() >= send_interval || !self.pending_acks.is_empty() {
                        if let Err(e) = self.send_frame(vec![Packet::InputCommand {
                            bits: input.bits,
                            turret_rot: input.turret_rot,
                            fire: input.fire,
                        }]) {
                            error!("Error sending input: {}", e);
                        }
                        last_send_time = Instant::now();
                    }
                }
            }

            self.check_connection_health();

            let render_config = RenderConfig {
                connected: self.connected,
                prediction_enabled: self.prediction_enabled,
                reconciliation_enabled: self.reconciliation_enabled,
                interpolation_enabled: self.interpolation_enabled,
                ping_ms: self.ping_ms,
                fake_ping_ms: self.fake_ping_ms,
                player_count: self.game_state.remote_players.len() + 1,
            };
            self.renderer.render(&self.game_state, render_config);

            if is_quit_requested() {
                break;
            }

            next_frame().await;
        }

        Ok(())
    }
}
