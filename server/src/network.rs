//! Server network layer: UDP transport, per-peer connection bookkeeping, and the
//! main server loop that ties the simulation tick to the wire protocol.
//!
//! ## Architecture Overview
//!
//! The server runs three concurrent tasks:
//! - **Network Receiver**: decodes incoming datagrams into `Frame`s and forwards
//!   them to the main loop.
//! - **Network Sender**: takes already-encoded outgoing datagrams and writes them
//!   to the socket.
//! - **Main Loop**: owns the authoritative `GameState`, `ClientManager`, and
//!   `ReliableEventQueue` directly (no locking — everything that touches them runs
//!   on this one task) and drives two independent clocks: the 60 Hz simulation
//!   tick and the slower, configurable send rate.
//!
//! ## Packet Flow
//!
//! 1. **Incoming**: UDP datagram -> decode into `Frame` -> main loop dispatches
//!    each message (`InputCommand` queues an input, `Ack` retires a reliable
//!    event).
//! 2. **Simulation**: every 60 Hz tick, queued inputs are applied and
//!    `GameState::step` advances the world, translating spawn/destroy events into
//!    reliable events.
//! 3. **Outgoing**: at the server's send rate, one `Frame` per connected client is
//!    composed (`ServerTick`, outstanding reliable events, the client's own
//!    `PlayerState`, every other player's `EntityState`) and handed to the sender
//!    task.

use crate::client_manager::{ClientManager, PendingInput};
use crate::connection::ConnectionState;
use crate::game::{GameState, SimEvent};
use crate::reliable::{ReliableEvent, ReliableEventQueue};
use crate::SessionError;
use log::{debug, error, info, warn};
use shared::{
    decode_frame, encode_frame, Frame, Packet, CONNECTION_TIMEOUT_INTERVALS, SERVER_SEND_HZ,
    TICK_DT,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::interval;

/// Messages sent from the network receiver task to the main server loop.
#[derive(Debug)]
enum ServerMessage {
    FrameReceived { frame: Frame, addr: SocketAddr },
}

/// Messages sent from the main server loop to the network sender task.
#[derive(Debug)]
struct Outgoing {
    bytes: Vec<u8>,
    addr: SocketAddr,
}

/// The authoritative tank server: owns the simulation and all connection state,
/// and coordinates the receiver/sender tasks over channels.
pub struct Server {
    socket: Arc<UdpSocket>,
    clients: ClientManager,
    game: GameState,
    reliable: ReliableEventQueue,
    tick_duration: Duration,
    send_interval: Duration,
    timeout: Duration,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    outgoing_tx: mpsc::UnboundedSender<Outgoing>,
    outgoing_rx: Option<mpsc::UnboundedReceiver<Outgoing>>,
}

impl Server {
    /// Binds the server to `addr`. `tick_duration` is the fixed simulation
    /// timestep (typically `1/60s`); `send_interval` is the independent, slower
    /// rate at which `ServerTick`/`PlayerState`/`EntityState` broadcasts go out
    /// (defaults to [`SERVER_SEND_HZ`] when callers don't need to override it).
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
        max_clients: usize,
    ) -> Result<Self, SessionError> {
        Self::with_send_interval(
            addr,
            tick_duration,
            Duration::from_secs_f32(1.0 / SERVER_SEND_HZ as f32),
            max_clients,
        )
        .await
    }

    /// Same as [`Server::new`] but with an explicit broadcast send interval,
    /// exposed so the binary's `--send-rate` flag can override the default.
    pub async fn with_send_interval(
        addr: &str,
        tick_duration: Duration,
        send_interval: Duration,
        max_clients: usize,
    ) -> Result<Self, SessionError> {
        let socket = Arc::new(
            UdpSocket::bind(addr)
                .await
                .map_err(|source| SessionError::BindFailure { addr: addr.to_string(), source })?,
        );
        info!("Server listening on {}", addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            clients: ClientManager::new(max_clients),
            game: GameState::new(),
            reliable: ReliableEventQueue::new(),
            tick_duration,
            send_interval,
            timeout: send_interval * CONNECTION_TIMEOUT_INTERVALS,
            server_tx,
            server_rx,
            outgoing_tx,
            outgoing_rx: Some(outgoing_rx),
        })
    }

    /// Spawns the task that continuously decodes incoming datagrams.
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 2048];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => match decode_frame(&buffer[..len]) {
                        Ok(frame) => {
                            if server_tx
                                .send(ServerMessage::FrameReceived { frame, addr })
                                .is_err()
                            {
                                break;
                            }
                        }
                        Err(e) => warn!("Malformed datagram from {}: {}", addr, e),
                    },
                    Err(e) => {
                        error!("Error receiving datagram: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns the task that writes already-encoded outgoing datagrams.
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let mut outgoing_rx = self
            .outgoing_rx
            .take()
            .expect("spawn_network_sender called more than once");

        tokio::spawn(async move {
            while let Some(Outgoing { bytes, addr }) = outgoing_rx.recv().await {
                if let Err(e) = socket.send_to(&bytes, addr).await {
                    error!("Failed to send datagram to {}: {}", addr, e);
                }
            }
        });
    }

    fn queue_send(&self, frame: &Frame, addr: SocketAddr) {
        let bytes = encode_frame(frame);
        if self.outgoing_tx.send(Outgoing { bytes, addr }).is_err() {
            error!("Outgoing channel closed; sender task must have exited");
        }
    }

    /// Admits a new client, assigns it a player, and enqueues the bidirectional
    /// `SpawnPlayer` reliable events between it and every pre-existing player.
    fn on_connect(&mut self, addr: SocketAddr) -> Option<i32> {
        let (client_id, player_id) = self.clients.add_client(addr)?;

        let existing: Vec<(i32, u32, (f32, f32))> = self
            .clients
            .client_ids()
            .into_iter()
            .filter(|&id| id != client_id)
            .filter_map(|id| {
                let other_player_id = self.clients.player_id_of(id)?;
                let position = self.game.players.get(&other_player_id)?.transform.position;
                Some((id, other_player_id, position))
            })
            .collect();

        self.game.add_player(player_id);
        let new_position = self.game.players[&player_id].transform.position;

        for (existing_client_id, existing_player_id, existing_position) in existing {
            self.reliable.enqueue(ReliableEvent::SpawnPlayer {
                target_client: client_id,
                subject_id: existing_player_id,
                position: existing_position,
            });
            self.reliable.enqueue(ReliableEvent::SpawnPlayer {
                target_client: existing_client_id,
                subject_id: player_id,
                position: new_position,
            });
        }

        Some(client_id)
    }

    fn on_frame_received(&mut self, frame: Frame, addr: SocketAddr) {
        let client_id = match self.clients.find_client_by_addr(addr) {
            Some(id) => id,
            None => match self.on_connect(addr) {
                Some(id) => id,
                None => {
                    warn!("Rejected connection from {}: server full", addr);
                    return;
                }
            },
        };

        if let Some(client) = self.clients.get_mut(client_id) {
            client.connection.ingest(&frame.header, Instant::now());
        }

        for message in frame.messages {
            match message {
                Packet::InputCommand {
                    bits,
                    turret_rot,
                    fire,
                } => {
                    self.clients.queue_input(
                        client_id,
                        PendingInput {
                            bits,
                            turret_rot,
                            fire,
                        },
                    );
                }
                Packet::Ack { message_id } => {
                    if !self.reliable.retire(client_id, message_id) {
                        debug!(
                            "Ack from client {} for unknown reliable event {}",
                            client_id, message_id
                        );
                    }
                }
                other => {
                    debug!("Ignoring unexpected client message: {:?}", other);
                }
            }
        }
    }

    /// Removes a disconnected/timed-out client and fans out `PlayerDisconnected`
    /// to every remaining peer.
    fn on_disconnect(&mut self, client_id: i32, player_id: u32) {
        self.game.remove_player(player_id);
        self.reliable.drop_client(client_id);

        for target in self.clients.client_ids() {
            self.reliable.enqueue(ReliableEvent::DestroyPlayer {
                target_client: target,
                subject_id: player_id,
            });
        }
    }

    /// Drains queued inputs, advances the simulation by one fixed tick, and turns
    /// spawn/destroy events into reliable events fanned out to connected clients.
    fn simulate_tick(&mut self, dt: f32) {
        for client_id in self.clients.client_ids() {
            let player_id = match self.clients.player_id_of(client_id) {
                Some(id) => id,
                None => continue,
            };
            for input in self.clients.drain_inputs(client_id) {
                self.game.apply_input(player_id, &input);
            }
        }

        let events = self.game.step(dt);
        self.game.tick = self.game.tick.wrapping_add(1);

        for event in events {
            match event {
                SimEvent::ProjectileSpawned(id) => {
                    let Some(projectile) = self.game.projectiles.get(&id) else {
                        continue;
                    };
                    let owner = projectile.owner;
                    let position = projectile.transform.position;
                    let rotation = projectile.transform.rotation;
                    let owner_client = self.clients.client_id_for_player(owner);

                    for target in self.clients.client_ids() {
                        if Some(target) == owner_client {
                            continue;
                        }
                        self.reliable.enqueue(ReliableEvent::SpawnProjectile {
                            target_client: target,
                            subject_id: id,
                            owner,
                            position,
                            rotation,
                        });
                    }
                }
                SimEvent::ProjectileDestroyed(id) => {
                    for target in self.clients.client_ids() {
                        self.reliable.enqueue(ReliableEvent::DestroyProjectile {
                            target_client: target,
                            subject_id: id,
                        });
                    }
                }
            }
        }

        let timed_out = self.clients.check_timeouts(self.timeout);
        for (client_id, player_id) in timed_out {
            info!("Client {} (player {}) timed out", client_id, player_id);
            self.on_disconnect(client_id, player_id);
        }
    }

    /// Composes and queues one `Frame` per connected client: a `ServerTick`
    /// header, its outstanding reliable events, its own `PlayerState`, and every
    /// other player's `EntityState`.
    fn broadcast_tick(&mut self) {
        if self.clients.is_empty() {
            return;
        }

        let server_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::from_secs(0))
            .as_millis() as i64;
        let server_tick = self.game.tick;

        for client_id in self.clients.client_ids() {
            let Some(player_id) = self.clients.player_id_of(client_id) else {
                continue;
            };

            let mut messages = vec![Packet::ServerTick {
                server_time,
                server_tick,
            }];

            for event in self.reliable.events_for(client_id) {
                messages.push(event.to_packet());
            }

            if let Some(player) = self.game.players.get(&player_id) {
                messages.push(Packet::PlayerState {
                    position: player.transform.position,
                    rotation: player.transform.rotation,
                    turret_rotation: player.turret_rotation,
                });
            }

            for other in self.game.players.values() {
                if other.id == player_id {
                    continue;
                }
                messages.push(Packet::EntityState {
                    id: other.id,
                    position: other.transform.position,
                    rotation: other.transform.rotation,
                    turret_rotation: other.turret_rotation,
                });
            }

            let addr = match self.clients.get(client_id) {
                Some(client) if client.connection.state() != ConnectionState::Disconnected => {
                    client.addr
                }
                _ => continue,
            };

            let header = self
                .clients
                .get_mut(client_id)
                .expect("client present in client_ids")
                .connection
                .next_header();

            self.queue_send(&Frame { header, messages }, addr);
        }
    }

    /// Runs the server: spawns the receiver/sender tasks, then drives the
    /// simulation tick and send-rate clocks from the main loop until it exits.
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();

        let mut sim_interval = interval(self.tick_duration);
        let mut send_interval = interval(self.send_interval);

        info!("Server started; simulating at {} Hz", 1.0 / TICK_DT);

        loop {
            tokio::select! {
                message = self.server_rx.recv() => {
                    match message {
                        Some(ServerMessage::FrameReceived { frame, addr }) => {
                            self.on_frame_received(frame, addr);
                        }
                        None => {
                            info!("Server shutting down");
                            break;
                        }
                    }
                }

                _ = sim_interval.tick() => {
                    // Always integrate with the fixed tick duration, never the
                    // wall-clock gap since the last tick: the client predicts
                    // with the same constant `TICK_DT`, and any jitter here
                    // would make the two diverge.
                    self.simulate_tick(TICK_DT);

                    if self.game.tick % 300 == 0 && !self.clients.is_empty() {
                        debug!("Tick {}: {} clients", self.game.tick, self.clients.len());
                    }
                }

                _ = send_interval.tick() => {
                    self.broadcast_tick();
                }
            }
        }

        Ok(())
    }
}
