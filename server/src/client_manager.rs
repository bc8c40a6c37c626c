//! Client connection management and input queuing.

use crate::connection::Connection;
use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

/// One tick's worth of decoded `InputCommand` payload, queued until the next
/// simulation tick applies it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingInput {
    pub bits: u8,
    pub turret_rot: f32,
    pub fire: bool,
}

/// A connected client: its own transport-level `client_id`, the `player_id` of the
/// `Player` it controls (a separate id space, per the data model), socket address,
/// connection bookkeeping, and any input commands not yet applied.
#[derive(Debug)]
pub struct Client {
    pub client_id: i32,
    pub player_id: u32,
    pub addr: SocketAddr,
    pub connection: Connection,
    pub pending_inputs: Vec<PendingInput>,
}

impl Client {
    pub fn new(client_id: i32, player_id: u32, addr: SocketAddr) -> Self {
        Self {
            client_id,
            player_id,
            addr,
            connection: Connection::new(),
            pending_inputs: Vec::new(),
        }
    }

    pub fn queue_input(&mut self, input: PendingInput) {
        self.pending_inputs.push(input);
    }

    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.connection
            .is_timed_out(std::time::Instant::now(), timeout)
    }
}

/// Tracks every connected client and assigns the two separate id spaces: the
/// transport-facing `client_id` and the simulation's `player_id`.
pub struct ClientManager {
    clients: HashMap<i32, Client>,
    next_client_id: i32,
    next_player_id: u32,
    max_clients: usize,
}

impl ClientManager {
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            next_client_id: 1,
            next_player_id: 1,
            max_clients,
        }
    }

    /// Admits a new client if under capacity, returning its freshly-assigned
    /// `(client_id, player_id)` pair.
    pub fn add_client(&mut self, addr: SocketAddr) -> Option<(i32, u32)> {
        if self.clients.len() >= self.max_clients {
            return None;
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;
        let player_id = self.next_player_id;
        self.next_player_id += 1;

        let client = Client::new(client_id, player_id, addr);
        info!(
            "Client {} (player {}) connected from {}",
            client_id, player_id, addr
        );
        self.clients.insert(client_id, client);

        Some((client_id, player_id))
    }

    pub fn remove_client(&mut self, client_id: i32) -> Option<Client> {
        let removed = self.clients.remove(&client_id);
        if let Some(ref client) = removed {
            info!("Client {} disconnected", client.client_id);
        }
        removed
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<i32> {
        self.clients
            .iter()
            .find(|(_, client)| client.addr == addr)
            .map(|(id, _)| *id)
    }

    pub fn get(&self, client_id: i32) -> Option<&Client> {
        self.clients.get(&client_id)
    }

    pub fn get_mut(&mut self, client_id: i32) -> Option<&mut Client> {
        self.clients.get_mut(&client_id)
    }

    pub fn queue_input(&mut self, client_id: i32, input: PendingInput) -> bool {
        if let Some(client) = self.clients.get_mut(&client_id) {
            client.queue_input(input);
            true
        } else {
            false
        }
    }

    /// Drains and returns every pending input for `client_id`, in arrival order.
    pub fn drain_inputs(&mut self, client_id: i32) -> Vec<PendingInput> {
        self.clients
            .get_mut(&client_id)
            .map(|c| std::mem::take(&mut c.pending_inputs))
            .unwrap_or_default()
    }

    pub fn get_client_addrs(&self) -> Vec<(i32, SocketAddr)> {
        self.clients
            .iter()
            .map(|(id, client)| (*id, client.addr))
            .collect()
    }

    pub fn player_id_of(&self, client_id: i32) -> Option<u32> {
        self.clients.get(&client_id).map(|c| c.player_id)
    }

    /// Reverse lookup from the simulation's player id space back to the
    /// transport-facing client id that controls it.
    pub fn client_id_for_player(&self, player_id: u32) -> Option<i32> {
        self.clients
            .iter()
            .find(|(_, client)| client.player_id == player_id)
            .map(|(id, _)| *id)
    }

    pub fn client_ids(&self) -> Vec<i32> {
        self.clients.keys().copied().collect()
    }

    /// Checks for and removes clients whose connection has gone quiet longer than
    /// `timeout`, returning the removed `(client_id, player_id)` pairs.
    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<(i32, u32)> {
        let timed_out: Vec<i32> = self
            .clients
            .iter()
            .filter(|(_, client)| client.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        timed_out
            .into_iter()
            .filter_map(|id| self.remove_client(id).map(|c| (id, c.player_id)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    #[test]
    fn add_client_assigns_separate_id_spaces() {
        let mut manager = ClientManager::new(2);
        let (client_id, player_id) = manager.add_client(test_addr()).unwrap();
        assert_eq!(client_id, 1);
        assert_eq!(player_id, 1);
    }

    #[test]
    fn client_capacity_is_enforced() {
        let mut manager = ClientManager::new(1);
        assert!(manager.add_client("127.0.0.1:1".parse().unwrap()).is_some());
        assert!(manager.add_client("127.0.0.1:2".parse().unwrap()).is_none());
    }

    #[test]
    fn player_ids_never_reused_after_removal() {
        let mut manager = ClientManager::new(5);
        let (id1, player1) = manager.add_client("127.0.0.1:1".parse().unwrap()).unwrap();
        manager.remove_client(id1);
        let (_, player2) = manager.add_client("127.0.0.1:2".parse().unwrap()).unwrap();
        assert_ne!(player1, player2);
    }

    #[test]
    fn queue_and_drain_inputs_preserves_order() {
        let mut manager = ClientManager::new(2);
        let (client_id, _) = manager.add_client(test_addr()).unwrap();

        manager.queue_input(
            client_id,
            PendingInput {
                bits: 0b0001,
                turret_rot: 0.0,
                fire: false,
            },
        );
        manager.queue_input(
            client_id,
            PendingInput {
                bits: 0b0010,
                turret_rot: 1.0,
                fire: true,
            },
        );

        let drained = manager.drain_inputs(client_id);
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].bits, 0b0001);
        assert_eq!(drained[1].bits, 0b0010);
        assert!(manager.drain_inputs(client_id).is_empty());
    }

    #[test]
    fn client_id_for_player_reverses_the_lookup() {
        let mut manager = ClientManager::new(2);
        let (client_id, player_id) = manager.add_client(test_addr()).unwrap();
        assert_eq!(manager.client_id_for_player(player_id), Some(client_id));
        assert_eq!(manager.client_id_for_player(999), None);
    }

    #[test]
    fn find_client_by_addr_returns_none_for_unknown() {
        let manager = ClientManager::new(2);
        assert_eq!(manager.find_client_by_addr(test_addr()), None);
    }

    #[test]
    fn timeouts_remove_quiet_clients() {
        let mut manager = ClientManager::new(2);
        let (client_id, player_id) = manager.add_client(test_addr()).unwrap();

        {
            let client = manager.get_mut(client_id).unwrap();
            client.connection = Connection::new();
        }
        std::thread::sleep(Duration::from_millis(5));
        let timed_out = manager.check_timeouts(Duration::from_millis(1));
        assert_eq!(timed_out, vec![(client_id, player_id)]);
        assert_eq!(manager.len(), 0);
    }
}
