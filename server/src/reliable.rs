//! Reliable spawn/destroy notifications layered over the unreliable UDP transport.
//!
//! Each event is queued per target client and kept until the client explicitly
//! acknowledges it by subject id (`Packet::Ack { message_id }`), at which point it
//! retires. Retirement is keyed directly by the event's own subject id rather than
//! by correlating outgoing packet sequence numbers against a sent-message ring, the
//! way the original's `tick_ % 50` `ReliableMessageQueue` does — simpler, and
//! naturally idempotent against a duplicate ack.

use shared::Packet;

/// One outstanding reliable notification addressed to a specific client.
#[derive(Debug, Clone, PartialEq)]
pub enum ReliableEvent {
    SpawnPlayer {
        target_client: i32,
        subject_id: u32,
        position: (f32, f32),
    },
    SpawnProjectile {
        target_client: i32,
        subject_id: u32,
        owner: u32,
        position: (f32, f32),
        rotation: f32,
    },
    DestroyPlayer {
        target_client: i32,
        subject_id: u32,
    },
    DestroyProjectile {
        target_client: i32,
        subject_id: u32,
    },
}

impl ReliableEvent {
    pub fn target_client(&self) -> i32 {
        match self {
            ReliableEvent::SpawnPlayer { target_client, .. }
            | ReliableEvent::SpawnProjectile { target_client, .. }
            | ReliableEvent::DestroyPlayer { target_client, .. }
            | ReliableEvent::DestroyProjectile { target_client, .. } => *target_client,
        }
    }

    pub fn subject_id(&self) -> u32 {
        match self {
            ReliableEvent::SpawnPlayer { subject_id, .. }
            | ReliableEvent::SpawnProjectile { subject_id, .. }
            | ReliableEvent::DestroyPlayer { subject_id, .. }
            | ReliableEvent::DestroyProjectile { subject_id, .. } => *subject_id,
        }
    }

    /// Renders this event as the wire packet a client receives.
    pub fn to_packet(&self) -> Packet {
        match *self {
            ReliableEvent::SpawnPlayer {
                subject_id,
                position,
                ..
            } => Packet::PlayerSpawn {
                id: subject_id,
                position,
            },
            ReliableEvent::SpawnProjectile {
                subject_id,
                owner,
                position,
                rotation,
                ..
            } => Packet::ProjectileSpawn {
                id: subject_id,
                owner,
                position,
                rotation,
            },
            ReliableEvent::DestroyPlayer { subject_id, .. } => {
                Packet::PlayerDisconnected { id: subject_id }
            }
            ReliableEvent::DestroyProjectile { subject_id, .. } => {
                Packet::ProjectileDestroy { id: subject_id }
            }
        }
    }
}

/// Per-client queues of outstanding reliable events awaiting acknowledgment.
#[derive(Debug, Default)]
pub struct ReliableEventQueue {
    events: Vec<ReliableEvent>,
}

impl ReliableEventQueue {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn enqueue(&mut self, event: ReliableEvent) {
        self.events.push(event);
    }

    /// All events still outstanding for `client_id`, in queue order.
    pub fn events_for(&self, client_id: i32) -> impl Iterator<Item = &ReliableEvent> {
        self.events
            .iter()
            .filter(move |e| e.target_client() == client_id)
    }

    /// Retires the event addressed to `client_id` naming `subject_id`, if any.
    /// Idempotent: acknowledging the same id twice is a no-op the second time.
    /// Returns whether a matching event was actually removed, so callers can
    /// distinguish a fresh acknowledgement from one naming an id with nothing
    /// queued (an `UnknownEntity` ack — harmless, but worth a debug log).
    pub fn retire(&mut self, client_id: i32, subject_id: u32) -> bool {
        let before = self.events.len();
        self.events
            .retain(|e| !(e.target_client() == client_id && e.subject_id() == subject_id));
        self.events.len() != before
    }

    /// Drops every event addressed to `client_id`, used when a client disconnects.
    pub fn drop_client(&mut self, client_id: i32) {
        self.events.retain(|e| e.target_client() != client_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spawn_event(target: i32, id: u32) -> ReliableEvent {
        ReliableEvent::SpawnPlayer {
            target_client: target,
            subject_id: id,
            position: (0.0, 0.0),
        }
    }

    #[test]
    fn events_for_filters_by_target_client() {
        let mut queue = ReliableEventQueue::new();
        queue.enqueue(spawn_event(1, 100));
        queue.enqueue(spawn_event(2, 200));

        let for_one: Vec<_> = queue.events_for(1).collect();
        assert_eq!(for_one.len(), 1);
        assert_eq!(for_one[0].subject_id(), 100);
    }

    #[test]
    fn retire_removes_matching_event_only() {
        let mut queue = ReliableEventQueue::new();
        queue.enqueue(spawn_event(1, 100));
        queue.enqueue(spawn_event(1, 101));

        queue.retire(1, 100);

        let remaining: Vec<_> = queue.events_for(1).collect();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].subject_id(), 101);
    }

    #[test]
    fn retiring_twice_is_idempotent() {
        let mut queue = ReliableEventQueue::new();
        queue.enqueue(spawn_event(1, 100));

        assert!(queue.retire(1, 100));
        assert!(!queue.retire(1, 100));

        assert_eq!(queue.events_for(1).count(), 0);
    }

    #[test]
    fn retiring_unknown_subject_reports_no_match() {
        let mut queue = ReliableEventQueue::new();
        assert!(!queue.retire(1, 999));
    }

    #[test]
    fn drop_client_clears_only_that_clients_events() {
        let mut queue = ReliableEventQueue::new();
        queue.enqueue(spawn_event(1, 100));
        queue.enqueue(spawn_event(2, 200));

        queue.drop_client(1);

        assert_eq!(queue.events_for(1).count(), 0);
        assert_eq!(queue.events_for(2).count(), 1);
    }

    #[test]
    fn to_packet_renders_expected_variant() {
        let event = ReliableEvent::DestroyProjectile {
            target_client: 1,
            subject_id: 42,
        };
        assert_eq!(event.to_packet(), Packet::ProjectileDestroy { id: 42 });
    }
}
