use std::collections::{HashMap, HashSet};

use tokio::sync::mpsc;

use super::protocol::ServerEvent;
use super::room::ConnectionId;

/// Outbound half of a connection; the WebSocket writer task drains it
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Delivers events to single connections or to every subscriber of a room
#[derive(Default)]
pub struct ConnectionHub {
    connections: HashMap<ConnectionId, EventSender>,
    groups: HashMap<String, HashSet<ConnectionId>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, connection_id: ConnectionId, sender: EventSender) {
        self.connections.insert(connection_id, sender);
    }

    /// Forget a connection and drop it from every room group
    pub fn unregister(&mut self, connection_id: &ConnectionId) -> bool {
        self.groups.retain(|_, members| {
            members.remove(connection_id);
            !members.is_empty()
        });
        self.connections.remove(connection_id).is_some()
    }

    pub fn is_connected(&self, connection_id: &ConnectionId) -> bool {
        self.connections.contains_key(connection_id)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn subscribe(&mut self, room_id: &str, connection_id: &ConnectionId) {
        self.groups
            .entry(room_id.to_string())
            .or_default()
            .insert(connection_id.clone());
    }

    pub fn unsubscribe(&mut self, room_id: &str, connection_id: &ConnectionId) {
        if let Some(members) = self.groups.get_mut(room_id) {
            members.remove(connection_id);
            if members.is_empty() {
                self.groups.remove(room_id);
            }
        }
    }

    /// Drop a room's group entirely
    pub fn dissolve(&mut self, room_id: &str) {
        self.groups.remove(room_id);
    }

    pub fn subscribers(&self, room_id: &str) -> Vec<ConnectionId> {
        let mut members: Vec<ConnectionId> = self
            .groups
            .get(room_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default();
        members.sort();
        members
    }

    /// Best-effort unicast. Returns false if the event could not be queued.
    pub fn send(&self, connection_id: &ConnectionId, event: ServerEvent) -> bool {
        match self.connections.get(connection_id) {
            Some(sender) => {
                if sender.send(event).is_err() {
                    tracing::warn!(
                        connection_id = %connection_id,
                        "Dropping event for closed connection"
                    );
                    return false;
                }
                true
            }
            None => {
                tracing::debug!(
                    connection_id = %connection_id,
                    "Event undeliverable, connection is gone"
                );
                false
            }
        }
    }

    /// Send to every subscriber of `room_id`; returns how many were reached
    pub fn broadcast(&self, room_id: &str, event: &ServerEvent) -> usize {
        let Some(members) = self.groups.get(room_id) else {
            return 0;
        };

        members
            .iter()
            .filter(|id| self.send(id, event.clone()))
            .count()
    }
}
