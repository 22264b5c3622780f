use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::SystemTime;

use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::hub::{ConnectionHub, EventSender};
use super::protocol::{
    ClientEvent, Connected, CreateRaffle, JoinRaffle, KickParticipant, RaffleJoined,
    RaffleResult, RaffleUpdated, RoomSnapshot, ServerEvent, CLOSED_BY_OPERATOR_NOTICE,
    EXPIRED_NOTICE, KICKED_NOTICE, ROOM_DELETED_ACK,
};
use super::registry::{Disconnect, RoomRegistry};
use super::room::ConnectionId;
use crate::config::RaffleLimits;
use crate::error::RaffleError;

/// Everything mutable, guarded by one lock so that handlers, draw callbacks
/// and sweeps run one at a time and to completion.
struct RaffleState {
    registry: RoomRegistry,
    hub: ConnectionHub,
    /// Connections that passed the operator login
    operators: HashSet<ConnectionId>,
    /// Scheduled draw completions keyed by room id
    pending_draws: HashMap<String, JoinHandle<()>>,
}

impl RaffleState {
    fn reject(&self, connection_id: &ConnectionId, error: RaffleError) {
        if error.is_validation() {
            tracing::debug!(connection_id = %connection_id, error = %error, "Request rejected");
        } else {
            tracing::warn!(connection_id = %connection_id, error = %error, "Request failed");
        }
        self.hub.send(connection_id, ServerEvent::error(error.to_string()));
    }

    fn cancel_draw(&mut self, room_id: &str) {
        if let Some(handle) = self.pending_draws.remove(room_id) {
            handle.abort();
            tracing::debug!(room_id = %room_id, "Pending draw cancelled");
        }
    }

    /// Notify the room with `notice` and forget everything about it
    fn close_room(&mut self, room_id: &str, notice: &str) {
        self.hub.broadcast(room_id, &ServerEvent::error(notice));
        self.hub.dissolve(room_id);
        self.registry.remove(room_id);
        self.cancel_draw(room_id);
    }

    fn broadcast_participants(&self, room_id: &str) {
        if let Some(room) = self.registry.get(room_id) {
            self.hub.broadcast(
                room_id,
                &ServerEvent::UpdateParticipants(room.participants().to_vec()),
            );
        }
    }

    fn complete_draw(&mut self, room_id: &str) {
        let assignments = match self.registry.finish_draw(room_id, &mut rand::thread_rng()) {
            Some(assignments) => assignments,
            None => {
                tracing::debug!(room_id = %room_id, "Draw fired for a room that is no longer drawing");
                return;
            }
        };

        let mut delivered = 0;
        for assignment in &assignments {
            let result = ServerEvent::RaffleResult(RaffleResult {
                target_name: assignment.to.display_name.clone(),
            });
            if self.hub.send(&assignment.from.connection_id, result) {
                delivered += 1;
            }
        }

        tracing::info!(
            room_id = %room_id,
            participants = assignments.len(),
            delivered,
            "Raffle finished"
        );
    }
}

/// Raffle room coordinator shared by every connection
pub struct RaffleServer {
    state: Arc<Mutex<RaffleState>>,
    limits: RaffleLimits,
}

impl RaffleServer {
    pub fn new(limits: RaffleLimits) -> Self {
        let state = RaffleState {
            registry: RoomRegistry::from_limits(&limits),
            hub: ConnectionHub::new(),
            operators: HashSet::new(),
            pending_draws: HashMap::new(),
        };

        Self {
            state: Arc::new(Mutex::new(state)),
            limits,
        }
    }

    pub fn limits(&self) -> &RaffleLimits {
        &self.limits
    }

    pub async fn room_count(&self) -> usize {
        self.state.lock().await.registry.len()
    }

    /// Register a new connection and tell it its id
    pub async fn connect(&self, sender: EventSender) -> ConnectionId {
        let mut state = self.state.lock().await;

        let mut connection_id = ConnectionId::generate();
        while state.hub.is_connected(&connection_id) {
            connection_id = ConnectionId::generate();
        }

        state.hub.register(connection_id.clone(), sender);
        state.hub.send(
            &connection_id,
            ServerEvent::Connected(Connected {
                connection_id: connection_id.clone(),
            }),
        );

        tracing::info!(connection_id = %connection_id, "Connection opened");
        connection_id
    }

    pub async fn handle_event(&self, connection_id: &ConnectionId, event: ClientEvent) {
        match event {
            ClientEvent::SearchRaffles(query) => self.search_raffles(connection_id, &query).await,
            ClientEvent::CreateRaffle(request) => self.create_raffle(connection_id, request).await,
            ClientEvent::JoinRaffle(request) => self.join_raffle(connection_id, request).await,
            ClientEvent::KickParticipant(request) => {
                self.kick_participant(connection_id, request).await
            }
            ClientEvent::StartRaffle(room_id) => self.start_raffle(connection_id, &room_id).await,
            ClientEvent::SystemAdminLogin(secret) => {
                self.operator_login(connection_id, &secret).await
            }
            ClientEvent::SystemAdminDelete(room_id) => {
                self.operator_delete(connection_id, &room_id).await
            }
        }
    }

    pub async fn search_raffles(&self, connection_id: &ConnectionId, query: &str) {
        let state = self.state.lock().await;
        let results = state.registry.search(query);
        state
            .hub
            .send(connection_id, ServerEvent::SearchResults(results));
    }

    pub async fn create_raffle(&self, connection_id: &ConnectionId, request: CreateRaffle) {
        let mut state = self.state.lock().await;

        let created = state.registry.create_room(
            &request.room_id,
            &request.password,
            &request.admin_name,
            connection_id,
            SystemTime::now(),
        );
        let snapshot = match created {
            Ok(room) => RoomSnapshot::from(room),
            Err(e) => return state.reject(connection_id, e),
        };

        state.hub.subscribe(&request.room_id, connection_id);
        state
            .hub
            .send(connection_id, ServerEvent::RaffleCreated(snapshot));
    }

    pub async fn join_raffle(&self, connection_id: &ConnectionId, request: JoinRaffle) {
        let mut state = self.state.lock().await;

        let joined = state.registry.join_room(
            &request.room_id,
            &request.password,
            &request.participant_name,
            connection_id,
        );
        let joined = match joined {
            Ok(room) => RaffleJoined::from(room),
            Err(e) => return state.reject(connection_id, e),
        };

        state.hub.subscribe(&request.room_id, connection_id);
        state
            .hub
            .send(connection_id, ServerEvent::RaffleJoined(joined));
        state.broadcast_participants(&request.room_id);
    }

    /// Silently ignored unless the requester is the room's admin
    pub async fn kick_participant(&self, connection_id: &ConnectionId, request: KickParticipant) {
        let mut state = self.state.lock().await;

        let kicked = state.registry.kick_participant(
            &request.room_id,
            &request.target_connection_id,
            connection_id,
        );
        let Some(kicked) = kicked else {
            tracing::debug!(
                room_id = %request.room_id,
                connection_id = %connection_id,
                "Kick ignored"
            );
            return;
        };

        state.hub.unsubscribe(&request.room_id, &kicked.connection_id);
        state.hub.send(
            &kicked.connection_id,
            ServerEvent::Kicked(KICKED_NOTICE.to_string()),
        );
        state.broadcast_participants(&request.room_id);
    }

    /// Silently ignored unless the requester is the room's admin
    pub async fn start_raffle(&self, connection_id: &ConnectionId, room_id: &str) {
        let mut state = self.state.lock().await;

        match state.registry.start_raffle(room_id, connection_id) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(room_id = %room_id, connection_id = %connection_id, "Start ignored");
                return;
            }
            Err(e) => return state.reject(connection_id, e),
        }

        state.hub.broadcast(room_id, &ServerEvent::RaffleStarted);
        tracing::info!(room_id = %room_id, delay = ?self.limits.draw_delay, "Raffle drawing");

        let shared = Arc::clone(&self.state);
        let delay = self.limits.draw_delay;
        let key = room_id.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = shared.lock().await;
            state.pending_draws.remove(&key);
            state.complete_draw(&key);
        });
        state.pending_draws.insert(room_id.to_string(), handle);
    }

    pub async fn operator_login(&self, connection_id: &ConnectionId, secret: &str) {
        let mut state = self.state.lock().await;

        let expected = self.limits.operator_passphrase.as_bytes();
        let authenticated: bool = secret.as_bytes().ct_eq(expected).into();
        if !authenticated {
            tracing::warn!(connection_id = %connection_id, "Operator login failed");
            return state.reject(connection_id, RaffleError::Unauthorized);
        }

        state.operators.insert(connection_id.clone());
        let overview = state.registry.overview();
        state
            .hub
            .send(connection_id, ServerEvent::SystemAdminAuthenticated(overview));
        tracing::info!(connection_id = %connection_id, "Operator authenticated");
    }

    pub async fn operator_delete(&self, connection_id: &ConnectionId, room_id: &str) {
        let mut state = self.state.lock().await;

        if !state.operators.contains(connection_id) {
            return state.reject(connection_id, RaffleError::OperatorLoginRequired);
        }
        if !state.registry.contains(room_id) {
            tracing::debug!(room_id = %room_id, "Operator delete of unknown room ignored");
            return;
        }

        state.close_room(room_id, CLOSED_BY_OPERATOR_NOTICE);
        state.hub.send(
            connection_id,
            ServerEvent::SystemAdminActionSuccess(ROOM_DELETED_ACK.to_string()),
        );
        tracing::info!(room_id = %room_id, operator = %connection_id, "Room deleted by operator");
    }

    /// Connection lost: leave every room, hand over admin, delete empty rooms
    pub async fn disconnect(&self, connection_id: &ConnectionId) {
        let mut state = self.state.lock().await;

        state.hub.unregister(connection_id);
        state.operators.remove(connection_id);

        for change in state.registry.remove_connection(connection_id) {
            match change {
                Disconnect::RoomClosed { room_id } => {
                    state.hub.dissolve(&room_id);
                    state.cancel_draw(&room_id);
                }
                Disconnect::Left { room_id, departure } => {
                    tracing::info!(
                        room_id = %room_id,
                        participant = %departure.participant.display_name,
                        new_admin = ?departure.new_admin.as_ref().map(ConnectionId::as_str),
                        "Participant left"
                    );
                    let Some(room) = state.registry.get(&room_id) else {
                        continue;
                    };
                    let updated = RaffleUpdated::from(room);
                    state.hub.broadcast(
                        &room_id,
                        &ServerEvent::UpdateParticipants(updated.participants.clone()),
                    );
                    state
                        .hub
                        .broadcast(&room_id, &ServerEvent::RaffleUpdated(updated));
                }
            }
        }

        tracing::info!(connection_id = %connection_id, "Connection closed");
    }

    /// Evict every room older than the configured time-to-live
    pub async fn sweep_expired(&self, now: SystemTime) -> Vec<String> {
        let mut state = self.state.lock().await;

        let expired = state.registry.take_expired(now, self.limits.room_ttl);
        let mut room_ids = Vec::with_capacity(expired.len());
        for room in expired {
            let room_id = room.id().to_string();
            tracing::info!(
                room_id = %room_id,
                status = %room.status(),
                participants = room.participant_count(),
                "Room expired and deleted"
            );
            state.close_room(&room_id, EXPIRED_NOTICE);
            room_ids.push(room_id);
        }
        room_ids
    }
}
