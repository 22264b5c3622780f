use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use rand::Rng;

use super::protocol::{RoomOverview, RoomSummary};
use super::room::{Assignment, ConnectionId, Departure, Participant, Room, RoomStatus};
use crate::config::RaffleLimits;
use crate::error::{RaffleError, Result};

/// Effect of a connection loss on one room it belonged to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disconnect {
    /// The room became empty and was deleted
    RoomClosed { room_id: String },
    /// The room lives on without the departed member
    Left { room_id: String, departure: Departure },
}

/// All live rooms, keyed by room id
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    max_rooms: usize,
    max_participants: usize,
}

impl RoomRegistry {
    pub fn new(max_rooms: usize, max_participants: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            max_rooms,
            max_participants,
        }
    }

    pub fn from_limits(limits: &RaffleLimits) -> Self {
        Self::new(limits.max_rooms, limits.max_participants)
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Create a waiting room with the requester as admin
    pub fn create_room(
        &mut self,
        room_id: &str,
        password: &str,
        admin_name: &str,
        requester: &ConnectionId,
        now: SystemTime,
    ) -> Result<&Room> {
        if room_id.trim().is_empty() {
            return Err(RaffleError::MissingField("Çekiliş adı"));
        }
        if admin_name.trim().is_empty() {
            return Err(RaffleError::MissingField("İsim"));
        }
        if self.rooms.len() >= self.max_rooms {
            return Err(RaffleError::CapacityExceeded(self.max_rooms));
        }
        if self.rooms.contains_key(room_id) {
            return Err(RaffleError::DuplicateRoomId(room_id.to_string()));
        }

        let admin = Participant::new(requester.clone(), admin_name);
        let room = self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Room::new(room_id, password, admin, now));

        tracing::info!(room_id = %room_id, admin = %requester, "Room created");
        Ok(&*room)
    }

    /// Add the requester to an existing waiting room
    pub fn join_room(
        &mut self,
        room_id: &str,
        password: &str,
        display_name: &str,
        requester: &ConnectionId,
    ) -> Result<&Room> {
        let max_participants = self.max_participants;
        let room = self
            .rooms
            .get_mut(room_id)
            .ok_or_else(|| RaffleError::RoomNotFound(room_id.to_string()))?;

        room.check_join(password, display_name, requester, max_participants)?;
        room.add_participant(Participant::new(requester.clone(), display_name));

        tracing::info!(
            room_id = %room_id,
            connection_id = %requester,
            participants = room.participant_count(),
            "Participant joined room"
        );
        Ok(&*room)
    }

    /// Admin-only removal of another member. `None` means the request was ignored.
    pub fn kick_participant(
        &mut self,
        room_id: &str,
        target: &ConnectionId,
        requester: &ConnectionId,
    ) -> Option<Participant> {
        let kicked = self.rooms.get_mut(room_id)?.kick(target, requester)?;
        tracing::info!(
            room_id = %room_id,
            name = %kicked.display_name,
            "Participant kicked from room"
        );
        Some(kicked)
    }

    /// Returns `Ok(true)` when the room moved to drawing, `Ok(false)` when
    /// the request was silently ignored
    pub fn start_raffle(&mut self, room_id: &str, requester: &ConnectionId) -> Result<bool> {
        match self.rooms.get_mut(room_id) {
            Some(room) => room.begin_draw(requester),
            None => Ok(false),
        }
    }

    /// Complete a pending draw. `None` if the room is gone or not drawing.
    pub fn finish_draw<R: Rng + ?Sized>(
        &mut self,
        room_id: &str,
        rng: &mut R,
    ) -> Option<Vec<Assignment>> {
        let room = self.rooms.get_mut(room_id)?;
        if room.status() != RoomStatus::Drawing {
            return None;
        }
        room.finish_draw(rng).map(<[Assignment]>::to_vec)
    }

    /// Drop a lost connection from every room it belongs to
    pub fn remove_connection(&mut self, connection_id: &ConnectionId) -> Vec<Disconnect> {
        let mut changes = Vec::new();

        for (room_id, room) in self.rooms.iter_mut() {
            if let Some(departure) = room.remove_participant(connection_id) {
                tracing::info!(
                    room_id = %room_id,
                    connection_id = %connection_id,
                    "Connection removed from room"
                );
                if let Some(ref admin) = departure.new_admin {
                    tracing::info!(room_id = %room_id, admin = %admin, "New admin promoted");
                }
                changes.push(Disconnect::Left {
                    room_id: room_id.clone(),
                    departure,
                });
            }
        }

        for change in changes.iter_mut() {
            let room_id = match change {
                Disconnect::Left { room_id, .. } => room_id.clone(),
                Disconnect::RoomClosed { .. } => continue,
            };
            if self.rooms.get(&room_id).is_some_and(Room::is_empty) {
                self.rooms.remove(&room_id);
                tracing::info!(room_id = %room_id, "Room deleted (empty)");
                *change = Disconnect::RoomClosed { room_id };
            }
        }

        changes
    }

    pub fn remove(&mut self, room_id: &str) -> Option<Room> {
        self.rooms.remove(room_id)
    }

    /// Remove and return every room older than `ttl`
    pub fn take_expired(&mut self, now: SystemTime, ttl: Duration) -> Vec<Room> {
        let expired: Vec<String> = self
            .rooms
            .values()
            .filter(|room| room.is_expired(now, ttl))
            .map(|room| room.id().to_string())
            .collect();

        expired
            .iter()
            .filter_map(|room_id| self.rooms.remove(room_id))
            .collect()
    }

    /// Waiting rooms whose id contains `query`, ignoring case
    pub fn search(&self, query: &str) -> Vec<RoomSummary> {
        let query = query.to_lowercase();
        let mut results: Vec<RoomSummary> = self
            .rooms
            .values()
            .filter(|room| room.status() == RoomStatus::Waiting)
            .filter(|room| room.id().to_lowercase().contains(&query))
            .map(RoomSummary::from)
            .collect();
        results.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        results
    }

    /// Every room regardless of status, for the operator console
    pub fn overview(&self) -> Vec<RoomOverview> {
        let mut rooms: Vec<RoomOverview> = self.rooms.values().map(RoomOverview::from).collect();
        rooms.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        rooms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn conn(id: &str) -> ConnectionId {
        ConnectionId::from(id)
    }

    fn registry_with_room() -> RoomRegistry {
        let mut registry = RoomRegistry::new(5, 100);
        registry
            .create_room("R1", "p", "Alice", &conn("alice"), SystemTime::now())
            .unwrap();
        registry
    }

    #[test]
    fn test_create_room() {
        let registry = registry_with_room();
        let room = registry.get("R1").unwrap();
        assert_eq!(room.status(), RoomStatus::Waiting);
        assert_eq!(room.participants(), &[Participant::new(conn("alice"), "Alice")]);
        assert!(room.is_admin(&conn("alice")));
    }

    #[test]
    fn test_create_duplicate_room() {
        let mut registry = registry_with_room();
        let result = registry.create_room("R1", "x", "Eve", &conn("eve"), SystemTime::now());
        assert!(matches!(result, Err(RaffleError::DuplicateRoomId(_))));
        assert!(registry.get("R1").unwrap().is_admin(&conn("alice")));
    }

    #[test]
    fn test_capacity_limit() {
        let mut registry = RoomRegistry::new(2, 100);
        let now = SystemTime::now();
        registry.create_room("A", "p", "x", &conn("1"), now).unwrap();
        registry.create_room("B", "p", "x", &conn("2"), now).unwrap();

        let result = registry.create_room("C", "p", "x", &conn("3"), now);
        assert!(matches!(result, Err(RaffleError::CapacityExceeded(2))));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_capacity_checked_before_duplicate() {
        let mut registry = RoomRegistry::new(1, 100);
        let now = SystemTime::now();
        registry.create_room("A", "p", "x", &conn("1"), now).unwrap();
        let result = registry.create_room("A", "p", "x", &conn("2"), now);
        assert!(matches!(result, Err(RaffleError::CapacityExceeded(1))));
    }

    #[test]
    fn test_create_requires_names() {
        let mut registry = RoomRegistry::new(5, 100);
        let now = SystemTime::now();
        assert!(matches!(
            registry.create_room(" ", "p", "Alice", &conn("a"), now),
            Err(RaffleError::MissingField(_))
        ));
        assert!(matches!(
            registry.create_room("R1", "p", "", &conn("a"), now),
            Err(RaffleError::MissingField(_))
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_join_room() {
        let mut registry = registry_with_room();
        let room = registry.join_room("R1", "p", "Bob", &conn("bob")).unwrap();
        let names: Vec<_> = room.participants().iter().map(|p| p.display_name.as_str()).collect();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_join_errors_leave_room_unchanged() {
        let mut registry = registry_with_room();

        assert!(matches!(
            registry.join_room("nope", "p", "Bob", &conn("bob")),
            Err(RaffleError::RoomNotFound(_))
        ));
        assert!(matches!(
            registry.join_room("R1", "wrong", "Bob", &conn("bob")),
            Err(RaffleError::WrongPassword)
        ));
        assert!(matches!(
            registry.join_room("R1", "p", "Alice", &conn("bob")),
            Err(RaffleError::DuplicateName(_))
        ));
        assert_eq!(registry.get("R1").unwrap().participant_count(), 1);
    }

    #[test]
    fn test_join_full_room() {
        let mut registry = RoomRegistry::new(5, 2);
        registry
            .create_room("R1", "p", "Alice", &conn("alice"), SystemTime::now())
            .unwrap();
        registry.join_room("R1", "p", "Bob", &conn("bob")).unwrap();
        assert!(matches!(
            registry.join_room("R1", "p", "Carol", &conn("carol")),
            Err(RaffleError::RoomFull(2))
        ));
    }

    #[test]
    fn test_kick_ignored_for_unknown_room_or_non_admin() {
        let mut registry = registry_with_room();
        registry.join_room("R1", "p", "Bob", &conn("bob")).unwrap();

        assert!(registry.kick_participant("R2", &conn("bob"), &conn("alice")).is_none());
        assert!(registry.kick_participant("R1", &conn("alice"), &conn("bob")).is_none());
        assert_eq!(registry.get("R1").unwrap().participant_count(), 2);

        let kicked = registry.kick_participant("R1", &conn("bob"), &conn("alice"));
        assert_eq!(kicked.map(|p| p.display_name), Some("Bob".to_string()));
    }

    #[test]
    fn test_start_and_finish_draw() {
        let mut registry = registry_with_room();
        let mut rng = StdRng::seed_from_u64(5);

        assert!(matches!(
            registry.start_raffle("R1", &conn("alice")),
            Err(RaffleError::NotEnoughParticipants(1))
        ));
        assert!(!registry.start_raffle("missing", &conn("alice")).unwrap());

        registry.join_room("R1", "p", "Bob", &conn("bob")).unwrap();
        assert!(!registry.start_raffle("R1", &conn("bob")).unwrap());
        assert!(registry.start_raffle("R1", &conn("alice")).unwrap());

        let assignments = registry.finish_draw("R1", &mut rng).unwrap();
        assert_eq!(assignments.len(), 2);
        assert_eq!(registry.get("R1").unwrap().status(), RoomStatus::Finished);

        assert!(registry.finish_draw("R1", &mut rng).is_none());
        assert!(registry.finish_draw("missing", &mut rng).is_none());
    }

    #[test]
    fn test_disconnect_promotes_next_member() {
        let mut registry = registry_with_room();
        registry.join_room("R1", "p", "Bob", &conn("bob")).unwrap();

        let changes = registry.remove_connection(&conn("alice"));
        assert_eq!(changes.len(), 1);
        match &changes[0] {
            Disconnect::Left { room_id, departure } => {
                assert_eq!(room_id, "R1");
                assert_eq!(departure.new_admin, Some(conn("bob")));
            }
            other => panic!("unexpected change {:?}", other),
        }
        assert!(registry.get("R1").unwrap().is_admin(&conn("bob")));
    }

    #[test]
    fn test_last_disconnect_deletes_room() {
        let mut registry = registry_with_room();
        let changes = registry.remove_connection(&conn("alice"));
        assert_eq!(
            changes,
            vec![Disconnect::RoomClosed {
                room_id: "R1".to_string()
            }]
        );
        assert!(!registry.contains("R1"));
        assert!(registry.search("").is_empty());
    }

    #[test]
    fn test_disconnect_scans_every_room() {
        let mut registry = RoomRegistry::new(5, 100);
        let now = SystemTime::now();
        registry.create_room("A", "p", "Alice", &conn("alice"), now).unwrap();
        registry.create_room("B", "p", "Bob", &conn("bob"), now).unwrap();
        registry.join_room("B", "p", "Alice", &conn("alice")).unwrap();

        let changes = registry.remove_connection(&conn("alice"));
        assert_eq!(changes.len(), 2);
        assert!(!registry.contains("A"));
        assert_eq!(registry.get("B").unwrap().participant_count(), 1);

        assert!(registry.remove_connection(&conn("nobody")).is_empty());
    }

    #[test]
    fn test_search_filters_and_ignores_case() {
        let mut registry = RoomRegistry::new(5, 100);
        let now = SystemTime::now();
        registry.create_room("Office-Party", "p", "A", &conn("a"), now).unwrap();
        registry.create_room("family", "p", "B", &conn("b"), now).unwrap();
        registry.create_room("Party-Drawn", "p", "C", &conn("c"), now).unwrap();
        registry.join_room("Party-Drawn", "p", "D", &conn("d")).unwrap();
        registry.start_raffle("Party-Drawn", &conn("c")).unwrap();

        let hits = registry.search("PARTY");
        assert_eq!(
            hits,
            vec![RoomSummary {
                room_id: "Office-Party".to_string(),
                participant_count: 1,
            }]
        );
        assert_eq!(registry.search("").len(), 2);
        assert!(registry.search("zzz").is_empty());
    }

    #[test]
    fn test_overview_lists_every_status() {
        let mut registry = registry_with_room();
        registry.join_room("R1", "p", "Bob", &conn("bob")).unwrap();
        registry.start_raffle("R1", &conn("alice")).unwrap();
        registry
            .create_room("R2", "p", "Carol", &conn("carol"), SystemTime::now())
            .unwrap();

        let overview = registry.overview();
        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0].room_id, "R1");
        assert_eq!(overview[0].status, RoomStatus::Drawing);
        assert_eq!(overview[0].participant_count, 2);
        assert_eq!(overview[1].status, RoomStatus::Waiting);
    }

    #[test]
    fn test_take_expired() {
        let mut registry = RoomRegistry::new(5, 100);
        let start = SystemTime::now();
        let ttl = Duration::from_secs(30 * 60);
        registry.create_room("old", "p", "A", &conn("a"), start).unwrap();
        registry
            .create_room("new", "p", "B", &conn("b"), start + Duration::from_secs(20 * 60))
            .unwrap();

        let expired = registry.take_expired(start + Duration::from_secs(31 * 60), ttl);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id(), "old");
        assert!(registry.contains("new"));
        assert!(!registry.contains("old"));
    }

    #[test]
    fn test_take_expired_ignores_status() {
        let mut registry = RoomRegistry::new(5, 100);
        let mut rng = StdRng::seed_from_u64(11);
        let start = SystemTime::now();
        let ttl = Duration::from_secs(30 * 60);

        for (room_id, admin, guest) in [("drawing", "a", "b"), ("finished", "c", "d")] {
            registry.create_room(room_id, "p", admin, &conn(admin), start).unwrap();
            registry.join_room(room_id, "p", guest, &conn(guest)).unwrap();
            assert!(registry.start_raffle(room_id, &conn(admin)).unwrap());
        }
        registry.finish_draw("finished", &mut rng).unwrap();
        assert_eq!(registry.get("drawing").unwrap().status(), RoomStatus::Drawing);
        assert_eq!(registry.get("finished").unwrap().status(), RoomStatus::Finished);

        let mut expired: Vec<String> = registry
            .take_expired(start + Duration::from_secs(31 * 60), ttl)
            .iter()
            .map(|room| room.id().to_string())
            .collect();
        expired.sort();
        assert_eq!(expired, ["drawing", "finished"]);
        assert!(registry.is_empty());
    }
}
