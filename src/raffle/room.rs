use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::derangement;
use crate::error::{RaffleError, Result};

const CONNECTION_ID_LEN: usize = 20;

/// Transient identifier of one live connection
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Generate a random connection ID
    pub fn generate() -> Self {
        let id = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(CONNECTION_ID_LEN)
            .map(char::from)
            .collect();
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ConnectionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for ConnectionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub connection_id: ConnectionId,
    pub display_name: String,
}

impl Participant {
    pub fn new(connection_id: ConnectionId, display_name: impl Into<String>) -> Self {
        Self {
            connection_id,
            display_name: display_name.into(),
        }
    }
}

/// `from` gifts `to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub from: Participant,
    pub to: Participant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Drawing,
    Finished,
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            RoomStatus::Waiting => "waiting",
            RoomStatus::Drawing => "drawing",
            RoomStatus::Finished => "finished",
        };
        f.pad(status)
    }
}

/// Lifecycle of a room together with the data each stage owns.
#[derive(Debug, Clone)]
enum Phase {
    Waiting,
    /// Participants captured when the draw was started
    Drawing { roster: Vec<Participant> },
    Finished { assignments: Vec<Assignment> },
}

/// What happened to a room when one of its members left
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub participant: Participant,
    /// Set when the departing member was admin and someone was promoted
    pub new_admin: Option<ConnectionId>,
}

#[derive(Debug, Clone)]
pub struct Room {
    id: String,
    password: String,
    admin_id: ConnectionId,
    participants: Vec<Participant>,
    phase: Phase,
    created_at: SystemTime,
}

impl Room {
    /// Create a waiting room whose only participant is its admin
    pub fn new(
        id: impl Into<String>,
        password: impl Into<String>,
        admin: Participant,
        created_at: SystemTime,
    ) -> Self {
        Self {
            id: id.into(),
            password: password.into(),
            admin_id: admin.connection_id.clone(),
            participants: vec![admin],
            phase: Phase::Waiting,
            created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn admin_id(&self) -> &ConnectionId {
        &self.admin_id
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Creation time as milliseconds since the Unix epoch
    pub fn created_at_millis(&self) -> u64 {
        self.created_at
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }

    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.created_at).unwrap_or_default()
    }

    pub fn is_expired(&self, now: SystemTime, ttl: Duration) -> bool {
        self.age(now) > ttl
    }

    pub fn status(&self) -> RoomStatus {
        match self.phase {
            Phase::Waiting => RoomStatus::Waiting,
            Phase::Drawing { .. } => RoomStatus::Drawing,
            Phase::Finished { .. } => RoomStatus::Finished,
        }
    }

    pub fn assignments(&self) -> Option<&[Assignment]> {
        match &self.phase {
            Phase::Finished { assignments } => Some(assignments),
            _ => None,
        }
    }

    pub fn is_member(&self, connection_id: &ConnectionId) -> bool {
        self.participants
            .iter()
            .any(|p| &p.connection_id == connection_id)
    }

    pub fn is_admin(&self, connection_id: &ConnectionId) -> bool {
        &self.admin_id == connection_id
    }

    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.participants
            .iter()
            .map(|p| p.connection_id.clone())
            .collect()
    }

    /// Check whether `connection_id` may join under `display_name`
    ///
    /// Nothing is mutated, so a rejected join leaves the room untouched.
    pub fn check_join(
        &self,
        password: &str,
        display_name: &str,
        connection_id: &ConnectionId,
        max_participants: usize,
    ) -> Result<()> {
        if self.password != password {
            return Err(RaffleError::WrongPassword);
        }
        if self.status() != RoomStatus::Waiting {
            return Err(RaffleError::RoomNotWaiting(self.id.clone()));
        }
        if self.participants.len() >= max_participants {
            return Err(RaffleError::RoomFull(max_participants));
        }
        if self.participants.iter().any(|p| p.display_name == display_name) {
            return Err(RaffleError::DuplicateName(display_name.to_string()));
        }
        if self.is_member(connection_id) {
            return Err(RaffleError::AlreadyMember(self.id.clone()));
        }
        if display_name.trim().is_empty() {
            return Err(RaffleError::MissingField("İsim"));
        }
        Ok(())
    }

    /// Append a participant previously accepted by `check_join`
    pub fn add_participant(&mut self, participant: Participant) {
        self.participants.push(participant);
    }

    /// Remove `target` on behalf of `requester`
    ///
    /// Returns `None` without touching anything unless the requester is the
    /// admin, the room is waiting and the target is a non-admin member.
    pub fn kick(&mut self, target: &ConnectionId, requester: &ConnectionId) -> Option<Participant> {
        if !self.is_admin(requester) || self.is_admin(target) {
            return None;
        }
        if self.status() != RoomStatus::Waiting {
            return None;
        }
        let index = self
            .participants
            .iter()
            .position(|p| &p.connection_id == target)?;
        Some(self.participants.remove(index))
    }

    /// Remove a member who left, promoting the first remaining member when
    /// the admin is the one leaving
    pub fn remove_participant(&mut self, connection_id: &ConnectionId) -> Option<Departure> {
        let index = self
            .participants
            .iter()
            .position(|p| &p.connection_id == connection_id)?;
        let participant = self.participants.remove(index);

        let mut new_admin = None;
        if self.is_admin(connection_id) {
            if let Some(first) = self.participants.first() {
                self.admin_id = first.connection_id.clone();
                new_admin = Some(first.connection_id.clone());
            }
        }

        Some(Departure {
            participant,
            new_admin,
        })
    }

    /// Move from waiting to drawing
    ///
    /// Returns `Ok(false)` when the request is silently ignored: the
    /// requester is not the admin or the room is no longer waiting.
    pub fn begin_draw(&mut self, requester: &ConnectionId) -> Result<bool> {
        if !self.is_admin(requester) || self.status() != RoomStatus::Waiting {
            return Ok(false);
        }
        if self.participants.len() < 2 {
            return Err(RaffleError::NotEnoughParticipants(self.participants.len()));
        }

        self.phase = Phase::Drawing {
            roster: self.participants.clone(),
        };
        Ok(true)
    }

    /// Compute assignments for the roster captured by `begin_draw`
    ///
    /// Returns `None` if the room is not drawing.
    pub fn finish_draw<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<&[Assignment]> {
        let roster = match &self.phase {
            Phase::Drawing { roster } => roster,
            _ => return None,
        };

        let assignments = derangement::draw(roster, rng);
        self.phase = Phase::Finished { assignments };
        self.assignments()
    }
}
