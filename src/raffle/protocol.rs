use serde::{Deserialize, Serialize};

use super::room::{ConnectionId, Participant, Room, RoomStatus};
use crate::error::Result;

pub const KICKED_NOTICE: &str = "Çekiliş yöneticisi tarafından çıkarıldınız.";
pub const EXPIRED_NOTICE: &str = "Çekilişin süresi doldu ve kapatıldı.";
pub const CLOSED_BY_OPERATOR_NOTICE: &str = "Bu çekiliş sistem yöneticisi tarafından kapatıldı.";
pub const ROOM_DELETED_ACK: &str = "Çekiliş silindi.";

/// Events sent by clients
///
/// On the wire: `{"event": "join_raffle", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Case-insensitive room id filter; empty lists every waiting room
    SearchRaffles(String),

    CreateRaffle(CreateRaffle),

    JoinRaffle(JoinRaffle),

    KickParticipant(KickParticipant),

    /// Room id
    StartRaffle(String),

    /// Operator passphrase
    SystemAdminLogin(String),

    /// Room id
    SystemAdminDelete(String),
}

impl ClientEvent {
    pub fn parse(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRaffle {
    pub room_id: String,
    pub password: String,
    pub admin_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRaffle {
    pub room_id: String,
    pub password: String,
    pub participant_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KickParticipant {
    pub room_id: String,
    pub target_connection_id: ConnectionId,
}

/// Events sent by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// First event on every connection
    Connected(Connected),

    SearchResults(Vec<RoomSummary>),

    RaffleCreated(RoomSnapshot),

    RaffleJoined(RaffleJoined),

    UpdateParticipants(Vec<Participant>),

    RaffleUpdated(RaffleUpdated),

    Kicked(String),

    RaffleStarted,

    RaffleResult(RaffleResult),

    SystemAdminAuthenticated(Vec<RoomOverview>),

    SystemAdminActionSuccess(String),

    Error(String),
}

impl ServerEvent {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connected {
    pub connection_id: ConnectionId,
}

/// Public search hit: never exposes passwords or members
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: String,
    pub participant_count: usize,
}

/// Operator listing entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomOverview {
    pub room_id: String,
    pub participant_count: usize,
    pub status: RoomStatus,
    /// Milliseconds since the Unix epoch
    pub created_at: u64,
}

/// Room state sent to its creator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: String,
    pub admin_connection_id: ConnectionId,
    pub participants: Vec<Participant>,
    pub status: RoomStatus,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaffleJoined {
    pub room_id: String,
    pub participants: Vec<Participant>,
    pub admin_connection_id: ConnectionId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaffleUpdated {
    pub participants: Vec<Participant>,
    pub admin_connection_id: ConnectionId,
}

/// Private result: only the recipient's display name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaffleResult {
    pub target_name: String,
}

impl From<&Room> for RoomSummary {
    fn from(room: &Room) -> Self {
        Self {
            room_id: room.id().to_string(),
            participant_count: room.participant_count(),
        }
    }
}

impl From<&Room> for RoomOverview {
    fn from(room: &Room) -> Self {
        Self {
            room_id: room.id().to_string(),
            participant_count: room.participant_count(),
            status: room.status(),
            created_at: room.created_at_millis(),
        }
    }
}

impl From<&Room> for RoomSnapshot {
    fn from(room: &Room) -> Self {
        Self {
            room_id: room.id().to_string(),
            admin_connection_id: room.admin_id().clone(),
            participants: room.participants().to_vec(),
            status: room.status(),
            created_at: room.created_at_millis(),
        }
    }
}

impl From<&Room> for RaffleJoined {
    fn from(room: &Room) -> Self {
        Self {
            room_id: room.id().to_string(),
            participants: room.participants().to_vec(),
            admin_connection_id: room.admin_id().clone(),
        }
    }
}

impl From<&Room> for RaffleUpdated {
    fn from(room: &Room) -> Self {
        Self {
            participants: room.participants().to_vec(),
            admin_connection_id: room.admin_id().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn test_parse_join_raffle() {
        let text = r#"{"event":"join_raffle","data":{"roomId":"R1","password":"p","participantName":"Bob"}}"#;
        let event = ClientEvent::parse(text).unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinRaffle(JoinRaffle {
                room_id: "R1".to_string(),
                password: "p".to_string(),
                participant_name: "Bob".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_string_payloads() {
        let event = ClientEvent::parse(r#"{"event":"start_raffle","data":"R1"}"#).unwrap();
        assert_eq!(event, ClientEvent::StartRaffle("R1".to_string()));

        let event = ClientEvent::parse(r#"{"event":"search_raffles","data":""}"#).unwrap();
        assert_eq!(event, ClientEvent::SearchRaffles(String::new()));
    }

    #[test]
    fn test_parse_kick_uses_connection_id() {
        let text = r#"{"event":"kick_participant","data":{"roomId":"R1","targetConnectionId":"abc"}}"#;
        match ClientEvent::parse(text).unwrap() {
            ClientEvent::KickParticipant(kick) => {
                assert_eq!(kick.target_connection_id, ConnectionId::from("abc"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_event() {
        assert!(ClientEvent::parse(r#"{"event":"steal_gifts","data":"R1"}"#).is_err());
        assert!(ClientEvent::parse("not json").is_err());
    }

    #[test]
    fn test_server_event_wire_shape() {
        let event = ServerEvent::RaffleResult(RaffleResult {
            target_name: "Bob".to_string(),
        });
        let value: serde_json::Value = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"event": "raffle_result", "data": {"targetName": "Bob"}}));

        let value: serde_json::Value =
            serde_json::from_str(&ServerEvent::RaffleStarted.to_json().unwrap()).unwrap();
        assert_eq!(value, json!({"event": "raffle_started"}));
    }

    #[test]
    fn test_snapshot_hides_password() {
        let created = UNIX_EPOCH + Duration::from_millis(1_700_000_000_000);
        let room = Room::new(
            "R1",
            "secret",
            Participant::new(ConnectionId::from("a"), "Alice"),
            created,
        );

        let value = serde_json::to_value(RoomSnapshot::from(&room)).unwrap();
        assert_eq!(
            value,
            json!({
                "roomId": "R1",
                "adminConnectionId": "a",
                "participants": [{"connectionId": "a", "displayName": "Alice"}],
                "status": "waiting",
                "createdAt": 1_700_000_000_000u64,
            })
        );
        assert!(!value.to_string().contains("secret"));
    }

    #[test]
    fn test_server_event_round_trip_for_clients() {
        let event = ServerEvent::error("Hatalı şifre.");
        let parsed: ServerEvent = serde_json::from_str(&event.to_json().unwrap()).unwrap();
        assert_eq!(parsed, event);
    }
}
