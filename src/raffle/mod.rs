mod derangement;
mod hub;
pub mod protocol;
mod registry;
pub mod room;
mod server;
mod sweeper;

pub use derangement::{derange, draw};
pub use hub::{ConnectionHub, EventSender};
pub use protocol::{ClientEvent, ServerEvent};
pub use registry::{Disconnect, RoomRegistry};
pub use room::{Assignment, ConnectionId, Participant, Room, RoomStatus};
pub use server::RaffleServer;
pub use sweeper::spawn_expiry_sweeper;
