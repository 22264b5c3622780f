//! Gift-exchange raffle rooms over WebSocket.
//!
//! Participants join a password-protected room, the room admin starts a
//! draw, and after a short delay every participant privately learns whom
//! they gift. Nobody is ever assigned to themselves.

pub mod api;
pub mod config;
pub mod error;
pub mod raffle;
