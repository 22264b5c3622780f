pub mod raffle_routes;
pub mod raffle_websocket;

pub use raffle_routes::routes;
