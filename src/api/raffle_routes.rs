use std::sync::Arc;
use warp::Filter;

use super::raffle_websocket;
use crate::raffle::RaffleServer;

/// Every HTTP and WebSocket route served under `/raffle`
pub fn routes(
    raffle_server: Arc<RaffleServer>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    raffle_health_check(raffle_server.clone())
        .or(raffle_config_endpoint(raffle_server.clone()))
        .or(raffle_websocket_route(raffle_server))
}

pub fn raffle_websocket_route(
    raffle_server: Arc<RaffleServer>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("raffle")
        .and(warp::path::end())
        .and(warp::ws())
        .and(with_raffle_server(raffle_server))
        .map(|ws: warp::ws::Ws, raffle_server: Arc<RaffleServer>| {
            ws.on_upgrade(move |websocket| {
                raffle_websocket::handle_raffle_websocket(websocket, raffle_server)
            })
        })
}

pub fn raffle_health_check(
    raffle_server: Arc<RaffleServer>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("raffle")
        .and(warp::path("health"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_raffle_server(raffle_server))
        .then(|raffle_server: Arc<RaffleServer>| async move {
            warp::reply::json(&serde_json::json!({
                "status": "healthy",
                "service": "Raffle Server",
                "version": env!("CARGO_PKG_VERSION"),
                "rooms": raffle_server.room_count().await,
            }))
        })
}

/// Public limits, so clients can explain rejections before they happen
pub fn raffle_config_endpoint(
    raffle_server: Arc<RaffleServer>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path("raffle")
        .and(warp::path("config"))
        .and(warp::path::end())
        .and(warp::get())
        .and(with_raffle_server(raffle_server))
        .map(|raffle_server: Arc<RaffleServer>| {
            let limits = raffle_server.limits();
            warp::reply::json(&serde_json::json!({
                "maxRooms": limits.max_rooms,
                "maxParticipants": limits.max_participants,
                "roomTtlSecs": limits.room_ttl.as_secs(),
                "drawDelaySecs": limits.draw_delay.as_secs(),
            }))
        })
}

fn with_raffle_server(
    raffle_server: Arc<RaffleServer>,
) -> impl Filter<Extract = (Arc<RaffleServer>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || raffle_server.clone())
}
