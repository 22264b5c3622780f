use std::sync::Arc;

use raffle_server::config::Config;
use raffle_server::raffle::{spawn_expiry_sweeper, RaffleServer};
use raffle_server::api;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let raffle_server = Arc::new(RaffleServer::new(config.raffle.clone()));
    spawn_expiry_sweeper(raffle_server.clone());

    let routes = api::routes(raffle_server);

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "Raffle server listening"
    );

    warp::serve(routes)
        .run(config.bind_address())
        .await;
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").map(|v| v == "json").unwrap_or(false);

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
