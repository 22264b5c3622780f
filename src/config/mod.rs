use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use crate::error::{RaffleError, Result};

/// Maximum number of rooms alive at the same time
pub const MAX_ROOMS: usize = 5;

/// Maximum number of participants in one room
pub const MAX_PARTICIPANTS: usize = 100;

/// Rooms are evicted this long after creation, whatever their status
pub const ROOM_TTL: Duration = Duration::from_secs(30 * 60);

/// How often the expiry sweeper runs
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Delay between `start_raffle` and the announcement of results
pub const DRAW_DELAY: Duration = Duration::from_secs(5);

/// Static operator console passphrase
pub const DEFAULT_OPERATOR_PASSPHRASE: &str = "admin123";

pub struct Config {
    pub server: ServerConfig,
    pub raffle: RaffleLimits,
}

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Limits and timings injected into the raffle server
#[derive(Debug, Clone)]
pub struct RaffleLimits {
    pub max_rooms: usize,
    pub max_participants: usize,
    pub room_ttl: Duration,
    pub sweep_interval: Duration,
    pub draw_delay: Duration,
    pub operator_passphrase: String,
}

impl Default for RaffleLimits {
    fn default() -> Self {
        Self {
            max_rooms: MAX_ROOMS,
            max_participants: MAX_PARTICIPANTS,
            room_ttl: ROOM_TTL,
            sweep_interval: SWEEP_INTERVAL,
            draw_delay: DRAW_DELAY,
            operator_passphrase: DEFAULT_OPERATOR_PASSPHRASE.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let port = env::var("SERVER_PORT").unwrap_or_else(|_| "3001".to_string());
        let port = port
            .parse()
            .map_err(|_| RaffleError::configuration(format!("Invalid SERVER_PORT: {}", port)))?;

        let mut raffle = RaffleLimits::default();
        if let Ok(passphrase) = env::var("OPERATOR_PASSPHRASE") {
            if passphrase.is_empty() {
                return Err(RaffleError::configuration("OPERATOR_PASSPHRASE is empty"));
            }
            raffle.operator_passphrase = passphrase;
        }

        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port,
            },
            raffle,
        })
    }

    pub fn bind_address(&self) -> ([u8; 4], u16) {
        let ip_addr = self.parse_host_to_ipv4();
        (ip_addr.octets(), self.server.port)
    }

    fn parse_host_to_ipv4(&self) -> Ipv4Addr {
        if let Ok(addr) = self.server.host.parse::<IpAddr>() {
            match addr {
                IpAddr::V4(ipv4) => return ipv4,
                IpAddr::V6(_) => {
                    tracing::warn!(
                        host = %self.server.host,
                        "IPv6 address provided but only IPv4 supported, using 0.0.0.0"
                    );
                    return Ipv4Addr::UNSPECIFIED;
                }
            }
        }

        match self.server.host.as_str() {
            "localhost" => Ipv4Addr::LOCALHOST,
            "" | "0.0.0.0" => Ipv4Addr::UNSPECIFIED,
            _ => {
                tracing::warn!(
                    host = %self.server.host,
                    "Unable to parse host as IPv4, using 0.0.0.0"
                );
                Ipv4Addr::UNSPECIFIED
            }
        }
    }
}
