// Raffle Server CLI Validation Tool
// Drives a running raffle server through its WebSocket protocol, either one
// command at a time or through scripted validation scenarios.

use clap::{Parser, Subcommand};
use colored::*;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use rand::Rng;
use std::io::{self, Write};
use tokio::net::TcpStream;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use raffle_server::raffle::protocol::{ClientEvent, CreateRaffle, JoinRaffle, ServerEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const REPLY_TIMEOUT: Duration = Duration::from_secs(3);
const DRAW_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "raffle-cli")]
#[command(about = "Raffle Server CLI Validation Tool", long_about = None)]
struct Cli {
    /// Server address (default: 127.0.0.1:3001)
    #[arg(short, long, default_value = "127.0.0.1:3001")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check server health endpoint
    Health,

    /// Show the server's public limits
    Config,

    /// Test WebSocket connection
    Connect,

    /// List waiting raffles whose name contains the query
    Search {
        /// Text to look for (empty lists everything)
        #[arg(default_value = "")]
        query: String,
    },

    /// Create a raffle and become its admin
    Create {
        #[arg(short, long)]
        room_id: String,

        #[arg(short, long)]
        password: String,

        /// Your display name
        #[arg(short, long)]
        name: String,

        /// Keep connection alive (press Ctrl+C to exit)
        #[arg(short, long)]
        keep_alive: bool,
    },

    /// Join an existing raffle
    Join {
        #[arg(short, long)]
        room_id: String,

        #[arg(short, long)]
        password: String,

        /// Your display name
        #[arg(short, long)]
        name: String,

        /// Keep connection alive to receive the draw result
        #[arg(short, long)]
        keep_alive: bool,
    },

    /// Log in to the operator console and list every raffle
    AdminLogin {
        #[arg(long)]
        secret: String,
    },

    /// Force-close a raffle as operator
    AdminDelete {
        #[arg(long)]
        secret: String,

        #[arg(short, long)]
        room_id: String,
    },

    /// Run automated validation scenarios
    Validate {
        /// Run all validation tests
        #[arg(short, long)]
        all: bool,

        /// Test specific scenario
        #[arg(short, long)]
        scenario: Option<String>,

        /// Operator passphrase for the operator scenario
        #[arg(long, default_value = "admin123")]
        secret: String,
    },

    /// Interactive mode - send custom messages
    Interactive,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match &cli.command {
        Commands::Health => check_health(&cli.server).await,
        Commands::Config => check_config(&cli.server).await,
        Commands::Connect => test_connection(&cli.server).await,
        Commands::Search { query } => search(&cli.server, query).await,
        Commands::Create {
            room_id,
            password,
            name,
            keep_alive,
        } => create_raffle(&cli.server, room_id, password, name, *keep_alive).await,
        Commands::Join {
            room_id,
            password,
            name,
            keep_alive,
        } => join_raffle(&cli.server, room_id, password, name, *keep_alive).await,
        Commands::AdminLogin { secret } => admin_login(&cli.server, secret).await,
        Commands::AdminDelete { secret, room_id } => {
            admin_delete(&cli.server, secret, room_id).await
        }
        Commands::Validate {
            all,
            scenario,
            secret,
        } => {
            if *all {
                run_all_validations(&cli.server, secret).await;
            } else if let Some(s) = scenario {
                run_scenario(&cli.server, secret, s).await;
            } else {
                println!("{}", "Use --all or --scenario <name>".yellow());
                list_scenarios();
            }
        }
        Commands::Interactive => interactive_mode(&cli.server).await,
    }
}

/// One WebSocket session speaking the raffle protocol
struct RaffleClient {
    connection_id: String,
    write: SplitSink<WsStream, Message>,
    read: SplitStream<WsStream>,
}

impl RaffleClient {
    async fn connect(server: &str) -> Result<Self, String> {
        let url = format!("ws://{}/raffle", server);
        let (ws_stream, _) = connect_async(&url).await.map_err(|e| e.to_string())?;
        let (write, read) = ws_stream.split();

        let mut client = Self {
            connection_id: String::new(),
            write,
            read,
        };
        match client.next_event(REPLY_TIMEOUT).await {
            Some(ServerEvent::Connected(connected)) => {
                client.connection_id = connected.connection_id.to_string();
                Ok(client)
            }
            Some(other) => Err(format!("expected connected event, got {:?}", other)),
            None => Err("no connected event".to_string()),
        }
    }

    async fn send(&mut self, event: &ClientEvent) -> bool {
        let Ok(text) = serde_json::to_string(event) else {
            return false;
        };
        self.write.send(Message::Text(text)).await.is_ok()
    }

    /// Next decodable server event, or `None` on timeout or close
    async fn next_event(&mut self, wait: Duration) -> Option<ServerEvent> {
        loop {
            match timeout(wait, self.read.next()).await {
                Ok(Some(Ok(Message::Text(text)))) => match serde_json::from_str(&text) {
                    Ok(event) => return Some(event),
                    Err(_) => println!("{} Undecodable frame: {}", "?".yellow(), text),
                },
                Ok(Some(Ok(Message::Close(_)))) | Ok(None) | Ok(Some(Err(_))) | Err(_) => {
                    return None
                }
                Ok(Some(Ok(_))) => continue,
            }
        }
    }

    /// Skip events until one satisfies `wanted`
    async fn wait_for<F>(&mut self, wait: Duration, wanted: F) -> Option<ServerEvent>
    where
        F: Fn(&ServerEvent) -> bool,
    {
        while let Some(event) = self.next_event(wait).await {
            if wanted(&event) {
                return Some(event);
            }
        }
        None
    }

    async fn create(&mut self, room_id: &str, password: &str, name: &str) -> Option<ServerEvent> {
        let event = ClientEvent::CreateRaffle(CreateRaffle {
            room_id: room_id.to_string(),
            password: password.to_string(),
            admin_name: name.to_string(),
        });
        if !self.send(&event).await {
            return None;
        }
        self.next_event(REPLY_TIMEOUT).await
    }

    async fn join(&mut self, room_id: &str, password: &str, name: &str) -> Option<ServerEvent> {
        let event = ClientEvent::JoinRaffle(JoinRaffle {
            room_id: room_id.to_string(),
            password: password.to_string(),
            participant_name: name.to_string(),
        });
        if !self.send(&event).await {
            return None;
        }
        self.next_event(REPLY_TIMEOUT).await
    }

    async fn search(&mut self, query: &str) -> Option<ServerEvent> {
        if !self.send(&ClientEvent::SearchRaffles(query.to_string())).await {
            return None;
        }
        self.wait_for(REPLY_TIMEOUT, |e| matches!(e, ServerEvent::SearchResults(_)))
            .await
    }

    async fn close(mut self) {
        let _ = self.write.send(Message::Close(None)).await;
    }
}

fn validation_room_id() -> String {
    let mut rng = rand::thread_rng();
    format!("validate-{:06}", rng.gen_range(100000..999999))
}

fn print_event(event: &ServerEvent) {
    match event {
        ServerEvent::Error(message) => println!("{} {}", "✗".red(), message.red()),
        ServerEvent::RaffleResult(result) => {
            println!("\n{}", "═".repeat(50).green());
            println!("{} {}", "You gift:".bold(), result.target_name.green().bold());
            println!("{}", "═".repeat(50).green());
        }
        ServerEvent::UpdateParticipants(participants) => {
            let names: Vec<&str> = participants.iter().map(|p| p.display_name.as_str()).collect();
            println!("{} Participants: {}", "◀".green(), names.join(", "));
        }
        other => {
            let text = serde_json::to_string(other).unwrap_or_default();
            println!("{} {}", "◀".green(), text.bright_white());
        }
    }
}

async fn check_health(server: &str) {
    println!("{}", "Checking server health...".cyan());

    let url = format!("http://{}/raffle/health", server);
    let client = reqwest::Client::new();

    match client.get(&url).send().await {
        Ok(resp) => {
            let status = resp.status();
            if status.is_success() {
                println!("{} Health check passed", "✓".green());

                if let Ok(body) = resp.json::<serde_json::Value>().await {
                    println!("  Status: {}", body["status"].as_str().unwrap_or("unknown"));
                    println!("  Service: {}", body["service"].as_str().unwrap_or("unknown"));
                    println!("  Version: {}", body["version"].as_str().unwrap_or("unknown"));
                    println!("  Rooms: {}", body["rooms"]);
                }
            } else {
                println!("{} Health check failed: {}", "✗".red(), status);
            }
        }
        Err(e) => {
            println!("{} Cannot connect to server: {}", "✗".red(), e);
            println!("  Make sure the server is running on {}", server);
        }
    }
}

async fn check_config(server: &str) {
    println!("{}", "Fetching server limits...".cyan());

    let url = format!("http://{}/raffle/config", server);
    let client = reqwest::Client::new();

    match client.get(&url).send().await {
        Ok(resp) => {
            if resp.status().is_success() {
                println!("{} Config endpoint accessible", "✓".green());

                if let Ok(body) = resp.json::<serde_json::Value>().await {
                    println!("\nLimits:");
                    println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
                }
            } else {
                println!("{} Config fetch failed: {}", "✗".red(), resp.status());
            }
        }
        Err(e) => {
            println!("{} Cannot connect to server: {}", "✗".red(), e);
        }
    }
}

async fn test_connection(server: &str) {
    println!("{}", "Testing WebSocket connection...".cyan());

    match RaffleClient::connect(server).await {
        Ok(client) => {
            println!("{} WebSocket connection established", "✓".green());
            println!("  Connection ID: {}", client.connection_id);
            client.close().await;
            println!("{} Connection closed cleanly", "✓".green());
        }
        Err(e) => {
            println!("{} WebSocket connection failed: {}", "✗".red(), e);
        }
    }
}

async fn search(server: &str, query: &str) {
    let mut client = match RaffleClient::connect(server).await {
        Ok(client) => client,
        Err(e) => {
            println!("{} Cannot connect to server: {}", "✗".red(), e);
            return;
        }
    };

    match client.search(query).await {
        Some(ServerEvent::SearchResults(results)) if results.is_empty() => {
            println!("{}", "No waiting raffles found.".yellow());
        }
        Some(ServerEvent::SearchResults(results)) => {
            println!("{}", "Waiting raffles:".bold());
            for result in results {
                println!("  {} ({} participants)", result.room_id.green(), result.participant_count);
            }
        }
        _ => println!("{} No search results received", "✗".red()),
    }
    client.close().await;
}

/// Print everything the server sends until the connection ends
async fn listen(client: &mut RaffleClient) {
    println!("\n{}", "Connection is being kept alive...".yellow());
    println!("Press {} to disconnect.", "Ctrl+C".bold());

    loop {
        match timeout(Duration::from_secs(30), client.read.next()).await {
            Ok(Some(Ok(Message::Text(text)))) => match serde_json::from_str::<ServerEvent>(&text) {
                Ok(event) => print_event(&event),
                Err(_) => println!("{} {}", "◀".green(), text.bright_white()),
            },
            Ok(Some(Ok(Message::Close(_)))) => {
                println!("{} Server closed the connection", "✗".yellow());
                break;
            }
            Ok(Some(Ok(_))) => continue,
            Ok(Some(Err(e))) => {
                println!("{} Connection error: {}", "✗".red(), e);
                break;
            }
            Ok(None) => {
                println!("{} Connection closed", "✗".yellow());
                break;
            }
            // Timeout - just continue listening
            Err(_) => continue,
        }
    }
}

async fn create_raffle(server: &str, room_id: &str, password: &str, name: &str, keep_alive: bool) {
    println!("{}", "Creating raffle...".cyan());
    println!("  Room ID: {}", room_id);
    println!("  Admin: {}", name);

    let mut client = match RaffleClient::connect(server).await {
        Ok(client) => client,
        Err(e) => {
            println!("{} Cannot connect to server: {}", "✗".red(), e);
            return;
        }
    };

    match client.create(room_id, password, name).await {
        Some(ServerEvent::RaffleCreated(snapshot)) => {
            println!("{} Raffle created successfully!", "✓".green());
            println!("\n{}", "═".repeat(50).green());
            println!("{} {}", "Room ID:".bold(), snapshot.room_id.green().bold());
            println!("{} {}", "Admin connection:".bold(), snapshot.admin_connection_id);
            println!("{}", "═".repeat(50).green());
        }
        Some(event) => {
            print_event(&event);
            return;
        }
        None => {
            println!("{} Timeout waiting for response", "✗".red());
            return;
        }
    }

    if keep_alive {
        listen(&mut client).await;
    } else {
        println!("\n{}", "⚠ Note: Connection closed. Raffle will be deleted.".yellow());
        println!("Use {} to keep the raffle active.", "--keep-alive".cyan());
        client.close().await;
    }
}

async fn join_raffle(server: &str, room_id: &str, password: &str, name: &str, keep_alive: bool) {
    println!("{}", "Joining raffle...".cyan());
    println!("  Room ID: {}", room_id);
    println!("  Name: {}", name);

    let mut client = match RaffleClient::connect(server).await {
        Ok(client) => client,
        Err(e) => {
            println!("{} Cannot connect: {}", "✗".red(), e);
            return;
        }
    };

    match client.join(room_id, password, name).await {
        Some(ServerEvent::RaffleJoined(joined)) => {
            println!("{} Joined {}", "✓".green(), joined.room_id.green().bold());
            for participant in &joined.participants {
                let marker = if participant.connection_id == joined.admin_connection_id {
                    " (admin)"
                } else {
                    ""
                };
                println!("  - {}{}", participant.display_name, marker);
            }
        }
        Some(event) => {
            print_event(&event);
            return;
        }
        None => {
            println!("{} Timeout", "✗".red());
            return;
        }
    }

    if keep_alive {
        listen(&mut client).await;
    } else {
        client.close().await;
    }
}

async fn admin_login(server: &str, secret: &str) {
    let mut client = match RaffleClient::connect(server).await {
        Ok(client) => client,
        Err(e) => {
            println!("{} Cannot connect: {}", "✗".red(), e);
            return;
        }
    };

    if !client.send(&ClientEvent::SystemAdminLogin(secret.to_string())).await {
        println!("{} Failed to send login", "✗".red());
        return;
    }

    match client.next_event(REPLY_TIMEOUT).await {
        Some(ServerEvent::SystemAdminAuthenticated(rooms)) => {
            println!("{} Operator authenticated", "✓".green());
            println!("\n{:<24} {:>12} {:>10} {:>16}", "Room", "Participants", "Status", "Created (ms)");
            println!("{}", "─".repeat(66));
            for room in rooms {
                println!(
                    "{:<24} {:>12} {:>10} {:>16}",
                    room.room_id, room.participant_count, room.status, room.created_at
                );
            }
        }
        Some(event) => print_event(&event),
        None => println!("{} Timeout", "✗".red()),
    }
    client.close().await;
}

async fn admin_delete(server: &str, secret: &str, room_id: &str) {
    let mut client = match RaffleClient::connect(server).await {
        Ok(client) => client,
        Err(e) => {
            println!("{} Cannot connect: {}", "✗".red(), e);
            return;
        }
    };

    client.send(&ClientEvent::SystemAdminLogin(secret.to_string())).await;
    match client.next_event(REPLY_TIMEOUT).await {
        Some(ServerEvent::SystemAdminAuthenticated(_)) => {}
        Some(event) => {
            print_event(&event);
            return;
        }
        None => {
            println!("{} Timeout", "✗".red());
            return;
        }
    }

    client.send(&ClientEvent::SystemAdminDelete(room_id.to_string())).await;
    match client.next_event(REPLY_TIMEOUT).await {
        Some(ServerEvent::SystemAdminActionSuccess(message)) => {
            println!("{} {}", "✓".green(), message);
        }
        Some(event) => print_event(&event),
        None => println!("{} Nothing deleted (no such raffle?)", "✗".yellow()),
    }
    client.close().await;
}

fn list_scenarios() {
    println!("\n{}", "Available Validation Scenarios:".bold());
    println!("  {} - Basic WebSocket connection test", "connection".cyan());
    println!("  {} - Raffle creation flow", "create-raffle".cyan());
    println!("  {} - Join with a wrong password", "wrong-password".cyan());
    println!("  {} - Join flow and membership broadcast", "join-raffle".cyan());
    println!("  {} - Full draw with private results", "draw".cyan());
    println!("  {} - Admin disconnect hands over admin", "admin-failover".cyan());
    println!("  {} - Empty raffle disappears from search", "empty-raffle".cyan());
    println!("  {} - Operator login and forced close", "operator".cyan());
    println!("\nExample: raffle-cli validate --scenario draw");
}

async fn run_scenario(server: &str, secret: &str, scenario: &str) {
    println!("\n{} {}", "Running scenario:".bold(), scenario.cyan());
    println!("{}", "─".repeat(60));

    let result = match scenario {
        "connection" => validate_connection(server).await,
        "create-raffle" => validate_create_raffle(server).await,
        "wrong-password" => validate_wrong_password(server).await,
        "join-raffle" => validate_join_raffle(server).await,
        "draw" => validate_draw(server).await,
        "admin-failover" => validate_admin_failover(server).await,
        "empty-raffle" => validate_empty_raffle(server).await,
        "operator" => validate_operator(server, secret).await,
        _ => {
            println!("{} Unknown scenario: {}", "✗".red(), scenario);
            list_scenarios();
            return;
        }
    };

    if result {
        println!("\n{} Scenario passed", "✓".green().bold());
    } else {
        println!("\n{} Scenario failed", "✗".red().bold());
    }
}

async fn run_all_validations(server: &str, secret: &str) {
    println!("\n{}", "Running All Validation Tests".bold().green());
    println!("{}\n", "═".repeat(60).green());

    let scenarios = [
        "connection",
        "create-raffle",
        "wrong-password",
        "join-raffle",
        "draw",
        "admin-failover",
        "empty-raffle",
        "operator",
    ];

    let mut passed = 0;
    let mut failed = 0;

    for scenario in scenarios {
        println!("\n{} {}", "▶".cyan(), scenario.bold());
        let ok = match scenario {
            "connection" => validate_connection(server).await,
            "create-raffle" => validate_create_raffle(server).await,
            "wrong-password" => validate_wrong_password(server).await,
            "join-raffle" => validate_join_raffle(server).await,
            "draw" => validate_draw(server).await,
            "admin-failover" => validate_admin_failover(server).await,
            "empty-raffle" => validate_empty_raffle(server).await,
            _ => validate_operator(server, secret).await,
        };
        if ok {
            passed += 1;
        } else {
            failed += 1;
        }
    }

    println!("\n{}", "═".repeat(60));
    println!(
        "{} passed, {} failed",
        passed.to_string().green().bold(),
        failed.to_string().red().bold()
    );
}

async fn validate_connection(server: &str) -> bool {
    match RaffleClient::connect(server).await {
        Ok(client) => {
            println!("{} WebSocket connection successful ({})", "✓".green(), client.connection_id);
            client.close().await;
            true
        }
        Err(e) => {
            println!("{} Connection failed: {}", "✗".red(), e);
            false
        }
    }
}

/// Connect an admin and create a fresh raffle for a scenario
async fn admin_with_raffle(server: &str, room_id: &str) -> Option<RaffleClient> {
    let mut admin = match RaffleClient::connect(server).await {
        Ok(client) => client,
        Err(e) => {
            println!("{} Connection failed: {}", "✗".red(), e);
            return None;
        }
    };

    match admin.create(room_id, "p", "Alice").await {
        Some(ServerEvent::RaffleCreated(_)) => Some(admin),
        Some(event) => {
            print_event(&event);
            None
        }
        None => {
            println!("{} No response to create", "✗".red());
            None
        }
    }
}

async fn validate_create_raffle(server: &str) -> bool {
    let room_id = validation_room_id();
    let Some(mut admin) = RaffleClient::connect(server).await.ok() else {
        println!("{} Connection failed", "✗".red());
        return false;
    };

    let ok = match admin.create(&room_id, "p", "Alice").await {
        Some(ServerEvent::RaffleCreated(snapshot)) => {
            let names: Vec<&str> = snapshot.participants.iter().map(|p| p.display_name.as_str()).collect();
            println!("{} Raffle created: {} {:?}", "✓".green(), snapshot.room_id, names);
            names == ["Alice"] && snapshot.admin_connection_id.as_str() == admin.connection_id
        }
        Some(event) => {
            print_event(&event);
            false
        }
        None => false,
    };
    admin.close().await;
    ok
}

async fn validate_wrong_password(server: &str) -> bool {
    let room_id = validation_room_id();
    let Some(admin) = admin_with_raffle(server, &room_id).await else {
        return false;
    };
    let Some(mut bob) = RaffleClient::connect(server).await.ok() else {
        return false;
    };

    let ok = match bob.join(&room_id, "wrong", "Bob").await {
        Some(ServerEvent::Error(message)) => {
            println!("{} Rejected with: {}", "✓".green(), message);
            message == "Hatalı şifre."
        }
        other => {
            println!("{} Unexpected reply: {:?}", "✗".red(), other);
            false
        }
    };

    bob.close().await;
    admin.close().await;
    ok
}

async fn validate_join_raffle(server: &str) -> bool {
    let room_id = validation_room_id();
    let Some(mut admin) = admin_with_raffle(server, &room_id).await else {
        return false;
    };
    let Some(mut bob) = RaffleClient::connect(server).await.ok() else {
        return false;
    };

    let joined = matches!(bob.join(&room_id, "p", "Bob").await, Some(ServerEvent::RaffleJoined(_)));
    println!("  Joiner received raffle_joined: {}", joined);

    let broadcast = admin
        .wait_for(REPLY_TIMEOUT, |e| matches!(e, ServerEvent::UpdateParticipants(p) if p.len() == 2))
        .await
        .is_some();
    println!("  Admin received membership update: {}", broadcast);

    bob.close().await;
    admin.close().await;
    joined && broadcast
}

async fn validate_draw(server: &str) -> bool {
    let room_id = validation_room_id();
    let Some(mut admin) = admin_with_raffle(server, &room_id).await else {
        return false;
    };
    let Some(mut bob) = RaffleClient::connect(server).await.ok() else {
        return false;
    };
    if !matches!(bob.join(&room_id, "p", "Bob").await, Some(ServerEvent::RaffleJoined(_))) {
        println!("{} Bob could not join", "✗".red());
        return false;
    }

    admin.send(&ClientEvent::StartRaffle(room_id.clone())).await;
    println!("  Draw started, waiting for results...");

    let is_result = |e: &ServerEvent| matches!(e, ServerEvent::RaffleResult(_));
    let alice_result = admin.wait_for(DRAW_TIMEOUT, is_result).await;
    let bob_result = bob.wait_for(DRAW_TIMEOUT, is_result).await;

    let ok = match (alice_result, bob_result) {
        (Some(ServerEvent::RaffleResult(a)), Some(ServerEvent::RaffleResult(b))) => {
            println!("  Alice gifts {}, Bob gifts {}", a.target_name, b.target_name);
            a.target_name == "Bob" && b.target_name == "Alice"
        }
        _ => {
            println!("{} Results not received", "✗".red());
            false
        }
    };

    bob.close().await;
    admin.close().await;
    ok
}

async fn validate_admin_failover(server: &str) -> bool {
    let room_id = validation_room_id();
    let Some(admin) = admin_with_raffle(server, &room_id).await else {
        return false;
    };
    let Some(mut bob) = RaffleClient::connect(server).await.ok() else {
        return false;
    };
    if !matches!(bob.join(&room_id, "p", "Bob").await, Some(ServerEvent::RaffleJoined(_))) {
        return false;
    }

    admin.close().await;
    println!("  Admin disconnected");

    let bob_id = bob.connection_id.clone();
    let promoted = bob
        .wait_for(REPLY_TIMEOUT, |e| {
            matches!(e, ServerEvent::RaffleUpdated(u) if u.admin_connection_id.as_str() == bob_id)
        })
        .await
        .is_some();
    println!("  Bob promoted to admin: {}", promoted);

    bob.close().await;
    promoted
}

async fn validate_empty_raffle(server: &str) -> bool {
    let room_id = validation_room_id();
    let Some(admin) = admin_with_raffle(server, &room_id).await else {
        return false;
    };
    admin.close().await;
    tokio::time::sleep(Duration::from_millis(300)).await;

    let Some(mut observer) = RaffleClient::connect(server).await.ok() else {
        return false;
    };
    let gone = match observer.search(&room_id).await {
        Some(ServerEvent::SearchResults(results)) => results.is_empty(),
        _ => false,
    };
    println!("  Raffle gone from search: {}", gone);
    observer.close().await;
    gone
}

async fn validate_operator(server: &str, secret: &str) -> bool {
    let room_id = validation_room_id();
    let Some(mut admin) = admin_with_raffle(server, &room_id).await else {
        return false;
    };
    let Some(mut operator) = RaffleClient::connect(server).await.ok() else {
        return false;
    };

    operator.send(&ClientEvent::SystemAdminLogin(secret.to_string())).await;
    let listed = match operator.next_event(REPLY_TIMEOUT).await {
        Some(ServerEvent::SystemAdminAuthenticated(rooms)) => {
            rooms.iter().any(|r| r.room_id == room_id)
        }
        other => {
            println!("{} Login failed: {:?}", "✗".red(), other);
            false
        }
    };
    println!("  Raffle listed for operator: {}", listed);

    operator.send(&ClientEvent::SystemAdminDelete(room_id.clone())).await;
    let acknowledged = matches!(
        operator.next_event(REPLY_TIMEOUT).await,
        Some(ServerEvent::SystemAdminActionSuccess(_))
    );
    let notified = matches!(admin.next_event(REPLY_TIMEOUT).await, Some(ServerEvent::Error(_)));
    println!("  Delete acknowledged: {}, members notified: {}", acknowledged, notified);

    operator.close().await;
    admin.close().await;
    listed && acknowledged && notified
}

async fn interactive_mode(server: &str) {
    println!("\n{}", "Interactive Mode".bold().green());
    println!("{}", "═".repeat(60).green());
    println!("Type {} for help, {} to quit\n", "help".cyan(), "quit".cyan());

    let client = match RaffleClient::connect(server).await {
        Ok(client) => client,
        Err(e) => {
            println!("{} Cannot connect to server: {}", "✗".red(), e);
            return;
        }
    };
    println!("{} Connected as {}", "✓".green(), client.connection_id.bold());

    let RaffleClient { mut write, mut read, .. } = client;

    // Spawn task to receive messages
    let receive_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = read.next().await {
            if let Message::Text(text) = msg {
                println!("\n{} {}", "◀".green(), text.bright_white());
            }
        }
    });

    loop {
        print!("{} ", "►".cyan());
        if io::stdout().flush().is_err() {
            break;
        }

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_err() {
            break;
        }

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input == "quit" || input == "exit" {
            println!("Goodbye!");
            break;
        }

        if input == "help" {
            print_interactive_help();
            continue;
        }

        match serde_json::from_str::<ClientEvent>(input) {
            Ok(event) => {
                let text = serde_json::to_string(&event).unwrap_or_default();
                if write.send(Message::Text(text)).await.is_ok() {
                    println!("{} Message sent", "✓".green());
                } else {
                    println!("{} Failed to send message", "✗".red());
                    break;
                }
            }
            Err(e) => {
                println!("{} Not a raffle event ({}). Type 'help' for examples.", "✗".yellow(), e);
            }
        }
    }

    receive_task.abort();
}

fn print_interactive_help() {
    println!("\n{}", "Interactive Mode Commands".bold());
    println!("{}", "─".repeat(60));
    println!("Send JSON events directly to the server.\n");

    println!("{}", "Example Events:".bold());
    println!("\n{}:", "Search".cyan());
    println!(r#"  {{"event":"search_raffles","data":""}}"#);

    println!("\n{}:", "Create Raffle".cyan());
    println!(r#"  {{"event":"create_raffle","data":{{"roomId":"office","password":"p","adminName":"Alice"}}}}"#);

    println!("\n{}:", "Join Raffle".cyan());
    println!(r#"  {{"event":"join_raffle","data":{{"roomId":"office","password":"p","participantName":"Bob"}}}}"#);

    println!("\n{}:", "Kick".cyan());
    println!(r#"  {{"event":"kick_participant","data":{{"roomId":"office","targetConnectionId":"..."}}}}"#);

    println!("\n{}:", "Start".cyan());
    println!(r#"  {{"event":"start_raffle","data":"office"}}"#);

    println!("\n{}:", "Operator".cyan());
    println!(r#"  {{"event":"system_admin_login","data":"<secret>"}}"#);
    println!(r#"  {{"event":"system_admin_delete","data":"office"}}"#);

    println!("\n{}: quit, exit", "Commands".bold());
    println!();
}
