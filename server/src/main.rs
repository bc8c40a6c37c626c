//! Server application entry point

use clap::Parser;
use log::info;
use server::network::Server;
use shared::{SERVER_PORT, SERVER_SEND_HZ, TICK_RATE};
use std::time::Duration;

/// Command-line arguments for server configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to bind the UDP socket to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = SERVER_PORT)]
    port: u16,

    /// Maximum number of concurrent clients
    #[arg(short, long, default_value_t = 32)]
    max_clients: usize,

    /// Simulation rate in Hz, independent of the broadcast send rate
    #[arg(short = 't', long, default_value_t = TICK_RATE)]
    tick_rate: u32,

    /// Broadcast rate in Hz at which clients receive `ServerTick`/`PlayerState`/
    /// `EntityState` updates
    #[arg(short = 's', long, default_value_t = SERVER_SEND_HZ)]
    send_rate: u32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let args = Args::parse();
    let addr = format!("{}:{}", args.host, args.port);
    let tick_duration = Duration::from_secs_f32(1.0 / args.tick_rate as f32);
    let send_interval = Duration::from_secs_f32(1.0 / args.send_rate as f32);

    info!("Starting tank server on {}", addr);
    info!("Tick rate: {} Hz ({:?} per tick)", args.tick_rate, tick_duration);
    info!("Send rate: {} Hz ({:?} per broadcast)", args.send_rate, send_interval);

    let mut server =
        Server::with_send_interval(&addr, tick_duration, send_interval, args.max_clients).await?;
    server.run().await?;

    Ok(())
}
