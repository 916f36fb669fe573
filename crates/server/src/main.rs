use anyhow::Result;
use clap::Parser;

use drifter::net::{DEFAULT_PORT, DEFAULT_TICK_RATE};
use drifter_server::{GameServer, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "drifter-server", about = "Authoritative game server")]
struct Args {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Simulation ticks per second.
    #[arg(long, default_value_t = DEFAULT_TICK_RATE)]
    tick_rate: u32,

    /// Connection slots.
    #[arg(long, default_value_t = 4)]
    max_players: usize,

    /// Live projectile arena size.
    #[arg(long, default_value_t = 200)]
    max_projectiles: usize,

    /// Projectiles per snapshot, oldest first.
    #[arg(long, default_value_t = 50)]
    snapshot_projectile_cap: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = ServerConfig {
        tick_rate: args.tick_rate,
        max_players: args.max_players,
        max_projectiles: args.max_projectiles,
        snapshot_projectile_cap: args.snapshot_projectile_cap,
        ..ServerConfig::default()
    };

    let mut server = GameServer::new(&format!("{}:{}", args.bind, args.port), config)?;
    server.run();
    Ok(())
}
