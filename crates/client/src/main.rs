use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;

use drifter::net::{DEFAULT_PORT, InputFlags};
use drifter::weapon::WeaponKind;
use drifter_client::{ClientConfig, ConnectionStatus, NetworkAgent, SharedState};

#[derive(Parser, Debug)]
#[command(name = "drifter-client", about = "Headless game client")]
struct Args {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    #[arg(short, long, default_value = "Pilot")]
    name: String,

    /// Seconds to run before disconnecting; 0 runs until killed.
    #[arg(short, long, default_value_t = 10)]
    duration: u64,
}

/// Drives a scripted pilot: strafes side to side while holding fire,
/// printing a status line once a second. Stands in for a render loop.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let shared = Arc::new(SharedState::new());
    let agent = NetworkAgent::spawn(
        ClientConfig {
            host: args.host,
            port: args.port,
            display_name: args.name,
            ..ClientConfig::default()
        },
        shared.clone(),
    )?;

    let started = Instant::now();
    let frame = Duration::from_secs_f64(1.0 / 60.0);
    let mut tick = 0u64;
    let mut was_connected = false;
    loop {
        let (status, message) = shared.status();
        match status {
            ConnectionStatus::Error => {
                log::error!("{message}");
                break;
            }
            ConnectionStatus::Connected => was_connected = true,
            // The agent starts out disconnected; only a drop after a
            // successful connect ends the session.
            ConnectionStatus::Disconnected if was_connected => break,
            _ => {}
        }
        if args.duration > 0 && started.elapsed() >= Duration::from_secs(args.duration) {
            break;
        }

        // Strafe right for two seconds, then left, firing throughout.
        let direction = if (tick / 120) % 2 == 0 {
            InputFlags::RIGHT
        } else {
            InputFlags::LEFT
        };
        shared.set_outbound_input(direction | InputFlags::FIRE, WeaponKind::Spread);

        if tick % 60 == 0 {
            let view = shared.copy_snapshot();
            let (sent, received) = shared.packet_counts();
            let position = shared
                .local_player()
                .map(|p| format!("({:.0}, {:.0})", p.position.x, p.position.y))
                .unwrap_or_else(|| "unknown".into());
            log::info!(
                "{message}: tick {}, {} players, {} projectiles, at {position}, {sent} sent / {received} received",
                view.server_tick,
                view.players.len(),
                view.projectiles.len(),
            );
        }

        tick += 1;
        std::thread::sleep(frame);
    }

    agent.stop();
    Ok(())
}
