//! Authoritative game server: owns all simulation state, applies client
//! input at a fixed tick rate, and replicates the world back out.

pub mod config;
pub mod events;
pub mod server;
pub mod simulation;

pub use config::ServerConfig;
pub use events::{DisconnectReason, ServerEvent};
pub use server::{GameServer, ServerStats};
