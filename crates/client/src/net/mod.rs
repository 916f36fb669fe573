mod agent;
mod config;
mod shared;

pub use agent::NetworkAgent;
pub use config::ClientConfig;
pub use shared::{ConnectionStatus, SharedState, SnapshotView};
