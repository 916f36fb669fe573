mod config;
mod movement;

pub use config::MovementConfig;
pub use movement::step_player;
