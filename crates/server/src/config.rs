use drifter::MovementConfig;
use drifter::net::DEFAULT_TICK_RATE;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Connection slots; ids are slot indices, so at most 255.
    pub max_players: usize,
    /// Live projectile arena size.
    pub max_projectiles: usize,
    /// At most this many projectiles per snapshot, oldest first.
    pub snapshot_projectile_cap: usize,
    pub movement: MovementConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
            max_players: 4,
            max_projectiles: 200,
            snapshot_projectile_cap: 50,
            movement: MovementConfig::default(),
        }
    }
}
