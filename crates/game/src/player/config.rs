use glam::Vec2;

/// Tuning for ship movement. Shared by the server simulation and any
/// client-side prediction, so both integrate identically.
#[derive(Debug, Clone)]
pub struct MovementConfig {
    /// Thrust applied per held direction, units/s^2.
    pub acceleration: f32,
    /// Speed clamp, units/s.
    pub max_speed: f32,
    /// Per-tick velocity retention at the reference tick rate.
    pub friction: f32,
    /// Tick rate the friction constant was tuned at. Friction is
    /// rescaled so other rates decay at the same speed per second.
    pub reference_tick_rate: f32,
    /// Speeds below this snap to zero to kill drift.
    pub stop_threshold: f32,
    /// Playfield extents; ships are clamped inside.
    pub playfield: Vec2,
    /// Half the ship's collision box, kept clear of the edges.
    pub half_extent: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            acceleration: 800.0,
            max_speed: 300.0,
            friction: 0.95,
            reference_tick_rate: 60.0,
            stop_threshold: 1.0,
            playfield: Vec2::new(800.0, 600.0),
            half_extent: 32.0,
        }
    }
}
