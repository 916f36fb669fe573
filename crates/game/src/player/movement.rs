use glam::Vec2;

use crate::net::InputFlags;
use crate::player::MovementConfig;

const DIAGONAL_SCALE: f32 = std::f32::consts::FRAC_1_SQRT_2;

/// Integrates one fixed timestep of ship movement: thrust from held
/// directions, friction, speed clamp, then position and bounds.
pub fn step_player(position: &mut Vec2, velocity: &mut Vec2, input: InputFlags, dt: f32, cfg: &MovementConfig) {
    let mut thrust = Vec2::ZERO;
    if input.contains(InputFlags::UP) {
        thrust.y -= 1.0;
    }
    if input.contains(InputFlags::DOWN) {
        thrust.y += 1.0;
    }
    if input.contains(InputFlags::LEFT) {
        thrust.x -= 1.0;
    }
    if input.contains(InputFlags::RIGHT) {
        thrust.x += 1.0;
    }
    // Diagonals get the same thrust magnitude as cardinals.
    if thrust.x != 0.0 && thrust.y != 0.0 {
        thrust *= DIAGONAL_SCALE;
    }
    *velocity += thrust * cfg.acceleration * dt;

    // Friction is tuned per tick at the reference rate; rescale the
    // exponent so decay per second is rate-independent.
    let retain = cfg.friction.powf(dt * cfg.reference_tick_rate);
    *velocity *= retain;

    let speed = velocity.length();
    if speed > cfg.max_speed {
        *velocity *= cfg.max_speed / speed;
    } else if thrust == Vec2::ZERO && speed < cfg.stop_threshold {
        *velocity = Vec2::ZERO;
    }

    *position += *velocity * dt;

    let min = Vec2::splat(cfg.half_extent);
    let max = cfg.playfield - min;
    if position.x < min.x || position.x > max.x {
        position.x = position.x.clamp(min.x, max.x);
        velocity.x = 0.0;
    }
    if position.y < min.y || position.y > max.y {
        position.y = position.y.clamp(min.y, max.y);
        velocity.y = 0.0;
    }
}
