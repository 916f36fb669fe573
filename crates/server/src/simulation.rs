//! Pure simulation state and stepping, separated from socket handling
//! so it can be driven directly in tests.

use drifter::MovementConfig;
use drifter::net::InputFlags;
use drifter::weapon::{self, PROJECTILE_LIFETIME, WeaponKind};
use glam::Vec2;

pub const SPAWN_X_BASE: f32 = 100.0;
pub const SPAWN_X_STEP: f32 = 150.0;
pub const SPAWN_Y: f32 = 400.0;
pub const STARTING_HEALTH: i16 = 100;

/// The simulated part of a connected player.
#[derive(Debug, Clone)]
pub struct Ship {
    pub position: Vec2,
    pub velocity: Vec2,
    pub health: i16,
    pub weapon: WeaponKind,
    /// Seconds until the weapon may fire again.
    pub fire_cooldown: f32,
}

impl Ship {
    /// Spawn point is staggered by slot so ships never overlap on join.
    pub fn spawn(slot: usize) -> Self {
        Self {
            position: Vec2::new(SPAWN_X_BASE + SPAWN_X_STEP * slot as f32, SPAWN_Y),
            velocity: Vec2::ZERO,
            health: STARTING_HEALTH,
            weapon: WeaponKind::default(),
            fire_cooldown: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub owner: u8,
    pub position: Vec2,
    pub velocity: Vec2,
    pub weapon: WeaponKind,
    /// Seconds left before despawn.
    pub lifetime: f32,
    /// Tick the shot was fired on; broadcast keeps the oldest when the
    /// snapshot cap bites.
    pub spawned_tick: u32,
}

/// Advances one ship by one tick: movement, then the fire cooldown and
/// any shots it produces.
pub fn step_ship(
    ship: &mut Ship,
    owner: u8,
    input: InputFlags,
    dt: f32,
    tick: u32,
    cfg: &MovementConfig,
    projectiles: &mut [Option<Projectile>],
) {
    drifter::player::step_player(&mut ship.position, &mut ship.velocity, input, dt, cfg);

    ship.fire_cooldown = (ship.fire_cooldown - dt).max(0.0);
    if input.contains(InputFlags::FIRE) && ship.fire_cooldown == 0.0 {
        spawn_shots(ship, owner, tick, projectiles);
        ship.fire_cooldown = ship.weapon.cooldown();
    }
}

/// Emits one projectile per firing angle of the ship's weapon. Shots
/// beyond the arena capacity are dropped.
fn spawn_shots(ship: &Ship, owner: u8, tick: u32, projectiles: &mut [Option<Projectile>]) {
    for &angle in ship.weapon.fire_angles() {
        let Some(slot) = projectiles.iter().position(Option::is_none) else {
            log::debug!("projectile arena full, dropping shot from player {owner}");
            return;
        };
        projectiles[slot] = Some(Projectile {
            owner,
            position: weapon::muzzle_position(ship.weapon, ship.position, angle),
            velocity: weapon::projectile_velocity(ship.weapon, angle),
            weapon: ship.weapon,
            lifetime: PROJECTILE_LIFETIME,
            spawned_tick: tick,
        });
    }
}

/// Moves live projectiles and frees the ones that expired or left the
/// playfield.
pub fn step_projectiles(projectiles: &mut [Option<Projectile>], dt: f32, playfield: Vec2) {
    for slot in projectiles.iter_mut() {
        let Some(projectile) = slot else { continue };
        projectile.position += projectile.velocity * dt;
        projectile.lifetime -= dt;

        let out = projectile.position.x < 0.0
            || projectile.position.x > playfield.x
            || projectile.position.y < 0.0
            || projectile.position.y > playfield.y;
        if projectile.lifetime <= 0.0 || out {
            *slot = None;
        }
    }
}
