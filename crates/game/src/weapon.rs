use glam::Vec2;

/// Projectiles despawn this many seconds after firing.
pub const PROJECTILE_LIFETIME: f32 = 2.0;

/// Fan half-angle for the spread weapon, radians (15 degrees).
const SPREAD_ANGLE: f32 = 0.2618;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum WeaponKind {
    #[default]
    Spread = 0,
    Rapid = 1,
    Laser = 2,
}

/// Per-weapon tuning, fixed at compile time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeaponStats {
    /// Shots per second.
    pub fire_rate: f32,
    /// Muzzle speed, units/s.
    pub projectile_speed: f32,
    pub damage: i16,
    /// How far ahead of the ship's center projectiles spawn.
    pub muzzle_offset: f32,
    pub projectile_radius: f32,
}

impl WeaponKind {
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(WeaponKind::Spread),
            1 => Some(WeaponKind::Rapid),
            2 => Some(WeaponKind::Laser),
            _ => None,
        }
    }

    pub fn stats(self) -> WeaponStats {
        match self {
            WeaponKind::Spread => WeaponStats {
                fire_rate: 3.0,
                projectile_speed: 400.0,
                damage: 5,
                muzzle_offset: 20.0,
                projectile_radius: 4.0,
            },
            WeaponKind::Rapid => WeaponStats {
                fire_rate: 10.0,
                projectile_speed: 600.0,
                damage: 3,
                muzzle_offset: 25.0,
                projectile_radius: 3.0,
            },
            WeaponKind::Laser => WeaponStats {
                fire_rate: 1.5,
                projectile_speed: 800.0,
                damage: 15,
                muzzle_offset: 30.0,
                projectile_radius: 8.0,
            },
        }
    }

    /// Seconds between shots.
    pub fn cooldown(self) -> f32 {
        1.0 / self.stats().fire_rate
    }

    /// Firing angles relative to straight up, one projectile each.
    pub fn fire_angles(self) -> &'static [f32] {
        match self {
            WeaponKind::Spread => &[-SPREAD_ANGLE, 0.0, SPREAD_ANGLE],
            WeaponKind::Rapid | WeaponKind::Laser => &[0.0],
        }
    }
}

/// Muzzle velocity for a shot at `angle` from straight up.
pub fn projectile_velocity(weapon: WeaponKind, angle: f32) -> Vec2 {
    let speed = weapon.stats().projectile_speed;
    Vec2::new(speed * angle.sin(), -speed * angle.cos())
}

/// Spawn point for a shot: ahead of the ship, shifted sideways with the
/// firing angle so a fan visibly diverges from the muzzle.
pub fn muzzle_position(weapon: WeaponKind, ship: Vec2, angle: f32) -> Vec2 {
    Vec2::new(ship.x + 10.0 * angle.sin(), ship.y - weapon.stats().muzzle_offset)
}
