//! Weapons used by enemy controllers

use glam::Vec2;

/// Outcome of a fire request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponState {
    /// A shot left the muzzle
    Fire,
    /// Still cooling down from the previous shot or a reload
    Cooldown,
    /// Magazine empty, reload needed
    OutOfAmmo,
}

/// Something an enemy can shoot with
pub trait Weapon {
    /// Identifier reported in damage events
    fn weapon_id(&self) -> u32;

    /// Try to fire from `from` towards `to`
    fn fire(&mut self, from: Vec2, to: Vec2, timestamp_ms: u32) -> WeaponState;

    /// Refill the magazine; the weapon cools down for the reload time
    fn reload(&mut self, timestamp_ms: u32);

    /// Rounds left in the magazine
    fn ammunition_left(&self) -> u32;
}

/// Magazine and cooldown, no projectile simulation
#[derive(Debug, Clone)]
pub struct SimpleWeapon {
    pub weapon_id: u32,
    pub magazine_size: u32,
    pub cooldown_ms: u32,
    pub reload_time_ms: u32,
    ammunition: u32,
    ready_at_ms: u32,
    shots_fired: u32,
}

impl SimpleWeapon {
    #[must_use]
    pub fn new(weapon_id: u32, magazine_size: u32, cooldown_ms: u32, reload_time_ms: u32) -> Self {
        Self {
            weapon_id,
            magazine_size,
            cooldown_ms,
            reload_time_ms,
            ammunition: magazine_size,
            ready_at_ms: 0,
            shots_fired: 0,
        }
    }

    /// Total shots fired since creation
    #[must_use]
    pub fn shots_fired(&self) -> u32 {
        self.shots_fired
    }
}

impl Weapon for SimpleWeapon {
    fn weapon_id(&self) -> u32 {
        self.weapon_id
    }

    fn fire(&mut self, _from: Vec2, _to: Vec2, timestamp_ms: u32) -> WeaponState {
        if self.ammunition == 0 {
            return WeaponState::OutOfAmmo;
        }
        if timestamp_ms < self.ready_at_ms {
            return WeaponState::Cooldown;
        }

        self.ammunition -= 1;
        self.shots_fired += 1;
        self.ready_at_ms = timestamp_ms.saturating_add(self.cooldown_ms);
        WeaponState::Fire
    }

    fn reload(&mut self, timestamp_ms: u32) {
        self.ammunition = self.magazine_size;
        self.ready_at_ms = timestamp_ms.saturating_add(self.reload_time_ms);
    }

    fn ammunition_left(&self) -> u32 {
        self.ammunition
    }
}
