//! Collision categories and the per-category interaction masks

use bitflags::bitflags;
use rapier2d::prelude::{Group, InteractionGroups};

bitflags! {
    /// Collision category of a body.
    ///
    /// A body belongs to exactly one category; query masks combine several.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CollisionCategory: u32 {
        const PLAYER = 1 << 0;
        const PLAYER_BULLET = 1 << 1;
        const ENEMY = 1 << 2;
        const ENEMY_BULLET = 1 << 3;
        const PROPS = 1 << 4;
        const PICKUPS = 1 << 5;
        const STATIC = 1 << 6;
        const PACKAGE = 1 << 7;
        const PLAYER_ONLY = 1 << 8;
    }
}

impl CollisionCategory {
    /// Every single category, in bit order
    pub const SINGLE: [Self; 9] = [
        Self::PLAYER,
        Self::PLAYER_BULLET,
        Self::ENEMY,
        Self::ENEMY_BULLET,
        Self::PROPS,
        Self::PICKUPS,
        Self::STATIC,
        Self::PACKAGE,
        Self::PLAYER_ONLY,
    ];

    /// Categories a body of this category collides with.
    ///
    /// Only meaningful for a single category; combinations and the empty
    /// set collide with nothing.
    #[must_use]
    pub fn collision_mask(self) -> Self {
        FACTION_TABLE
            .iter()
            .find(|(category, _, _)| *category == self)
            .map_or(Self::empty(), |&(_, mask, _)| mask)
    }

    /// Rapier interaction groups for a body of this category
    #[must_use]
    pub fn interaction_groups(self) -> InteractionGroups {
        InteractionGroups::new(
            Group::from_bits_truncate(self.bits()),
            Group::from_bits_truncate(self.collision_mask().bits()),
        )
    }

    /// Rapier interaction groups for a query that hits `self`
    #[must_use]
    pub fn query_groups(self) -> InteractionGroups {
        InteractionGroups::new(Group::ALL, Group::from_bits_truncate(self.bits()))
    }

    /// Category from the membership bits of a collider
    #[must_use]
    pub fn from_group(group: Group) -> Self {
        Self::from_bits_truncate(group.bits())
    }

    /// Human readable name of a single category
    #[must_use]
    pub fn name(self) -> &'static str {
        if self.is_empty() {
            return "None";
        }
        if self.is_all() {
            return "All";
        }
        FACTION_TABLE
            .iter()
            .find(|(category, _, _)| *category == self)
            .map_or("Unknown", |&(_, _, name)| name)
    }
}

type C = CollisionCategory;

/// Category, collision mask, display name
const FACTION_TABLE: [(C, C, &str); 9] = [
    (
        C::PLAYER,
        C::PLAYER
            .union(C::ENEMY)
            .union(C::ENEMY_BULLET)
            .union(C::PACKAGE)
            .union(C::PROPS)
            .union(C::PICKUPS)
            .union(C::STATIC)
            .union(C::PLAYER_ONLY),
        "Player",
    ),
    (
        C::PLAYER_BULLET,
        C::ENEMY.union(C::PACKAGE).union(C::PROPS).union(C::STATIC),
        "Player Bullet",
    ),
    (
        C::ENEMY,
        C::PLAYER
            .union(C::PLAYER_BULLET)
            .union(C::ENEMY)
            .union(C::PROPS)
            .union(C::STATIC),
        "Enemy",
    ),
    (
        C::ENEMY_BULLET,
        C::PLAYER.union(C::PACKAGE).union(C::PROPS).union(C::STATIC),
        "Enemy Bullet",
    ),
    (
        C::PROPS,
        C::PLAYER
            .union(C::PLAYER_BULLET)
            .union(C::ENEMY)
            .union(C::ENEMY_BULLET)
            .union(C::PACKAGE)
            .union(C::PROPS)
            .union(C::STATIC),
        "Props",
    ),
    (C::PICKUPS, C::PLAYER, "Pickups"),
    (
        C::STATIC,
        C::PLAYER
            .union(C::PLAYER_BULLET)
            .union(C::ENEMY)
            .union(C::ENEMY_BULLET)
            .union(C::PACKAGE)
            .union(C::PROPS),
        "Static",
    ),
    (
        C::PACKAGE,
        C::PLAYER
            .union(C::PLAYER_BULLET)
            .union(C::ENEMY)
            .union(C::PROPS)
            .union(C::STATIC),
        "Package",
    ),
    (C::PLAYER_ONLY, C::PLAYER, "Player Only"),
];
