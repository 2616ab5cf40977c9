//! Outbound sprite control
//!
//! Controllers tell the presentation layer what to show; nothing comes back.

use hecs::Entity;

/// Fire-and-forget animation and appearance commands
pub trait SpriteControl {
    /// Play the named animation
    fn set_animation(&mut self, entity: Entity, name: &'static str);

    /// Mirror the sprite horizontally, used for facing direction
    fn set_flip_horizontal(&mut self, entity: Entity, flip: bool);

    /// Tint the sprite, RGBA
    fn set_shade(&mut self, entity: Entity, shade: [f32; 4]);
}

/// A recorded sprite command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpriteCommand {
    Animation(&'static str),
    FlipHorizontal(bool),
    Shade([f32; 4]),
}

/// [`SpriteControl`] that records every command, for headless runs
#[derive(Debug, Default)]
pub struct SpriteLog {
    commands: Vec<(Entity, SpriteCommand)>,
}

impl SpriteLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All commands in the order they were issued
    #[must_use]
    pub fn commands(&self) -> &[(Entity, SpriteCommand)] {
        &self.commands
    }

    /// Last animation requested for an entity
    #[must_use]
    pub fn current_animation(&self, entity: Entity) -> Option<&'static str> {
        self.commands.iter().rev().find_map(|(e, command)| match command {
            SpriteCommand::Animation(name) if *e == entity => Some(*name),
            _ => None,
        })
    }

    /// Last horizontal flip requested for an entity
    #[must_use]
    pub fn flipped(&self, entity: Entity) -> Option<bool> {
        self.commands.iter().rev().find_map(|(e, command)| match command {
            SpriteCommand::FlipHorizontal(flip) if *e == entity => Some(*flip),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl SpriteControl for SpriteLog {
    fn set_animation(&mut self, entity: Entity, name: &'static str) {
        self.commands.push((entity, SpriteCommand::Animation(name)));
    }

    fn set_flip_horizontal(&mut self, entity: Entity, flip: bool) {
        self.commands.push((entity, SpriteCommand::FlipHorizontal(flip)));
    }

    fn set_shade(&mut self, entity: Entity, shade: [f32; 4]) {
        self.commands.push((entity, SpriteCommand::Shade(shade)));
    }
}
