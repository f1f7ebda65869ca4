use std::any::Any;
use std::fmt;

use thiserror::Error;

use crate::grid::normalize_degrees;
use crate::shape::BoundingBox;
use crate::sprite::Sprite;

use super::world::World;

/// Stable handle for an actor placed in a [`World`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure raised by an act hook; aborts the current tick.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ActFailure {
    message: String,
}

impl ActFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ActFailure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ActFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// Spatial state of an actor: pixel-center position, rotation in
/// degrees (normalized to `[0, 360)`, clockwise, 0 = east), and the
/// displayed sprite.
///
/// A detached `Actor` uses cell size 1 and no bounds; placement rules
/// of a world apply only once it is added to one.
#[derive(Clone)]
pub struct Actor {
    x: i32,
    y: i32,
    rotation: i32,
    sprite: Sprite,
}

impl Actor {
    pub fn new(sprite: Sprite) -> Self {
        Self {
            x: 0,
            y: 0,
            rotation: 0,
            sprite,
        }
    }

    pub fn with_location(mut self, x: i32, y: i32) -> Self {
        self.set_location(x, y);
        self
    }

    pub fn with_rotation(mut self, degrees: i32) -> Self {
        self.set_rotation(degrees);
        self
    }

    /// Detached placement: with cell size 1 the cell center is the
    /// cell coordinate itself.
    pub fn set_location(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub(crate) fn set_pixel_location(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    /// Pixel-center position.
    pub fn location(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    pub fn rotation(&self) -> i32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, degrees: i32) {
        self.rotation = normalize_degrees(degrees);
    }

    pub fn turn(&mut self, degrees: i32) {
        self.set_rotation(self.rotation + degrees);
    }

    pub fn sprite(&self) -> Sprite {
        self.sprite.clone()
    }

    pub fn set_image(&mut self, sprite: Sprite) {
        self.sprite = sprite;
    }

    /// Bounding rectangle derived from the live sprite dimensions,
    /// centered on the position and rotated with the actor.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::new(
            self.x as f64,
            self.y as f64,
            self.sprite.width() as f64,
            self.sprite.height() as f64,
            self.rotation as f64,
        )
    }
}

/// Per-actor behavior. State lives on the implementing type; spatial
/// state is read and written through the `World` using the actor's id.
pub trait ActorHook: Any {
    fn act(&mut self, _world: &mut World, _me: ActorId) -> Result<(), ActFailure> {
        Ok(())
    }

    /// Called once, after the actor has been placed in a world.
    fn added_to_world(&mut self, _world: &mut World, _me: ActorId) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_actor_uses_raw_coordinates() {
        let mut actor = Actor::new(Sprite::new(4, 4)).with_location(-7, 300);
        assert_eq!(actor.location(), (-7, 300));
        actor.set_location(2, 3);
        assert_eq!(actor.location(), (2, 3));
    }

    #[test]
    fn rotation_is_stored_normalized() {
        let mut actor = Actor::new(Sprite::new(4, 4));
        actor.set_rotation(540);
        assert_eq!(actor.rotation(), 180);
        actor.set_rotation(-90);
        assert_eq!(actor.rotation(), 270);
    }

    #[test]
    fn turn_accumulates_and_wraps() {
        let mut actor = Actor::new(Sprite::new(4, 4)).with_rotation(350);
        actor.turn(20);
        assert_eq!(actor.rotation(), 10);
        actor.turn(-20);
        assert_eq!(actor.rotation(), 350);
    }

    #[test]
    fn bounding_box_follows_the_sprite_size() {
        let sprite = Sprite::new(10, 4);
        let actor = Actor::new(sprite.clone()).with_location(20, 30);
        let rect = actor.bounding_box();
        assert_eq!(rect.cx, 20.0);
        assert_eq!(rect.cy, 30.0);
        assert_eq!(rect.half_w, 5.0);
        assert_eq!(rect.half_h, 2.0);

        sprite.scale(20, 8);
        let rect = actor.bounding_box();
        assert_eq!(rect.half_w, 10.0);
        assert_eq!(rect.half_h, 4.0);
    }

    #[test]
    fn act_failure_converts_from_strings() {
        let failure: ActFailure = "stuck".into();
        assert_eq!(failure.to_string(), "stuck");
        let failure: ActFailure = String::from("worse").into();
        assert_eq!(failure.to_string(), "worse");
    }
}
