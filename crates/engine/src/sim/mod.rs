//! Simulation runtime: the world arena, tick scheduling, input
//! recording, and the embedding context that ties them together.

mod actor;
mod frame;
mod input;
mod scheduler;
mod world;

use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

use crate::content::{AssetLoader, ProjectConfig};
use crate::sprite::Sprite;

pub use actor::{ActFailure, Actor, ActorHook, ActorId};
pub use frame::{compose, ActorPose, FrameSnapshot, TextOverlay};
pub use input::InputState;
pub use scheduler::{interval_for_speed, Scheduler, TickOutcome, MAX_SPEED};
pub use world::{TickError, World, WorldHook};

/// Failure raised by a world factory; a failed reset keeps the old world.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ConstructionFailure {
    message: String,
}

impl ConstructionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ConstructionFailure {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ConstructionFailure {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

type WorldFactory =
    Box<dyn FnMut(&mut AssetLoader, &ProjectConfig) -> Result<World, ConstructionFailure>>;

/// Embedding context owning the current world and everything that used
/// to be ambient: scheduler, input recording, assets, configuration,
/// and the tick failure report channel.
pub struct Simulation {
    world: World,
    scheduler: Scheduler,
    input: InputState,
    assets: AssetLoader,
    config: ProjectConfig,
    factory: WorldFactory,
    on_error: Option<Box<dyn FnMut(&TickError)>>,
}

impl Simulation {
    /// Builds the initial world through `factory`. The configured
    /// simulation speed, when present, seeds the scheduler.
    pub fn new(
        mut assets: AssetLoader,
        config: ProjectConfig,
        factory: impl FnMut(&mut AssetLoader, &ProjectConfig) -> Result<World, ConstructionFailure>
            + 'static,
    ) -> Result<Self, ConstructionFailure> {
        let mut factory: WorldFactory = Box::new(factory);
        let world = factory(&mut assets, &config)?;
        let mut scheduler = Scheduler::new();
        if let Some(speed) = config.simulation_speed() {
            scheduler.set_speed(speed);
        }
        Ok(Self {
            world,
            scheduler,
            input: InputState::new(),
            assets,
            config,
            factory,
            on_error: None,
        })
    }

    pub fn set_error_handler(&mut self, handler: impl FnMut(&TickError) + 'static) {
        self.on_error = Some(Box::new(handler));
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn input(&self) -> &InputState {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputState {
        &mut self.input
    }

    pub fn assets_mut(&mut self) -> &mut AssetLoader {
        &mut self.assets
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    pub fn speed(&self) -> i32 {
        self.scheduler.speed()
    }

    pub fn set_speed(&mut self, speed: i32) {
        self.scheduler.set_speed(speed);
    }

    /// Current tick interval derived from the speed.
    pub fn interval(&self) -> Duration {
        self.scheduler.interval()
    }

    pub fn start(&mut self) {
        if !self.scheduler.is_running() {
            self.scheduler.start();
            self.world.notify_started();
        }
    }

    pub fn stop(&mut self) {
        if self.scheduler.is_running() {
            self.scheduler.stop();
            self.world.notify_stopped();
        }
    }

    /// Runs a single tick (timer fire or manual step; stepping while
    /// stopped is legal). A tick failure is reported to the error
    /// handler and leaves the simulation stopped.
    pub fn tick(&mut self) -> bool {
        match self.scheduler.run_tick(&mut self.world, &mut self.input) {
            Ok(TickOutcome::Completed) => true,
            Ok(TickOutcome::Deferred) => false,
            Err(error) => {
                warn!(error = %error, "tick_failed");
                self.world.notify_stopped();
                if let Some(handler) = self.on_error.as_mut() {
                    handler(&error);
                }
                false
            }
        }
    }

    /// Ticks up to `count` times while the simulation stays running.
    pub fn run_ticks(&mut self, count: u32) {
        for _ in 0..count {
            if !self.scheduler.is_running() {
                break;
            }
            self.tick();
        }
    }

    /// Adds an actor whose sprite is resolved from the per-class image
    /// configuration, falling back to the placeholder.
    pub fn spawn<H: ActorHook>(&mut self, hook: H, cell_x: i32, cell_y: i32) -> ActorId {
        let sprite = self.default_sprite_for::<H>();
        self.world
            .add_object_with(Actor::new(sprite), hook, cell_x, cell_y)
    }

    fn default_sprite_for<H: 'static>(&mut self) -> Sprite {
        match self.config.default_image_name(std::any::type_name::<H>()) {
            Some(name) => {
                let name = name.to_string();
                self.assets.load_sprite(&name)
            }
            None => Sprite::placeholder(),
        }
    }

    /// Stops and rebuilds the world through the factory. A factory
    /// failure is logged and the old world stays in place.
    pub fn reset_world(&mut self) {
        self.stop();
        match (self.factory)(&mut self.assets, &self.config) {
            Ok(world) => {
                self.world = world;
                info!("world_reset");
            }
            Err(error) => {
                warn!(error = %error, "world_reset_failed");
            }
        }
    }
}
