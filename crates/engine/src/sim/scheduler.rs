//! Tick pacing and run state.

use std::time::Duration;

use tracing::info;

use super::input::InputState;
use super::world::{TickError, World};

pub const MAX_SPEED: i32 = 100;
const MIN_DELAY_NANOS: f64 = 30_000.0;
const MAX_DELAY_NANOS: f64 = 10_000_000_000.0;

/// Tick interval for a speed in `[0, 100]`.
///
/// The curve is exponential between roughly 30 microseconds at full
/// speed and 10 seconds at speed 0, rounded to whole milliseconds with
/// a 1 ms floor.
pub fn interval_for_speed(speed: i32) -> Duration {
    let speed = speed.clamp(0, MAX_SPEED);
    let raw_delay = MAX_SPEED - speed;
    let millis = if raw_delay <= 0 {
        0
    } else {
        let a = (MAX_DELAY_NANOS / MIN_DELAY_NANOS).powf(1.0 / (MAX_SPEED - 1) as f64);
        let nanos = a.powi(raw_delay - 1) * MIN_DELAY_NANOS;
        (nanos / 1_000_000.0).round() as u64
    };
    Duration::from_millis(millis.max(1))
}

/// Outcome of a scheduler tick request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Completed,
    /// A tick was already in flight; the request was dropped.
    Deferred,
}

/// Drives `World::run_tick` with a speed-derived interval.
///
/// The scheduler never overlaps ticks, clears per-tick input edges
/// after a completed tick, and stops itself when a tick fails.
pub struct Scheduler {
    speed: i32,
    running: bool,
    tick_active: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            speed: 50,
            running: false,
            tick_active: false,
        }
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }

    /// Adjusting speed is legal while running or stopped.
    pub fn set_speed(&mut self, speed: i32) {
        self.speed = speed.clamp(0, MAX_SPEED);
    }

    pub fn interval(&self) -> Duration {
        interval_for_speed(self.speed)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            info!(speed = self.speed, "scheduler_started");
        }
    }

    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            info!("scheduler_stopped");
        }
    }

    /// Runs one tick (timer fire or manual step). On failure the
    /// remainder of the tick was already abandoned by the world and the
    /// scheduler stops.
    pub fn run_tick(
        &mut self,
        world: &mut World,
        input: &mut InputState,
    ) -> Result<TickOutcome, TickError> {
        if self.tick_active {
            return Ok(TickOutcome::Deferred);
        }
        self.tick_active = true;
        let outcome = world.run_tick();
        self.tick_active = false;
        match outcome {
            Ok(()) => {
                input.end_of_tick();
                Ok(TickOutcome::Completed)
            }
            Err(error) => {
                self.running = false;
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::actor::{ActFailure, Actor, ActorHook, ActorId};
    use crate::sprite::Sprite;

    #[test]
    fn interval_hits_the_documented_endpoints() {
        assert_eq!(interval_for_speed(100), Duration::from_millis(1));
        assert_eq!(interval_for_speed(99), Duration::from_millis(1));
        assert_eq!(interval_for_speed(0), Duration::from_millis(10_000));
    }

    #[test]
    fn interval_is_monotonically_non_increasing_in_speed() {
        let mut previous = interval_for_speed(0);
        for speed in 1..=100 {
            let current = interval_for_speed(speed);
            assert!(
                current <= previous,
                "interval grew from speed {} to {}",
                speed - 1,
                speed
            );
            previous = current;
        }
    }

    #[test]
    fn out_of_range_speeds_clamp() {
        assert_eq!(interval_for_speed(-20), interval_for_speed(0));
        assert_eq!(interval_for_speed(400), interval_for_speed(100));
        let mut scheduler = Scheduler::new();
        scheduler.set_speed(1000);
        assert_eq!(scheduler.speed(), 100);
        scheduler.set_speed(-3);
        assert_eq!(scheduler.speed(), 0);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut scheduler = Scheduler::new();
        assert!(!scheduler.is_running());
        scheduler.start();
        scheduler.start();
        assert!(scheduler.is_running());
        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_running());
    }

    #[test]
    fn completed_tick_clears_input_edges() {
        let mut scheduler = Scheduler::new();
        let mut world = World::new(5, 5, 10);
        let mut input = InputState::new();
        input.key_down("space");

        let outcome = scheduler
            .run_tick(&mut world, &mut input)
            .expect("tick runs");
        assert_eq!(outcome, TickOutcome::Completed);
        assert!(!input.was_key_pressed("space"));
        assert!(input.is_key_down("space"));
    }

    #[test]
    fn failing_tick_stops_the_scheduler_and_keeps_input_edges() {
        struct Failing;
        impl ActorHook for Failing {
            fn act(&mut self, _world: &mut World, _me: ActorId) -> Result<(), ActFailure> {
                Err(ActFailure::new("jammed"))
            }
        }

        let mut scheduler = Scheduler::new();
        scheduler.start();
        let mut world = World::new(5, 5, 10);
        world.add_object_with(Actor::new(Sprite::new(2, 2)), Failing, 1, 1);
        let mut input = InputState::new();
        input.key_down("space");

        let error = scheduler
            .run_tick(&mut world, &mut input)
            .expect_err("tick fails");
        assert!(matches!(error, TickError::Actor { .. }));
        assert!(!scheduler.is_running());
        assert!(input.was_key_pressed("space"));
    }
}
