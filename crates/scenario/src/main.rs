//! Headless beach scenario: a crab wanders the grid and eats worms.

use std::path::Path;
use std::thread;

use gridling::{
    resolve_project_paths, ActFailure, Actor, ActorHook, ActorId, AssetLoader,
    ConstructionFailure, ProjectConfig, Simulation, Sprite, World, WorldHook,
};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

const WORLD_WIDTH_CELLS: i32 = 12;
const WORLD_HEIGHT_CELLS: i32 = 12;
const CELL_SIZE_PX: i32 = 20;
const WORM_COUNT: i32 = 6;
const TICKS_TO_RUN: u32 = 120;
const EDGE_TURN_DEGREES: i32 = 37;

struct Worm;

impl ActorHook for Worm {}

struct Crab {
    eaten: u32,
}

impl ActorHook for Crab {
    fn act(&mut self, world: &mut World, me: ActorId) -> Result<(), ActFailure> {
        if world.is_at_edge(me) {
            world.turn(me, EDGE_TURN_DEGREES);
        }
        world.move_by(me, 1);
        if world.remove_touching::<Worm>(me).is_some() {
            self.eaten += 1;
            info!(eaten = self.eaten, "worm_eaten");
        }
        Ok(())
    }
}

struct Beach;

impl WorldHook for Beach {
    fn act(&mut self, world: &mut World) -> Result<(), ActFailure> {
        let remaining = world.objects::<Worm>().len();
        let x = world.width_px() as i32 / 2;
        if remaining == 0 {
            world.show_text("all worms eaten", x, 12);
        } else {
            world.show_text(&format!("worms left: {remaining}"), x, 12);
        }
        Ok(())
    }

    fn started(&mut self, world: &mut World) {
        info!(actors = world.number_of_objects(), "beach_started");
    }

    fn stopped(&mut self, world: &mut World) {
        info!(actors = world.number_of_objects(), "beach_stopped");
    }
}

fn build_world(
    assets: &mut AssetLoader,
    config: &ProjectConfig,
) -> Result<World, ConstructionFailure> {
    let mut world = World::new(WORLD_WIDTH_CELLS, WORLD_HEIGHT_CELLS, CELL_SIZE_PX);
    world.set_hook(Beach);
    world.add_object_with(
        Actor::new(configured_sprite(assets, config, "Crab")),
        Crab { eaten: 0 },
        WORLD_WIDTH_CELLS / 2,
        WORLD_HEIGHT_CELLS / 2,
    );
    for index in 0..WORM_COUNT {
        world.add_object_with(
            Actor::new(configured_sprite(assets, config, "Worm")),
            Worm,
            (index * 5 + 2) % WORLD_WIDTH_CELLS,
            (index * 3 + 1) % WORLD_HEIGHT_CELLS,
        );
    }
    Ok(world)
}

fn configured_sprite(assets: &mut AssetLoader, config: &ProjectConfig, class: &str) -> Sprite {
    match config.default_image_name(class) {
        Some(name) => {
            let name = name.to_string();
            assets.load_sprite(&name)
        }
        None => Sprite::placeholder(),
    }
}

fn main() {
    init_tracing();
    info!("=== Gridling Beach Scenario ===");

    let (assets, config) = match resolve_project_paths() {
        Ok(paths) => {
            let config = match ProjectConfig::load(&paths.config_file) {
                Ok(config) => config,
                Err(load_error) => {
                    warn!(error = %load_error, "project_config_unavailable");
                    ProjectConfig::default()
                }
            };
            (AssetLoader::new(&paths.root), config)
        }
        Err(startup_error) => {
            warn!(error = %startup_error, "project_root_not_found");
            (AssetLoader::new(Path::new(".")), ProjectConfig::default())
        }
    };

    let mut sim = match Simulation::new(assets, config, build_world) {
        Ok(sim) => sim,
        Err(build_error) => {
            error!(error = %build_error, "startup_failed");
            std::process::exit(1);
        }
    };
    sim.set_error_handler(|tick_error| error!(error = %tick_error, "simulation_halted"));

    sim.start();
    for tick in 0..TICKS_TO_RUN {
        if !sim.is_running() {
            break;
        }
        sim.tick();
        debug!(
            tick,
            actors = sim.world().number_of_objects(),
            worms_left = sim.world().objects::<Worm>().len(),
            "tick_done"
        );
        thread::sleep(sim.interval());
    }
    sim.stop();

    let world = sim.world();
    info!(
        actors = world.number_of_objects(),
        worms_left = world.objects::<Worm>().len(),
        "scenario_finished"
    );
    match gridling::compose(&world.frame()).save("frame.png") {
        Ok(()) => info!("final frame written to frame.png"),
        Err(save_error) => warn!(error = %save_error, "frame_write_failed"),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized_actor(width: u32, height: u32) -> Actor {
        Actor::new(Sprite::new(width, height))
    }

    #[test]
    fn scenario_world_populates_one_crab_and_all_worms() {
        let mut assets = AssetLoader::new(Path::new("."));
        let config = ProjectConfig::default();
        let world = build_world(&mut assets, &config).expect("world builds");
        assert_eq!(world.number_of_objects(), (1 + WORM_COUNT) as usize);
        assert_eq!(world.objects::<Worm>().len(), WORM_COUNT as usize);
        assert_eq!(world.objects::<Crab>().len(), 1);
    }

    #[test]
    fn crab_eats_an_overlapping_worm_during_a_tick() {
        let mut world = World::new(10, 10, 10);
        let crab = world.add_object_with(sized_actor(20, 20), Crab { eaten: 0 }, 4, 4);
        // The crab moves one cell east before checking contact; put the
        // worm in its path.
        let worm = world.add_object_with(sized_actor(20, 20), Worm, 5, 4);

        world.run_tick().expect("tick");

        assert!(!world.contains_actor(worm));
        assert_eq!(world.hook_mut::<Crab>(crab).expect("crab hook").eaten, 1);
        assert!(!world.is_touching::<Worm>(crab));
    }

    #[test]
    fn moving_off_the_west_edge_clamps_to_the_boundary_cell_center() {
        let mut world = World::new(10, 10, 20);
        let id = world.add_object_with(sized_actor(2, 2), Worm, 0, 0);
        assert_eq!(world.location(id), Some((10, 10)));
        world.set_rotation(id, 180);
        world.move_by(id, 5);
        assert_eq!(world.location(id), Some((10, 10)));
    }

    #[test]
    fn beach_banner_tracks_the_worm_count() {
        let mut world = World::new(10, 10, 10);
        world.set_hook(Beach);
        world.add_object_with(sized_actor(2, 2), Worm, 1, 1);

        world.run_tick().expect("tick");
        let overlays = world.text_overlays();
        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays[0].2, "worms left: 1");

        let worm = world.objects::<Worm>()[0];
        world.remove_object(worm);
        world.run_tick().expect("tick");
        assert_eq!(world.text_overlays()[0].2, "all worms eaten");
    }

    #[test]
    fn crab_turns_away_when_it_reaches_an_edge() {
        let mut world = World::new(10, 10, 10);
        let crab = world.add_object_with(sized_actor(2, 2), Crab { eaten: 0 }, 0, 5);
        world.run_tick().expect("tick");
        assert_eq!(world.rotation(crab), Some(EDGE_TURN_DEGREES));
    }
}
