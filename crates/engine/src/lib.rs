use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod content;
mod font;
pub mod grid;
pub mod shape;
pub mod sim;
pub mod sprite;

pub use content::{AssetError, AssetLoader, ProjectConfig, ProjectConfigError, SoundHandle};
pub use shape::BoundingBox;
pub use sim::{
    compose, interval_for_speed, ActFailure, Actor, ActorHook, ActorId, ActorPose,
    ConstructionFailure, FrameSnapshot, InputState, Scheduler, Simulation, TextOverlay, TickError,
    TickOutcome, World, WorldHook, MAX_SPEED,
};
pub use sprite::Sprite;

pub const ROOT_ENV_VAR: &str = "GRIDLING_ROOT";

#[derive(Debug, Clone)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub images_dir: PathBuf,
    pub sounds_dir: PathBuf,
    pub config_file: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "GRIDLING_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain project.json or an images/ directory."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect a project root by walking upward from the executable directory: {start_dir}\n\
Expected a directory containing project.json or images/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/project\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_project_paths() -> Result<ProjectPaths, StartupError> {
    let root = resolve_root()?;
    Ok(ProjectPaths {
        images_dir: root.join("images"),
        sounds_dir: root.join("sounds"),
        config_file: root.join("project.json"),
        root,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_project_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_project_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_project_marker(path: &Path) -> bool {
    path.join("project.json").is_file() || path.join("images").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
