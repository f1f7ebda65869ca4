mod assets;
mod project;

pub use assets::{AssetError, AssetLoader, SoundHandle};
pub use project::{ProjectConfig, ProjectConfigError};
