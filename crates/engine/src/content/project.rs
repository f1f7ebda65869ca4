//! Project configuration: simulation speed and per-class default images.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectConfigError {
    #[error("failed to read project config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse project config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_path_to_error::Error<serde_json::Error>,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    simulation: SimulationSection,
    #[serde(default)]
    classes: HashMap<String, ClassSection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SimulationSection {
    speed: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ClassSection {
    image: Option<String>,
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self, ProjectConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ProjectConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut deserializer = serde_json::Deserializer::from_str(&raw);
        serde_path_to_error::deserialize(&mut deserializer).map_err(|source| {
            ProjectConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    pub fn simulation_speed(&self) -> Option<i32> {
        self.simulation.speed
    }

    /// Default image for a behavior type. Accepts fully qualified type
    /// names; the lookup key is the final path segment.
    pub fn default_image_name(&self, type_name: &str) -> Option<&str> {
        let simple = type_name.rsplit("::").next().unwrap_or(type_name);
        self.classes.get(simple)?.image.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(raw: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("project.json");
        fs::write(&path, raw).expect("write config");
        (dir, path)
    }

    #[test]
    fn full_config_round_trips() {
        let (_dir, path) = write_config(
            r#"{
                "simulation": { "speed": 75 },
                "classes": {
                    "Crab": { "image": "crab.png" },
                    "Worm": { "image": "worm.png" }
                }
            }"#,
        );
        let config = ProjectConfig::load(&path).expect("parse");
        assert_eq!(config.simulation_speed(), Some(75));
        assert_eq!(config.default_image_name("Crab"), Some("crab.png"));
        assert_eq!(config.default_image_name("Snail"), None);
    }

    #[test]
    fn lookup_accepts_fully_qualified_type_names() {
        let (_dir, path) =
            write_config(r#"{ "classes": { "Crab": { "image": "crab.png" } } }"#);
        let config = ProjectConfig::load(&path).expect("parse");
        assert_eq!(
            config.default_image_name("scenario::beach::Crab"),
            Some("crab.png")
        );
    }

    #[test]
    fn empty_document_yields_defaults() {
        let (_dir, path) = write_config("{}");
        let config = ProjectConfig::load(&path).expect("parse");
        assert_eq!(config.simulation_speed(), None);
        assert_eq!(config.default_image_name("Crab"), None);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = TempDir::new().expect("temp dir");
        let result = ProjectConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ProjectConfigError::Read { .. })));
    }

    #[test]
    fn type_errors_report_the_json_path() {
        let (_dir, path) = write_config(r#"{ "simulation": { "speed": "fast" } }"#);
        let error = ProjectConfig::load(&path).expect_err("must not parse");
        assert!(error.to_string().contains("simulation.speed"));
    }
}
