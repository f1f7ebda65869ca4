//! Image and sound lookup under the project root.
//!
//! Lookups never fail the simulation: a missing or undecodable image
//! is logged and replaced by the placeholder sprite, a missing sound
//! simply yields `None`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use image::{ImageReader, RgbaImage};
use thiserror::Error;
use tracing::warn;

use crate::sprite::Sprite;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to open image {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Opaque loaded sound; playback is the host's concern.
pub struct SoundHandle {
    name: String,
    bytes: Vec<u8>,
}

impl SoundHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

pub struct AssetLoader {
    images_dir: PathBuf,
    sounds_dir: PathBuf,
    image_cache: HashMap<String, RgbaImage>,
    sound_cache: HashMap<String, Option<Rc<SoundHandle>>>,
}

impl AssetLoader {
    pub fn new(root: &Path) -> Self {
        Self {
            images_dir: root.join("images"),
            sounds_dir: root.join("sounds"),
            image_cache: HashMap::new(),
            sound_cache: HashMap::new(),
        }
    }

    /// Loads `images/<name>` and hands out a sprite with its own copy
    /// of the pixels; decoded files are cached by name. A failed load
    /// logs a warning and returns the placeholder.
    pub fn load_sprite(&mut self, name: &str) -> Sprite {
        if let Some(buffer) = self.image_cache.get(name) {
            return Sprite::from_buffer(name, buffer.clone());
        }
        let path = self.images_dir.join(name);
        match decode_image(&path) {
            Ok(buffer) => {
                self.image_cache.insert(name.to_string(), buffer.clone());
                Sprite::from_buffer(name, buffer)
            }
            Err(error) => {
                warn!(image = name, error = %error, "image_load_failed");
                Sprite::placeholder()
            }
        }
    }

    /// Loads `sounds/<name>`, caching hits and misses alike.
    pub fn load_sound(&mut self, name: &str) -> Option<Rc<SoundHandle>> {
        if let Some(cached) = self.sound_cache.get(name) {
            return cached.clone();
        }
        let path = self.sounds_dir.join(name);
        let loaded = match fs::read(&path) {
            Ok(bytes) => Some(Rc::new(SoundHandle {
                name: name.to_string(),
                bytes,
            })),
            Err(error) => {
                warn!(sound = name, error = %error, "sound_load_failed");
                None
            }
        };
        self.sound_cache.insert(name.to_string(), loaded.clone());
        loaded
    }
}

fn decode_image(path: &Path) -> Result<RgbaImage, AssetError> {
    let reader = ImageReader::open(path).map_err(|source| AssetError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = reader.decode().map_err(|source| AssetError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(decoded.into_rgba8())
}
