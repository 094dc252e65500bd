use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::app::Texture;
use crate::asset_keys::{validate_asset_key, AssetKeyError};

const TEXTURE_EXTENSION: &str = "png";
const SOUND_EXTENSIONS: [&str; 2] = ["wav", "ogg"];

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("invalid asset key '{key}': {source}")]
    InvalidKey {
        key: String,
        #[source]
        source: AssetKeyError,
    },
    #[error("failed to open asset {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("image {path} has no pixels")]
    Empty { path: PathBuf },
    #[error("no sound file for '{key}' under {dir}")]
    SoundNotFound { key: String, dir: PathBuf },
}

impl AssetError {
    pub fn is_not_found(&self) -> bool {
        match self {
            AssetError::Open { source, .. } => source.kind() == io::ErrorKind::NotFound,
            AssetError::SoundNotFound { .. } => true,
            _ => false,
        }
    }
}

/// Loads textures from `assets/textures/<key>.png` and sound clips from
/// `assets/sounds/<key>.{wav,ogg}`.
///
/// Absent or broken files are not fatal: the lookup returns `None` and a single
/// warning is logged per key so callers can fall back to generated content.
#[derive(Debug)]
pub struct Assets {
    textures_dir: PathBuf,
    sounds_dir: PathBuf,
    warned_keys: HashSet<String>,
}

impl Assets {
    pub fn new(assets_dir: &Path) -> Self {
        Self {
            textures_dir: assets_dir.join("textures"),
            sounds_dir: assets_dir.join("sounds"),
            warned_keys: HashSet::new(),
        }
    }

    pub fn texture_path(&self, key: &str) -> PathBuf {
        self.textures_dir.join(format!("{key}.{TEXTURE_EXTENSION}"))
    }

    pub fn load_texture(&self, key: &str) -> Result<Texture, AssetError> {
        validate_key(key)?;
        Texture::load(&self.texture_path(key))
    }

    pub fn texture(&mut self, key: &str) -> Option<Texture> {
        match self.load_texture(key) {
            Ok(texture) => Some(texture),
            Err(error) => {
                self.warn_once("texture", key, &error);
                None
            }
        }
    }

    pub fn load_sound(&self, key: &str) -> Result<Vec<u8>, AssetError> {
        validate_key(key)?;
        for extension in SOUND_EXTENSIONS {
            let path = self.sounds_dir.join(format!("{key}.{extension}"));
            match fs::read(&path) {
                Ok(bytes) => return Ok(bytes),
                Err(source) if source.kind() == io::ErrorKind::NotFound => continue,
                Err(source) => return Err(AssetError::Open { path, source }),
            }
        }
        Err(AssetError::SoundNotFound {
            key: key.to_string(),
            dir: self.sounds_dir.clone(),
        })
    }

    pub fn sound(&mut self, key: &str) -> Option<Vec<u8>> {
        match self.load_sound(key) {
            Ok(bytes) => Some(bytes),
            Err(error) => {
                self.warn_once("sound", key, &error);
                None
            }
        }
    }

    /// Logs through the same once-per-key gate as failed lookups. Used when a
    /// file was found but could not be decoded by its consumer.
    pub fn report_unusable(&mut self, kind: &'static str, key: &str, reason: &dyn fmt::Display) {
        if self.warned_keys.insert(format!("{kind}:{key}")) {
            warn!(kind, key, error = %reason, "asset_unusable");
        }
    }

    fn warn_once(&mut self, kind: &'static str, key: &str, error: &AssetError) {
        if !self.warned_keys.insert(format!("{kind}:{key}")) {
            return;
        }
        if error.is_not_found() {
            warn!(kind, key, "asset_missing_using_fallback");
        } else {
            warn!(kind, key, error = %error, "asset_load_failed_using_fallback");
        }
    }
}

fn validate_key(key: &str) -> Result<(), AssetError> {
    validate_asset_key(key).map_err(|source| AssetError::InvalidKey {
        key: key.to_string(),
        source,
    })
}
