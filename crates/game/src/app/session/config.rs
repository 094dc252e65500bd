use std::fmt::Display;
use std::io;
use std::path::{Path, PathBuf};

use engine::storage::read_text_if_exists;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Variant {
    Kat,
    Square,
}

impl Variant {
    pub(crate) fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "kat" => Some(Variant::Kat),
            "square" => Some(Variant::Square),
            _ => None,
        }
    }

    pub(crate) fn title(self) -> &'static str {
        match self {
            Variant::Kat => "Flappy Kat",
            Variant::Square => "Flappy Square",
        }
    }
}

/// Which controls the session listens to and describes on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Platform {
    Desktop,
    Touch,
}

impl Platform {
    pub(crate) fn from_flag(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()) {
            Some(value) if value == "1" || value == "true" || value == "yes" => Platform::Touch,
            _ => Platform::Desktop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SessionConfig {
    pub variant: Variant,
    pub logical_width: u32,
    pub logical_height: u32,
    pub gravity: f32,
    pub jump_impulse: f32,
    pub base_pipe_speed: f32,
    pub speed_increment_per_level: f32,
    pub points_per_level: u32,
    pub pipe_width: f32,
    pub pipe_gap: f32,
    pub pipe_spawn_interval: f32,
    /// Limits how far a new gap centre may sit from the previous one.
    pub max_gap_shift: Option<f32>,
    pub player_size: f32,
    pub collision_width_ratio: f32,
    pub collision_height_ratio: f32,
    pub eyes_closed_seconds: f32,
    pub game_over_delay_seconds: f32,
    pub background_scroll_speed: f32,
    pub pause_tap_band: f32,
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::kat()
    }
}

impl SessionConfig {
    pub(crate) fn kat() -> Self {
        Self {
            variant: Variant::Kat,
            logical_width: 1280,
            logical_height: 720,
            gravity: 1200.0,
            jump_impulse: -400.0,
            base_pipe_speed: 400.0,
            speed_increment_per_level: 50.0,
            points_per_level: 10,
            pipe_width: 80.0,
            pipe_gap: 230.0,
            pipe_spawn_interval: 2.0,
            max_gap_shift: None,
            player_size: 60.0,
            collision_width_ratio: 0.75,
            collision_height_ratio: 0.65,
            eyes_closed_seconds: 0.33,
            game_over_delay_seconds: 0.5,
            background_scroll_speed: 60.0,
            pause_tap_band: 0.15,
            seed: None,
        }
    }

    pub(crate) fn square() -> Self {
        Self {
            variant: Variant::Square,
            gravity: 800.0,
            base_pipe_speed: 200.0,
            pipe_gap: 200.0,
            player_size: 30.0,
            collision_width_ratio: 1.0,
            collision_height_ratio: 1.0,
            background_scroll_speed: 0.0,
            ..Self::kat()
        }
    }

    pub(crate) fn preset(variant: Variant) -> Self {
        match variant {
            Variant::Kat => Self::kat(),
            Variant::Square => Self::square(),
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.logical_width == 0 || self.logical_height == 0 {
            return Err(invalid("logical_width", "logical resolution must be non-zero"));
        }
        if self.points_per_level == 0 {
            return Err(invalid("points_per_level", "must be at least 1"));
        }
        require_positive("pipe_width", self.pipe_width)?;
        require_positive("pipe_gap", self.pipe_gap)?;
        require_positive("pipe_spawn_interval", self.pipe_spawn_interval)?;
        require_positive("player_size", self.player_size)?;
        require_positive("collision_width_ratio", self.collision_width_ratio)?;
        require_positive("collision_height_ratio", self.collision_height_ratio)?;
        if self.pipe_gap > self.logical_height as f32 {
            return Err(invalid(
                "pipe_gap",
                format!("gap {} exceeds logical height {}", self.pipe_gap, self.logical_height),
            ));
        }
        if !(0.0..=1.0).contains(&self.pause_tap_band) {
            return Err(invalid("pause_tap_band", "expected a fraction in 0..=1"));
        }
        if let Some(shift) = self.max_gap_shift {
            require_positive("max_gap_shift", shift)?;
        }
        let finite = [
            self.gravity,
            self.jump_impulse,
            self.base_pipe_speed,
            self.speed_increment_per_level,
            self.eyes_closed_seconds,
            self.game_over_delay_seconds,
            self.background_scroll_speed,
        ];
        if finite.iter().any(|value| !value.is_finite()) {
            return Err(invalid("physics", "values must be finite"));
        }
        Ok(())
    }
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config {path} at {json_path}: {source}")]
    Parse {
        path: PathBuf,
        json_path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Reads optional overrides from `path` on top of a variant preset.
///
/// The preset comes from `variant_override` first, then the file's own
/// `variant` key, then [`Variant::Kat`]. A missing file yields the preset.
pub(crate) fn load_config(
    path: &Path,
    variant_override: Option<Variant>,
) -> Result<SessionConfig, ConfigError> {
    let raw = read_text_if_exists(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let Some(raw) = raw else {
        return Ok(SessionConfig::preset(variant_override.unwrap_or(Variant::Kat)));
    };
    let config = parse_config(&raw, variant_override).map_err(|(json_path, source)| {
        ConfigError::Parse {
            path: path.to_path_buf(),
            json_path,
            source,
        }
    })?;
    config.validate()?;
    Ok(config)
}

fn parse_config(
    raw: &str,
    variant_override: Option<Variant>,
) -> Result<SessionConfig, (String, serde_json::Error)> {
    let overrides: Value = deserialize_with_path(raw)?;
    let file_variant = overrides
        .get("variant")
        .and_then(Value::as_str)
        .and_then(Variant::parse);
    let variant = variant_override.or(file_variant).unwrap_or(Variant::Kat);

    let Value::Object(fields) = overrides else {
        return Err((
            ".".to_string(),
            serde::de::Error::custom("expected a JSON object of overrides"),
        ));
    };

    let mut merged = serde_json::to_value(SessionConfig::preset(variant))
        .map_err(|source| (".".to_string(), source))?;
    if let Value::Object(base) = &mut merged {
        base.extend(fields);
        // An unrecognised file variant stays raw so it is reported at `variant`.
        if variant_override.is_some() || file_variant.is_some() {
            let value = serde_json::to_value(variant).map_err(|source| (".".to_string(), source))?;
            base.insert("variant".to_string(), value);
        }
    }
    serde_path_to_error::deserialize(merged).map_err(|error| {
        let path = error.path().to_string();
        (path, error.into_inner())
    })
}

fn deserialize_with_path<T: serde::de::DeserializeOwned>(
    raw: &str,
) -> Result<T, (String, serde_json::Error)> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        (path, error.into_inner())
    })
}

fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("expected a positive number, got {value}")))
    }
}

fn invalid(field: &'static str, reason: impl Display) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
