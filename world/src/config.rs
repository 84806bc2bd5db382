//! Read-only configuration injected into every grid.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Layout of the tile-set image and animation pacing shared by all components.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSet {
    /// Number of frame rows in the tile-set image.
    #[serde(default = "default_frame_rows")]
    pub frame_rows: u32,
    /// Number of frame columns in the tile-set image.
    #[serde(default = "default_frame_columns")]
    pub frame_columns: u32,
    /// Ticks each animation frame stays on screen.
    #[serde(default = "default_animation_frame_change")]
    pub animation_frame_change: u32,
}

impl TileSet {
    /// Number of addressable frames.
    #[must_use]
    pub const fn frame_count(&self) -> u32 {
        self.frame_rows * self.frame_columns
    }

    /// Row and column of a frame inside the tile-set image.
    ///
    /// Returns `None` for indices outside the image.
    #[must_use]
    pub fn frame_position(&self, index: u32) -> Option<(u32, u32)> {
        if self.frame_columns == 0 || index >= self.frame_count() {
            return None;
        }
        Some((index / self.frame_columns, index % self.frame_columns))
    }

    /// Picks the frame of a looping animation for the provided tick count.
    pub(crate) fn animate(&self, frames: &[u32], tick: u32) -> u32 {
        if frames.is_empty() {
            return 0;
        }
        let change = self.animation_frame_change.max(1);
        let index = (tick / change) as usize % frames.len();
        frames[index]
    }
}

impl Default for TileSet {
    fn default() -> Self {
        Self {
            frame_rows: default_frame_rows(),
            frame_columns: default_frame_columns(),
            animation_frame_change: default_animation_frame_change(),
        }
    }
}

/// Tunables of the simulation, loaded once and shared read-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// Ticks per simulated second; the level timer decrements once per second.
    #[serde(default = "default_frames_per_second")]
    pub frames_per_second: u32,
    /// Ticks between two steps of an autonomous actor.
    #[serde(default = "default_enemy_step_frames")]
    pub enemy_step_frames: u32,
    /// Interpolation speed handed to renderers, in pixels per tick.
    #[serde(default = "default_move_speed")]
    pub move_speed: f32,
    /// Ticks between two undo snapshots.
    #[serde(default = "default_undo_cadence")]
    pub undo_cadence: u64,
    /// Number of undo snapshots retained.
    #[serde(default = "default_max_undos")]
    pub max_undos: usize,
    /// Default tracing filter used by hosts when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Tile-set layout and animation pacing.
    #[serde(default)]
    pub tile_set: TileSet,
}

fn default_frame_rows() -> u32 {
    16
}
fn default_frame_columns() -> u32 {
    16
}
fn default_animation_frame_change() -> u32 {
    3
}
fn default_frames_per_second() -> u32 {
    30
}
fn default_enemy_step_frames() -> u32 {
    6
}
fn default_move_speed() -> f32 {
    10.0
}
fn default_undo_cadence() -> u64 {
    150
}
fn default_max_undos() -> usize {
    5
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            frames_per_second: default_frames_per_second(),
            enemy_step_frames: default_enemy_step_frames(),
            move_speed: default_move_speed(),
            undo_cadence: default_undo_cadence(),
            max_undos: default_max_undos(),
            log_level: default_log_level(),
            tile_set: TileSet::default(),
        }
    }
}

/// Reasons a configuration could not be accepted.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML source could not be parsed.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A field held a value outside its permitted range.
    #[error("configuration field `{field}` {reason}")]
    OutOfRange {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the violated constraint.
        reason: &'static str,
    },
}

impl GridConfig {
    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: GridConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field against its permitted range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frames_per_second == 0 {
            return Err(out_of_range("frames_per_second", "must be positive"));
        }
        if !self.move_speed.is_finite() || self.move_speed <= 0.0 {
            return Err(out_of_range("move_speed", "must be a positive number"));
        }
        if self.undo_cadence == 0 {
            return Err(out_of_range("undo_cadence", "must be positive"));
        }
        if self.tile_set.animation_frame_change == 0 {
            return Err(out_of_range(
                "tile_set.animation_frame_change",
                "must be positive",
            ));
        }
        if self.tile_set.frame_count() == 0 {
            return Err(out_of_range("tile_set", "must contain at least one frame"));
        }
        Ok(())
    }
}

fn out_of_range(field: &'static str, reason: &'static str) -> ConfigError {
    ConfigError::OutOfRange { field, reason }
}
