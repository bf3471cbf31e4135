use serde::Deserialize;
use thiserror::Error;

use super::tile::{MAX_TILE_VALUE, is_tile_value};

/// Base animation unit: 100 ms in nanoseconds.
pub const BASE_ANIMATION_NS: u64 = 100_000_000;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("grid dimensions must be non-zero (got {width}x{height})")]
    EmptyGrid { width: usize, height: usize },
    #[error("{name} must be a power of two between 4 and {max} (got {value})", max = MAX_TILE_VALUE >> 1)]
    BadWinValue { name: &'static str, value: u32 },
    #[error("four_probability must be within [0, 1] (got {0})")]
    BadProbability(f64),
    #[error("start_tiles ({start_tiles}) exceeds the number of cells ({cells})")]
    TooManyStartTiles { start_tiles: usize, cells: usize },
}

/// Engine parameters. Every field has a default so partial TOML works.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "defaults::side")]
    pub width: usize,
    #[serde(default = "defaults::side")]
    pub height: usize,
    /// Tile value that wins a normal game.
    #[serde(default = "defaults::win_value")]
    pub win_value: u32,
    /// Threshold used once endless mode has been entered.
    #[serde(default = "defaults::endless_win_value")]
    pub endless_win_value: u32,
    #[serde(default = "defaults::start_tiles")]
    pub start_tiles: usize,
    /// Probability that a spawned tile is a 4 instead of a 2.
    #[serde(default = "defaults::four_probability")]
    pub four_probability: f64,
    #[serde(default)]
    pub timing: AnimationTiming,
}

/// Durations and delays (nanoseconds) attached to emitted animation records.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AnimationTiming {
    #[serde(default = "defaults::base_ns")]
    pub move_ns: u64,
    #[serde(default = "defaults::base_ns")]
    pub spawn_ns: u64,
    #[serde(default = "defaults::base_ns")]
    pub merge_ns: u64,
    #[serde(default = "defaults::fade_ns")]
    pub fade_ns: u64,
    #[serde(default = "defaults::fade_delay_ns")]
    pub fade_delay_ns: u64,
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self {
            move_ns: defaults::base_ns(),
            spawn_ns: defaults::base_ns(),
            merge_ns: defaults::base_ns(),
            fade_ns: defaults::fade_ns(),
            fade_delay_ns: defaults::fade_delay_ns(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: defaults::side(),
            height: defaults::side(),
            win_value: defaults::win_value(),
            endless_win_value: defaults::endless_win_value(),
            start_tiles: defaults::start_tiles(),
            four_probability: defaults::four_probability(),
            timing: AnimationTiming::default(),
        }
    }
}

impl EngineConfig {
    /// Default settings on a `width` x `height` grid.
    pub fn with_size(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::EmptyGrid {
                width: self.width,
                height: self.height,
            });
        }
        for (name, value) in [
            ("win_value", self.win_value),
            ("endless_win_value", self.endless_win_value),
        ] {
            // the winning tile must still be able to double
            if !is_tile_value(value) || value < 4 || value > MAX_TILE_VALUE >> 1 {
                return Err(ConfigError::BadWinValue { name, value });
            }
        }
        if !(0.0..=1.0).contains(&self.four_probability) {
            return Err(ConfigError::BadProbability(self.four_probability));
        }
        let cells = self.width * self.height;
        if self.start_tiles > cells {
            return Err(ConfigError::TooManyStartTiles {
                start_tiles: self.start_tiles,
                cells,
            });
        }
        Ok(())
    }
}

mod defaults {
    use super::BASE_ANIMATION_NS;

    pub fn side() -> usize { 4 }
    pub fn win_value() -> u32 { 2048 }
    pub fn endless_win_value() -> u32 { 1 << 20 }
    pub fn start_tiles() -> usize { 2 }
    pub fn four_probability() -> f64 { 0.1 }
    pub fn base_ns() -> u64 { BASE_ANIMATION_NS }
    pub fn fade_ns() -> u64 { BASE_ANIMATION_NS * 5 }
    pub fn fade_delay_ns() -> u64 { BASE_ANIMATION_NS * 2 }
}
