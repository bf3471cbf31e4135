use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use twenty48_core::engine::EngineConfig;

#[derive(Clone, Debug, PartialEq, Default, serde::Deserialize)]
pub struct Config {
    // Engine settings live under `[engine]` / `[engine.timing]`.
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub frontend: Frontend,
    #[serde(default)]
    pub store: Store,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize)]
pub struct Frontend {
    /// Simulated frame length used to drive the animation clock.
    #[serde(default = "defaults::frame_ns")]
    pub frame_ns: u64,
    /// Upper bound on frames rendered while waiting for animations to settle.
    #[serde(default = "defaults::max_frames")]
    pub max_frames: u32,
    /// Print the board after each simulated frame instead of only when idle.
    #[serde(default)]
    pub show_frames: bool,
}

#[derive(Clone, Debug, PartialEq, serde::Deserialize, Default)]
pub struct Store {
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl Default for Frontend {
    fn default() -> Self {
        Self {
            frame_ns: defaults::frame_ns(),
            max_frames: defaults::max_frames(),
            show_frames: false,
        }
    }
}

impl Config {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(contents)?;
        cfg.engine.validate()?;
        Ok(cfg)
    }
}

mod defaults {
    pub fn frame_ns() -> u64 { 16_666_667 }
    pub fn max_frames() -> u32 { 600 }
}
