//! Premade boards loaded from TOML, for `--board`.
//!
//! Either list tiles explicitly or give whole rows (0 = empty):
//!
//! ```toml
//! starting_score = 100
//! rows = [[2, 2, 4, 0], [0, 0, 0, 0]]
//!
//! [[tiles]]
//! x = 3
//! y = 3
//! value = 1024
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use twenty48_core::engine::Cell;
use twenty48_core::persistence::DebugBoardSource;

#[derive(Clone, Debug, PartialEq, Deserialize)]
struct TileEntry {
    x: i32,
    y: i32,
    value: u32,
}

#[derive(Clone, Debug, PartialEq, Default, Deserialize)]
struct BoardFile {
    #[serde(default)]
    starting_score: i64,
    #[serde(default)]
    rows: Vec<Vec<u32>>,
    #[serde(default)]
    tiles: Vec<TileEntry>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FileBoardSource {
    tiles: Vec<(Cell, u32)>,
    starting_score: i64,
}

impl FileBoardSource {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read board {}", path.display()))?;
        Self::from_toml_str(&contents).with_context(|| format!("failed to parse board {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let file: BoardFile = toml::from_str(contents)?;
        let from_rows = file.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, v)| **v != 0)
                .map(move |(x, &v)| (Cell::new(x as i32, y as i32), v))
        });
        let listed = file.tiles.iter().map(|t| (Cell::new(t.x, t.y), t.value));
        Ok(Self {
            tiles: from_rows.chain(listed).collect(),
            starting_score: file.starting_score,
        })
    }
}

impl DebugBoardSource for FileBoardSource {
    fn generate_premade_map(&mut self) -> Option<Vec<(Cell, u32)>> {
        Some(self.tiles.clone())
    }

    fn starting_score(&self) -> i64 {
        self.starting_score
    }
}
