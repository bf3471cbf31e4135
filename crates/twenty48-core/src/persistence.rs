//! Capabilities the engine calls out to: high-score storage and optional
//! premade boards.
//!
//! Both are owned by the engine for its lifetime. Implementations handle
//! their own I/O failures; nothing here can fail from the engine's side.

use std::cell::Cell as SharedCell;
use std::rc::Rc;

use crate::engine::Cell;

/// Where the high score lives between sessions.
pub trait ScorePersistence {
    /// The recorded high score, or `None` if nothing has been recorded.
    fn load(&mut self) -> Option<i64>;

    /// Best-effort write; failures must be handled by the implementation.
    fn save(&mut self, high_score: i64);
}

/// Supplies a fixed starting board for new games (debugging, puzzles, tests).
pub trait DebugBoardSource {
    /// Tiles to place instead of the random start tiles, if any.
    fn generate_premade_map(&mut self) -> Option<Vec<(Cell, u32)>>;

    /// Score a new game starts from.
    fn starting_score(&self) -> i64 {
        0
    }
}

/// Discards writes and never has a recorded score.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPersistence;

impl ScorePersistence for NoPersistence {
    fn load(&mut self) -> Option<i64> {
        None
    }

    fn save(&mut self, _high_score: i64) {}
}

/// In-process store. Clones share the same slot, so a caller can keep a
/// handle while the engine owns another.
#[derive(Debug, Default, Clone)]
pub struct MemoryScoreStore {
    value: Rc<SharedCell<Option<i64>>>,
    saves: Rc<SharedCell<usize>>,
}

impl MemoryScoreStore {
    pub fn with_value(value: i64) -> Self {
        let store = Self::default();
        store.value.set(Some(value));
        store
    }

    pub fn get(&self) -> Option<i64> {
        self.value.get()
    }

    /// Number of `save` calls seen so far.
    pub fn save_count(&self) -> usize {
        self.saves.get()
    }
}

impl ScorePersistence for MemoryScoreStore {
    fn load(&mut self) -> Option<i64> {
        self.value.get()
    }

    fn save(&mut self, high_score: i64) {
        self.value.set(Some(high_score));
        self.saves.set(self.saves.get() + 1);
    }
}

/// A board source that always hands out the same tiles.
#[derive(Debug, Clone, Default)]
pub struct FixedBoard {
    pub tiles: Vec<(Cell, u32)>,
    pub starting_score: i64,
}

impl FixedBoard {
    pub fn new(tiles: Vec<(Cell, u32)>) -> Self {
        Self {
            tiles,
            starting_score: 0,
        }
    }

    /// Build from rows of values, `0` meaning empty. Row `y` is `rows[y]`.
    pub fn from_rows(rows: &[&[u32]]) -> Self {
        let tiles = rows
            .iter()
            .enumerate()
            .flat_map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .filter(|(_, v)| **v != 0)
                    .map(move |(x, &v)| (Cell::new(x as i32, y as i32), v))
                    .collect::<Vec<_>>()
            })
            .collect();
        Self::new(tiles)
    }
}

impl DebugBoardSource for FixedBoard {
    fn generate_premade_map(&mut self) -> Option<Vec<(Cell, u32)>> {
        Some(self.tiles.clone())
    }

    fn starting_score(&self) -> i64 {
        self.starting_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_clones_share_state() {
        let store = MemoryScoreStore::default();
        let mut handle = store.clone();
        assert_eq!(handle.load(), None);
        handle.save(128);
        assert_eq!(store.get(), Some(128));
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn fixed_board_from_rows_skips_zeros() {
        let mut board = FixedBoard::from_rows(&[&[2, 0], &[0, 4]]);
        assert_eq!(
            board.generate_premade_map(),
            Some(vec![(Cell::new(0, 0), 2), (Cell::new(1, 1), 4)])
        );
        assert_eq!(board.starting_score(), 0);
    }
}
