use std::fmt;

use super::state::Cell;

/// A numbered tile. Compared by content: two tiles are equal when they sit on
/// the same cell with the same value and the same merge provenance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    pub position: Cell,
    pub value: u32,
    /// The two tiles this one was created from, as they were just before the
    /// merge. Only set during the move that created the tile; it also acts as
    /// the merge lock for the rest of that move.
    pub merged_from: Option<Box<[Tile; 2]>>,
}

impl Tile {
    /// Creates a fresh tile with no merge provenance.
    pub fn new(position: Cell, value: u32) -> Self {
        debug_assert!(is_tile_value(value), "invalid tile value {value}");
        Self {
            position,
            value,
            merged_from: None,
        }
    }

    /// Creates the tile produced by merging `moving` into `target`.
    ///
    /// The result sits at `target`'s position with twice its value and is
    /// merge-locked until the next move.
    pub fn merged(moving: Tile, target: Tile) -> Self {
        debug_assert_eq!(moving.value, target.value);
        debug_assert!(can_double(target.value), "tile {} cannot double", target.value);
        Self {
            position: target.position,
            value: target.value * 2,
            merged_from: Some(Box::new([moving, target])),
        }
    }

    #[inline]
    pub fn is_merge_locked(&self) -> bool {
        self.merged_from.is_some()
    }

    #[inline]
    pub fn clear_merge_lock(&mut self) {
        self.merged_from = None;
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Largest value a `u32` tile can hold. Tiles this large never merge.
pub const MAX_TILE_VALUE: u32 = 1 << 31;

/// True when two tiles of `value` can merge without overflowing.
#[inline]
pub fn can_double(value: u32) -> bool {
    value < MAX_TILE_VALUE
}

/// True for powers of two that are at least 2.
#[inline]
pub fn is_tile_value(value: u32) -> bool {
    value >= 2 && value.is_power_of_two()
}
