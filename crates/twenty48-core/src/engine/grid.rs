use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

use super::state::{Cell, Direction};
use super::tile::Tile;
use super::undo::UndoBuffer;

type Cells = Vec<Option<Tile>>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell {0} is already occupied")]
    OccupiedCell(Cell),
    #[error("cell {0} is outside the grid")]
    OutOfBounds(Cell),
}

/// Fixed-size W×H board. Each cell owns at most one tile.
///
/// Storage is row-major (`y * width + x`). The grid also carries the tile
/// half of the undo protocol: [`Grid::prepare_snapshot`] stages the live
/// cells, [`Grid::commit_snapshot`] makes them the undo target and
/// [`Grid::revert_snapshot`] restores them.
#[derive(Clone, Debug)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Cells,
    snapshots: UndoBuffer<Cells>,
}

impl Grid {
    /// An empty grid. Panics on a zero dimension.
    pub fn new(width: usize, height: usize) -> Self {
        assert!(width > 0 && height > 0, "grid must be at least 1x1");
        Self {
            width,
            height,
            cells: vec![None; width * height],
            snapshots: UndoBuffer::new(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Live cells in row-major order.
    #[inline]
    pub fn cells(&self) -> &[Option<Tile>] {
        &self.cells
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        if self.is_cell_within_bounds(cell) {
            Some(cell.y as usize * self.width + cell.x as usize)
        } else {
            None
        }
    }

    #[inline]
    pub fn is_cell_within_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && (cell.x as usize) < self.width && (cell.y as usize) < self.height
    }

    /// In bounds and empty.
    #[inline]
    pub fn is_cell_available(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|idx| self.cells[idx].is_none())
    }

    #[inline]
    pub fn is_cell_occupied(&self, cell: Cell) -> bool {
        self.cell_content(cell).is_some()
    }

    /// The tile at `cell`; `None` for empty or out-of-bounds cells.
    pub fn cell_content(&self, cell: Cell) -> Option<&Tile> {
        self.index(cell).and_then(|idx| self.cells[idx].as_ref())
    }

    pub fn has_available_cells(&self) -> bool {
        self.cells.iter().any(Option::is_none)
    }

    /// Empty cells in row-major order.
    pub fn available_cells(&self) -> Vec<Cell> {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_none())
            .map(|(idx, _)| self.cell_at(idx))
            .collect()
    }

    /// A uniformly random empty cell, or `None` if the grid is full.
    pub fn random_available_cell<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Cell> {
        self.available_cells().choose(rng).copied()
    }

    fn cell_at(&self, idx: usize) -> Cell {
        Cell::new((idx % self.width) as i32, (idx / self.width) as i32)
    }

    /// Place `tile` at its recorded position.
    pub fn insert(&mut self, tile: Tile) -> Result<(), GridError> {
        let idx = self
            .index(tile.position)
            .ok_or(GridError::OutOfBounds(tile.position))?;
        if self.cells[idx].is_some() {
            return Err(GridError::OccupiedCell(tile.position));
        }
        self.cells[idx] = Some(tile);
        Ok(())
    }

    /// Remove `tile` from its recorded position. Does nothing unless that
    /// cell holds an equal tile.
    pub fn remove(&mut self, tile: &Tile) {
        if let Some(idx) = self.index(tile.position) {
            if self.cells[idx].as_ref() == Some(tile) {
                self.cells[idx] = None;
            }
        }
    }

    /// Take whatever tile sits at `cell`.
    pub fn take(&mut self, cell: Cell) -> Option<Tile> {
        let idx = self.index(cell)?;
        self.cells[idx].take()
    }

    /// Slide the tile at `from` to the empty cell `to`, updating its position.
    pub fn move_tile(&mut self, from: Cell, to: Cell) -> Result<(), GridError> {
        if from == to {
            return Ok(());
        }
        let to_idx = self.index(to).ok_or(GridError::OutOfBounds(to))?;
        if self.cells[to_idx].is_some() {
            return Err(GridError::OccupiedCell(to));
        }
        if let Some(mut tile) = self.take(from) {
            tile.position = to;
            self.cells[to_idx] = Some(tile);
        }
        Ok(())
    }

    pub fn clear_merge_locks(&mut self) {
        for tile in self.cells.iter_mut().flatten() {
            tile.clear_merge_lock();
        }
    }

    /// Any two orthogonally adjacent tiles with equal values.
    pub fn has_adjacent_match(&self) -> bool {
        self.tiles().any(|tile| {
            Direction::ALL.iter().any(|dir| {
                self.cell_content(tile.position.step(dir.vector()))
                    .is_some_and(|other| other.value == tile.value)
            })
        })
    }

    /// True if some move could still change the grid.
    pub fn moves_available(&self) -> bool {
        self.has_available_cells() || self.has_adjacent_match()
    }

    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.cells.iter().flatten()
    }

    pub fn highest_value(&self) -> u32 {
        self.tiles().map(|t| t.value).max().unwrap_or(0)
    }

    /// Empty the live cells. Snapshots are left alone.
    pub fn clear(&mut self) {
        self.cells.iter_mut().for_each(|slot| *slot = None);
    }

    /// Stage the live cells as the candidate undo target.
    pub fn prepare_snapshot(&mut self) {
        self.snapshots.prepare(self.cells.clone());
    }

    /// Promote the staged cells to the undo target.
    pub fn commit_snapshot(&mut self) -> bool {
        self.snapshots.commit()
    }

    pub fn discard_snapshot(&mut self) {
        self.snapshots.discard();
    }

    /// Restore the committed cells into the live grid. Returns false (and
    /// leaves the grid untouched) if no snapshot was committed.
    pub fn revert_snapshot(&mut self) -> bool {
        match self.snapshots.take() {
            Some(cells) => {
                self.cells = cells;
                true
            }
            None => false,
        }
    }
}

pub(crate) fn format_val(value: u32) -> String {
    match value {
        0 => String::from("       "),
        x => {
            let mut x = x.to_string();
            while x.len() < 7 {
                match x.len() {
                    6 => x = format!(" {}", x),
                    _ => x = format!(" {} ", x),
                }
            }
            x
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(self.width * 8);
        for (row_idx, row) in self.cells.chunks(self.width).enumerate() {
            if row_idx > 0 {
                writeln!(f, "{rule}")?;
            }
            let line: Vec<String> = row
                .iter()
                .map(|slot| format_val(slot.as_ref().map_or(0, |t| t.value)))
                .collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        Ok(())
    }
}
