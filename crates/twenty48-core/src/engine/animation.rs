//! Time-driven animation model.
//!
//! The engine never schedules anything: it appends records when tiles spawn,
//! slide or merge, and the frame loop outside the engine advances every
//! record through [`AnimationTimeline::tick_all`]. Progress is derived from
//! the accumulated elapsed time, so the same timeline can be replayed or
//! sampled at any rate.

use serde::{Deserialize, Serialize};

use super::state::Cell;

/// What a record animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimationKind {
    Spawn,
    Move,
    Merge,
    /// End-of-game overlay fade; not tied to a cell.
    FadeGlobal,
}

/// Extra data carried by move records: where the tile came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveExtras {
    pub from: Cell,
    /// True when the moving tile was absorbed by a merge at the target.
    pub merged: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationRecord {
    pub cell: Cell,
    pub kind: AnimationKind,
    /// Nanoseconds accumulated since the record was created.
    pub elapsed: u64,
    pub duration: u64,
    pub start_delay: u64,
    pub extras: Option<MoveExtras>,
}

impl AnimationRecord {
    pub fn new(
        cell: Cell,
        kind: AnimationKind,
        duration: u64,
        start_delay: u64,
        extras: Option<MoveExtras>,
    ) -> Self {
        Self {
            cell,
            kind,
            elapsed: 0,
            duration,
            start_delay,
            extras,
        }
    }

    /// Progress in `[0, 1]`; zero until the start delay has passed.
    pub fn percentage_done(&self) -> f64 {
        if self.duration == 0 {
            return if self.elapsed >= self.start_delay { 1.0 } else { 0.0 };
        }
        let running = self.elapsed as f64 - self.start_delay as f64;
        (running / self.duration as f64).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.percentage_done() < 1.0
    }

    #[inline]
    pub fn tick(&mut self, elapsed: u64) {
        self.elapsed = self.elapsed.saturating_add(elapsed);
    }
}

/// Per-cell animation records plus the global (grid-independent) list.
#[derive(Clone, Debug)]
pub struct AnimationTimeline {
    width: usize,
    height: usize,
    cells: Vec<Vec<AnimationRecord>>,
    global: Vec<AnimationRecord>,
}

impl AnimationTimeline {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Vec::new(); width * height],
            global: Vec::new(),
        }
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        let in_bounds = cell.x >= 0
            && cell.y >= 0
            && (cell.x as usize) < self.width
            && (cell.y as usize) < self.height;
        in_bounds.then(|| cell.y as usize * self.width + cell.x as usize)
    }

    /// Append a record. `FadeGlobal` records go to the global list whatever
    /// cell they name; other records must name a cell on the grid.
    pub fn start_animation(
        &mut self,
        cell: Cell,
        kind: AnimationKind,
        duration: u64,
        start_delay: u64,
        extras: Option<MoveExtras>,
    ) {
        let record = AnimationRecord::new(cell, kind, duration, start_delay, extras);
        if kind == AnimationKind::FadeGlobal {
            self.global.push(record);
            return;
        }
        let idx = self
            .index(cell)
            .unwrap_or_else(|| panic!("animation for off-grid cell {cell}"));
        self.cells[idx].push(record);
    }

    /// Advance every record by `elapsed` nanoseconds and drop the ones that
    /// have finished.
    pub fn tick_all(&mut self, elapsed: u64) {
        for list in self.cells.iter_mut().chain(std::iter::once(&mut self.global)) {
            for record in list.iter_mut() {
                record.tick(elapsed);
            }
            list.retain(AnimationRecord::is_active);
        }
    }

    /// Drop every record, including the global ones.
    pub fn cancel_animations(&mut self) {
        self.cells.iter_mut().for_each(Vec::clear);
        self.global.clear();
    }

    pub fn is_animation_active(&self) -> bool {
        self.global.iter().any(AnimationRecord::is_active)
            || self.cells.iter().flatten().any(AnimationRecord::is_active)
    }

    /// Records for `cell`, oldest first. Empty for off-grid cells.
    pub fn cell_animations(&self, cell: Cell) -> &[AnimationRecord] {
        match self.index(cell) {
            Some(idx) => &self.cells[idx],
            None => &[],
        }
    }

    pub fn global_animations(&self) -> &[AnimationRecord] {
        &self.global
    }

    /// All per-cell records, grid order.
    pub fn records(&self) -> impl Iterator<Item = &AnimationRecord> {
        self.cells.iter().flatten()
    }
}
