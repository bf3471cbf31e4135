//! Engine module: grid and tiles, the move/merge algorithm, the win/loss
//! state machine, single-level undo and animation timing metadata.
//!
//! - `GameEngine` owns everything and is the only thing that mutates it.
//! - `Grid`, `Tile` and `AnimationTimeline` are the read surface a renderer
//!   polls each frame.
//! - Internals (undo staging) live in submodules to keep things tidy.

mod animation;
mod config;
mod game;
mod grid;
pub mod state;
mod tile;
mod undo;

pub use animation::{AnimationKind, AnimationRecord, AnimationTimeline, MoveExtras};
pub use config::{AnimationTiming, BASE_ANIMATION_NS, ConfigError, EngineConfig};
pub use game::{GameEngine, GameEngineBuilder, MoveOutcome};
pub use grid::{Grid, GridError};
pub use state::{Cell, Direction, GameState};
pub use tile::{MAX_TILE_VALUE, Tile, is_tile_value};
pub use undo::UndoBuffer;
