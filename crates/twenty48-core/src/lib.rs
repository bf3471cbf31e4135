//! Game-state engine for a 2048-style tile-merging puzzle.
//!
//! ```
//! use twenty48_core::engine::{Direction, EngineConfig, GameEngine};
//!
//! let mut game = GameEngine::builder(EngineConfig::default()).seed(7).build().unwrap();
//! game.make_move(Direction::Left);
//! println!("{}score {}", game.grid(), game.score());
//! ```

pub mod engine;
pub mod persistence;
