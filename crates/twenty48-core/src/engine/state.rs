use std::fmt;

use serde::{Deserialize, Serialize};

/// A grid coordinate. Signed so that stepping past an edge yields an
/// out-of-bounds cell instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    /// Coordinates used by records that are not tied to a grid position.
    pub const SENTINEL: Cell = Cell { x: -1, y: -1 };

    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }

    /// The neighbouring cell one step along `vector`.
    #[inline]
    pub fn step(self, vector: Cell) -> Cell {
        Cell::new(self.x + vector.x, self.y + vector.y)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A direction to slide/merge tiles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    /// Unit vector in grid coordinates (y grows downwards).
    #[inline]
    pub fn vector(self) -> Cell {
        match self {
            Direction::Up => Cell::new(0, -1),
            Direction::Right => Cell::new(1, 0),
            Direction::Down => Cell::new(0, 1),
            Direction::Left => Cell::new(-1, 0),
        }
    }
}

/// Game progress. The numeric codes carry meaning: even codes are playable
/// modes, and reaching the win value adds one to the current mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GameState {
    Lost,
    #[default]
    Normal,
    WinNormal,
    Endless,
    WinEndless,
}

impl GameState {
    pub fn code(self) -> i8 {
        match self {
            GameState::Lost => -1,
            GameState::Normal => 0,
            GameState::WinNormal => 1,
            GameState::Endless => 2,
            GameState::WinEndless => 3,
        }
    }

    pub fn from_code(code: i8) -> Option<Self> {
        match code {
            -1 => Some(GameState::Lost),
            0 => Some(GameState::Normal),
            1 => Some(GameState::WinNormal),
            2 => Some(GameState::Endless),
            3 => Some(GameState::WinEndless),
            _ => None,
        }
    }

    #[inline]
    pub fn is_won(self) -> bool {
        let code = self.code();
        code > 0 && code % 2 != 0
    }

    #[inline]
    pub fn is_lost(self) -> bool {
        self == GameState::Lost
    }

    #[inline]
    pub fn is_active(self) -> bool {
        !(self.is_won() || self.is_lost())
    }

    /// False once endless mode has been entered.
    #[inline]
    pub fn can_continue(self) -> bool {
        !matches!(self, GameState::Endless | GameState::WinEndless)
    }

    /// The state reached by hitting the win value from `self`.
    pub fn with_win_flag(self) -> Self {
        GameState::from_code(self.code() + 1).unwrap_or(self)
    }
}
