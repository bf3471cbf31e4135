use std::str::FromStr;

use anyhow::{Error, bail};
use twenty48_core::engine::Direction;

/// One line of player input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Undo,
    NewGame,
    /// Keep playing after a win.
    Continue,
    Stats,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cmd = match s.trim().to_ascii_lowercase().as_str() {
            "w" | "k" | "up" => Command::Move(Direction::Up),
            "d" | "l" | "right" => Command::Move(Direction::Right),
            "s" | "j" | "down" => Command::Move(Direction::Down),
            "a" | "h" | "left" => Command::Move(Direction::Left),
            "u" | "undo" => Command::Undo,
            "n" | "new" => Command::NewGame,
            "c" | "continue" => Command::Continue,
            "stats" => Command::Stats,
            "?" | "help" => Command::Help,
            "q" | "quit" | "exit" => Command::Quit,
            other => bail!("unknown command '{other}' (try 'help')"),
        };
        Ok(cmd)
    }
}

pub const HELP: &str = "\
moves:    w/a/s/d, h/j/k/l or up/left/down/right
u, undo:  take back the last move
n, new:   start a new game
c:        keep playing after a win (endless mode)
stats:    best recorded games
q, quit:  leave";
