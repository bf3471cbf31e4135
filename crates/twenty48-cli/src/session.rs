use std::io::{BufRead, Write};

use anyhow::Result;
use log::{debug, info, warn};
use twenty48_core::engine::GameEngine;

use crate::config::Frontend;
use crate::input::{Command, HELP};
use crate::recorder::{RunSummary, SharedStore};
use crate::render::{overlay_alpha, render, settle_animations};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Interactive loop: feeds parsed commands to the engine, drives the
/// animation clock and records finished games.
pub struct Session {
    game: GameEngine,
    store: SharedStore,
    frontend: Frontend,
    recorded: bool,
}

impl Session {
    pub fn new(game: GameEngine, store: SharedStore, frontend: Frontend) -> Self {
        Self {
            game,
            store,
            frontend,
            recorded: false,
        }
    }

    pub fn game(&self) -> &GameEngine {
        &self.game
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W) -> Result<()> {
        write!(out, "{}", render(&self.game))?;
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(cmd) => {
                    if self.handle(cmd, out)? == Flow::Quit {
                        break;
                    }
                }
                Err(err) => writeln!(out, "{err}")?,
            }
        }
        Ok(())
    }

    pub fn handle<W: Write>(&mut self, cmd: Command, out: &mut W) -> Result<Flow> {
        match cmd {
            Command::Move(direction) => {
                let outcome = self.game.make_move(direction);
                if !outcome.changed && self.game.is_active() {
                    writeln!(out, "nothing moves {direction:?}")?;
                }
                self.animate(out)?;
                self.record_if_finished();
            }
            Command::Undo => {
                if !self.game.revert() {
                    writeln!(out, "nothing to undo")?;
                }
            }
            Command::NewGame => {
                self.game.new_game();
                self.recorded = false;
                self.animate(out)?;
            }
            Command::Continue => {
                if self.game.game_won() && self.game.can_continue() {
                    self.game.set_endless_mode();
                } else {
                    writeln!(out, "nothing to continue")?;
                }
            }
            Command::Stats => {
                self.write_stats(out)?;
                return Ok(Flow::Continue);
            }
            Command::Help => {
                writeln!(out, "{HELP}")?;
                return Ok(Flow::Continue);
            }
            Command::Quit => return Ok(Flow::Quit),
        }
        write!(out, "{}", render(&self.game))?;
        Ok(Flow::Continue)
    }

    fn animate<W: Write>(&mut self, out: &mut W) -> Result<()> {
        let show = self.frontend.show_frames;
        let mut written = Ok(());
        let frames = settle_animations(
            &mut self.game,
            self.frontend.frame_ns,
            self.frontend.max_frames,
            |game| {
                if show && written.is_ok() {
                    written = writeln!(out, "{}overlay {:.2}", render(game), overlay_alpha(game));
                }
            },
        );
        debug!("animations settled after {frames} frame(s)");
        written?;
        Ok(())
    }

    fn record_if_finished(&mut self) {
        if self.recorded || self.game.is_active() {
            return;
        }
        self.recorded = true;
        let run = RunSummary {
            score: self.game.score(),
            highest_tile: self.game.grid().highest_value(),
            moves: self.game.moves(),
            state: self.game.state(),
        };
        match self.store.with(|s| s.record_run(run)) {
            Ok(id) => info!("recorded run {id}: {run:?}"),
            Err(err) => warn!("failed to record run: {err}"),
        }
    }

    fn write_stats<W: Write>(&self, out: &mut W) -> Result<()> {
        let runs = self.store.with(|s| s.top_runs(5));
        match runs {
            Ok(runs) if runs.is_empty() => writeln!(out, "no finished games yet")?,
            Ok(runs) => {
                for (rank, run) in runs.iter().enumerate() {
                    writeln!(
                        out,
                        "{:>2}. {:>8} pts  best tile {:>6}  {:>5} moves  {:?}",
                        rank + 1,
                        run.score,
                        run.highest_tile,
                        run.moves,
                        run.state
                    )?;
                }
            }
            Err(err) => {
                warn!("failed to read runs: {err}");
                writeln!(out, "stats unavailable")?;
            }
        }
        Ok(())
    }
}
