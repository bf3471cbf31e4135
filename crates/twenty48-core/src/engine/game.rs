use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::animation::{AnimationKind, AnimationTimeline, MoveExtras};
use super::config::{ConfigError, EngineConfig};
use super::grid::Grid;
use super::state::{Cell, Direction, GameState};
use super::tile::{Tile, can_double, is_tile_value};
use super::undo::UndoBuffer;
use crate::persistence::{DebugBoardSource, NoPersistence, ScorePersistence};

/// Score-side half of an undo snapshot; the grid keeps the tile half.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct ScoreSnapshot {
    score: i64,
    state: GameState,
    moves: u64,
}

/// What a call to [`GameEngine::make_move`] did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoveOutcome {
    /// Some tile slid or merged (and a new tile was spawned if there was room).
    pub changed: bool,
    /// Sum of the values of the tiles created by merges.
    pub score_delta: i64,
    pub merges: usize,
    pub spawned: Option<Cell>,
    /// State after the move.
    pub state: GameState,
}

impl MoveOutcome {
    fn unchanged(state: GameState) -> Self {
        Self {
            changed: false,
            score_delta: 0,
            merges: 0,
            spawned: None,
            state,
        }
    }
}

/// Builder for [`GameEngine`]. Persistence defaults to [`NoPersistence`],
/// randomness to an entropy-seeded `StdRng`.
pub struct GameEngineBuilder {
    config: EngineConfig,
    persistence: Box<dyn ScorePersistence>,
    board_source: Option<Box<dyn DebugBoardSource>>,
    seed: Option<u64>,
}

impl GameEngineBuilder {
    pub fn persistence(mut self, persistence: impl ScorePersistence + 'static) -> Self {
        self.persistence = Box::new(persistence);
        self
    }

    pub fn board_source(mut self, source: impl DebugBoardSource + 'static) -> Self {
        self.board_source = Some(Box::new(source));
        self
    }

    /// Seed the spawn RNG for reproducible games.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration and start the first game.
    pub fn build(self) -> Result<GameEngine, ConfigError> {
        self.config.validate()?;
        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut persistence = self.persistence;
        let high_score = persistence.load().unwrap_or(0);
        let config = self.config;
        let mut engine = GameEngine {
            grid: Grid::new(config.width, config.height),
            timeline: AnimationTimeline::new(config.width, config.height),
            score: 0,
            high_score,
            state: GameState::Normal,
            moves: 0,
            undo: UndoBuffer::new(),
            persistence,
            board_source: self.board_source,
            rng,
            config,
        };
        engine.start_game();
        Ok(engine)
    }
}

/// The game: grid, score, state machine, undo and animation metadata.
///
/// All operations are synchronous and infallible; requests that make no
/// sense in the current state (moving after the game ended, undoing twice)
/// do nothing.
pub struct GameEngine {
    config: EngineConfig,
    grid: Grid,
    timeline: AnimationTimeline,
    score: i64,
    high_score: i64,
    state: GameState,
    moves: u64,
    undo: UndoBuffer<ScoreSnapshot>,
    persistence: Box<dyn ScorePersistence>,
    board_source: Option<Box<dyn DebugBoardSource>>,
    rng: StdRng,
}

impl GameEngine {
    pub fn builder(config: EngineConfig) -> GameEngineBuilder {
        GameEngineBuilder {
            config,
            persistence: Box::new(NoPersistence),
            board_source: None,
            seed: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn timeline(&self) -> &AnimationTimeline {
        &self.timeline
    }

    pub fn score(&self) -> i64 {
        self.score
    }

    pub fn high_score(&self) -> i64 {
        self.high_score
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Successful moves in the current game.
    pub fn moves(&self) -> u64 {
        self.moves
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn game_won(&self) -> bool {
        self.state.is_won()
    }

    pub fn game_lost(&self) -> bool {
        self.state.is_lost()
    }

    /// True until endless mode is entered.
    pub fn can_continue(&self) -> bool {
        self.state.can_continue()
    }

    pub fn can_undo(&self) -> bool {
        self.undo.is_available()
    }

    /// Threshold a merged tile must reach to win from the current mode.
    pub fn win_value(&self) -> u32 {
        if self.can_continue() {
            self.config.win_value
        } else {
            self.config.endless_win_value
        }
    }

    /// Advance animations by `elapsed_ns`.
    pub fn tick(&mut self, elapsed_ns: u64) {
        self.timeline.tick_all(elapsed_ns);
    }

    pub fn is_animation_active(&self) -> bool {
        self.timeline.is_animation_active()
    }

    /// Abandon the current game and start a fresh one. The abandoned game
    /// becomes the undo target.
    pub fn new_game(&mut self) {
        self.prepare_undo_state();
        self.commit_undo_state();
        self.grid.clear();

        let stored = self.persistence.load().unwrap_or(0);
        self.high_score = self.high_score.max(stored);
        self.record_high_score();

        self.start_game();
    }

    fn start_game(&mut self) {
        self.timeline = AnimationTimeline::new(self.config.width, self.config.height);
        self.score = self
            .board_source
            .as_ref()
            .map_or(0, |source| source.starting_score());
        self.state = GameState::Normal;
        self.moves = 0;
        self.add_start_tiles();
        info!(
            "new {}x{} game (score {}, high score {})",
            self.config.width, self.config.height, self.score, self.high_score
        );
    }

    fn add_start_tiles(&mut self) {
        let premade = self
            .board_source
            .as_mut()
            .and_then(|source| source.generate_premade_map());
        if let Some(tiles) = premade {
            for (cell, value) in tiles {
                if !is_tile_value(value) {
                    warn!("skipping premade tile {value} at {cell}: not a power of two >= 2");
                    continue;
                }
                if value > self.config.endless_win_value {
                    warn!(
                        "skipping premade tile {value} at {cell}: above the endless threshold {}",
                        self.config.endless_win_value
                    );
                    continue;
                }
                if !self.grid.is_cell_available(cell) {
                    warn!("skipping premade tile {value} at {cell}: cell unavailable");
                    continue;
                }
                self.spawn_tile(Tile::new(cell, value));
            }
            return;
        }
        for _ in 0..self.config.start_tiles {
            self.add_random_tile();
        }
    }

    /// Spawn a 2 or 4 on a random empty cell; nothing happens on a full grid.
    fn add_random_tile(&mut self) -> Option<Cell> {
        let cell = self.grid.random_available_cell(&mut self.rng)?;
        let value = if self.rng.gen_bool(self.config.four_probability) { 4 } else { 2 };
        self.spawn_tile(Tile::new(cell, value));
        Some(cell)
    }

    fn spawn_tile(&mut self, tile: Tile) {
        let cell = tile.position;
        self.place(tile);
        let timing = &self.config.timing;
        self.timeline
            .start_animation(cell, AnimationKind::Spawn, timing.spawn_ns, timing.move_ns, None);
    }

    fn place(&mut self, tile: Tile) {
        if let Err(err) = self.grid.insert(tile) {
            panic!("grid invariant violated: {err}");
        }
    }

    /// Slide every tile towards `direction`, merging equal neighbours once.
    ///
    /// ```
    /// use twenty48_core::engine::{Direction, EngineConfig, GameEngine};
    /// use twenty48_core::persistence::FixedBoard;
    ///
    /// let mut game = GameEngine::builder(EngineConfig::default())
    ///     .board_source(FixedBoard::from_rows(&[&[2, 2, 4, 0]]))
    ///     .seed(3)
    ///     .build()
    ///     .unwrap();
    /// let outcome = game.make_move(Direction::Left);
    /// assert!(outcome.changed);
    /// assert_eq!(game.score(), 4);
    /// ```
    pub fn make_move(&mut self, direction: Direction) -> MoveOutcome {
        self.timeline.cancel_animations();
        if !self.is_active() {
            return MoveOutcome::unchanged(self.state);
        }

        self.prepare_undo_state();
        self.grid.clear_merge_locks();

        let vector = direction.vector();
        let score_before = self.score;
        let mut merges = 0;
        let mut changed = false;

        for x in traversal(self.grid.width(), vector.x) {
            for y in traversal(self.grid.height(), vector.y) {
                let cell = Cell::new(x as i32, y as i32);
                let Some(tile) = self.grid.cell_content(cell).cloned() else {
                    continue;
                };
                let (landing, blocker) = self.find_farthest_position(cell, vector);
                let target = self
                    .grid
                    .cell_content(blocker)
                    .filter(|next| {
                        next.value == tile.value && !next.is_merge_locked() && can_double(next.value)
                    })
                    .cloned();

                match target {
                    Some(target) => {
                        self.merge(tile, target);
                        merges += 1;
                        changed = true;
                    }
                    None => {
                        self.slide(cell, landing);
                        changed |= landing != cell;
                    }
                }
            }
        }

        let mut spawned = None;
        if changed {
            self.commit_undo_state();
            self.moves += 1;
            spawned = self.add_random_tile();
        } else {
            self.discard_undo_state();
        }
        self.check_lose();

        let outcome = MoveOutcome {
            changed,
            score_delta: self.score - score_before,
            merges,
            spawned,
            state: self.state,
        };
        debug!(
            "move {:?}: changed={} merges={} score={} state={:?}",
            direction, outcome.changed, outcome.merges, self.score, self.state
        );
        outcome
    }

    /// Last empty cell reachable from `cell` along `vector`, and the first
    /// cell past it (occupied or off the grid).
    fn find_farthest_position(&self, cell: Cell, vector: Cell) -> (Cell, Cell) {
        let mut previous = cell;
        let mut next = cell.step(vector);
        while self.grid.is_cell_available(next) {
            previous = next;
            next = next.step(vector);
        }
        (previous, next)
    }

    fn merge(&mut self, moving: Tile, target: Tile) {
        let origin = moving.position;
        let at = target.position;
        self.grid.remove(&moving);
        self.grid.remove(&target);
        let merged = Tile::merged(moving, target);
        let value = merged.value;
        self.place(merged);

        let timing = &self.config.timing;
        let extras = MoveExtras { from: origin, merged: true };
        self.timeline
            .start_animation(at, AnimationKind::Move, timing.move_ns, 0, Some(extras));
        self.timeline
            .start_animation(at, AnimationKind::Merge, timing.merge_ns, timing.move_ns, None);

        self.score += i64::from(value);
        self.record_high_score();

        if value >= self.win_value() && !self.game_won() {
            self.state = self.state.with_win_flag();
            info!("reached {value}: {:?} with score {}", self.state, self.score);
            self.end_game();
        }
    }

    fn slide(&mut self, from: Cell, to: Cell) {
        if let Err(err) = self.grid.move_tile(from, to) {
            panic!("grid invariant violated: {err}");
        }
        let extras = MoveExtras { from, merged: false };
        self.timeline.start_animation(
            to,
            AnimationKind::Move,
            self.config.timing.move_ns,
            0,
            Some(extras),
        );
    }

    fn check_lose(&mut self) {
        if !self.grid.moves_available() && !self.game_won() && !self.game_lost() {
            self.state = GameState::Lost;
            info!("no moves left: lost with score {}", self.score);
            self.end_game();
        }
    }

    fn end_game(&mut self) {
        let timing = &self.config.timing;
        self.timeline.start_animation(
            Cell::SENTINEL,
            AnimationKind::FadeGlobal,
            timing.fade_ns,
            timing.fade_delay_ns,
            None,
        );
        self.record_high_score();
    }

    fn record_high_score(&mut self) {
        if self.score >= self.high_score {
            self.high_score = self.score;
            self.persistence.save(self.high_score);
        }
    }

    /// Fold in a high score synced from elsewhere and persist the maximum.
    pub fn merge_remote_high_score(&mut self, remote: i64) {
        self.high_score = self.high_score.max(remote);
        self.persistence.save(self.high_score);
    }

    /// Keep playing after a win with the endless threshold. Has no effect on a
    /// lost game.
    pub fn set_endless_mode(&mut self) -> bool {
        if self.game_lost() {
            return false;
        }
        self.state = GameState::Endless;
        info!("endless mode (next threshold {})", self.config.endless_win_value);
        true
    }

    /// Undo the last successful move (or new game). Returns false when there
    /// is nothing to undo.
    pub fn revert(&mut self) -> bool {
        let Some(snapshot) = self.undo.take() else {
            return false;
        };
        self.timeline.cancel_animations();
        let reverted = self.grid.revert_snapshot();
        debug_assert!(reverted, "grid and score undo buffers out of sync");
        self.score = snapshot.score;
        self.state = snapshot.state;
        self.moves = snapshot.moves;
        debug!("undo: score={} state={:?}", self.score, self.state);
        true
    }

    fn prepare_undo_state(&mut self) {
        self.grid.prepare_snapshot();
        self.undo.prepare(ScoreSnapshot {
            score: self.score,
            state: self.state,
            moves: self.moves,
        });
    }

    fn commit_undo_state(&mut self) {
        self.grid.commit_snapshot();
        self.undo.commit();
    }

    fn discard_undo_state(&mut self) {
        self.grid.discard_snapshot();
        self.undo.discard();
    }
}

/// `0..len`, reversed when moving towards the high end so the tiles nearest
/// the destination edge are handled first.
fn traversal(len: usize, component: i32) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    if component == 1 {
        order.reverse();
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::{FixedBoard, MemoryScoreStore};

    fn game_with(rows: &[&[u32]]) -> GameEngine {
        let height = rows.len().max(4);
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(4).max(4);
        game_sized(width, height, rows)
    }

    fn game_sized(width: usize, height: usize, rows: &[&[u32]]) -> GameEngine {
        GameEngine::builder(EngineConfig::with_size(width, height))
            .board_source(FixedBoard::from_rows(rows))
            .seed(11)
            .build()
            .unwrap()
    }

    fn value_at(game: &GameEngine, x: i32, y: i32) -> Option<u32> {
        game.grid().cell_content(Cell::new(x, y)).map(|t| t.value)
    }

    fn non_spawned_tiles(game: &GameEngine, spawned: Option<Cell>) -> Vec<(Cell, u32)> {
        game.grid()
            .tiles()
            .filter(|t| Some(t.position) != spawned)
            .map(|t| (t.position, t.value))
            .collect()
    }

    #[test]
    fn row_slides_left_and_merges_once() {
        let mut game = game_with(&[&[2, 2, 4, 0]]);
        let outcome = game.make_move(Direction::Left);

        assert!(outcome.changed);
        assert_eq!(outcome.merges, 1);
        assert_eq!(outcome.score_delta, 4);
        assert_eq!(game.score(), 4);
        let spawned = outcome.spawned.expect("room to spawn");
        assert_eq!(
            non_spawned_tiles(&game, Some(spawned)),
            vec![(Cell::new(0, 0), 4), (Cell::new(1, 0), 4)]
        );
        let fresh = game.grid().cell_content(spawned).unwrap();
        assert!(fresh.value == 2 || fresh.value == 4);
        assert!(!fresh.is_merge_locked());
    }

    #[test]
    fn merged_tile_is_locked_for_the_rest_of_the_move() {
        let mut game = game_with(&[&[2, 2, 2, 2]]);
        let outcome = game.make_move(Direction::Left);
        assert_eq!(outcome.merges, 2);
        assert_eq!(game.score(), 8);
        assert_eq!(value_at(&game, 0, 0), Some(4));
        assert_eq!(value_at(&game, 1, 0), Some(4));

        let mut game = game_with(&[&[4, 2, 2, 0]]);
        game.make_move(Direction::Left);
        assert_eq!(value_at(&game, 0, 0), Some(4));
        assert_eq!(value_at(&game, 1, 0), Some(4));
        assert_eq!(game.score(), 4);
    }

    #[test]
    fn right_moves_process_the_far_edge_first() {
        let mut game = game_with(&[&[2, 2, 2, 0]]);
        let outcome = game.make_move(Direction::Right);
        assert_eq!(
            non_spawned_tiles(&game, outcome.spawned),
            vec![(Cell::new(2, 0), 2), (Cell::new(3, 0), 4)]
        );
    }

    #[test]
    fn columns_move_down() {
        let mut game = game_with(&[&[8, 0, 0, 0], &[0, 0, 0, 0], &[4, 0, 0, 0], &[4, 0, 0, 0]]);
        let outcome = game.make_move(Direction::Down);
        assert_eq!(outcome.merges, 1);
        assert_eq!(
            non_spawned_tiles(&game, outcome.spawned),
            vec![(Cell::new(0, 2), 8), (Cell::new(0, 3), 8)]
        );
    }

    #[test]
    fn unchanged_move_spawns_nothing_and_keeps_undo_slot_empty() {
        let mut game = game_with(&[&[2, 4, 0, 0]]);
        let before = game.grid().cells().to_vec();
        let outcome = game.make_move(Direction::Up);
        assert_eq!(outcome, MoveOutcome::unchanged(GameState::Normal));
        assert_eq!(game.grid().cells(), &before[..]);
        assert!(!game.can_undo());
        assert!(!game.revert());
    }

    #[test]
    fn undo_restores_exactly_once() {
        let mut game = game_with(&[&[2, 2, 0, 0], &[0, 4, 0, 0]]);
        let cells = game.grid().cells().to_vec();
        let (score, state) = (game.score(), game.state());

        assert!(game.make_move(Direction::Left).changed);
        assert!(game.can_undo());
        assert!(game.revert());
        assert_eq!(game.grid().cells(), &cells[..]);
        assert_eq!((game.score(), game.state()), (score, state));
        assert_eq!(game.moves(), 0);
        assert!(!game.timeline().is_animation_active());

        let after_first = game.grid().cells().to_vec();
        assert!(!game.revert());
        assert_eq!(game.grid().cells(), &after_first[..]);
    }

    #[test]
    fn failed_move_keeps_previous_undo_target() {
        let mut game = game_with(&[&[0, 0, 0, 2]]);
        let cells = game.grid().cells().to_vec();
        assert!(game.make_move(Direction::Left).changed);
        // a second move that changes nothing must not replace the target
        let snapshot = game.grid().cells().to_vec();
        let outcome = game.make_move(Direction::Left);
        if !outcome.changed {
            assert_eq!(game.grid().cells(), &snapshot[..]);
        }
        assert!(game.revert());
        if outcome.changed {
            assert_eq!(game.grid().cells(), &snapshot[..]);
        } else {
            assert_eq!(game.grid().cells(), &cells[..]);
        }
    }

    #[test]
    fn stuck_full_grid_is_lost_on_next_move() {
        let rows: [&[u32]; 4] = [
            &[2, 4, 2, 4],
            &[4, 2, 4, 2],
            &[2, 4, 2, 4],
            &[4, 2, 4, 2],
        ];
        let mut game = game_with(&rows);
        assert!(game.is_active());
        let outcome = game.make_move(Direction::Left);
        assert!(!outcome.changed);
        assert_eq!(outcome.state, GameState::Lost);
        assert!(game.game_lost());
        assert!(!game.is_active());
        assert_eq!(game.timeline().global_animations().len(), 1);
        assert!(!game.can_undo());
    }

    #[test]
    fn finished_game_ignores_moves_but_cancels_animations() {
        let mut game = game_sized(2, 2, &[&[2, 4], &[4, 2]]);
        game.make_move(Direction::Up);
        assert!(game.game_lost());
        assert!(game.is_animation_active());
        let cells = game.grid().cells().to_vec();

        let outcome = game.make_move(Direction::Down);
        assert_eq!(outcome, MoveOutcome::unchanged(GameState::Lost));
        assert_eq!(game.grid().cells(), &cells[..]);
        assert!(!game.is_animation_active());
    }

    #[test]
    fn reaching_win_value_wins_until_endless() {
        let mut game = game_with(&[&[1024, 1024, 0, 0]]);
        let outcome = game.make_move(Direction::Left);
        assert_eq!(outcome.state, GameState::WinNormal);
        assert!(game.game_won());
        assert!(!game.is_active());
        assert!(game.can_continue());
        assert_eq!(game.timeline().global_animations()[0].kind, AnimationKind::FadeGlobal);

        assert!(!game.make_move(Direction::Right).changed);

        assert!(game.set_endless_mode());
        assert_eq!(game.state(), GameState::Endless);
        assert!(!game.can_continue());
        assert!(game.is_active());
        assert_eq!(game.win_value(), 1 << 20);
    }

    #[test]
    fn endless_threshold_wins_again() {
        let config = EngineConfig {
            endless_win_value: 4096,
            ..EngineConfig::default()
        };
        let mut game = GameEngine::builder(config)
            .board_source(FixedBoard::from_rows(&[&[1024, 1024, 2048, 0]]))
            .seed(5)
            .build()
            .unwrap();
        game.make_move(Direction::Left);
        assert_eq!(game.state(), GameState::WinNormal);
        assert_eq!(value_at(&game, 0, 0), Some(2048));
        assert_eq!(value_at(&game, 1, 0), Some(2048));

        game.set_endless_mode();
        game.make_move(Direction::Left);
        assert_eq!(value_at(&game, 0, 0), Some(4096));
        assert_eq!(game.state(), GameState::WinEndless);
        assert!(game.game_won());
        assert!(!game.can_continue());
    }

    #[test]
    fn endless_before_win_skips_default_threshold() {
        let mut game = game_with(&[&[1024, 1024, 0, 0]]);
        assert!(game.set_endless_mode());
        game.make_move(Direction::Left);
        assert_eq!(value_at(&game, 0, 0), Some(2048));
        assert_eq!(game.state(), GameState::Endless);
    }

    #[test]
    fn lost_game_cannot_enter_endless() {
        let mut game = game_sized(2, 2, &[&[2, 4], &[4, 2]]);
        game.make_move(Direction::Left);
        assert!(!game.set_endless_mode());
        assert_eq!(game.state(), GameState::Lost);
    }

    #[test]
    fn high_score_is_persisted_when_reached() {
        let store = MemoryScoreStore::with_value(2);
        let mut game = GameEngine::builder(EngineConfig::default())
            .persistence(store.clone())
            .board_source(FixedBoard::from_rows(&[&[2, 2, 0, 0]]))
            .seed(1)
            .build()
            .unwrap();
        assert_eq!(game.high_score(), 2);
        game.make_move(Direction::Left);
        assert_eq!(game.high_score(), 4);
        assert_eq!(store.get(), Some(4));

        game.merge_remote_high_score(100);
        assert_eq!(game.high_score(), 100);
        assert_eq!(store.get(), Some(100));
        game.merge_remote_high_score(50);
        assert_eq!(game.high_score(), 100);
    }

    #[test]
    fn lower_score_does_not_overwrite_high_score() {
        let store = MemoryScoreStore::with_value(1000);
        let mut game = GameEngine::builder(EngineConfig::default())
            .persistence(store.clone())
            .board_source(FixedBoard::from_rows(&[&[2, 2, 0, 0]]))
            .seed(1)
            .build()
            .unwrap();
        game.make_move(Direction::Left);
        game.new_game();
        assert_eq!(store.get(), Some(1000));
        assert_eq!(store.save_count(), 0);
        assert_eq!(game.high_score(), 1000);
    }

    #[test]
    fn new_game_resets_and_can_be_undone() {
        let mut game = game_with(&[&[2, 2, 0, 0]]);
        game.make_move(Direction::Left);
        let cells = game.grid().cells().to_vec();
        let score = game.score();

        game.new_game();
        assert_eq!(game.score(), 0);
        assert_eq!(game.state(), GameState::Normal);
        assert_eq!(game.moves(), 0);
        assert_eq!(non_spawned_tiles(&game, None), vec![(Cell::new(0, 0), 2), (Cell::new(1, 0), 2)]);

        assert!(game.revert());
        assert_eq!(game.grid().cells(), &cells[..]);
        assert_eq!(game.score(), score);
        assert_eq!(game.moves(), 1);
    }

    #[test]
    fn random_start_places_configured_tiles() {
        let mut game = GameEngine::builder(EngineConfig::default())
            .seed(42)
            .build()
            .unwrap();
        assert_eq!(game.grid().tiles().count(), 2);
        assert!(game.grid().tiles().all(|t| t.value == 2 || t.value == 4));
        assert_eq!(
            game.timeline()
                .records()
                .filter(|r| r.kind == AnimationKind::Spawn)
                .count(),
            2
        );
        game.new_game();
        assert_eq!(game.grid().tiles().count(), 2);
        assert!(game.can_undo());
    }

    #[test]
    fn premade_board_skips_invalid_tiles_and_sets_score() {
        let mut board = FixedBoard::new(vec![
            (Cell::new(0, 0), 3),
            (Cell::new(9, 9), 2),
            (Cell::new(0, 0), 2),
            (Cell::new(0, 0), 4),
        ]);
        board.starting_score = 500;
        let game = GameEngine::builder(EngineConfig::default())
            .board_source(board)
            .seed(9)
            .build()
            .unwrap();
        assert_eq!(non_spawned_tiles(&game, None), vec![(Cell::new(0, 0), 2)]);
        assert_eq!(game.score(), 500);
    }

    #[test]
    fn premade_tiles_above_endless_threshold_are_skipped() {
        let mut game = game_with(&[&[1 << 31, 1 << 31, 0, 0], &[2, 0, 0, 0]]);
        assert_eq!(non_spawned_tiles(&game, None), vec![(Cell::new(0, 1), 2)]);

        let outcome = game.make_move(Direction::Left);
        assert!(!outcome.changed);
        assert_eq!(game.state(), GameState::Normal);
    }

    #[test]
    fn largest_tiles_never_merge() {
        let config = EngineConfig {
            endless_win_value: 1 << 30,
            ..EngineConfig::default()
        };
        let mut game = GameEngine::builder(config)
            .board_source(FixedBoard::from_rows(&[&[1 << 30, 1 << 30, 1 << 30, 1 << 30]]))
            .seed(8)
            .build()
            .unwrap();
        let outcome = game.make_move(Direction::Left);
        assert_eq!(outcome.merges, 2);
        assert_eq!(game.state(), GameState::WinNormal);
        assert!(game.set_endless_mode());

        let outcome = game.make_move(Direction::Right);
        assert_eq!(outcome.merges, 0);
        let largest = game
            .grid()
            .tiles()
            .filter(|t| t.value == crate::engine::MAX_TILE_VALUE)
            .count();
        assert_eq!(largest, 2);
        assert_eq!(game.state(), GameState::Endless);
    }

    fn spawn_values(four_probability: f64, games: usize) -> Vec<u32> {
        let config = EngineConfig {
            four_probability,
            ..EngineConfig::default()
        };
        let mut game = GameEngine::builder(config).seed(2048).build().unwrap();
        let mut values = Vec::new();
        for _ in 0..games {
            values.extend(game.grid().tiles().map(|t| t.value));
            game.new_game();
        }
        values
    }

    #[test]
    fn certain_four_probability_spawns_only_fours() {
        let values = spawn_values(1.0, 50);
        assert_eq!(values.len(), 100);
        assert!(values.iter().all(|&v| v == 4));
    }

    #[test]
    fn zero_four_probability_spawns_only_twos() {
        let values = spawn_values(0.0, 50);
        assert_eq!(values.len(), 100);
        assert!(values.iter().all(|&v| v == 2));
    }

    #[test]
    fn default_spawns_are_mostly_twos() {
        let values = spawn_values(0.1, 1000);
        assert!(values.iter().all(|&v| v == 2 || v == 4));
        let fours = values.iter().filter(|&&v| v == 4).count();
        let share = fours as f64 / values.len() as f64;
        assert!((0.05..=0.15).contains(&share), "share of fours was {share}");
    }

    #[test]
    fn spawn_after_move_follows_four_probability() {
        let config = EngineConfig {
            four_probability: 1.0,
            ..EngineConfig::default()
        };
        let mut game = GameEngine::builder(config)
            .board_source(FixedBoard::from_rows(&[&[0, 0, 0, 2]]))
            .seed(6)
            .build()
            .unwrap();
        let spawned = game.make_move(Direction::Left).spawned.expect("room to spawn");
        assert_eq!(value_at(&game, spawned.x, spawned.y), Some(4));
    }

    #[test]
    fn move_emits_animation_records() {
        let mut game = game_with(&[&[0, 2, 0, 2]]);
        let outcome = game.make_move(Direction::Left);
        let at = game.timeline().cell_animations(Cell::new(0, 0));
        let kinds: Vec<AnimationKind> = at.iter().map(|r| r.kind).collect();
        assert_eq!(kinds[..2], [AnimationKind::Move, AnimationKind::Move]);
        assert!(kinds.contains(&AnimationKind::Merge));
        let merged_move = at
            .iter()
            .find(|r| r.extras.is_some_and(|e| e.merged))
            .expect("merge move record");
        assert_eq!(merged_move.extras.unwrap().from, Cell::new(3, 0));

        let spawned = outcome.spawned.unwrap();
        assert!(game
            .timeline()
            .cell_animations(spawned)
            .iter()
            .any(|r| r.kind == AnimationKind::Spawn));

        assert!(game.is_animation_active());
        game.tick(10 * crate::engine::BASE_ANIMATION_NS);
        assert!(!game.is_animation_active());
    }

    #[test]
    fn build_rejects_invalid_config() {
        let err = GameEngine::builder(EngineConfig::with_size(0, 0)).build().err();
        assert!(matches!(err, Some(ConfigError::EmptyGrid { .. })));
    }
}
