use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use log::warn;
use rusqlite::{Connection, OptionalExtension, params};
use twenty48_core::engine::GameState;
use twenty48_core::persistence::ScorePersistence;

const HIGH_SCORE_KEY: &str = "high_score";

/// Summary of a finished game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub score: i64,
    pub highest_tile: u32,
    pub moves: u64,
    pub state: GameState,
}

/// SQLite-backed score store (`session` key/value table plus `runs`).
///
/// Schema:
/// - session(meta_key TEXT PRIMARY KEY, meta_value TEXT)
/// - runs(id INTEGER PRIMARY KEY, score INT, highest_tile INT, moves INT, state INT)
pub struct HighScoreStore {
    conn: Connection,
}

impl HighScoreStore {
    /// Create or open the database at `path`, ensuring the schema exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, rusqlite::Error> {
        let db_path = path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|_e| rusqlite::Error::InvalidPath(parent.to_path_buf()))?;
        }
        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Self::with_connection(conn)
    }

    /// A throwaway store, mostly for tests.
    pub fn in_memory() -> Result<Self, rusqlite::Error> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, rusqlite::Error> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS session (
                meta_key TEXT PRIMARY KEY,
                meta_value TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS runs (
                id INTEGER PRIMARY KEY,
                score BIGINT NOT NULL,
                highest_tile INT NOT NULL,
                moves BIGINT NOT NULL,
                state INT NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn })
    }

    pub fn high_score(&self) -> Result<Option<i64>, rusqlite::Error> {
        let raw = self.get_meta(HIGH_SCORE_KEY)?;
        Ok(raw.and_then(|v| v.parse().ok()))
    }

    pub fn set_high_score(&mut self, score: i64) -> Result<(), rusqlite::Error> {
        self.set_meta(HIGH_SCORE_KEY, score.to_string())
    }

    /// Set a session meta value by key (stored as TEXT).
    pub fn set_meta<K: AsRef<str>, V: AsRef<str>>(
        &mut self,
        key: K,
        value: V,
    ) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO session (meta_key, meta_value) VALUES (?1, ?2)
             ON CONFLICT(meta_key) DO UPDATE SET meta_value=excluded.meta_value",
            params![key.as_ref(), value.as_ref()],
        )?;
        Ok(())
    }

    pub fn get_meta<K: AsRef<str>>(&self, key: K) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row(
                "SELECT meta_value FROM session WHERE meta_key = ?1",
                params![key.as_ref()],
                |row| row.get::<_, String>(0),
            )
            .optional()
    }

    /// Append a finished game; returns its row id.
    pub fn record_run(&mut self, r: RunSummary) -> Result<i64, rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO runs (score, highest_tile, moves, state) VALUES (?1, ?2, ?3, ?4)",
            params![r.score, r.highest_tile as i64, r.moves as i64, r.state.code() as i64],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Best runs by score, highest first.
    pub fn top_runs(&self, limit: usize) -> Result<Vec<RunSummary>, rusqlite::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT score, highest_tile, moves, state FROM runs ORDER BY score DESC, id ASC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            let code = row.get::<_, i64>(3)?;
            Ok(RunSummary {
                score: row.get(0)?,
                highest_tile: row.get::<_, i64>(1)? as u32,
                moves: row.get::<_, i64>(2)? as u64,
                state: GameState::from_code(code as i8).unwrap_or(GameState::Lost),
            })
        })?;
        rows.collect()
    }

    pub fn run_count(&self) -> Result<u64, rusqlite::Error> {
        self.conn
            .query_row("SELECT COUNT(*) FROM runs", [], |row| row.get::<_, i64>(0))
            .map(|n| n as u64)
    }
}

/// Shared handle so the engine (through [`ScorePersistence`]) and the
/// frontend (for run history) use one connection. Single-threaded.
#[derive(Clone)]
pub struct SharedStore(Rc<RefCell<HighScoreStore>>);

impl SharedStore {
    pub fn new(store: HighScoreStore) -> Self {
        Self(Rc::new(RefCell::new(store)))
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut HighScoreStore) -> T) -> T {
        f(&mut self.0.borrow_mut())
    }
}

impl ScorePersistence for SharedStore {
    fn load(&mut self) -> Option<i64> {
        match self.0.borrow().high_score() {
            Ok(score) => score,
            Err(err) => {
                warn!("failed to load high score: {err}");
                None
            }
        }
    }

    fn save(&mut self, high_score: i64) {
        if let Err(err) = self.0.borrow_mut().set_high_score(high_score) {
            warn!("failed to save high score {high_score}: {err}");
        }
    }
}
