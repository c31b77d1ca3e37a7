use crate::app_dirs::AppDirs;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection, Result};
use std::path::{Path, PathBuf};

/// One finished (or forfeited) round, as persisted. Rows are append-only;
/// nothing ever updates or deletes them.
#[derive(Debug, Clone, PartialEq)]
pub struct GameResult {
    pub timestamp: DateTime<Local>,
    pub n_level: usize,
    pub score: i32,
    pub total_turns: usize,
    pub won: bool,
}

/// Sqlite-backed result history.
#[derive(Debug)]
pub struct ResultStore {
    conn: Connection,
}

impl ResultStore {
    /// Open the store at the default state-directory path.
    pub fn new() -> Result<Self> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("nback_results.db"));
        Self::open(db_path)
    }

    /// Open (and initialize if needed) a store at an explicit path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {}", e)),
                )
            })?;
        }

        let conn = Connection::open(path)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS game_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                n_level INTEGER NOT NULL,
                score INTEGER NOT NULL,
                total_turns INTEGER NOT NULL,
                won BOOLEAN NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_game_results_timestamp ON game_results(timestamp)",
            [],
        )?;

        Ok(ResultStore { conn })
    }

    /// Append one result.
    pub fn insert(&self, result: &GameResult) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO game_results (timestamp, n_level, score, total_turns, won)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                result.timestamp.to_rfc3339(),
                result.n_level,
                result.score,
                result.total_turns,
                result.won,
            ],
        )?;

        Ok(())
    }

    /// All stored results, oldest first. Insertion order breaks timestamp
    /// ties so the sequence reads like a log.
    pub fn all_results(&self) -> Result<Vec<GameResult>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT timestamp, n_level, score, total_turns, won
            FROM game_results
            ORDER BY timestamp ASC, id ASC
            "#,
        )?;

        let result_iter = stmt.query_map([], |row| {
            let timestamp_str: String = row.get(0)?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        0,
                        "timestamp".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok(GameResult {
                timestamp,
                n_level: row.get(1)?,
                score: row.get(2)?,
                total_turns: row.get(3)?,
                won: row.get(4)?,
            })
        })?;

        let mut results = Vec::new();
        for result in result_iter {
            results.push(result?);
        }

        Ok(results)
    }
}
