use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use std::path::Path;

use crate::app_dirs::AppDirs;
use crate::config::GameKind;
use crate::error::HistoryError;
use crate::recorder::SessionRecord;

/// One row of the session list.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRow {
    pub session_id: String,
    pub child_id: String,
    pub game: String,
    pub started_at: DateTime<Local>,
    pub total_score: i64,
    pub round_count: i64,
}

/// How a single stimulus has gone across all recorded sessions.
#[derive(Debug, Clone, PartialEq)]
pub struct StimulusStats {
    pub stimulus_id: String,
    pub attempts: i64,
    pub completions: i64,
    /// Average over completed attempts only.
    pub avg_time_secs: Option<f64>,
}

impl StimulusStats {
    pub fn completion_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            (self.completions as f64 / self.attempts as f64) * 100.0
        }
    }
}

/// Session history stored in SQLite
#[derive(Debug)]
pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Open the default database under the user's state directory.
    pub fn new() -> Result<Self, HistoryError> {
        let path = AppDirs::db_path().unwrap_or_else(|| "mimic_history.db".into());
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HistoryError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, HistoryError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                session_id TEXT PRIMARY KEY,
                child_id TEXT NOT NULL,
                game TEXT NOT NULL,
                started_at TEXT NOT NULL,
                ended_at TEXT NOT NULL,
                total_score INTEGER NOT NULL,
                round_count INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS rounds (
                session_id TEXT NOT NULL REFERENCES sessions(session_id) ON DELETE CASCADE,
                round_number INTEGER NOT NULL,
                stimulus_id TEXT NOT NULL,
                time_taken_secs INTEGER NOT NULL,
                completed BOOLEAN NOT NULL,
                PRIMARY KEY (session_id, round_number)
            );
            CREATE INDEX IF NOT EXISTS idx_rounds_stimulus ON rounds(stimulus_id);
            CREATE INDEX IF NOT EXISTS idx_sessions_started ON sessions(started_at);
            "#,
        )?;
        Ok(Self { conn })
    }

    /// Store a finished session and its rounds in one transaction.
    /// Recording the same session id twice replaces the earlier copy.
    pub fn record_session(&mut self, record: &SessionRecord) -> Result<(), HistoryError> {
        let tx = self.conn.transaction()?;

        tx.execute(
            "DELETE FROM rounds WHERE session_id = ?1",
            params![record.session_id],
        )?;
        tx.execute(
            r#"
            INSERT OR REPLACE INTO sessions
            (session_id, child_id, game, started_at, ended_at, total_score, round_count)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                record.session_id,
                record.child_id,
                record.game.to_string(),
                record.started_at.to_rfc3339(),
                record.ended_at.to_rfc3339(),
                record.summary.total_score as i64,
                record.summary.round_count as i64,
            ],
        )?;

        for round in &record.summary.rounds {
            tx.execute(
                r#"
                INSERT INTO rounds
                (session_id, round_number, stimulus_id, time_taken_secs, completed)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    record.session_id,
                    round.round_number as i64,
                    round.stimulus_id,
                    round.time_taken_secs,
                    round.completed,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Most recent sessions first.
    pub fn recent_sessions(&self, limit: usize) -> Result<Vec<SessionRow>, HistoryError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT session_id, child_id, game, started_at, total_score, round_count
            FROM sessions
            ORDER BY started_at DESC
            LIMIT ?1
            "#,
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (session_id, child_id, game, started_at, total_score, round_count) = row?;
            let started_at = DateTime::parse_from_rfc3339(&started_at)
                .map_err(|_| HistoryError::Timestamp(started_at.clone()))?
                .with_timezone(&Local);
            sessions.push(SessionRow {
                session_id,
                child_id,
                game,
                started_at,
                total_score,
                round_count,
            });
        }
        Ok(sessions)
    }

    /// Per-stimulus attempts, completions and average completion time for a game.
    pub fn stimulus_summary(&self, game: GameKind) -> Result<Vec<StimulusStats>, HistoryError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT
                r.stimulus_id,
                COUNT(*) AS attempts,
                SUM(CASE WHEN r.completed = 1 THEN 1 ELSE 0 END) AS completions,
                AVG(CASE WHEN r.completed = 1 THEN r.time_taken_secs END) AS avg_time
            FROM rounds r
            JOIN sessions s ON s.session_id = r.session_id
            WHERE s.game = ?1
            GROUP BY r.stimulus_id
            ORDER BY r.stimulus_id
            "#,
        )?;

        let rows = stmt.query_map([game.to_string()], |row| {
            Ok(StimulusStats {
                stimulus_id: row.get(0)?,
                attempts: row.get(1)?,
                completions: row.get(2)?,
                avg_time_secs: row.get(3)?,
            })
        })?;

        let mut summary = Vec::new();
        for row in rows {
            summary.push(row?);
        }
        Ok(summary)
    }

    pub fn session_count(&self) -> Result<i64, HistoryError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?)
    }

    /// Wipe all recorded sessions.
    pub fn clear_all(&self) -> Result<(), HistoryError> {
        self.conn
            .execute_batch("DELETE FROM rounds; DELETE FROM sessions;")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::summarize;
    use crate::session::RoundOutcome;
    use chrono::{Duration, TimeZone};

    fn record(id: &str, game: GameKind, start_min: u32, rounds: &[(&str, u32, bool)]) -> SessionRecord {
        let started_at = Local.with_ymd_and_hms(2025, 6, 1, 12, start_min, 0).unwrap();
        let outcomes: Vec<RoundOutcome> = rounds
            .iter()
            .enumerate()
            .map(|(i, (stim, secs, done))| RoundOutcome {
                round_number: i + 1,
                stimulus_id: stim.to_string(),
                time_taken_secs: *secs,
                completed: *done,
            })
            .collect();
        SessionRecord {
            session_id: id.to_string(),
            child_id: "kid".to_string(),
            game,
            started_at,
            ended_at: started_at + Duration::seconds(60),
            summary: summarize(&outcomes),
        }
    }

    #[test]
    fn record_and_list_sessions() {
        let mut db = HistoryDb::open_in_memory().unwrap();
        db.record_session(&record("a", GameKind::Gesture, 0, &[("Victory", 3, true)]))
            .unwrap();
        db.record_session(&record("b", GameKind::Gesture, 5, &[("Victory", 10, false)]))
            .unwrap();

        let recent = db.recent_sessions(10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].session_id, "b");
        assert_eq!(recent[1].total_score, 1);
        assert_eq!(recent[0].game, "gesture");

        assert_eq!(db.recent_sessions(1).unwrap().len(), 1);
    }

    #[test]
    fn stimulus_summary_per_game() {
        let mut db = HistoryDb::open_in_memory().unwrap();
        db.record_session(&record(
            "a",
            GameKind::Gesture,
            0,
            &[("Victory", 2, true), ("Open_Palm", 10, false)],
        ))
        .unwrap();
        db.record_session(&record(
            "b",
            GameKind::Gesture,
            1,
            &[("Victory", 4, true), ("Open_Palm", 6, true)],
        ))
        .unwrap();
        db.record_session(&record("c", GameKind::Expression, 2, &[("kiss", 5, true)]))
            .unwrap();

        let summary = db.stimulus_summary(GameKind::Gesture).unwrap();
        assert_eq!(summary.len(), 2);

        let palm = &summary[0];
        assert_eq!(palm.stimulus_id, "Open_Palm");
        assert_eq!(palm.attempts, 2);
        assert_eq!(palm.completions, 1);
        assert_eq!(palm.avg_time_secs, Some(6.0));
        assert_eq!(palm.completion_rate(), 50.0);

        let victory = &summary[1];
        assert_eq!(victory.avg_time_secs, Some(3.0));
        assert_eq!(victory.completion_rate(), 100.0);

        let expr = db.stimulus_summary(GameKind::Expression).unwrap();
        assert_eq!(expr.len(), 1);
    }

    #[test]
    fn never_completed_stimulus_has_no_average() {
        let mut db = HistoryDb::open_in_memory().unwrap();
        db.record_session(&record("a", GameKind::Gesture, 0, &[("Victory", 10, false)]))
            .unwrap();
        let summary = db.stimulus_summary(GameKind::Gesture).unwrap();
        assert_eq!(summary[0].avg_time_secs, None);
        assert_eq!(summary[0].completion_rate(), 0.0);
    }

    #[test]
    fn rerecording_replaces_rounds() {
        let mut db = HistoryDb::open_in_memory().unwrap();
        db.record_session(&record("a", GameKind::Gesture, 0, &[("Victory", 10, false)]))
            .unwrap();
        db.record_session(&record("a", GameKind::Gesture, 0, &[("Victory", 2, true)]))
            .unwrap();
        assert_eq!(db.session_count().unwrap(), 1);
        let summary = db.stimulus_summary(GameKind::Gesture).unwrap();
        assert_eq!(summary[0].attempts, 1);
        assert_eq!(summary[0].completions, 1);
    }

    #[test]
    fn clear_all_empties_history() {
        let mut db = HistoryDb::open_in_memory().unwrap();
        db.record_session(&record("a", GameKind::Gesture, 0, &[("Victory", 3, true)]))
            .unwrap();
        db.clear_all().unwrap();
        assert_eq!(db.session_count().unwrap(), 0);
        assert!(db.stimulus_summary(GameKind::Gesture).unwrap().is_empty());
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("history.db");
        let db = HistoryDb::open(&path).unwrap();
        assert_eq!(db.session_count().unwrap(), 0);
        assert!(path.exists());
    }
}
