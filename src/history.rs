use chrono::{DateTime, Local};
use itertools::Itertools;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs::AppDirs;
use crate::session::{QuestionResult, Session, Status};

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("history database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not prepare history location: {0}")]
    Io(#[from] std::io::Error),
    #[error("history store is unavailable")]
    Unavailable,
}

/// Append-mostly store of finished sessions, most recent last.
///
/// Sessions have no stored identity; "the latest session" is matched by its
/// result count, which is enough while only one session is live at a time.
pub trait HistoryStore {
    fn append(&mut self, session: &Session) -> Result<(), HistoryError>;
    fn list(&self) -> Result<Vec<Session>, HistoryError>;
    /// Returns false when `index` is out of range
    fn delete_at(&mut self, index: usize) -> Result<bool, HistoryError>;
    fn rename_at(&mut self, index: usize, name: &str) -> Result<bool, HistoryError>;
    /// Rename the last session only if it holds exactly `result_count` results
    fn rename_latest_if_matches(
        &mut self,
        result_count: usize,
        name: &str,
    ) -> Result<bool, HistoryError>;
    /// Set the note of question `number` in the last session, matched the same way
    fn annotate_latest_if_matches(
        &mut self,
        result_count: usize,
        number: u32,
        note: &str,
    ) -> Result<bool, HistoryError>;
}

impl<T: HistoryStore + ?Sized> HistoryStore for Box<T> {
    fn append(&mut self, session: &Session) -> Result<(), HistoryError> {
        (**self).append(session)
    }

    fn list(&self) -> Result<Vec<Session>, HistoryError> {
        (**self).list()
    }

    fn delete_at(&mut self, index: usize) -> Result<bool, HistoryError> {
        (**self).delete_at(index)
    }

    fn rename_at(&mut self, index: usize, name: &str) -> Result<bool, HistoryError> {
        (**self).rename_at(index, name)
    }

    fn rename_latest_if_matches(
        &mut self,
        result_count: usize,
        name: &str,
    ) -> Result<bool, HistoryError> {
        (**self).rename_latest_if_matches(result_count, name)
    }

    fn annotate_latest_if_matches(
        &mut self,
        result_count: usize,
        number: u32,
        note: &str,
    ) -> Result<bool, HistoryError> {
        (**self).annotate_latest_if_matches(result_count, number, note)
    }
}

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        exam_name TEXT NOT NULL,
        started_at TEXT NOT NULL,
        target_seconds INTEGER NOT NULL,
        warning_margin INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS results (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        session_id INTEGER NOT NULL,
        position INTEGER NOT NULL,
        number INTEGER NOT NULL,
        elapsed_seconds INTEGER NOT NULL,
        status TEXT NOT NULL,
        marked BOOLEAN NOT NULL,
        note TEXT NOT NULL DEFAULT ''
    );
    CREATE INDEX IF NOT EXISTS idx_results_session ON results(session_id, position);
"#;

/// SQLite-backed history
#[derive(Debug)]
pub struct SqliteHistory {
    conn: Connection,
}

impl SqliteHistory {
    /// Open (creating if needed) the database at the default state location
    pub fn open_default() -> Result<Self, HistoryError> {
        let path = AppDirs::history_db_path().unwrap_or_else(|| PathBuf::from("qpace_history.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::debug!(path = %path.display(), "opening history database");
        Self::with_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, HistoryError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, HistoryError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    fn id_at(&self, index: usize) -> Result<Option<i64>, HistoryError> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM sessions ORDER BY id LIMIT 1 OFFSET ?1",
                [index as i64],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// Id of the most recent session if its result count is `result_count`
    fn latest_matching(&self, result_count: usize) -> Result<Option<i64>, HistoryError> {
        let latest: Option<(i64, i64)> = self
            .conn
            .query_row(
                r#"
                SELECT s.id, (SELECT COUNT(*) FROM results r WHERE r.session_id = s.id)
                FROM sessions s
                ORDER BY s.id DESC
                LIMIT 1
                "#,
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        Ok(latest
            .filter(|&(_, count)| count == result_count as i64)
            .map(|(id, _)| id))
    }

    fn load_results(&self) -> Result<Vec<(i64, QuestionResult)>, HistoryError> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT session_id, number, elapsed_seconds, status, marked, note
            FROM results
            ORDER BY session_id, position
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let status_str: String = row.get(3)?;
            let status = Status::from_name(&status_str).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(
                    3,
                    "status".to_string(),
                    rusqlite::types::Type::Text,
                )
            })?;
            Ok((
                row.get::<_, i64>(0)?,
                QuestionResult {
                    number: row.get(1)?,
                    elapsed_seconds: row.get(2)?,
                    status,
                    marked: row.get(4)?,
                    note: row.get(5)?,
                },
            ))
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}

impl HistoryStore for SqliteHistory {
    fn append(&mut self, session: &Session) -> Result<(), HistoryError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            r#"
            INSERT INTO sessions (exam_name, started_at, target_seconds, warning_margin)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                session.exam_name,
                session.started_at.to_rfc3339(),
                session.target_seconds,
                session.warning_margin,
            ],
        )?;
        let session_id = tx.last_insert_rowid();

        for (position, result) in session.results.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO results
                (session_id, position, number, elapsed_seconds, status, marked, note)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
                params![
                    session_id,
                    position as i64,
                    result.number,
                    result.elapsed_seconds,
                    result.status.to_string(),
                    result.marked,
                    result.note,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<Session>, HistoryError> {
        let mut results_by_session = self.load_results()?.into_iter().into_group_map();

        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, exam_name, started_at, target_seconds, warning_margin
            FROM sessions
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let started_str: String = row.get(2)?;
            let started_at: DateTime<Local> = DateTime::parse_from_rfc3339(&started_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        2,
                        "started_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);

            Ok((
                row.get::<_, i64>(0)?,
                Session {
                    exam_name: row.get(1)?,
                    started_at,
                    results: Vec::new(),
                    target_seconds: row.get(3)?,
                    warning_margin: row.get(4)?,
                },
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, mut session) = row?;
            session.results = results_by_session.remove(&id).unwrap_or_default();
            sessions.push(session);
        }
        Ok(sessions)
    }

    fn delete_at(&mut self, index: usize) -> Result<bool, HistoryError> {
        let Some(id) = self.id_at(index)? else {
            return Ok(false);
        };
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM results WHERE session_id = ?1", [id])?;
        tx.execute("DELETE FROM sessions WHERE id = ?1", [id])?;
        tx.commit()?;
        Ok(true)
    }

    fn rename_at(&mut self, index: usize, name: &str) -> Result<bool, HistoryError> {
        let Some(id) = self.id_at(index)? else {
            return Ok(false);
        };
        self.conn.execute(
            "UPDATE sessions SET exam_name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        Ok(true)
    }

    fn rename_latest_if_matches(
        &mut self,
        result_count: usize,
        name: &str,
    ) -> Result<bool, HistoryError> {
        if result_count == 0 {
            return Ok(false);
        }
        let Some(id) = self.latest_matching(result_count)? else {
            return Ok(false);
        };
        self.conn.execute(
            "UPDATE sessions SET exam_name = ?1 WHERE id = ?2",
            params![name, id],
        )?;
        Ok(true)
    }

    fn annotate_latest_if_matches(
        &mut self,
        result_count: usize,
        number: u32,
        note: &str,
    ) -> Result<bool, HistoryError> {
        if result_count == 0 {
            return Ok(false);
        }
        let Some(id) = self.latest_matching(result_count)? else {
            return Ok(false);
        };
        let changed = self.conn.execute(
            "UPDATE results SET note = ?1 WHERE session_id = ?2 AND number = ?3",
            params![note, id, number],
        )?;
        Ok(changed > 0)
    }
}

/// Volatile history kept in a `Vec`; used for `--ephemeral` runs and tests
#[derive(Debug, Default, Clone)]
pub struct MemoryHistory {
    sessions: Vec<Session>,
    unavailable: bool,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes all fail, like a full or missing disk
    pub fn unavailable() -> Self {
        Self {
            sessions: Vec::new(),
            unavailable: true,
        }
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    fn writable(&mut self) -> Result<&mut Vec<Session>, HistoryError> {
        if self.unavailable {
            Err(HistoryError::Unavailable)
        } else {
            Ok(&mut self.sessions)
        }
    }

    fn latest_matching(&mut self, result_count: usize) -> Result<Option<&mut Session>, HistoryError> {
        Ok(self
            .writable()?
            .last_mut()
            .filter(|s| result_count > 0 && s.results.len() == result_count))
    }
}

impl HistoryStore for MemoryHistory {
    fn append(&mut self, session: &Session) -> Result<(), HistoryError> {
        self.writable()?.push(session.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<Session>, HistoryError> {
        Ok(self.sessions.clone())
    }

    fn delete_at(&mut self, index: usize) -> Result<bool, HistoryError> {
        let sessions = self.writable()?;
        if index < sessions.len() {
            sessions.remove(index);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn rename_at(&mut self, index: usize, name: &str) -> Result<bool, HistoryError> {
        match self.writable()?.get_mut(index) {
            Some(session) => {
                session.exam_name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn rename_latest_if_matches(
        &mut self,
        result_count: usize,
        name: &str,
    ) -> Result<bool, HistoryError> {
        match self.latest_matching(result_count)? {
            Some(session) => {
                session.exam_name = name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn annotate_latest_if_matches(
        &mut self,
        result_count: usize,
        number: u32,
        note: &str,
    ) -> Result<bool, HistoryError> {
        let Some(session) = self.latest_matching(result_count)? else {
            return Ok(false);
        };
        match session.results.iter_mut().find(|r| r.number == number) {
            Some(result) => {
                result.note = note.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    fn result(number: u32, elapsed: u32, status: Status) -> QuestionResult {
        QuestionResult {
            number,
            elapsed_seconds: elapsed,
            status,
            marked: false,
            note: String::new(),
        }
    }

    fn session(name: &str, results: Vec<QuestionResult>) -> Session {
        Session {
            exam_name: name.to_string(),
            started_at: Local.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
            results,
            target_seconds: 25,
            warning_margin: 10,
        }
    }

    fn stores() -> Vec<Box<dyn HistoryStore>> {
        vec![
            Box::new(SqliteHistory::in_memory().unwrap()),
            Box::new(MemoryHistory::new()),
        ]
    }

    #[test]
    fn test_append_and_list_preserves_order() {
        for mut store in stores() {
            let mut first = session(
                "first",
                vec![result(1, 12, Status::Fast), result(2, 0, Status::Skipped)],
            );
            first.results[1].marked = true;
            first.results[0].note = "check units".to_string();
            let second = session("second", vec![result(1, 40, Status::Slow)]);

            store.append(&first).unwrap();
            store.append(&second).unwrap();

            let listed = store.list().unwrap();
            assert_eq!(listed, vec![first.clone(), second.clone()]);
        }
    }

    #[test]
    fn test_delete_at() {
        for mut store in stores() {
            store.append(&session("a", vec![result(1, 5, Status::Fast)])).unwrap();
            store.append(&session("b", vec![result(1, 5, Status::Fast)])).unwrap();
            store.append(&session("c", vec![result(1, 5, Status::Fast)])).unwrap();

            assert!(store.delete_at(1).unwrap());
            assert!(!store.delete_at(7).unwrap());

            let names: Vec<String> = store.list().unwrap().into_iter().map(|s| s.exam_name).collect();
            assert_eq!(names, vec!["a", "c"]);
        }
    }

    #[test]
    fn test_rename_at() {
        for mut store in stores() {
            store.append(&session("a", vec![result(1, 5, Status::Fast)])).unwrap();
            assert!(store.rename_at(0, "Physics mock").unwrap());
            assert!(!store.rename_at(1, "nope").unwrap());
            assert_eq!(store.list().unwrap()[0].exam_name, "Physics mock");
        }
    }

    #[test]
    fn test_rename_latest_requires_matching_count() {
        for mut store in stores() {
            store
                .append(&session("old", vec![result(1, 5, Status::Fast)]))
                .unwrap();
            store
                .append(&session(
                    "new",
                    vec![result(1, 5, Status::Fast), result(2, 30, Status::Slow)],
                ))
                .unwrap();

            assert!(!store.rename_latest_if_matches(1, "wrong").unwrap());
            assert!(!store.rename_latest_if_matches(0, "wrong").unwrap());
            assert!(store.rename_latest_if_matches(2, "Chemistry").unwrap());

            let listed = store.list().unwrap();
            assert_eq!(listed[0].exam_name, "old");
            assert_eq!(listed[1].exam_name, "Chemistry");
        }
    }

    #[test]
    fn test_rename_latest_on_empty_history() {
        for mut store in stores() {
            assert!(!store.rename_latest_if_matches(3, "x").unwrap());
        }
    }

    #[test]
    fn test_annotate_latest() {
        for mut store in stores() {
            store
                .append(&session(
                    "s",
                    vec![result(1, 5, Status::Fast), result(2, 20, Status::OnTime)],
                ))
                .unwrap();
            assert!(store.annotate_latest_if_matches(2, 2, "guessed").unwrap());
            assert!(!store.annotate_latest_if_matches(2, 9, "missing").unwrap());
            assert!(!store.annotate_latest_if_matches(1, 1, "count mismatch").unwrap());

            let listed = store.list().unwrap();
            assert_eq!(listed[0].results[1].note, "guessed");
            assert_eq!(listed[0].results[0].note, "");
        }
    }

    #[test]
    fn test_unavailable_memory_store_rejects_writes() {
        let mut store = MemoryHistory::unavailable();
        assert_matches!(
            store.append(&session("x", vec![result(1, 5, Status::Fast)])),
            Err(HistoryError::Unavailable)
        );
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_sqlite_history_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("history.db");
        {
            let mut store = SqliteHistory::open(&path).unwrap();
            store
                .append(&session("kept", vec![result(1, 25, Status::OnTime)]))
                .unwrap();
        }
        let store = SqliteHistory::open(&path).unwrap();
        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].exam_name, "kept");
        assert_eq!(listed[0].results[0].status, Status::OnTime);
    }

    #[test]
    fn test_sqlite_rejects_unknown_status() {
        let store = SqliteHistory::in_memory().unwrap();
        store
            .conn
            .execute(
                "INSERT INTO sessions (exam_name, started_at, target_seconds, warning_margin) VALUES ('x', ?1, 25, 10)",
                [Local::now().to_rfc3339()],
            )
            .unwrap();
        store
            .conn
            .execute(
                "INSERT INTO results (session_id, position, number, elapsed_seconds, status, marked) VALUES (1, 0, 1, 3, 'LATE', 0)",
                [],
            )
            .unwrap();
        assert_matches!(store.list(), Err(HistoryError::Sqlite(_)));
    }
}
