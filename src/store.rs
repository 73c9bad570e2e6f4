//! # Session Store
//!
//! Durable storage for run sessions and their track points.
//!
//! ## Invariants
//!
//! - At most one session with `ended_at IS NULL` exists. `create_session`
//!   checks inside an IMMEDIATE transaction and a unique partial index backs
//!   the check for writers on other connections.
//! - Track points are append-only and only accepted for open sessions. They
//!   go away only when the parent session is deleted.
//! - Finished sessions are never rewritten: progress and finish updates only
//!   match open rows.
//!
//! Every write is a single statement or a single transaction, so readers never
//! observe partial field updates.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use log::{info, warn};
use once_cell::sync::Lazy;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use rusqlite_migration::{Migrations, M};

use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};
use crate::types::{ActivityType, RunSession, TrackPoint};

// ============================================================================
// Store Interface
// ============================================================================

pub trait SessionStore: Send + Sync {
    /// Create an open session. Fails with `SessionAlreadyActive` if one exists.
    fn create_session(&self, started_at: DateTime<Utc>, activity_type: ActivityType)
        -> Result<i64>;

    fn get_open_session(&self) -> Result<Option<RunSession>>;

    fn get_session(&self, session_id: i64) -> Result<Option<RunSession>>;

    /// Append a track point to an open session.
    fn append_point(&self, point: &TrackPoint) -> Result<()>;

    /// Sequence index the next appended point should use.
    fn next_sequence_index(&self, session_id: i64) -> Result<u32>;

    fn update_session_progress(
        &self,
        session_id: i64,
        distance_meters: f64,
        elapsed_active_seconds: u64,
        pace_min_per_km: f64,
    ) -> Result<()>;

    /// Close an open session. Fails with `NoActiveSession` if it is already closed.
    fn finish_session(&self, session_id: i64, ended_at: DateTime<Utc>, kcal: u32) -> Result<()>;

    /// All sessions, newest first.
    fn list_sessions(&self) -> Result<Vec<RunSession>>;

    /// Track points of a session in sequence order.
    fn track_points(&self, session_id: i64) -> Result<Vec<TrackPoint>>;

    /// Delete a session and all of its track points.
    fn delete_session(&self, session_id: i64) -> Result<bool>;
}

// ============================================================================
// Schema
// ============================================================================

static MIGRATIONS: Lazy<Migrations<'static>> = Lazy::new(|| {
    Migrations::new(vec![
        M::up(
            r#"
            CREATE TABLE run_sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                started_at INTEGER NOT NULL,              -- Unix millis
                ended_at INTEGER,                         -- NULL while open
                activity_type TEXT NOT NULL,
                distance_meters REAL NOT NULL DEFAULT 0,
                elapsed_active_seconds INTEGER NOT NULL DEFAULT 0,
                pace_min_per_km REAL NOT NULL DEFAULT 0,
                kcal INTEGER
            );

            CREATE TABLE track_points (
                session_id INTEGER NOT NULL
                    REFERENCES run_sessions(id) ON DELETE CASCADE,
                sequence_index INTEGER NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                timestamp INTEGER NOT NULL,               -- Unix millis
                PRIMARY KEY (session_id, sequence_index)
            ) WITHOUT ROWID;

            CREATE INDEX idx_run_sessions_started ON run_sessions(started_at DESC);
            "#,
        ),
        M::up(
            "CREATE UNIQUE INDEX idx_run_sessions_single_open
                 ON run_sessions((ended_at IS NULL)) WHERE ended_at IS NULL;",
        ),
    ])
});

const SESSION_COLUMNS: &str = "id, started_at, ended_at, activity_type, distance_meters,
     elapsed_active_seconds, pace_min_per_km, kcal";

fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<RunSession> {
    let activity: String = row.get(3)?;
    let activity_type = activity.parse().unwrap_or_else(|_| {
        warn!(
            "run_tracker: [Store] Unknown activity type '{}', defaulting to running",
            activity
        );
        ActivityType::Running
    });
    let elapsed: i64 = row.get(5)?;
    let kcal: Option<i64> = row.get(7)?;

    Ok(RunSession {
        id: row.get(0)?,
        started_at: from_millis(row.get(1)?),
        ended_at: row.get::<_, Option<i64>>(2)?.map(from_millis),
        activity_type,
        cumulative_distance_meters: row.get(4)?,
        elapsed_active_seconds: elapsed.max(0) as u64,
        pace_min_per_km: row.get(6)?,
        kcal: kcal.map(|k| k.max(0) as u32),
    })
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ============================================================================
// SQLite Store
// ============================================================================

/// [`SessionStore`] backed by a single SQLite connection.
pub struct SqliteSessionStore {
    conn: Mutex<Connection>,
    db_path: String,
}

impl SqliteSessionStore {
    /// Open (or create) the database at `db_path` and bring the schema up to date.
    pub fn new(db_path: &str) -> Result<Self> {
        let mut conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        MIGRATIONS.to_latest(&mut conn)?;

        info!("run_tracker: [Store] Opened session store at {}", db_path);

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: db_path.to_string(),
        })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        Self::new(":memory:")
    }

    pub fn from_config(config: &TrackerConfig) -> Result<Self> {
        config.validate()?;
        Self::new(&config.database_path)
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn open_session_id(conn: &Connection) -> Result<Option<i64>> {
        Ok(conn
            .query_row(
                "SELECT id FROM run_sessions WHERE ended_at IS NULL LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?)
    }
}

impl SessionStore for SqliteSessionStore {
    fn create_session(
        &self,
        started_at: DateTime<Utc>,
        activity_type: ActivityType,
    ) -> Result<i64> {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(session_id) = Self::open_session_id(&tx)? {
            return Err(TrackerError::SessionAlreadyActive { session_id });
        }

        let inserted = tx.execute(
            "INSERT INTO run_sessions (started_at, activity_type) VALUES (?, ?)",
            params![to_millis(started_at), activity_type.as_str()],
        );
        if let Err(e) = inserted {
            if is_constraint_violation(&e) {
                // Another connection won the race between our check and insert
                drop(tx);
                let session_id = Self::open_session_id(&conn)?.unwrap_or_default();
                return Err(TrackerError::SessionAlreadyActive { session_id });
            }
            return Err(e.into());
        }

        let id = tx.last_insert_rowid();
        tx.commit()?;
        Ok(id)
    }

    fn get_open_session(&self) -> Result<Option<RunSession>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {} FROM run_sessions WHERE ended_at IS NULL LIMIT 1",
            SESSION_COLUMNS
        );
        Ok(conn.query_row(&sql, [], session_from_row).optional()?)
    }

    fn get_session(&self, session_id: i64) -> Result<Option<RunSession>> {
        let conn = self.conn();
        let sql = format!("SELECT {} FROM run_sessions WHERE id = ?", SESSION_COLUMNS);
        Ok(conn
            .query_row(&sql, params![session_id], session_from_row)
            .optional()?)
    }

    fn append_point(&self, point: &TrackPoint) -> Result<()> {
        let conn = self.conn();
        let inserted = conn.execute(
            "INSERT INTO track_points (session_id, sequence_index, latitude, longitude, timestamp)
             SELECT ?1, ?2, ?3, ?4, ?5
             WHERE EXISTS (SELECT 1 FROM run_sessions WHERE id = ?1 AND ended_at IS NULL)",
            params![
                point.session_id,
                point.sequence_index,
                point.latitude,
                point.longitude,
                to_millis(point.timestamp),
            ],
        )?;
        if inserted == 0 {
            return Err(TrackerError::NoActiveSession);
        }
        Ok(())
    }

    fn next_sequence_index(&self, session_id: i64) -> Result<u32> {
        let conn = self.conn();
        let next: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sequence_index) + 1, 0) FROM track_points WHERE session_id = ?",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(next.max(0) as u32)
    }

    fn update_session_progress(
        &self,
        session_id: i64,
        distance_meters: f64,
        elapsed_active_seconds: u64,
        pace_min_per_km: f64,
    ) -> Result<()> {
        let conn = self.conn();
        let updated = conn.execute(
            "UPDATE run_sessions
             SET distance_meters = ?, elapsed_active_seconds = ?, pace_min_per_km = ?
             WHERE id = ? AND ended_at IS NULL",
            params![
                distance_meters,
                elapsed_active_seconds as i64,
                pace_min_per_km,
                session_id
            ],
        )?;
        if updated == 0 {
            return Err(TrackerError::NoActiveSession);
        }
        Ok(())
    }

    fn finish_session(&self, session_id: i64, ended_at: DateTime<Utc>, kcal: u32) -> Result<()> {
        let conn = self.conn();
        let updated = conn.execute(
            "UPDATE run_sessions SET ended_at = ?, kcal = ?
             WHERE id = ? AND ended_at IS NULL",
            params![to_millis(ended_at), kcal, session_id],
        )?;
        if updated == 0 {
            return Err(TrackerError::NoActiveSession);
        }
        info!(
            "run_tracker: [Store] Finished session {} ({} kcal)",
            session_id, kcal
        );
        Ok(())
    }

    fn list_sessions(&self) -> Result<Vec<RunSession>> {
        let conn = self.conn();
        let sql = format!(
            "SELECT {} FROM run_sessions ORDER BY started_at DESC, id DESC",
            SESSION_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let sessions = stmt
            .query_map([], session_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sessions)
    }

    fn track_points(&self, session_id: i64) -> Result<Vec<TrackPoint>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT session_id, sequence_index, latitude, longitude, timestamp
             FROM track_points WHERE session_id = ? ORDER BY sequence_index",
        )?;
        let points = stmt
            .query_map(params![session_id], |row| {
                Ok(TrackPoint {
                    session_id: row.get(0)?,
                    sequence_index: row.get(1)?,
                    latitude: row.get(2)?,
                    longitude: row.get(3)?,
                    timestamp: from_millis(row.get(4)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(points)
    }

    fn delete_session(&self, session_id: i64) -> Result<bool> {
        let conn = self.conn();
        let deleted = conn.execute(
            "DELETE FROM run_sessions WHERE id = ?",
            params![session_id],
        )?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn point(session_id: i64, seq: u32) -> TrackPoint {
        TrackPoint {
            session_id,
            sequence_index: seq,
            latitude: 51.5 + seq as f64 * 0.001,
            longitude: -0.12,
            timestamp: ts(seq as i64),
        }
    }

    #[test]
    fn test_migrations_are_valid() {
        assert!(MIGRATIONS.validate().is_ok());
    }

    #[test]
    fn test_create_and_get_open() {
        let store = SqliteSessionStore::in_memory().unwrap();
        assert!(store.get_open_session().unwrap().is_none());

        let id = store.create_session(ts(0), ActivityType::Walking).unwrap();
        let open = store.get_open_session().unwrap().unwrap();
        assert_eq!(open.id, id);
        assert_eq!(open.started_at, ts(0));
        assert_eq!(open.activity_type, ActivityType::Walking);
        assert_eq!(open.cumulative_distance_meters, 0.0);
        assert!(open.kcal.is_none());
    }

    #[test]
    fn test_single_open_session() {
        let store = SqliteSessionStore::in_memory().unwrap();
        let id = store.create_session(ts(0), ActivityType::Running).unwrap();

        let err = store
            .create_session(ts(5), ActivityType::Running)
            .unwrap_err();
        assert!(matches!(err, TrackerError::SessionAlreadyActive { session_id } if session_id == id));
        assert_eq!(err.kind(), ErrorKind::State);

        store.finish_session(id, ts(60), 10).unwrap();
        assert!(store.create_session(ts(120), ActivityType::Running).is_ok());
    }

    #[test]
    fn test_points_and_sequence() {
        let store = SqliteSessionStore::in_memory().unwrap();
        let id = store.create_session(ts(0), ActivityType::Running).unwrap();
        assert_eq!(store.next_sequence_index(id).unwrap(), 0);

        for seq in 0..3 {
            store.append_point(&point(id, seq)).unwrap();
        }
        assert_eq!(store.next_sequence_index(id).unwrap(), 3);

        // Duplicate index is rejected
        assert!(store.append_point(&point(id, 1)).is_err());

        let points = store.track_points(id).unwrap();
        assert_eq!(points.len(), 3);
        assert_eq!(points[2], point(id, 2));
    }

    #[test]
    fn test_finished_session_is_immutable() {
        let store = SqliteSessionStore::in_memory().unwrap();
        let id = store.create_session(ts(0), ActivityType::Running).unwrap();
        store.update_session_progress(id, 1500.0, 600, 6.67).unwrap();
        store.finish_session(id, ts(700), 120).unwrap();

        assert!(matches!(
            store.finish_session(id, ts(800), 999),
            Err(TrackerError::NoActiveSession)
        ));
        assert!(store.update_session_progress(id, 9999.0, 9999, 1.0).is_err());
        assert!(store.append_point(&point(id, 0)).is_err());

        let session = store.get_session(id).unwrap().unwrap();
        assert_eq!(session.kcal, Some(120));
        assert_eq!(session.ended_at, Some(ts(700)));
        assert_eq!(session.cumulative_distance_meters, 1500.0);
        assert_eq!(session.elapsed_active_seconds, 600);
    }

    #[test]
    fn test_list_newest_first() {
        let store = SqliteSessionStore::in_memory().unwrap();
        for start in [0, 1000, 500] {
            let id = store.create_session(ts(start), ActivityType::Cycling).unwrap();
            store.finish_session(id, ts(start + 10), 1).unwrap();
        }
        let starts: Vec<_> = store
            .list_sessions()
            .unwrap()
            .iter()
            .map(|s| s.started_at)
            .collect();
        assert_eq!(starts, vec![ts(1000), ts(500), ts(0)]);
    }

    #[test]
    fn test_delete_cascades_points() {
        let store = SqliteSessionStore::in_memory().unwrap();
        let id = store.create_session(ts(0), ActivityType::Running).unwrap();
        store.append_point(&point(id, 0)).unwrap();
        store.append_point(&point(id, 1)).unwrap();

        assert!(store.delete_session(id).unwrap());
        assert!(store.track_points(id).unwrap().is_empty());
        assert!(store.get_session(id).unwrap().is_none());
        assert!(!store.delete_session(id).unwrap());
    }

    #[test]
    fn test_reopen_file_database() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("runs.db");
        let path = path.to_str().unwrap();

        let id = {
            let store = SqliteSessionStore::new(path).unwrap();
            let id = store.create_session(ts(0), ActivityType::Running).unwrap();
            store.update_session_progress(id, 1200.0, 600, 8.33).unwrap();
            id
        };

        let store = SqliteSessionStore::new(path).unwrap();
        let open = store.get_open_session().unwrap().unwrap();
        assert_eq!(open.id, id);
        assert_eq!(open.cumulative_distance_meters, 1200.0);
        assert_eq!(open.elapsed_active_seconds, 600);
    }

    #[test]
    fn test_unique_index_blocks_second_open_row() {
        let store = SqliteSessionStore::in_memory().unwrap();
        store.create_session(ts(0), ActivityType::Running).unwrap();
        let conn = store.conn();
        let raw = conn.execute(
            "INSERT INTO run_sessions (started_at, activity_type) VALUES (1, 'running')",
            [],
        );
        assert!(raw.is_err_and(|e| is_constraint_violation(&e)));
    }
}
