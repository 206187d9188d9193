//! Telemetry Store
//!
//! Append-only persistence for telemetry events. The SQLite store commits
//! every insert on its own, so a crash never leaves a half-written row.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Row};

use super::event::{TelemetryEvent, TIMESTAMP_FORMAT};
use crate::logic::detection::TrackId;

// ============================================================================
// STORE CONTRACT
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupt row {event_id}: {reason}")]
    CorruptRow { event_id: i64, reason: String },
}

/// Append-only sink for telemetry events
pub trait TelemetryStore {
    /// Persist one event atomically, returning its auto-assigned id.
    /// Prior rows are never touched.
    fn append(&mut self, event: &TelemetryEvent) -> Result<i64, StoreError>;

    /// Flush and release the store
    fn close(self) -> Result<(), StoreError>
    where
        Self: Sized;
}

/// A persisted event with its assigned id
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    pub event_id: i64,
    pub event: TelemetryEvent,
}

// ============================================================================
// SQLITE STORE
// ============================================================================

const CREATE_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS traffic_events (
        event_id INTEGER PRIMARY KEY AUTOINCREMENT,
        run_id TEXT NOT NULL,
        timestamp TEXT NOT NULL,
        run_mode TEXT NOT NULL,
        track_id INTEGER NOT NULL,
        class_label TEXT NOT NULL,
        confidence_pct REAL NOT NULL,
        weather_status TEXT NOT NULL,
        rain_mm REAL NOT NULL
    )";

const SELECT_COLUMNS: &str = "event_id, run_id, timestamp, run_mode, track_id, class_label, \
     confidence_pct, weather_status, rain_mm";

pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    /// Open (or create) a database file, creating parent directories
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        conn.execute(CREATE_TABLE, [])?;

        log::info!("Opened telemetry store: {:?}", path);
        Ok(Self {
            conn,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute(CREATE_TABLE, [])?;
        Ok(Self { conn, path: None })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Total events across all runs
    pub fn count(&self) -> Result<u64, StoreError> {
        let n: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM traffic_events", [], |row| row.get(0))?;
        Ok(n as u64)
    }

    pub fn count_for_run(&self, run_id: &str) -> Result<u64, StoreError> {
        let n: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM traffic_events WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }

    /// All events recorded for one track in one run, oldest first
    pub fn events_for_track(
        &self,
        run_id: &str,
        track_id: TrackId,
    ) -> Result<Vec<StoredEvent>, StoreError> {
        let sql = format!(
            "SELECT {} FROM traffic_events WHERE run_id = ?1 AND track_id = ?2 ORDER BY event_id",
            SELECT_COLUMNS
        );
        self.query_events(&sql, params![run_id, track_id])
    }

    fn query_events(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<StoredEvent>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, RawRow::from_row)?;

        let mut events = Vec::new();
        for row in rows {
            events.push(row?.into_stored()?);
        }
        Ok(events)
    }
}

impl TelemetryStore for SqliteStore {
    fn append(&mut self, event: &TelemetryEvent) -> Result<i64, StoreError> {
        self.conn.execute(
            "INSERT INTO traffic_events
                (run_id, timestamp, run_mode, track_id, class_label, confidence_pct, weather_status, rain_mm)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                event.run_id,
                event.timestamp_str(),
                event.run_mode.as_str(),
                event.track_id,
                event.class_label,
                event.confidence_pct,
                event.weather_status.as_str(),
                event.rain_mm,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn close(self) -> Result<(), StoreError> {
        let path = self.path.clone();
        self.conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
        if let Some(path) = path {
            log::info!("Closed telemetry store: {:?}", path);
        }
        Ok(())
    }
}

// ============================================================================
// ROW DECODING
// ============================================================================

/// Columns as stored, before string fields are parsed back into types
struct RawRow {
    event_id: i64,
    run_id: String,
    timestamp: String,
    run_mode: String,
    track_id: TrackId,
    class_label: String,
    confidence_pct: f64,
    weather_status: String,
    rain_mm: f64,
}

impl RawRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            event_id: row.get(0)?,
            run_id: row.get(1)?,
            timestamp: row.get(2)?,
            run_mode: row.get(3)?,
            track_id: row.get(4)?,
            class_label: row.get(5)?,
            confidence_pct: row.get(6)?,
            weather_status: row.get(7)?,
            rain_mm: row.get(8)?,
        })
    }

    fn into_stored(self) -> Result<StoredEvent, StoreError> {
        let event_id = self.event_id;
        let corrupt = |reason: String| StoreError::CorruptRow { event_id, reason };

        let timestamp = NaiveDateTime::parse_from_str(&self.timestamp, TIMESTAMP_FORMAT)
            .map_err(|e| corrupt(format!("timestamp '{}': {}", self.timestamp, e)))?
            .and_utc();

        Ok(StoredEvent {
            event_id,
            event: TelemetryEvent {
                run_id: self.run_id,
                timestamp,
                run_mode: self.run_mode.parse().map_err(corrupt)?,
                track_id: self.track_id,
                class_label: self.class_label,
                confidence_pct: self.confidence_pct,
                weather_status: self.weather_status.parse().map_err(corrupt)?,
                rain_mm: self.rain_mm,
            },
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
