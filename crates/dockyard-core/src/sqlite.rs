use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension};

use crate::error::MarkerError;
use crate::marker::{CasOutcome, MarkerStore};
use crate::ReleaseVersion;

/// Marker kept as a keyed row in a SQLite database.
///
/// The compare-and-swap is a single conditional statement, so two processes
/// sharing the database cannot both win the same transition.
pub struct SqliteMarkerStore {
    conn: Mutex<Connection>,
    key: String,
    location: String,
}

impl SqliteMarkerStore {
    pub fn open(db_path: &Path, key: &str) -> Result<Self, MarkerError> {
        tracing::debug!(path = %db_path.display(), key, "opening marker database");

        if let Some(parent) = db_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| MarkerError::Write {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let conn = Connection::open(db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Self::with_connection(conn, key, db_path.display().to_string())
    }

    pub fn in_memory(key: &str) -> Result<Self, MarkerError> {
        Self::with_connection(Connection::open_in_memory()?, key, ":memory:".to_owned())
    }

    fn with_connection(conn: Connection, key: &str, location: String) -> Result<Self, MarkerError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS markers (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            key: key.to_owned(),
            location: format!("{location}#{key}"),
        })
    }

    fn lock_conn(&self) -> Result<MutexGuard<'_, Connection>, MarkerError> {
        self.conn.lock().map_err(|_| MarkerError::LockPoisoned)
    }

    fn current_timestamp_ms() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            // arch-lint: allow(no-silent-result-drop) reason="a clock before the epoch only zeroes updated_at"
            .unwrap_or_default()
    }

    fn read_raw(conn: &Connection, key: &str) -> Result<Option<String>, MarkerError> {
        let value = conn
            .query_row("SELECT value FROM markers WHERE key = ?1", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    fn parse(&self, raw: Option<String>) -> Result<Option<ReleaseVersion>, MarkerError> {
        raw.map(|s| {
            ReleaseVersion::parse(&s).map_err(|e| MarkerError::Corrupt {
                location: self.location.clone(),
                source: e,
            })
        })
        .transpose()
    }
}

impl MarkerStore for SqliteMarkerStore {
    fn read(&self) -> Result<Option<ReleaseVersion>, MarkerError> {
        let conn = self.lock_conn()?;
        let raw = Self::read_raw(&conn, &self.key)?;
        self.parse(raw)
    }

    fn write_if_changed(
        &self,
        expected: Option<&ReleaseVersion>,
        new: &ReleaseVersion,
    ) -> Result<CasOutcome, MarkerError> {
        let conn = self.lock_conn()?;
        let now = Self::current_timestamp_ms();

        let rows = match expected {
            // No marker yet: only the first inserter succeeds.
            None => conn.execute(
                "INSERT OR IGNORE INTO markers (key, value, updated_at) VALUES (?1, ?2, ?3)",
                (&self.key, new.as_str(), now),
            )?,
            Some(old) => conn.execute(
                r#"
                UPDATE markers
                SET value = ?1, updated_at = ?2
                WHERE key = ?3 AND value = ?4
                "#,
                (new.as_str(), now, &self.key, old.as_str()),
            )?,
        };

        if rows > 0 {
            if expected == Some(new) {
                return Ok(CasOutcome::Unchanged);
            }
            tracing::debug!(location = %self.location, version = %new, "marker row written");
            return Ok(CasOutcome::Written);
        }

        let found = Self::read_raw(&conn, &self.key)?;
        if found.as_deref() == Some(new.as_str()) {
            return Ok(CasOutcome::Unchanged);
        }

        Err(MarkerError::Conflict {
            expected: expected.map(ToString::to_string),
            found,
        })
    }

    fn location(&self) -> String {
        self.location.clone()
    }
}
