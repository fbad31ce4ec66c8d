//! Durable alert storage.
//!
//! The sink is append-only: alerts are inserted in emission order and never
//! edited or deleted. `list_recent` reads newest-first for operator tooling.

use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::alert::Alert;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("alert store error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("alert store unavailable: {0}")]
    Unavailable(String),
    #[error("invalid alert record: {0}")]
    InvalidRecord(String),
}

pub trait AlertSink: Send {
    fn append(&mut self, alert: &Alert) -> Result<(), SinkError>;

    /// Most recent alerts first.
    fn list_recent(&mut self, limit: usize) -> Result<Vec<Alert>, SinkError>;
}

pub struct SqliteAlertStore {
    conn: Connection,
}

impl SqliteAlertStore {
    pub fn open(db_path: &str) -> Result<Self, SinkError> {
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> Result<(), SinkError> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS alerts (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              created_at INTEGER NOT NULL,
              alert_type TEXT NOT NULL,
              details TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_alerts_created ON alerts(created_at);
            "#,
        )?;
        Ok(())
    }
}

impl AlertSink for SqliteAlertStore {
    fn append(&mut self, alert: &Alert) -> Result<(), SinkError> {
        let created_at = i64::try_from(alert.created_at)
            .map_err(|_| SinkError::InvalidRecord("created_at exceeds i64 range".to_string()))?;
        self.conn.execute(
            "INSERT INTO alerts(created_at, alert_type, details) VALUES (?1, ?2, ?3)",
            params![created_at, alert.alert_type, alert.details],
        )?;
        Ok(())
    }

    fn list_recent(&mut self, limit: usize) -> Result<Vec<Alert>, SinkError> {
        let mut stmt = self.conn.prepare(
            "SELECT created_at, alert_type, details FROM alerts ORDER BY id DESC LIMIT ?1",
        )?;
        let mut rows = stmt.query(params![limit as i64])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let created_at: i64 = row.get(0)?;
            let created_at = u64::try_from(created_at)
                .map_err(|_| SinkError::InvalidRecord("negative created_at".to_string()))?;
            out.push(Alert {
                created_at,
                alert_type: row.get(1)?,
                details: row.get(2)?,
            });
        }
        Ok(out)
    }
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryAlertStore {
    alerts: Vec<Alert>,
}

impl InMemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// All alerts in append order (oldest first).
    pub fn all(&self) -> &[Alert] {
        &self.alerts
    }
}

impl AlertSink for InMemoryAlertStore {
    fn append(&mut self, alert: &Alert) -> Result<(), SinkError> {
        self.alerts.push(alert.clone());
        Ok(())
    }

    fn list_recent(&mut self, limit: usize) -> Result<Vec<Alert>, SinkError> {
        Ok(self.alerts.iter().rev().take(limit).cloned().collect())
    }
}

// Lets a test or a reader thread keep a handle on a store that has been
// handed to the alert writer.
impl<S: AlertSink> AlertSink for Arc<Mutex<S>> {
    fn append(&mut self, alert: &Alert) -> Result<(), SinkError> {
        self.lock()
            .map_err(|_| SinkError::Unavailable("alert store lock poisoned".to_string()))?
            .append(alert)
    }

    fn list_recent(&mut self, limit: usize) -> Result<Vec<Alert>, SinkError> {
        self.lock()
            .map_err(|_| SinkError::Unavailable("alert store lock poisoned".to_string()))?
            .list_recent(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(n: u64) -> Alert {
        Alert {
            alert_type: crate::alert::DROWNING_ALERT.to_string(),
            details: format!("alert {}", n),
            created_at: 1_700_000_000 + n,
        }
    }

    #[test]
    fn sqlite_round_trip_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("alerts.db");
        let mut store = SqliteAlertStore::open(db_path.to_str().unwrap()).unwrap();

        for n in 0..5 {
            store.append(&alert(n)).unwrap();
        }

        let recent = store.list_recent(3).unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].details, "alert 4");
        assert_eq!(recent[2].details, "alert 2");
    }

    #[test]
    fn sqlite_store_reopens_with_existing_alerts() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("alerts.db");
        {
            let mut store = SqliteAlertStore::open(db_path.to_str().unwrap()).unwrap();
            store.append(&alert(1)).unwrap();
        }
        let mut store = SqliteAlertStore::open(db_path.to_str().unwrap()).unwrap();
        assert_eq!(store.list_recent(10).unwrap().len(), 1);
    }

    #[test]
    fn in_memory_preserves_append_order() {
        let mut store = InMemoryAlertStore::new();
        for n in 0..3 {
            store.append(&alert(n)).unwrap();
        }
        assert_eq!(store.all()[0].details, "alert 0");
        let recent = store.list_recent(10).unwrap();
        assert_eq!(recent[0].details, "alert 2");
    }

    #[test]
    fn shared_store_appends_through_mutex() {
        let shared = Arc::new(Mutex::new(InMemoryAlertStore::new()));
        let mut handle = shared.clone();
        handle.append(&alert(7)).unwrap();
        assert_eq!(shared.lock().unwrap().len(), 1);
    }
}
