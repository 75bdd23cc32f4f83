use crate::evaluator::CheckOutcome;
use crate::metrics::Metric;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One evaluator decision, kept so an operator can audit exactly why an
/// email did or did not go out.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckRecord {
    pub id: Option<i64>,
    pub metric: Metric,
    pub outcome: CheckOutcome,
    pub value: Option<f64>,
    pub message: Option<String>,
    pub timestamp: String,
}

#[derive(Clone)]
pub struct AuditLog {
    db_path: Arc<PathBuf>,
}

impl AuditLog {
    pub fn open(path: &str) -> Result<Self, String> {
        let db_path = PathBuf::from(path);
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
        }

        let conn = Connection::open(&db_path).map_err(|e| e.to_string())?;
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;
            PRAGMA synchronous=NORMAL;
            CREATE TABLE IF NOT EXISTS checks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                metric TEXT NOT NULL,
                outcome TEXT NOT NULL,
                value REAL,
                message TEXT,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_checks_metric ON checks(metric);
            CREATE INDEX IF NOT EXISTS idx_checks_ts ON checks(timestamp);
            ",
        )
        .map_err(|e| e.to_string())?;

        Ok(Self {
            db_path: Arc::new(db_path),
        })
    }

    pub fn append(&self, record: &CheckRecord) -> Result<i64, String> {
        let conn = Connection::open(&*self.db_path).map_err(|e| e.to_string())?;
        let metric = serde_json::to_string(&record.metric).map_err(|e| e.to_string())?;
        let outcome = serde_json::to_string(&record.outcome).map_err(|e| e.to_string())?;

        conn.execute(
            "INSERT INTO checks (metric, outcome, value, message, timestamp)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                metric,
                outcome,
                record.value,
                record.message,
                record.timestamp,
            ],
        )
        .map_err(|e| e.to_string())?;

        Ok(conn.last_insert_rowid())
    }

    /// Most recent records first.
    pub fn recent(&self, limit: usize) -> Result<Vec<CheckRecord>, String> {
        let conn = Connection::open(&*self.db_path).map_err(|e| e.to_string())?;
        let mut stmt = conn
            .prepare(
                "SELECT id, metric, outcome, value, message, timestamp
                 FROM checks
                 ORDER BY id DESC
                 LIMIT ?1",
            )
            .map_err(|e| e.to_string())?;

        let rows = stmt
            .query_map(params![limit as i64], map_row)
            .map_err(|e| e.to_string())?;

        let mut records = Vec::new();
        for row in rows {
            records.push(row.map_err(|e| e.to_string())?);
        }
        Ok(records)
    }
}

fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CheckRecord> {
    let metric_str: String = row.get(1)?;
    let outcome_str: String = row.get(2)?;

    let metric: Metric = serde_json::from_str(&metric_str).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(err))
    })?;
    let outcome: CheckOutcome = serde_json::from_str(&outcome_str).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(err))
    })?;

    Ok(CheckRecord {
        id: row.get(0)?,
        metric,
        outcome,
        value: row.get(3)?,
        message: row.get(4)?,
        timestamp: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db_path(name: &str) -> String {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        format!("/tmp/alert-core-tests/{name}-{nanos}.db")
    }

    #[test]
    fn append_and_recent_round_trip() {
        let log = AuditLog::open(&db_path("audit-roundtrip")).expect("open");
        let id = log
            .append(&CheckRecord {
                id: None,
                metric: Metric::Temperature,
                outcome: CheckOutcome::Triggered,
                value: Some(87.0),
                message: Some("HIGH TEMPERATURE: 87.0°F (threshold: 85°F)".into()),
                timestamp: "1".into(),
            })
            .expect("append");
        assert!(id > 0);

        let records = log.recent(10).expect("recent");
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0].metric, Metric::Temperature));
        assert!(matches!(records[0].outcome, CheckOutcome::Triggered));
        assert_eq!(records[0].value, Some(87.0));
    }

    #[test]
    fn recent_returns_newest_first() {
        let log = AuditLog::open(&db_path("audit-order")).expect("open");
        for outcome in [CheckOutcome::Triggered, CheckOutcome::Suppressed] {
            log.append(&CheckRecord {
                id: None,
                metric: Metric::Co2,
                outcome,
                value: Some(1600.0),
                message: None,
                timestamp: "1".into(),
            })
            .expect("append");
        }

        let records = log.recent(1).expect("recent");
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0].outcome, CheckOutcome::Suppressed));
    }
}
