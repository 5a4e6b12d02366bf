//! SQLite-backed storage of completed run results, for comparing a batch
//! of historical backtests without re-running the simulator each time.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::Connection;

use boreal_types::RunSummary;

/// Abstraction over where run results live, so the CLI doesn't hard-code
/// SQLite.
pub trait RunStore: Send + Sync {
    fn save_run(&self, label: &str, summary: &RunSummary) -> Result<()>;
    fn load_run(&self, label: &str) -> Result<Option<RunSummary>>;
    fn list_runs(&self) -> Result<Vec<(String, DateTime<Utc>)>>;
}

/// SQLite-based run store, one row per labeled run with the full
/// `RunSummary` serialised as JSON.
#[derive(Debug, Clone)]
pub struct SqliteRunStore {
    conn_path: std::path::PathBuf,
}

impl SqliteRunStore {
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let store = Self {
            conn_path: path.as_ref().to_path_buf(),
        };
        store.connect()?.execute(
            "CREATE TABLE IF NOT EXISTS runs (
                label TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                summary_json TEXT NOT NULL
            )",
            [],
        )?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection> {
        Connection::open(&self.conn_path)
            .with_context(|| format!("failed to open run store at {}", self.conn_path.display()))
    }
}

impl RunStore for SqliteRunStore {
    fn save_run(&self, label: &str, summary: &RunSummary) -> Result<()> {
        let conn = self.connect()?;
        let json = serde_json::to_string(summary).context("serialising run summary")?;
        conn.execute(
            "INSERT INTO runs (label, created_at, summary_json) VALUES (?1, ?2, ?3)
             ON CONFLICT(label) DO UPDATE SET created_at = excluded.created_at, summary_json = excluded.summary_json",
            rusqlite::params![label, Utc::now().to_rfc3339(), json],
        )?;
        Ok(())
    }

    fn load_run(&self, label: &str) -> Result<Option<RunSummary>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT summary_json FROM runs WHERE label = ?1")?;
        let mut rows = stmt.query(rusqlite::params![label])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let json: String = row.get(0)?;
        Ok(Some(serde_json::from_str(&json).context("deserialising run summary")?))
    }

    fn list_runs(&self) -> Result<Vec<(String, DateTime<Utc>)>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare("SELECT label, created_at FROM runs ORDER BY created_at ASC")?;
        let rows: Vec<(String, DateTime<Utc>)> = stmt
            .query_map([], |row| {
                let label: String = row.get(0)?;
                let created_at: String = row.get(1)?;
                Ok((label, created_at))
            })?
            .filter_map(std::result::Result::ok)
            .filter_map(|(label, created_at)| {
                DateTime::parse_from_rfc3339(&created_at)
                    .ok()
                    .map(|dt| (label, dt.with_timezone(&Utc)))
            })
            .collect();
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boreal_types::PolicyCounters;

    fn summary() -> RunSummary {
        RunSummary {
            total_baseline_cost_sek: 100.0,
            total_cost_with_battery_sek: 80.0,
            net_savings_sek: 20.0,
            peak_shaving_savings_sek: 5.0,
            soc_series_kwh: vec![5.0, 6.0],
            grid_import_series_kw: vec![1.0, 2.0],
            grid_export_series_kw: vec![0.0, 0.0],
            monthly_peaks: Vec::new(),
            counters: PolicyCounters::default(),
            decisions: Vec::new(),
        }
    }

    #[test]
    fn round_trips_a_saved_run() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteRunStore::open(dir.path().join("runs.db")).unwrap();
        store.save_run("baseline", &summary()).unwrap();

        let loaded = store.load_run("baseline").unwrap().unwrap();
        assert_eq!(loaded.net_savings_sek, 20.0);
        assert!(store.load_run("missing").unwrap().is_none());
    }

    #[test]
    fn overwrites_a_run_saved_under_the_same_label() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteRunStore::open(dir.path().join("runs.db")).unwrap();
        store.save_run("baseline", &summary()).unwrap();

        let mut updated = summary();
        updated.net_savings_sek = 99.0;
        store.save_run("baseline", &updated).unwrap();

        assert_eq!(store.list_runs().unwrap().len(), 1);
        assert_eq!(store.load_run("baseline").unwrap().unwrap().net_savings_sek, 99.0);
    }
}
