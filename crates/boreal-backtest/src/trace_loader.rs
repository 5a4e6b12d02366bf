//! CSV ingestion: turns a trace file on disk into the hourly rows the
//! simulator consumes.

use std::path::Path;

use boreal_types::{EngineError, EngineResult, TraceRow};

/// Reads a CSV file with columns `timestamp,consumption_kwh,spot_price`
/// and optional `solar_kwh,realised_import_cost,realised_export_revenue`,
/// sorted by timestamp ascending on return.
pub fn load_trace(path: &Path) -> EngineResult<Vec<TraceRow>> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| EngineError::InvalidTrace(format!("{}: {e}", path.display())))?;

    let mut rows: Vec<TraceRow> = reader
        .deserialize()
        .collect::<Result<Vec<TraceRow>, csv::Error>>()
        .map_err(|e| EngineError::InvalidTrace(e.to_string()))?;

    rows.sort_by_key(|r| r.timestamp);
    validate(&rows)?;
    Ok(rows)
}

fn validate(rows: &[TraceRow]) -> EngineResult<()> {
    if rows.is_empty() {
        return Err(EngineError::InvalidTrace("trace has no rows".to_string()));
    }
    for window in rows.windows(2) {
        if window[0].timestamp == window[1].timestamp {
            return Err(EngineError::InvalidTrace(format!(
                "duplicate timestamp {}",
                window[0].timestamp
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_and_sorts_a_minimal_csv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,consumption_kwh,spot_price,solar_kwh").unwrap();
        writeln!(file, "2026-01-02T00:00:00Z,2.0,1.0,0.0").unwrap();
        writeln!(file, "2026-01-01T00:00:00Z,3.0,0.5,0.0").unwrap();

        let rows = load_trace(file.path()).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].timestamp < rows[1].timestamp);
    }

    #[test]
    fn rejects_empty_trace() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "timestamp,consumption_kwh,spot_price\n").unwrap();
        assert!(load_trace(file.path()).is_err());
    }
}
