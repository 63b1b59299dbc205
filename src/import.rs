//! Bulk monitor import used by `--import`.

use std::path::Path;

use validator::Validate;

use crate::{db, errors::ImportError, models::NewMonitor};

/// Parse and validate a JSON array of monitors. Nothing is returned unless every record is valid.
pub fn parse_monitors(json: &str) -> Result<Vec<NewMonitor>, ImportError> {
    let monitors: Vec<NewMonitor> = serde_json::from_str(json)?;

    for (index, monitor) in monitors.iter().enumerate() {
        monitor.validate().map_err(|e| {
            tracing::warn!(
                index,
                monitor_id = %monitor.id,
                validation_errors = ?e,
                "Import record failed validation"
            );
            ImportError::ValidationFailed(index, e)
        })?;
    }

    Ok(monitors)
}

/// Load `path` into the database at `db_path` in a single transaction.
pub fn import_file(db_path: &str, path: &Path) -> Result<usize, ImportError> {
    let json = std::fs::read_to_string(path)?;
    let monitors = parse_monitors(&json)?;

    let mut conn = rusqlite::Connection::open(db_path)?;
    let created_at = chrono::Utc::now().to_rfc3339();
    let count = db::upsert_monitors(&mut conn, &monitors, &created_at)?;

    tracing::info!(count, path = %path.display(), "Imported monitors");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_file() {
        let json = r#"[
            {"id": "m1", "userId": "u1", "name": "Site", "url": "https://example.com", "type": "http"},
            {"id": "m2", "userId": "u1", "name": "Box", "url": "10.0.0.2", "type": "ping", "interval": 5000}
        ]"#;

        let monitors = parse_monitors(json).unwrap();
        assert_eq!(monitors.len(), 2);
        assert_eq!(monitors[1].interval_ms, 5000);
    }

    #[test]
    fn test_parse_reports_invalid_index() {
        let json = r#"[
            {"id": "m1", "userId": "u1", "name": "Site", "url": "https://example.com", "type": "http"},
            {"id": "m2", "userId": "u1", "name": "Site", "url": "example.com", "type": "http"}
        ]"#;

        match parse_monitors(json) {
            Err(ImportError::ValidationFailed(index, _)) => assert_eq!(index, 1),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_non_array() {
        assert!(matches!(
            parse_monitors(r#"{"id": "m1"}"#),
            Err(ImportError::Parse(_))
        ));
    }
}
