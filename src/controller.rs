//! Monitor lookups bound into the route table.

use rusqlite::Connection;
use serde::Serialize;

use crate::{db, errors::MonitorError, models::Monitor, routes::RouteParams};

/// Signature shared by every monitor route binding.
pub type MonitorHandler = fn(&Connection, &RouteParams) -> Result<MonitorPayload, MonitorError>;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum MonitorPayload {
    One(Monitor),
    Many(Vec<Monitor>),
}

fn param<'a>(params: &'a RouteParams, name: &'static str) -> Result<&'a str, MonitorError> {
    params.get(name).ok_or(MonitorError::MissingParam(name))
}

/// GET / - All monitors
pub fn get_all_monitors(
    conn: &Connection,
    _params: &RouteParams,
) -> Result<MonitorPayload, MonitorError> {
    Ok(MonitorPayload::Many(db::get_all_monitors(conn)?))
}

/// GET /:monitorId - One monitor, 404 when unknown
pub fn get_monitor_by_id(
    conn: &Connection,
    params: &RouteParams,
) -> Result<MonitorPayload, MonitorError> {
    let id = param(params, "monitorId")?;
    db::get_monitor_by_id(conn, id)?
        .map(MonitorPayload::One)
        .ok_or_else(|| MonitorError::NotFound(id.to_string()))
}

/// GET /user/:userId - Monitors owned by a user; empty when the user has none
pub fn get_monitors_by_user_id(
    conn: &Connection,
    params: &RouteParams,
) -> Result<MonitorPayload, MonitorError> {
    let user_id = param(params, "userId")?;
    Ok(MonitorPayload::Many(db::get_monitors_by_user_id(conn, user_id)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::NewMonitor, routes::PathPattern};

    fn seeded() -> Connection {
        let mut conn = db::open_and_init(":memory:").unwrap();
        let monitors = vec![
            NewMonitor {
                id: "m1".to_string(),
                user_id: "u1".to_string(),
                name: "Site".to_string(),
                description: None,
                url: "https://example.com".to_string(),
                monitor_type: "http".to_string(),
                is_active: true,
                interval_ms: 60_000,
            },
            NewMonitor {
                id: "m2".to_string(),
                user_id: "u2".to_string(),
                name: "Router".to_string(),
                description: None,
                url: "10.0.0.1".to_string(),
                monitor_type: "ping".to_string(),
                is_active: false,
                interval_ms: 5_000,
            },
        ];
        db::upsert_monitors(&mut conn, &monitors, "2025-01-01T00:00:00+00:00").unwrap();
        conn
    }

    #[test]
    fn test_get_all_monitors() {
        let conn = seeded();
        match get_all_monitors(&conn, &RouteParams::default()).unwrap() {
            MonitorPayload::Many(all) => assert_eq!(all.len(), 2),
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_get_monitor_by_id() {
        let conn = seeded();
        let params = PathPattern::parse("/:monitorId").matches("/m2").unwrap();
        match get_monitor_by_id(&conn, &params).unwrap() {
            MonitorPayload::One(m) => {
                assert_eq!(m.name, "Router");
                assert!(!m.is_active);
            }
            other => panic!("expected single monitor, got {other:?}"),
        }

        let missing = PathPattern::parse("/:monitorId").matches("/nope").unwrap();
        assert!(matches!(
            get_monitor_by_id(&conn, &missing),
            Err(MonitorError::NotFound(id)) if id == "nope"
        ));
    }

    #[test]
    fn test_get_monitors_by_user_id() {
        let conn = seeded();
        let params = PathPattern::parse("/user/:userId").matches("/user/u1").unwrap();
        match get_monitors_by_user_id(&conn, &params).unwrap() {
            MonitorPayload::Many(list) => {
                assert_eq!(list.len(), 1);
                assert_eq!(list[0].id, "m1");
            }
            other => panic!("expected list, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_param_is_reported() {
        let conn = seeded();
        assert!(matches!(
            get_monitor_by_id(&conn, &RouteParams::default()),
            Err(MonitorError::MissingParam("monitorId"))
        ));
    }
}
