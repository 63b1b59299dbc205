#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{http::header, response::Response, Router};
use monitor_server::{db, routes, session::SessionStore, AppState};
use rusqlite::params;
use tempfile::NamedTempFile;

pub const MOUNT: &str = "/api/v1/monitors";

/// Creates a test application with a temporary SQLite database.
/// Returns the router and the temp file (which must be kept alive for the duration of the test).
pub fn setup_test_app() -> (Router, NamedTempFile) {
    let temp_db = NamedTempFile::new().expect("Failed to create temp db file");
    let db_path = temp_db.path().to_str().unwrap().to_string();

    db::open_and_init(&db_path).expect("Failed to initialize test database");

    let state = Arc::new(AppState {
        db_path,
        debug_mode: false,
        monitors_mount: MOUNT.to_string(),
        monitor_routes: routes::monitor_routes(),
        sessions: SessionStore::new(Duration::from_secs(60)),
        secure_cookies: false,
    });

    (monitor_server::app(state), temp_db)
}

/// Inserts a monitor row directly.
pub fn insert_monitor(db_path: &str, id: &str, user_id: &str, name: &str, created_at: &str) {
    let conn = rusqlite::Connection::open(db_path).unwrap();
    conn.execute(
        "INSERT INTO monitors (id, user_id, name, description, url, monitor_type, is_active, interval_ms, created_at)
         VALUES (?1, ?2, ?3, NULL, ?4, 'http', 1, 60000, ?5)",
        params![id, user_id, name, format!("https://{id}.example.com"), created_at],
    )
    .unwrap();
}

/// Extracts the `sid=...` pair from a response's Set-Cookie header.
pub fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("sid="))
        .and_then(|v| v.split(';').next())
        .expect("response should set a session cookie")
        .to_string()
}
