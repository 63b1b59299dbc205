// Library exports for integration tests

pub mod config;
pub mod controller;
pub mod db;
pub mod email_step;
pub mod errors;
pub mod handlers;
pub mod import;
pub mod login;
pub mod models;
pub mod routes;
pub mod session;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::{controller::MonitorHandler, login::LoginSession, routes::RouteTable, session::SessionStore};

pub struct AppState {
    pub db_path: String,
    pub debug_mode: bool,
    pub monitors_mount: String,
    pub monitor_routes: RouteTable<MonitorHandler>,
    pub sessions: SessionStore<LoginSession>,
    pub secure_cookies: bool,
}

/// All application routes, without middleware.
pub fn app(state: Arc<AppState>) -> Router {
    let monitors = routes::monitor_router(&state.monitors_mount);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .route("/login", get(handlers::login_page))
        .route("/login/email", post(handlers::submit_email))
        .route("/login/back", post(handlers::go_back))
        .route("/login/reset-password", post(handlers::reset_password))
        .route("/forgot-password", get(handlers::forgot_password))
        .merge(monitors)
        .with_state(state)
}
