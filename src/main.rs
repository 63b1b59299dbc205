use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

use monitor_server::{
    config, db, import, login::LoginSession, routes, session::SessionStore, AppState,
};

/// Maximum request body size (1 MB)
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Rate limit: requests per second per IP
const RATE_LIMIT_RPS: u64 = 10;

/// Rate limit burst size
const RATE_LIMIT_BURST: u32 = 20;

/// How often rate limiter and session state are swept
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser)]
#[command(name = "monitor-server")]
#[command(about = "Monitor lookup API and login email step")]
struct Args {
    /// Enable debug mode to log every monitor lookup and login step transition
    #[arg(short, long)]
    debug: bool,

    /// Upsert monitors from a JSON file before serving
    #[arg(long, value_name = "FILE")]
    import: Option<PathBuf>,
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = ?e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = ?e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load config from config.toml in the same directory as the executable
    let cfg = config::load_config()?;

    // Environment variables override config file values
    let bind_addr: SocketAddr = std::env::var("MONITOR_BIND")
        .unwrap_or(cfg.bind)
        .parse()
        .context("parse bind address")?;

    let db_path = match std::env::var("MONITOR_DB_PATH")
        .ok()
        .or(cfg.db_path.clone())
    {
        Some(path) => path,
        None => config::default_db_path()?,
    };

    let monitors_mount =
        config::normalize_mount(&std::env::var("MONITOR_MOUNT").unwrap_or(cfg.monitors_mount))?;

    // Debug mode can be enabled via --debug flag, MONITOR_DEBUG env var, or config file
    let debug_mode = args.debug || env_flag("MONITOR_DEBUG") || cfg.debug;

    let cert_path = std::env::var("MONITOR_TLS_CERT")
        .ok()
        .or(cfg.tls_cert)
        .unwrap_or_default();
    let key_path = std::env::var("MONITOR_TLS_KEY")
        .ok()
        .or(cfg.tls_key)
        .unwrap_or_default();
    let tls_enabled = !cert_path.is_empty() && !key_path.is_empty();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        %bind_addr,
        %db_path,
        %monitors_mount,
        debug_mode,
        "Starting monitor-server"
    );

    // Ensure DB directory exists
    if let Some(parent) = std::path::Path::new(&db_path).parent() {
        std::fs::create_dir_all(parent).ok();
    }

    // Initialize schema + WAL
    let _ = db::open_and_init(&db_path)?;

    if let Some(path) = &args.import {
        import::import_file(&db_path, path)
            .with_context(|| format!("import monitors from {}", path.display()))?;
    }

    let sessions: SessionStore<LoginSession> =
        SessionStore::new(Duration::from_secs(cfg.session_ttl_secs));

    let state = Arc::new(AppState {
        db_path,
        debug_mode,
        monitors_mount,
        monitor_routes: routes::monitor_routes(),
        sessions: sessions.clone(),
        secure_cookies: tls_enabled,
    });

    // Configure rate limiting (per IP)
    let governor_config = GovernorConfigBuilder::default()
        .per_second(RATE_LIMIT_RPS)
        .burst_size(RATE_LIMIT_BURST)
        .finish()
        .context("failed to build rate limiter config")?;

    let governor_limiter = governor_config.limiter().clone();
    let rate_limit_layer = GovernorLayer {
        config: Arc::new(governor_config),
    };

    // Background sweep of rate limiter state and idle sessions
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            governor_limiter.retain_recent();
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                tracing::debug!(purged, "Dropped idle sessions");
            }
        }
    });

    let app = monitor_server::app(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
            .layer(rate_limit_layer),
    );

    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_handle.graceful_shutdown(Some(Duration::from_secs(30)));
    });

    // Rate limiting keys on the peer address
    let service = app.into_make_service_with_connect_info::<SocketAddr>();

    if tls_enabled {
        let tls_config = axum_server::tls_rustls::RustlsConfig::from_pem_file(cert_path, key_path)
            .await
            .context("load tls cert/key")?;

        axum_server::bind_rustls(bind_addr, tls_config)
            .handle(handle)
            .serve(service)
            .await
            .context("serve rustls")?;
    } else {
        axum_server::bind(bind_addr)
            .handle(handle)
            .serve(service)
            .await
            .context("serve http")?;
    }

    tracing::info!("Server shutdown complete");
    Ok(())
}
