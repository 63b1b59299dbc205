use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default)]
    pub db_path: Option<String>,

    #[serde(default)]
    pub tls_cert: Option<String>,

    #[serde(default)]
    pub tls_key: Option<String>,

    #[serde(default)]
    pub debug: bool,

    #[serde(default = "default_monitors_mount")]
    pub monitors_mount: String,

    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

fn default_bind() -> String {
    "0.0.0.0:8443".to_string()
}

fn default_monitors_mount() -> String {
    "/api/v1/monitors".to_string()
}

fn default_session_ttl_secs() -> u64 {
    30 * 60
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            db_path: None,
            tls_cert: None,
            tls_key: None,
            debug: false,
            monitors_mount: default_monitors_mount(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl Config {
    /// Reject values that parse but cannot run the server.
    pub fn validate(&self) -> Result<()> {
        if self.session_ttl_secs == 0 {
            anyhow::bail!("session_ttl_secs must be greater than zero");
        }
        Ok(())
    }
}

/// Normalize a mount path: leading slash, no trailing slash, never bare "/".
pub fn normalize_mount(mount: &str) -> Result<String> {
    let trimmed = mount.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        anyhow::bail!("monitors_mount must not be the root path");
    }
    if trimmed.contains(['*', ':', '{', '}']) {
        anyhow::bail!("monitors_mount must be a literal path: {mount}");
    }
    if trimmed.starts_with('/') {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("/{trimmed}"))
    }
}

/// Get the directory containing the executable
pub fn exe_dir() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("failed to get executable path")?;
    exe_path
        .parent()
        .map(|p| p.to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("executable has no parent directory"))
}

/// Generate template config.toml if it doesn't exist
fn generate_template_config(config_path: &PathBuf) -> Result<()> {
    let template = r#"# Monitor Server Configuration
#
# Environment variables override these settings:
#   - MONITOR_BIND
#   - MONITOR_DB_PATH
#   - MONITOR_TLS_CERT
#   - MONITOR_TLS_KEY
#   - MONITOR_DEBUG
#   - MONITOR_MOUNT

# Server bind address (IP:port)
bind = "0.0.0.0:8443"

# Database file path (defaults to monitors.db in executable directory if not set)
# db_path = "/var/lib/monitor-server/monitors.db"

# Optional TLS certificate and key paths
# tls_cert = "path/to/cert.pem"
# tls_key = "path/to/key.pem"

# Path the monitor lookup endpoints are mounted under
monitors_mount = "/api/v1/monitors"

# Idle login sessions are dropped after this many seconds
session_ttl_secs = 1800

# Log every monitor lookup and login step transition
debug = false
"#;

    std::fs::write(config_path, template)
        .with_context(|| format!("failed to write template config to {}", config_path.display()))?;

    tracing::info!(path = %config_path.display(), "Generated template config file");
    Ok(())
}

/// Load config from config.toml in the same directory as the executable.
/// Generates a template file if it doesn't exist.
pub fn load_config() -> Result<Config> {
    let exe_dir = exe_dir()?;
    let config_path = exe_dir.join("config.toml");

    if config_path.exists() {
        let contents = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config file: {}", config_path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", config_path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file: {}", config_path.display()))?;
        Ok(config)
    } else {
        generate_template_config(&config_path)?;
        Ok(Config::default())
    }
}

/// Get the default database path (monitors.db in the same directory as the executable)
pub fn default_db_path() -> Result<String> {
    let exe_dir = exe_dir()?;
    let db_path = exe_dir.join("monitors.db");
    Ok(db_path.to_string_lossy().to_string())
}
