use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

/// Monitor kinds accepted by the import path.
pub const MONITOR_TYPES: &[&str] = &["http", "ping", "pagespeed", "hardware", "docker", "port"];

/// Smallest polling interval a monitor may carry, in milliseconds.
pub const MIN_INTERVAL_MS: i64 = 1_000;

/// A monitor as returned by the lookup endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub description: Option<String>,
    pub url: String,
    #[serde(rename = "type")]
    pub monitor_type: String,
    pub is_active: bool,
    #[serde(rename = "interval")]
    pub interval_ms: i64,
    pub created_at: String,
}

/// A monitor record read from an import file.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_http_url"))]
pub struct NewMonitor {
    #[validate(length(min = 1, max = 128), custom(function = "validate_printable_ascii"))]
    pub id: String,
    #[validate(length(min = 1, max = 128), custom(function = "validate_printable_ascii"))]
    pub user_id: String,
    #[validate(length(min = 1, max = 256))]
    pub name: String,
    #[validate(length(max = 1024))]
    pub description: Option<String>,
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
    #[serde(rename = "type")]
    #[validate(custom(function = "validate_monitor_type"))]
    pub monitor_type: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(rename = "interval", default = "default_interval_ms")]
    #[validate(range(min = MIN_INTERVAL_MS))]
    pub interval_ms: i64,
}

fn default_active() -> bool {
    true
}

fn default_interval_ms() -> i64 {
    60_000
}

fn validate_printable_ascii(s: &str) -> Result<(), ValidationError> {
    if s.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) && !s.contains('/') {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_characters"))
    }
}

fn validate_monitor_type(kind: &str) -> Result<(), ValidationError> {
    if MONITOR_TYPES.contains(&kind) {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_monitor_type"))
    }
}

/// HTTP-family monitors need an absolute http(s) URL; the others take host strings.
fn validate_http_url(monitor: &NewMonitor) -> Result<(), ValidationError> {
    if monitor.monitor_type != "http" && monitor.monitor_type != "pagespeed" {
        return Ok(());
    }
    let rest = monitor
        .url
        .strip_prefix("https://")
        .or_else(|| monitor.url.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ValidationError::new("invalid_url")),
    }
}

// ============== Login form ==============

/// Values of the login form. Only the email step's field lives here.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Must be a valid email address.")
    )]
    pub email: String,
}

/// Validation messages keyed the same way as [`LoginForm`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormErrors {
    pub email: Option<String>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
    }

    /// Collect the first message reported for each field.
    pub fn from_validation(errors: &ValidationErrors) -> Self {
        let email = errors
            .field_errors()
            .get("email")
            .and_then(|errs| errs.first())
            .map(|err| {
                err.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string())
            });
        Self { email }
    }
}
