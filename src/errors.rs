use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Error types for the monitor lookup endpoints
#[derive(Debug)]
pub enum MonitorError {
    /// No binding in the route table matched the request
    NoRoute(String),
    /// Lookup by id found nothing
    NotFound(String),
    /// A binding's handler asked for a parameter its pattern does not capture
    MissingParam(&'static str),
    /// Database operation error
    DatabaseError(rusqlite::Error),
}

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        match self {
            Self::NoRoute(path) => {
                tracing::debug!(path = %path, "No monitor route matched");
                (StatusCode::NOT_FOUND, "Not found").into_response()
            }
            Self::NotFound(id) => {
                (StatusCode::NOT_FOUND, format!("Monitor not found: {id}")).into_response()
            }
            Self::MissingParam(name) => {
                tracing::error!(param = name, "Route binding is missing a path parameter");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            Self::DatabaseError(e) => {
                tracing::error!(
                    database_error = ?e,
                    "Database operation failed"
                );
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<rusqlite::Error> for MonitorError {
    fn from(e: rusqlite::Error) -> Self {
        MonitorError::DatabaseError(e)
    }
}

/// Error types for loading monitors from an import file
#[derive(Debug)]
pub enum ImportError {
    /// File could not be read
    Io(std::io::Error),
    /// File is not a JSON array of monitors
    Parse(serde_json::Error),
    /// A record failed validation; carries its position in the file
    ValidationFailed(usize, validator::ValidationErrors),
    /// Database operation error
    DatabaseError(rusqlite::Error),
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "read import file: {e}"),
            Self::Parse(e) => write!(f, "parse import file: {e}"),
            Self::ValidationFailed(index, e) => write!(f, "monitor #{index} is invalid: {e}"),
            Self::DatabaseError(e) => write!(f, "store imported monitors: {e}"),
        }
    }
}

impl std::error::Error for ImportError {}

impl From<std::io::Error> for ImportError {
    fn from(e: std::io::Error) -> Self {
        ImportError::Io(e)
    }
}

impl From<serde_json::Error> for ImportError {
    fn from(e: serde_json::Error) -> Self {
        ImportError::Parse(e)
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(e: rusqlite::Error) -> Self {
        ImportError::DatabaseError(e)
    }
}
