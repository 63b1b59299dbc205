//! Ordered route table for the monitor lookup endpoints.
//!
//! Bindings are tried in declaration order and the first one whose verb and
//! pattern both match wins. A `:name` segment captures exactly one non-empty
//! path segment, so `/:monitorId` never swallows `/user/u1`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{Method, Uri},
    routing::get,
    Json, Router,
};

use crate::{
    controller::{self, MonitorHandler, MonitorPayload},
    errors::MonitorError,
    AppState,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed path pattern such as `/user/:userId`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let segments = split_segments(pattern)
            .into_iter()
            .map(|seg| match seg.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                _ => Segment::Literal(seg.to_string()),
            })
            .collect();
        Self {
            raw: pattern.to_string(),
            segments,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match a request path, returning captured parameters on success.
    pub fn matches(&self, path: &str) -> Option<RouteParams> {
        let mut params = RouteParams::default();
        let mut parts = split_segments(path).into_iter();

        for segment in &self.segments {
            let part = parts.next()?;
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Literal(_) => return None,
                Segment::Param(_) if part.is_empty() => return None,
                Segment::Param(name) => params.push(name.clone(), part.to_string()),
            }
        }

        if parts.next().is_some() {
            return None;
        }
        Some(params)
    }
}

/// Split `/a/b/` into `a`, `b`. The root path yields nothing; one trailing slash is ignored.
fn split_segments(path: &str) -> Vec<&str> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let path = if path.len() > 1 {
        path.strip_suffix('/').unwrap_or(path)
    } else {
        path
    };
    if path.is_empty() {
        Vec::new()
    } else {
        path.split('/').collect()
    }
}

/// Path parameters captured while matching, in pattern order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(Vec<(String, String)>);

impl RouteParams {
    fn push(&mut self, name: String, value: String) {
        self.0.push((name, value));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct RouteBinding<H> {
    pub method: Method,
    pub pattern: PathPattern,
    pub name: &'static str,
    pub handler: H,
}

#[derive(Debug)]
pub struct RouteMatch<'a, H> {
    pub binding: &'a RouteBinding<H>,
    pub params: RouteParams,
}

#[derive(Debug, Clone)]
pub struct RouteTable<H> {
    bindings: Vec<RouteBinding<H>>,
}

impl<H> Default for RouteTable<H> {
    fn default() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }
}

impl<H> RouteTable<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a binding. Earlier bindings take precedence.
    pub fn route(mut self, method: Method, pattern: &str, name: &'static str, handler: H) -> Self {
        self.bindings.push(RouteBinding {
            method,
            pattern: PathPattern::parse(pattern),
            name,
            handler,
        });
        self
    }

    pub fn get(self, pattern: &str, name: &'static str, handler: H) -> Self {
        self.route(Method::GET, pattern, name, handler)
    }

    pub fn bindings(&self) -> &[RouteBinding<H>] {
        &self.bindings
    }

    pub fn resolve(&self, method: &Method, path: &str) -> Option<RouteMatch<'_, H>> {
        self.bindings
            .iter()
            .filter(|binding| binding.method == method)
            .find_map(|binding| {
                binding
                    .pattern
                    .matches(path)
                    .map(|params| RouteMatch { binding, params })
            })
    }
}

/// The monitor endpoints, in precedence order.
pub fn monitor_routes() -> RouteTable<MonitorHandler> {
    RouteTable::<MonitorHandler>::new()
        .get("/", "getAllMonitors", controller::get_all_monitors)
        .get("/:monitorId", "getMonitorById", controller::get_monitor_by_id)
        .get("/user/:userId", "getMonitorsByUserId", controller::get_monitors_by_user_id)
}

/// Register the dispatch handler for everything under `mount`.
pub fn monitor_router(mount: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route(mount, get(dispatch))
        .route(&format!("{mount}/"), get(dispatch))
        .route(&format!("{mount}/*rest"), get(dispatch))
}

fn relative_path<'a>(mount: &str, path: &'a str) -> &'a str {
    match path.strip_prefix(mount) {
        Some("") => "/",
        Some(rest) => rest,
        None => path,
    }
}

/// GET {mount}/... - Resolve through the monitor route table and run the bound controller
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
) -> Result<Json<MonitorPayload>, MonitorError> {
    let path = relative_path(&state.monitors_mount, uri.path());
    // axum answers HEAD with the GET handler and strips the body
    let method = if method == Method::HEAD {
        Method::GET
    } else {
        method
    };

    let found = state
        .monitor_routes
        .resolve(&method, path)
        .ok_or_else(|| MonitorError::NoRoute(path.to_string()))?;

    if state.debug_mode {
        tracing::info!(
            route = found.binding.name,
            pattern = found.binding.pattern.as_str(),
            params = ?found.params,
            "Dispatching monitor request"
        );
    }

    let conn = rusqlite::Connection::open(&state.db_path)?;
    let payload = (found.binding.handler)(&conn, &found.params)?;
    Ok(Json(payload))
}
