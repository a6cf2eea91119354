use crate::config::RoutingConfig;
use crate::error::DispatchError;
use std::fmt;
use tracing::{debug, warn};

/// Resolved `(handler, action)` pair for one request path.
///
/// Recomputed per request, never cached.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RouteDescriptor {
    /// Handler name without the type suffix (e.g. `User`)
    pub handler: String,
    /// Action name (e.g. `Register`)
    pub action: String,
}

impl RouteDescriptor {
    pub fn new(handler: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            action: action.into(),
        }
    }
}

impl fmt::Display for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.handler, self.action)
    }
}

/// Uppercase the first character and lowercase the rest (`uSER` -> `User`).
#[must_use]
pub fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Conventional path → route resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteResolver {
    default_route: RouteDescriptor,
}

impl Default for RouteResolver {
    fn default() -> Self {
        Self::new(&RoutingConfig::default())
    }
}

impl RouteResolver {
    #[must_use]
    pub fn new(config: &RoutingConfig) -> Self {
        Self {
            default_route: RouteDescriptor::new(
                config.default_handler.clone(),
                config.default_action.clone(),
            ),
        }
    }

    #[must_use]
    pub fn default_route(&self) -> &RouteDescriptor {
        &self.default_route
    }

    /// Resolve a request path.
    ///
    /// Any query or fragment suffix is ignored. Segments beyond the second
    /// are ignored as well.
    ///
    /// # Errors
    ///
    /// [`DispatchError::RouteNotFound`] when a path other than `/` has fewer
    /// than two non-empty segments.
    pub fn resolve(&self, path: &str) -> Result<RouteDescriptor, DispatchError> {
        let path = crate::server::request::derive_path(path);
        if path == "/" {
            debug!(route = %self.default_route, "Root path resolved to default route");
            return Ok(self.default_route.clone());
        }

        let mut segments = path.split('/').filter(|s| !s.is_empty());
        match (segments.next(), segments.next()) {
            (Some(handler), Some(action)) => {
                let route = RouteDescriptor::new(capitalize(handler), capitalize(action));
                debug!(path = %path, route = %route, "Route resolved");
                Ok(route)
            }
            _ => {
                warn!(path = %path, "Path does not name a handler and an action");
                Err(DispatchError::RouteNotFound {
                    path: path.to_string(),
                })
            }
        }
    }
}
