//! Error taxonomy
//!
//! Configuration errors are raised while the application is being assembled and
//! are fatal. Routing and handler errors are raised per request and recovered
//! exactly once, in [`crate::app::Application::handle`].

use thiserror::Error;

/// Failure raised by a handler while rendering.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Setup-time failures: duplicate registrations, unresolved identifiers, bad config files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("duplicate route: {method} {path} is already registered")]
    DuplicateRoute { method: String, path: String },

    #[error("duplicate handler identifier '{0}'")]
    DuplicateHandler(String),

    #[error("duplicate adapter name '{0}'")]
    DuplicateAdapter(String),

    #[error("route {method} {path} refers to unregistered handler '{handler}'")]
    UnknownHandler {
        method: String,
        path: String,
        handler: String,
    },

    #[error("no adapter registered under '{0}'")]
    UnknownAdapter(String),

    #[error("application has no route table")]
    MissingRouteTable,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Per-request failure to resolve a handler identifier
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("invalid request: method and path are required")]
    InvalidRequest,

    #[error("method not allowed: {method} {path} (allowed: {})", allowed.join(", "))]
    MethodNotAllowed {
        method: String,
        path: String,
        allowed: Vec<String>,
    },

    #[error("no route found for path '{path}'")]
    NotFound { path: String },
}

/// Failure to build a request value from transport input
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),

    #[error("invalid value for header '{0}'")]
    InvalidHeaderValue(String),
}

/// Everything that can go wrong between route lookup and a rendered envelope
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// The route table names a handler the registry does not know
    #[error("handler '{0}' is not registered")]
    UnknownHandler(String),

    #[error("{0}")]
    Handler(HandlerError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_not_allowed_lists_methods() {
        let err = RoutingError::MethodNotAllowed {
            method: "DELETE".to_string(),
            path: "/users".to_string(),
            allowed: vec!["GET".to_string(), "POST".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "method not allowed: DELETE /users (allowed: GET, POST)"
        );
    }

    #[test]
    fn test_not_found_includes_path() {
        let err = RoutingError::NotFound {
            path: "/missing".to_string(),
        };
        assert!(err.to_string().contains("no route found"));
        assert!(err.to_string().contains("/missing"));
    }
}
