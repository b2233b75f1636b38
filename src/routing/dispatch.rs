//! Dispatcher module
//!
//! Resolves a request against a route table. The outcome distinguishes an unknown
//! path from a known path requested with the wrong method.

use super::table::RouteTable;
use crate::error::RoutingError;
use crate::request::Request;

/// Outcome of looking up one `(method, path)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'a> {
    Found(&'a str),
    MethodNotAllowed(Vec<String>),
    NotFound,
}

/// Classify a method/path pair; `method` is uppercased before lookup
pub fn classify<'a>(table: &'a RouteTable, method: &str, path: &str) -> Resolution<'a> {
    let method = method.to_ascii_uppercase();

    if let Some(entry) = table.lookup(&method, path) {
        return Resolution::Found(&entry.handler);
    }

    let allowed = table.allowed_methods(path);
    if allowed.is_empty() {
        Resolution::NotFound
    } else {
        Resolution::MethodNotAllowed(allowed)
    }
}

/// Resolve a request to its handler identifier
pub fn resolve<'a>(request: &Request, table: &'a RouteTable) -> Result<&'a str, RoutingError> {
    let (Some(method), Some(path)) = (request.method(), request.path()) else {
        return Err(RoutingError::InvalidRequest);
    };

    match classify(table, method, path) {
        Resolution::Found(handler) => Ok(handler),
        Resolution::MethodNotAllowed(allowed) => Err(RoutingError::MethodNotAllowed {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            allowed,
        }),
        Resolution::NotFound => Err(RoutingError::NotFound {
            path: path.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RouteTable {
        RouteTable::builder()
            .get("/users", "ListUsers")
            .post("/users", "CreateUser")
            .get("/hello", "HelloHandler")
            .build()
            .unwrap()
    }

    fn request(method: &str, path: &str) -> Request {
        Request::builder().method(method).path(path).build().unwrap()
    }

    #[test]
    fn test_classify_found() {
        let table = table();
        assert_eq!(
            classify(&table, "GET", "/hello"),
            Resolution::Found("HelloHandler")
        );
        assert_eq!(
            classify(&table, "post", "/users"),
            Resolution::Found("CreateUser")
        );
    }

    #[test]
    fn test_classify_method_not_allowed() {
        let table = table();
        assert_eq!(
            classify(&table, "DELETE", "/users"),
            Resolution::MethodNotAllowed(vec!["GET".to_string(), "POST".to_string()])
        );
    }

    #[test]
    fn test_classify_not_found() {
        assert_eq!(classify(&table(), "GET", "/missing"), Resolution::NotFound);
    }

    #[test]
    fn test_resolve_found() {
        assert_eq!(resolve(&request("get", "/hello"), &table()), Ok("HelloHandler"));
    }

    #[test]
    fn test_resolve_method_not_allowed_lists_get() {
        let table = RouteTable::builder().get("/users", "ListUsers").build().unwrap();
        let err = resolve(&request("DELETE", "/users"), &table).unwrap_err();
        assert_eq!(
            err,
            RoutingError::MethodNotAllowed {
                method: "DELETE".to_string(),
                path: "/users".to_string(),
                allowed: vec!["GET".to_string()],
            }
        );
        assert!(err.to_string().contains("GET"));
        assert!(err.to_string().contains("method not allowed"));
    }

    #[test]
    fn test_resolve_not_found_message() {
        let err = resolve(&request("GET", "/missing"), &table()).unwrap_err();
        assert!(err.to_string().contains("no route found"));
        assert!(err.to_string().contains("/missing"));
        assert!(!err.to_string().contains("method not allowed"));
    }

    #[test]
    fn test_resolve_parameter_pattern_is_literal() {
        let table = RouteTable::builder().get("/users/:id", "ShowUser").build().unwrap();
        assert!(matches!(
            resolve(&request("GET", "/users/42"), &table),
            Err(RoutingError::NotFound { .. })
        ));
        assert_eq!(resolve(&request("GET", "/users/:id"), &table), Ok("ShowUser"));
    }

    #[test]
    fn test_resolve_trailing_slash_not_normalized() {
        assert!(matches!(
            resolve(&request("GET", "/hello/"), &table()),
            Err(RoutingError::NotFound { .. })
        ));
    }

    #[test]
    fn test_resolve_invalid_request() {
        let no_method = Request::builder().path("/hello").build().unwrap();
        let no_path = Request::builder().method("GET").build().unwrap();
        assert_eq!(resolve(&no_method, &table()), Err(RoutingError::InvalidRequest));
        assert_eq!(resolve(&no_path, &table()), Err(RoutingError::InvalidRequest));
    }
}
