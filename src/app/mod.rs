//! Application module
//!
//! Composition root tying a route table to a handler registry. [`Application::handle`]
//! is the single place where routing and handler failures are turned into
//! response envelopes.

use crate::error::{ConfigError, DispatchError, RoutingError};
use crate::handler::HandlerRegistry;
use crate::logger;
use crate::request::Request;
use crate::response::{is_valid_status, ResponseEnvelope};
use crate::routing::{self, RouteTable};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Status used for every routing failure, including method mismatches
pub const ROUTING_FAILURE_STATUS: u16 = 404;
pub const INTERNAL_ERROR_STATUS: u16 = 500;
const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

/// Immutable application: routes and handlers, shared across request tasks
#[derive(Debug)]
pub struct Application {
    routes: RouteTable,
    handlers: HandlerRegistry,
    expose_errors: bool,
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::default()
    }

    pub const fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub const fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    /// Check that every route points at a registered handler
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing: Vec<_> = self
            .routes
            .iter()
            .filter(|entry| !self.handlers.contains(&entry.handler))
            .collect();
        missing.sort_by(|a, b| (&a.path, &a.method).cmp(&(&b.path, &b.method)));

        match missing.first() {
            Some(entry) => Err(ConfigError::UnknownHandler {
                method: entry.method.clone(),
                path: entry.path.clone(),
                handler: entry.handler.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Handler identifier a request would be routed to
    pub fn resolve<'a>(&'a self, request: &Request) -> Result<&'a str, RoutingError> {
        routing::resolve(request, &self.routes)
    }

    /// Resolve, instantiate and run the handler for `request`
    ///
    /// A panic inside the handler factory or `render` is reported as a handler error,
    /// as is a status code that cannot be sent on the wire.
    pub fn dispatch(&self, request: &Request) -> Result<ResponseEnvelope, DispatchError> {
        let id = self.resolve(request)?;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut handler = self.handlers.instantiate(id, request)?;
            handler.render().map_err(DispatchError::Handler)
        }));
        let render = match outcome {
            Ok(result) => result?,
            Err(payload) => {
                return Err(DispatchError::Handler(
                    format!("handler panicked: {}", panic_message(payload.as_ref())).into(),
                ));
            }
        };

        let envelope = ResponseEnvelope::from_render(render);
        if !is_valid_status(envelope.status_code()) {
            return Err(DispatchError::Handler(
                format!("invalid status code {}", envelope.status_code()).into(),
            ));
        }
        Ok(envelope)
    }

    /// Dispatch and convert every failure into an envelope
    pub fn handle(&self, request: &Request) -> ResponseEnvelope {
        match self.dispatch(request) {
            Ok(envelope) => envelope,
            Err(DispatchError::Routing(err)) => {
                logger::log_routing_failure(
                    request.method().unwrap_or("-"),
                    request.path().unwrap_or("-"),
                    &err.to_string(),
                );
                ResponseEnvelope::error(ROUTING_FAILURE_STATUS, &err.to_string())
            }
            Err(DispatchError::UnknownHandler(id)) => {
                logger::log_error(&format!(
                    "Route for {} {} names unregistered handler '{id}'",
                    request.method().unwrap_or("-"),
                    request.path().unwrap_or("-"),
                ));
                self.internal_error(&format!("handler '{id}' is not registered"))
            }
            Err(DispatchError::Handler(err)) => {
                let id = self.resolve(request).unwrap_or("-");
                logger::log_handler_error(id, &err.to_string());
                self.internal_error(&err.to_string())
            }
        }
    }

    fn internal_error(&self, detail: &str) -> ResponseEnvelope {
        let message = if self.expose_errors {
            format!("{INTERNAL_ERROR_MESSAGE}: {detail}")
        } else {
            INTERNAL_ERROR_MESSAGE.to_string()
        };
        ResponseEnvelope::error(INTERNAL_ERROR_STATUS, &message)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic payload")
}

/// Assembles an [`Application`]; `build` validates handler references
#[derive(Debug, Default)]
pub struct ApplicationBuilder {
    routes: Option<RouteTable>,
    handlers: HandlerRegistry,
    expose_errors: bool,
}

impl ApplicationBuilder {
    #[must_use]
    pub fn routes(mut self, routes: RouteTable) -> Self {
        self.routes = Some(routes);
        self
    }

    #[must_use]
    pub fn handlers(mut self, handlers: HandlerRegistry) -> Self {
        self.handlers = handlers;
        self
    }

    /// Include raw handler error messages in 500 response bodies
    #[must_use]
    pub const fn expose_errors(mut self, expose: bool) -> Self {
        self.expose_errors = expose;
        self
    }

    pub fn build(self) -> Result<Application, ConfigError> {
        let app = self.build_unchecked()?;
        app.validate()?;
        Ok(app)
    }

    /// Build without checking handler references; unknown identifiers surface per request
    pub fn build_unchecked(self) -> Result<Application, ConfigError> {
        let routes = self.routes.ok_or(ConfigError::MissingRouteTable)?;
        Ok(Application {
            routes,
            handlers: self.handlers,
            expose_errors: self.expose_errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{HandlerResult, Responder};
    use crate::response::Render;
    use serde_json::{json, Value};

    struct HelloHandler;

    impl Responder for HelloHandler {
        fn render(&mut self) -> HandlerResult {
            Ok(Render::ok(json!({"message": "Hello, World!"})))
        }
    }

    fn registry() -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        registry
            .register("HelloHandler", |_: &Request| Box::new(HelloHandler))
            .unwrap();
        registry
            .register_fn("Broken", |_| Err("database password is hunter2".into()))
            .unwrap();
        registry
            .register_fn("Params", |req| Ok(Render::ok(Value::Object(req.params()))))
            .unwrap();
        registry
            .register_fn("Panics", |_| {
                let empty: Vec<u8> = Vec::new();
                let value = empty[3];
                Ok(Render::ok(json!({ "value": value })))
            })
            .unwrap();
        registry
            .register_fn("BadStatus", |_| Ok(Render::ok(json!({"a": 1})).status(1000)))
            .unwrap();
        registry
    }

    fn app(expose_errors: bool) -> Application {
        let routes = RouteTable::builder()
            .get("/hello", "HelloHandler")
            .get("/broken", "Broken")
            .post("/params", "Params")
            .get("/panics", "Panics")
            .get("/bad-status", "BadStatus")
            .build()
            .unwrap();
        Application::builder()
            .routes(routes)
            .handlers(registry())
            .expose_errors(expose_errors)
            .build()
            .unwrap()
    }

    fn request(method: &str, path: &str) -> Request {
        Request::builder().method(method).path(path).build().unwrap()
    }

    #[test]
    fn test_hello_end_to_end() {
        let envelope = app(false).handle(&request("GET", "/hello"));
        assert_eq!(envelope.status_code(), 200);
        assert_eq!(
            envelope.to_json(),
            r#"{"status_code":200,"success":true,"message":"Hello, World!"}"#
        );
        assert_eq!(
            envelope.headers().get("content-type").unwrap(),
            "application/json"
        );
    }

    #[test]
    fn test_unknown_path_is_404() {
        let envelope = app(false).handle(&request("GET", "/missing"));
        assert_eq!(envelope.status_code(), 404);
        assert_eq!(envelope.body().get("success"), Some(&json!(false)));
        let error = envelope.body().get("error").unwrap().as_str().unwrap();
        assert!(error.contains("no route found"));
    }

    #[test]
    fn test_wrong_method_is_404_with_allowed_methods() {
        let envelope = app(false).handle(&request("DELETE", "/hello"));
        assert_eq!(envelope.status_code(), ROUTING_FAILURE_STATUS);
        let error = envelope.body().get("error").unwrap().as_str().unwrap();
        assert!(error.contains("method not allowed"));
        assert!(error.contains("GET"));
    }

    #[test]
    fn test_invalid_request_is_404() {
        let envelope = app(false).handle(&Request::builder().build().unwrap());
        assert_eq!(envelope.status_code(), 404);
    }

    #[test]
    fn test_handler_error_hidden_by_default() {
        let envelope = app(false).handle(&request("GET", "/broken"));
        assert_eq!(envelope.status_code(), 500);
        assert_eq!(
            envelope.body().get("error"),
            Some(&json!("Internal Server Error"))
        );
    }

    #[test]
    fn test_handler_error_exposed_when_enabled() {
        let envelope = app(true).handle(&request("GET", "/broken"));
        assert_eq!(envelope.status_code(), 500);
        assert_eq!(
            envelope.body().get("error"),
            Some(&json!("Internal Server Error: database password is hunter2"))
        );
    }

    #[test]
    fn test_dispatch_reports_handler_error() {
        let result = app(false).dispatch(&request("GET", "/broken"));
        assert!(matches!(result, Err(DispatchError::Handler(_))));
    }

    #[test]
    fn test_panicking_handler_is_500() {
        let envelope = app(false).handle(&request("GET", "/panics"));
        assert_eq!(
            envelope.to_json(),
            r#"{"status_code":500,"success":false,"error":"Internal Server Error"}"#
        );

        let envelope = app(true).handle(&request("GET", "/panics"));
        let error = envelope.body().get("error").unwrap().as_str().unwrap();
        assert!(error.starts_with("Internal Server Error: handler panicked: index out of bounds"));
    }

    #[test]
    fn test_invalid_status_replaces_whole_envelope() {
        let envelope = app(false).handle(&request("GET", "/bad-status"));
        assert_eq!(envelope.status_code(), 500);
        assert_eq!(
            envelope.to_json(),
            r#"{"status_code":500,"success":false,"error":"Internal Server Error"}"#
        );
        assert!(matches!(
            app(false).dispatch(&request("GET", "/bad-status")),
            Err(DispatchError::Handler(_))
        ));
    }

    #[test]
    fn test_params_reach_handler() {
        let req = Request::builder()
            .method("POST")
            .path("/params")
            .query("a=1")
            .content_type("application/json")
            .body(r#"{"a": 2, "b": true}"#)
            .build()
            .unwrap();
        let envelope = app(false).handle(&req);
        assert_eq!(envelope.body().get("a"), Some(&json!(2)));
        assert_eq!(envelope.body().get("b"), Some(&json!(true)));
    }

    #[test]
    fn test_missing_route_table() {
        let result = Application::builder().handlers(registry()).build();
        assert!(matches!(result, Err(ConfigError::MissingRouteTable)));
    }

    #[test]
    fn test_build_rejects_unregistered_handler() {
        let routes = RouteTable::builder().get("/ghost", "Ghost").build().unwrap();
        let result = Application::builder().routes(routes).build();
        assert!(matches!(
            result,
            Err(ConfigError::UnknownHandler { ref handler, .. }) if handler == "Ghost"
        ));
    }

    #[test]
    fn test_unchecked_unknown_handler_is_500() {
        let routes = RouteTable::builder().get("/ghost", "Ghost").build().unwrap();
        let app = Application::builder()
            .routes(routes)
            .build_unchecked()
            .unwrap();
        assert!(matches!(
            app.dispatch(&request("GET", "/ghost")),
            Err(DispatchError::UnknownHandler(ref id)) if id == "Ghost"
        ));
        assert_eq!(app.handle(&request("GET", "/ghost")).status_code(), 500);
    }
}
