//! Handler registry module
//!
//! Maps symbolic handler identifiers (the strings stored in the route table) to
//! factories that build a fresh handler for each request.

use super::{HandlerResult, Responder};
use crate::error::{ConfigError, DispatchError};
use crate::request::Request;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds one handler instance for one request
pub type HandlerFactory = Arc<dyn Fn(&Request) -> Box<dyn Responder> + Send + Sync>;

/// Identifier -> factory table, populated during setup
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    factories: HashMap<String, HandlerFactory>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `id`. Registering the same id twice is an error.
    pub fn register<F>(&mut self, id: &str, factory: F) -> Result<(), ConfigError>
    where
        F: Fn(&Request) -> Box<dyn Responder> + Send + Sync + 'static,
    {
        if self.factories.contains_key(id) {
            return Err(ConfigError::DuplicateHandler(id.to_string()));
        }
        self.factories.insert(id.to_string(), Arc::new(factory));
        Ok(())
    }

    /// Register a plain function as a handler
    pub fn register_fn<F>(&mut self, id: &str, handler: F) -> Result<(), ConfigError>
    where
        F: Fn(&Request) -> HandlerResult + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        self.register(id, move |request| {
            Box::new(FnResponder {
                handler: Arc::clone(&handler),
                request: request.clone(),
            })
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Build the handler registered under `id`
    pub fn instantiate(&self, id: &str, request: &Request) -> Result<Box<dyn Responder>, DispatchError> {
        self.factories
            .get(id)
            .map(|factory| factory(request))
            .ok_or_else(|| DispatchError::UnknownHandler(id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.ids().collect();
        ids.sort_unstable();
        f.debug_struct("HandlerRegistry").field("handlers", &ids).finish()
    }
}

/// Adapts a function into a per-request responder
struct FnResponder<F> {
    handler: Arc<F>,
    request: Request,
}

impl<F> Responder for FnResponder<F>
where
    F: Fn(&Request) -> HandlerResult,
{
    fn render(&mut self) -> HandlerResult {
        (self.handler)(&self.request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::Render;
    use serde_json::json;

    struct Greeter {
        name: String,
    }

    impl Responder for Greeter {
        fn render(&mut self) -> HandlerResult {
            Ok(Render::ok(json!({ "greeting": format!("hi {}", self.name) })))
        }
    }

    fn request() -> Request {
        Request::builder()
            .method("GET")
            .path("/greet")
            .query("name=ada")
            .build()
            .unwrap()
    }

    #[test]
    fn test_instantiate_builds_from_request() {
        let mut registry = HandlerRegistry::new();
        registry
            .register("Greeter", |req: &Request| {
                Box::new(Greeter {
                    name: req.query_param("name").unwrap_or("nobody").to_string(),
                })
            })
            .unwrap();

        let mut handler = registry.instantiate("Greeter", &request()).unwrap();
        let render = handler.render().unwrap();
        assert_eq!(
            render.body.map(serde_json::Value::Object),
            Some(json!({"greeting": "hi ada"}))
        );
    }

    #[test]
    fn test_unknown_handler() {
        let registry = HandlerRegistry::new();
        let result = registry.instantiate("Missing", &request());
        assert!(matches!(result, Err(DispatchError::UnknownHandler(id)) if id == "Missing"));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = HandlerRegistry::new();
        registry.register_fn("a", |_| Ok(Render::new())).unwrap();
        let err = registry.register_fn("a", |_| Ok(Render::new())).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateHandler(id) if id == "a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_fn_sees_request() {
        let mut registry = HandlerRegistry::new();
        registry
            .register_fn("path", |req| Ok(Render::ok(json!({ "path": req.path() }))))
            .unwrap();
        assert!(registry.contains("path"));
        let render = registry
            .instantiate("path", &request())
            .unwrap()
            .render()
            .unwrap();
        assert_eq!(render.body.unwrap().get("path"), Some(&json!("/greet")));
    }
}
