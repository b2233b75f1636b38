// Demo handlers served by the binary

use jsonroute::error::ConfigError;
use jsonroute::{HandlerRegistry, HandlerResult, Render, Request, Responder, RouteTable};
use serde_json::{json, Value};

/// Greets the caller, optionally by `?name=`
struct HelloHandler {
    name: Option<String>,
}

impl Responder for HelloHandler {
    fn render(&mut self) -> HandlerResult {
        let message = match &self.name {
            Some(name) => format!("Hello, {name}!"),
            None => "Hello, World!".to_string(),
        };
        Ok(Render::ok(json!({ "message": message })))
    }
}

fn health(_: &Request) -> HandlerResult {
    Ok(Render::ok(json!({ "status": "ok" })))
}

/// Reflects the merged query/body parameters
fn echo(request: &Request) -> HandlerResult {
    Ok(Render::ok(json!({ "params": Value::Object(request.params()) })))
}

pub fn handlers() -> Result<HandlerRegistry, ConfigError> {
    let mut registry = HandlerRegistry::new();
    registry.register("hello", |request| {
        Box::new(HelloHandler {
            name: request.query_param("name").map(ToString::to_string),
        })
    })?;
    registry.register_fn("health", health)?;
    registry.register_fn("echo", echo)?;
    Ok(registry)
}

/// Routes used when the configuration declares none
pub fn routes() -> Result<RouteTable, ConfigError> {
    RouteTable::builder()
        .get("/hello", "hello")
        .get("/health", "health")
        .post("/echo", "echo")
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonroute::Application;

    fn app() -> Application {
        Application::builder()
            .routes(routes().unwrap())
            .handlers(handlers().unwrap())
            .build()
            .unwrap()
    }

    #[test]
    fn test_hello_world() {
        let request = Request::builder().method("GET").path("/hello").build().unwrap();
        assert_eq!(
            app().handle(&request).to_json(),
            r#"{"status_code":200,"success":true,"message":"Hello, World!"}"#
        );
    }

    #[test]
    fn test_hello_by_name() {
        let request = Request::builder()
            .method("GET")
            .path("/hello")
            .query("name=Ada")
            .build()
            .unwrap();
        assert_eq!(app().handle(&request).body()["message"], "Hello, Ada!");
    }

    #[test]
    fn test_echo_merges_body_over_query() {
        let request = Request::builder()
            .method("POST")
            .path("/echo")
            .query("a=1&b=2")
            .content_type("application/json")
            .body(r#"{"a": 10}"#)
            .build()
            .unwrap();
        let envelope = app().handle(&request);
        assert_eq!(envelope.body()["params"], json!({"a": 10, "b": "2"}));
    }
}
