// Handler output module
// A handler's partial response plus convenience constructors for common statuses

use crate::logger;
use hyper::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};

/// What a handler hands back; omitted fields take the envelope defaults
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Render {
    pub status_code: Option<u16>,
    pub headers: Option<HeaderMap>,
    pub body: Option<Map<String, Value>>,
}

impl Render {
    pub fn new() -> Self {
        Self::default()
    }

    /// 200 with the given body
    pub fn ok(body: impl Into<Value>) -> Self {
        Self::with_body(200, body.into())
    }

    /// 201 with the given body
    pub fn created(body: impl Into<Value>) -> Self {
        Self::with_body(201, body.into())
    }

    /// 204 with an empty body
    pub fn no_content() -> Self {
        Self::with_body(204, Value::Null)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::error(400, message)
    }

    pub fn unauthorized(message: &str) -> Self {
        Self::error(401, message)
    }

    pub fn forbidden(message: &str) -> Self {
        Self::error(403, message)
    }

    pub fn not_found(message: &str) -> Self {
        Self::error(404, message)
    }

    pub fn unprocessable(message: &str) -> Self {
        Self::error(422, message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::error(500, message)
    }

    /// Canonical error shape: `{"error": message}`
    pub fn error(status_code: u16, message: &str) -> Self {
        let mut body = Map::new();
        body.insert("error".to_string(), Value::String(message.to_string()));
        Self {
            status_code: Some(status_code),
            headers: None,
            body: Some(body),
        }
    }

    #[must_use]
    pub const fn status(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Add a response header; invalid names or values are logged and skipped
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers
                    .get_or_insert_with(HeaderMap::new)
                    .insert(name, value);
            }
            _ => logger::log_warning(&format!("Ignoring invalid response header '{name}'")),
        }
        self
    }

    fn with_body(status_code: u16, body: Value) -> Self {
        Self {
            status_code: Some(status_code),
            headers: None,
            body: Some(into_body_map(body)),
        }
    }
}

/// Objects are used as-is, `null` becomes `{}`, anything else is wrapped as `{"data": value}`
fn into_body_map(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    }
}
