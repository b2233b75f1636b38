// Response envelope module
// Normalizes handler output into status, headers and the flat JSON wire body

use super::render::Render;
use hyper::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::{Map, Value};

pub const DEFAULT_STATUS: u16 = 200;
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";

/// Whether a status code counts as success (2xx)
pub const fn is_success(status_code: u16) -> bool {
    matches!(status_code, 200..=299)
}

/// Whether a status code can be sent on the wire (three digits, 100-999)
pub const fn is_valid_status(status_code: u16) -> bool {
    matches!(status_code, 100..=999)
}

/// Merge the handler body with `status_code` and `success`
///
/// Handler keys are kept, except `status_code` and `success` which are always
/// recomputed from `status_code`. Envelope keys come first in the output.
pub fn compute_body(status_code: u16, body: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = Map::with_capacity(body.len() + 2);
    merged.insert("status_code".to_string(), Value::from(status_code));
    merged.insert("success".to_string(), Value::Bool(is_success(status_code)));
    for (key, value) in body {
        if key != "status_code" && key != "success" {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}

/// Final response for one request
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    status_code: u16,
    headers: HeaderMap,
    body: Map<String, Value>,
}

impl ResponseEnvelope {
    pub fn from_render(render: Render) -> Self {
        let status_code = render.status_code.unwrap_or(DEFAULT_STATUS);

        let mut headers = render.headers.unwrap_or_default();
        if !headers.contains_key(CONTENT_TYPE) {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(DEFAULT_CONTENT_TYPE));
        }

        let body = compute_body(status_code, &render.body.unwrap_or_default());

        Self {
            status_code,
            headers,
            body,
        }
    }

    /// Envelope with the canonical `{"error": message}` body
    pub fn error(status_code: u16, message: &str) -> Self {
        Self::from_render(Render::error(status_code, message))
    }

    pub const fn status_code(&self) -> u16 {
        self.status_code
    }

    pub const fn success(&self) -> bool {
        is_success(self.status_code)
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub const fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Serialized wire body
    pub fn to_json(&self) -> String {
        Value::Object(self.body.clone()).to_string()
    }

    pub fn into_parts(self) -> (u16, HeaderMap, Map<String, Value>) {
        (self.status_code, self.headers, self.body)
    }
}

impl From<Render> for ResponseEnvelope {
    fn from(render: Render) -> Self {
        Self::from_render(render)
    }
}
