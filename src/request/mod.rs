//! Request value module
//!
//! An immutable snapshot of one inbound request. Adapters build it once through
//! [`RequestBuilder`]; afterwards every accessor is a pure read of the stored fields.

mod params;

pub use params::{extract_params, Params};

use crate::error::RequestError;
use hyper::body::Bytes;
use hyper::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde_json::Value;
use std::collections::HashMap;

/// Content type that enables JSON body parsing (matched case-insensitively)
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Normalized inbound request
#[derive(Debug, Clone)]
pub struct Request {
    method: Option<String>,
    path: Option<String>,
    query_string: String,
    query: HashMap<String, String>,
    headers: HeaderMap,
    content_type: Option<String>,
    body: Bytes,
}

impl Request {
    pub fn builder() -> RequestBuilder {
        RequestBuilder::default()
    }

    /// Uppercase HTTP verb, `None` if the adapter could not supply one
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    /// Exact request path, not decoded or trimmed
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    pub const fn query(&self) -> &HashMap<String, String> {
        &self.query
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value by case-insensitive name; non-visible-ASCII values read as absent
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn is_get(&self) -> bool {
        self.method_is("GET")
    }

    pub fn is_post(&self) -> bool {
        self.method_is("POST")
    }

    pub fn is_put(&self) -> bool {
        self.method_is("PUT")
    }

    pub fn is_patch(&self) -> bool {
        self.method_is("PATCH")
    }

    pub fn is_delete(&self) -> bool {
        self.method_is("DELETE")
    }

    pub fn is_head(&self) -> bool {
        self.method_is("HEAD")
    }

    pub fn is_options(&self) -> bool {
        self.method_is("OPTIONS")
    }

    /// Whether the Content-Type announces JSON
    pub fn has_json_body(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains(JSON_CONTENT_TYPE))
    }

    /// Parsed JSON body, `None` for non-JSON content types or malformed input
    pub fn json_body(&self) -> Option<Value> {
        if !self.has_json_body() {
            return None;
        }
        serde_json::from_slice(&self.body).ok()
    }

    /// Handler parameters: query string, plus the JSON body for body-bearing methods
    pub fn params(&self) -> Params {
        extract_params(self)
    }

    fn method_is(&self, verb: &str) -> bool {
        self.method.as_deref() == Some(verb)
    }
}

/// Builder used by adapters and tests to assemble a [`Request`]
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<String>,
    path: Option<String>,
    query_string: Option<String>,
    headers: Vec<(String, String)>,
    header_map: Option<HeaderMap>,
    body: Bytes,
}

impl RequestBuilder {
    #[must_use]
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Raw query string, without the leading `?`
    #[must_use]
    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query_string = Some(query.into());
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Start from an already-validated header map (individual `header` calls are applied on top)
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.header_map = Some(headers);
        self
    }

    #[must_use]
    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.header(CONTENT_TYPE.as_str(), content_type)
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn build(self) -> Result<Request, RequestError> {
        let mut headers = self.header_map.unwrap_or_default();
        for (name, value) in self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| RequestError::InvalidHeaderName(name.clone()))?;
            let header_value = HeaderValue::from_str(&value)
                .map_err(|_| RequestError::InvalidHeaderValue(name.clone()))?;
            headers.insert(header_name, header_value);
        }

        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        let query_string = self.query_string.unwrap_or_default();
        let query = parse_query(&query_string);

        Ok(Request {
            method: self.method.map(|m| m.to_ascii_uppercase()),
            path: self.path,
            query_string,
            query,
            headers,
            content_type,
            body: self.body,
        })
    }
}

/// Parse and percent-decode a query string; on repeated keys the last value wins
pub fn parse_query(raw: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(raw.as_bytes())
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}
