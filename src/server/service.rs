//! Request service module
//!
//! Per-request glue between hyper and the application: collect the body under a
//! size limit, build the request value, dispatch, serialize the envelope.

use super::ServerSettings;
use crate::app::Application;
use crate::logger::{self, AccessLogEntry};
use crate::request::Request;
use crate::response::ResponseEnvelope;
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body as _, Bytes, Incoming};
use hyper::header::{HeaderName, HeaderValue, CONTENT_LENGTH, REFERER, SERVER, USER_AGENT};
use hyper::{Method, Response, StatusCode, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// hyper service entry point for one request
pub async fn handle_request(
    req: hyper::Request<Incoming>,
    app: Arc<Application>,
    settings: Arc<ServerSettings>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let started = Instant::now();
    let is_head = req.method() == Method::HEAD;

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = version_label(req.version()).to_string();
    entry.referer = header_text(&req, REFERER);
    entry.user_agent = header_text(&req, USER_AGENT);

    let envelope = match into_request(req, settings.max_body_size).await {
        Ok(request) => {
            entry.handler = app.resolve(&request).ok().map(ToString::to_string);
            app.handle(&request)
        }
        Err(envelope) => envelope,
    };

    let body = envelope.to_json();
    let response = into_response(envelope, body, is_head, &settings.server_name);

    if settings.access_log {
        entry.status = response.status().as_u16();
        entry.body_bytes = response
            .body()
            .size_hint()
            .exact()
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0);
        entry.request_time_us =
            u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(&entry, &settings.access_log_format);
    }

    Ok(response)
}

/// Build the request value, or the envelope to answer with when the body is unusable
pub async fn into_request(
    req: hyper::Request<Incoming>,
    max_body_size: u64,
) -> Result<Request, ResponseEnvelope> {
    if let Some(resp) = check_body_size(&req, max_body_size) {
        return Err(resp);
    }

    let (parts, body) = req.into_parts();
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let bytes = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            if e.is::<http_body_util::LengthLimitError>() {
                logger::log_warning(&format!("Request body exceeded {max_body_size} bytes"));
                return Err(payload_too_large());
            }
            logger::log_warning(&format!("Failed to read request body: {e}"));
            return Err(ResponseEnvelope::error(400, "Failed to read request body"));
        }
    };

    Request::builder()
        .method(parts.method.as_str())
        .path(parts.uri.path())
        .query(parts.uri.query().unwrap_or_default())
        .headers(parts.headers)
        .body(bytes)
        .build()
        .map_err(|e| ResponseEnvelope::error(400, &e.to_string()))
}

/// Reject early when Content-Length announces more than the limit
fn check_body_size(
    req: &hyper::Request<Incoming>,
    max_body_size: u64,
) -> Option<ResponseEnvelope> {
    let content_length = req.headers().get(CONTENT_LENGTH)?;
    let size = content_length.to_str().ok()?.parse::<u64>().ok()?;
    if size > max_body_size {
        logger::log_warning(&format!(
            "Request body too large: {size} bytes (max: {max_body_size})"
        ));
        return Some(payload_too_large());
    }
    None
}

fn payload_too_large() -> ResponseEnvelope {
    ResponseEnvelope::error(413, "Payload Too Large")
}

/// Serialize an envelope into a hyper response
///
/// 204/304 responses and HEAD requests carry no body. An envelope whose status
/// cannot be sent is replaced by the internal-error envelope.
pub fn into_response(
    envelope: ResponseEnvelope,
    body: String,
    is_head: bool,
    server_name: &str,
) -> Response<Full<Bytes>> {
    let Ok(status) = StatusCode::from_u16(envelope.status_code()) else {
        logger::log_error(&format!(
            "Envelope carries invalid status code {}",
            envelope.status_code()
        ));
        let fallback = ResponseEnvelope::error(500, "Internal Server Error");
        let body = fallback.to_json();
        return into_response(fallback, body, is_head, server_name);
    };
    let (_, headers, _) = envelope.into_parts();

    let bodiless = status == StatusCode::NO_CONTENT || status == StatusCode::NOT_MODIFIED;
    let body = if is_head || bodiless {
        Bytes::new()
    } else {
        Bytes::from(body)
    };

    let mut builder = Response::builder().status(status);
    if let Some(response_headers) = builder.headers_mut() {
        response_headers.extend(headers);
        if let Ok(value) = HeaderValue::from_str(server_name) {
            response_headers.insert(SERVER, value);
        }
    }

    builder.body(Full::new(body)).unwrap_or_else(|e| {
        logger::log_error(&format!("Failed to build response: {e}"));
        let mut fallback = Response::new(Full::new(Bytes::from(
            r#"{"status_code":500,"success":false,"error":"Internal Server Error"}"#,
        )));
        *fallback.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        fallback
    })
}

fn header_text(req: &hyper::Request<Incoming>, name: HeaderName) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(ToString::to_string)
}

fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}
