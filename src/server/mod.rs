//! Server module
//!
//! hyper/tokio transport used by the hyper adapter: listener setup, the accept
//! loop, per-connection serving and signal-driven shutdown.

mod connection;
mod listener;
mod service;
pub mod signal;

pub use listener::create_reusable_listener;
pub use service::{into_request, into_response};

use crate::app::Application;
use crate::config::Config;
use crate::logger;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;

/// Transport settings derived from configuration
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub keep_alive: bool,
    /// Upper bound on the lifetime of one connection
    pub connection_timeout: Duration,
    pub max_connections: Option<u64>,
    pub max_body_size: u64,
    pub server_name: String,
    pub access_log: bool,
    pub access_log_format: String,
}

impl ServerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            keep_alive: config.performance.keep_alive_timeout > 0,
            connection_timeout: Duration::from_secs(std::cmp::max(
                config.performance.read_timeout,
                config.performance.write_timeout,
            )),
            max_connections: config.performance.max_connections,
            max_body_size: config.http.max_body_size,
            server_name: config.http.server_name.clone(),
            access_log: config.logging.access_log,
            access_log_format: config.logging.access_log_format.clone(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            keep_alive: true,
            connection_timeout: Duration::from_secs(30),
            max_connections: None,
            max_body_size: 10_485_760,
            server_name: "jsonroute".to_string(),
            access_log: true,
            access_log_format: "combined".to_string(),
        }
    }
}

/// Accept connections until `shutdown` is notified
///
/// A permit stored with `notify_one` before the call stops the loop on its first
/// iteration. In-flight connections keep running in their own tasks after the
/// loop returns.
pub async fn run(
    listener: TcpListener,
    app: Arc<Application>,
    settings: Arc<ServerSettings>,
    shutdown: Arc<Notify>,
) -> std::io::Result<()> {
    let active_connections = Arc::new(AtomicUsize::new(0));

    let shutdown_signal = shutdown.notified();
    tokio::pin!(shutdown_signal);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        connection::accept_connection(
                            stream,
                            peer_addr,
                            &app,
                            &settings,
                            &active_connections,
                        );
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }

            () = &mut shutdown_signal => {
                logger::log_shutdown();
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerRegistry;
    use crate::response::Render;
    use crate::routing::RouteTable;
    use serde_json::{json, Value};
    use std::net::SocketAddr;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::task::JoinHandle;

    fn app() -> Arc<Application> {
        let routes = RouteTable::builder()
            .get("/hello", "hello")
            .post("/echo", "echo")
            .get("/boom", "boom")
            .build()
            .unwrap();
        let mut handlers = HandlerRegistry::new();
        handlers
            .register_fn("hello", |_| Ok(Render::ok(json!({"message": "Hello, World!"}))))
            .unwrap();
        handlers
            .register_fn("echo", |req| Ok(Render::ok(Value::Object(req.params()))))
            .unwrap();
        handlers
            .register_fn("boom", |_| {
                let empty: Vec<u8> = Vec::new();
                Ok(Render::ok(json!({ "value": empty[3] })))
            })
            .unwrap();
        Arc::new(
            Application::builder()
                .routes(routes)
                .handlers(handlers)
                .build()
                .unwrap(),
        )
    }

    type Running = (SocketAddr, Arc<Notify>, JoinHandle<std::io::Result<()>>);

    fn start(settings: ServerSettings) -> Running {
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(run(
            listener,
            app(),
            Arc::new(settings),
            Arc::clone(&shutdown),
        ));
        (addr, shutdown, handle)
    }

    async fn send(addr: SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(raw.as_bytes()).await.unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn body_of(response: &str) -> Value {
        let (_, body) = response.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[tokio::test]
    async fn test_serves_hello_over_tcp() {
        let (addr, shutdown, handle) = start(ServerSettings::default());

        let response = send(
            addr,
            "GET /hello HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.to_ascii_lowercase().contains("content-type: application/json"));
        assert_eq!(
            body_of(&response),
            json!({"status_code": 200, "success": true, "message": "Hello, World!"})
        );

        shutdown.notify_waiters();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_unknown_route_is_404_envelope() {
        let (addr, shutdown, handle) = start(ServerSettings::default());

        let response = send(
            addr,
            "DELETE /hello HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 404 Not Found"));
        let body = body_of(&response);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("GET"));

        shutdown.notify_waiters();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_post_json_params() {
        let (addr, shutdown, handle) = start(ServerSettings::default());

        let payload = r#"{"a": 2}"#;
        let raw = format!(
            "POST /echo?a=1&b=x HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
            payload.len()
        );
        let body = body_of(&send(addr, &raw).await);
        assert_eq!(body["a"], 2);
        assert_eq!(body["b"], "x");

        shutdown.notify_waiters();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_panicking_handler_answers_500() {
        let (addr, shutdown, handle) = start(ServerSettings::default());

        let response = send(
            addr,
            "GET /boom HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await;
        assert!(response.starts_with("HTTP/1.1 500"));
        assert_eq!(
            body_of(&response),
            json!({"status_code": 500, "success": false, "error": "Internal Server Error"})
        );

        shutdown.notify_waiters();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_requested_before_run_is_kept() {
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let shutdown = Arc::new(Notify::new());
        shutdown.notify_one();

        let settings = Arc::new(ServerSettings::default());
        tokio::time::timeout(Duration::from_secs(5), run(listener, app(), settings, shutdown))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let settings = ServerSettings {
            max_body_size: 4,
            ..ServerSettings::default()
        };
        let (addr, shutdown, handle) = start(settings);

        let raw = "POST /echo HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: 10\r\nConnection: close\r\n\r\n{\"a\": 123}";
        let response = send(addr, raw).await;
        assert!(response.starts_with("HTTP/1.1 413"));
        assert_eq!(body_of(&response)["status_code"], 413);

        shutdown.notify_waiters();
        handle.await.unwrap().unwrap();
    }
}
