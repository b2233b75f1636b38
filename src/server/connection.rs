// Connection handling module
// Accepts TCP connections and serves them over HTTP/1.1

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::service::handle_request;
use super::ServerSettings;
use crate::app::Application;
use crate::logger;

/// Accept a connection, enforcing the connection limit, and serve it in a task
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    app: &Arc<Application>,
    settings: &Arc<ServerSettings>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = settings.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    if let Err(e) = stream.set_nodelay(true) {
        logger::log_warning(&format!("Failed to set TCP_NODELAY for {peer_addr}: {e}"));
    }
    logger::log_connection_accepted(&peer_addr);

    handle_connection(
        stream,
        peer_addr,
        Arc::clone(app),
        Arc::clone(settings),
        Arc::clone(conn_counter),
    );
}

/// Serve one connection until it closes or the timeout elapses
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: SocketAddr,
    app: Arc<Application>,
    settings: Arc<ServerSettings>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let timeout_duration = settings.connection_timeout;

        let mut builder = http1::Builder::new();
        builder.keep_alive(settings.keep_alive);

        let service_settings = Arc::clone(&settings);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                handle_request(
                    req,
                    Arc::clone(&app),
                    Arc::clone(&service_settings),
                    peer_addr,
                )
            }),
        );

        match tokio::time::timeout(timeout_duration, conn).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => logger::log_connection_error(&err),
            Err(_) => {
                logger::log_warning(&format!(
                    "Connection from {peer_addr} timed out after {} seconds",
                    timeout_duration.as_secs()
                ));
            }
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
