// Connection handling module
// Accepts a single TCP connection and serves it with hyper

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config;
use crate::handler;
use crate::logger;

/// Accept and process a connection, checking limits and logging.
///
/// # Arguments
///
/// * `stream` - The TCP stream to handle
/// * `peer_addr` - The peer's socket address
/// * `state` - Shared application state
/// * `conn_counter` - Active connection counter
pub fn accept_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: &Arc<config::AppState>,
    conn_counter: &Arc<AtomicUsize>,
) {
    // Increment counter first, then check limit (prevents race condition)
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            // Exceeded limit: rollback counter and reject
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. Connection rejected."
            ));
            drop(stream);
            return;
        }
    }

    logger::log_connection_accepted(&peer_addr);

    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(conn_counter));
}

/// Handle a single connection in a spawned task.
///
/// This function:
/// 1. Wraps the TCP stream in `TokioIo`
/// 2. Configures HTTP/1.1 keep-alive and the request head read timeout
/// 3. Serves the connection with the request handler
/// 4. Closes the connection gracefully once it sits idle for `keep_alive_timeout`
/// 5. Decrements connection counter when done
///
/// Must run inside a `tokio::task::LocalSet`.
fn handle_connection(
    stream: tokio::net::TcpStream,
    peer_addr: std::net::SocketAddr,
    state: Arc<config::AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::task::spawn_local(async move {
        let io = TokioIo::new(stream);

        let performance = &state.config.performance;
        let keep_alive = performance.keep_alive_timeout > 0;
        let idle_timeout = Duration::from_secs(performance.keep_alive_timeout);

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(Duration::from_secs(performance.read_timeout))
            .keep_alive(keep_alive);

        // Touched when a request arrives and when its response is ready
        let last_activity = Rc::new(Cell::new(Instant::now()));
        let activity = Rc::clone(&last_activity);
        let service_state = Arc::clone(&state);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let activity = Rc::clone(&activity);
                let state = Arc::clone(&service_state);
                activity.set(Instant::now());
                async move {
                    let response = handler::handle_request(req, peer_addr, state).await;
                    activity.set(Instant::now());
                    response
                }
            }),
        );
        tokio::pin!(conn);

        let mut closing = false;
        let result = loop {
            let idle_deadline = last_activity.get() + idle_timeout;
            tokio::select! {
                result = conn.as_mut() => break result,
                () = tokio::time::sleep_until(idle_deadline), if keep_alive && !closing => {
                    // A request may have come in while the sleep was pending
                    if last_activity.get() + idle_timeout <= Instant::now() {
                        conn.as_mut().graceful_shutdown();
                        closing = true;
                    }
                }
            }
        };

        match result {
            Ok(()) => {}
            Err(err) if err.is_timeout() => {
                logger::log_warning(&format!(
                    "Request head from {peer_addr} not received within {} seconds",
                    performance.read_timeout
                ));
            }
            Err(err) => logger::log_connection_error(&err),
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
