// Server loop module
// Accepts connections until a shutdown is requested

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use super::connection::accept_connection;
use crate::config;
use crate::logger;

/// Run the accept loop on `listener` until `shutdown` is notified.
///
/// Connections are served on the current `LocalSet`; in-flight connections
/// are left to finish on their own when the loop returns.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<config::AppState>,
    active_connections: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => {
                        logger::log_error(&format!("Failed to accept connection: {e}"));
                    }
                }
            }

            () = shutdown.notified() => {
                logger::log_shutdown();
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::logger::writer::{LogTarget, LogWriter};
    use crate::server::create_reusable_listener;
    use std::net::SocketAddr;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;
    use tokio::time::timeout;

    const NO_STORE_REQUEST: &str = "GET /no-store HTTP/1.1\r\nHost: localhost\r\n\r\n";

    /// Read one `/no-store` response off a kept-alive connection
    async fn read_no_store_response(stream: &mut TcpStream) -> String {
        let mut response = Vec::new();
        let mut buf = [0u8; 1024];
        while !response.ends_with(b"no store page") {
            let n = timeout(Duration::from_secs(5), stream.read(&mut buf))
                .await
                .expect("response timed out")
                .unwrap();
            assert!(n > 0, "connection closed mid-response");
            response.extend_from_slice(&buf[..n]);
        }
        String::from_utf8(response).unwrap().to_ascii_lowercase()
    }

    fn serve_state(keep_alive_timeout: u64, read_timeout: u64) -> Arc<config::AppState> {
        let mut config = Config::load_from("definitely-missing-config-file").unwrap();
        config.performance.keep_alive_timeout = keep_alive_timeout;
        config.performance.read_timeout = read_timeout;
        let log_writer = Arc::new(LogWriter::with_targets(LogTarget::Stdout, LogTarget::Stderr));
        Arc::new(config::AppState::new(config, log_writer))
    }

    async fn raw_request(addr: SocketAddr, request: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(request.as_bytes()).await.unwrap();
        let mut response = Vec::new();
        stream.read_to_end(&mut response).await.unwrap();
        String::from_utf8(response).unwrap().to_ascii_lowercase()
    }

    #[tokio::test]
    async fn test_serves_pages_over_tcp_and_shuts_down() {
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let config = Config::load_from("definitely-missing-config-file").unwrap();
        let log_writer = Arc::new(LogWriter::with_targets(LogTarget::Stdout, LogTarget::Stderr));
        let state = Arc::new(config::AppState::new(config, log_writer));
        let counter = Arc::new(AtomicUsize::new(0));
        let shutdown = Arc::new(Notify::new());

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let server = tokio::task::spawn_local(start_server_loop(
                    listener,
                    state,
                    Arc::clone(&counter),
                    Arc::clone(&shutdown),
                ));

                let response = raw_request(
                    addr,
                    "GET /no-cache HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
                )
                .await;
                assert!(response.starts_with("http/1.1 200 ok\r\n"), "{response}");
                assert!(response.contains("cache-control: no-cache\r\n"));
                assert!(response.contains("etag: 00bc63c3a47875d37eb7004340988ca4\r\n"));
                assert!(response.ends_with("\r\n\r\nno cache page"));

                let response = raw_request(
                    addr,
                    "GET /no-cache HTTP/1.1\r\nHost: localhost\r\nIf-None-Match: 00bc63c3a47875d37eb7004340988ca4\r\nConnection: close\r\n\r\n",
                )
                .await;
                assert!(response.starts_with("http/1.1 304 not modified\r\n"), "{response}");
                assert!(!response.contains("etag:"));
                assert!(!response.contains("cache-control:"));
                assert!(response.ends_with("\r\n\r\n"));

                let response = raw_request(
                    addr,
                    "GET /unknown HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
                )
                .await;
                assert!(response.starts_with("http/1.1 404 not found\r\n"), "{response}");
                assert!(response.ends_with("page not found"));

                shutdown.notify_one();
                server.await.unwrap().unwrap();
            })
            .await;
    }

    #[tokio::test]
    async fn test_connection_limit_rejects_excess() {
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let mut config = Config::load_from("definitely-missing-config-file").unwrap();
        config.performance.max_connections = Some(0);
        let log_writer = Arc::new(LogWriter::with_targets(LogTarget::Stdout, LogTarget::Stderr));
        let state = Arc::new(config::AppState::new(config, log_writer));
        let counter = Arc::new(AtomicUsize::new(0));
        let shutdown = Arc::new(Notify::new());

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let server = tokio::task::spawn_local(start_server_loop(
                    listener,
                    state,
                    Arc::clone(&counter),
                    Arc::clone(&shutdown),
                ));

                // Rejected connections are closed without a response
                let mut stream = TcpStream::connect(addr).await.unwrap();
                let mut response = Vec::new();
                stream.read_to_end(&mut response).await.unwrap();
                assert!(response.is_empty());
                assert_eq!(counter.load(std::sync::atomic::Ordering::SeqCst), 0);

                shutdown.notify_one();
                server.await.unwrap().unwrap();
            })
            .await;
    }

    #[tokio::test]
    async fn test_busy_keep_alive_connection_outlives_read_timeout() {
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = serve_state(5, 1);
        let shutdown = Arc::new(Notify::new());

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let server = tokio::task::spawn_local(start_server_loop(
                    listener,
                    state,
                    Arc::new(AtomicUsize::new(0)),
                    Arc::clone(&shutdown),
                ));

                // Six requests 300ms apart span well past the 1s read timeout
                let mut stream = TcpStream::connect(addr).await.unwrap();
                for _ in 0..6 {
                    stream.write_all(NO_STORE_REQUEST.as_bytes()).await.unwrap();
                    let response = read_no_store_response(&mut stream).await;
                    assert!(response.starts_with("http/1.1 200 ok\r\n"), "{response}");
                    tokio::time::sleep(Duration::from_millis(300)).await;
                }

                shutdown.notify_one();
                server.await.unwrap().unwrap();
            })
            .await;
    }

    #[tokio::test]
    async fn test_idle_keep_alive_connection_is_closed() {
        let listener = create_reusable_listener("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let state = serve_state(1, 30);
        let shutdown = Arc::new(Notify::new());

        let local = tokio::task::LocalSet::new();
        local
            .run_until(async {
                let server = tokio::task::spawn_local(start_server_loop(
                    listener,
                    state,
                    Arc::new(AtomicUsize::new(0)),
                    Arc::clone(&shutdown),
                ));

                let mut stream = TcpStream::connect(addr).await.unwrap();
                stream.write_all(NO_STORE_REQUEST.as_bytes()).await.unwrap();
                let response = read_no_store_response(&mut stream).await;
                assert!(!response.contains("connection: close"), "{response}");

                // Nothing more is sent; the server hangs up after 1s idle
                let mut rest = Vec::new();
                timeout(Duration::from_secs(5), stream.read_to_end(&mut rest))
                    .await
                    .expect("idle connection was not closed")
                    .unwrap();
                assert!(rest.is_empty());

                shutdown.notify_one();
                server.await.unwrap().unwrap();
            })
            .await;
    }
}
