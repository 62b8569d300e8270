use crate::common::EchoServerTrait;
use crate::http::{HttpConfig, HttpServer};
use crate::{EchoError, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Handle to a header echo server running in the background
pub struct TestServer {
    /// Address the server is listening on
    pub addr: SocketAddr,
    /// Task driving the accept loop
    pub handle: JoinHandle<Result<()>>,
    shutdown: broadcast::Sender<()>,
}

impl TestServer {
    /// Signals the server to stop and waits for the accept loop to exit
    pub async fn shutdown(self) -> Result<()> {
        let _ = self.shutdown.send(());
        self.handle
            .await
            .map_err(|e| EchoError::Config(format!("Server task failed: {e}")))?
    }
}

/// Creates a header echo server on an ephemeral loopback port
///
/// The listener is bound before this function returns, so clients can
/// connect immediately without racing the server task.
pub async fn create_test_server(mut config: HttpConfig) -> Result<TestServer> {
    config.bind_addr = "127.0.0.1:0"
        .parse()
        .map_err(|e| EchoError::Config(format!("Invalid loopback address: {e}")))?;

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| EchoError::Config(format!("Failed to bind listener: {e}")))?;
    let addr = listener
        .local_addr()
        .map_err(|e| EchoError::Config(format!("Failed to get local address: {e}")))?;

    let server = HttpServer::header_echo(config);
    let shutdown = server.shutdown_signal();
    let handle = tokio::spawn(async move { server.serve(listener).await });

    Ok(TestServer {
        addr,
        handle,
        shutdown,
    })
}

/// Creates a header echo server with a specific connection limit
pub async fn create_test_server_with_limit(max_connections: usize) -> Result<TestServer> {
    let config = HttpConfig {
        max_connections,
        ..HttpConfig::default()
    };
    create_test_server(config).await
}
