use super::codec::HttpCodec;
use super::config::HttpConfig;
use super::handler::echo_headers;
use super::response;
use super::router::Router;
use crate::common::EchoServerTrait;
use crate::Result;
use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use http::header::CONNECTION;
use http::{Method, Request, Version};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::{signal, time::timeout};
use tokio_util::codec::Framed;
use tracing::{debug, error, info, warn, Instrument};

/// HTTP server dispatching requests through an explicit [`Router`]
///
/// # Examples
///
/// ```no_run
/// use header_echo::{EchoServerTrait, HttpConfig, HttpServer};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let server = HttpServer::header_echo(HttpConfig::default());
///     server.run().await?;
///     Ok(())
/// }
/// ```
pub struct HttpServer {
    config: HttpConfig,
    router: Arc<Router>,
    shutdown_signal: Arc<tokio::sync::broadcast::Sender<()>>,
}

impl HttpServer {
    /// Creates a server with the given configuration and route table
    pub fn new(config: HttpConfig, router: Router) -> Self {
        let (shutdown_signal, _) = tokio::sync::broadcast::channel(1);
        Self {
            config,
            router: Arc::new(router),
            shutdown_signal: Arc::new(shutdown_signal),
        }
    }

    /// Creates a server with the header echo route mounted on `config.route_path`
    pub fn header_echo(config: HttpConfig) -> Self {
        let router = Router::new().route(
            config.route_path.clone(),
            &[Method::GET, Method::POST],
            echo_headers,
        );
        Self::new(config, router)
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Accepts connections on `listener` until shutdown
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local_addr = listener.local_addr()?;
        info!(address = %local_addr, route = %self.config.route_path, "Header echo server listening");

        let connection_count = Arc::new(AtomicUsize::new(0));
        let request_ids = Arc::new(AtomicU64::new(0));
        let mut shutdown_rx = self.shutdown_signal.subscribe();

        loop {
            tokio::select! {
                accept_result = listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            let current_count = connection_count.load(Ordering::SeqCst);
                            if current_count >= self.config.max_connections {
                                warn!(%addr, current = current_count, limit = self.config.max_connections, "Connection rejected: limit reached");
                                continue;
                            }

                            let new_count = connection_count.fetch_add(1, Ordering::SeqCst) + 1;
                            debug!(%addr, current = new_count, "Accepted connection");

                            let config = self.config.clone();
                            let router = self.router.clone();
                            let request_ids = request_ids.clone();
                            let connection_count = connection_count.clone();
                            let span = tracing::info_span!("connection", %addr);
                            tokio::spawn(async move {
                                let result = Self::handle_connection(stream, addr, config, router, request_ids)
                                    .instrument(span)
                                    .await;
                                if let Err(e) = result {
                                    error!(%addr, error = %e, "Error handling connection");
                                }
                                let final_count = connection_count.fetch_sub(1, Ordering::SeqCst) - 1;
                                debug!(%addr, current = final_count, "Connection closed");
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "Failed to accept connection");
                        }
                    }
                }
                _ = signal::ctrl_c() => {
                    info!("Received shutdown signal, stopping server");
                    break;
                }
                _ = shutdown_rx.recv() => {
                    info!("Received internal shutdown signal, stopping server");
                    break;
                }
            }
        }

        info!("Header echo server stopped");
        Ok(())
    }

    /// Serves requests on one connection until it closes or stops being reusable
    async fn handle_connection(
        stream: TcpStream,
        addr: SocketAddr,
        config: HttpConfig,
        router: Arc<Router>,
        request_ids: Arc<AtomicU64>,
    ) -> Result<()> {
        let codec = HttpCodec::new(config.max_headers, config.max_request_head_size);
        let mut framed = Framed::with_capacity(stream, codec, config.buffer_size);

        loop {
            let request = match timeout(config.read_timeout, framed.next()).await {
                Ok(Some(Ok(request))) => request,
                Ok(Some(Err(e))) => {
                    if let Some(status) = e.status() {
                        warn!(%addr, error = %e, status = status.as_u16(), "Rejecting malformed request");
                        let rejection =
                            response::finalize(response::status(status), false, config.server_name.as_deref());
                        if let Ok(Err(e)) = timeout(config.write_timeout, framed.send(rejection)).await {
                            debug!(%addr, error = %e, "Failed to send rejection");
                        }
                    } else {
                        debug!(%addr, error = %e, "Dropping connection");
                    }
                    break;
                }
                Ok(None) => {
                    debug!(%addr, "Client closed connection");
                    break;
                }
                Err(_) => {
                    warn!(%addr, "Read timeout");
                    break;
                }
            };

            let request_id = request_ids.fetch_add(1, Ordering::Relaxed) + 1;
            let keep_alive = wants_keep_alive(&request) && !framed.codec().must_close();
            let span = tracing::info_span!(
                "request",
                request_id,
                method = %request.method(),
                path = %request.uri().path()
            );

            let reply = span.in_scope(|| {
                let reply = router.dispatch(&request);
                info!(status = reply.status().as_u16(), "Handled request");
                reply
            });
            let reply = response::finalize(reply, keep_alive, config.server_name.as_deref());

            match timeout(config.write_timeout, framed.send(reply)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => {
                    warn!(%addr, "Write timeout");
                    break;
                }
            }

            if !keep_alive {
                break;
            }
        }

        Ok(())
    }
}

/// Whether the client asked for the connection to stay open
fn wants_keep_alive(request: &Request<()>) -> bool {
    let has_token = |token: &str| {
        request.headers().get_all(CONNECTION).iter().any(|value| {
            value
                .to_str()
                .map(|v| v.split(',').any(|t| t.trim().eq_ignore_ascii_case(token)))
                .unwrap_or(false)
        })
    };

    if has_token("close") {
        return false;
    }
    request.version() != Version::HTTP_10 || has_token("keep-alive")
}

#[async_trait]
impl EchoServerTrait for HttpServer {
    /// Binds the configured address and serves until shutdown
    async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve(listener).await
    }

    /// Returns a shutdown signal sender that can be used to gracefully shutdown the server
    fn shutdown_signal(&self) -> tokio::sync::broadcast::Sender<()> {
        self.shutdown_signal.as_ref().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(version: Version, connection: Option<&str>) -> Request<()> {
        let mut builder = Request::get("/headers").version(version);
        if let Some(value) = connection {
            builder = builder.header(CONNECTION, value);
        }
        builder.body(()).unwrap()
    }

    #[test]
    fn test_keep_alive_rules() {
        assert!(wants_keep_alive(&request(Version::HTTP_11, None)));
        assert!(!wants_keep_alive(&request(Version::HTTP_11, Some("close"))));
        assert!(!wants_keep_alive(&request(Version::HTTP_11, Some("Upgrade, Close"))));
        assert!(!wants_keep_alive(&request(Version::HTTP_10, None)));
        assert!(wants_keep_alive(&request(Version::HTTP_10, Some("Keep-Alive"))));
    }

    #[test]
    fn test_header_echo_router() {
        let server = HttpServer::header_echo(HttpConfig::default());
        assert_eq!(server.router().len(), 1);
        assert_eq!(server.config().route_path, "/headers");
        assert_eq!(server.shutdown_signal().receiver_count(), 0);
    }
}
