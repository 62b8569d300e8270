use crate::Result;
use async_trait::async_trait;

/// Common trait for echo servers
///
/// A server binds its listener, serves until Ctrl-C or an internal shutdown
/// signal arrives, then returns.
#[async_trait]
pub trait EchoServerTrait {
    /// Starts the server and listens for connections
    async fn run(&self) -> Result<()>;

    /// Returns a shutdown signal sender that can be used to gracefully shutdown the server
    fn shutdown_signal(&self) -> tokio::sync::broadcast::Sender<()>;
}
