use std::net::SocketAddr;
use std::time::Duration;

/// Configuration for the HTTP header echo server
///
/// # Examples
///
/// ```rust
/// use header_echo::http::HttpConfig;
/// use std::time::Duration;
///
/// let config = HttpConfig {
///     bind_addr: "127.0.0.1:8080".parse().unwrap(),
///     route_path: "/headers".to_string(),
///     read_timeout: Duration::from_secs(5),
///     ..HttpConfig::default()
/// };
/// assert_eq!(config.max_headers, 64);
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Network address to bind to
    pub bind_addr: SocketAddr,
    /// Path the header echo route is mounted on
    pub route_path: String,
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Initial read buffer capacity per connection
    pub buffer_size: usize,
    /// Maximum number of header fields accepted in one request
    pub max_headers: usize,
    /// Maximum size in bytes of a request line plus header block
    pub max_request_head_size: usize,
    /// Read timeout for connections
    pub read_timeout: Duration,
    /// Write timeout for connections
    pub write_timeout: Duration,
    /// Server name to include in responses (optional)
    pub server_name: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            route_path: "/headers".to_string(),
            max_connections: 1000,
            buffer_size: 8192,
            max_headers: 64,
            max_request_head_size: 64 * 1024,
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            server_name: Some(concat!("HeaderEcho/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpConfig::default();
        assert!(config.bind_addr.ip().is_unspecified());
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(config.route_path, "/headers");
        assert_eq!(config.read_timeout, Duration::from_secs(30));
        assert_eq!(config.write_timeout, Duration::from_secs(30));
        assert!(
            config
                .server_name
                .as_deref()
                .is_some_and(|name| name.starts_with("HeaderEcho/"))
        );
    }
}
