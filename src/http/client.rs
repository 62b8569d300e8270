use super::codec::HttpProtocolError;
use super::headers::HeaderMapping;
use crate::{EchoError, Result};
use bytes::{Buf, Bytes, BytesMut};
use http::header::{CONTENT_LENGTH, HOST, HeaderName, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Configuration for HTTP echo clients
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Read timeout for operations
    pub read_timeout: Duration,
    /// Write timeout for operations
    pub write_timeout: Duration,
    /// Connection timeout
    pub connect_timeout: Duration,
    /// Buffer size for reading data
    pub buffer_size: usize,
    /// Maximum response size to prevent memory exhaustion
    pub max_response_size: usize,
    /// Maximum number of header fields accepted in a response
    pub max_headers: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            buffer_size: 4096,
            max_response_size: 10 * 1024 * 1024, // 10MB
            max_headers: 64,
        }
    }
}

/// A decoded HTTP response
#[derive(Debug, Clone)]
pub struct EchoResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl EchoResponse {
    /// Decodes the body as an echoed header mapping
    pub fn header_mapping(&self) -> Result<HeaderMapping> {
        HeaderMapping::from_json(&self.body)
    }

    /// Returns the body as a string
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec()).map_err(EchoError::Utf8)
    }
}

/// HTTP/1.1 client for talking to a header echo server
///
/// The connection is kept open between requests, so several requests can be
/// sent over one client as long as the server keeps the connection alive.
///
/// # Examples
///
/// ```no_run
/// use header_echo::HttpEchoClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let addr = "127.0.0.1:5000".parse()?;
///     let mut client = HttpEchoClient::connect(addr).await?;
///
///     let response = client.get("/headers", &[("X-Test", "abc")]).await?;
///     let mapping = response.header_mapping()?;
///     println!("Server echoed: {mapping}");
///     Ok(())
/// }
/// ```
pub struct HttpEchoClient {
    stream: TcpStream,
    addr: SocketAddr,
    buffer: BytesMut,
    config: ClientConfig,
}

impl HttpEchoClient {
    /// Connect to a server with custom configuration
    pub async fn connect_with_config(addr: SocketAddr, config: ClientConfig) -> Result<Self> {
        let stream = timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| EchoError::Timeout("Connection timeout".to_string()))??;

        Ok(Self {
            stream,
            addr,
            buffer: BytesMut::with_capacity(config.buffer_size),
            config,
        })
    }

    /// Connect with default configuration
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        Self::connect_with_config(addr, ClientConfig::default()).await
    }

    /// Sends a GET request with the given extra headers
    pub async fn get(&mut self, path: &str, headers: &[(&str, &str)]) -> Result<EchoResponse> {
        self.request(Method::GET, path, headers, &[]).await
    }

    /// Sends a POST request with the given extra headers and body
    pub async fn post(
        &mut self,
        path: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<EchoResponse> {
        self.request(Method::POST, path, headers, body).await
    }

    /// Sends a request and waits for the complete response
    ///
    /// A `Host` header is added unless `headers` already carries one, and a
    /// `Content-Length` header is added for non-empty bodies and for POST.
    pub async fn request(
        &mut self,
        method: Method,
        path: &str,
        headers: &[(&str, &str)],
        body: &[u8],
    ) -> Result<EchoResponse> {
        let mut raw = format!("{method} {path} HTTP/1.1\r\n");
        if !headers.iter().any(|(name, _)| name.eq_ignore_ascii_case("host")) {
            raw.push_str(&format!("{}: {}\r\n", HOST, self.addr));
        }
        for (name, value) in headers {
            raw.push_str(&format!("{name}: {value}\r\n"));
        }
        if !body.is_empty() || method == Method::POST {
            raw.push_str(&format!("{}: {}\r\n", CONTENT_LENGTH, body.len()));
        }
        raw.push_str("\r\n");

        let mut bytes = raw.into_bytes();
        bytes.extend_from_slice(body);
        self.send_raw(&bytes).await
    }

    /// Writes raw bytes to the connection and reads one response
    pub async fn send_raw(&mut self, data: &[u8]) -> Result<EchoResponse> {
        timeout(self.config.write_timeout, self.stream.write_all(data))
            .await
            .map_err(|_| EchoError::Timeout("Write timeout".to_string()))??;
        timeout(self.config.write_timeout, self.stream.flush())
            .await
            .map_err(|_| EchoError::Timeout("Flush timeout".to_string()))??;

        self.read_response().await
    }

    /// Reads more bytes into the buffer, returning `false` on end of stream
    async fn fill_buffer(&mut self) -> Result<bool> {
        self.buffer.reserve(self.config.buffer_size);
        let n = timeout(self.config.read_timeout, self.stream.read_buf(&mut self.buffer))
            .await
            .map_err(|_| EchoError::Timeout("Read timeout".to_string()))??;

        if self.buffer.len() > self.config.max_response_size {
            return Err(EchoError::Config(format!(
                "Response too large: {} bytes, max allowed: {}",
                self.buffer.len(),
                self.config.max_response_size
            )));
        }
        Ok(n > 0)
    }

    async fn read_response(&mut self) -> Result<EchoResponse> {
        let (head_len, status, headers) = loop {
            if let Some(head) = self.parse_head()? {
                break head;
            }
            if !self.fill_buffer().await? {
                return Err(HttpProtocolError::IncompleteResponse.into());
            }
        };
        self.buffer.advance(head_len);

        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<usize>().ok());

        let body = match content_length {
            Some(len) => {
                while self.buffer.len() < len {
                    if !self.fill_buffer().await? {
                        return Err(HttpProtocolError::IncompleteResponse.into());
                    }
                }
                self.buffer.split_to(len).freeze()
            }
            None => {
                while self.fill_buffer().await? {}
                self.buffer.split().freeze()
            }
        };

        Ok(EchoResponse {
            status,
            headers,
            body,
        })
    }

    fn parse_head(&self) -> Result<Option<(usize, StatusCode, HeaderMap)>> {
        let mut slots = vec![httparse::EMPTY_HEADER; self.config.max_headers];
        let mut parsed = httparse::Response::new(&mut slots);

        let head_len = match parsed.parse(&self.buffer[..]) {
            Ok(httparse::Status::Complete(len)) => len,
            Ok(httparse::Status::Partial) => return Ok(None),
            Err(e) => {
                return Err(HttpProtocolError::HttpParse(format!(
                    "Failed to parse response: {e}"
                ))
                .into());
            }
        };

        let status = parsed
            .code
            .and_then(|code| StatusCode::from_u16(code).ok())
            .ok_or_else(|| HttpProtocolError::HttpParse("invalid status code".to_string()))?;

        let mut headers = HeaderMap::with_capacity(parsed.headers.len());
        for header in parsed.headers.iter() {
            let name = HeaderName::from_bytes(header.name.as_bytes())
                .map_err(|e| HttpProtocolError::HttpParse(e.to_string()))?;
            let value = HeaderValue::from_bytes(header.value)
                .map_err(|e| HttpProtocolError::HttpParse(e.to_string()))?;
            headers.append(name, value);
        }

        Ok(Some((head_len, status, headers)))
    }
}

/// Builder for client configuration
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    pub fn max_response_size(mut self, size: usize) -> Self {
        self.config.max_response_size = size;
        self
    }

    pub fn max_headers(mut self, count: usize) -> Self {
        self.config.max_headers = count;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
