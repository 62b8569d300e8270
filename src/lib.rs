use crate::http::codec::HttpProtocolError;
use thiserror::Error;

/// Error types for the header-echo library
#[derive(Error, Debug)]
pub enum EchoError {
    /// TCP-related errors (bind, accept, connect, read, write)
    #[error("TCP error: {0}")]
    Tcp(#[from] std::io::Error),

    /// HTTP framing errors raised by the codec or the client
    #[error("HTTP error: {0}")]
    Http(#[from] HttpProtocolError),

    /// JSON encoding or decoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// UTF-8 encoding errors
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Result type for the header-echo library
pub type Result<T> = std::result::Result<T, EchoError>;

pub mod common;
pub mod http;

// Re-export main types for convenience
pub use crate::common::EchoServerTrait;
pub use crate::http::{
    ClientConfig, ClientConfigBuilder, EchoResponse, HeaderMapping, HttpConfig, HttpEchoClient,
    HttpServer, Router, canonical_name,
};
