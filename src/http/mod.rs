//! HTTP header echo server implementation
//!
//! This module provides an HTTP/1.1 server that answers requests on a single
//! route by echoing the request headers back as a JSON object.

pub mod client;
pub mod codec;
pub mod config;
pub mod handler;
pub mod headers;
pub mod response;
pub mod router;
pub mod server;


pub use client::{ClientConfig, ClientConfigBuilder, EchoResponse, HttpEchoClient};
pub use codec::{HttpCodec, HttpProtocolError};
pub use config::HttpConfig;
pub use handler::echo_headers;
pub use headers::{HeaderMapping, canonical_name};
pub use router::{Handler, Router};
pub use server::HttpServer;
