//! Common traits and helpers used across the header-echo library
//!
//! This module contains the server trait and the helpers integration
//! tests use to stand up a server on an ephemeral port.

pub mod test_utils;
pub mod traits;

pub use test_utils::{TestServer, create_test_server, create_test_server_with_limit};
pub use traits::EchoServerTrait;
