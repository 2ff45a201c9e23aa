//! ORTC client library: publish messages to realtime messaging channels,
//! resolving cluster servers through the ORTC balancer when needed.

pub mod cluster;
pub mod config;
pub mod error;
pub mod init;
pub mod message;

pub use error::OrtcError;
pub use message::{BlockingMessageClient, MessageClient, SendParams};
