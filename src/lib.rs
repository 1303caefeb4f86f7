//! Transparent HTTP gateway in front of a loopback application server.
//!
//! Every inbound request is relayed to one fixed upstream origin and the
//! upstream's answer is returned verbatim. The only response produced locally
//! is a 502 when the upstream cannot be reached.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use error::{ConfigError, UpstreamError};
pub use http::{Forwarder, GatewayServer};
pub use lifecycle::Shutdown;
