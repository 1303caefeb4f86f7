//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, HTTP/1.1 + HTTP/2, tracing span)
//!     → forward.rs (outbound request, upstream call)
//!     → upstream response relayed as-is, or response.rs (502)
//!     → Send to client
//! ```

pub mod body;
pub mod forward;
pub mod response;
pub mod server;

pub use forward::Forwarder;
pub use server::GatewayServer;
