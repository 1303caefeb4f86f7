//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//! ```
//!
//! The upstream origin is read once at startup. There is no reload path.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config};
pub use schema::{GatewayConfig, ListenerConfig, ObservabilityConfig, TimeoutConfig, UpstreamConfig};
pub use validation::{validate_config, ValidationError};
