//! Error types.

use std::time::Duration;

use crate::config::ValidationError;

/// Failure to obtain a response from the upstream.
///
/// This is the only failure the forwarder recognizes. Any status the upstream
/// returns, 4xx and 5xx included, is a response and not an error.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// DNS, connect, reset, or protocol failure before a response head arrived.
    #[error(transparent)]
    Connect(#[from] hyper_util::client::legacy::Error),

    /// The upstream did not answer in time.
    #[error("no response from upstream within {0:?}")]
    Timeout(Duration),

    /// The outbound request could not be assembled.
    #[error("could not build upstream request: {0}")]
    InvalidRequest(#[from] axum::http::Error),
}

impl UpstreamError {
    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Connect(e) if e.is_connect() => "connect",
            UpstreamError::Connect(_) => "transport",
            UpstreamError::Timeout(_) => "timeout",
            UpstreamError::InvalidRequest(_) => "invalid_request",
        }
    }

    /// The error and all of its sources, joined by `": "`.
    ///
    /// hyper-util's top-level message is only "client error (Connect)"; the
    /// useful part (e.g. "Connection refused") lives further down the chain.
    pub fn describe(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            if !out.ends_with(&text) {
                out.push_str(": ");
                out.push_str(&text);
            }
            source = std::error::Error::source(cause);
        }
        out
    }
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
