//! The forwarder: one inbound request, one upstream call, one response.
//!
//! # Lifecycle
//! ```text
//! Receiving inbound
//!     → Building outbound   (build_outbound: URI, headers minus Host, body)
//!     → Executing upstream  (upload unbounded, then the request timeout
//!                            applies to the wait for the response head)
//!     → Relaying success    (status, headers, streaming body, untouched)
//!     | Synthesizing 502    (response::bad_gateway)
//! ```
//!
//! There is no retry edge: a failure goes straight to the 502. Redirects are
//! responses like any other and are relayed, never followed.

use std::time::{Duration, Instant};

use axum::{
    body::{Body, HttpBody},
    http::{
        header::{self, HeaderMap},
        uri::{Authority, PathAndQuery, Scheme},
        Method, Request, Response, Uri, Version,
    },
};
use hyper::body::Incoming;
use tokio::sync::oneshot;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::error::UpstreamError;
use crate::http::body::OnEnd;
use crate::http::response::bad_gateway;
use crate::observability::metrics;

/// Relays requests to a single fixed upstream origin.
///
/// Holds no per-request state; one instance serves all requests concurrently.
#[derive(Clone)]
pub struct Forwarder {
    client: Client<HttpConnector, Body>,
    upstream: String,
    request_timeout: Duration,
}

impl Forwarder {
    /// Create a forwarder for the configured upstream.
    pub fn new(upstream: &UpstreamConfig, timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(timeouts.idle_secs))
            .build(connector);

        Self {
            client,
            upstream: upstream.authority(),
            request_timeout: Duration::from_secs(timeouts.request_secs),
        }
    }

    /// The upstream `host:port`.
    pub fn upstream(&self) -> &str {
        &self.upstream
    }

    /// Relay one request. Always yields a response; upstream failures become 502.
    pub async fn forward(&self, inbound: Request<Body>) -> Response<Body> {
        let started = Instant::now();
        let method = inbound.method().clone();
        let target = inbound.uri().clone();

        match self.execute(inbound).await {
            Ok(response) => {
                tracing::debug!(
                    method = %method,
                    uri = %target,
                    status = %response.status(),
                    "Relaying upstream response"
                );
                let status = response.status().as_u16();
                response.map(|body| {
                    OnEnd::wrap(body, move || {
                        metrics::record_request(method.as_str(), status, started)
                    })
                })
            }
            Err(e) => {
                let detail = e.describe();
                tracing::warn!(
                    method = %method,
                    uri = %target,
                    upstream = %self.upstream,
                    error = %detail,
                    "Upstream unreachable"
                );
                metrics::record_upstream_error(e.kind());
                let response = bad_gateway(&self.upstream, &e);
                metrics::record_request(method.as_str(), response.status().as_u16(), started);
                response
            }
        }
    }

    /// The request timeout bounds only the wait for the response head after
    /// the upload is done; a slow or large upload is never cut off by it.
    async fn execute(&self, inbound: Request<Body>) -> Result<Response<Body>, UpstreamError> {
        let (uploaded_tx, uploaded) = oneshot::channel::<()>();
        let outbound = self.build_outbound(inbound)?.map(|body| {
            OnEnd::wrap(body, move || {
                let _ = uploaded_tx.send(());
            })
        });

        let mut call = std::pin::pin!(self.client.request(outbound));
        let early = tokio::select! {
            result = &mut call => Some(result),
            // Fires on end-of-stream, body error, or hyper dropping the body.
            _ = uploaded => None,
        };
        let response: hyper::Response<Incoming> = match early {
            Some(result) => result?,
            None => tokio::time::timeout(self.request_timeout, call)
                .await
                .map_err(|_| UpstreamError::Timeout(self.request_timeout))??,
        };

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }

    /// Translate an inbound request into the request sent upstream.
    ///
    /// The URI is the upstream origin followed by the inbound path and query,
    /// byte for byte. Every header except `Host` is appended in order, so
    /// repeated names survive. The body stream is attached untouched when the
    /// request carries one.
    pub fn build_outbound(&self, inbound: Request<Body>) -> Result<Request<Body>, UpstreamError> {
        let (parts, body) = inbound.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .cloned()
            .unwrap_or_else(|| PathAndQuery::from_static("/"));
        let uri = Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.upstream.parse::<Authority>().map_err(axum::http::Error::from)?)
            .path_and_query(path_and_query)
            .build()?;

        let body = if carries_body(&parts.method, &body) {
            body
        } else {
            Body::empty()
        };

        let mut outbound = Request::builder()
            .method(parts.method)
            .uri(uri)
            .version(Version::HTTP_11)
            .body(body)?;
        copy_headers(&parts.headers, outbound.headers_mut());

        Ok(outbound)
    }
}

/// Append every header but `Host`.
///
/// `HeaderMap` keys are canonical lower-case names, so the comparison cannot
/// miss a mixed-case `HoSt`.
fn copy_headers(from: &HeaderMap, to: &mut HeaderMap) {
    for (name, value) in from {
        if *name == header::HOST {
            continue;
        }
        to.append(name.clone(), value.clone());
    }
}

/// Whether the inbound body stream is attached to the outbound request.
///
/// True for `POST`, `PUT`, `PATCH` and `DELETE`, and for any method whose
/// body still has bytes coming. An empty body looks the same on the wire
/// either way: hyper adds no `Content-Length` or chunked framing for a body
/// that is already at end-of-stream, so the upstream sees a `Content-Length`
/// only when the caller sent one.
fn carries_body(method: &Method, body: &Body) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    ) || !body.is_end_stream()
}
