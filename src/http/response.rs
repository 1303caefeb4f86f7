//! The one response the gateway makes up itself.
//!
//! Everything else the caller sees was produced by the upstream. When the
//! upstream cannot be reached the caller still gets a well-formed answer:
//! 502 with an HTML page naming the backend and the low-level error.

use axum::{
    body::Body,
    http::{header, HeaderValue, Response, StatusCode},
    response::IntoResponse,
};

use crate::error::UpstreamError;

/// Content type of the synthesized 502.
pub const GATEWAY_ERROR_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Build the 502 returned when `upstream` could not be reached.
pub fn bad_gateway(upstream: &str, error: &UpstreamError) -> Response<Body> {
    let body = format!(
        "<h1>502 Bad Gateway</h1>\n\
         <p>Could not connect to the application backend at {}.</p>\n\
         <p>Error: {}</p>\n",
        escape_html(upstream),
        escape_html(&error.describe()),
    );

    (
        StatusCode::BAD_GATEWAY,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static(GATEWAY_ERROR_CONTENT_TYPE),
        )],
        body,
    )
        .into_response()
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
