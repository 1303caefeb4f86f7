//! Body wrapper that reports when a stream is finished.
//!
//! Used on both sides of the relay: on the upload, so the response deadline
//! starts once the caller's body has been handed to the upstream, and on the
//! relayed response, so request latency covers the whole body.

use std::pin::Pin;
use std::task::{Context, Poll};

use axum::body::Body;
use hyper::body::{Body as HttpBody, Bytes, Frame, SizeHint};

type Callback = Box<dyn FnOnce() + Send>;

/// Runs a callback exactly once: at end-of-stream, on a body error, or when
/// dropped unfinished. Frames, size hint and end-of-stream pass through
/// unchanged, so framing decided from them is unaffected.
pub struct OnEnd {
    inner: Body,
    on_end: Option<Callback>,
}

impl OnEnd {
    pub fn new(inner: Body, on_end: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner,
            on_end: Some(Box::new(on_end)),
        }
    }

    /// Wrap `inner` and convert back to an axum body.
    pub fn wrap(inner: Body, on_end: impl FnOnce() + Send + 'static) -> Body {
        Body::new(Self::new(inner, on_end))
    }

    fn finish(&mut self) {
        if let Some(on_end) = self.on_end.take() {
            on_end();
        }
    }
}

impl HttpBody for OnEnd {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Bytes>, axum::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        match &polled {
            Poll::Ready(None) | Poll::Ready(Some(Err(_))) => this.finish(),
            Poll::Ready(Some(Ok(_))) if this.inner.is_end_stream() => this.finish(),
            _ => {}
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for OnEnd {
    fn drop(&mut self) {
        self.finish();
    }
}
