//! Response body that copies every frame into the cache recorder.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Body;
use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use tracing::debug;

use super::memory::{Admission, ResponseCache};
use super::recorder::SizeLimiter;

struct Pending {
    key: String,
    limiter: SizeLimiter,
    cache: Arc<ResponseCache>,
}

impl Pending {
    fn admit(self) {
        if self.limiter.limit_exceeded() {
            debug!(
                key = %self.key,
                bytes = self.limiter.recorder().written(),
                limit = self.cache.entry_limit(),
                "Not caching response over the per-entry limit"
            );
            return;
        }

        let response = self.limiter.into_recorder().into_response();
        let size = response.size();
        match self.cache.insert(self.key.as_str(), response) {
            Admission::Admitted => debug!(key = %self.key, bytes = size, "Cached response"),
            Admission::EntryTooLarge => {
                debug!(key = %self.key, bytes = size, "Not caching response over the per-entry limit")
            }
            Admission::ExceedsTotal => {
                debug!(key = %self.key, bytes = size, "Not caching response larger than the cache budget")
            }
        }
    }
}

/// Forwards a downstream body to the client while recording it.
///
/// The recorded copy is offered to the cache only once the downstream body
/// has been fully produced. A body error, or the body being dropped early
/// because the client went away, discards the recording.
pub struct TeeBody {
    inner: Body,
    pending: Option<Pending>,
}

impl TeeBody {
    pub fn new(
        inner: Body,
        key: String,
        limiter: SizeLimiter,
        cache: Arc<ResponseCache>,
    ) -> Self {
        let mut body = Self {
            inner,
            pending: Some(Pending {
                key,
                limiter,
                cache,
            }),
        };

        // An empty body may never be polled
        if body.inner.is_end_stream() {
            body.finish();
        }
        body
    }

    fn finish(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.admit();
        }
    }
}

impl HttpBody for TeeBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = &mut *self;

        match Pin::new(&mut this.inner).poll_frame(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(frame))) => {
                if let (Some(data), Some(pending)) = (frame.data_ref(), this.pending.as_mut()) {
                    pending.limiter.write(data);
                }
                // The server stops polling once the body reports its end, so
                // the last data frame is where the recording completes.
                if this.inner.is_end_stream() {
                    this.finish();
                }
                Poll::Ready(Some(Ok(frame)))
            }
            Poll::Ready(Some(Err(err))) => {
                if let Some(pending) = this.pending.take() {
                    debug!(key = %pending.key, error = %err, "Response body failed, not caching");
                }
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.finish();
                Poll::Ready(None)
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

impl Drop for TeeBody {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(key = %pending.key, "Response body dropped before completion, not caching");
        }
    }
}
