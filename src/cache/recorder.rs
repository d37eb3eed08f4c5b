//! Response recording for cache admission.

use axum::http::{HeaderMap, StatusCode};
use bytes::{Bytes, BytesMut};

use super::memory::CachedResponse;

/// Captures a response's status, headers and body as it streams to the client.
#[derive(Debug)]
pub struct Recorder {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,

    /// Bytes seen so far, including any not kept in `body`
    written: usize,
}

impl Recorder {
    pub fn new(status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            status,
            headers,
            body: BytesMut::new(),
            written: 0,
        }
    }

    pub fn write(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
        self.written += chunk.len();
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Total bytes written through the recorder.
    pub fn written(&self) -> usize {
        self.written
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_response(self) -> CachedResponse {
        CachedResponse::new(self.headers, Bytes::from(self.body))
    }
}

/// Wraps a [`Recorder`] and stops buffering once a byte limit is passed.
///
/// Bytes past the limit are still counted, so the caller can tell the
/// response was too large, but the buffer is released instead of growing.
/// A limit of zero means unlimited.
#[derive(Debug)]
pub struct SizeLimiter {
    recorder: Recorder,
    limit: usize,
    exceeded: bool,
}

impl SizeLimiter {
    pub fn new(recorder: Recorder, limit: usize) -> Self {
        Self {
            recorder,
            limit,
            exceeded: false,
        }
    }

    pub fn write(&mut self, chunk: &[u8]) {
        if self.exceeded {
            self.recorder.written += chunk.len();
            return;
        }

        if self.limit > 0 && self.recorder.written + chunk.len() > self.limit {
            self.exceeded = true;
            self.recorder.written += chunk.len();
            self.recorder.body = BytesMut::new();
            return;
        }

        self.recorder.write(chunk);
    }

    /// Whether the response grew past the limit.
    pub fn limit_exceeded(&self) -> bool {
        self.exceeded
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn into_recorder(self) -> Recorder {
        self.recorder
    }
}
