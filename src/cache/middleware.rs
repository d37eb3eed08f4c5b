//! Axum middleware serving responses from the [`ResponseCache`].

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{OriginalUri, Request, State},
    http::{HeaderValue, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::memory::ResponseCache;
use super::recorder::{Recorder, SizeLimiter};
use super::tee::TeeBody;

/// Request header overriding the cache key. Its first value wins.
pub const CACHE_KEY_HEADER: &str = "x-memcache-key";

/// Response header reporting whether the response came from the cache.
pub const CACHE_HIT_HEADER: &str = "x-memcache-hit";

/// Compute the cache key for a request.
///
/// Uses the `X-Memcache-Key` header when present, otherwise the request URI
/// (path and query) as originally received.
pub fn cache_key(request: &Request) -> String {
    if let Some(value) = request.headers().get(CACHE_KEY_HEADER) {
        return String::from_utf8_lossy(value.as_bytes()).into_owned();
    }

    let uri = request
        .extensions()
        .get::<OriginalUri>()
        .map(|original| &original.0)
        .unwrap_or_else(|| request.uri());

    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Memoize full `200 OK` responses by cache key.
///
/// On a hit the stored headers and body are replayed without running the
/// downstream handler. On a miss the downstream response streams to the
/// client through a [`TeeBody`], which admits the recorded copy once the
/// body completes. Only `GET` requests take part.
pub async fn response_cache_middleware(
    State(cache): State<Arc<ResponseCache>>,
    request: Request,
    next: Next,
) -> Response {
    if request.method() != Method::GET {
        return next.run(request).await;
    }

    let key = cache_key(&request);

    if let Some(cached) = cache.get(&key) {
        debug!(key = %key, bytes = cached.size(), "Cache hit");
        let mut response = cached.to_response();
        response
            .headers_mut()
            .insert(CACHE_HIT_HEADER, HeaderValue::from_static("true"));
        return response;
    }

    let response = next.run(request).await;

    if response.status() != StatusCode::OK {
        debug!(
            key = %key,
            status = response.status().as_u16(),
            "Not caching non-200 response"
        );
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let recorder = Recorder::new(parts.status, parts.headers.clone());
    let limiter = SizeLimiter::new(recorder, cache.entry_limit());
    let body = TeeBody::new(body, key, limiter, Arc::clone(&cache));

    parts
        .headers
        .insert(CACHE_HIT_HEADER, HeaderValue::from_static("false"));
    Response::from_parts(parts, Body::new(body))
}
