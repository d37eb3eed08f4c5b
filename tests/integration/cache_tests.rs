//! Response cache integration tests.
//!
//! Tests verify:
//! - Repeated requests are served from memory
//! - The per-entry limit keeps large responses out of the cache
//! - Non-200 responses are never cached
//! - The total budget evicts least-recently-used entries
//! - Concurrent admissions stay within the total budget
//! - Cache keys can be overridden with `X-Memcache-Key`

use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};

use cesium_terrain_server::cache::{CacheConfig, CACHE_HIT_HEADER, CACHE_KEY_HEADER};
use cesium_terrain_server::tile::{TileCoord, BLANK_ROOT_TILE};
use cesium_terrain_server::{create_router_with_cache, ResponseCache, RouterConfig};

use super::test_utils::{get, get_ok, send, tile_bytes, MockStore};

const MB: usize = 1024 * 1024;

fn cached_router(
    store: MockStore,
    cache: CacheConfig,
) -> (axum::Router, std::sync::Arc<ResponseCache>) {
    let config = RouterConfig::default()
        .with_tracing(false)
        .with_cache(cache);
    let (router, cache) = create_router_with_cache(store, config);
    (router, cache.unwrap())
}

fn world_with_tile(coord: TileCoord, len: usize) -> MockStore {
    MockStore::new()
        .with_layer("world", "{}")
        .with_tile("world", coord, tile_bytes(len))
}

// =============================================================================
// Hits and Misses
// =============================================================================

#[tokio::test]
async fn test_second_request_served_from_cache() {
    let store = world_with_tile(TileCoord::new(5, 3, 2), 200);
    let (router, cache) = cached_router(store.clone(), CacheConfig::new(MB, MB));

    let (first, first_body) = get_ok(&router, "/tilesets/world/5/3/2.terrain").await;
    assert_eq!(store.tile_reads(), 1);
    assert_eq!(first.headers()[CACHE_HIT_HEADER], "false");

    let (second, second_body) = get_ok(&router, "/tilesets/world/5/3/2.terrain").await;
    assert_eq!(store.tile_reads(), 1);
    assert_eq!(second.headers()[CACHE_HIT_HEADER], "true");

    assert_eq!(first_body, second_body);
    assert_eq!(first_body.len(), 200);
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.size(), 200);
}

#[tokio::test]
async fn test_cache_hit_replays_headers() {
    let store = world_with_tile(TileCoord::new(5, 3, 2), 64);
    let (router, _cache) = cached_router(store, CacheConfig::new(MB, MB));

    get_ok(&router, "/tilesets/world/5/3/2.terrain").await;
    let (response, _) = get_ok(&router, "/tilesets/world/5/3/2.terrain").await;

    let headers = response.headers();
    assert_eq!(headers[CACHE_HIT_HEADER], "true");
    assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
    assert_eq!(headers[header::CONTENT_ENCODING], "gzip");
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        "attachment; filename=2.terrain"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
}

#[tokio::test]
async fn test_default_layer_and_blank_root_are_cached() {
    let store = MockStore::new().with_tileset("world");
    let (router, cache) = cached_router(store.clone(), CacheConfig::new(MB, MB));

    get_ok(&router, "/tilesets/world/layer.json").await;
    get_ok(&router, "/tilesets/world/0/0/0.terrain").await;
    let reads = (store.layer_reads(), store.tile_reads(), store.status_probes());

    let (_, body) = get_ok(&router, "/tilesets/world/0/0/0.terrain").await;
    assert_eq!(body.as_ref(), BLANK_ROOT_TILE);
    get_ok(&router, "/tilesets/world/layer.json").await;

    assert_eq!(
        (store.layer_reads(), store.tile_reads(), store.status_probes()),
        reads
    );
    assert_eq!(cache.len(), 2);
}

#[tokio::test]
async fn test_query_string_is_part_of_key() {
    let store = world_with_tile(TileCoord::new(5, 3, 2), 32);
    let (router, cache) = cached_router(store.clone(), CacheConfig::new(MB, MB));

    get_ok(&router, "/tilesets/world/5/3/2.terrain?v=1").await;
    get_ok(&router, "/tilesets/world/5/3/2.terrain?v=2").await;

    assert_eq!(store.tile_reads(), 2);
    assert_eq!(cache.len(), 2);
    assert!(cache.contains("/tilesets/world/5/3/2.terrain?v=1"));
}

// =============================================================================
// Per-entry Limit
// =============================================================================

#[tokio::test]
async fn test_response_over_entry_limit_is_not_cached() {
    let store = world_with_tile(TileCoord::new(5, 3, 2), 200);
    let (router, cache) = cached_router(store.clone(), CacheConfig::new(100, MB));

    let (_, first) = get_ok(&router, "/tilesets/world/5/3/2.terrain").await;
    let (_, second) = get_ok(&router, "/tilesets/world/5/3/2.terrain").await;

    // Served in full both times, read from the store both times
    assert_eq!(first.len(), 200);
    assert_eq!(first, second);
    assert_eq!(store.tile_reads(), 2);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_entry_limit_boundary() {
    let store = MockStore::new()
        .with_layer("world", "{}")
        .with_tile("world", TileCoord::new(1, 0, 0), tile_bytes(100))
        .with_tile("world", TileCoord::new(1, 1, 0), tile_bytes(101));
    let (router, cache) = cached_router(store, CacheConfig::new(100, MB));

    get_ok(&router, "/tilesets/world/1/0/0.terrain").await;
    get_ok(&router, "/tilesets/world/1/1/0.terrain").await;

    assert!(cache.contains("/tilesets/world/1/0/0.terrain"));
    assert!(!cache.contains("/tilesets/world/1/1/0.terrain"));
}

#[tokio::test]
async fn test_zero_entry_limit_is_unlimited() {
    let store = world_with_tile(TileCoord::new(5, 3, 2), 4096);
    let (router, cache) = cached_router(store.clone(), CacheConfig::new(0, MB));

    get_ok(&router, "/tilesets/world/5/3/2.terrain").await;
    get_ok(&router, "/tilesets/world/5/3/2.terrain").await;

    assert_eq!(store.tile_reads(), 1);
    assert_eq!(cache.size(), 4096);
}

// =============================================================================
// Non-200 Responses
// =============================================================================

#[tokio::test]
async fn test_not_found_is_not_cached() {
    let store = MockStore::new().with_layer("world", "{}");
    let (router, cache) = cached_router(store.clone(), CacheConfig::new(MB, MB));

    for _ in 0..2 {
        let (response, _) = send(&router, get("/tilesets/world/5/3/2.terrain")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    assert_eq!(store.tile_reads(), 2);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_errors_do_not_evict() {
    let store = world_with_tile(TileCoord::new(5, 3, 2), 64).with_failing("broken");
    let (router, cache) = cached_router(store, CacheConfig::new(MB, MB));

    get_ok(&router, "/tilesets/world/5/3/2.terrain").await;

    let (response, _) = send(&router, get("/tilesets/broken/5/3/2.terrain")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let (response, _) = send(&router, get("/tilesets/world/x/3/2.terrain")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert_eq!(cache.len(), 1);
    assert!(cache.contains("/tilesets/world/5/3/2.terrain"));
}

#[tokio::test]
async fn test_head_requests_bypass_cache() {
    let store = world_with_tile(TileCoord::new(5, 3, 2), 64);
    let (router, cache) = cached_router(store.clone(), CacheConfig::new(MB, MB));

    let request = Request::builder()
        .method(Method::HEAD)
        .uri("/tilesets/world/5/3/2.terrain")
        .body(Body::empty())
        .unwrap();
    let (response, _) = send(&router, request).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(cache.is_empty());

    // A later GET still gets the full body
    let (_, body) = get_ok(&router, "/tilesets/world/5/3/2.terrain").await;
    assert_eq!(body.len(), 64);
}

// =============================================================================
// Total Budget
// =============================================================================

#[tokio::test]
async fn test_total_budget_evicts_lru() {
    let store = MockStore::new()
        .with_layer("world", "{}")
        .with_tile("world", TileCoord::new(1, 0, 0), tile_bytes(400))
        .with_tile("world", TileCoord::new(1, 1, 0), tile_bytes(400))
        .with_tile("world", TileCoord::new(1, 2, 0), tile_bytes(400));
    let (router, cache) = cached_router(store, CacheConfig::new(0, 1000));

    get_ok(&router, "/tilesets/world/1/0/0.terrain").await;
    get_ok(&router, "/tilesets/world/1/1/0.terrain").await;
    // Touch 1/0/0 so 1/1/0 is least recently used
    get_ok(&router, "/tilesets/world/1/0/0.terrain").await;
    get_ok(&router, "/tilesets/world/1/2/0.terrain").await;

    assert!(cache.contains("/tilesets/world/1/0/0.terrain"));
    assert!(!cache.contains("/tilesets/world/1/1/0.terrain"));
    assert!(cache.contains("/tilesets/world/1/2/0.terrain"));
    assert!(cache.size() <= 1000);
}

#[tokio::test]
async fn test_entry_larger_than_budget_empties_cache() {
    let store = MockStore::new()
        .with_layer("world", "{}")
        .with_tile("world", TileCoord::new(1, 0, 0), tile_bytes(500))
        .with_tile("world", TileCoord::new(1, 1, 0), tile_bytes(1500));
    let (router, cache) = cached_router(store, CacheConfig::new(0, 1000));

    get_ok(&router, "/tilesets/world/1/0/0.terrain").await;
    assert_eq!(cache.len(), 1);

    let (_, body) = get_ok(&router, "/tilesets/world/1/1/0.terrain").await;
    assert_eq!(body.len(), 1500);
    assert!(cache.is_empty());
    assert_eq!(cache.size(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_admissions_respect_budget() {
    const TILES: u64 = 20;
    const TILE_LEN: usize = 300;
    const TOTAL: usize = 1000;

    let mut store = MockStore::new().with_layer("world", "{}");
    for x in 0..TILES {
        store = store.with_tile("world", TileCoord::new(5, x, 0), vec![x as u8; TILE_LEN]);
    }
    let (router, cache) = cached_router(store, CacheConfig::new(0, TOTAL));

    let mut tasks = Vec::new();
    for i in 0..400u64 {
        let router = router.clone();
        let x = i % TILES;
        tasks.push(tokio::spawn(async move {
            let uri = format!("/tilesets/world/5/{}/0.terrain", x);
            let (_, body) = get_ok(&router, &uri).await;
            (x, body)
        }));
    }

    for task in tasks {
        let (x, body) = task.await.unwrap();
        assert_eq!(body.len(), TILE_LEN);
        assert!(body.iter().all(|&b| b == x as u8), "tile {} body mixed up", x);
    }

    assert!(cache.size() <= TOTAL);
    // Each resident key is counted once
    assert_eq!(cache.size(), cache.len() * TILE_LEN);
    let resident = (0..TILES)
        .filter(|x| cache.contains(&format!("/tilesets/world/5/{}/0.terrain", x)))
        .count();
    assert_eq!(resident, cache.len());
}

// =============================================================================
// Keys and Expiry
// =============================================================================

#[tokio::test]
async fn test_cache_key_header_override() {
    let store = MockStore::new()
        .with_layer("world", "{}")
        .with_tile("world", TileCoord::new(1, 0, 0), vec![1; 10])
        .with_tile("world", TileCoord::new(1, 1, 0), vec![2; 10]);
    let (router, cache) = cached_router(store.clone(), CacheConfig::new(MB, MB));

    let request = |uri: &str| {
        Request::builder()
            .uri(uri)
            .header(CACHE_KEY_HEADER, "shared")
            .body(Body::empty())
            .unwrap()
    };

    let (_, first) = send(&router, request("/tilesets/world/1/0/0.terrain")).await;
    let (response, second) = send(&router, request("/tilesets/world/1/1/0.terrain")).await;

    // The second URI is answered with the entry stored under the shared key
    assert_eq!(response.headers()[CACHE_HIT_HEADER], "true");
    assert_eq!(first, second);
    assert_eq!(second.as_ref(), &[1; 10]);
    assert_eq!(store.tile_reads(), 1);
    assert!(cache.contains("shared"));
}

#[tokio::test]
async fn test_expired_entries_are_refetched() {
    let store = world_with_tile(TileCoord::new(5, 3, 2), 32);
    let config = CacheConfig::new(MB, MB).with_ttl(Duration::from_millis(300));
    let (router, _cache) = cached_router(store.clone(), config);

    get_ok(&router, "/tilesets/world/5/3/2.terrain").await;
    get_ok(&router, "/tilesets/world/5/3/2.terrain").await;
    assert_eq!(store.tile_reads(), 1);

    tokio::time::sleep(Duration::from_millis(400)).await;

    get_ok(&router, "/tilesets/world/5/3/2.terrain").await;
    assert_eq!(store.tile_reads(), 2);
}

#[tokio::test]
async fn test_health_is_not_cached() {
    let (router, cache) = cached_router(MockStore::new(), CacheConfig::new(MB, MB));

    let (response, _) = get_ok(&router, "/health").await;
    assert!(response.headers().get(CACHE_HIT_HEADER).is_none());
    assert!(cache.is_empty());
}
