//! End-to-end tests against tilesets on disk.
//!
//! Tests verify:
//! - Layer manifests served from `layer.json` or synthesized
//! - Blank root fallback and missing tile handling
//! - Path traversal rejection
//! - Cached responses survive the file being removed

use axum::http::{header, StatusCode};
use tempfile::TempDir;

use cesium_terrain_server::cache::CacheConfig;
use cesium_terrain_server::server::DEFAULT_LAYER_JSON;
use cesium_terrain_server::tile::BLANK_ROOT_TILE;
use cesium_terrain_server::{create_router, FsStore, RouterConfig};

use super::test_utils::{get, get_ok, send, tile_bytes, write_file};

fn fs_router(dir: &TempDir, config: RouterConfig) -> axum::Router {
    let store = FsStore::new(dir.path()).unwrap();
    create_router(store, config.with_tracing(false))
}

#[tokio::test]
async fn test_layer_json_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "world/layer.json", br#"{"tilejson":"2.1.0"}"#);
    let router = fs_router(&dir, RouterConfig::default());

    let (response, body) = get_ok(&router, "/tilesets/world/layer.json").await;
    assert_eq!(body.as_ref(), br#"{"tilejson":"2.1.0"}"#);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/json"
    );
}

#[tokio::test]
async fn test_default_layer_for_bare_tileset() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("world")).unwrap();
    let router = fs_router(&dir, RouterConfig::default());

    let (_, body) = get_ok(&router, "/tilesets/world/layer.json").await;
    assert_eq!(body.as_ref(), DEFAULT_LAYER_JSON.as_bytes());
}

#[tokio::test]
async fn test_missing_tileset_names_it() {
    let dir = tempfile::tempdir().unwrap();
    let router = fs_router(&dir, RouterConfig::default());

    let (response, body) = send(&router, get("/tilesets/ghost/layer.json")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(String::from_utf8_lossy(&body).contains("ghost"));
}

#[tokio::test]
async fn test_missing_root_tile_is_blank() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "world/layer.json", b"{}");
    let router = fs_router(&dir, RouterConfig::default());

    let (_, body) = get_ok(&router, "/tilesets/world/0/0/0.terrain").await;
    assert_eq!(body.as_ref(), BLANK_ROOT_TILE);
}

#[tokio::test]
async fn test_missing_tile_is_404() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "world/layer.json", b"{}");
    let router = fs_router(&dir, RouterConfig::default());

    let (response, _) = send(&router, get("/tilesets/world/5/3/2.terrain")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tile_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let data = tile_bytes(300);
    write_file(dir.path(), "world/layer.json", b"{}");
    write_file(dir.path(), "world/5/3/2.terrain", &data);
    let router = fs_router(&dir, RouterConfig::default());

    let (response, body) = get_ok(&router, "/tilesets/world/5/3/2.terrain").await;
    assert_eq!(body.as_ref(), data.as_slice());
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");
}

#[tokio::test]
async fn test_metadata_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "world/layer.json", b"{}");
    write_file(dir.path(), "world/metadata.json", br#"{"bounds":[0,0,1,1]}"#);
    let router = fs_router(&dir, RouterConfig::default());

    let (_, body) = get_ok(&router, "/tilesets/world/metadata.json").await;
    assert_eq!(body.as_ref(), br#"{"bounds":[0,0,1,1]}"#);
}

#[tokio::test]
async fn test_traversal_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "root/world/layer.json", b"{}");
    write_file(dir.path(), "layer.json", b"outside");
    let root = dir.path().join("root");
    let store = FsStore::new(&root).unwrap();
    let router = create_router(store, RouterConfig::default().with_tracing(false));

    for uri in [
        "/tilesets/%2E%2E/layer.json",
        "/tilesets/..%2Froot%2Fworld/layer.json",
        "/tilesets/%2E%2E/0/0/0.terrain",
    ] {
        let (response, body) = send(&router, get(uri)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "GET {}", uri);
        assert!(!String::from_utf8_lossy(&body).contains("outside"));
    }
}

#[tokio::test]
async fn test_cached_tile_survives_file_removal() {
    let dir = tempfile::tempdir().unwrap();
    let data = tile_bytes(200);
    write_file(dir.path(), "world/layer.json", b"{}");
    write_file(dir.path(), "world/5/3/2.terrain", &data);
    let router = fs_router(
        &dir,
        RouterConfig::default().with_cache(CacheConfig::new(1024 * 1024, 1024 * 1024)),
    );

    let (_, first) = get_ok(&router, "/tilesets/world/5/3/2.terrain").await;
    std::fs::remove_file(dir.path().join("world/5/3/2.terrain")).unwrap();
    let (_, second) = get_ok(&router, "/tilesets/world/5/3/2.terrain").await;

    assert_eq!(first, second);
    assert_eq!(second.as_ref(), data.as_slice());
}

#[tokio::test]
async fn test_oversized_tile_is_read_each_time() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "world/layer.json", b"{}");
    write_file(dir.path(), "world/5/3/2.terrain", &tile_bytes(200));
    let router = fs_router(
        &dir,
        RouterConfig::default().with_cache(CacheConfig::new(100, 1024 * 1024)),
    );

    get_ok(&router, "/tilesets/world/5/3/2.terrain").await;
    std::fs::remove_file(dir.path().join("world/5/3/2.terrain")).unwrap();

    let (response, _) = send(&router, get("/tilesets/world/5/3/2.terrain")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
