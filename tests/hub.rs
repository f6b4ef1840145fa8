mod common;

use common::{catalog, catalog_source};
use futures::StreamExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use vodhub::config::SiteConfig;
use vodhub::server::router;
use vodhub::storage::{ConfigStorage, FileStorage};
use vodhub::types::Source;
use vodhub::VodHub;
use wiremock::MockServer;

fn config(sources: Vec<Source>) -> SiteConfig {
    SiteConfig { site_name: "test".into(), timeout: 5, base_urls: sources, ..SiteConfig::default() }
}

/// Serve the router on an ephemeral port and return its base url.
async fn spawn_server(hub: Arc<VodHub>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router(hub)).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn open_uses_stored_config() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("config.json"));
    storage.save(&config(vec![Source::new("a", "http://a.example/api")])).await.unwrap();

    let hub = VodHub::open(storage).await.unwrap();
    assert_eq!(hub.sources(), vec![Source::new("a", "http://a.example/api")]);
    assert_eq!(hub.config().site_name, "test");
}

#[tokio::test]
async fn open_rejects_invalid_stored_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, r#"{"timeout": 5, "base_urls": [{"name": "a", "base_url": "nope"}]}"#).unwrap();
    assert!(VodHub::open(FileStorage::new(path)).await.is_err());
}

#[tokio::test]
async fn search_keeps_its_snapshot_across_updates() {
    let old = MockServer::start().await;
    let new = MockServer::start().await;
    let old_source = catalog_source(&old, "old", 200, catalog(&[("Old", "1$u")]), Duration::from_millis(300)).await;
    let new_source = catalog_source(&new, "new", 200, catalog(&[("New", "1$u")]), Duration::ZERO).await;

    let dir = tempfile::tempdir().unwrap();
    let hub = VodHub::new(config(vec![old_source]), FileStorage::new(dir.path().join("config.json"))).unwrap();

    let in_flight = hub.search("x");
    hub.update_config(config(vec![new_source])).await.unwrap();

    let names: Vec<_> = in_flight.map(|r| r.source_name).collect().await;
    assert_eq!(names, vec!["old"]);

    let names: Vec<_> = hub.search("x").map(|r| r.source_name).collect().await;
    assert_eq!(names, vec!["new"]);
}

#[tokio::test]
async fn failed_persist_keeps_previous_config() {
    let dir = tempfile::tempdir().unwrap();
    // a directory where the file should be makes the final rename fail
    let path = dir.path().join("config.json");
    std::fs::create_dir(&path).unwrap();
    std::fs::write(path.join("occupied"), "x").unwrap();

    let hub = VodHub::new(config(vec![Source::new("a", "http://a/api")]), FileStorage::new(path)).unwrap();
    assert!(hub.update_config(config(vec![Source::new("b", "http://b/api")])).await.is_err());
    assert_eq!(hub.sources()[0].name, "a");
}

#[tokio::test]
async fn search_endpoint_streams_sse() {
    let upstream = MockServer::start().await;
    let source = catalog_source(&upstream, "源一", 200, catalog(&[("剧", "第1集$http://v/1.m3u8")]), Duration::ZERO).await;
    let dir = tempfile::tempdir().unwrap();
    let hub = VodHub::new(config(vec![source]), FileStorage::new(dir.path().join("config.json"))).unwrap();
    let base = spawn_server(Arc::new(hub)).await;

    let client = reqwest::Client::new();
    let response = client.get(format!("{base}/search")).query(&[("keyword", "剧")]).send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert!(response.headers()["content-type"].to_str().unwrap().starts_with("text/event-stream"));

    let body = response.text().await.unwrap();
    let events: Vec<Value> = body
        .lines()
        .filter_map(|l| l.strip_prefix("data: "))
        .map(|d| serde_json::from_str(d).unwrap())
        .collect();
    assert_eq!(events, vec![json!({
        "name": "源一",
        "result": [{
            "name": "剧",
            "vod_pic": "http://img.example/1.jpg",
            "videos": [{"name": "第1集", "video_url": "http://v/1.m3u8"}],
            "vod_id": "1",
            "vod_douban_id": "0"
        }]
    })]);
}

#[tokio::test]
async fn search_endpoint_requires_keyword() {
    let dir = tempfile::tempdir().unwrap();
    let hub = VodHub::new(config(vec![]), FileStorage::new(dir.path().join("config.json"))).unwrap();
    let base = spawn_server(Arc::new(hub)).await;

    for url in [format!("{base}/search"), format!("{base}/search?keyword=%20")] {
        let response = reqwest::get(url).await.unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({"error": "keyword is required"}));
    }
}

#[tokio::test]
async fn config_endpoints_read_and_replace() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let hub = VodHub::new(config(vec![Source::new("a", "http://a/api")]), FileStorage::new(&path)).unwrap();
    let base = spawn_server(Arc::new(hub)).await;
    let client = reqwest::Client::new();

    let current: SiteConfig = client.get(format!("{base}/config")).send().await.unwrap().json().await.unwrap();
    assert_eq!(current.base_urls[0].name, "a");

    let invalid = json!({"timeout": 0, "base_urls": []});
    let response = client.post(format!("{base}/config")).json(&invalid).send().await.unwrap();
    assert_eq!(response.status(), 422);

    let next = config(vec![Source::new("b", "https://b/api")]);
    let response = client.post(format!("{base}/config")).json(&next).send().await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["current_config"]["base_urls"][0]["name"], "b");

    let stored = FileStorage::new(&path).load().await.unwrap();
    assert_eq!(stored, next);
    let current: SiteConfig = client.get(format!("{base}/config")).send().await.unwrap().json().await.unwrap();
    assert_eq!(current, next);
}

#[tokio::test]
async fn cross_origin_requests_are_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let hub = VodHub::new(config(vec![]), FileStorage::new(dir.path().join("config.json"))).unwrap();
    let base = spawn_server(Arc::new(hub)).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/config"))
        .header("origin", "http://frontend.example")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}

#[tokio::test]
async fn preflight_is_answered() {
    let dir = tempfile::tempdir().unwrap();
    let hub = VodHub::new(config(vec![]), FileStorage::new(dir.path().join("config.json"))).unwrap();
    let base = spawn_server(Arc::new(hub)).await;
    let client = reqwest::Client::new();

    for (path, method) in [("/search", "GET"), ("/config", "POST")] {
        let response = client
            .request(reqwest::Method::OPTIONS, format!("{base}{path}"))
            .header("origin", "http://frontend.example")
            .header("access-control-request-method", method)
            .header("access-control-request-headers", "content-type")
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success(), "{path}: {}", response.status());
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
    }
}

#[tokio::test]
async fn client_disconnect_cancels_upstream_requests() {
    // an upstream that accepts the request and never answers
    let upstream = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let upstream_addr = upstream.local_addr().unwrap();
    let source = Source::new("hang", format!("http://{upstream_addr}/api"));

    let dir = tempfile::tempdir().unwrap();
    let mut cfg = config(vec![source]);
    cfg.timeout = 60;
    let hub = VodHub::new(cfg, FileStorage::new(dir.path().join("config.json"))).unwrap();
    let base = spawn_server(Arc::new(hub)).await;
    let host = base.trim_start_matches("http://").to_string();

    let mut client = TcpStream::connect(&host).await.unwrap();
    let request = format!("GET /search?keyword=x HTTP/1.1\r\nHost: {host}\r\nAccept: text/event-stream\r\n\r\n");
    client.write_all(request.as_bytes()).await.unwrap();

    let (mut socket, _) = timeout(Duration::from_secs(5), upstream.accept()).await.unwrap().unwrap();
    let mut buf = vec![0u8; 4096];
    let n = timeout(Duration::from_secs(5), socket.read(&mut buf)).await.unwrap().unwrap();
    assert!(String::from_utf8_lossy(&buf[..n]).starts_with("GET /api?ac=detail&wd=x"));

    drop(client);

    let closed = timeout(Duration::from_secs(10), async {
        loop {
            match socket.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(_) => continue,
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "upstream request still open after the client went away");
}
