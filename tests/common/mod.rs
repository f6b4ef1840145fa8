#![allow(dead_code)]

use serde_json::{json, Value};
use std::time::Duration;
use vodhub::types::Source;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A catalog payload with one title per `(name, play_url)` pair.
pub fn catalog(entries: &[(&str, &str)]) -> Value {
    let list: Vec<Value> = entries
        .iter()
        .enumerate()
        .map(|(i, (name, play_url))| json!({
            "vod_id": i + 1,
            "vod_name": name,
            "vod_pic": format!("http://img.example/{}.jpg", i + 1),
            "vod_play_url": play_url,
            "vod_douban_id": 0,
        }))
        .collect();
    json!({ "code": 1, "msg": "数据列表", "list": list })
}

/// Mount `/api` answering with `body` after `delay`, and return a source pointing at it.
pub async fn catalog_source(server: &MockServer, name: &str, status: u16, body: Value, delay: Duration) -> Source {
    Mock::given(method("GET"))
        .and(path("/api"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body).set_delay(delay))
        .mount(server)
        .await;
    Source::new(name, format!("{}/api", server.uri()))
}

/// A local address nothing is listening on.
pub async fn dead_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api")
}
