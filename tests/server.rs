//! HTTP API tests against an in-process server on an ephemeral port.
//!
//! The language model is disabled, so every long query takes the local
//! fallback and chat answers with the fixed connection-lost reply.

use std::sync::Arc;

use nexus_core::catalog::Catalog;
use nexus_core::chat::CONNECTION_LOST_REPLY;
use nexus_core::kv::MemoryStore;
use river_nexus::app::App;
use river_nexus::config::Config;
use river_nexus::llm::DisabledProvider;
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn start() -> String {
    let app = App::assemble(
        Config::minimal("unused.json"),
        Catalog::builtin(),
        Arc::new(DisabledProvider),
        Arc::new(MemoryStore::new()),
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(river_nexus::server::serve(listener, Arc::new(app)));
    format!("http://{}", addr)
}

async fn get(url: String) -> (u16, Value) {
    let resp = reqwest::get(url).await.unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

async fn post(url: String, body: Value) -> (u16, Value) {
    let resp = reqwest::Client::new()
        .post(url)
        .json(&body)
        .send()
        .await
        .unwrap();
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap())
}

#[tokio::test]
async fn health_reports_version() {
    let base = start().await;
    let (status, body) = get(format!("{}/health", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn tools_grouped_in_enumeration_order() {
    let base = start().await;
    let (status, body) = get(format!("{}/tools", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["category"], "all");
    assert_eq!(body["count"], Catalog::builtin().len());

    let slugs: Vec<&str> = body["groups"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["category"].as_str().unwrap())
        .collect();
    assert_eq!(
        slugs,
        vec!["development", "creative", "productivity", "ai", "utilities", "personal"]
    );
}

#[tokio::test]
async fn tools_filtered_by_category_rejects_unknown() {
    let base = start().await;
    let (status, body) = get(format!("{}/tools?category=creative", base)).await;
    assert_eq!(status, 200);
    assert_eq!(body["groups"].as_array().unwrap().len(), 1);
    assert_eq!(body["groups"][0]["label"], "创意");

    let (status, body) = get(format!("{}/tools?category=games", base)).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn search_falls_back_locally() {
    let base = start().await;
    let (status, body) = post(format!("{}/search", base), json!({"query": "deepseek"})).await;
    assert_eq!(status, 200);
    assert_eq!(body["path"], "remote_failed");
    assert_eq!(body["items"][0]["id"], "deepseek-chat");
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn search_short_query_within_category() {
    let base = start().await;
    let (status, body) = post(
        format!("{}/search", base),
        json!({"query": "UI", "category": "creative"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["path"], "short_query");
    let ids: Vec<&str> = body["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["figma-design", "dribbble-insp"]);
}

#[tokio::test]
async fn search_rejects_malformed_body() {
    let base = start().await;
    let (status, body) = post(format!("{}/search", base), json!({"text": "x"})).await;
    assert_eq!(status, 400);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn chat_failure_is_friendly_reply() {
    let base = start().await;
    let (status, body) = post(
        format!("{}/chat", base),
        json!({"history": [{"role": "assistant", "content": "hi"}], "message": "推荐笔记工具"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["reply"], CONNECTION_LOST_REPLY);

    let (status, _) = post(format!("{}/chat", base), json!({"message": "   "})).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn favorites_usage_and_hot_stats() {
    let base = start().await;

    let (status, body) = post(format!("{}/prefs/favorites/kimi-ai", base), json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"id": "kimi-ai", "favorite": true}));

    for _ in 0..2 {
        post(format!("{}/prefs/usage/suno-music", base), json!({})).await;
    }
    let (status, prefs) = post(format!("{}/prefs/usage/kimi-ai", base), json!({})).await;
    assert_eq!(status, 200);
    assert_eq!(prefs["recentlyUsed"][0]["toolId"], "kimi-ai");
    assert_eq!(prefs["recentlyUsed"][1]["count"], 2);

    let (_, prefs) = get(format!("{}/prefs", base)).await;
    assert_eq!(prefs["favorites"], json!(["kimi-ai"]));

    let (status, hot) = get(format!("{}/stats/hot?limit=1", base)).await;
    assert_eq!(status, 200);
    assert_eq!(hot["tools"], json!([{"id": "suno-music", "clicks": 2}]));
}

#[tokio::test]
async fn unknown_tool_is_not_found() {
    let base = start().await;
    let (status, body) = post(format!("{}/prefs/usage/nope", base), json!({})).await;
    assert_eq!(status, 404);
    assert_eq!(body["error"]["code"], "not_found");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_usage_requests_all_count() {
    let base = start().await;

    let mut handles = Vec::new();
    for _ in 0..24 {
        let url = format!("{}/prefs/usage/kimi-ai", base);
        handles.push(tokio::spawn(async move { post(url, json!({})).await.0 }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap(), 200);
    }

    let (_, hot) = get(format!("{}/stats/hot", base)).await;
    assert_eq!(hot["tools"], json!([{"id": "kimi-ai", "clicks": 24}]));
    let (_, prefs) = get(format!("{}/prefs", base)).await;
    assert_eq!(prefs["recentlyUsed"][0]["count"], 24);
}
