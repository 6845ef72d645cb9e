use std::fs;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;

use ainstein::assistant::Assistant;
use ainstein::{loader, server};
use ainstein_core::repository::ModelRepository;

const MODEL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<archimate:model xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:archimate="http://www.archimatetool.com/archimate" name="ArchiMetal" id="m-1">
  <folder name="Business" id="f-b" type="business">
    <element xsi:type="archimate:BusinessActor" name="ArchiMetal" id="a-1"/>
    <element xsi:type="archimate:BusinessActor" name="DC Benelux" id="a-2"/>
    <element xsi:type="archimate:BusinessActor" name="DC Spain" id="a-3"/>
    <element xsi:type="archimate:BusinessFunction" name="Sales" id="f-1"/>
  </folder>
  <folder name="Relations" id="f-r" type="relations">
    <element xsi:type="archimate:CompositionRelationship" id="r-1" source="a-1" target="a-2"/>
  </folder>
</archimate:model>
"#;

async fn spawn(repo: ModelRepository) -> SocketAddr {
    let app = server::router(Assistant::new(Arc::new(repo)));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn spawn_with_model() -> (TempDir, SocketAddr) {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("archimetal.archimate"), MODEL).unwrap();
    let mut repo = ModelRepository::new();
    loader::load_into(&mut repo, tmp.path()).unwrap();
    let addr = spawn(repo).await;
    (tmp, addr)
}

#[tokio::test]
async fn test_health() {
    let (_tmp, addr) = spawn_with_model().await;
    let body: serde_json::Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["models"], 1);
}

#[tokio::test]
async fn test_chat_answers_with_validation() {
    let (_tmp, addr) = spawn_with_model().await;
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("http://{addr}/chat"))
        .json(&serde_json::json!({ "query": "how many business actors" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["answer"], "There are **3 business actors** in the loaded models.");
    assert_eq!(body["intent"]["element_type"], "actor");
    assert_eq!(body["validation"]["is_valid"], true);
    assert_eq!(body["corrected"], false);
}

#[tokio::test]
async fn test_chat_rejects_empty_query() {
    let (_tmp, addr) = spawn_with_model().await;
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/chat"))
        .json(&serde_json::json!({ "query": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_counts() {
    let (_tmp, addr) = spawn_with_model().await;
    let body: serde_json::Value = reqwest::get(format!("http://{addr}/counts"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["business_actors"], 3);
    assert_eq!(body["business_functions"], 1);
    assert_eq!(body["total"], 4);
    assert_eq!(body["internal_actors"], 1);
    assert_eq!(body["departments"], 1);
    assert_eq!(body["external_actors"], 1);
}

#[tokio::test]
async fn test_counts_without_models() {
    let addr = spawn(ModelRepository::new()).await;
    let resp = reqwest::get(format!("http://{addr}/counts")).await.unwrap();
    assert_eq!(resp.status(), 503);

    let body: serde_json::Value = reqwest::Client::new()
        .post(format!("http://{addr}/chat"))
        .json(&serde_json::json!({ "query": "list business actors" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(body["answer"].as_str().unwrap().starts_with("No models are loaded"));
}

#[tokio::test]
async fn test_models_endpoint() {
    let (_tmp, addr) = spawn_with_model().await;
    let body: serde_json::Value = reqwest::get(format!("http://{addr}/models"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["models"][0]["name"], "ArchiMetal");
    assert_eq!(body["models"][0]["elements"], 4);
    assert_eq!(body["models"][0]["relationships"], 1);
}
