// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{json, Value};
use std::sync::Arc;

use xdownloader::engines::static_page::StaticPage;
use xdownloader::presentation::handlers::message_handler::AppState;
use xdownloader::presentation::routes;
use xdownloader::workers::PacingPolicy;

use super::helpers::{options, orchestrator_with, profile_html, RecordingBridge, PROFILE_URL};

fn server_for(html: String) -> (TestServer, Arc<RecordingBridge>) {
    let bridge = Arc::new(RecordingBridge::new());
    let state = Arc::new(AppState {
        orchestrator: Arc::new(orchestrator_with(bridge.clone(), PacingPolicy::none())),
        page: Arc::new(StaticPage::new(html, PROFILE_URL)),
        defaults: options(),
    });
    let server = TestServer::new(routes::routes(state)).unwrap();
    (server, bridge)
}

fn profile_server() -> (TestServer, Arc<RecordingBridge>) {
    server_for(profile_html("https://sns-webpic-qc.xhscdn.com", 2))
}

#[tokio::test]
async fn test_health_and_version() {
    let (server, _) = profile_server();

    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("OK");

    let version: Value = server.get("/v1/version").await.json();
    assert_eq!(version["name"], "xdownloader");
}

#[tokio::test]
async fn test_get_page_info_message() {
    let (server, _) = profile_server();

    let response = server
        .post("/v1/messages")
        .json(&json!({"action": "getPageInfo", "options": {"autoScroll": false}}))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["noteCount"], 2);
    assert_eq!(body["userInfo"]["nickname"], "猫主子");
    assert_eq!(body["userInfo"]["userId"], "123456");
}

#[tokio::test]
async fn test_start_download_message() {
    let (server, bridge) = profile_server();

    let body: Value = server
        .post("/v1/messages")
        .json(&json!({"action": "startDownload"}))
        .await
        .json();
    assert_eq!(
        body,
        json!({"success": true, "totalNotes": 2, "downloadedNotes": 2})
    );
    assert_eq!(bridge.tasks().len(), 4);

    let progress: Value = server.get("/v1/progress").await.json();
    assert_eq!(progress["status"], "completed");
    assert_eq!(progress["progress"]["downloadedImages"], 2);
}

#[tokio::test]
async fn test_start_download_failure_reported() {
    let (server, bridge) = server_for("<html><body></body></html>".to_string());

    let body: Value = server
        .post("/v1/messages")
        .json(&json!({"action": "startDownload", "options": {"autoScroll": false}}))
        .await
        .json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "未找到任何笔记");
    assert_eq!(bridge.entered(), 0);
}

#[tokio::test]
async fn test_stop_and_unknown_messages() {
    let (server, _) = profile_server();

    let body: Value = server
        .post("/v1/messages")
        .json(&json!({"action": "stopDownload"}))
        .await
        .json();
    assert_eq!(body, json!({"success": true}));

    let body: Value = server
        .post("/v1/messages")
        .json(&json!({"action": "dance"}))
        .await
        .json();
    assert_eq!(body, json!({"success": false, "error": "未知操作"}));

    let body: Value = server
        .post("/v1/messages")
        .json(&json!({"options": {}}))
        .await
        .json();
    assert_eq!(body["error"], "未知操作");
}

#[tokio::test]
async fn test_page_info_endpoint() {
    let (server, _) = profile_server();
    let body: Value = server.get("/v1/page-info").await.json();
    assert_eq!(body["noteCount"], 2);

    let (server, _) = server_for("<html><body></body></html>".to_string());
    let response = server.get("/v1/page-info").await;
    response.assert_status(StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["noteCount"], 0);
}
