// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use xdownloader::domain::models::download_task::{DownloadEvent, DownloadTask};
use xdownloader::domain::repositories::download_bridge::{BridgeError, DownloadBridge};
use xdownloader::infrastructure::download_bridge::HttpDownloadBridge;
use xdownloader::infrastructure::storage::LocalStorage;

fn bridge(dir: &TempDir) -> HttpDownloadBridge {
    HttpDownloadBridge::new(
        reqwest::Client::new(),
        Arc::new(LocalStorage::new(dir.path())),
    )
}

#[tokio::test]
async fn test_remote_download_written_to_storage() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/img/1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"jpeg-bytes".to_vec()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let bridge = bridge(&dir);
    let mut events = bridge.subscribe();

    let task = DownloadTask::remote(
        format!("{}/img/1.jpg", server.uri()),
        "out/2024-03-03_猫/image_1.jpg",
    );
    let id = bridge.download(&task).await.unwrap();
    bridge.wait_idle().await;

    assert_eq!(bridge.in_flight(&id), None);
    assert_eq!(bridge.pending(), 0);
    let written = std::fs::read(dir.path().join("out/2024-03-03_猫/image_1.jpg")).unwrap();
    assert_eq!(written, b"jpeg-bytes");

    match events.recv().await.unwrap() {
        DownloadEvent::Completed { id: done, filename } => {
            assert_eq!(done, id);
            assert_eq!(filename, "out/2024-03-03_猫/image_1.jpg");
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[tokio::test]
async fn test_http_error_interrupts_download() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.mp4"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let bridge = bridge(&dir);
    let mut events = bridge.subscribe();

    let task = DownloadTask::remote(format!("{}/missing.mp4", server.uri()), "out/v.mp4");
    // accepted immediately, fails later
    let id = bridge.download(&task).await.unwrap();
    bridge.wait_idle().await;

    assert_eq!(bridge.in_flight(&id), None);
    assert!(!dir.path().join("out/v.mp4").exists());
    assert!(matches!(
        events.recv().await.unwrap(),
        DownloadEvent::Interrupted { id: failed, .. } if failed == id
    ));
}

#[tokio::test]
async fn test_inline_content_saved() {
    let dir = TempDir::new().unwrap();
    let bridge = bridge(&dir);

    let task = DownloadTask::inline("标题: 猫", "notes/a/note_info.txt");
    bridge.download(&task).await.unwrap();
    bridge.wait_idle().await;

    let text = std::fs::read_to_string(dir.path().join("notes/a/note_info.txt")).unwrap();
    assert_eq!(text, "标题: 猫");
}

#[tokio::test]
async fn test_invalid_requests_rejected_immediately() {
    let dir = TempDir::new().unwrap();
    let bridge = bridge(&dir);

    let escape = DownloadTask::inline("x", "../outside.txt");
    assert!(matches!(
        bridge.download(&escape).await,
        Err(BridgeError::InvalidDestination(_))
    ));

    let blob = DownloadTask::remote("blob:https://www.xiaohongshu.com/abc", "out/v.mp4");
    assert!(matches!(
        bridge.download(&blob).await,
        Err(BridgeError::UnsupportedSource(_))
    ));

    assert_eq!(bridge.pending(), 0);
    bridge.wait_idle().await;
}

#[tokio::test]
async fn test_finished_downloads_are_not_retained() {
    let dir = TempDir::new().unwrap();
    let bridge = bridge(&dir);

    let mut ids = Vec::new();
    for i in 0..50 {
        let task = DownloadTask::inline(format!("note {}", i), format!("notes/{}/note_info.txt", i));
        ids.push(bridge.download(&task).await.unwrap());
    }
    bridge.wait_idle().await;

    assert_eq!(bridge.pending(), 0);
    assert!(ids.iter().all(|id| bridge.in_flight(id).is_none()));
}

#[tokio::test]
async fn test_download_tracked_while_in_flight() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"slow".to_vec())
                .set_delay(std::time::Duration::from_millis(200)),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let bridge = bridge(&dir);

    let task = DownloadTask::remote(format!("{}/slow.jpg", server.uri()), "out/slow.jpg");
    let id = bridge.download(&task).await.unwrap();
    assert_eq!(bridge.in_flight(&id).as_deref(), Some("out/slow.jpg"));
    assert_eq!(bridge.pending(), 1);

    bridge.wait_idle().await;
    assert_eq!(bridge.in_flight(&id), None);
}
