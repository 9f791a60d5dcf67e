// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use xdownloader::domain::models::progress::RunStatus;
use xdownloader::engines::static_page::StaticPage;
use xdownloader::infrastructure::download_bridge::HttpDownloadBridge;
use xdownloader::infrastructure::storage::LocalStorage;
use xdownloader::workers::{NotificationWorker, PacingPolicy};

use super::helpers::{options, orchestrator_with, profile_html, PROFILE_URL};

#[tokio::test]
async fn test_profile_run_writes_note_folders() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"image".to_vec()))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let bridge = Arc::new(HttpDownloadBridge::new(
        reqwest::Client::new(),
        Arc::new(LocalStorage::new(dir.path())),
    ));
    let notifier = tokio::spawn(NotificationWorker::new(bridge.subscribe()).run());

    let orchestrator = orchestrator_with(bridge.clone(), PacingPolicy::none());
    let page = StaticPage::new(profile_html(&server.uri(), 2), PROFILE_URL);

    let summary = orchestrator.start(&page, options()).await.unwrap();
    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.progress.downloaded_images, 2);
    bridge.wait_idle().await;

    let mut folders: Vec<_> = std::fs::read_dir(dir.path().join("out"))
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .collect();
    folders.sort();
    assert_eq!(folders.len(), 2);
    assert!(folders[0].ends_with("_笔记1"));

    let folder = dir.path().join("out").join(&folders[0]);
    let text = std::fs::read_to_string(folder.join("note_info.txt")).unwrap();
    assert!(text.contains("标题: 笔记1"));

    let images: Vec<_> = std::fs::read_dir(&folder)
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|name| name.starts_with("image_"))
        .collect();
    assert_eq!(images.len(), 1);
    assert_eq!(std::fs::read(folder.join(&images[0])).unwrap(), b"image");

    drop(orchestrator);
    drop(bridge);
    let tally = notifier.await.unwrap();
    assert_eq!(tally.completed, 4);
    assert_eq!(tally.interrupted, 0);
}
