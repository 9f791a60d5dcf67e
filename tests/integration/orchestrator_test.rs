// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use xdownloader::domain::models::download_task::DownloadSource;
use xdownloader::domain::models::message::Notification;
use xdownloader::domain::models::options::ExtractionOptions;
use xdownloader::domain::models::progress::RunStatus;
use xdownloader::engines::static_page::StaticPage;
use xdownloader::utils::errors::{ExtractionError, RunError};
use xdownloader::workers::PacingPolicy;

use super::helpers::{
    options, orchestrator_with, profile_html, RecordingBridge, NOTE_DETAIL_HTML, NOTE_URL,
    PROFILE_URL,
};

const CDN: &str = "https://sns-webpic-qc.xhscdn.com";

#[tokio::test]
async fn test_batch_run_downloads_text_and_images() {
    let bridge = Arc::new(RecordingBridge::new());
    let orchestrator = orchestrator_with(bridge.clone(), PacingPolicy::none());
    let mut notifications = orchestrator.subscribe();
    let page = StaticPage::new(profile_html(CDN, 2), PROFILE_URL);

    let summary = orchestrator.start(&page, options()).await.unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.progress.total_notes, 2);
    assert_eq!(summary.progress.downloaded_notes, 2);
    assert_eq!(summary.progress.downloaded_images, 2);
    assert_eq!(summary.progress.downloaded_videos, 0);
    assert_eq!(orchestrator.status(), RunStatus::Completed);
    assert!(!orchestrator.is_running());

    let tasks = bridge.tasks();
    assert_eq!(tasks.len(), 4);
    assert!(tasks[0].destination.starts_with("out/"));
    assert!(tasks[0].destination.ends_with("_笔记1/note_info.txt"));
    match &tasks[0].source {
        DownloadSource::Inline(bytes) => {
            let text = String::from_utf8(bytes.to_vec()).unwrap();
            assert!(text.starts_with("标题: 笔记1\n作者: 作者\n点赞: 1\n"));
        }
        other => panic!("unexpected source: {:?}", other),
    }
    assert_eq!(
        tasks[1].source,
        DownloadSource::Remote(format!("{}/sns-webpic/note1.jpg", CDN))
    );
    assert!(tasks[1].destination.contains("_笔记1/image_"));
    assert!(tasks[1].destination.ends_with(".jpg"));

    let mut received = Vec::new();
    while let Ok(n) = notifications.try_recv() {
        received.push(n);
    }
    assert_eq!(received.len(), 3);
    match received[1] {
        Notification::Progress(p) => {
            assert_eq!(p.current, 2);
            assert_eq!(p.total, 2);
            assert_eq!(p.downloaded_images, 2);
        }
        other => panic!("unexpected notification: {:?}", other),
    }
    match received[2] {
        Notification::Complete(c) => {
            assert_eq!(c.total_notes, 2);
            assert_eq!(c.total_images, 2);
        }
        other => panic!("unexpected notification: {:?}", other),
    }
}

#[tokio::test]
async fn test_disabled_kinds_are_skipped() {
    let bridge = Arc::new(RecordingBridge::new());
    let orchestrator = orchestrator_with(bridge.clone(), PacingPolicy::none());
    let page = StaticPage::new(profile_html(CDN, 3), PROFILE_URL);

    let opts = ExtractionOptions {
        download_images: false,
        download_text: false,
        ..options()
    };
    let summary = orchestrator.start(&page, opts).await.unwrap();

    assert!(bridge.tasks().is_empty());
    assert_eq!(summary.progress.downloaded_notes, 3);
    assert_eq!(summary.progress.downloaded_images, 0);
}

#[tokio::test]
async fn test_max_notes_limits_run() {
    let bridge = Arc::new(RecordingBridge::new());
    let orchestrator = orchestrator_with(bridge.clone(), PacingPolicy::none());
    let page = StaticPage::new(profile_html(CDN, 5), PROFILE_URL);

    let opts = ExtractionOptions {
        max_notes: Some(2),
        ..options()
    };
    let summary = orchestrator.start(&page, opts).await.unwrap();
    assert_eq!(summary.progress.total_notes, 2);
    assert_eq!(summary.progress.downloaded_notes, 2);
}

#[tokio::test]
async fn test_rejected_media_does_not_abort_run() {
    let bridge = Arc::new(RecordingBridge::rejecting("note1"));
    let orchestrator = orchestrator_with(bridge.clone(), PacingPolicy::none());
    let page = StaticPage::new(profile_html(CDN, 2), PROFILE_URL);

    let summary = orchestrator.start(&page, options()).await.unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.progress.downloaded_notes, 2);
    assert_eq!(summary.progress.downloaded_images, 1);
    // both text files and the second image
    assert_eq!(bridge.tasks().len(), 3);
}

#[tokio::test]
async fn test_empty_page_fails_without_downloads() {
    let bridge = Arc::new(RecordingBridge::new());
    let orchestrator = orchestrator_with(bridge.clone(), PacingPolicy::none());
    let mut notifications = orchestrator.subscribe();
    let page = StaticPage::new("<html><body></body></html>", PROFILE_URL);

    let result = orchestrator.start(&page, options()).await;

    assert!(matches!(
        result,
        Err(RunError::Extraction(ExtractionError::NoNotesFound))
    ));
    assert_eq!(orchestrator.status(), RunStatus::Failed);
    assert!(!orchestrator.is_running());
    assert_eq!(bridge.entered(), 0);
    assert!(matches!(
        notifications.try_recv(),
        Ok(Notification::Complete(c)) if c.total_notes == 0
    ));
}

#[tokio::test]
async fn test_invalid_options_rejected() {
    let bridge = Arc::new(RecordingBridge::new());
    let orchestrator = orchestrator_with(bridge.clone(), PacingPolicy::none());
    let page = StaticPage::new(profile_html(CDN, 1), PROFILE_URL);

    let opts = ExtractionOptions {
        max_notes: Some(0),
        ..options()
    };
    let result = orchestrator.start(&page, opts).await;

    assert!(matches!(result, Err(RunError::InvalidOptions(_))));
    assert_eq!(orchestrator.status(), RunStatus::Idle);
}

#[tokio::test]
async fn test_second_start_rejected_while_running() {
    let gate = Arc::new(Semaphore::new(0));
    let bridge = Arc::new(RecordingBridge::gated(gate.clone()));
    let orchestrator = Arc::new(orchestrator_with(bridge.clone(), PacingPolicy::none()));
    let page = Arc::new(StaticPage::new(profile_html(CDN, 2), PROFILE_URL));

    let first = {
        let orchestrator = orchestrator.clone();
        let page = page.clone();
        tokio::spawn(async move { orchestrator.start(page.as_ref(), options()).await })
    };

    while bridge.entered() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(orchestrator.is_running());
    let before = orchestrator.progress();
    assert_eq!(before.total_notes, 2);

    let second = orchestrator
        .start(
            page.as_ref(),
            ExtractionOptions {
                max_notes: Some(1),
                ..options()
            },
        )
        .await;
    assert!(matches!(second, Err(RunError::InProgress)));
    assert_eq!(orchestrator.progress(), before);
    assert_eq!(orchestrator.status(), RunStatus::Running);

    gate.add_permits(100);
    let summary = first.await.unwrap().unwrap();
    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.progress.downloaded_notes, 2);

    // a finished run frees the slot
    gate.add_permits(100);
    assert!(orchestrator.start(page.as_ref(), options()).await.is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_stop_takes_effect_before_next_note() {
    let bridge = Arc::new(RecordingBridge::new());
    let pacing = PacingPolicy {
        base: Duration::from_secs(10),
        jitter: Duration::ZERO,
    };
    let orchestrator = Arc::new(orchestrator_with(bridge.clone(), pacing));
    let mut notifications = orchestrator.subscribe();
    let page = Arc::new(StaticPage::new(profile_html(CDN, 3), PROFILE_URL));

    let run = {
        let orchestrator = orchestrator.clone();
        let page = page.clone();
        tokio::spawn(async move { orchestrator.start(page.as_ref(), options()).await })
    };

    match notifications.recv().await.unwrap() {
        Notification::Progress(p) => assert_eq!(p.current, 1),
        other => panic!("unexpected notification: {:?}", other),
    }
    assert!(orchestrator.stop());

    let summary = run.await.unwrap().unwrap();
    assert_eq!(summary.status, RunStatus::Stopped);
    assert_eq!(summary.progress.total_notes, 3);
    assert_eq!(summary.progress.downloaded_notes, 1);
    assert_eq!(orchestrator.status(), RunStatus::Stopped);
    assert!(matches!(
        notifications.recv().await.unwrap(),
        Notification::Stopped(c) if c.total_notes == 1 && c.total_images == 1
    ));
    // text + image of the first note only
    assert_eq!(bridge.tasks().len(), 2);
}

#[tokio::test]
async fn test_stop_without_run_is_harmless() {
    let bridge = Arc::new(RecordingBridge::new());
    let orchestrator = orchestrator_with(bridge.clone(), PacingPolicy::none());
    assert!(!orchestrator.stop());

    // the flag is cleared when the next run starts
    let page = StaticPage::new(profile_html(CDN, 1), PROFILE_URL);
    let summary = orchestrator.start(&page, options()).await.unwrap();
    assert_eq!(summary.status, RunStatus::Completed);
}

#[tokio::test]
async fn test_download_current_note() {
    let bridge = Arc::new(RecordingBridge::new());
    let orchestrator = orchestrator_with(bridge.clone(), PacingPolicy::none());
    let page = StaticPage::new(NOTE_DETAIL_HTML, NOTE_URL);

    let summary = orchestrator
        .download_current_note(&page, "single")
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.progress.total_notes, 1);
    assert_eq!(summary.progress.downloaded_notes, 1);
    assert_eq!(summary.progress.downloaded_images, 2);
    assert_eq!(summary.progress.downloaded_videos, 1);

    let destinations = bridge.destinations();
    assert_eq!(destinations.len(), 4);
    assert_eq!(destinations[0], "single/2024-03-03_周末的猫/note_info.txt");
    assert!(destinations[1].starts_with("single/2024-03-03_周末的猫/image_"));
    assert!(destinations[2].ends_with(".png"));
    assert!(destinations[3].starts_with("single/2024-03-03_周末的猫/video_"));
    assert!(destinations[3].ends_with(".mp4"));

    // independent of batch counters
    assert_eq!(orchestrator.status(), RunStatus::Idle);
    assert_eq!(orchestrator.progress().downloaded_notes, 0);
}

#[tokio::test]
async fn test_download_current_note_without_title() {
    let bridge = Arc::new(RecordingBridge::new());
    let orchestrator = orchestrator_with(bridge.clone(), PacingPolicy::none());
    let page = StaticPage::new("<html><body><p>nothing</p></body></html>", NOTE_URL);

    let result = orchestrator.download_current_note(&page, "single").await;
    assert!(matches!(
        result,
        Err(RunError::Extraction(ExtractionError::NoTitle))
    ));
    assert_eq!(bridge.entered(), 0);
}

#[tokio::test]
async fn test_terminal_status_acts_as_idle() {
    let bridge = Arc::new(RecordingBridge::new());
    let orchestrator = orchestrator_with(bridge.clone(), PacingPolicy::none());

    let empty = StaticPage::new("<html><body></body></html>", PROFILE_URL);
    assert!(orchestrator.start(&empty, options()).await.is_err());
    assert_eq!(orchestrator.status(), RunStatus::Failed);
    assert!(!orchestrator.is_running());

    let page = StaticPage::new(profile_html(CDN, 1), PROFILE_URL);
    let summary = orchestrator.start(&page, options()).await.unwrap();
    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(orchestrator.status(), RunStatus::Completed);
    assert_eq!(orchestrator.progress().downloaded_notes, 1);
}
