// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

use xdownloader::domain::models::download_task::{DownloadId, DownloadSource, DownloadTask};
use xdownloader::domain::models::options::ExtractionOptions;
use xdownloader::domain::repositories::download_bridge::{BridgeError, DownloadBridge};
use xdownloader::domain::services::extractor::NoteExtractor;
use xdownloader::workers::{DownloadOrchestrator, PacingPolicy};

pub const PROFILE_URL: &str = "https://www.xiaohongshu.com/user/profile/5f00";
pub const NOTE_URL: &str = "https://www.xiaohongshu.com/explore/66aa";

/// 记录所有下载任务的桥接
///
/// 可选地拒绝匹配的来源，或在信号量上阻塞
#[derive(Default)]
pub struct RecordingBridge {
    tasks: Mutex<Vec<DownloadTask>>,
    reject_containing: Option<String>,
    gate: Option<Arc<Semaphore>>,
    entered: AtomicUsize,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(pattern: &str) -> Self {
        Self {
            reject_containing: Some(pattern.to_string()),
            ..Self::default()
        }
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub fn tasks(&self) -> Vec<DownloadTask> {
        self.tasks.lock().clone()
    }

    pub fn destinations(&self) -> Vec<String> {
        self.tasks().into_iter().map(|t| t.destination).collect()
    }

    /// 进入过 `download` 的调用次数
    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DownloadBridge for RecordingBridge {
    async fn download(&self, task: &DownloadTask) -> Result<DownloadId, BridgeError> {
        self.entered.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| BridgeError::Rejected(e.to_string()))?
                .forget();
        }

        if let (Some(pattern), DownloadSource::Remote(url)) = (&self.reject_containing, &task.source)
        {
            if url.contains(pattern.as_str()) {
                return Err(BridgeError::Rejected("quota exceeded".to_string()));
            }
        }

        self.tasks.lock().push(task.clone());
        Ok(DownloadId::new())
    }
}

pub fn orchestrator_with(bridge: Arc<dyn DownloadBridge>, pacing: PacingPolicy) -> DownloadOrchestrator {
    DownloadOrchestrator::new(Arc::new(NoteExtractor::with_defaults(true)), bridge, pacing)
}

/// 不滚动、输出到 `out` 的选项
pub fn options() -> ExtractionOptions {
    ExtractionOptions {
        max_notes: Some(10),
        output_dir: "out".to_string(),
        auto_scroll: false,
        ..Default::default()
    }
}

/// 主页 HTML，每篇笔记带一张封面图
pub fn profile_html(image_host: &str, count: usize) -> String {
    let cards: String = (1..=count)
        .map(|i| {
            format!(
                r#"<section class="note-item">
  <a href="/explore/note{i}"><img src="{image_host}/sns-webpic/note{i}.jpg" alt="封面{i}"></a>
  <div class="title">笔记{i}</div>
  <span class="like-count">{i}</span>
  <span class="author">作者</span>
</section>"#
            )
        })
        .collect();
    format!(
        "<html><head><title>猫主子 - 小红书</title></head><body>\
         <div>小红书号：123456</div>{cards}</body></html>"
    )
}

/// 笔记详情页 HTML
pub const NOTE_DETAIL_HTML: &str = r#"<html><head><title>备用 - 小红书</title></head><body>
<div class="note-detail-mask">
  <div class="note-container">
    <div class="slider-container">
      <img src="https://sns-webpic-qc.xhscdn.com/a?format=webp" alt="">
      <img src="https://cdn.example.com/photo.png" width="1080" height="1440">
      <img src="https://cdn.example.com/tiny.jpg" width="50" height="50">
    </div>
    <div id="detail-title" class="title">周末的猫</div>
    <span class="date">编辑于 2024-03-03</span>
    <span class="username">作者B</span>
    <div id="detail-desc" class="desc">正文内容</div>
    <video src="https://v.example/detail.mp4"></video>
  </div>
</div>
</body></html>"#;
