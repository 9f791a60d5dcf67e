// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, warn};

use crate::domain::models::download_task::DownloadEvent;

/// 通知统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotificationTally {
    pub completed: usize,
    pub interrupted: usize,
    /// 因接收过慢被跳过的事件数
    pub lagged: u64,
}

/// 下载通知工作器
///
/// 监听下载桥接的状态事件，向用户报告完成或失败。
/// 不影响任何计数器
pub struct NotificationWorker {
    events: broadcast::Receiver<DownloadEvent>,
}

impl NotificationWorker {
    pub fn new(events: broadcast::Receiver<DownloadEvent>) -> Self {
        Self { events }
    }

    pub fn name(&self) -> &str {
        "notification"
    }

    /// 运行直到事件通道关闭
    pub async fn run(mut self) -> NotificationTally {
        info!("Notification worker started");
        let mut tally = NotificationTally::default();

        loop {
            match self.events.recv().await {
                Ok(DownloadEvent::Completed { id, filename }) => {
                    tally.completed += 1;
                    info!(download_id = %id, "下载完成: {}", filename);
                }
                Ok(DownloadEvent::Interrupted { id, reason }) => {
                    tally.interrupted += 1;
                    warn!(download_id = %id, "下载失败: {}", reason);
                }
                Err(RecvError::Lagged(skipped)) => {
                    tally.lagged += skipped;
                    warn!("Notification worker lagged, {} events skipped", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }

        info!(
            "Notification worker stopped: {} completed, {} interrupted",
            tally.completed, tally.interrupted
        );
        tally
    }
}
