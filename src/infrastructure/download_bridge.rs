// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Notify};
use tracing::{debug, warn};

use crate::config::settings::DownloaderSettings;
use crate::domain::models::download_task::{
    DownloadEvent, DownloadId, DownloadSource, DownloadTask,
};
use crate::domain::repositories::download_bridge::{BridgeError, DownloadBridge};
use crate::domain::repositories::storage_repository::StorageRepository;
use crate::infrastructure::storage::validate_key;
use crate::utils::url_utils::is_http_url;

/// 事件通道容量
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// 基于 HTTP 的下载桥接
///
/// `download` 只负责校验并启动传输，字节传输在后台任务中完成，
/// 结果通过事件通道发布
#[derive(Clone)]
pub struct HttpDownloadBridge {
    client: reqwest::Client,
    storage: Arc<dyn StorageRepository>,
    /// 传输中的下载及其目标路径，结束后移除
    active: Arc<DashMap<DownloadId, String>>,
    events: broadcast::Sender<DownloadEvent>,
    pending: Arc<AtomicUsize>,
    idle: Arc<Notify>,
}

impl HttpDownloadBridge {
    pub fn new(client: reqwest::Client, storage: Arc<dyn StorageRepository>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            client,
            storage,
            active: Arc::new(DashMap::new()),
            events,
            pending: Arc::new(AtomicUsize::new(0)),
            idle: Arc::new(Notify::new()),
        }
    }

    /// 由下载器配置创建桥接
    pub fn from_settings(
        settings: &DownloaderSettings,
        storage: Arc<dyn StorageRepository>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(&settings.user_agent)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self::new(client, storage))
    }

    /// 订阅下载事件
    pub fn subscribe(&self) -> broadcast::Receiver<DownloadEvent> {
        self.events.subscribe()
    }

    /// 传输中下载的目标路径
    ///
    /// 结束的下载不再保留，结果只通过事件通道发布
    pub fn in_flight(&self, id: &DownloadId) -> Option<String> {
        self.active.get(id).map(|d| d.value().clone())
    }

    /// 正在传输的下载数量
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// 等待所有已启动的传输结束
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            if self.pending.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    async fn transfer(&self, source: DownloadSource, destination: &str) -> Result<(), String> {
        let data: Bytes = match source {
            DownloadSource::Remote(url) => self
                .client
                .get(&url)
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| e.to_string())?
                .bytes()
                .await
                .map_err(|e| e.to_string())?,
            DownloadSource::Inline(bytes) => bytes,
        };

        self.storage
            .save(destination, &data)
            .await
            .map_err(|e| e.to_string())
    }

    fn finish(&self, id: DownloadId, destination: String, result: Result<(), String>) {
        self.active.remove(&id);
        let event = match result {
            Ok(()) => {
                debug!("Download {} completed: {}", id, destination);
                DownloadEvent::Completed {
                    id,
                    filename: destination,
                }
            }
            Err(reason) => {
                warn!("Download {} interrupted: {}", id, reason);
                DownloadEvent::Interrupted { id, reason }
            }
        };
        // 没有订阅者时发送失败，忽略即可
        let _ = self.events.send(event);

        if self.pending.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.idle.notify_waiters();
        }
    }
}

#[async_trait]
impl DownloadBridge for HttpDownloadBridge {
    async fn download(&self, task: &DownloadTask) -> Result<DownloadId, BridgeError> {
        validate_key(&task.destination)
            .map_err(|_| BridgeError::InvalidDestination(task.destination.clone()))?;

        if let DownloadSource::Remote(url) = &task.source {
            if !is_http_url(url) {
                return Err(BridgeError::UnsupportedSource(url.clone()));
            }
        }

        let id = DownloadId::new();
        self.active.insert(id, task.destination.clone());
        self.pending.fetch_add(1, Ordering::SeqCst);
        debug!("Download {} started: {} -> {}", id, task.source, task.destination);

        let bridge = self.clone();
        let source = task.source.clone();
        let destination = task.destination.clone();
        tokio::spawn(async move {
            let result = bridge.transfer(source, &destination).await;
            bridge.finish(id, destination, result);
        });

        Ok(id)
    }
}
