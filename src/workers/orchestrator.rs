// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::counter;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};
use validator::Validate;

use crate::domain::models::download_task::DownloadTask;
use crate::domain::models::message::{CompletionData, Notification, ProgressData};
use crate::domain::models::note::{Note, UserInfo};
use crate::domain::models::options::ExtractionOptions;
use crate::domain::models::progress::{ProgressState, RunStatus, RunSummary};
use crate::domain::repositories::download_bridge::DownloadBridge;
use crate::domain::services::classifier::{filter_media_files, MediaKind};
use crate::domain::services::extractor::NoteExtractor;
use crate::engines::traits::PageSession;
use crate::infrastructure::metrics::{MEDIA_DOWNLOADED, MEDIA_FAILED, NOTES_PROCESSED, RUNS};
use crate::utils::errors::{ExtractionError, RunError};
use crate::utils::filename::media_filename;

/// 通知通道容量
const NOTIFICATION_CHANNEL_CAPACITY: usize = 64;

/// 页面信息查询时的默认笔记数量
const DEFAULT_PAGE_INFO_NOTES: usize = 10;

/// 笔记文本文件名
pub const NOTE_INFO_FILENAME: &str = "note_info.txt";

/// 笔记之间的节奏延迟
///
/// 实际延迟为 `base + [0, jitter]` 内的随机值
#[derive(Debug, Clone, Copy)]
pub struct PacingPolicy {
    pub base: Duration,
    pub jitter: Duration,
}

impl PacingPolicy {
    /// 1 到 3 秒
    pub fn standard() -> Self {
        Self {
            base: Duration::from_millis(1000),
            jitter: Duration::from_millis(2000),
        }
    }

    pub fn none() -> Self {
        Self {
            base: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.jitter.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::random_range(0..=jitter_ms)
        };
        self.base + Duration::from_millis(extra)
    }
}

impl Default for PacingPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// 一次下载运行的上下文
///
/// 取消标志、进度计数器与通知通道都通过它显式传递
#[derive(Clone)]
pub struct RunContext {
    pub options: ExtractionOptions,
    pub cancel: Arc<AtomicBool>,
    pub progress: Arc<Mutex<ProgressState>>,
    pub notifications: broadcast::Sender<Notification>,
}

impl RunContext {
    /// 独立的上下文，不与编排器共享计数器
    pub fn detached(options: ExtractionOptions) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        Self {
            options,
            cancel: Arc::new(AtomicBool::new(false)),
            progress: Arc::new(Mutex::new(ProgressState::default())),
            notifications,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    pub fn progress(&self) -> ProgressState {
        *self.progress.lock()
    }

    fn update(&self, f: impl FnOnce(&mut ProgressState)) {
        f(&mut self.progress.lock());
    }

    fn notify(&self, notification: Notification) {
        // 没有订阅者时发送失败，忽略即可
        let _ = self.notifications.send(notification);
    }
}

/// 运行标志的守卫，释放时清除标志
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// 页面信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageInfo {
    pub note_count: usize,
    pub user_info: UserInfo,
}

/// 下载编排器
///
/// 状态转换：Idle → Running → Completed/Stopped/Failed。
/// 同一时间只允许一次批量运行
pub struct DownloadOrchestrator {
    extractor: Arc<NoteExtractor>,
    bridge: Arc<dyn DownloadBridge>,
    pacing: PacingPolicy,
    running: AtomicBool,
    status: Mutex<RunStatus>,
    cancel: Arc<AtomicBool>,
    progress: Arc<Mutex<ProgressState>>,
    notifications: broadcast::Sender<Notification>,
}

impl DownloadOrchestrator {
    pub fn new(
        extractor: Arc<NoteExtractor>,
        bridge: Arc<dyn DownloadBridge>,
        pacing: PacingPolicy,
    ) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_CHANNEL_CAPACITY);
        Self {
            extractor,
            bridge,
            pacing,
            running: AtomicBool::new(false),
            status: Mutex::new(RunStatus::Idle),
            cancel: Arc::new(AtomicBool::new(false)),
            progress: Arc::new(Mutex::new(ProgressState::default())),
            notifications,
        }
    }

    /// 订阅进度与完成通知
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn progress(&self) -> ProgressState {
        *self.progress.lock()
    }

    /// 当前状态；运行结束后停留在终态，直到下次启动
    pub fn status(&self) -> RunStatus {
        *self.status.lock()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// 请求停止当前运行
    ///
    /// 在处理下一篇笔记之前生效；返回是否有运行中的任务
    pub fn stop(&self) -> bool {
        self.cancel.store(true, Ordering::SeqCst);
        let running = self.is_running();
        info!("Stop requested (running: {})", running);
        running
    }

    /// 查询页面上的笔记数量与用户信息
    pub async fn page_info(
        &self,
        page: &dyn PageSession,
        options: Option<ExtractionOptions>,
    ) -> Result<PageInfo, ExtractionError> {
        let mut options = options.unwrap_or_default();
        if options.max_notes.is_none() {
            options.max_notes = Some(DEFAULT_PAGE_INFO_NOTES);
        }

        let notes = self.extractor.extract_notes(page, &options).await?;
        let user_info = self.extractor.user_info(page).await?;

        Ok(PageInfo {
            note_count: notes.len(),
            user_info,
        })
    }

    /// 开始批量下载
    ///
    /// 已有运行时返回 `RunError::InProgress`，且不重置计数器
    #[instrument(skip(self, page, options), fields(engine = page.name()))]
    pub async fn start(
        &self,
        page: &dyn PageSession,
        options: ExtractionOptions,
    ) -> Result<RunSummary, RunError> {
        options
            .validate()
            .map_err(|e| RunError::InvalidOptions(e.to_string()))?;

        let Some(_guard) = RunGuard::acquire(&self.running) else {
            warn!("Rejected start request: a download is already running");
            return Err(RunError::InProgress);
        };

        self.cancel.store(false, Ordering::SeqCst);
        *self.progress.lock() = ProgressState::default();
        self.set_status(RunStatus::Running);

        let ctx = RunContext {
            options,
            cancel: self.cancel.clone(),
            progress: self.progress.clone(),
            notifications: self.notifications.clone(),
        };

        let notes = match self.extractor.extract_notes(page, &ctx.options).await {
            Ok(notes) if notes.is_empty() => Err(ExtractionError::NoNotesFound),
            other => other,
        };
        let notes = match notes {
            Ok(notes) => notes,
            Err(e) => {
                error!("Note extraction failed: {}", e);
                self.finish(&ctx, RunStatus::Failed);
                return Err(e.into());
            }
        };

        ctx.update(|p| p.total_notes = notes.len());
        info!("Starting download of {} notes", notes.len());

        let status = self.download_notes(&ctx, &notes).await;
        let progress = self.finish(&ctx, status);

        Ok(RunSummary { status, progress })
    }

    /// 逐篇下载笔记
    ///
    /// 每篇笔记之前检查取消标志；最后一篇之后不再等待
    pub async fn download_notes(&self, ctx: &RunContext, notes: &[Note]) -> RunStatus {
        let total = notes.len();

        for (index, note) in notes.iter().enumerate() {
            if ctx.is_cancelled() {
                info!("Download stopped before note {}/{}", index + 1, total);
                return RunStatus::Stopped;
            }

            info!(
                "Downloading note {}/{}: {} ({} images, {} videos)",
                index + 1,
                total,
                note.title,
                note.images.len(),
                note.videos.len()
            );

            self.download_note(ctx, note).await;
            ctx.update(|p| p.downloaded_notes += 1);
            counter!(NOTES_PROCESSED).increment(1);

            let progress = ctx.progress();
            ctx.notify(Notification::Progress(ProgressData {
                current: index + 1,
                total,
                downloaded_notes: progress.downloaded_notes,
                downloaded_images: progress.downloaded_images,
                downloaded_videos: progress.downloaded_videos,
            }));

            if index + 1 < total {
                let delay = self.pacing.next_delay();
                debug!("Pacing for {:?}", delay);
                tokio::time::sleep(delay).await;
            }
        }

        RunStatus::Completed
    }

    /// 下载单篇笔记：文本、过滤后的图片与视频
    ///
    /// 单项失败只记录日志，不影响其他项
    pub async fn download_note(&self, ctx: &RunContext, note: &Note) {
        let folder = format!("{}/{}", ctx.options.output_dir, note.folder_name());

        if ctx.options.download_text {
            let task = DownloadTask::inline(
                note.info_text(),
                format!("{}/{}", folder, NOTE_INFO_FILENAME),
            );
            if let Err(e) = self.bridge.download(&task).await {
                warn!("Failed to save note text for {}: {}", note.title, e);
            }
        }

        if ctx.options.download_images && !note.images.is_empty() {
            let images = filter_media_files(note.images.clone(), MediaKind::Image);
            debug!("{} of {} images kept", images.len(), note.images.len());
            for image in images {
                let name = media_filename("image", &image.url, ".jpg");
                if self
                    .dispatch(MediaKind::Image, &image.url, format!("{}/{}", folder, name))
                    .await
                {
                    ctx.update(|p| p.downloaded_images += 1);
                }
            }
        }

        if ctx.options.download_videos && !note.videos.is_empty() {
            let videos = filter_media_files(note.videos.clone(), MediaKind::Video);
            debug!("{} of {} videos kept", videos.len(), note.videos.len());
            for video in videos {
                let name = media_filename("video", &video.url, ".mp4");
                if self
                    .dispatch(MediaKind::Video, &video.url, format!("{}/{}", folder, name))
                    .await
                {
                    ctx.update(|p| p.downloaded_videos += 1);
                }
            }
        }
    }

    async fn dispatch(&self, kind: MediaKind, url: &str, destination: String) -> bool {
        let kind_label = kind.to_string();
        match self
            .bridge
            .download(&DownloadTask::remote(url, destination))
            .await
        {
            Ok(id) => {
                debug!("Download {} accepted for {}", id, url);
                counter!(MEDIA_DOWNLOADED, "kind" => kind_label).increment(1);
                true
            }
            Err(e) => {
                warn!("Failed to download {} {}: {}", kind, url, e);
                counter!(MEDIA_FAILED, "kind" => kind_label).increment(1);
                false
            }
        }
    }

    /// 下载当前查看的笔记
    ///
    /// 所有类型都启用，使用独立的计数器
    #[instrument(skip(self, page, output_dir), fields(engine = page.name()))]
    pub async fn download_current_note(
        &self,
        page: &dyn PageSession,
        output_dir: &str,
    ) -> Result<RunSummary, RunError> {
        let note = self
            .extractor
            .extract_current_note(page)
            .await?
            .ok_or(ExtractionError::NoTitle)?;

        info!("Downloading current note: {}", note.title);
        let ctx = RunContext::detached(ExtractionOptions::single_note(output_dir));
        ctx.update(|p| p.total_notes = 1);

        self.download_note(&ctx, &note).await;
        ctx.update(|p| p.downloaded_notes += 1);

        let progress = ctx.progress();
        info!(
            "Note saved to {}/{}: {} images, {} videos",
            output_dir,
            note.folder_name(),
            progress.downloaded_images,
            progress.downloaded_videos
        );
        Ok(RunSummary {
            status: RunStatus::Completed,
            progress,
        })
    }

    fn set_status(&self, status: RunStatus) {
        *self.status.lock() = status;
    }

    fn finish(&self, ctx: &RunContext, status: RunStatus) -> ProgressState {
        self.set_status(status);
        counter!(RUNS, "status" => status.to_string()).increment(1);

        let progress = ctx.progress();
        let data = CompletionData::from(progress);
        ctx.notify(match status {
            RunStatus::Stopped => Notification::Stopped(data),
            _ => Notification::Complete(data),
        });

        info!(
            "Run {}: {}/{} notes, {} images, {} videos",
            status,
            progress.downloaded_notes,
            progress.total_notes,
            progress.downloaded_images,
            progress.downloaded_videos
        );
        progress
    }
}
