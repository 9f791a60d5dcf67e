// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 下载编排（批量运行、停止、单篇下载）与下载状态通知
pub mod notification_worker;
pub mod orchestrator;

pub use notification_worker::NotificationWorker;
pub use orchestrator::{DownloadOrchestrator, PacingPolicy, RunContext};
