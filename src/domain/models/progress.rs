// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 下载运行进度计数器
///
/// 每次运行开始时重置，运行中递增
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub total_notes: usize,
    pub downloaded_notes: usize,
    pub downloaded_images: usize,
    pub downloaded_videos: usize,
}

/// 运行状态
///
/// 状态转换遵循以下流程：
/// Idle → Running → Completed/Stopped/Failed。
/// 终态等同于空闲：保留上次运行的结果供查询，下次启动直接转为 Running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Completed,
    Stopped,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunStatus::Idle => write!(f, "idle"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Stopped => write!(f, "stopped"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// 一次运行结束时的汇总
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub status: RunStatus,
    pub progress: ProgressState,
}
