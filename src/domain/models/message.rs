// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

use crate::domain::models::note::UserInfo;
use crate::domain::models::options::ExtractionOptions;
use crate::domain::models::progress::ProgressState;

/// 控制端发往核心的请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    GetPageInfo {
        #[serde(default)]
        options: Option<ExtractionOptions>,
    },
    StartDownload {
        #[serde(default)]
        options: Option<ExtractionOptions>,
    },
    StopDownload,
}

/// 请求的应答
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_info: Option<UserInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_notes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloaded_notes: Option<usize>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }
}

/// 进度通知负载
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressData {
    pub current: usize,
    pub total: usize,
    pub downloaded_notes: usize,
    pub downloaded_images: usize,
    pub downloaded_videos: usize,
}

/// 完成/停止通知负载
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionData {
    pub total_notes: usize,
    pub total_images: usize,
    pub total_videos: usize,
}

/// 只统计已完整处理的笔记，停止时也是如此
impl From<ProgressState> for CompletionData {
    fn from(state: ProgressState) -> Self {
        Self {
            total_notes: state.downloaded_notes,
            total_images: state.downloaded_images,
            total_videos: state.downloaded_videos,
        }
    }
}

/// 核心向控制端推送的异步通知
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Notification {
    Progress(ProgressData),
    Complete(CompletionData),
    Stopped(CompletionData),
}
