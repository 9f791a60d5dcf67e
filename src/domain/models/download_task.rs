// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use bytes::Bytes;
use std::fmt;
use uuid::Uuid;

/// 下载内容来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadSource {
    /// 远程地址
    Remote(String),
    /// 本地生成的内容（例如笔记文本）
    Inline(Bytes),
}

impl fmt::Display for DownloadSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DownloadSource::Remote(url) => write!(f, "{}", url),
            DownloadSource::Inline(bytes) => write!(f, "inline:{}B", bytes.len()),
        }
    }
}

/// 下载任务: (来源, 目标路径)
///
/// 每个通过过滤的媒体项对应一个，桥接确认后即丢弃
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub source: DownloadSource,
    /// 相对下载根目录的目标路径，使用 `/` 分隔
    pub destination: String,
}

impl DownloadTask {
    pub fn remote(url: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: DownloadSource::Remote(url.into()),
            destination: destination.into(),
        }
    }

    pub fn inline(content: impl Into<Bytes>, destination: impl Into<String>) -> Self {
        Self {
            source: DownloadSource::Inline(content.into()),
            destination: destination.into(),
        }
    }
}

/// 宿主下载标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DownloadId(pub Uuid);

impl DownloadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DownloadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 下载状态变化事件，仅用于用户通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    Completed { id: DownloadId, filename: String },
    Interrupted { id: DownloadId, reason: String },
}
