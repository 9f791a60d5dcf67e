// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::models::download_task::{DownloadId, DownloadTask};

/// 下载桥接错误类型
///
/// 宿主立即报告的错误；编排器把它当作单项下载失败处理
#[derive(Error, Debug)]
pub enum BridgeError {
    /// 来源地址不可下载
    #[error("Unsupported source url: {0}")]
    UnsupportedSource(String),
    /// 目标路径不合法
    #[error("Invalid destination: {0}")]
    InvalidDestination(String),
    /// 宿主拒绝（权限、配额等）
    #[error("Download rejected: {0}")]
    Rejected(String),
}

/// 下载桥接特质
///
/// 把 (来源, 目标路径) 交给宿主的下载设施。
/// 返回值表示下载已开始，而不是字节传输已完成。
#[async_trait]
pub trait DownloadBridge: Send + Sync {
    async fn download(&self, task: &DownloadTask) -> Result<DownloadId, BridgeError>;
}
