// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

use crate::engines::traits::EngineError;

/// 提取错误类型
///
/// 在任何下载开始之前向调用方报告
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("未找到任何笔记")]
    NoNotesFound,

    #[error("无法提取笔记信息: 未找到标题")]
    NoTitle,

    #[error("页面错误: {0}")]
    Page(#[from] EngineError),
}

/// 下载运行错误类型
#[derive(Error, Debug)]
pub enum RunError {
    #[error("下载已在进行中")]
    InProgress,

    #[error("无效选项: {0}")]
    InvalidOptions(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}
