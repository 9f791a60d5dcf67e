// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 提取与下载选项
///
/// 与消息协议中的 `options` 字段一一对应
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtractionOptions {
    /// 最多收集的笔记数量
    #[validate(range(min = 1, max = 500))]
    pub max_notes: Option<usize>,
    /// 输出目录前缀
    #[validate(length(min = 1))]
    pub output_dir: String,
    pub download_images: bool,
    pub download_videos: bool,
    pub download_text: bool,
    /// 提取前是否触发滚动加载
    pub auto_scroll: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            max_notes: Some(10),
            output_dir: "小红书笔记".to_string(),
            download_images: true,
            download_videos: true,
            download_text: true,
            auto_scroll: true,
        }
    }
}

impl ExtractionOptions {
    /// 单篇笔记下载使用的选项：所有类型都启用，不滚动
    pub fn single_note(output_dir: impl Into<String>) -> Self {
        Self {
            max_notes: None,
            output_dir: output_dir.into(),
            auto_scroll: false,
            ..Self::default()
        }
    }
}
