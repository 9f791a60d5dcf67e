// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{Local, NaiveDate};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::domain::services::time_parser::format_time_for_folder;
use crate::utils::filename;

/// 视频类型未知时使用的默认 MIME 类型
pub const DEFAULT_VIDEO_MIME: &str = "video/mp4";

/// 作者未知时的占位名称
pub const UNKNOWN_AUTHOR: &str = "未知作者";

/// 笔记实体
///
/// 由提取器一次性构建，之后只读；唯一的例外是文件夹名称，
/// 它在第一次需要时计算并缓存。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// 笔记标识，来自 URL 路径段或合成
    pub id: String,
    pub title: String,
    pub author: String,
    /// 点赞数，可能带有 "万" / "+" 等后缀
    pub likes: String,
    /// 正文
    pub text: String,
    pub url: Option<String>,
    /// 原始发布时间字符串
    pub publish_time: Option<String>,
    /// 规范化后的 `YYYY-MM-DD`
    pub formatted_time: Option<String>,
    pub images: Vec<Image>,
    pub videos: Vec<Video>,
    #[serde(skip)]
    folder: OnceCell<String>,
}

impl Note {
    /// 创建笔记，视频列表按 URL 去重
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        title: String,
        author: String,
        likes: String,
        text: String,
        url: Option<String>,
        images: Vec<Image>,
        videos: Vec<Video>,
    ) -> Self {
        Self {
            id,
            title,
            author,
            likes,
            text,
            url,
            publish_time: None,
            formatted_time: None,
            images,
            videos: dedupe_videos(videos),
            folder: OnceCell::new(),
        }
    }

    /// 附加发布时间，同时计算规范化日期
    pub fn with_publish_time(mut self, raw: String, today: NaiveDate) -> Self {
        self.formatted_time = Some(format_time_for_folder(&raw, today));
        self.publish_time = Some(raw);
        self
    }

    /// 笔记的文件夹名称: `<YYYY-MM-DD>_<清理后的标题>`
    ///
    /// 没有发布时间时使用当天日期
    pub fn folder_name(&self) -> &str {
        self.folder.get_or_init(|| {
            let date = match (&self.formatted_time, &self.publish_time) {
                (Some(formatted), _) => formatted.clone(),
                (None, Some(raw)) => format_time_for_folder(raw, Local::now().date_naive()),
                (None, None) => format_time_for_folder("", Local::now().date_naive()),
            };
            filename::folder_name(&date, &self.title)
        })
    }

    /// 生成 `note_info.txt` 的文本内容
    pub fn info_text(&self) -> String {
        format!(
            "标题: {}\n作者: {}\n点赞: {}\n发布时间: {}\n链接: {}\n\n内容:\n{}",
            self.title,
            self.author,
            self.likes,
            self.publish_time.as_deref().unwrap_or("未知"),
            self.url.as_deref().unwrap_or(""),
            self.text
        )
    }
}

/// 图片
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    pub alt: String,
    /// 所在笔记内容容器的 class，仅用于分类
    #[serde(skip)]
    pub container: Option<String>,
    /// 元素声明的宽高，仅用于分类
    #[serde(skip)]
    pub dimensions: Option<(u32, u32)>,
}

impl Image {
    pub fn new(url: impl Into<String>, alt: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            alt: alt.into(),
            container: None,
            dimensions: None,
        }
    }
}

/// 视频
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub url: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

impl Video {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            mime_type: DEFAULT_VIDEO_MIME.to_string(),
        }
    }

    pub fn with_mime(url: impl Into<String>, mime_type: Option<&str>) -> Self {
        Self {
            url: url.into(),
            mime_type: mime_type
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(DEFAULT_VIDEO_MIME)
                .to_string(),
        }
    }
}

/// 按 URL 去重，保留首次出现的顺序
pub fn dedupe_videos(videos: Vec<Video>) -> Vec<Video> {
    let mut seen = HashSet::new();
    videos
        .into_iter()
        .filter(|v| seen.insert(v.url.clone()))
        .collect()
}

/// 用户主页信息
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub followers: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub likes: Option<String>,
}
