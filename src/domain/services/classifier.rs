// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 媒体分类
//!
//! 站点通过与内容相同的分发路径提供法律/帮助文档，这些文件不能被当作笔记内容下载。

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

use crate::domain::models::note::{Image, Video};
use crate::utils::url_utils::filename_from_url;

/// 文档关键词，出现在文件名或 URL 中即视为文档
const DOCUMENT_KEYWORDS: &[&str] = &[
    "pdf", "document", "policy", "terms", "privacy", "agreement", "license", "notice", "readme",
    "help", "faq", "cookie",
];

/// 文档所在的平台路径
const DOCUMENT_PATH_MARKERS: &[&str] = &["fe-platform-file", "platform-file"];

/// 许可证类文件
const PERMIT_MARKERS: &[&str] = &["license", "permit", "certificate"];

/// 明确排除的通用文件名
const FILENAME_BLACKLIST: &[&str] = &[
    "policy.pdf",
    "terms.pdf",
    "privacy.pdf",
    "cookie.pdf",
    "agreement.pdf",
    "license.pdf",
    "notice.pdf",
    "readme.pdf",
    "help.pdf",
    "faq.pdf",
    "robots.txt",
    "sitemap.xml",
    "manifest.json",
    "service-worker.js",
];

/// 主要内容分发路径标记，命中即保留
pub const PRIMARY_CONTENT_MARKERS: &[&str] =
    &["sns-webpic", "note-slider-img", "img-container", "swiper-slide"];

/// 笔记内容容器的 class 关键词
pub const NOTE_CONTAINER_KEYWORDS: &[&str] = &[
    "note-container",
    "media-container",
    "slider-container",
    "img-container",
    "swiper-slide",
];

/// 图标类关键词
pub const ICON_KEYWORDS: &[&str] = &["icon", "logo", "avatar", "emoji", "button", "badge"];

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".svg"];

pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".avi", ".mov", ".wmv", ".flv", ".webm"];

const VIDEO_KEYWORDS: &[&str] = &["video", "mp4", "avi", "mov", "wmv", "flv", "webm"];

/// 小于该尺寸的 PNG 视为图标
pub const MIN_IMAGE_DIMENSION: u32 = 200;

static SIZE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)x(\d+)").expect("static size pattern"));

static VIDEO_DOCUMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^video_.*\.pdf$").expect("static video-pdf pattern"));

/// 媒体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Other,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
            MediaKind::Other => write!(f, "other"),
        }
    }
}

/// 可被分类的媒体条目
pub trait MediaItem {
    fn url(&self) -> &str;

    /// 来源容器的 class（如果已知）
    fn container(&self) -> Option<&str> {
        None
    }

    /// 元素声明的宽高（如果已知）
    fn dimensions(&self) -> Option<(u32, u32)> {
        None
    }
}

impl MediaItem for Image {
    fn url(&self) -> &str {
        &self.url
    }

    fn container(&self) -> Option<&str> {
        self.container.as_deref()
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }
}

impl MediaItem for Video {
    fn url(&self) -> &str {
        &self.url
    }
}

impl MediaItem for String {
    fn url(&self) -> &str {
        self
    }
}

/// 分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Keep,
    Primary,
    Document,
    Blacklisted,
    SmallImage(u32, u32),
    IconLike,
    WrongType,
    OutsideContainer,
}

impl Verdict {
    pub fn is_kept(&self) -> bool {
        matches!(self, Verdict::Keep | Verdict::Primary)
    }
}

/// 判断是否为文档文件
///
/// `filename` 缺省时取 URL 最后一段路径
pub fn is_document_file(url: &str, filename: Option<&str>) -> bool {
    if url.is_empty() {
        return false;
    }

    let url_lower = url.to_lowercase();
    let name = filename
        .map(|f| f.to_lowercase())
        .unwrap_or_else(|| filename_from_url(url));

    if name.ends_with(".pdf") || url_lower.contains(".pdf") {
        return true;
    }

    if DOCUMENT_PATH_MARKERS.iter().any(|m| url_lower.contains(m)) {
        return true;
    }

    if DOCUMENT_KEYWORDS
        .iter()
        .any(|k| name.contains(k) || url_lower.contains(k))
    {
        return true;
    }

    if VIDEO_DOCUMENT_RE.is_match(&name) || name.ends_with("_pdf") {
        return true;
    }

    if url_lower.contains("application/pdf") || url_lower.contains("pdf/") {
        return true;
    }

    PERMIT_MARKERS.iter().any(|m| url_lower.contains(m))
}

/// 对单个条目进行分类
///
/// 判定顺序：文档 → 黑名单 → 主要内容标记 → 小尺寸/图标 PNG → 扩展名 → PNG 容器来源
pub fn classify<T: MediaItem + ?Sized>(item: &T, kind: MediaKind) -> Verdict {
    let url = item.url();
    let filename = filename_from_url(url);

    if is_document_file(url, Some(&filename)) {
        return Verdict::Document;
    }

    if FILENAME_BLACKLIST.contains(&filename.as_str()) {
        return Verdict::Blacklisted;
    }

    match kind {
        MediaKind::Image => classify_image(item, url, &filename),
        MediaKind::Video => {
            let has_ext = VIDEO_EXTENSIONS.iter().any(|e| filename.ends_with(e));
            let has_keyword = VIDEO_KEYWORDS.iter().any(|k| url.contains(k));
            if has_ext || has_keyword {
                Verdict::Keep
            } else {
                Verdict::WrongType
            }
        }
        MediaKind::Other => Verdict::Keep,
    }
}

fn classify_image<T: MediaItem + ?Sized>(item: &T, url: &str, filename: &str) -> Verdict {
    if PRIMARY_CONTENT_MARKERS.iter().any(|m| url.contains(m)) {
        return Verdict::Primary;
    }

    let is_png = filename.ends_with(".png");

    if is_png {
        let size = SIZE_RE
            .captures(url)
            .and_then(|c| Some((c[1].parse::<u32>().ok()?, c[2].parse::<u32>().ok()?)))
            .or_else(|| item.dimensions());
        if let Some((w, h)) = size {
            if w < MIN_IMAGE_DIMENSION || h < MIN_IMAGE_DIMENSION {
                return Verdict::SmallImage(w, h);
            }
        }

        if ICON_KEYWORDS
            .iter()
            .any(|k| filename.contains(k) || url.contains(k))
        {
            return Verdict::IconLike;
        }
    }

    if !IMAGE_EXTENSIONS.iter().any(|e| filename.ends_with(e)) {
        return Verdict::WrongType;
    }

    if is_png {
        let from_container = NOTE_CONTAINER_KEYWORDS.iter().any(|k| {
            url.contains(k) || item.container().is_some_and(|class| class.contains(k))
        });
        if !from_container {
            return Verdict::OutsideContainer;
        }
    }

    Verdict::Keep
}

/// 按类型过滤媒体列表，保持原有顺序
pub fn filter_media_files<T: MediaItem>(items: Vec<T>, kind: MediaKind) -> Vec<T> {
    let before = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter(|item| {
            let verdict = classify(item, kind);
            if !verdict.is_kept() {
                tracing::debug!("Rejected {} {}: {:?}", kind, item.url(), verdict);
            }
            verdict.is_kept()
        })
        .collect();
    tracing::debug!("Filtered {} files: {} -> {}", kind, before, kept.len());
    kept
}

#[cfg(test)]
#[path = "classifier_test.rs"]
mod tests;
