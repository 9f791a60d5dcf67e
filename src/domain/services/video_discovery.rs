// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 视频地址发现
//!
//! 多个相互独立的策略分别产生候选地址，结果按 URL 去重合并。
//! 这一层是尽力而为的启发式，不同次加载的结果不保证一致。

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

use crate::domain::models::note::Video;
use crate::domain::services::classifier::is_document_file;
use crate::domain::services::extraction_rules::ExtractionRules;
use crate::domain::services::global_state;
use crate::engines::traits::PageSnapshot;
use crate::utils::url_utils::absolutize;

static SCRIPT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("static script selector"));

static SOURCE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("source").expect("static source selector"));

static BLOB_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"video[src^="blob:"], source[src^="blob:"], video[data-src^="blob:"]"#)
        .expect("static blob selector")
});

static SCRIPT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#""video_url"\s*:\s*"([^"]+)""#,
        r#""videoUrl"\s*:\s*"([^"]+)""#,
        r#""masterUrl"\s*:\s*"([^"]+\.mp4[^"]*)""#,
        r#""backupUrls"\s*:\s*\["([^"]+\.mp4[^"]*)""#,
        r#""src"\s*:\s*"([^"]*\.(?:mp4|avi|mov|wmv|flv|webm))""#,
        r#""url"\s*:\s*"([^"]*\.(?:mp4|avi|mov|wmv|flv|webm))""#,
        r#"https?://[^"'\s]+\.(?:mp4|avi|mov|wmv|flv|webm)"#,
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// 全局状态中参与遍历的变量
const STATE_GLOBALS: &[&str] = &[
    "__INITIAL_STATE__",
    "xhsData",
    "noteData",
    "videoData",
    "mediaData",
];

/// 发现过程的输入
pub struct DiscoveryContext<'a> {
    pub snapshot: &'a PageSnapshot,
    pub document: &'a Html,
    /// 元素类策略的搜索范围
    pub scope: ElementRef<'a>,
    pub page_url: Option<Url>,
    pub rules: &'a ExtractionRules,
}

impl DiscoveryContext<'_> {
    fn absolute(&self, raw: &str) -> String {
        absolutize(self.page_url.as_ref(), raw)
    }
}

/// 视频地址来源
pub trait VideoSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn discover(&self, ctx: &DiscoveryContext<'_>) -> Vec<Video>;
}

/// `<video>` / `<source>` 元素属性
pub struct ElementSource;

impl VideoSource for ElementSource {
    fn name(&self) -> &'static str {
        "element"
    }

    fn discover(&self, ctx: &DiscoveryContext<'_>) -> Vec<Video> {
        let mut found = Vec::new();

        for (_, selector) in ctx.rules.video_elements.iter() {
            for video in ctx.scope.select(selector) {
                if let Some(src) = non_blob(video.value().attr("src")) {
                    found.push(Video::new(ctx.absolute(src)));
                }
                for source in video.select(&SOURCE_SELECTOR) {
                    if let Some(src) = non_blob(source.value().attr("src")) {
                        found.push(Video::with_mime(
                            ctx.absolute(src),
                            source.value().attr("type"),
                        ));
                    }
                }
                if let Some(src) = non_blob(video.value().attr("data-src")) {
                    found.push(Video::new(ctx.absolute(src)));
                }
            }
        }
        found
    }
}

fn non_blob(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.starts_with("blob:"))
}

/// 指向视频的链接、数据属性与 iframe
pub struct LinkSource;

impl VideoSource for LinkSource {
    fn name(&self) -> &'static str {
        "link"
    }

    fn discover(&self, ctx: &DiscoveryContext<'_>) -> Vec<Video> {
        let mut found = Vec::new();

        for (_, selector) in ctx.rules.video_links.iter() {
            for link in ctx.scope.select(selector) {
                let el = link.value();
                if let Some(href) = el
                    .attr("href")
                    .or_else(|| el.attr("data-video-url"))
                    .or_else(|| el.attr("data-video-src"))
                    .filter(|h| !h.trim().is_empty())
                {
                    found.push(Video::new(ctx.absolute(href)));
                }
            }
        }

        for (_, selector) in ctx.rules.video_data.iter() {
            for element in ctx.scope.select(selector) {
                let el = element.value();
                if let Some(url) = el
                    .attr("data-video")
                    .or_else(|| el.attr("data-src"))
                    .or_else(|| el.attr("data-url"))
                    .filter(|u| !u.trim().is_empty())
                {
                    found.push(Video::new(ctx.absolute(url)));
                }
            }
        }

        for (_, selector) in ctx.rules.iframes.iter() {
            for iframe in ctx.scope.select(selector) {
                if let Some(src) = iframe.value().attr("src").filter(|s| s.contains("video")) {
                    found.push(Video::new(ctx.absolute(src)));
                }
            }
        }

        found
    }
}

/// 内联脚本中的 JSON 键与裸视频地址
pub struct ScriptSource;

impl ScriptSource {
    /// 在一段脚本文本中查找视频地址
    pub fn scan(content: &str) -> Vec<String> {
        let content = content.replace("\\u002F", "/").replace("\\/", "/");
        let mut found = Vec::new();
        for pattern in SCRIPT_PATTERNS.iter() {
            for caps in pattern.captures_iter(&content) {
                if let Some(m) = caps.get(1).or_else(|| caps.get(0)) {
                    found.push(m.as_str().to_string());
                }
            }
        }
        found
    }
}

impl VideoSource for ScriptSource {
    fn name(&self) -> &'static str {
        "script"
    }

    fn discover(&self, ctx: &DiscoveryContext<'_>) -> Vec<Video> {
        ctx.document
            .select(&SCRIPT_SELECTOR)
            .flat_map(|script| Self::scan(&script.text().collect::<String>()))
            .map(Video::new)
            .collect()
    }
}

/// 页面全局状态对象
pub struct GlobalStateSource;

impl VideoSource for GlobalStateSource {
    fn name(&self) -> &'static str {
        "global_state"
    }

    fn discover(&self, ctx: &DiscoveryContext<'_>) -> Vec<Video> {
        let globals = &ctx.snapshot.globals;
        let mut found: Vec<Video> = globals
            .get("__INITIAL_STATE__")
            .map(global_state::stream_urls)
            .unwrap_or_default()
            .into_iter()
            .map(Video::new)
            .collect();

        for name in STATE_GLOBALS {
            if let Some(value) = globals.get(*name) {
                found.extend(global_state::video_url_candidates(value).map(Video::new));
            }
        }
        found
    }
}

/// 本地 blob 视频的真实地址
///
/// 仅在范围内存在 blob 引用时工作
pub struct BlobSource;

impl VideoSource for BlobSource {
    fn name(&self) -> &'static str {
        "blob"
    }

    fn discover(&self, ctx: &DiscoveryContext<'_>) -> Vec<Video> {
        if ctx.scope.select(&BLOB_SELECTOR).next().is_none() {
            return Vec::new();
        }

        if let Some(src) = ctx
            .snapshot
            .globals
            .get("src_loaded")
            .and_then(|v| v.as_str())
            .filter(|s| s.contains(".mp4"))
        {
            return vec![Video::new(src)];
        }

        let mut found = Vec::new();

        if let Some(player) = ctx.rules.player_container.first(ctx.document.root_element()) {
            for attr in ctx.rules.player_attributes {
                if let Some(value) = player.value().attr(attr).filter(|v| v.contains(".mp4")) {
                    found.push(Video::new(ctx.absolute(value)));
                }
            }
        }

        found.extend(
            ctx.snapshot
                .resource_entries
                .iter()
                .filter(|name| name.contains(".mp4"))
                .map(Video::new),
        );

        found.extend(
            ctx.snapshot
                .storage_entries
                .iter()
                .filter(|(_, value)| value.contains(".mp4"))
                .map(|(_, value)| Video::new(value.as_str())),
        );

        found
    }
}

/// 视频发现管线
pub struct VideoDiscovery {
    sources: Vec<Box<dyn VideoSource>>,
}

impl VideoDiscovery {
    pub fn new(sources: Vec<Box<dyn VideoSource>>) -> Self {
        Self { sources }
    }

    /// 标准策略组合；`deep_scan` 关闭时不使用全局状态与 blob 解析
    pub fn standard(deep_scan: bool) -> Self {
        let mut sources: Vec<Box<dyn VideoSource>> = Vec::new();
        if deep_scan {
            sources.push(Box::new(GlobalStateSource));
        }
        sources.push(Box::new(ElementSource));
        if deep_scan {
            sources.push(Box::new(BlobSource));
        }
        sources.push(Box::new(LinkSource));
        sources.push(Box::new(ScriptSource));
        Self { sources }
    }

    /// 运行全部策略，排除文档并按 URL 去重，保留首次出现的顺序
    pub fn discover(&self, ctx: &DiscoveryContext<'_>) -> Vec<Video> {
        let mut seen = HashSet::new();
        let mut videos = Vec::new();

        for source in &self.sources {
            let found = source.discover(ctx);
            if !found.is_empty() {
                tracing::debug!("Video source {} found {} candidates", source.name(), found.len());
            }
            for video in found {
                if is_document_file(&video.url, None) {
                    tracing::debug!("Skipping document-like video {}", video.url);
                    continue;
                }
                if seen.insert(video.url.clone()) {
                    videos.push(video);
                }
            }
        }

        videos
    }
}

impl Default for VideoDiscovery {
    fn default() -> Self {
        Self::standard(true)
    }
}

#[cfg(test)]
#[path = "video_discovery_test.rs"]
mod tests;
