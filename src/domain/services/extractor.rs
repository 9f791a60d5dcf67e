// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{Local, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

use crate::domain::models::note::{Image, Note, UserInfo, Video, UNKNOWN_AUTHOR};
use crate::domain::models::options::ExtractionOptions;
use crate::domain::services::classifier::{is_document_file, ICON_KEYWORDS, NOTE_CONTAINER_KEYWORDS};
use crate::domain::services::extraction_rules::{
    body, element_text, fallback_likes, visible_text, ExtractionRules, FALLBACK_AUTHOR,
    FALLBACK_TITLES, TITLE_SUFFIX,
};
use crate::domain::services::video_discovery::{DiscoveryContext, VideoDiscovery};
use crate::engines::traits::{PageSession, PageSnapshot};
use crate::utils::errors::ExtractionError;
use crate::utils::filename::random_suffix;
use crate::utils::url_utils::{absolutize, filename_from_url, prefer_high_quality};

static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("static img selector"));

static VIDEO_SRC_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("video[src]").expect("static video selector"));

static NOTE_ID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(?:exploration|discovery|explore)/([^/?#]+)").expect("static note id pattern")
});

static USER_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"小红书号[：:]\s*(\d+)").expect("static user id pattern"));
static LOCATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"IP属地[：:]\s*([^\n\r]+)").expect("static location pattern"));
static FOLLOWERS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+万?\+?)\s*粉丝").expect("static followers pattern"));
static LIKES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+万?\+?)\s*获赞").expect("static likes pattern"));

/// 详情页图片的最小尺寸
const MIN_DETAIL_IMAGE_DIMENSION: u32 = 200;

/// 图片没有 alt 时使用的描述
const DEFAULT_IMAGE_ALT: &str = "图片";

/// 页面类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// 单篇笔记详情
    NoteDetail,
    /// 用户主页（笔记列表）
    UserProfile,
    Unknown,
}

/// 根据 URL 判断页面类型
pub fn detect_page_kind(url: &str) -> PageKind {
    if ["/exploration/", "/discovery/", "/explore/"]
        .iter()
        .any(|p| url.contains(p))
    {
        PageKind::NoteDetail
    } else if url.contains("/user/profile/") {
        PageKind::UserProfile
    } else {
        PageKind::Unknown
    }
}

/// 从笔记地址中取出笔记标识
pub fn extract_note_id(url: &str) -> Option<String> {
    NOTE_ID_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// 滚动加载策略
///
/// 等待时长固定，不可配置
#[derive(Debug, Clone)]
pub struct ScrollPolicy {
    pub max_iterations: usize,
    /// 每次滚动后的等待
    pub settle: Duration,
    /// 高度未变化时再次尝试前的等待
    pub retry: Duration,
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            settle: Duration::from_millis(2000),
            retry: Duration::from_millis(1000),
        }
    }
}

/// 笔记提取器
///
/// 所有 DOM 解析都在页面快照上同步完成
pub struct NoteExtractor {
    rules: Arc<ExtractionRules>,
    videos: VideoDiscovery,
    scroll: ScrollPolicy,
}

impl NoteExtractor {
    pub fn new(rules: Arc<ExtractionRules>, videos: VideoDiscovery, scroll: ScrollPolicy) -> Self {
        Self {
            rules,
            videos,
            scroll,
        }
    }

    /// 使用站点默认规则
    pub fn with_defaults(deep_video_scan: bool) -> Self {
        Self::new(
            Arc::new(ExtractionRules::xiaohongshu()),
            VideoDiscovery::standard(deep_video_scan),
            ScrollPolicy::default(),
        )
    }

    /// 提取页面上的笔记列表
    ///
    /// 可能返回空列表；是否视为错误由调用方决定
    #[instrument(skip(self, page, options), fields(engine = page.name()))]
    pub async fn extract_notes(
        &self,
        page: &dyn PageSession,
        options: &ExtractionOptions,
    ) -> Result<Vec<Note>, ExtractionError> {
        if options.auto_scroll {
            self.scroll_to_load_more(page, options.max_notes).await?;
        }

        let snapshot = page.snapshot().await?;
        let mut notes = self.notes_from_snapshot(&snapshot);
        if let Some(max) = options.max_notes {
            notes.truncate(max);
        }

        info!("Extracted {} notes from {}", notes.len(), snapshot.url);
        Ok(notes)
    }

    /// 提取当前查看的单篇笔记
    ///
    /// 无法确定标题时返回 `None`
    #[instrument(skip(self, page), fields(engine = page.name()))]
    pub async fn extract_current_note(
        &self,
        page: &dyn PageSession,
    ) -> Result<Option<Note>, ExtractionError> {
        let snapshot = page.snapshot().await?;
        Ok(self.current_note_from_snapshot(&snapshot, Local::now().date_naive()))
    }

    /// 从主页提取用户信息
    pub async fn user_info(&self, page: &dyn PageSession) -> Result<UserInfo, ExtractionError> {
        let snapshot = page.snapshot().await?;
        Ok(user_info_from_snapshot(&snapshot))
    }

    /// 反复滚动到底部以加载更多笔记
    ///
    /// 达到最大次数、高度连续两次不变或笔记数量达到上限时停止；
    /// 没有上限时只按前两个条件停止
    pub async fn scroll_to_load_more(
        &self,
        page: &dyn PageSession,
        max_notes: Option<usize>,
    ) -> Result<usize, ExtractionError> {
        let mut last_height = page.scroll_height().await?;
        let mut scrolls = 0;

        while scrolls < self.scroll.max_iterations {
            page.scroll_to_bottom().await?;
            tokio::time::sleep(self.scroll.settle).await;

            let new_height = page.scroll_height().await?;
            if new_height == last_height {
                tokio::time::sleep(self.scroll.retry).await;
                page.scroll_to_bottom().await?;
                tokio::time::sleep(self.scroll.settle).await;

                if page.scroll_height().await? == new_height {
                    break;
                }
            }

            last_height = page.scroll_height().await?;
            scrolls += 1;

            if let Some(max) = max_notes {
                let loaded = page.count_elements(self.rules.scroll_probe).await?;
                if loaded >= max {
                    break;
                }
            }
        }

        debug!("Scroll loading finished after {} scrolls", scrolls);
        Ok(scrolls)
    }

    /// 在快照上提取笔记列表
    pub fn notes_from_snapshot(&self, snapshot: &PageSnapshot) -> Vec<Note> {
        let document = Html::parse_document(&snapshot.html);
        let page_url = Url::parse(&snapshot.url).ok();
        let scope = document.root_element();

        let Some((strategy, elements)) = self.rules.note_list.first_strategy(scope) else {
            debug!("No note elements found, scanning page text");
            return self.notes_from_text(&document, &snapshot.url);
        };

        debug!("Selector {} matched {} elements", strategy, elements.len());
        elements
            .into_iter()
            .filter_map(|element| self.card_note(element, page_url.as_ref()))
            .collect()
    }

    fn card_note(&self, element: ElementRef<'_>, page_url: Option<&Url>) -> Option<Note> {
        let rules = &self.rules;
        let link = rules
            .card_link
            .first(element)
            .or_else(|| rules.card_link.closest(element));

        let url = link
            .and_then(|l| l.value().attr("href"))
            .map(|href| absolutize(page_url, href));
        let id = url
            .as_deref()
            .and_then(extract_note_id)
            .unwrap_or_else(synthesize_note_id);

        let mut title = rules
            .card_title
            .first_text(element)
            .unwrap_or_default();
        if title.is_empty() {
            title = link.map(element_text).unwrap_or_default();
        }
        if title.is_empty() {
            debug!("Skipping note card without title");
            return None;
        }

        let likes = rules
            .card_likes
            .first_text(element)
            .unwrap_or_else(|| "0".to_string());
        let author = rules
            .card_author
            .first_text(element)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        let text = rules
            .card_text
            .first_text(element)
            .unwrap_or_else(|| title.clone());

        let images = card_images(element, page_url);
        let videos = self.card_videos(element, page_url);

        Some(Note::new(id, title, author, likes, text, url, images, videos))
    }

    fn card_videos(&self, element: ElementRef<'_>, page_url: Option<&Url>) -> Vec<Video> {
        let mut videos: Vec<Video> = element
            .select(&VIDEO_SRC_SELECTOR)
            .filter_map(|v| v.value().attr("src"))
            .filter(|src| !src.trim().is_empty())
            .map(|src| Video::new(absolutize(page_url, src)))
            .collect();

        for (_, selector) in self.rules.card_videos.iter() {
            videos.extend(
                element
                    .select(selector)
                    .filter_map(|a| a.value().attr("href"))
                    .map(|href| Video::new(absolutize(page_url, href))),
            );
        }
        videos
    }

    /// 降级模式：在页面文本中查找已知标题
    fn notes_from_text(&self, document: &Html, page_url: &str) -> Vec<Note> {
        let text = visible_text(document);
        FALLBACK_TITLES
            .iter()
            .enumerate()
            .filter(|(_, title)| text.contains(*title))
            .map(|(index, title)| {
                Note::new(
                    format!("note_{}", index + 1),
                    title.to_string(),
                    FALLBACK_AUTHOR.to_string(),
                    fallback_likes(index).to_string(),
                    title.to_string(),
                    Some(page_url.to_string()),
                    Vec::new(),
                    Vec::new(),
                )
            })
            .collect()
    }

    /// 在快照上提取当前笔记
    pub fn current_note_from_snapshot(
        &self,
        snapshot: &PageSnapshot,
        today: NaiveDate,
    ) -> Option<Note> {
        let rules = &self.rules;
        let document = Html::parse_document(&snapshot.html);
        let page_url = Url::parse(&snapshot.url).ok();
        let overlay = rules.overlay.first(document.root_element());
        let search = overlay.unwrap_or_else(|| body(&document));

        let mut title = rules.detail_title.first_text(search).unwrap_or_default();
        if title.is_empty() {
            title = snapshot.title.replace(TITLE_SUFFIX, "").trim().to_string();
        }
        if title.is_empty() {
            debug!("No title found for current note");
            return None;
        }

        let publish_time = rules
            .detail_time
            .first(search)
            .map(|el| match el.value().attr("datetime") {
                Some(dt) if !dt.trim().is_empty() => dt.trim().to_string(),
                _ => element_text(el),
            })
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());

        let author = rules
            .detail_author
            .first_text(search)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        let text = rules.detail_content.first_text(search).unwrap_or_default();

        let container = self.detail_container(&document);
        let images = self.detail_images(container, page_url.as_ref());
        let videos = self.videos.discover(&DiscoveryContext {
            snapshot,
            document: &document,
            scope: container,
            page_url: page_url.clone(),
            rules,
        });
        debug!(
            "Current note has {} images and {} videos",
            images.len(),
            videos.len()
        );

        let id = extract_note_id(&snapshot.url)
            .unwrap_or_else(|| format!("note_{}", Utc::now().timestamp_millis()));

        Some(
            Note::new(
                id,
                title,
                author,
                "0".to_string(),
                text,
                Some(snapshot.url.clone()),
                images,
                videos,
            )
            .with_publish_time(publish_time, today),
        )
    }

    /// 详情页的媒体搜索范围
    ///
    /// 弹出层内的笔记容器或弹出层本身；否则是页面上的第一个笔记容器，再否则是整个页面
    fn detail_container<'a>(&self, document: &'a Html) -> ElementRef<'a> {
        let rules = &self.rules;
        match rules.overlay.first(document.root_element()) {
            Some(overlay) => rules.overlay_container.first(overlay).unwrap_or(overlay),
            None => rules
                .detail_container
                .first(document.root_element())
                .unwrap_or_else(|| body(document)),
        }
    }

    fn detail_images(&self, container: ElementRef<'_>, page_url: Option<&Url>) -> Vec<Image> {
        let rules = &self.rules;
        let mut seen = HashSet::new();
        let mut images = Vec::new();

        for (_, selector) in rules.main_image_containers.iter() {
            for main in container.select(selector) {
                let class = main.value().attr("class").map(str::to_string);
                for img in main.select(&IMG_SELECTOR) {
                    if let Some(mut image) = detail_image(img, page_url, true) {
                        if seen.insert(image.url.clone()) {
                            image.container = class.clone();
                            images.push(image);
                        }
                    }
                }
            }
        }

        if images.is_empty() {
            debug!("No images in main containers, trying fallback selectors");
            for (_, selector) in rules.fallback_images.iter() {
                for img in container.select(selector) {
                    if let Some(image) = detail_image(img, page_url, false) {
                        if seen.insert(image.url.clone()) {
                            images.push(image);
                        }
                    }
                }
            }
        }

        // PNG 只接受来自主要容器的图片
        images
            .into_iter()
            .filter(|image| {
                let name = filename_from_url(&image.url);
                if name.ends_with(".png") {
                    let from_main = image.container.as_deref().is_some_and(|class| {
                        class
                            .split_whitespace()
                            .any(|c| rules.main_container_classes.contains(&c))
                    });
                    if !from_main {
                        debug!("Skipping PNG outside main containers: {}", image.url);
                    }
                    return from_main;
                }
                true
            })
            .collect()
    }
}

fn synthesize_note_id() -> String {
    format!("note_{}_{}", Utc::now().timestamp_millis(), random_suffix(9))
}

fn declared_dimensions(img: ElementRef<'_>) -> Option<(u32, u32)> {
    let width = img.value().attr("width")?.trim().parse().ok()?;
    let height = img.value().attr("height")?.trim().parse().ok()?;
    Some((width, height))
}

/// 列表卡片中的图片：排除头像与图标
fn card_images(element: ElementRef<'_>, page_url: Option<&Url>) -> Vec<Image> {
    element
        .select(&IMG_SELECTOR)
        .filter_map(|img| {
            let src = img.value().attr("src")?.trim();
            if src.is_empty() || src.contains("avatar") || src.contains("icon") {
                return None;
            }
            let url = prefer_high_quality(&absolutize(page_url, src));
            let mut image = Image::new(url, image_alt(img));
            image.container = note_container_class(img);
            image.dimensions = declared_dimensions(img);
            Some(image)
        })
        .collect()
}

fn image_alt(img: ElementRef<'_>) -> String {
    img.value()
        .attr("alt")
        .filter(|a| !a.trim().is_empty())
        .unwrap_or(DEFAULT_IMAGE_ALT)
        .to_string()
}

/// 最近的笔记内容容器祖先的 class
fn note_container_class(img: ElementRef<'_>) -> Option<String> {
    img.ancestors()
        .filter_map(ElementRef::wrap)
        .filter_map(|el| el.value().attr("class"))
        .find(|class| NOTE_CONTAINER_KEYWORDS.iter().any(|k| class.contains(k)))
        .map(str::to_string)
}

/// 详情页中的单张图片
///
/// 排除图标类地址、非 http 地址、文档，以及声明尺寸过小的图片
fn detail_image(img: ElementRef<'_>, page_url: Option<&Url>, check_size: bool) -> Option<Image> {
    let src = absolutize(page_url, img.value().attr("src")?);
    if src.is_empty() || !src.contains("http") || ICON_KEYWORDS.iter().any(|k| src.contains(k)) {
        return None;
    }
    if is_document_file(&src, None) {
        debug!("Skipping document-like image {}", src);
        return None;
    }

    let dimensions = declared_dimensions(img);
    if let (true, Some((w, h))) = (check_size, dimensions) {
        if w < MIN_DETAIL_IMAGE_DIMENSION || h < MIN_DETAIL_IMAGE_DIMENSION {
            debug!("Skipping small image {} ({}x{})", src, w, h);
            return None;
        }
    }

    let mut image = Image::new(prefer_high_quality(&src), image_alt(img));
    image.dimensions = dimensions;
    Some(image)
}

/// 从快照中提取用户信息
pub fn user_info_from_snapshot(snapshot: &PageSnapshot) -> UserInfo {
    let document = Html::parse_document(&snapshot.html);
    let text = visible_text(&document);
    let capture = |re: &Regex| {
        re.captures(&text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
    };

    UserInfo {
        nickname: snapshot
            .title
            .contains(TITLE_SUFFIX)
            .then(|| snapshot.title.replace(TITLE_SUFFIX, "")),
        user_id: capture(&USER_ID_RE),
        location: capture(&LOCATION_RE),
        followers: capture(&FOLLOWERS_RE),
        likes: capture(&LIKES_RE),
    }
}

#[cfg(test)]
#[path = "extractor_test.rs"]
mod tests;
