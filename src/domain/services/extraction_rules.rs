// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 提取规则
//!
//! 站点相关的选择器全部以有序数据的形式集中在这里，页面结构变化时只需修改数据。

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// 有序的选择器链
///
/// 每一项都是 `(名称, 选择器)`，按顺序尝试
#[derive(Debug, Clone)]
pub struct SelectorChain {
    entries: Vec<(&'static str, Selector)>,
}

impl SelectorChain {
    /// 构建选择器链，无法解析的选择器被跳过并记录警告
    pub fn new(raw: &[&'static str]) -> Self {
        let entries = raw
            .iter()
            .filter_map(|s| match Selector::parse(s) {
                Ok(selector) => Some((*s, selector)),
                Err(e) => {
                    tracing::warn!("Skipping invalid selector {}: {:?}", s, e);
                    None
                }
            })
            .collect();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按顺序遍历 `(名称, 选择器)`
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Selector)> {
        self.entries.iter().map(|(name, sel)| (*name, sel))
    }

    /// 第一个命中任意元素的选择器所找到的第一个元素
    pub fn first<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.entries
            .iter()
            .find_map(|(_, sel)| scope.select(sel).next())
    }

    /// 第一个命中元素的文本（已去除首尾空白）
    pub fn first_text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.first(scope).map(element_text)
    }

    /// 第一个至少命中一个元素的策略，以及它命中的全部元素
    pub fn first_strategy<'a>(
        &self,
        scope: ElementRef<'a>,
    ) -> Option<(&'static str, Vec<ElementRef<'a>>)> {
        self.entries.iter().find_map(|(name, sel)| {
            let found: Vec<_> = scope.select(sel).collect();
            if found.is_empty() {
                None
            } else {
                Some((*name, found))
            }
        })
    }

    /// 元素自身或祖先中第一个匹配任一选择器的元素
    pub fn closest<'a>(&self, element: ElementRef<'a>) -> Option<ElementRef<'a>> {
        std::iter::once(element)
            .chain(element.ancestors().filter_map(ElementRef::wrap))
            .find(|el| self.entries.iter().any(|(_, sel)| sel.matches(el)))
    }
}

/// 元素的全部文本内容，去除首尾空白
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// 文档中用户可见的文本
///
/// 只包含 body，跳过 script/style 等不可见内容，每个文本节点占一行
pub fn visible_text(document: &Html) -> String {
    let mut lines = Vec::new();
    for node in body(document).descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node.ancestors().any(|a| {
            a.value()
                .as_element()
                .is_some_and(|e| matches!(e.name(), "script" | "style" | "noscript" | "template"))
        });
        let text = text.trim();
        if !hidden && !text.is_empty() {
            lines.push(text);
        }
    }
    lines.join("\n")
}

/// 文档的 body 元素，缺失时使用根元素
pub fn body(document: &Html) -> ElementRef<'_> {
    document
        .select(&BODY_SELECTOR)
        .next()
        .unwrap_or_else(|| document.root_element())
}

static BODY_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("body").expect("static body selector"));

/// 页面标题中需要去除的站点后缀
pub const TITLE_SUFFIX: &str = " - 小红书";

/// 文本降级模式下使用的作者
pub const FALLBACK_AUTHOR: &str = "猛男日记🎀王铁柱";

/// 文本降级模式下识别的已知标题
pub const FALLBACK_TITLES: &[&str] = &[
    "要挨揍了🥹所以暂时眼睛闭起来～",
    "女士 请自重😳我不是你想的那种猫！",
    "我的小猫这么可爱 干嘛不晒🤪",
    "😳麻麻 我真的是你亲生的吗？",
    "小小的老子可不是好惹的😡",
    "管他天地为何物！🤨就要吸猫！",
    "😝他好像知道 自己是个乖宝宝耶！",
    "他只是头大 不是胖！！",
    "别打脸！我投降还不行吗😭",
    "人！你也很为咪着迷吧😉",
];

/// 降级笔记的点赞数，按标题序号分档
pub fn fallback_likes(index: usize) -> &'static str {
    match index {
        0..=1 => "1万+",
        2..=7 => "1千+",
        _ => "10+",
    }
}

/// 站点提取规则
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    /// 列表页笔记元素
    pub note_list: SelectorChain,
    /// 判断滚动加载进度时计数的元素
    pub scroll_probe: &'static str,
    pub card_link: SelectorChain,
    pub card_title: SelectorChain,
    pub card_likes: SelectorChain,
    pub card_author: SelectorChain,
    pub card_text: SelectorChain,
    pub card_videos: SelectorChain,

    /// 详情弹出层
    pub overlay: SelectorChain,
    /// 弹出层内的笔记容器
    pub overlay_container: SelectorChain,
    /// 无弹出层时的笔记容器
    pub detail_container: SelectorChain,
    pub detail_title: SelectorChain,
    pub detail_time: SelectorChain,
    pub detail_author: SelectorChain,
    pub detail_content: SelectorChain,

    /// 主要图片容器
    pub main_image_containers: SelectorChain,
    /// 主要容器没有图片时使用的图片选择器
    pub fallback_images: SelectorChain,
    /// 主要容器的 class，PNG 只接受来自这些容器的图片
    pub main_container_classes: &'static [&'static str],

    pub video_elements: SelectorChain,
    pub video_links: SelectorChain,
    pub video_data: SelectorChain,
    pub iframes: SelectorChain,
    pub player_container: SelectorChain,
    /// 播放器容器上可能保存真实视频地址的属性
    pub player_attributes: &'static [&'static str],
}

impl ExtractionRules {
    /// 小红书页面规则
    pub fn xiaohongshu() -> Self {
        Self {
            note_list: SelectorChain::new(&[
                r#"[data-type="note"]"#,
                ".note-item",
                ".feed-item",
                ".note-card",
                ".exploration-item",
                r#"a[href*="/exploration/"]"#,
                r#"a[href*="/discovery/"]"#,
            ]),
            scroll_probe: r#"[data-type="note"], .note-item, .feed-item"#,
            card_link: SelectorChain::new(&[
                r#"a[href*="/exploration/"]"#,
                r#"a[href*="/discovery/"]"#,
            ]),
            card_title: SelectorChain::new(&[".title", ".note-title", "h3", "h4"]),
            card_likes: SelectorChain::new(&[".like-count", ".likes", r#"[class*="like"]"#]),
            card_author: SelectorChain::new(&[".author", ".user-name", r#"[class*="user"]"#]),
            card_text: SelectorChain::new(&[".content", ".note-content", ".description"]),
            card_videos: SelectorChain::new(&[r#"a[href*="video"]"#, r#"a[href*="mp4"]"#]),

            overlay: SelectorChain::new(&[".note-detail-mask"]),
            overlay_container: SelectorChain::new(&[".note-container"]),
            detail_container: SelectorChain::new(&[
                ".note-container",
                r#"[data-type="normal"]"#,
                ".media-container",
                ".slider-container",
            ]),
            detail_title: SelectorChain::new(&[
                ".title",
                ".note-title",
                "h1",
                "h2",
                ".content-title",
                r#"[class*="title"]"#,
                "#detail-title",
            ]),
            detail_time: SelectorChain::new(&[
                ".date",
                ".time",
                ".publish-time",
                ".edit-time",
                r#"[class*="date"]"#,
                r#"[class*="time"]"#,
                "time",
                "[datetime]",
            ]),
            detail_author: SelectorChain::new(&[
                ".author",
                ".user-name",
                ".nickname",
                r#"[class*="user"]"#,
                r#"[class*="author"]"#,
                ".username",
            ]),
            detail_content: SelectorChain::new(&[
                ".content",
                ".note-content",
                ".description",
                ".text-content",
                r#"[class*="content"]"#,
                "#detail-desc",
            ]),

            main_image_containers: SelectorChain::new(&[
                ".slider-container",
                ".media-container",
                ".img-container",
                ".swiper-slide",
                r#"[class*="slider"]"#,
                r#"[class*="media"]"#,
            ]),
            fallback_images: SelectorChain::new(&[
                ".note-slider-img",
                ".img-container img",
                ".swiper-slide img",
                r#"img[src*="sns-webpic"]"#,
                r#"img[src*="xhs.cn"]"#,
                r#"img[src*="xiaohongshu.com"]"#,
                r#"img[src*="sns-img"]"#,
                r#"img[src*="image"]"#,
                "img",
            ]),
            main_container_classes: &[
                "slider-container",
                "media-container",
                "img-container",
                "swiper-slide",
            ],

            video_elements: SelectorChain::new(&["video"]),
            video_links: SelectorChain::new(&[
                r#"a[href*="video"]"#,
                r#"a[href*="mp4"]"#,
                r#"a[href*="avi"]"#,
                r#"a[href*="mov"]"#,
                r#"a[href*="wmv"]"#,
                r#"a[href*="flv"]"#,
                r#"a[href*="webm"]"#,
                "[data-video-url]",
                "[data-video-src]",
            ]),
            video_data: SelectorChain::new(&[
                "[data-video]",
                r#"[data-src*="video"]"#,
                r#"[data-url*="video"]"#,
                r#"[data-src*="mp4"]"#,
                r#"[data-url*="mp4"]"#,
            ]),
            iframes: SelectorChain::new(&["iframe"]),
            player_container: SelectorChain::new(&[".player-container"]),
            player_attributes: &[
                "data-video-url",
                "data-video-src",
                "data-media-url",
                "data-media-src",
                "data-original-src",
                "data-real-src",
                "data-src",
                "data-url",
            ],
        }
    }
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self::xiaohongshu()
    }
}
