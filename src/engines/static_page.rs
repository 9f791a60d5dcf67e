// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::collections::HashMap;

use crate::engines::traits::{EngineError, PageSession, PageSnapshot, GLOBAL_NAMES};

static SCRIPT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("script").expect("static script selector"));

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("static title selector"));

static UNDEFINED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([:\[,])\s*undefined\b").expect("static undefined pattern"));

/// 静态页面
///
/// 基于一次性获取的 HTML 文档；不能滚动，高度恒定
#[derive(Debug, Clone)]
pub struct StaticPage {
    html: String,
    url: String,
}

impl StaticPage {
    pub fn new(html: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            url: url.into(),
        }
    }

    pub fn html(&self) -> &str {
        &self.html
    }
}

#[async_trait]
impl PageSession for StaticPage {
    async fn url(&self) -> Result<String, EngineError> {
        Ok(self.url.clone())
    }

    async fn snapshot(&self) -> Result<PageSnapshot, EngineError> {
        let document = Html::parse_document(&self.html);
        let title = document
            .select(&TITLE_SELECTOR)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .unwrap_or_default();
        let globals = parse_inline_globals(&document);

        Ok(PageSnapshot {
            html: self.html.clone(),
            url: self.url.clone(),
            title,
            globals,
            resource_entries: Vec::new(),
            storage_entries: Vec::new(),
        })
    }

    async fn scroll_to_bottom(&self) -> Result<(), EngineError> {
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64, EngineError> {
        Ok(self.html.len() as u64)
    }

    async fn count_elements(&self, selector: &str) -> Result<usize, EngineError> {
        let selector = Selector::parse(selector)
            .map_err(|e| EngineError::InvalidSelector(format!("{}: {:?}", selector, e)))?;
        let document = Html::parse_document(&self.html);
        Ok(document.select(&selector).count())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// 从内联脚本中解析 `window.<name> = <json>` 形式的全局变量
///
/// JS 中的 `undefined` 会被当作 `null`
pub fn parse_inline_globals(document: &Html) -> HashMap<String, Value> {
    let mut globals = HashMap::new();

    for script in document.select(&SCRIPT_SELECTOR) {
        let content = script.text().collect::<String>();
        for name in GLOBAL_NAMES {
            if globals.contains_key(*name) {
                continue;
            }
            if let Some(value) = parse_assignment(&content, name) {
                tracing::debug!("Found inline global window.{}", name);
                globals.insert((*name).to_string(), value);
            }
        }
    }

    globals
}

fn parse_assignment(content: &str, name: &str) -> Option<Value> {
    let marker = format!("window.{}", name);
    let mut search_from = 0;

    while let Some(pos) = content[search_from..].find(&marker) {
        let after = search_from + pos + marker.len();
        search_from = after;

        // window.noteData 不能匹配 window.noteDataList
        let rest = &content[after..];
        if rest
            .chars()
            .next()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        {
            continue;
        }
        let rest = rest.trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        if rest.starts_with('=') {
            continue;
        }

        let normalized = UNDEFINED_RE.replace_all(rest.trim_start(), "${1}null");
        let mut stream = serde_json::Deserializer::from_str(&normalized).into_iter::<Value>();
        if let Some(Ok(value)) = stream.next() {
            return Some(value);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_initial_state_with_undefined() {
        let html = r#"<html><head><title>笔记 - 小红书</title></head><body>
            <script>window.__INITIAL_STATE__={"note":{"firstNoteId":undefined,"list":[undefined]}};var x=1;</script>
            <script>window.src_loaded = "https://v.example/a.mp4";</script>
        </body></html>"#;
        let document = Html::parse_document(html);
        let globals = parse_inline_globals(&document);

        assert_eq!(globals["__INITIAL_STATE__"]["note"]["firstNoteId"], Value::Null);
        assert_eq!(globals["src_loaded"], "https://v.example/a.mp4");
    }

    #[test]
    fn test_parse_skips_longer_identifiers_and_comparisons() {
        let html = r#"<script>if (window.noteData == null) {} window.noteDataList = {"a":1}; window.noteData = {"b":2}</script>"#;
        let document = Html::parse_document(html);
        let globals = parse_inline_globals(&document);
        assert_eq!(globals["noteData"]["b"], 2);
    }

    #[tokio::test]
    async fn test_static_page_snapshot_and_count() {
        let page = StaticPage::new(
            r#"<html><head><title>T</title></head><body><div class="note-item"></div><div class="note-item"></div></body></html>"#,
            "https://www.xiaohongshu.com/user/profile/1",
        );
        let snapshot = page.snapshot().await.unwrap();
        assert_eq!(snapshot.title, "T");
        assert_eq!(page.count_elements(".note-item").await.unwrap(), 2);
        assert!(page.count_elements("[[").await.is_err());
    }
}
