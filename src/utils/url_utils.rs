// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use url::{ParseError, Url};

static EXTENSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\.([a-zA-Z0-9]+)(?:[?#]|$)").expect("static extension pattern")
});

static FORMAT_PARAM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"format=\w+").expect("static format pattern"));

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 相对页面地址解析 URL，解析失败时原样返回
///
/// `blob:` 与 `data:` 等非层级地址不做处理
pub fn absolutize(page_url: Option<&Url>, raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with("blob:") || raw.starts_with("data:") {
        return raw.to_string();
    }
    match page_url {
        Some(base) => resolve_url(base, raw)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| raw.to_string()),
        None => raw.to_string(),
    }
}

/// 取 URL 最后一段路径并去掉查询串，转为小写
pub fn filename_from_url(url: &str) -> String {
    let last = url.rsplit('/').next().unwrap_or(url);
    let last = last.split('?').next().unwrap_or(last);
    last.to_lowercase()
}

/// 取 URL 的文件扩展名（带点），没有时返回 None
pub fn file_extension(url: &str) -> Option<String> {
    EXTENSION_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| format!(".{}", m.as_str()))
}

/// 将图片 URL 的 format 参数替换为 jpg，以获取高清版本
pub fn prefer_high_quality(url: &str) -> String {
    if url.contains("format") {
        FORMAT_PARAM_RE.replace(url, "format=jpg").into_owned()
    } else {
        url.to_string()
    }
}

/// 是否为 HTTP(S) 地址
pub fn is_http_url(url: &str) -> bool {
    Url::parse(url)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_protocol_relative_url() {
        let base = Url::parse("https://example.com/a/b").unwrap();
        let path = "//t.co/c";
        assert_eq!(
            resolve_url(&base, path).unwrap().as_str(),
            "https://t.co/c"
        );
    }

    #[test]
    fn test_resolve_root_relative_url() {
        let base = Url::parse("http://example.com/a/b").unwrap();
        assert_eq!(
            resolve_url(&base, "/c").unwrap().as_str(),
            "http://example.com/c"
        );
    }

    #[test]
    fn test_absolutize_keeps_blob_urls() {
        let base = Url::parse("https://www.xiaohongshu.com/explore/1").unwrap();
        assert_eq!(
            absolutize(Some(&base), "blob:https://www.xiaohongshu.com/abc"),
            "blob:https://www.xiaohongshu.com/abc"
        );
        assert_eq!(
            absolutize(Some(&base), "/explore/2"),
            "https://www.xiaohongshu.com/explore/2"
        );
    }

    #[test]
    fn test_filename_and_extension() {
        let url = "https://cdn.example.com/path/Photo.PNG?x=1";
        assert_eq!(filename_from_url(url), "photo.png");
        assert_eq!(file_extension(url).as_deref(), Some(".PNG"));
        assert_eq!(file_extension("https://cdn.example.com/stream"), None);
    }

    #[test]
    fn test_prefer_high_quality_rewrites_format() {
        assert_eq!(
            prefer_high_quality("https://sns-webpic.example/1?imageView2&format=webp"),
            "https://sns-webpic.example/1?imageView2&format=jpg"
        );
        assert_eq!(prefer_high_quality("https://a/b.jpg"), "https://a/b.jpg");
    }

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://a.com/x.mp4"));
        assert!(!is_http_url("blob:https://a.com/x"));
        assert!(!is_http_url("not a url"));
    }
}
