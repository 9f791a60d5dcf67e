// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 页面全局状态中的视频地址
//!
//! 先按已知结构读取，再在有限深度内遍历整个对象树寻找候选字符串。

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

/// 对象树遍历的最大深度
pub const MAX_SEARCH_DEPTH: usize = 12;

static VIDEO_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\.(mp4|avi|mov|wmv|flv|webm)(\?|$)").expect("static video url pattern")
});

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NoteDetail {
    note: Option<NoteBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct NoteBody {
    video: Option<VideoBody>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VideoBody {
    media: Option<Media>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Media {
    stream: Option<Streams>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Streams {
    h264: Vec<Stream>,
    h265: Vec<Stream>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Stream {
    master_url: Option<String>,
    backup_urls: Vec<String>,
}

/// 按 `note.noteDetailMap[*].note.video.media.stream.{h264,h265}[*]` 读取视频流地址
///
/// 结构不符的条目被忽略
pub fn stream_urls(initial_state: &Value) -> Vec<String> {
    let Some(details) = initial_state
        .pointer("/note/noteDetailMap")
        .and_then(Value::as_object)
    else {
        return Vec::new();
    };

    let mut urls = Vec::new();
    for (note_id, entry) in details {
        let detail = match NoteDetail::deserialize(entry) {
            Ok(detail) => detail,
            Err(e) => {
                tracing::debug!("Unexpected note detail shape for {}: {}", note_id, e);
                continue;
            }
        };
        let Some(streams) = detail
            .note
            .and_then(|n| n.video)
            .and_then(|v| v.media)
            .and_then(|m| m.stream)
        else {
            continue;
        };

        for stream in streams.h264.into_iter().chain(streams.h265) {
            urls.extend(stream.master_url.filter(|u| !u.is_empty()));
            urls.extend(stream.backup_urls.into_iter().filter(|u| !u.is_empty()));
        }
    }
    urls
}

/// 对象树中的字符串叶子，深度优先、惰性产生
pub struct StringLeaves<'a> {
    stack: Vec<(&'a Value, usize)>,
    max_depth: usize,
}

impl<'a> Iterator for StringLeaves<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((value, depth)) = self.stack.pop() {
            match value {
                Value::String(s) => return Some(s),
                Value::Array(items) if depth < self.max_depth => {
                    self.stack.extend(items.iter().rev().map(|v| (v, depth + 1)));
                }
                Value::Object(map) if depth < self.max_depth => {
                    let children: Vec<_> = map.values().map(|v| (v, depth + 1)).collect();
                    self.stack.extend(children.into_iter().rev());
                }
                _ => {}
            }
        }
        None
    }
}

/// 遍历 `root` 下不超过 `max_depth` 层的字符串
pub fn string_leaves(root: &Value, max_depth: usize) -> StringLeaves<'_> {
    StringLeaves {
        stack: vec![(root, 0)],
        max_depth,
    }
}

/// 看起来像视频文件地址的字符串
pub fn video_url_candidates(root: &Value) -> impl Iterator<Item = &str> {
    string_leaves(root, MAX_SEARCH_DEPTH)
        .filter(|s| s.starts_with("http") && VIDEO_URL_RE.is_match(s))
}
