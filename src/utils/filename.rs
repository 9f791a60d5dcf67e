// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;

use crate::utils::url_utils::file_extension;

/// 文件名最大长度（字符数）
const MAX_FILENAME_CHARS: usize = 100;

/// 文件夹名称中标题部分的最大长度（字符数）
pub const MAX_FOLDER_TITLE_CHARS: usize = 50;

/// 清理文件名中的非法字符
///
/// 将 `<>:"/\|?*` 替换为下划线，并截断到 100 个字符
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            other => other,
        })
        .take(MAX_FILENAME_CHARS)
        .collect()
}

/// 生成笔记文件夹名称: `<YYYY-MM-DD>_<标题前50字符>`
pub fn folder_name(date: &str, title: &str) -> String {
    let short_title: String = sanitize_filename(title)
        .chars()
        .take(MAX_FOLDER_TITLE_CHARS)
        .collect();
    format!("{}_{}", date, short_title)
}

/// 生成小写字母数字随机串
pub fn random_suffix(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect()
}

/// 生成媒体文件名: `<prefix>_<毫秒时间戳>_<随机串><扩展名>`
///
/// 扩展名取自 URL，缺失时使用 `default_ext`
pub fn media_filename(prefix: &str, url: &str, default_ext: &str) -> String {
    let ext = file_extension(url).unwrap_or_else(|| default_ext.to_string());
    format!(
        "{}_{}_{}{}",
        prefix,
        Utc::now().timestamp_millis(),
        random_suffix(6),
        ext
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_reserved_characters() {
        assert_eq!(sanitize_filename(r#"a<b>c:d"e/f\g|h?i*j"#), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn test_sanitize_truncates_by_chars() {
        let long = "猫".repeat(150);
        assert_eq!(sanitize_filename(&long).chars().count(), 100);
    }

    #[test]
    fn test_folder_name_limits_title() {
        let title = "标".repeat(80);
        let name = folder_name("2024-03-03", &title);
        assert!(name.starts_with("2024-03-03_"));
        assert_eq!(name.chars().count(), "2024-03-03_".chars().count() + 50);
    }

    #[test]
    fn test_media_filename_uses_url_extension() {
        let name = media_filename("video", "https://v.example/clip.webm?sign=1", ".mp4");
        assert!(name.starts_with("video_"));
        assert!(name.ends_with(".webm"));

        let name = media_filename("image", "https://img.example/abc", ".jpg");
        assert!(name.ends_with(".jpg"));
        let suffix = name.trim_end_matches(".jpg").rsplit('_').next().unwrap();
        assert_eq!(suffix.len(), 6);
        assert!(suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
