// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static FULL_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})[-/](\d{1,2})[-/](\d{1,2})").expect("static date pattern"));

static MONTH_DAY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})[-/](\d{1,2})").expect("static month-day pattern"));

/// 将发布时间文本格式化为文件夹使用的 `YYYY-MM-DD`
///
/// 依次尝试：完整时间戳、`YYYY-MM-DD` 片段、`MM-DD` 片段（补当前年份）；
/// 都无法识别时使用当天日期
pub fn format_time_for_folder(raw: &str, today: NaiveDate) -> String {
    parse_date(raw.trim(), today)
        .unwrap_or(today)
        .format("%Y-%m-%d")
        .to_string()
}

fn parse_date(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }

    if let Some(caps) = FULL_DATE_RE.captures(raw) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    if let Some(caps) = MONTH_DAY_RE.captures(raw) {
        let month = caps[1].parse().ok()?;
        let day = caps[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(today.year(), month, day);
    }

    None
}
