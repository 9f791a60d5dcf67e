// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 浏览器错误
    #[error("Browser error: {0}")]
    Browser(String),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 无效选择器
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// 页面上可探测的全局变量名称
pub const GLOBAL_NAMES: &[&str] = &[
    "__INITIAL_STATE__",
    "xhsData",
    "noteData",
    "videoData",
    "mediaData",
    "src_loaded",
];

/// 页面快照
///
/// 页面会话在某一时刻的只读副本；所有 DOM 解析都基于它同步进行
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    /// 序列化后的文档
    pub html: String,
    /// 页面地址
    pub url: String,
    /// 文档标题
    pub title: String,
    /// 已知名称的全局变量（JSON 形式）
    pub globals: HashMap<String, Value>,
    /// 资源计时条目名称
    pub resource_entries: Vec<String>,
    /// localStorage 与 sessionStorage 条目
    pub storage_entries: Vec<(String, String)>,
}

/// 页面会话特质
///
/// 代表当前正在查看的页面，提供提取所需的全部能力
#[async_trait]
pub trait PageSession: Send + Sync {
    /// 当前页面地址
    async fn url(&self) -> Result<String, EngineError>;

    /// 获取页面快照
    async fn snapshot(&self) -> Result<PageSnapshot, EngineError>;

    /// 滚动到页面底部
    async fn scroll_to_bottom(&self) -> Result<(), EngineError>;

    /// 当前滚动高度
    async fn scroll_height(&self) -> Result<u64, EngineError>;

    /// 统计匹配选择器的元素数量
    async fn count_elements(&self, selector: &str) -> Result<usize, EngineError>;

    /// 会话名称
    fn name(&self) -> &'static str;
}
