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

use std::time::{Duration, Instant};

use crate::config::settings::DownloaderSettings;
use crate::engines::static_page::StaticPage;
use crate::engines::traits::EngineError;
use crate::engines::validators;

/// HTTP 页面引擎
///
/// 基于reqwest获取页面 HTML，生成静态页面会话
pub struct ReqwestEngine {
    client: reqwest::Client,
}

impl ReqwestEngine {
    /// 创建引擎
    ///
    /// # 参数
    ///
    /// * `user_agent` - 请求使用的 User-Agent
    /// * `timeout` - 单个请求超时时间
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .cookie_store(true)
            .build()?;
        Ok(Self { client })
    }

    /// 由下载器配置创建引擎
    pub fn from_settings(settings: &DownloaderSettings) -> Result<Self, EngineError> {
        Self::new(
            &settings.user_agent,
            Duration::from_secs(settings.timeout_secs),
        )
    }

    /// 获取页面并生成静态页面会话
    ///
    /// # 返回值
    ///
    /// * `Ok(StaticPage)` - 页面快照，地址为重定向后的最终地址
    /// * `Err(EngineError)` - 地址无效、请求失败或返回错误状态码
    pub async fn open(&self, url: &str) -> Result<StaticPage, EngineError> {
        let url = validators::validate_page_url(url)?;

        let start = Instant::now();
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await?
            .error_for_status()?;

        let final_url = response.url().to_string();
        let html = response.text().await?;

        tracing::debug!(
            "Fetched {} ({} bytes) in {}ms",
            final_url,
            html.len(),
            start.elapsed().as_millis()
        );

        Ok(StaticPage::new(html, final_url))
    }

    /// 获取引擎名称
    pub fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
