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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::domain::models::options::ExtractionOptions;

/// 应用程序配置设置
///
/// 包含提取默认值、下载器、服务器与浏览器等配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 提取与下载选项的默认值
    pub extraction: ExtractionSettings,
    /// 下载器配置
    pub downloader: DownloaderSettings,
    /// 服务器配置
    pub server: ServerSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
}

/// 提取配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionSettings {
    /// 最多收集的笔记数量
    pub max_notes: usize,
    /// 输出目录前缀
    pub output_dir: String,
    /// 是否下载图片
    pub download_images: bool,
    /// 是否下载视频
    pub download_videos: bool,
    /// 是否保存笔记文本
    pub download_text: bool,
    /// 提取前是否自动滚动加载
    pub auto_scroll: bool,
    /// 是否启用全局状态与 blob 视频地址探测
    pub deep_video_scan: bool,
}

/// 下载器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DownloaderSettings {
    /// 下载文件的根目录
    pub root: String,
    /// 单个请求超时时间（秒）
    pub timeout_secs: u64,
    /// 请求使用的 User-Agent
    pub user_agent: String,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
    /// Prometheus 指标端口
    pub metrics_port: u16,
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 远程调试地址，设置后连接已有的 Chrome 实例
    pub remote_debugging_url: Option<String>,
    /// 页面加载超时时间（秒）
    pub request_timeout_secs: u64,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加默认值、`config/default`、`config/{APP_ENVIRONMENT}` 与 `XDL__*` 环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("XDL").separator("__"));

        builder.build()?.try_deserialize()
    }

    fn defaults() -> Result<config::builder::ConfigBuilder<config::builder::DefaultState>, ConfigError>
    {
        Config::builder()
            // Default extraction options
            .set_default("extraction.max_notes", 10)?
            .set_default("extraction.output_dir", "小红书笔记")?
            .set_default("extraction.download_images", true)?
            .set_default("extraction.download_videos", true)?
            .set_default("extraction.download_text", true)?
            .set_default("extraction.auto_scroll", true)?
            .set_default("extraction.deep_video_scan", true)?
            // Default downloader settings
            .set_default("downloader.root", "./downloads")?
            .set_default("downloader.timeout_secs", 60)?
            .set_default(
                "downloader.user_agent",
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
            )?
            // Default server settings
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.metrics_port", 9000)?
            // Default browser settings
            .set_default("browser.request_timeout_secs", 30)
    }

    /// 由配置默认值构造提取选项
    pub fn default_options(&self) -> ExtractionOptions {
        ExtractionOptions {
            max_notes: Some(self.extraction.max_notes),
            output_dir: self.extraction.output_dir.clone(),
            download_images: self.extraction.download_images,
            download_videos: self.extraction.download_videos,
            download_text: self.extraction.download_text,
            auto_scroll: self.extraction.auto_scroll,
        }
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
