// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::config::settings::BrowserSettings;
use crate::engines::traits::{EngineError, PageSession, PageSnapshot, GLOBAL_NAMES};
use crate::engines::validators;

// Global browser instance to avoid re-launching Chrome for every page.
static BROWSER_INSTANCE: OnceCell<Browser> = OnceCell::const_new();

/// 获取或初始化共享的浏览器实例
///
/// 设置了远程调试地址时连接已有的 Chrome，否则启动新的无头实例
pub async fn get_browser(settings: &BrowserSettings) -> Result<&'static Browser, EngineError> {
    BROWSER_INSTANCE
        .get_or_try_init(|| async {
            let remote_debugging_url = settings
                .remote_debugging_url
                .clone()
                .or_else(|| std::env::var("CHROMIUM_REMOTE_DEBUGGING_URL").ok());

            let (browser, mut handler) = if let Some(ref url) = remote_debugging_url {
                tracing::info!("Connecting to remote Chrome instance at: {}", url);
                Browser::connect(url).await.map_err(|e| {
                    EngineError::Browser(format!("Failed to connect to remote Chrome: {}", e))
                })?
            } else {
                let config = BrowserConfig::builder()
                    .no_sandbox()
                    .request_timeout(Duration::from_secs(settings.request_timeout_secs))
                    .arg("--disable-gpu")
                    .arg("--disable-dev-shm-usage")
                    .build()
                    .map_err(EngineError::Browser)?;

                Browser::launch(config)
                    .await
                    .map_err(|e| EngineError::Browser(e.to_string()))?
            };

            // Spawn a handler to process browser events
            tokio::spawn(async move {
                while let Some(h) = handler.next().await {
                    if h.is_err() {
                        break;
                    }
                }
            });

            Ok(browser)
        })
        .await
}

/// 浏览器引擎
///
/// 基于chromiumoxide打开或接管浏览器标签页
pub struct BrowserEngine {
    settings: BrowserSettings,
}

impl BrowserEngine {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    /// 打开页面
    ///
    /// 已有标签页正在显示该地址时直接接管，否则新建标签页并等待加载完成
    pub async fn open(&self, url: &str) -> Result<BrowserPage, EngineError> {
        let url = validators::validate_page_url(url)?;
        let browser = get_browser(&self.settings).await?;
        let timeout = Duration::from_secs(self.settings.request_timeout_secs);

        let pages = browser
            .pages()
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;
        for page in pages {
            if let Ok(Some(current)) = page.url().await {
                if current == url.as_str() {
                    tracing::debug!("Attaching to existing tab {}", current);
                    return Ok(BrowserPage::new(page));
                }
            }
        }

        let page = tokio::time::timeout(timeout, async {
            let page = browser
                .new_page(url.as_str())
                .await
                .map_err(|e| EngineError::Browser(e.to_string()))?;
            page.wait_for_navigation()
                .await
                .map_err(|e| EngineError::Browser(e.to_string()))?;
            Ok::<_, EngineError>(page)
        })
        .await
        .map_err(|_| EngineError::Timeout)??;

        Ok(BrowserPage::new(page))
    }
}

/// 浏览器页面会话
pub struct BrowserPage {
    page: Page,
}

impl BrowserPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    async fn eval<T: DeserializeOwned>(&self, script: &str) -> Result<T, EngineError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?
            .into_value::<T>()
            .map_err(|e| EngineError::Browser(format!("Unexpected script result: {}", e)))
    }
}

/// 读取已知名称的全局变量，无法序列化的值被跳过
fn globals_script() -> String {
    let names = serde_json::to_string(GLOBAL_NAMES).unwrap_or_else(|_| "[]".to_string());
    format!(
        r#"(() => {{
            const out = {{}};
            for (const name of {names}) {{
                try {{
                    const value = window[name];
                    if (value !== undefined) out[name] = JSON.parse(JSON.stringify(value));
                }} catch (e) {{}}
            }}
            return out;
        }})()"#
    )
}

const RESOURCE_ENTRIES_SCRIPT: &str = r#"(() => {
    if (!window.performance || !performance.getEntriesByType) return [];
    return performance.getEntriesByType('resource').map(e => e.name);
})()"#;

const STORAGE_ENTRIES_SCRIPT: &str = r#"(() => {
    const out = [];
    for (const store of [window.localStorage, window.sessionStorage]) {
        try {
            for (let i = 0; i < store.length; i++) {
                const key = store.key(i);
                out.push([key, store.getItem(key) || '']);
            }
        } catch (e) {}
    }
    return out;
})()"#;

#[async_trait]
impl PageSession for BrowserPage {
    async fn url(&self) -> Result<String, EngineError> {
        self.page
            .url()
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))
            .map(Option::unwrap_or_default)
    }

    async fn snapshot(&self) -> Result<PageSnapshot, EngineError> {
        let html = self
            .page
            .content()
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;
        let title = self
            .page
            .get_title()
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?
            .unwrap_or_default();
        let url = self.url().await?;

        let globals: HashMap<String, Value> = self.eval(&globals_script()).await?;
        let resource_entries: Vec<String> = self.eval(RESOURCE_ENTRIES_SCRIPT).await?;
        let storage_entries: Vec<(String, String)> = self.eval(STORAGE_ENTRIES_SCRIPT).await?;

        Ok(PageSnapshot {
            html,
            url,
            title,
            globals,
            resource_entries,
            storage_entries,
        })
    }

    async fn scroll_to_bottom(&self) -> Result<(), EngineError> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight);")
            .await
            .map_err(|e| EngineError::Browser(format!("Scroll failed: {}", e)))?;
        Ok(())
    }

    async fn scroll_height(&self) -> Result<u64, EngineError> {
        self.eval("document.body.scrollHeight").await
    }

    async fn count_elements(&self, selector: &str) -> Result<usize, EngineError> {
        let quoted = serde_json::to_string(selector)
            .map_err(|e| EngineError::InvalidSelector(e.to_string()))?;
        self.eval(&format!("document.querySelectorAll({}).length", quoted))
            .await
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}
