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

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

use xdownloader::config::settings::Settings;
use xdownloader::domain::models::options::ExtractionOptions;
use xdownloader::domain::services::extractor::{detect_page_kind, NoteExtractor, PageKind};
use xdownloader::engines::browser_engine::BrowserEngine;
use xdownloader::engines::reqwest_engine::ReqwestEngine;
use xdownloader::engines::static_page::StaticPage;
use xdownloader::engines::traits::PageSession;
use xdownloader::infrastructure::download_bridge::HttpDownloadBridge;
use xdownloader::infrastructure::metrics;
use xdownloader::infrastructure::storage::LocalStorage;
use xdownloader::presentation::handlers::message_handler::AppState;
use xdownloader::presentation::routes;
use xdownloader::utils::telemetry;
use xdownloader::workers::{DownloadOrchestrator, NotificationWorker, PacingPolicy};

const DEFAULT_PAGE_URL: &str = "https://www.xiaohongshu.com/explore";

#[derive(Parser, Debug)]
#[command(name = "xdownloader", version, about = "小红书笔记与媒体下载器")]
struct Cli {
    #[command(flatten)]
    page: PageArgs,

    /// 输出 JSON 格式日志
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Args, Debug)]
struct PageArgs {
    /// 页面地址
    #[arg(long, global = true)]
    url: Option<String>,

    /// 从本地 HTML 文件读取页面（配合 --url 指定页面地址）
    #[arg(long, global = true, conflicts_with = "browser")]
    html_file: Option<PathBuf>,

    /// 使用 Chrome 渲染页面
    #[arg(long, global = true)]
    browser: bool,
}

#[derive(Args, Debug, Default)]
struct OptionArgs {
    /// 最多收集的笔记数量
    #[arg(long)]
    max_notes: Option<usize>,

    /// 输出目录前缀
    #[arg(long)]
    output_dir: Option<String>,

    #[arg(long)]
    no_images: bool,

    #[arg(long)]
    no_videos: bool,

    #[arg(long)]
    no_text: bool,

    /// 提取前不滚动加载
    #[arg(long)]
    no_scroll: bool,
}

impl OptionArgs {
    fn apply(&self, mut options: ExtractionOptions) -> ExtractionOptions {
        if let Some(max) = self.max_notes {
            options.max_notes = Some(max);
        }
        if let Some(dir) = &self.output_dir {
            options.output_dir = dir.clone();
        }
        options.download_images &= !self.no_images;
        options.download_videos &= !self.no_videos;
        options.download_text &= !self.no_text;
        options.auto_scroll &= !self.no_scroll;
        options
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 显示页面上的笔记数量与用户信息
    Info,
    /// 批量下载主页上的笔记
    Run(OptionArgs),
    /// 下载当前查看的笔记
    Note {
        #[arg(long)]
        output_dir: Option<String>,
    },
    /// 启动消息服务
    Serve,
}

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并执行子命令
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Initialize logging
    telemetry::init_telemetry(cli.json_logs);
    info!("Starting xdownloader...");

    // 2. Load configuration
    let settings = Arc::new(Settings::new()?);
    info!("Configuration loaded");

    // 3. Initialize storage and download bridge
    let storage = Arc::new(LocalStorage::new(&settings.downloader.root));
    let bridge = Arc::new(HttpDownloadBridge::from_settings(
        &settings.downloader,
        storage,
    )?);
    let notifier = NotificationWorker::new(bridge.subscribe());
    info!("Starting {} worker", notifier.name());
    tokio::spawn(notifier.run());

    // 4. Build the orchestrator
    let extractor = Arc::new(NoteExtractor::with_defaults(
        settings.extraction.deep_video_scan,
    ));
    let orchestrator = Arc::new(DownloadOrchestrator::new(
        extractor,
        bridge.clone(),
        PacingPolicy::standard(),
    ));

    // 5. Open the page
    let page = open_page(&cli.page, &settings).await?;
    let page_url = page.url().await?;
    info!("Page opened with {} engine: {}", page.name(), page_url);

    let command = match cli.command {
        Some(command) => command,
        None => match detect_page_kind(&page_url) {
            PageKind::NoteDetail => Command::Note { output_dir: None },
            PageKind::UserProfile => Command::Run(OptionArgs::default()),
            PageKind::Unknown => Command::Info,
        },
    };

    match command {
        Command::Info => {
            let info = orchestrator.page_info(page.as_ref(), None).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "noteCount": info.note_count,
                    "userInfo": info.user_info,
                }))?
            );
        }
        Command::Run(args) => {
            let options = args.apply(settings.default_options());

            let stopper = orchestrator.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received, stopping after the current note");
                    stopper.stop();
                }
            });

            let summary = orchestrator.start(page.as_ref(), options).await?;
            bridge.wait_idle().await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Note { output_dir } => {
            let output_dir = output_dir.unwrap_or_else(|| settings.extraction.output_dir.clone());
            let summary = orchestrator
                .download_current_note(page.as_ref(), &output_dir)
                .await?;
            bridge.wait_idle().await;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Serve => serve(&settings, orchestrator, page).await?,
    }

    Ok(())
}

async fn open_page(args: &PageArgs, settings: &Settings) -> anyhow::Result<Arc<dyn PageSession>> {
    let url = args.url.clone().unwrap_or_else(|| DEFAULT_PAGE_URL.to_string());

    if let Some(path) = &args.html_file {
        let html = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        return Ok(Arc::new(StaticPage::new(html, url)));
    }

    if args.browser {
        let engine = BrowserEngine::new(settings.browser.clone());
        return Ok(Arc::new(engine.open(&url).await?));
    }

    let engine = ReqwestEngine::from_settings(&settings.downloader)?;
    Ok(Arc::new(engine.open(&url).await?))
}

async fn serve(
    settings: &Settings,
    orchestrator: Arc<DownloadOrchestrator>,
    page: Arc<dyn PageSession>,
) -> anyhow::Result<()> {
    let metrics_addr: SocketAddr =
        format!("{}:{}", settings.server.host, settings.server.metrics_port).parse()?;
    metrics::init_metrics(metrics_addr);

    let state = Arc::new(AppState {
        orchestrator,
        page,
        defaults: settings.default_options(),
    });
    let app = routes::routes(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await?;
    Ok(())
}
