// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::{Extension, Json};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::domain::models::message::{Request, Response};
use crate::domain::models::options::ExtractionOptions;
use crate::engines::traits::PageSession;
use crate::presentation::errors::AppError;
use crate::workers::orchestrator::{DownloadOrchestrator, PageInfo};

/// 未知操作的应答文本
pub const UNKNOWN_ACTION: &str = "未知操作";

/// 服务共享状态
///
/// 服务启动时打开的页面，所有请求都作用于它
pub struct AppState {
    pub orchestrator: Arc<DownloadOrchestrator>,
    pub page: Arc<dyn PageSession>,
    /// 请求未携带 `options` 时使用的默认值
    pub defaults: ExtractionOptions,
}

/// 处理控制端消息
///
/// 无法识别的 `action` 返回 `{success: false, error: "未知操作"}`
pub async fn handle_message(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Json<Response> {
    let request = match parse_request(payload) {
        Ok(request) => request,
        Err(response) => return Json(response),
    };
    Json(dispatch(&state, request).await)
}

fn parse_request(payload: Value) -> Result<Request, Response> {
    let action = payload
        .get("action")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    if !matches!(
        action.as_str(),
        "getPageInfo" | "startDownload" | "stopDownload"
    ) {
        warn!("Unknown action: {:?}", action);
        return Err(Response::failure(UNKNOWN_ACTION));
    }

    serde_json::from_value(payload).map_err(|e| {
        warn!("Malformed {} request: {}", action, e);
        Response::failure(format!("无效请求: {}", e))
    })
}

/// 把请求交给编排器执行
pub async fn dispatch(state: &AppState, request: Request) -> Response {
    match request {
        Request::GetPageInfo { options } => {
            match state.orchestrator.page_info(state.page.as_ref(), options).await {
                Ok(PageInfo {
                    note_count,
                    user_info,
                }) => Response {
                    note_count: Some(note_count),
                    user_info: Some(user_info),
                    ..Response::ok()
                },
                Err(e) => Response::failure(e.to_string()),
            }
        }
        Request::StartDownload { options } => {
            let options = options.unwrap_or_else(|| state.defaults.clone());
            match state.orchestrator.start(state.page.as_ref(), options).await {
                Ok(summary) => Response {
                    total_notes: Some(summary.progress.total_notes),
                    downloaded_notes: Some(summary.progress.downloaded_notes),
                    ..Response::ok()
                },
                Err(e) => Response::failure(e.to_string()),
            }
        }
        Request::StopDownload => {
            state.orchestrator.stop();
            Response::ok()
        }
    }
}

/// 以 REST 形式查询页面信息
pub async fn page_info(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, AppError> {
    let info = state
        .orchestrator
        .page_info(state.page.as_ref(), Some(state.defaults.clone()))
        .await?;
    info!("Page info: {} notes", info.note_count);
    Ok(Json(serde_json::json!({
        "noteCount": info.note_count,
        "userInfo": info.user_info,
    })))
}
