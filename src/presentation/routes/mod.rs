// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Extension, Json, Router,
};
use futures::stream::{self, Stream};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::domain::models::message::Notification;
use crate::presentation::handlers::message_handler::{self, AppState};

/// 创建应用路由
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version))
        .route("/v1/messages", post(message_handler::handle_message))
        .route("/v1/page-info", get(message_handler::page_info))
        .route("/v1/progress", get(progress))
        .route("/v1/events", get(events))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn version() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn progress(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": state.orchestrator.status(),
        "progress": state.orchestrator.progress(),
    }))
}

/// 以 SSE 推送进度、完成与停止通知
async fn events(
    Extension(state): Extension<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.orchestrator.subscribe();
    let stream = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(notification) => match Event::default()
                    .event(event_name(&notification))
                    .json_data(notification)
                {
                    Ok(event) => return Some((Ok(event), receiver)),
                    Err(e) => warn!("Failed to encode notification: {}", e),
                },
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Event stream lagged, {} notifications skipped", skipped)
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn event_name(notification: &Notification) -> &'static str {
    match notification {
        Notification::Progress(_) => "progress",
        Notification::Complete(_) => "complete",
        Notification::Stopped(_) => "stopped",
    }
}
