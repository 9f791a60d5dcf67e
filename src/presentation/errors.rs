// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::engines::traits::EngineError;
use crate::utils::errors::{ExtractionError, RunError};

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<RunError>() {
            return match err {
                RunError::InProgress => StatusCode::CONFLICT,
                RunError::InvalidOptions(_) => StatusCode::BAD_REQUEST,
                RunError::Extraction(e) => extraction_status(e),
            };
        }
        match self.0.downcast_ref::<ExtractionError>() {
            Some(e) => extraction_status(e),
            None => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn extraction_status(err: &ExtractionError) -> StatusCode {
    match err {
        ExtractionError::NoNotesFound | ExtractionError::NoTitle => StatusCode::NOT_FOUND,
        ExtractionError::Page(EngineError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
        ExtractionError::Page(_) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "success": false, "error": self.0.to_string() }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
