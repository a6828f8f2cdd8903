use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use opentelemetry::trace::TraceContextExt;
use serde_json::json;
use thiserror::Error;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::llm::CompletionError;
use crate::search::SearchError;

const UNREACHABLE_DETAIL: &str =
    "无法连接到 AI 服务，请检查网络连接或代理设置（如设置了 HTTP_PROXY/HTTPS_PROXY）。";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Failure kinds the research path is allowed to absorb by falling back
    /// to simple generation. Anything else propagates to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AppError::Completion(_) | AppError::Search(_))
    }
}

fn get_trace_id() -> Option<String> {
    let span = Span::current();
    let context = span.context();
    let span_ref = context.span();
    let span_context = span_ref.span_context();

    if span_context.is_valid() {
        Some(span_context.trace_id().to_string())
    } else {
        None
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Completion(CompletionError::Unreachable(cause)) => {
                tracing::error!(error = %cause, "AI service unreachable");
                (StatusCode::SERVICE_UNAVAILABLE, UNREACHABLE_DETAIL.to_string())
            }
            AppError::Completion(err) => {
                tracing::error!(error = %err, "Completion error");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            AppError::Search(err) => {
                tracing::error!(error = %err, "Search error");
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            AppError::Io(err) => {
                tracing::error!(error = %err, "Storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = if let Some(trace_id) = get_trace_id() {
            json!({
                "error": error_message,
                "status": status.as_u16(),
                "trace_id": trace_id,
            })
        } else {
            json!({
                "error": error_message,
                "status": status.as_u16(),
            })
        };

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
