//! Request size gate
//!
//! Rejects requests whose declared `Content-Length` exceeds the configured
//! upload ceiling before any handler reads the body. Bodies without a length
//! header are capped by axum's `DefaultBodyLimit`.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use shared::error::{AppError, ErrorCode};

use crate::state::AppState;

pub async fn reject_oversized(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let declared = request
        .headers()
        .get(http::header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    if let Some(length) = declared
        && length > state.max_upload_size
    {
        tracing::warn!(
            content_length = length,
            limit = state.max_upload_size,
            uri = %request.uri(),
            "Request body too large"
        );
        return AppError::with_message(
            ErrorCode::FileTooLarge,
            format!("Request exceeds {} bytes", state.max_upload_size),
        )
        .with_detail("max_size", state.max_upload_size)
        .into_response();
    }

    next.run(request).await
}
