//! Avatar routes: upload, moderation, deletion, download

use axum::extract::{Multipart, Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Avatar, AvatarUploaded, AvatarView, ModerateRequest, ModerationStatus};
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::ServiceResult;
use crate::services::avatars::{self, AvatarUpload};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/avatar/upload", post(upload))
        .route("/avatars/pending", get(list_pending))
        .route("/avatars/accepted", get(list_accepted))
        .route("/avatars/rejected", get(list_rejected))
        .route("/avatars/{id}/moderate", put(moderate))
        .route("/avatars/{id}", delete(remove))
        .route("/avatars/files/{*key}", get(download))
}

#[derive(Debug, Default, Deserialize)]
struct UploadParams {
    #[serde(default)]
    no_moderation: bool,
}

/// Read the `file` field of a multipart body
async fn read_file(mut multipart: Multipart) -> Result<AvatarUpload, AppError> {
    let multipart_error = |e: axum::extract::multipart::MultipartError| {
        if e.status() == http::StatusCode::PAYLOAD_TOO_LARGE {
            AppError::new(ErrorCode::FileTooLarge)
        } else {
            AppError::validation(format!("Invalid multipart request: {}", e.body_text()))
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let content_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| {
                filename
                    .as_deref()
                    .and_then(|name| mime_guess::from_path(name).first_raw())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(AvatarUpload {
            bytes,
            content_type,
            filename,
        });
    }

    Err(AppError::with_message(
        ErrorCode::NoFileProvided,
        "No 'file' field found in the multipart body",
    ))
}

async fn upload(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<Uuid>,
    Query(params): Query<UploadParams>,
    multipart: Multipart,
) -> ServiceResult<Json<AvatarUploaded>> {
    let file = read_file(multipart).await?;
    Ok(Json(
        avatars::upload_and_activate(&state, &user, user_id, file, params.no_moderation).await?,
    ))
}

async fn list_pending(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ServiceResult<Json<Vec<AvatarView>>> {
    Ok(Json(
        avatars::list_by_status(&state, &user, ModerationStatus::Pending).await?,
    ))
}

async fn list_accepted(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ServiceResult<Json<Vec<AvatarView>>> {
    Ok(Json(
        avatars::list_by_status(&state, &user, ModerationStatus::Accepted).await?,
    ))
}

async fn list_rejected(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ServiceResult<Json<Vec<AvatarView>>> {
    Ok(Json(
        avatars::list_by_status(&state, &user, ModerationStatus::Rejected).await?,
    ))
}

async fn moderate(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ModerateRequest>,
) -> ServiceResult<Json<Avatar>> {
    Ok(Json(avatars::moderate(&state, &user, id, payload).await?))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ServiceResult<Json<ApiResponse<()>>> {
    avatars::delete(&state, &user, id).await?;
    Ok(Json(ApiResponse::ok()))
}

async fn download(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(key): Path<String>,
) -> ServiceResult<Response> {
    let object = avatars::download(&state, &user, &key).await?;
    let content_type = object
        .content_type
        .unwrap_or_else(|| "image/jpeg".to_string());
    Ok((
        http::StatusCode::OK,
        [(http::header::CONTENT_TYPE, content_type)],
        object.bytes,
    )
        .into_response())
}
