//! Avatar lifecycle manager
//!
//! Coordinates blob uploads with the moderation state stored in the
//! database. At most one avatar per user is ACTIVE, and the user's
//! `current_avatar_id` always points at it.
//!
//! The blob is written before the row is inserted. A failed write leaves no
//! row behind; a failed insert after a successful write leaves an orphaned
//! blob, which is tolerated.
//!
//! Avatar and user rows reference each other, so activation is a fixed
//! sequence of single-row statements inside one transaction: demote the
//! previous ACTIVE avatar, promote the new one, then repoint the user.

use bytes::Bytes;
use chrono::Utc;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    Avatar, AvatarUploaded, AvatarView, ModerateRequest, ModerationDecision, ModerationStatus,
};
use uuid::Uuid;

use crate::access::{self, Operation};
use crate::auth::CurrentUser;
use crate::db::{NewAvatar, Transaction};
use crate::error::ServiceResult;
use crate::state::AppState;
use crate::storage::{StoredObject, keys};

/// Accepted image content types
pub const ALLOWED_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "image/heic",
    "image/heif",
];

/// An uploaded image file
#[derive(Debug, Clone)]
pub struct AvatarUpload {
    pub bytes: Bytes,
    pub content_type: String,
    pub filename: Option<String>,
}

fn not_found(id: Uuid) -> AppError {
    AppError::new(ErrorCode::AvatarNotFound).with_detail("avatar_id", id.to_string())
}

fn validate_upload(upload: &AvatarUpload, max_size: usize) -> Result<(), AppError> {
    if upload.bytes.is_empty() {
        return Err(AppError::new(ErrorCode::EmptyFile));
    }
    if upload.bytes.len() > max_size {
        return Err(AppError::with_message(
            ErrorCode::FileTooLarge,
            format!("File too large, maximum is {max_size} bytes"),
        )
        .with_detail("max_size", max_size));
    }
    let content_type = upload.content_type.to_ascii_lowercase();
    if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(AppError::with_message(
            ErrorCode::UnsupportedFileFormat,
            format!(
                "Unsupported file format '{}', expected one of: {}",
                upload.content_type,
                ALLOWED_CONTENT_TYPES.join(", ")
            ),
        ));
    }
    Ok(())
}

/// Make `avatar` the user's single ACTIVE avatar and point the user at it
async fn activate(
    tx: &mut dyn Transaction,
    avatar: &Avatar,
    moderator: Uuid,
) -> ServiceResult<Avatar> {
    let demoted = tx.demote_active_avatars(avatar.user_id, avatar.id).await?;
    let active = tx
        .set_avatar_status(avatar.id, ModerationStatus::Active, Some(moderator), None)
        .await?
        .ok_or_else(|| not_found(avatar.id))?;
    tx.set_current_avatar(avatar.user_id, Some(avatar.id)).await?;

    tracing::debug!(
        avatar_id = %avatar.id,
        user_id = %avatar.user_id,
        demoted,
        "Avatar activated"
    );
    Ok(active)
}

/// Store the file and create a PENDING avatar, or an ACTIVE one when
/// `no_moderation` is set by an administrator
pub async fn upload_and_activate(
    state: &AppState,
    actor: &CurrentUser,
    user_id: Uuid,
    upload: AvatarUpload,
    no_moderation: bool,
) -> ServiceResult<AvatarUploaded> {
    access::authorize_self_or(actor, Operation::UploadAvatar, user_id)?;
    if no_moderation {
        access::authorize(actor, Operation::UploadAvatarUnmoderated)?;
    }
    validate_upload(&upload, state.max_upload_size)?;
    state.monitors.storage.ensure_available()?;

    {
        let mut tx = state.store.begin().await?;
        if tx.user(user_id).await?.is_none() {
            return Err(AppError::new(ErrorCode::EmployeeNotFound)
                .with_detail("user_id", user_id.to_string())
                .into());
        }
    }

    let storage_key = keys::avatar_key(
        user_id,
        upload.filename.as_deref(),
        &upload.content_type,
        Utc::now(),
    );
    state
        .storage
        .put(
            &state.avatar_bucket,
            &storage_key,
            upload.bytes,
            &upload.content_type,
        )
        .await?;

    let mut tx = state.store.begin().await?;
    let mut avatar = tx
        .insert_avatar(&NewAvatar {
            user_id,
            storage_key: storage_key.clone(),
            status: ModerationStatus::Pending,
            moderated_by_id: None,
        })
        .await
        .inspect_err(|e| {
            tracing::warn!(
                user_id = %user_id,
                storage_key = %storage_key,
                error = %e,
                "Avatar row insert failed, blob orphaned"
            );
        })?;
    if no_moderation {
        avatar = activate(tx.as_mut(), &avatar, actor.id).await?;
    }
    tx.commit().await?;

    tracing::info!(
        avatar_id = %avatar.id,
        user_id = %user_id,
        status = %avatar.moderation_status,
        storage_key = %storage_key,
        "Avatar uploaded"
    );
    Ok(AvatarUploaded {
        avatar_id: avatar.id,
        url: avatar.url(),
        status: avatar.moderation_status,
        storage_key,
    })
}

/// Accept or reject a PENDING avatar
pub async fn moderate(
    state: &AppState,
    actor: &CurrentUser,
    avatar_id: Uuid,
    request: ModerateRequest,
) -> ServiceResult<Avatar> {
    access::authorize(actor, Operation::ModerateAvatar)?;

    let mut tx = state.store.begin().await?;

    let avatar = tx.avatar(avatar_id).await?.ok_or_else(|| not_found(avatar_id))?;
    if avatar.moderation_status != ModerationStatus::Pending {
        return Err(AppError::new(ErrorCode::AvatarNotPending)
            .with_detail("avatar_id", avatar_id.to_string())
            .with_detail("status", avatar.moderation_status.as_str())
            .into());
    }

    let moderated = match request.status {
        ModerationDecision::Accepted => activate(tx.as_mut(), &avatar, actor.id).await?,
        ModerationDecision::Rejected => {
            let reason = request
                .rejection_reason
                .as_deref()
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .ok_or_else(|| AppError::new(ErrorCode::RejectionReasonRequired))?;
            tx.set_avatar_status(
                avatar_id,
                ModerationStatus::Rejected,
                Some(actor.id),
                Some(reason),
            )
            .await?
            .ok_or_else(|| not_found(avatar_id))?
        }
    };
    tx.commit().await?;

    tracing::info!(
        avatar_id = %avatar_id,
        moderator_id = %actor.id,
        status = %moderated.moderation_status,
        "Avatar moderated"
    );
    Ok(moderated)
}

/// Mark an avatar DELETED. When it was the displayed one, the user's most
/// recently accepted avatar takes its place.
pub async fn delete(state: &AppState, actor: &CurrentUser, avatar_id: Uuid) -> ServiceResult<()> {
    let mut tx = state.store.begin().await?;

    let avatar = tx.avatar(avatar_id).await?.ok_or_else(|| not_found(avatar_id))?;
    access::authorize_self_or(actor, Operation::DeleteAvatar, avatar.user_id)?;
    if avatar.moderation_status == ModerationStatus::Deleted {
        return Err(AppError::new(ErrorCode::AvatarAlreadyDeleted)
            .with_detail("avatar_id", avatar_id.to_string())
            .into());
    }

    let is_current = avatar.moderation_status == ModerationStatus::Active
        || tx
            .user(avatar.user_id)
            .await?
            .is_some_and(|u| u.current_avatar_id == Some(avatar_id));

    tx.set_avatar_status(avatar_id, ModerationStatus::Deleted, None, None)
        .await?
        .ok_or_else(|| not_found(avatar_id))?;

    let mut replacement = None;
    if is_current {
        if let Some(fallback) = tx.latest_accepted_avatar(avatar.user_id, avatar_id).await? {
            tx.set_avatar_status(fallback.id, ModerationStatus::Active, None, None)
                .await?;
            replacement = Some(fallback.id);
        }
        tx.set_current_avatar(avatar.user_id, replacement).await?;
    }
    tx.commit().await?;

    tracing::info!(
        avatar_id = %avatar_id,
        user_id = %avatar.user_id,
        replacement = ?replacement,
        "Avatar deleted"
    );
    Ok(())
}

/// Avatars in `status`, most recently updated first
pub async fn list_by_status(
    state: &AppState,
    actor: &CurrentUser,
    status: ModerationStatus,
) -> ServiceResult<Vec<AvatarView>> {
    access::authorize(actor, Operation::ListAvatars)?;

    let mut tx = state.store.begin().await?;
    let avatars = tx.list_avatars_by_status(status).await?;
    Ok(avatars.into_iter().map(AvatarView::from).collect())
}

/// Stored bytes of an avatar blob
pub async fn download(
    state: &AppState,
    actor: &CurrentUser,
    storage_key: &str,
) -> ServiceResult<StoredObject> {
    access::authorize(actor, Operation::DownloadAvatar)?;
    state.monitors.storage.ensure_available()?;

    let mut object = state
        .storage
        .get(&state.avatar_bucket, storage_key)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::AvatarNotFound).with_detail("storage_key", storage_key)
        })?;
    if object.content_type.is_none() {
        object.content_type = Some(
            mime_guess::from_path(storage_key)
                .first_raw()
                .unwrap_or("image/jpeg")
                .to_string(),
        );
    }
    Ok(object)
}
