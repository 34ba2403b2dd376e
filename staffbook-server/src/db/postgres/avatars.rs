use shared::models::{Avatar, ModerationStatus};
use shared::util::now_millis;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::db::NewAvatar;

pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Avatar>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM avatars WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn storage_keys(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> Result<Vec<(Uuid, String)>, sqlx::Error> {
    sqlx::query_as("SELECT id, storage_key FROM avatars WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(conn)
        .await
}

pub async fn create(conn: &mut PgConnection, avatar: &NewAvatar) -> Result<Avatar, sqlx::Error> {
    let now = now_millis();
    sqlx::query_as(
        "INSERT INTO avatars (id, user_id, moderation_status, moderated_by_id, storage_key, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $6)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(avatar.user_id)
    .bind(avatar.status)
    .bind(avatar.moderated_by_id)
    .bind(&avatar.storage_key)
    .bind(now)
    .fetch_one(conn)
    .await
}

pub async fn set_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: ModerationStatus,
    moderated_by: Option<Uuid>,
    rejection_reason: Option<&str>,
) -> Result<Option<Avatar>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE avatars SET
            moderation_status = $2,
            moderated_by_id = COALESCE($3, moderated_by_id),
            rejection_reason = COALESCE($4, rejection_reason),
            updated_at = $5
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(status)
    .bind(moderated_by)
    .bind(rejection_reason)
    .bind(now_millis())
    .fetch_optional(conn)
    .await
}

pub async fn demote_active(
    conn: &mut PgConnection,
    user_id: Uuid,
    except: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE avatars SET moderation_status = $3, updated_at = $4
         WHERE user_id = $1 AND id <> $2 AND moderation_status = $5",
    )
    .bind(user_id)
    .bind(except)
    .bind(ModerationStatus::Accepted)
    .bind(now_millis())
    .bind(ModerationStatus::Active)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn latest_accepted(
    conn: &mut PgConnection,
    user_id: Uuid,
    excluding: Uuid,
) -> Result<Option<Avatar>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM avatars
         WHERE user_id = $1 AND id <> $2 AND moderation_status = $3
         ORDER BY updated_at DESC
         LIMIT 1",
    )
    .bind(user_id)
    .bind(excluding)
    .bind(ModerationStatus::Accepted)
    .fetch_optional(conn)
    .await
}

pub async fn list_by_status(
    conn: &mut PgConnection,
    status: ModerationStatus,
) -> Result<Vec<Avatar>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM avatars WHERE moderation_status = $1 ORDER BY updated_at DESC")
        .bind(status)
        .fetch_all(conn)
        .await
}
