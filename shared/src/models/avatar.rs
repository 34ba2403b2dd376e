//! Avatar Model

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Avatar moderation status
///
/// ```text
/// PENDING --accept--> ACTIVE --superseded--> ACCEPTED
///    \--reject--> REJECTED
/// any --delete--> DELETED
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(
    feature = "db",
    sqlx(type_name = "avatar_moderation_status", rename_all = "SCREAMING_SNAKE_CASE")
)]
pub enum ModerationStatus {
    Pending,
    Accepted,
    Active,
    Rejected,
    Deleted,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Active => "ACTIVE",
            Self::Rejected => "REJECTED",
            Self::Deleted => "DELETED",
        }
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome a moderator may choose for a pending avatar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModerationDecision {
    Accepted,
    Rejected,
}

/// Avatar row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Avatar {
    pub id: Uuid,
    pub user_id: Uuid,
    pub moderation_status: ModerationStatus,
    pub moderated_by_id: Option<Uuid>,
    pub storage_key: String,
    pub rejection_reason: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Avatar {
    /// Public download path for this avatar's blob
    pub fn url(&self) -> String {
        avatar_url(&self.storage_key)
    }
}

/// Download path for a storage key
pub fn avatar_url(storage_key: &str) -> String {
    format!("/api/employees/avatars/files/{}", storage_key)
}

/// Avatar as returned by moderation listings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarView {
    #[serde(flatten)]
    pub avatar: Avatar,
    pub url: String,
}

impl From<Avatar> for AvatarView {
    fn from(avatar: Avatar) -> Self {
        let url = avatar.url();
        Self { avatar, url }
    }
}

/// Moderation request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerateRequest {
    pub status: ModerationDecision,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

/// Upload result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvatarUploaded {
    pub avatar_id: Uuid,
    pub storage_key: String,
    pub status: ModerationStatus,
    pub url: String,
}
