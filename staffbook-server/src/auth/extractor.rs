//! Bearer token extractor

use axum::{extract::FromRequestParts, http::request::Parts};
use shared::error::{AppError, ErrorCode};

use crate::auth::{CurrentUser, JwtError, JwtService, TokenType};
use crate::error::ServiceError;
use crate::state::AppState;

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let auth_header = parts
            .headers
            .get(http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = match auth_header {
            Some(header) => JwtService::extract_from_header(header)
                .ok_or_else(|| AppError::invalid_token("Invalid authorization header"))?,
            None => return Err(AppError::not_authenticated()),
        };

        let claims = state
            .jwt
            .validate(token, TokenType::Access)
            .map_err(|e| {
                tracing::debug!(error = %e, uri = %parts.uri, "Token rejected");
                match e {
                    JwtError::ExpiredToken => AppError::token_expired(),
                    JwtError::WrongType { .. } => AppError::new(ErrorCode::TokenTypeMismatch),
                    _ => AppError::invalid_token("Invalid token"),
                }
            })?;
        let user_id = claims
            .user_id()
            .map_err(|_| AppError::invalid_token("Malformed token subject"))?;

        let user = load_user(state, user_id)
            .await
            .map_err(AppError::from)?
            .ok_or_else(AppError::not_authenticated)?;
        if !user.is_active {
            return Err(AppError::new(ErrorCode::AccountDisabled));
        }

        let current = CurrentUser::from(&user);
        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

async fn load_user(
    state: &AppState,
    id: uuid::Uuid,
) -> Result<Option<shared::models::User>, ServiceError> {
    let mut tx = state.store.begin().await?;
    Ok(tx.user(id).await?)
}
