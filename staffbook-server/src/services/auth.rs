//! Auth manager: registration, login, token refresh, bootstrap accounts

use shared::error::{AppError, ErrorCode};
use shared::models::{
    LoginRequest, NewUser, RegisterRequest, Role, TokenResponse, User, UserView,
};
use shared::util::normalize_email;

use crate::auth::password::{hash_password, verify_password};
use crate::auth::{CurrentUser, JwtError, TokenType};
use crate::config::DefaultAccount;
use crate::error::ServiceResult;
use crate::services::users;
use crate::state::AppState;

pub const MIN_PASSWORD_LENGTH: usize = 6;

fn jwt_failure(e: JwtError) -> AppError {
    match e {
        JwtError::ExpiredToken => AppError::token_expired(),
        JwtError::WrongType { .. } => AppError::new(ErrorCode::TokenTypeMismatch),
        JwtError::GenerationFailed(msg) => AppError::internal(msg),
        _ => AppError::invalid_token("Invalid token"),
    }
}

fn hash(password: &str) -> Result<String, AppError> {
    hash_password(password).map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))
}

fn tokens(state: &AppState, user: &User, refresh_token: Option<String>) -> ServiceResult<TokenResponse> {
    let access_token = state.jwt.access_token(user.id).map_err(jwt_failure)?;
    let refresh_token = match refresh_token {
        Some(token) => token,
        None => state.jwt.refresh_token(user.id).map_err(jwt_failure)?,
    };
    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "bearer".into(),
        user_id: user.id,
        role: user.role,
    })
}

/// Self-registration; always creates an EMPLOYEE
pub async fn register(state: &AppState, request: RegisterRequest) -> ServiceResult<TokenResponse> {
    let email = normalize_email(&request.email);
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("A valid email is required")
            .with_detail("field", "email")
            .into());
    }
    let first_name = request.first_name.trim();
    let last_name = request.last_name.trim();
    if first_name.is_empty() || last_name.is_empty() {
        return Err(AppError::new(ErrorCode::RequiredField)
            .with_detail("field", "first_name, last_name")
            .into());
    }
    if request.password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AppError::new(ErrorCode::PasswordTooShort)
            .with_detail("min_length", MIN_PASSWORD_LENGTH)
            .into());
    }

    let password_hash = hash(&request.password)?;

    let mut tx = state.store.begin().await?;
    if tx.user_by_email(&email).await?.is_some() {
        return Err(AppError::new(ErrorCode::EmailAlreadyExists)
            .with_detail("email", email)
            .into());
    }
    let user = tx
        .insert_user(&NewUser {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email,
            password_hash,
            role: Role::Employee,
        })
        .await?;
    tx.commit().await?;

    tracing::info!(user_id = %user.id, email = %user.email, "User registered");
    tokens(state, &user, None)
}

pub async fn login(state: &AppState, request: LoginRequest) -> ServiceResult<TokenResponse> {
    let email = normalize_email(&request.email);

    let mut tx = state.store.begin().await?;
    let user = tx.user_by_email(&email).await?;
    drop(tx);

    let Some(user) = user else {
        tracing::warn!(email = %email, "Login failed: unknown email");
        return Err(AppError::invalid_credentials().into());
    };
    if !verify_password(&request.password, &user.password_hash) {
        tracing::warn!(user_id = %user.id, "Login failed: wrong password");
        return Err(AppError::invalid_credentials().into());
    }
    if !user.is_active {
        tracing::warn!(user_id = %user.id, "Login refused: account deactivated");
        return Err(AppError::new(ErrorCode::AccountDisabled).into());
    }

    tracing::info!(user_id = %user.id, "User logged in");
    tokens(state, &user, None)
}

/// New access token for a valid refresh token; the refresh token is echoed back
pub async fn refresh(state: &AppState, refresh_token: &str) -> ServiceResult<TokenResponse> {
    let claims = state
        .jwt
        .validate(refresh_token, TokenType::Refresh)
        .map_err(jwt_failure)?;
    let user_id = claims.user_id().map_err(jwt_failure)?;

    let mut tx = state.store.begin().await?;
    let user = tx
        .user(user_id)
        .await?
        .ok_or_else(|| AppError::invalid_token("Unknown token subject"))?;
    drop(tx);
    if !user.is_active {
        return Err(AppError::new(ErrorCode::AccountDisabled).into());
    }

    tokens(state, &user, Some(refresh_token.to_string()))
}

pub async fn me(state: &AppState, actor: &CurrentUser) -> ServiceResult<UserView> {
    let mut tx = state.store.begin().await?;
    let user = tx
        .user(actor.id)
        .await?
        .ok_or_else(|| users::not_found(actor.id))?;
    users::view(tx.as_mut(), user).await
}

/// Create the account unless a user with that email already exists
pub async fn ensure_account(
    state: &AppState,
    account: &DefaultAccount,
    role: Role,
    first_name: &str,
) -> ServiceResult<()> {
    let email = normalize_email(&account.email);

    {
        let mut tx = state.store.begin().await?;
        if tx.user_by_email(&email).await?.is_some() {
            return Ok(());
        }
    }

    let password_hash = hash(&account.password)?;
    let mut tx = state.store.begin().await?;
    let user = tx
        .insert_user(&NewUser {
            first_name: first_name.to_string(),
            last_name: "Account".into(),
            email,
            password_hash,
            role,
        })
        .await?;
    tx.commit().await?;

    tracing::info!(user_id = %user.id, email = %user.email, role = %role, "Bootstrap account created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::error::app_error;

    fn registration(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            email: email.into(),
            password: password.into(),
            first_name: "Ann".into(),
            last_name: "Lee".into(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let state = AppState::in_memory(&Config::for_tests());
        let registered = register(&state, registration(" Ann@Example.com ", "secret1"))
            .await
            .unwrap();
        assert_eq!(registered.role, Role::Employee);

        let logged_in = login(
            &state,
            LoginRequest {
                email: "ann@example.com".into(),
                password: "secret1".into(),
            },
        )
        .await
        .unwrap();
        assert_eq!(logged_in.user_id, registered.user_id);

        let err = app_error(
            register(&state, registration("ann@example.com", "secret2"))
                .await
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::EmailAlreadyExists);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let state = AppState::in_memory(&Config::for_tests());
        register(&state, registration("ann@example.com", "secret1"))
            .await
            .unwrap();

        let wrong = LoginRequest {
            email: "ann@example.com".into(),
            password: "nope".into(),
        };
        let err = app_error(login(&state, wrong).await.unwrap_err());
        assert_eq!(err.code, ErrorCode::InvalidCredentials);

        let unknown = LoginRequest {
            email: "ghost@example.com".into(),
            password: "secret1".into(),
        };
        let err = app_error(login(&state, unknown).await.unwrap_err());
        assert_eq!(err.code, ErrorCode::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_short_password() {
        let state = AppState::in_memory(&Config::for_tests());
        let err = app_error(
            register(&state, registration("ann@example.com", "12345"))
                .await
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::PasswordTooShort);
    }

    #[tokio::test]
    async fn test_refresh_requires_refresh_token() {
        let state = AppState::in_memory(&Config::for_tests());
        let issued = register(&state, registration("ann@example.com", "secret1"))
            .await
            .unwrap();

        let refreshed = refresh(&state, &issued.refresh_token).await.unwrap();
        assert_eq!(refreshed.refresh_token, issued.refresh_token);
        assert_eq!(refreshed.user_id, issued.user_id);

        let err = app_error(refresh(&state, &issued.access_token).await.unwrap_err());
        assert_eq!(err.code, ErrorCode::TokenTypeMismatch);
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let config = Config::for_tests();
        let state = AppState::in_memory(&config);
        ensure_account(&state, &config.admin, Role::SystemAdmin, "System")
            .await
            .unwrap();
        ensure_account(&state, &config.admin, Role::SystemAdmin, "System")
            .await
            .unwrap();

        let mut tx = state.store.begin().await.unwrap();
        let admins: Vec<User> = tx
            .list_users(false)
            .await
            .unwrap()
            .into_iter()
            .filter(|u| u.role == Role::SystemAdmin)
            .collect();
        assert_eq!(admins.len(), 1);
    }
}
