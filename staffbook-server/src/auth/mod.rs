//! Authentication
//!
//! - [`JwtService`]: access / refresh token issuance and validation
//! - [`CurrentUser`]: the authenticated caller, extracted from the bearer token
//! - [`password`]: argon2 hashing

pub mod extractor;
pub mod jwt;
pub mod password;

use shared::models::{Role, User};
use uuid::Uuid;

pub use jwt::{Claims, JwtConfig, JwtError, JwtService, TokenType};

/// Authenticated caller
///
/// Loaded from the store on every request, so role changes and
/// deactivation take effect without waiting for the token to expire.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}
