//! Error category and kind classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Permission errors
/// - 3xxx: Employee errors
/// - 4xxx: Department errors
/// - 5xxx: Legal entity errors
/// - 6xxx: Skill errors
/// - 7xxx: Avatar errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Employee errors (3xxx)
    Employee,
    /// Department errors (4xxx)
    Department,
    /// Legal entity errors (5xxx)
    LegalEntity,
    /// Skill errors (6xxx)
    Skill,
    /// Avatar errors (7xxx)
    Avatar,
    /// System errors (8xxx and up)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Employee,
            4000..5000 => Self::Department,
            5000..6000 => Self::LegalEntity,
            6000..7000 => Self::Skill,
            7000..8000 => Self::Avatar,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Permission => "permission",
            Self::Employee => "employee",
            Self::Department => "department",
            Self::LegalEntity => "legal_entity",
            Self::Skill => "skill",
            Self::Avatar => "avatar",
            Self::System => "system",
        }
    }
}

/// Outcome classification shared by every error code.
///
/// Categories say *where* an error comes from; the kind says *what* the
/// caller did wrong and drives the HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidInput,
    Forbidden,
    Unauthorized,
    ServiceUnavailable,
    IntegrityViolation,
    Internal,
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }

    /// Get the outcome kind for this error code
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound
            | Self::EmployeeNotFound
            | Self::DepartmentNotFound
            | Self::LegalEntityNotFound
            | Self::SkillNotFound
            | Self::AvatarNotFound => ErrorKind::NotFound,

            Self::AlreadyExists
            | Self::EmailAlreadyExists
            | Self::DepartmentNameExists
            | Self::DepartmentCycle
            | Self::ManagerAlreadyAssigned
            | Self::DepartmentNotEmpty
            | Self::LegalEntityNameExists
            | Self::LegalEntityInUse
            | Self::SkillNameExists
            | Self::AvatarNotPending
            | Self::AvatarAlreadyDeleted => ErrorKind::Conflict,

            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::RequiredField
            | Self::PasswordTooShort
            | Self::DepartmentInvalidParent
            | Self::RejectionReasonRequired
            | Self::FileTooLarge
            | Self::UnsupportedFileFormat
            | Self::EmptyFile
            | Self::NoFileProvided => ErrorKind::InvalidInput,

            Self::PermissionDenied
            | Self::AdminRequired
            | Self::NotResourceOwner
            | Self::AccountDisabled => ErrorKind::Forbidden,

            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid
            | Self::TokenTypeMismatch => ErrorKind::Unauthorized,

            Self::ServiceUnavailable => ErrorKind::ServiceUnavailable,
            Self::IntegrityViolation => ErrorKind::IntegrityViolation,

            Self::Success
            | Self::Unknown
            | Self::InternalError
            | Self::DatabaseError
            | Self::ConfigError
            | Self::FileStorageFailed => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(0), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2001), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(3001), ErrorCategory::Employee);
        assert_eq!(ErrorCategory::from_code(4001), ErrorCategory::Department);
        assert_eq!(ErrorCategory::from_code(5001), ErrorCategory::LegalEntity);
        assert_eq!(ErrorCategory::from_code(6001), ErrorCategory::Skill);
        assert_eq!(ErrorCategory::from_code(7105), ErrorCategory::Avatar);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(10000), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(
            ErrorCode::DepartmentCycle.category(),
            ErrorCategory::Department
        );
        assert_eq!(
            ErrorCode::IntegrityViolation.category(),
            ErrorCategory::System
        );
        assert_eq!(ErrorCategory::LegalEntity.name(), "legal_entity");
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(ErrorCode::DepartmentCycle.kind(), ErrorKind::Conflict);
        assert_eq!(ErrorCode::AvatarNotPending.kind(), ErrorKind::Conflict);
        assert_eq!(
            ErrorCode::RejectionReasonRequired.kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(ErrorCode::AdminRequired.kind(), ErrorKind::Forbidden);
        assert_eq!(ErrorCode::TokenExpired.kind(), ErrorKind::Unauthorized);
        assert_eq!(
            ErrorCode::IntegrityViolation.kind(),
            ErrorKind::IntegrityViolation
        );
    }

    #[test]
    fn test_kind_serialize() {
        let json = serde_json::to_string(&ErrorKind::ServiceUnavailable).unwrap();
        assert_eq!(json, "\"service_unavailable\"");
    }
}
