//! Unified error codes for staffbook
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Employee errors
//! - 4xxx: Department errors
//! - 5xxx: Legal entity errors
//! - 6xxx: Skill errors
//! - 7xxx: Avatar / upload errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so clients can switch on
/// them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Token of the wrong type (access vs refresh)
    TokenTypeMismatch = 1005,
    /// Account is deactivated
    AccountDisabled = 1007,
    /// Password too short
    PasswordTooShort = 1008,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Admin role required
    AdminRequired = 2003,
    /// Caller does not own the resource
    NotResourceOwner = 2006,

    // ==================== 3xxx: Employee ====================
    /// Employee not found
    EmployeeNotFound = 3001,
    /// Email already registered
    EmailAlreadyExists = 3002,

    // ==================== 4xxx: Department ====================
    /// Department not found
    DepartmentNotFound = 4001,
    /// Department name already exists
    DepartmentNameExists = 4002,
    /// Parent belongs to a different legal entity
    DepartmentInvalidParent = 4003,
    /// Parent change would create a cycle
    DepartmentCycle = 4004,
    /// User already manages another department
    ManagerAlreadyAssigned = 4005,
    /// Department still has subdepartments or employees
    DepartmentNotEmpty = 4006,

    // ==================== 5xxx: Legal entity ====================
    /// Legal entity not found
    LegalEntityNotFound = 5001,
    /// Legal entity name already exists
    LegalEntityNameExists = 5002,
    /// Legal entity still owns departments
    LegalEntityInUse = 5003,

    // ==================== 6xxx: Skill ====================
    /// Skill not found
    SkillNotFound = 6001,
    /// Skill name already exists
    SkillNameExists = 6002,

    // ==================== 7xxx: Avatar ====================
    /// Avatar not found
    AvatarNotFound = 7001,
    /// Avatar is not awaiting moderation
    AvatarNotPending = 7002,
    /// Rejection requires a reason
    RejectionReasonRequired = 7003,
    /// Avatar already deleted
    AvatarAlreadyDeleted = 7004,
    /// Upload exceeds the size limit
    FileTooLarge = 7101,
    /// Unsupported file format
    UnsupportedFileFormat = 7102,
    /// Uploaded file is empty
    EmptyFile = 7103,
    /// No file in the multipart body
    NoFileProvided = 7104,
    /// Object storage rejected the operation
    FileStorageFailed = 7105,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Database constraint fired
    IntegrityViolation = 9003,
    /// Dependency unavailable
    ServiceUnavailable = 9004,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Token has expired",
            ErrorCode::TokenInvalid => "Token is invalid",
            ErrorCode::TokenTypeMismatch => "Token type mismatch",
            ErrorCode::AccountDisabled => "Account is deactivated",
            ErrorCode::PasswordTooShort => "Password is too short",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::AdminRequired => "Admin role required",
            ErrorCode::NotResourceOwner => "Resource belongs to another user",

            // Employee
            ErrorCode::EmployeeNotFound => "Employee not found",
            ErrorCode::EmailAlreadyExists => "Email already registered",

            // Department
            ErrorCode::DepartmentNotFound => "Department not found",
            ErrorCode::DepartmentNameExists => "Department name already exists",
            ErrorCode::DepartmentInvalidParent => {
                "Parent department belongs to a different legal entity"
            }
            ErrorCode::DepartmentCycle => "Department cannot be moved under its own descendant",
            ErrorCode::ManagerAlreadyAssigned => "User already manages another department",
            ErrorCode::DepartmentNotEmpty => "Department has subdepartments or employees",

            // Legal entity
            ErrorCode::LegalEntityNotFound => "Legal entity not found",
            ErrorCode::LegalEntityNameExists => "Legal entity name already exists",
            ErrorCode::LegalEntityInUse => "Legal entity still owns departments",

            // Skill
            ErrorCode::SkillNotFound => "Skill not found",
            ErrorCode::SkillNameExists => "Skill name already exists",

            // Avatar
            ErrorCode::AvatarNotFound => "Avatar not found",
            ErrorCode::AvatarNotPending => "Avatar is not pending moderation",
            ErrorCode::RejectionReasonRequired => "Rejection reason is required",
            ErrorCode::AvatarAlreadyDeleted => "Avatar already deleted",
            ErrorCode::FileTooLarge => "File too large",
            ErrorCode::UnsupportedFileFormat => "Unsupported file format",
            ErrorCode::EmptyFile => "File is empty",
            ErrorCode::NoFileProvided => "No file provided",
            ErrorCode::FileStorageFailed => "File storage operation failed",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::IntegrityViolation => "Data integrity violation",
            ErrorCode::ServiceUnavailable => "Service temporarily unavailable",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::TokenTypeMismatch),
            1007 => Ok(ErrorCode::AccountDisabled),
            1008 => Ok(ErrorCode::PasswordTooShort),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2003 => Ok(ErrorCode::AdminRequired),
            2006 => Ok(ErrorCode::NotResourceOwner),

            // Employee
            3001 => Ok(ErrorCode::EmployeeNotFound),
            3002 => Ok(ErrorCode::EmailAlreadyExists),

            // Department
            4001 => Ok(ErrorCode::DepartmentNotFound),
            4002 => Ok(ErrorCode::DepartmentNameExists),
            4003 => Ok(ErrorCode::DepartmentInvalidParent),
            4004 => Ok(ErrorCode::DepartmentCycle),
            4005 => Ok(ErrorCode::ManagerAlreadyAssigned),
            4006 => Ok(ErrorCode::DepartmentNotEmpty),

            // Legal entity
            5001 => Ok(ErrorCode::LegalEntityNotFound),
            5002 => Ok(ErrorCode::LegalEntityNameExists),
            5003 => Ok(ErrorCode::LegalEntityInUse),

            // Skill
            6001 => Ok(ErrorCode::SkillNotFound),
            6002 => Ok(ErrorCode::SkillNameExists),

            // Avatar
            7001 => Ok(ErrorCode::AvatarNotFound),
            7002 => Ok(ErrorCode::AvatarNotPending),
            7003 => Ok(ErrorCode::RejectionReasonRequired),
            7004 => Ok(ErrorCode::AvatarAlreadyDeleted),
            7101 => Ok(ErrorCode::FileTooLarge),
            7102 => Ok(ErrorCode::UnsupportedFileFormat),
            7103 => Ok(ErrorCode::EmptyFile),
            7104 => Ok(ErrorCode::NoFileProvided),
            7105 => Ok(ErrorCode::FileStorageFailed),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::IntegrityViolation),
            9004 => Ok(ErrorCode::ServiceUnavailable),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[ErrorCode] = &[
        ErrorCode::Success,
        ErrorCode::Unknown,
        ErrorCode::ValidationFailed,
        ErrorCode::NotFound,
        ErrorCode::AlreadyExists,
        ErrorCode::InvalidRequest,
        ErrorCode::RequiredField,
        ErrorCode::NotAuthenticated,
        ErrorCode::InvalidCredentials,
        ErrorCode::TokenExpired,
        ErrorCode::TokenInvalid,
        ErrorCode::TokenTypeMismatch,
        ErrorCode::AccountDisabled,
        ErrorCode::PasswordTooShort,
        ErrorCode::PermissionDenied,
        ErrorCode::AdminRequired,
        ErrorCode::NotResourceOwner,
        ErrorCode::EmployeeNotFound,
        ErrorCode::EmailAlreadyExists,
        ErrorCode::DepartmentNotFound,
        ErrorCode::DepartmentNameExists,
        ErrorCode::DepartmentInvalidParent,
        ErrorCode::DepartmentCycle,
        ErrorCode::ManagerAlreadyAssigned,
        ErrorCode::DepartmentNotEmpty,
        ErrorCode::LegalEntityNotFound,
        ErrorCode::LegalEntityNameExists,
        ErrorCode::LegalEntityInUse,
        ErrorCode::SkillNotFound,
        ErrorCode::SkillNameExists,
        ErrorCode::AvatarNotFound,
        ErrorCode::AvatarNotPending,
        ErrorCode::RejectionReasonRequired,
        ErrorCode::AvatarAlreadyDeleted,
        ErrorCode::FileTooLarge,
        ErrorCode::UnsupportedFileFormat,
        ErrorCode::EmptyFile,
        ErrorCode::NoFileProvided,
        ErrorCode::FileStorageFailed,
        ErrorCode::InternalError,
        ErrorCode::DatabaseError,
        ErrorCode::IntegrityViolation,
        ErrorCode::ServiceUnavailable,
        ErrorCode::ConfigError,
    ];

    #[test]
    fn test_every_code_converts_back() {
        for code in ALL {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(*code));
        }
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::NotFound.is_success());
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ErrorCode::DepartmentCycle).unwrap();
        assert_eq!(json, "4004");
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<ErrorCode, _> = serde_json::from_str("999");
        assert!(result.is_err());
        assert_eq!(ErrorCode::try_from(8888), Err(InvalidErrorCode(8888)));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::AvatarNotPending), "7002");
        assert_eq!(
            format!("{}", InvalidErrorCode(12)),
            "invalid error code: 12"
        );
    }
}
