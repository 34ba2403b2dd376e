//! Access control
//!
//! Every protected operation declares the set of roles allowed to run it as
//! data ([`Operation::allowed_roles`]). One gate, [`authorize`], checks a
//! caller against that set before any business logic runs. Operations on a
//! user's own record go through [`authorize_self_or`], which lets the owner
//! through regardless of role.

use shared::error::{AppError, ErrorCode};
use shared::models::Role;
use uuid::Uuid;

use crate::auth::CurrentUser;

/// Set of roles, one bit per [`Role`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSet(u8);

const fn bit(role: Role) -> u8 {
    match role {
        Role::Employee => 1 << 0,
        Role::HrAdmin => 1 << 1,
        Role::SystemAdmin => 1 << 2,
    }
}

impl RoleSet {
    pub const NONE: RoleSet = RoleSet(0);
    pub const ADMINS: RoleSet = RoleSet::of(&[Role::HrAdmin, Role::SystemAdmin]);
    pub const ALL: RoleSet = RoleSet::of(&Role::ALL);

    pub const fn of(roles: &[Role]) -> Self {
        let mut bits = 0;
        let mut i = 0;
        while i < roles.len() {
            bits |= bit(roles[i]);
            i += 1;
        }
        RoleSet(bits)
    }

    pub const fn contains(self, role: Role) -> bool {
        self.0 & bit(role) != 0
    }
}

/// Protected operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    // Employees
    ReadEmployees,
    UpdateEmployee,
    UpdateOwnProfile,
    DeactivateEmployee,
    SetEmployeeSkills,

    // Avatars
    UploadAvatar,
    /// Upload straight to ACTIVE, skipping moderation
    UploadAvatarUnmoderated,
    ListAvatars,
    ModerateAvatar,
    DeleteAvatar,
    DownloadAvatar,

    // Directory
    ReadDirectory,
    ManageDepartments,
    ManageLegalEntities,
    ManageSkills,
}

impl Operation {
    /// Roles allowed to run this operation on any record.
    ///
    /// For the self-service operations this is the set that may act on
    /// *other* users' records; owners are admitted by [`authorize_self_or`].
    pub const fn allowed_roles(self) -> RoleSet {
        match self {
            Operation::ReadEmployees
            | Operation::DownloadAvatar
            | Operation::ReadDirectory => RoleSet::ALL,

            Operation::UpdateEmployee
            | Operation::UpdateOwnProfile
            | Operation::DeactivateEmployee
            | Operation::SetEmployeeSkills
            | Operation::UploadAvatar
            | Operation::UploadAvatarUnmoderated
            | Operation::ListAvatars
            | Operation::ModerateAvatar
            | Operation::DeleteAvatar
            | Operation::ManageDepartments
            | Operation::ManageLegalEntities
            | Operation::ManageSkills => RoleSet::ADMINS,
        }
    }

    /// Error code reported when the gate rejects a caller
    const fn denied_code(self) -> ErrorCode {
        match self {
            Operation::UploadAvatarUnmoderated => ErrorCode::AdminRequired,
            Operation::UpdateOwnProfile | Operation::UploadAvatar | Operation::DeleteAvatar => {
                ErrorCode::NotResourceOwner
            }
            _ => ErrorCode::PermissionDenied,
        }
    }
}

/// Reject `actor` unless their role is in the operation's allowed set
pub fn authorize(actor: &CurrentUser, op: Operation) -> Result<(), AppError> {
    if op.allowed_roles().contains(actor.role) {
        return Ok(());
    }
    tracing::warn!(
        user_id = %actor.id,
        role = %actor.role,
        operation = ?op,
        "Operation denied"
    );
    Err(AppError::new(op.denied_code()).with_detail("operation", format!("{op:?}")))
}

/// Admit the owner of the record, otherwise fall back to [`authorize`]
pub fn authorize_self_or(
    actor: &CurrentUser,
    op: Operation,
    owner_id: Uuid,
) -> Result<(), AppError> {
    if actor.id == owner_id {
        return Ok(());
    }
    authorize(actor, op)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            email: "someone@example.com".into(),
            role,
        }
    }

    #[test]
    fn test_role_set_membership() {
        assert!(RoleSet::ADMINS.contains(Role::HrAdmin));
        assert!(RoleSet::ADMINS.contains(Role::SystemAdmin));
        assert!(!RoleSet::ADMINS.contains(Role::Employee));
        assert!(Role::ALL.iter().all(|r| RoleSet::ALL.contains(*r)));
        assert!(Role::ALL.iter().all(|r| !RoleSet::NONE.contains(*r)));
    }

    #[test]
    fn test_employee_cannot_manage_directory() {
        let employee = actor(Role::Employee);
        let err = authorize(&employee, Operation::ManageDepartments).unwrap_err();
        assert_eq!(err.code, ErrorCode::PermissionDenied);
        assert_eq!(err.http_status(), http::StatusCode::FORBIDDEN);

        assert!(authorize(&employee, Operation::ReadDirectory).is_ok());
        assert!(authorize(&actor(Role::HrAdmin), Operation::ManageDepartments).is_ok());
    }

    #[test]
    fn test_owner_passes_self_service_gate() {
        let employee = actor(Role::Employee);
        assert!(authorize_self_or(&employee, Operation::UploadAvatar, employee.id).is_ok());

        let err = authorize_self_or(&employee, Operation::UploadAvatar, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.code, ErrorCode::NotResourceOwner);

        let admin = actor(Role::SystemAdmin);
        assert!(authorize_self_or(&admin, Operation::UpdateOwnProfile, Uuid::new_v4()).is_ok());
    }

    #[test]
    fn test_unmoderated_upload_requires_admin_even_for_owner() {
        let employee = actor(Role::Employee);
        let err = authorize(&employee, Operation::UploadAvatarUnmoderated).unwrap_err();
        assert_eq!(err.code, ErrorCode::AdminRequired);
        assert!(authorize(&actor(Role::HrAdmin), Operation::UploadAvatarUnmoderated).is_ok());
    }
}
