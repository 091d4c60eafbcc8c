//! 访问控制错误

use clinic_errors::AppError;
use thiserror::Error;

use crate::domain::permission::Permission;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Missing permission '{permission}'")]
    Forbidden { permission: Permission },

    #[error("A role named '{0}' already exists")]
    DuplicateName(String),

    #[error("Role '{0}' is still assigned to one or more users")]
    RoleInUse(String),

    #[error("Role '{0}' is protected and cannot be deleted")]
    ProtectedRole(String),

    /// 授予、变更或删除 `superuser` 账号只能由 superuser 执行
    #[error("Only a superuser may grant the '{0}' role or manage its holders")]
    SuperuserRequired(String),

    #[error("Role '{0}' not found")]
    RoleNotFound(String),

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("Unknown permission '{0}'")]
    UnknownPermission(String),

    #[error("Username '{0}' is already taken")]
    DuplicateUsername(String),

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] AppError),
}

impl AccessError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// 指标标签
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden { .. } => "forbidden",
            Self::DuplicateName(_) => "duplicate_name",
            Self::RoleInUse(_) => "role_in_use",
            Self::ProtectedRole(_) => "protected_role",
            Self::SuperuserRequired(_) => "superuser_required",
            Self::RoleNotFound(_) => "role_not_found",
            Self::UserNotFound(_) => "user_not_found",
            Self::UnknownPermission(_) => "unknown_permission",
            Self::DuplicateUsername(_) => "duplicate_username",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Validation(_) => "validation",
            Self::Store(_) => "store",
        }
    }
}

impl From<AccessError> for AppError {
    fn from(error: AccessError) -> Self {
        let message = error.to_string();
        match error {
            AccessError::Unauthenticated | AccessError::InvalidCredentials => {
                AppError::unauthenticated(message)
            }
            AccessError::Forbidden { .. }
            | AccessError::ProtectedRole(_)
            | AccessError::SuperuserRequired(_) => AppError::forbidden(message),
            AccessError::DuplicateName(_)
            | AccessError::RoleInUse(_)
            | AccessError::DuplicateUsername(_) => AppError::conflict(message),
            AccessError::RoleNotFound(_) | AccessError::UserNotFound(_) => {
                AppError::not_found(message)
            }
            AccessError::UnknownPermission(_) | AccessError::Validation(_) => {
                AppError::validation(message)
            }
            AccessError::Store(e) => e,
        }
    }
}

pub type AccessResult<T> = Result<T, AccessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AccessError::Unauthenticated, 401),
            (
                AccessError::Forbidden {
                    permission: Permission::RolesManage,
                },
                403,
            ),
            (AccessError::ProtectedRole("superuser".into()), 403),
            (AccessError::SuperuserRequired("superuser".into()), 403),
            (AccessError::DuplicateName("Auditor".into()), 409),
            (AccessError::RoleInUse("frontdesk".into()), 409),
            (AccessError::RoleNotFound("x".into()), 404),
            (AccessError::UnknownPermission("nope".into()), 400),
            (AccessError::InvalidCredentials, 401),
        ];

        for (error, status) in cases {
            let app: AppError = error.into();
            assert_eq!(app.status_code(), status, "{}", app);
        }
    }

    #[test]
    fn test_store_error_passes_through() {
        let app: AppError = AccessError::Store(AppError::database("connection reset")).into();
        assert!(app.is_storage_failure());
        assert_eq!(app.status_code(), 500);
    }

    #[test]
    fn test_forbidden_names_permission() {
        let err = AccessError::Forbidden {
            permission: Permission::ReportsView,
        };
        assert_eq!(err.to_string(), "Missing permission 'reports.view'");
    }
}
