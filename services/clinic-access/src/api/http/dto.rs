//! 请求与响应结构

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::permission::Permission;
use crate::domain::role::Role;
use crate::domain::session::SessionUser;
use crate::domain::user::User;

#[derive(Debug, Serialize)]
pub struct PermissionView {
    pub id: &'static str,
    pub label: &'static str,
}

impl From<Permission> for PermissionView {
    fn from(p: Permission) -> Self {
        Self {
            id: p.code(),
            label: p.label(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct RoleResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub permissions: Vec<Permission>,
    /// 保留角色，不可删除
    pub protected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Role> for RoleResponse {
    fn from(role: Role) -> Self {
        Self {
            protected: role.is_superuser(),
            id: role.id.0,
            name: role.name,
            description: role.description,
            permissions: role.permissions.into_iter().collect(),
            created_at: role.audit_info.created_at,
            updated_at: role.audit_info.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: String,
}

/// 不包含密码哈希
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub role_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username,
            role_id: user.role_id.0,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user_id: String,
    pub username: String,
    pub role_id: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LoginForm {
    pub action: String,
    pub method: &'static str,
    pub fields: [&'static str; 2],
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub user: SessionUser,
    pub permissions: Vec<PermissionView>,
}
