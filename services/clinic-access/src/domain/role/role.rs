//! 角色实体

use std::collections::BTreeSet;

use clinic_common::{AuditInfo, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::permission::Permission;

/// 角色 ID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(pub String);

impl RoleId {
    /// 保留的超级用户角色
    pub const SUPERUSER: &'static str = "superuser";

    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    pub fn superuser() -> Self {
        Self(Self::SUPERUSER.to_string())
    }

    pub fn is_superuser(&self) -> bool {
        self.0 == Self::SUPERUSER
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// 角色实体
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: String,
    pub permissions: BTreeSet<Permission>,
    pub audit_info: AuditInfo,
}

impl Role {
    pub fn new(
        name: String,
        description: String,
        permissions: BTreeSet<Permission>,
        created_by: Option<UserId>,
    ) -> Self {
        Self {
            id: RoleId::new(),
            name,
            description,
            permissions,
            audit_info: AuditInfo::new(created_by),
        }
    }

    /// 整体替换名称、描述与权限集合
    pub fn update(
        &mut self,
        name: String,
        description: String,
        permissions: BTreeSet<Permission>,
        updated_by: Option<UserId>,
    ) {
        self.name = name;
        self.description = description;
        self.permissions = permissions;
        self.audit_info.touch(updated_by);
    }

    pub fn is_superuser(&self) -> bool {
        self.id.is_superuser()
    }

    /// 超级用户隐式拥有全部权限，与存储的权限行无关
    pub fn grants(&self, permission: Permission) -> bool {
        self.is_superuser() || self.permissions.contains(&permission)
    }
}
