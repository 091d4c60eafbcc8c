//! 角色仓储接口

use std::collections::BTreeSet;

use async_trait::async_trait;
use clinic_errors::AppResult;

use super::role::{Role, RoleId};
use crate::domain::permission::Permission;

/// 角色仓储接口
///
/// 角色行本身；权限关联由 [`RolePermissionRepository`] 负责
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// 创建角色（名称重复返回 Conflict）
    async fn create(&self, role: &Role) -> AppResult<()>;

    /// 更新名称、描述与审计信息
    async fn update(&self, role: &Role) -> AppResult<()>;

    /// 删除角色（仍被用户引用时返回 ForeignKeyViolation）
    async fn delete(&self, id: &RoleId) -> AppResult<()>;

    /// 根据 ID 查找角色（含权限集合）
    async fn find_by_id(&self, id: &RoleId) -> AppResult<Option<Role>>;

    /// 根据名称精确查找（大小写敏感）
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>>;

    /// 全部角色，按名称升序
    async fn list_all(&self) -> AppResult<Vec<Role>>;
}

/// 角色权限关联仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RolePermissionRepository: Send + Sync {
    /// 为角色分配权限
    async fn assign_permissions(&self, role_id: &RoleId, permissions: &[Permission])
    -> AppResult<()>;

    /// 获取角色的所有权限
    async fn get_role_permissions(&self, role_id: &RoleId) -> AppResult<BTreeSet<Permission>>;

    /// 清空角色的所有权限
    async fn clear_role_permissions(&self, role_id: &RoleId) -> AppResult<()>;
}
