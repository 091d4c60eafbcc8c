//! Unit of Work 模式
//!
//! 提供跨多个 Repository 的事务协调能力，确保操作的原子性。
//! 未提交即被丢弃的 Unit of Work 自动回滚。

use async_trait::async_trait;
use clinic_errors::AppResult;

use crate::domain::role::{RolePermissionRepository, RoleRepository};
use crate::domain::user::UserRepository;

/// Unit of Work trait
///
/// 协调多个 Repository 在同一事务中的操作。
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// 获取角色 Repository
    fn roles(&self) -> &dyn RoleRepository;

    /// 获取角色权限 Repository
    fn role_permissions(&self) -> &dyn RolePermissionRepository;

    /// 获取用户 Repository
    fn users(&self) -> &dyn UserRepository;

    /// 提交事务
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// 回滚事务
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Unit of Work 工厂 trait
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// 开始新的事务
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}
