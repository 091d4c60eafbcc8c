//! 用户实体与仓储接口

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clinic_common::UserId;
use clinic_errors::AppResult;

use crate::domain::role::RoleId;

/// 用户
///
/// 只保存密码哈希；每个用户恰好引用一个角色
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub password_hash: String,
    pub role_id: RoleId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, password_hash: String, role_id: RoleId) -> Self {
        let now = Utc::now();
        Self {
            id: UserId::new(),
            username,
            password_hash,
            role_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn assign_role(&mut self, role_id: RoleId) {
        self.role_id = role_id;
        self.updated_at = Utc::now();
    }
}

/// 用户仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 创建用户（用户名重复返回 Conflict，角色不存在返回 ForeignKeyViolation）
    async fn create(&self, user: &User) -> AppResult<()>;

    /// 更新角色引用
    async fn update(&self, user: &User) -> AppResult<()>;

    async fn delete(&self, id: &UserId) -> AppResult<()>;

    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// 全部用户，按用户名升序
    async fn list_all(&self) -> AppResult<Vec<User>>;

    /// 引用指定角色的用户数
    async fn count_by_role(&self, role_id: &RoleId) -> AppResult<i64>;

    async fn count(&self) -> AppResult<i64>;
}
