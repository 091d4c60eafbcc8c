//! 连接池仓储（读路径与单语句写入）

use std::collections::BTreeSet;

use async_trait::async_trait;
use clinic_common::UserId;
use clinic_errors::AppResult;
use sqlx::PgPool;
use sqlx::pool::PoolConnection;
use sqlx::Postgres;

use super::error_mapper::map_sqlx_error;
use super::queries;
use crate::domain::permission::Permission;
use crate::domain::role::{Role, RoleId, RolePermissionRepository, RoleRepository};
use crate::domain::user::{User, UserRepository};

async fn acquire(pool: &PgPool) -> AppResult<PoolConnection<Postgres>> {
    pool.acquire().await.map_err(map_sqlx_error)
}

/// PostgreSQL 角色仓储
pub struct PostgresRoleRepository {
    pool: PgPool,
}

impl PostgresRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PostgresRoleRepository {
    async fn create(&self, role: &Role) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;
        queries::insert_role(&mut conn, role).await
    }

    async fn update(&self, role: &Role) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;
        queries::update_role(&mut conn, role).await
    }

    async fn delete(&self, id: &RoleId) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;
        queries::delete_role(&mut conn, id).await
    }

    async fn find_by_id(&self, id: &RoleId) -> AppResult<Option<Role>> {
        let mut conn = acquire(&self.pool).await?;
        queries::find_role_by_id(&mut conn, id).await
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let mut conn = acquire(&self.pool).await?;
        queries::find_role_by_name(&mut conn, name).await
    }

    async fn list_all(&self) -> AppResult<Vec<Role>> {
        let mut conn = acquire(&self.pool).await?;
        queries::list_roles(&mut conn).await
    }
}

/// PostgreSQL 角色权限仓储
pub struct PostgresRolePermissionRepository {
    pool: PgPool,
}

impl PostgresRolePermissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RolePermissionRepository for PostgresRolePermissionRepository {
    async fn assign_permissions(
        &self,
        role_id: &RoleId,
        permissions: &[Permission],
    ) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;
        queries::assign_permissions(&mut conn, role_id, permissions).await
    }

    async fn get_role_permissions(&self, role_id: &RoleId) -> AppResult<BTreeSet<Permission>> {
        let mut conn = acquire(&self.pool).await?;
        queries::role_permissions(&mut conn, role_id).await
    }

    async fn clear_role_permissions(&self, role_id: &RoleId) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;
        queries::clear_permissions(&mut conn, role_id).await
    }
}

/// PostgreSQL 用户仓储
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;
        queries::insert_user(&mut conn, user).await
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;
        queries::update_user(&mut conn, user).await
    }

    async fn delete(&self, id: &UserId) -> AppResult<()> {
        let mut conn = acquire(&self.pool).await?;
        queries::delete_user(&mut conn, id).await
    }

    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        let mut conn = acquire(&self.pool).await?;
        queries::find_user_by_id(&mut conn, id).await
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let mut conn = acquire(&self.pool).await?;
        queries::find_user_by_username(&mut conn, username).await
    }

    async fn list_all(&self) -> AppResult<Vec<User>> {
        let mut conn = acquire(&self.pool).await?;
        queries::list_users(&mut conn).await
    }

    async fn count_by_role(&self, role_id: &RoleId) -> AppResult<i64> {
        let mut conn = acquire(&self.pool).await?;
        queries::count_users_by_role(&mut conn, role_id).await
    }

    async fn count(&self) -> AppResult<i64> {
        let mut conn = acquire(&self.pool).await?;
        queries::count_users(&mut conn).await
    }
}
