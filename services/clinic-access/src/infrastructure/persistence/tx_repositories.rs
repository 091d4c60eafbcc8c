//! 事务仓储
//!
//! 共享同一个事务而非连接池

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use clinic_common::UserId;
use clinic_errors::{AppError, AppResult};
use sqlx::{Postgres, Transaction};
use tokio::sync::Mutex;

use super::queries;
use crate::domain::permission::Permission;
use crate::domain::role::{Role, RoleId, RolePermissionRepository, RoleRepository};
use crate::domain::user::{User, UserRepository};

/// Shared transaction type
pub type SharedTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// 锁定共享事务并执行一次查询
macro_rules! with_tx {
    ($self:ident, |$conn:ident| $body:expr) => {{
        let mut guard = $self.tx.lock().await;
        let tx = guard
            .as_mut()
            .ok_or_else(|| AppError::internal("Transaction consumed"))?;
        let $conn = &mut **tx;
        $body.await
    }};
}

/// Macro to define a TxRepository structure
macro_rules! define_tx_repo {
    ($name:ident) => {
        pub struct $name {
            tx: SharedTx,
        }

        impl $name {
            pub fn new(tx: SharedTx) -> Self {
                Self { tx }
            }
        }
    };
}

define_tx_repo!(TxRoleRepository);
define_tx_repo!(TxRolePermissionRepository);
define_tx_repo!(TxUserRepository);

#[async_trait]
impl RoleRepository for TxRoleRepository {
    async fn create(&self, role: &Role) -> AppResult<()> {
        with_tx!(self, |conn| queries::insert_role(conn, role))
    }

    async fn update(&self, role: &Role) -> AppResult<()> {
        with_tx!(self, |conn| queries::update_role(conn, role))
    }

    async fn delete(&self, id: &RoleId) -> AppResult<()> {
        with_tx!(self, |conn| queries::delete_role(conn, id))
    }

    async fn find_by_id(&self, id: &RoleId) -> AppResult<Option<Role>> {
        with_tx!(self, |conn| queries::find_role_by_id(conn, id))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        with_tx!(self, |conn| queries::find_role_by_name(conn, name))
    }

    async fn list_all(&self) -> AppResult<Vec<Role>> {
        with_tx!(self, |conn| queries::list_roles(conn))
    }
}

#[async_trait]
impl RolePermissionRepository for TxRolePermissionRepository {
    async fn assign_permissions(
        &self,
        role_id: &RoleId,
        permissions: &[Permission],
    ) -> AppResult<()> {
        with_tx!(self, |conn| queries::assign_permissions(conn, role_id, permissions))
    }

    async fn get_role_permissions(&self, role_id: &RoleId) -> AppResult<BTreeSet<Permission>> {
        with_tx!(self, |conn| queries::role_permissions(conn, role_id))
    }

    async fn clear_role_permissions(&self, role_id: &RoleId) -> AppResult<()> {
        with_tx!(self, |conn| queries::clear_permissions(conn, role_id))
    }
}

#[async_trait]
impl UserRepository for TxUserRepository {
    async fn create(&self, user: &User) -> AppResult<()> {
        with_tx!(self, |conn| queries::insert_user(conn, user))
    }

    async fn update(&self, user: &User) -> AppResult<()> {
        with_tx!(self, |conn| queries::update_user(conn, user))
    }

    async fn delete(&self, id: &UserId) -> AppResult<()> {
        with_tx!(self, |conn| queries::delete_user(conn, id))
    }

    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        with_tx!(self, |conn| queries::find_user_by_id(conn, id))
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        with_tx!(self, |conn| queries::find_user_by_username(conn, username))
    }

    async fn list_all(&self) -> AppResult<Vec<User>> {
        with_tx!(self, |conn| queries::list_users(conn))
    }

    async fn count_by_role(&self, role_id: &RoleId) -> AppResult<i64> {
        with_tx!(self, |conn| queries::count_users_by_role(conn, role_id))
    }

    async fn count(&self) -> AppResult<i64> {
        with_tx!(self, |conn| queries::count_users(conn))
    }
}
