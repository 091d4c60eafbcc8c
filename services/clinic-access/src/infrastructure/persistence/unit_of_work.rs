//! PostgreSQL Unit of Work 实现

use std::sync::Arc;

use async_trait::async_trait;
use clinic_errors::{AppError, AppResult};
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;

use super::tx_repositories::{
    SharedTx, TxRolePermissionRepository, TxRoleRepository, TxUserRepository,
};
use crate::domain::role::{RolePermissionRepository, RoleRepository};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};
use crate::domain::user::UserRepository;

/// Postgres Unit of Work 工厂
pub struct PostgresUnitOfWorkFactory {
    pool: PgPool,
}

impl PostgresUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {}", e)))?;

        Ok(Box::new(PostgresUnitOfWork::new(tx)))
    }
}

/// Postgres Unit of Work 实现
///
/// 未提交时 `Transaction` 在 drop 中回滚
pub struct PostgresUnitOfWork {
    tx: SharedTx,
    role_repo: TxRoleRepository,
    role_permission_repo: TxRolePermissionRepository,
    user_repo: TxUserRepository,
}

impl PostgresUnitOfWork {
    pub fn new(tx: Transaction<'static, Postgres>) -> Self {
        let tx = Arc::new(Mutex::new(Some(tx)));

        Self {
            role_repo: TxRoleRepository::new(tx.clone()),
            role_permission_repo: TxRolePermissionRepository::new(tx.clone()),
            user_repo: TxUserRepository::new(tx.clone()),
            tx,
        }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    fn roles(&self) -> &dyn RoleRepository {
        &self.role_repo
    }

    fn role_permissions(&self) -> &dyn RolePermissionRepository {
        &self.role_permission_repo
    }

    fn users(&self) -> &dyn UserRepository {
        &self.user_repo
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit transaction: {}", e)))?;

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let mut guard = self.tx.lock().await;
        let tx = guard
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))?;

        tx.rollback()
            .await
            .map_err(|e| AppError::database(format!("Failed to rollback transaction: {}", e)))?;

        Ok(())
    }
}
