//! 持久化层

mod error_mapper;
mod memory;
mod migrations;
mod pg_repositories;
mod queries;
mod tx_repositories;
mod unit_of_work;

use std::sync::Arc;

use async_trait::async_trait;
use clinic_errors::AppResult;
use sqlx::PgPool;

pub use memory::{MemoryStore, MemoryUnitOfWork};
pub use migrations::{migrations, run_migrations};
pub use pg_repositories::{
    PostgresRolePermissionRepository, PostgresRoleRepository, PostgresUserRepository,
};
pub use unit_of_work::{PostgresUnitOfWork, PostgresUnitOfWorkFactory};

use crate::domain::role::{RolePermissionRepository, RoleRepository};
use crate::domain::unit_of_work::UnitOfWorkFactory;
use crate::domain::user::UserRepository;

/// 存储连通性探测（健康检查用）
#[async_trait]
pub trait StoreHealth: Send + Sync {
    fn backend(&self) -> &'static str;

    async fn ping(&self) -> AppResult<()>;
}

#[async_trait]
impl StoreHealth for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

struct PostgresHealth {
    pool: PgPool,
}

#[async_trait]
impl StoreHealth for PostgresHealth {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> AppResult<()> {
        clinic_adapter_postgres::check_connection(&self.pool).await?;
        Ok(())
    }
}

/// 选定后端的全部存储句柄
#[derive(Clone)]
pub struct StoreHandles {
    pub uow_factory: Arc<dyn UnitOfWorkFactory>,
    pub roles: Arc<dyn RoleRepository>,
    pub role_permissions: Arc<dyn RolePermissionRepository>,
    pub users: Arc<dyn UserRepository>,
    pub store_health: Arc<dyn StoreHealth>,
}

impl StoreHandles {
    pub fn memory(store: MemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            uow_factory: store.clone(),
            roles: store.clone(),
            role_permissions: store.clone(),
            users: store.clone(),
            store_health: store,
        }
    }

    pub fn postgres(pool: PgPool) -> Self {
        Self {
            uow_factory: Arc::new(PostgresUnitOfWorkFactory::new(pool.clone())),
            roles: Arc::new(PostgresRoleRepository::new(pool.clone())),
            role_permissions: Arc::new(PostgresRolePermissionRepository::new(pool.clone())),
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            store_health: Arc::new(PostgresHealth { pool }),
        }
    }
}
