//! 内嵌迁移

use clinic_adapter_postgres::{Migration, MigrationManager};
use clinic_errors::AppResult;
use sqlx::PgPool;
use tracing::info;

/// 本服务的全部迁移，按版本排列
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(
        1,
        "access_control",
        include_str!("../../../migrations/001_access_control.sql"),
    )]
}

/// 应用尚未执行的迁移
pub async fn run_migrations(pool: &PgPool) -> AppResult<()> {
    let result = MigrationManager::new(pool.clone())
        .with_table_name("_clinic_access_migrations")
        .migrate(&migrations())
        .await?;

    info!(
        applied = ?result.applied,
        skipped = result.skipped.len(),
        "Database migrations complete"
    );
    Ok(())
}
