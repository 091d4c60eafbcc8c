//! Clinic Access Service - 诊所应用的访问控制核心
//!
//! 权限目录、角色存储、会话解析、授权守卫与路由中间件

pub mod api;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

use axum::Router;
use clinic_bootstrap::Infrastructure;
use clinic_config::StoreBackend;
use clinic_errors::{AppError, AppResult};
use secrecy::ExposeSecret;
use tracing::{info, warn};

use api::http::{AppState, CookieSettings};
use infrastructure::persistence::{MemoryStore, StoreHandles, run_migrations};

/// 按配置组装服务并返回路由
pub async fn build_app(infra: Infrastructure) -> AppResult<Router> {
    let config = infra.config();

    let store = match (config.store.backend, infra.postgres_pool()) {
        (StoreBackend::Postgres, Some(pool)) => {
            if config.database.as_ref().is_some_and(|db| db.run_migrations) {
                run_migrations(&pool).await?;
            }
            StoreHandles::postgres(pool)
        }
        (StoreBackend::Postgres, None) => {
            return Err(AppError::internal(
                "Postgres backend selected but no connection pool was created",
            ));
        }
        (StoreBackend::Memory, _) => {
            warn!("Using in-memory store, all data is lost on restart");
            StoreHandles::memory(MemoryStore::new())
        }
    };

    let state = AppState::new(
        store,
        infra.session_tokens(),
        &config.routes,
        CookieSettings::from(&config.session),
        &config.cache,
    )
    .with_metrics(infra.metrics_handle());

    if let Some(admin) = &config.bootstrap_admin {
        state
            .user_commands
            .ensure_bootstrap_admin(&admin.username, admin.password.expose_secret())
            .await?;
    }

    info!(
        backend = state.store_health.backend(),
        login_path = %config.routes.login_path,
        landing_path = %config.routes.landing_path,
        "Clinic access service initialized"
    );

    Ok(api::http::router(state))
}
