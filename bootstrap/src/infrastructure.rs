//! 基础设施资源管理

use std::sync::Arc;

use clinic_adapter_postgres::{PostgresConfig, create_pool};
use clinic_auth_core::SessionTokenService;
use clinic_common::{RetryConfig, is_transient_error, with_retry};
use clinic_config::{AppConfig, StoreBackend};
use clinic_errors::{AppError, AppResult};
use metrics_exporter_prometheus::PrometheusHandle;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use tracing::info;

/// 基础设施资源容器
pub struct Infrastructure {
    config: AppConfig,
    /// PostgreSQL 连接池（memory 后端时为空）
    postgres_pool: Option<PgPool>,
    session_tokens: Arc<SessionTokenService>,
    metrics: Option<PrometheusHandle>,
}

impl Infrastructure {
    /// 从配置创建基础设施资源（数据库连接带重试）
    pub async fn from_config(
        config: AppConfig,
        metrics: Option<PrometheusHandle>,
    ) -> AppResult<Self> {
        let postgres_pool = match config.store.backend {
            StoreBackend::Postgres => {
                let db = config.database.as_ref().ok_or_else(|| {
                    AppError::internal("Postgres backend selected without [database] config")
                })?;
                let pg_config = PostgresConfig::new(db.url.expose_secret())
                    .with_max_connections(db.max_connections);

                let pool = with_retry(
                    &RetryConfig::default(),
                    "PostgreSQL connection",
                    || {
                        let cfg = pg_config.clone();
                        async move { create_pool(&cfg).await }
                    },
                    |e: &AppError| is_transient_error(&e.to_string()),
                )
                .await?;
                info!(
                    max_connections = db.max_connections,
                    "PostgreSQL connection pool created"
                );
                Some(pool)
            }
            StoreBackend::Memory => {
                info!("Using in-memory store backend");
                None
            }
        };

        let session_tokens = Arc::new(SessionTokenService::new(
            config.session.secret.expose_secret(),
            config.session.ttl_secs as i64,
            config.session.issuer.clone(),
        ));

        Ok(Self {
            config,
            postgres_pool,
            session_tokens,
            metrics,
        })
    }

    /// 获取应用配置
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// 获取 PostgreSQL 连接池
    pub fn postgres_pool(&self) -> Option<PgPool> {
        self.postgres_pool.clone()
    }

    /// 获取会话令牌服务
    pub fn session_tokens(&self) -> Arc<SessionTokenService> {
        self.session_tokens.clone()
    }

    /// 获取 Prometheus handle
    pub fn metrics_handle(&self) -> Option<PrometheusHandle> {
        self.metrics.clone()
    }
}
