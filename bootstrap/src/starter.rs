//! 服务启动器

use std::future::Future;
use std::net::SocketAddr;

use axum::Router;
use clinic_config::AppConfig;
use clinic_errors::{AppError, AppResult};
use tracing::info;

use crate::infrastructure::Infrastructure;
use crate::runtime::{init_runtime, shutdown_signal};

/// 运行 HTTP 服务
///
/// 1. 加载配置
/// 2. 初始化日志与 metrics
/// 3. 创建基础设施资源
/// 4. 调用 `app_builder` 构建路由
/// 5. 启动服务器并处理 graceful shutdown
///
/// ```ignore
/// clinic_bootstrap::run("config", |infra| async move {
///     Ok(my_router(infra))
/// })
/// .await
/// ```
pub async fn run<F, Fut>(config_dir: &str, app_builder: F) -> AppResult<()>
where
    F: FnOnce(Infrastructure) -> Fut,
    Fut: Future<Output = AppResult<Router>>,
{
    let config = AppConfig::load(config_dir)
        .map_err(|e| AppError::internal(format!("Failed to load config: {}", e)))?;

    let metrics = init_runtime(&config);
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| AppError::internal(format!("Invalid server address: {}", e)))?;

    let infra = Infrastructure::from_config(config, metrics).await?;
    let app = app_builder(infra).await?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    info!("Server stopped");
    Ok(())
}
