//! 服务运行时

use clinic_config::AppConfig;
use clinic_telemetry::{init_metrics, init_tracing, init_tracing_json};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::{error, info, warn};

/// 初始化服务运行时
///
/// 返回 Prometheus handle（未启用或安装失败时为 None）
pub fn init_runtime(config: &AppConfig) -> Option<PrometheusHandle> {
    if config.is_production() {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }

    let metrics = if config.telemetry.metrics_enabled {
        match init_metrics() {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!(error = %e, "Failed to install Prometheus recorder, metrics disabled");
                None
            }
        }
    } else {
        None
    };

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        metrics = metrics.is_some(),
        "Runtime initialized"
    );

    metrics
}

/// 等待关闭信号
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
