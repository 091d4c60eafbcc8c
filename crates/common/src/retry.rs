//! 启动期重试工具
//!
//! 指数退避，供连接数据库等启动步骤复用

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

/// 重试配置
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 初始延迟
    pub initial_delay: Duration,
    /// 最大延迟
    pub max_delay: Duration,
    /// 退避乘数
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(15),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            max_delay,
            multiplier: 2.0,
        }
    }

    /// 第 n 次失败后的等待时间（n 从 0 开始）
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let scaled = self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        Duration::from_millis((scaled as u64).min(self.max_delay.as_millis() as u64))
    }
}

/// 可重试的连接类错误关键字
const TRANSIENT_PATTERNS: &[&str] = &[
    "connection refused",
    "connection reset",
    "timed out",
    "timeout",
    "too many connections",
    "no route to host",
    "could not connect",
    "server closed the connection",
];

/// 判断错误信息是否属于瞬时故障
pub fn is_transient_error(message: &str) -> bool {
    let lower = message.to_lowercase();
    TRANSIENT_PATTERNS.iter().any(|p| lower.contains(p))
}

/// 带重试执行异步操作
///
/// 只有 `should_retry` 返回 true 的错误才会重试，其余立即返回
pub async fn with_retry<F, Fut, T, E, P>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    info!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(e) => {
                attempt += 1;
                if attempt >= config.max_attempts || !should_retry(&e) {
                    warn!(
                        operation = operation_name,
                        attempt,
                        error = %e,
                        "Operation failed, giving up"
                    );
                    return Err(e);
                }

                let delay = config.delay_for_attempt(attempt - 1);
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Operation failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryConfig {
        RetryConfig::new(3, Duration::from_millis(1), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_retry_until_success() {
        let counter = AtomicU32::new(0);

        let result: Result<u32, String> = with_retry(
            &fast(),
            "test",
            || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err("connection refused".to_string())
                    } else {
                        Ok(n)
                    }
                }
            },
            |e| is_transient_error(e),
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_transient_error_is_not_retried() {
        let counter = AtomicU32::new(0);

        let result: Result<(), String> = with_retry(
            &fast(),
            "test",
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err("password authentication failed".to_string()) }
            },
            |e| is_transient_error(e),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);

        let result: Result<(), String> = with_retry(
            &fast(),
            "test",
            || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Err("timeout".to_string()) }
            },
            |_| true,
        )
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_delay_is_capped() {
        let config = RetryConfig::new(5, Duration::from_millis(100), Duration::from_secs(1));
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(400));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(1));
    }
}
