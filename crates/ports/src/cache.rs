//! Cache trait 定义

use async_trait::async_trait;
use clinic_errors::AppResult;
use std::time::Duration;

/// 缓存 trait
///
/// 值统一为字符串（JSON），由调用方负责序列化
#[async_trait]
pub trait CachePort: Send + Sync {
    /// 获取缓存值
    async fn get(&self, key: &str) -> AppResult<Option<String>>;

    /// 设置缓存值，`ttl` 为空时使用实现方的默认过期策略
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()>;

    /// 删除缓存
    async fn delete(&self, key: &str) -> AppResult<()>;
}
