//! 进程内缓存（Moka）

use std::time::{Duration, Instant};

use async_trait::async_trait;
use clinic_errors::AppResult;
use clinic_ports::CachePort;
use moka::Expiry;
use moka::future::Cache;

#[derive(Clone)]
struct CachedValue {
    value: String,
    ttl: Option<Duration>,
}

/// 按条目 TTL 过期，未指定时使用默认值
struct PerEntryTtl {
    default_ttl: Duration,
}

impl Expiry<String, CachedValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl.unwrap_or(self.default_ttl))
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl.unwrap_or(self.default_ttl))
    }
}

/// Moka 缓存配置
#[derive(Debug, Clone)]
pub struct MokaCacheConfig {
    pub max_capacity: u64,
    pub default_ttl: Duration,
}

impl Default for MokaCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 1_000,
            default_ttl: Duration::from_secs(300),
        }
    }
}

/// 基于 Moka 的 [`CachePort`] 实现
#[derive(Clone)]
pub struct MokaCache {
    inner: Cache<String, CachedValue>,
}

impl MokaCache {
    pub fn new(config: MokaCacheConfig) -> Self {
        let inner = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl {
                default_ttl: config.default_ttl,
            })
            .build();

        Self { inner }
    }
}

#[async_trait]
impl CachePort for MokaCache {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.inner.get(key).await.map(|v| v.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> AppResult<()> {
        self.inner
            .insert(
                key.to_string(),
                CachedValue {
                    value: value.to_string(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.invalidate(key).await;
        Ok(())
    }
}
