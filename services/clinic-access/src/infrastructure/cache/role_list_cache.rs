//! 角色列表缓存
//!
//! 角色变更提交后整体失效

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use clinic_errors::{AppError, AppResult};
use clinic_ports::CachePort;
use tracing::{debug, warn};

use crate::domain::role::{Role, RoleEvent, RoleEventSink};

const ROLE_LIST_KEY: &str = "clinic:access:roles:list";

pub struct RoleListCache {
    cache: Arc<dyn CachePort>,
    ttl: Duration,
}

impl RoleListCache {
    pub fn new(cache: Arc<dyn CachePort>, ttl: Duration) -> Self {
        Self { cache, ttl }
    }

    pub async fn get(&self) -> AppResult<Option<Vec<Role>>> {
        match self.cache.get(ROLE_LIST_KEY).await? {
            Some(json) => {
                let roles = serde_json::from_str(&json).map_err(|e| {
                    AppError::internal(format!("Failed to deserialize roles from cache: {}", e))
                })?;
                Ok(Some(roles))
            }
            None => Ok(None),
        }
    }

    pub async fn set(&self, roles: &[Role]) -> AppResult<()> {
        let json = serde_json::to_string(roles).map_err(|e| {
            AppError::internal(format!("Failed to serialize roles for cache: {}", e))
        })?;
        self.cache.set(ROLE_LIST_KEY, &json, Some(self.ttl)).await
    }

    pub async fn invalidate(&self) -> AppResult<()> {
        self.cache.delete(ROLE_LIST_KEY).await
    }
}

#[async_trait]
impl RoleEventSink for RoleListCache {
    async fn role_changed(&self, event: &RoleEvent) {
        match self.invalidate().await {
            Ok(()) => debug!(
                event = event.event_type(),
                role_id = %event.role_id(),
                "Role list cache invalidated"
            ),
            Err(e) => warn!(
                event = event.event_type(),
                error = %e,
                "Failed to invalidate role list cache"
            ),
        }
    }
}
