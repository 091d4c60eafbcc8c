//! 角色查询

use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::role::{Role, RoleId, RoleRepository};
use crate::error::{AccessError, AccessResult};
use crate::infrastructure::cache::RoleListCache;

/// 角色查询处理器
///
/// 列表走缓存；单个角色始终读存储
pub struct RoleQueryHandler {
    roles: Arc<dyn RoleRepository>,
    cache: Arc<RoleListCache>,
}

impl RoleQueryHandler {
    pub fn new(roles: Arc<dyn RoleRepository>, cache: Arc<RoleListCache>) -> Self {
        Self { roles, cache }
    }

    /// 全部角色，按名称升序
    pub async fn list_roles(&self) -> AccessResult<Vec<Role>> {
        match self.cache.get().await {
            Ok(Some(roles)) => {
                debug!(count = roles.len(), "Role list served from cache");
                return Ok(roles);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Role list cache read failed"),
        }

        let roles = self.roles.list_all().await?;

        if let Err(e) = self.cache.set(&roles).await {
            warn!(error = %e, "Role list cache write failed");
        }

        Ok(roles)
    }

    pub async fn get_role(&self, role_id: &str) -> AccessResult<Role> {
        let id = RoleId::from(role_id);
        self.roles
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AccessError::RoleNotFound(id.to_string()))
    }
}
