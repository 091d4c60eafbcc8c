//! 授权检查
//!
//! 决策逻辑:
//! 1. 匿名会话 → Unauthenticated
//! 2. 角色为 superuser → 允许，不查询存储
//! 3. 读取角色的权限集合，缺少所需权限 → Forbidden
//!
//! 守卫本身不做重定向，由调用边界决定如何处理失败

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use tracing::{debug, warn};

use crate::domain::permission::Permission;
use crate::domain::role::RolePermissionRepository;
use crate::domain::session::{Session, SessionUser};
use crate::error::{AccessError, AccessResult};

/// 授权守卫
pub struct AuthorizationGuard {
    role_permissions: Arc<dyn RolePermissionRepository>,
}

impl AuthorizationGuard {
    pub fn new(role_permissions: Arc<dyn RolePermissionRepository>) -> Self {
        Self { role_permissions }
    }

    /// 要求会话持有指定权限，成功时返回会话用户
    pub async fn authorize(
        &self,
        session: &Session,
        permission: Permission,
    ) -> AccessResult<SessionUser> {
        let start = Instant::now();

        let result = self.check(session, permission).await;

        let decision = match &result {
            Ok(_) => "allow",
            Err(AccessError::Unauthenticated) => "unauthenticated",
            Err(AccessError::Forbidden { .. }) => "forbidden",
            Err(_) => "error",
        };
        counter!(
            "authorization_checks_total",
            "permission" => permission.code(),
            "decision" => decision
        )
        .increment(1);
        histogram!("authorization_check_duration_ms").record(start.elapsed().as_secs_f64() * 1000.0);

        result
    }

    async fn check(&self, session: &Session, permission: Permission) -> AccessResult<SessionUser> {
        let Some(user) = session.user() else {
            debug!(%permission, "Authorization denied: no session");
            return Err(AccessError::Unauthenticated);
        };

        if user.role_id.is_superuser() {
            return Ok(user.clone());
        }

        let granted = self
            .role_permissions
            .get_role_permissions(&user.role_id)
            .await?;

        if granted.contains(&permission) {
            Ok(user.clone())
        } else {
            warn!(
                user_id = %user.user_id,
                role_id = %user.role_id,
                %permission,
                "Authorization denied: missing permission"
            );
            Err(AccessError::Forbidden { permission })
        }
    }

    /// 会话用户的有效权限集合
    pub async fn effective_permissions(
        &self,
        user: &SessionUser,
    ) -> AccessResult<BTreeSet<Permission>> {
        if user.role_id.is_superuser() {
            return Ok(Permission::ALL.into_iter().collect());
        }
        Ok(self
            .role_permissions
            .get_role_permissions(&user.role_id)
            .await?)
    }
}
