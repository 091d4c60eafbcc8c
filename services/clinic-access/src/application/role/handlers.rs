//! 角色命令处理器

use std::sync::Arc;

use clinic_errors::AppError;
use metrics::counter;
use tracing::{info, warn};

use super::commands::*;
use crate::domain::permission::Permission;
use crate::domain::role::{Role, RoleEvent, RoleEventSink, RoleId};
use crate::domain::unit_of_work::UnitOfWorkFactory;
use crate::error::{AccessError, AccessResult};

/// 角色命令处理器
///
/// 每个命令在一个 Unit of Work 中完成；提交之前的任何错误都会丢弃事务
pub struct RoleCommandHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    events: Arc<dyn RoleEventSink>,
}

impl RoleCommandHandler {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>, events: Arc<dyn RoleEventSink>) -> Self {
        Self {
            uow_factory,
            events,
        }
    }

    /// 创建角色
    pub async fn handle_create(&self, cmd: CreateRoleCommand) -> AccessResult<Role> {
        let result = self.create(cmd).await;
        record_mutation("create", &result);
        result
    }

    /// 更新角色
    pub async fn handle_update(&self, cmd: UpdateRoleCommand) -> AccessResult<Role> {
        let result = self.update(cmd).await;
        record_mutation("update", &result);
        result
    }

    /// 删除角色
    pub async fn handle_delete(&self, cmd: DeleteRoleCommand) -> AccessResult<()> {
        let result = self.delete(cmd).await;
        record_mutation("delete", &result);
        result
    }

    async fn create(&self, cmd: CreateRoleCommand) -> AccessResult<Role> {
        let name = validate_name(&cmd.name)?;
        let permissions = Permission::parse_set(&cmd.permissions)?;

        let uow = self.uow_factory.begin().await?;

        if uow.roles().find_by_name(&name).await?.is_some() {
            return Err(AccessError::DuplicateName(name));
        }

        let role = Role::new(
            name,
            cmd.description.trim().to_string(),
            permissions,
            cmd.performed_by,
        );

        uow.roles()
            .create(&role)
            .await
            .map_err(|e| duplicate_name_or(e, &role.name))?;
        let rows: Vec<Permission> = role.permissions.iter().copied().collect();
        uow.role_permissions()
            .assign_permissions(&role.id, &rows)
            .await?;

        uow.commit().await?;

        info!(role_id = %role.id, name = %role.name, "Role created");
        self.events
            .role_changed(&RoleEvent::RoleCreated {
                id: role.id.clone(),
                name: role.name.clone(),
                by: cmd.performed_by,
            })
            .await;

        Ok(role)
    }

    async fn update(&self, cmd: UpdateRoleCommand) -> AccessResult<Role> {
        let role_id = RoleId(cmd.role_id);
        let name = validate_name(&cmd.name)?;
        let permissions = Permission::parse_set(&cmd.permissions)?;

        let uow = self.uow_factory.begin().await?;

        let mut role = uow
            .roles()
            .find_by_id(&role_id)
            .await?
            .ok_or_else(|| AccessError::RoleNotFound(role_id.to_string()))?;

        if let Some(other) = uow.roles().find_by_name(&name).await? {
            if other.id != role.id {
                return Err(AccessError::DuplicateName(name));
            }
        }

        role.update(
            name,
            cmd.description.trim().to_string(),
            permissions,
            cmd.performed_by,
        );

        uow.roles()
            .update(&role)
            .await
            .map_err(|e| duplicate_name_or(e, &role.name))?;

        // 整体替换：先清空再写入
        uow.role_permissions()
            .clear_role_permissions(&role.id)
            .await?;
        let rows: Vec<Permission> = role.permissions.iter().copied().collect();
        uow.role_permissions()
            .assign_permissions(&role.id, &rows)
            .await?;

        uow.commit().await?;

        info!(
            role_id = %role.id,
            permissions = role.permissions.len(),
            "Role updated"
        );
        self.events
            .role_changed(&RoleEvent::RoleUpdated {
                id: role.id.clone(),
                by: cmd.performed_by,
            })
            .await;

        Ok(role)
    }

    async fn delete(&self, cmd: DeleteRoleCommand) -> AccessResult<()> {
        let role_id = RoleId(cmd.role_id);

        if role_id.is_superuser() {
            return Err(AccessError::ProtectedRole(role_id.to_string()));
        }

        let uow = self.uow_factory.begin().await?;

        if uow.roles().find_by_id(&role_id).await?.is_none() {
            return Err(AccessError::RoleNotFound(role_id.to_string()));
        }

        let assigned = uow.users().count_by_role(&role_id).await?;
        if assigned > 0 {
            warn!(role_id = %role_id, assigned, "Refusing to delete role in use");
            return Err(AccessError::RoleInUse(role_id.to_string()));
        }

        // 外键 ON DELETE RESTRICT 兜住计数之后并发分配的用户
        uow.roles().delete(&role_id).await.map_err(|e| match e {
            AppError::ForeignKeyViolation(_) => AccessError::RoleInUse(role_id.to_string()),
            other => other.into(),
        })?;

        uow.commit().await?;

        info!(role_id = %role_id, "Role deleted");
        self.events
            .role_changed(&RoleEvent::RoleDeleted {
                id: role_id,
                by: cmd.performed_by,
            })
            .await;

        Ok(())
    }
}

fn validate_name(name: &str) -> AccessResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AccessError::validation("Role name must not be empty"));
    }
    Ok(name.to_string())
}

fn duplicate_name_or(e: AppError, name: &str) -> AccessError {
    match e {
        AppError::Conflict(_) => AccessError::DuplicateName(name.to_string()),
        other => other.into(),
    }
}

fn record_mutation<T>(operation: &'static str, result: &AccessResult<T>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    counter!("role_mutations_total", "operation" => operation, "outcome" => outcome).increment(1);
}
