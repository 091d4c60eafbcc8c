//! 用户命令与查询处理器

use std::sync::Arc;

use clinic_auth_core::hash_password;
use clinic_common::UserId;
use clinic_errors::AppError;
use tracing::{info, warn};

use super::commands::*;
use crate::domain::role::RoleId;
use crate::domain::session::SessionUser;
use crate::domain::unit_of_work::UnitOfWorkFactory;
use crate::domain::user::{User, UserRepository};
use crate::error::{AccessError, AccessResult};

pub const MIN_PASSWORD_LEN: usize = 8;

/// 用户命令处理器
pub struct UserCommandHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
}

impl UserCommandHandler {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>) -> Self {
        Self { uow_factory }
    }

    /// 创建用户
    pub async fn handle_create(&self, cmd: CreateUserCommand) -> AccessResult<User> {
        let username = cmd.username.trim().to_string();
        if username.is_empty() {
            return Err(AccessError::validation("Username must not be empty"));
        }
        validate_password(&cmd.password)?;
        let role_id = RoleId(cmd.role_id);
        require_superuser_for(&cmd.performed_by, &role_id)?;

        let uow = self.uow_factory.begin().await?;

        if uow.roles().find_by_id(&role_id).await?.is_none() {
            return Err(AccessError::RoleNotFound(role_id.to_string()));
        }
        if uow.users().find_by_username(&username).await?.is_some() {
            return Err(AccessError::DuplicateUsername(username));
        }

        let user = User::new(username, hash_password(&cmd.password)?, role_id);
        uow.users().create(&user).await.map_err(|e| match e {
            AppError::Conflict(_) => AccessError::DuplicateUsername(user.username.clone()),
            AppError::ForeignKeyViolation(_) => AccessError::RoleNotFound(user.role_id.to_string()),
            other => other.into(),
        })?;

        uow.commit().await?;

        info!(user_id = %user.id, username = %user.username, role_id = %user.role_id, "User created");
        Ok(user)
    }

    /// 重新分配角色，下一次请求即生效
    pub async fn handle_assign_role(&self, cmd: AssignRoleCommand) -> AccessResult<User> {
        let user_id = parse_user_id(&cmd.user_id)?;
        let role_id = RoleId(cmd.role_id);
        require_superuser_for(&cmd.performed_by, &role_id)?;

        let uow = self.uow_factory.begin().await?;

        let mut user = uow
            .users()
            .find_by_id(&user_id)
            .await?
            .ok_or_else(|| AccessError::UserNotFound(cmd.user_id.clone()))?;
        require_superuser_for(&cmd.performed_by, &user.role_id)?;
        if uow.roles().find_by_id(&role_id).await?.is_none() {
            return Err(AccessError::RoleNotFound(role_id.to_string()));
        }

        user.assign_role(role_id);
        uow.users().update(&user).await.map_err(|e| match e {
            AppError::ForeignKeyViolation(_) => AccessError::RoleNotFound(user.role_id.to_string()),
            other => other.into(),
        })?;

        uow.commit().await?;

        info!(user_id = %user.id, role_id = %user.role_id, "User role reassigned");
        Ok(user)
    }

    /// 删除用户
    pub async fn handle_delete(&self, cmd: DeleteUserCommand) -> AccessResult<()> {
        let user_id = parse_user_id(&cmd.user_id)?;
        if user_id == cmd.performed_by.user_id {
            return Err(AccessError::validation("You cannot delete your own account"));
        }

        let uow = self.uow_factory.begin().await?;

        let Some(user) = uow.users().find_by_id(&user_id).await? else {
            return Err(AccessError::UserNotFound(cmd.user_id));
        };
        require_superuser_for(&cmd.performed_by, &user.role_id)?;
        uow.users().delete(&user_id).await?;

        uow.commit().await?;

        info!(user_id = %user_id, "User deleted");
        Ok(())
    }

    /// 存储中没有任何用户时创建持有 `superuser` 的管理员
    pub async fn ensure_bootstrap_admin(
        &self,
        username: &str,
        password: &str,
    ) -> AccessResult<Option<User>> {
        validate_password(password)?;

        let uow = self.uow_factory.begin().await?;
        if uow.users().count().await? > 0 {
            return Ok(None);
        }

        let user = User::new(
            username.trim().to_string(),
            hash_password(password)?,
            RoleId::superuser(),
        );
        uow.users().create(&user).await?;
        uow.commit().await?;

        info!(username = %user.username, "Bootstrap administrator created");
        Ok(Some(user))
    }
}

/// 用户查询处理器
pub struct UserQueryHandler {
    users: Arc<dyn UserRepository>,
}

impl UserQueryHandler {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// 全部用户，按用户名升序
    pub async fn list_users(&self) -> AccessResult<Vec<User>> {
        Ok(self.users.list_all().await?)
    }
}

fn validate_password(password: &str) -> AccessResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AccessError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// 涉及 `superuser` 角色的用户变更只允许 superuser 执行
fn require_superuser_for(actor: &SessionUser, role_id: &RoleId) -> AccessResult<()> {
    if role_id.is_superuser() && !actor.role_id.is_superuser() {
        warn!(actor = %actor.user_id, role_id = %role_id, "Non-superuser attempted a superuser change");
        return Err(AccessError::SuperuserRequired(role_id.to_string()));
    }
    Ok(())
}

/// 非法 ID 与不存在的用户同样处理
fn parse_user_id(raw: &str) -> AccessResult<UserId> {
    UserId::parse(raw).map_err(|_| AccessError::UserNotFound(raw.to_string()))
}
