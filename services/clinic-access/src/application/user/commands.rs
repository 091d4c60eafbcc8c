//! 用户命令

use crate::domain::session::SessionUser;

/// 创建用户命令
#[derive(Debug, Clone)]
pub struct CreateUserCommand {
    pub username: String,
    pub password: String,
    pub role_id: String,
    pub performed_by: SessionUser,
}

/// 重新分配角色命令
#[derive(Debug, Clone)]
pub struct AssignRoleCommand {
    pub user_id: String,
    pub role_id: String,
    pub performed_by: SessionUser,
}

/// 删除用户命令
#[derive(Debug, Clone)]
pub struct DeleteUserCommand {
    pub user_id: String,
    /// 执行者不能删除自己
    pub performed_by: SessionUser,
}
