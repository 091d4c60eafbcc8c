//! 角色命令

use clinic_common::UserId;

/// 创建角色命令
#[derive(Debug, Clone)]
pub struct CreateRoleCommand {
    pub name: String,
    pub description: String,
    /// 权限标识，须全部属于权限目录
    pub permissions: Vec<String>,
    pub performed_by: Option<UserId>,
}

/// 更新角色命令（整体替换权限集合）
#[derive(Debug, Clone)]
pub struct UpdateRoleCommand {
    pub role_id: String,
    pub name: String,
    pub description: String,
    pub permissions: Vec<String>,
    pub performed_by: Option<UserId>,
}

/// 删除角色命令
#[derive(Debug, Clone)]
pub struct DeleteRoleCommand {
    pub role_id: String,
    pub performed_by: Option<UserId>,
}
