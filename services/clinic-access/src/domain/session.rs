//! 会话

use clinic_common::UserId;
use serde::Serialize;

use crate::domain::role::RoleId;

/// 已认证的会话用户
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionUser {
    pub user_id: UserId,
    pub username: String,
    pub role_id: RoleId,
}

/// 单次请求解析出的会话状态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(SessionUser),
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    pub fn user(&self) -> Option<&SessionUser> {
        match self {
            Session::Authenticated(user) => Some(user),
            Session::Anonymous => None,
        }
    }
}
