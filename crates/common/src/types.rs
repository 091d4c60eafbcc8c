//! 通用类型定义

use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 用户 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
#[display("{_0}")]
pub struct UserId(pub Uuid);

impl UserId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

/// 审计信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub created_at: DateTime<Utc>,
    pub created_by: Option<UserId>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<UserId>,
}

impl AuditInfo {
    pub fn new(user_id: Option<UserId>) -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            created_by: user_id,
            updated_at: now,
            updated_by: user_id,
        }
    }

    /// 记录一次修改
    pub fn touch(&mut self, user_id: Option<UserId>) {
        self.updated_at = Utc::now();
        self.updated_by = user_id;
    }
}

impl Default for AuditInfo {
    fn default() -> Self {
        Self::new(None)
    }
}
