use async_trait::async_trait;
use clinic_common::UserId;
use serde::{Deserialize, Serialize};

use super::role::RoleId;

/// 已提交的角色变更
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoleEvent {
    RoleCreated {
        id: RoleId,
        name: String,
        by: Option<UserId>,
    },
    RoleUpdated {
        id: RoleId,
        by: Option<UserId>,
    },
    RoleDeleted {
        id: RoleId,
        by: Option<UserId>,
    },
}

impl RoleEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            RoleEvent::RoleCreated { .. } => "RoleCreated",
            RoleEvent::RoleUpdated { .. } => "RoleUpdated",
            RoleEvent::RoleDeleted { .. } => "RoleDeleted",
        }
    }

    pub fn role_id(&self) -> &RoleId {
        match self {
            RoleEvent::RoleCreated { id, .. }
            | RoleEvent::RoleUpdated { id, .. }
            | RoleEvent::RoleDeleted { id, .. } => id,
        }
    }
}

/// 角色变更通知
///
/// 在事务提交之后调用；实现方自行处理失败，不影响已提交的变更
#[async_trait]
pub trait RoleEventSink: Send + Sync {
    async fn role_changed(&self, event: &RoleEvent);
}
