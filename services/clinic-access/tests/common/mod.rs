#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use clinic_access::api::http::{AppState, CookieSettings};
use clinic_access::domain::role::{RoleEvent, RoleEventSink, RoleId};
use clinic_access::domain::session::SessionUser;
use clinic_access::infrastructure::persistence::{MemoryStore, StoreHandles};
use clinic_auth_core::SessionTokenService;
use clinic_common::UserId;
use clinic_config::{CacheConfig, RouteConfig};

pub const SECRET: &str = "integration-test-secret";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// 记录收到的角色事件
#[derive(Default)]
pub struct RecordingSink {
    events: Mutex<Vec<RoleEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<RoleEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoleEventSink for RecordingSink {
    async fn role_changed(&self, event: &RoleEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

/// 以 superuser 身份执行的操作者
pub fn superuser_actor() -> SessionUser {
    SessionUser {
        user_id: UserId::new(),
        username: "admin".to_string(),
        role_id: RoleId::superuser(),
    }
}

pub fn tokens() -> Arc<SessionTokenService> {
    Arc::new(SessionTokenService::new(SECRET, 3600, "clinic-access"))
}

pub fn cookie_settings() -> CookieSettings {
    CookieSettings {
        name: "clinic_session".to_string(),
        secure: false,
        max_age_secs: 3600,
    }
}

/// 基于内存存储的完整应用状态，带一个 superuser 管理员
pub async fn app_state(store: MemoryStore) -> AppState {
    let state = AppState::new(
        StoreHandles::memory(store),
        tokens(),
        &RouteConfig::default(),
        cookie_settings(),
        &CacheConfig::default(),
    );
    state
        .user_commands
        .ensure_bootstrap_admin("admin", ADMIN_PASSWORD)
        .await
        .unwrap();
    state
}
