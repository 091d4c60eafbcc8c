//! 共享应用状态

use std::sync::Arc;
use std::time::Duration;

use clinic_auth_core::SessionTokenService;
use clinic_config::{CacheConfig, RouteConfig, SessionConfig};
use metrics_exporter_prometheus::PrometheusHandle;

use super::route_gate::RouteRules;
use crate::application::auth::LoginService;
use crate::application::authorization::AuthorizationGuard;
use crate::application::role::{RoleCommandHandler, RoleQueryHandler};
use crate::application::session::SessionResolver;
use crate::application::user::{UserCommandHandler, UserQueryHandler};
use crate::infrastructure::cache::{MokaCache, MokaCacheConfig, RoleListCache};
use crate::infrastructure::persistence::{StoreHandles, StoreHealth};

/// 会话 Cookie 属性
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
    pub max_age_secs: u64,
}

impl From<&SessionConfig> for CookieSettings {
    fn from(config: &SessionConfig) -> Self {
        Self {
            name: config.cookie_name.clone(),
            secure: config.secure_cookie,
            max_age_secs: config.ttl_secs,
        }
    }
}

impl CookieSettings {
    /// 登录成功后下发的 Cookie
    pub fn session_cookie(&self, token: &str) -> String {
        self.build(token, self.max_age_secs)
    }

    /// 立即过期的 Cookie（登出）
    pub fn expired_cookie(&self) -> String {
        self.build("", 0)
    }

    fn build(&self, value: &str, max_age: u64) -> String {
        let mut cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.name, value, max_age
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteRules>,
    pub cookie: Arc<CookieSettings>,
    pub resolver: Arc<SessionResolver>,
    pub guard: Arc<AuthorizationGuard>,
    pub login: Arc<LoginService>,
    pub role_commands: Arc<RoleCommandHandler>,
    pub role_queries: Arc<RoleQueryHandler>,
    pub user_commands: Arc<UserCommandHandler>,
    pub user_queries: Arc<UserQueryHandler>,
    pub store_health: Arc<dyn StoreHealth>,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// 按存储后端组装全部服务
    pub fn new(
        store: StoreHandles,
        tokens: Arc<SessionTokenService>,
        routes: &RouteConfig,
        cookie: CookieSettings,
        cache: &CacheConfig,
    ) -> Self {
        let ttl = Duration::from_secs(cache.role_list_ttl_secs);
        let role_list_cache = Arc::new(RoleListCache::new(
            Arc::new(MokaCache::new(MokaCacheConfig {
                max_capacity: cache.max_capacity,
                default_ttl: ttl,
            })),
            ttl,
        ));

        Self {
            routes: Arc::new(RouteRules::from(routes)),
            cookie: Arc::new(cookie),
            resolver: Arc::new(SessionResolver::new(tokens.clone(), store.users.clone())),
            guard: Arc::new(AuthorizationGuard::new(store.role_permissions.clone())),
            login: Arc::new(LoginService::new(store.users.clone(), tokens)),
            role_commands: Arc::new(RoleCommandHandler::new(
                store.uow_factory.clone(),
                role_list_cache.clone(),
            )),
            role_queries: Arc::new(RoleQueryHandler::new(store.roles.clone(), role_list_cache)),
            user_commands: Arc::new(UserCommandHandler::new(store.uow_factory.clone())),
            user_queries: Arc::new(UserQueryHandler::new(store.users.clone())),
            store_health: store.store_health,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_attributes() {
        let settings = CookieSettings {
            name: "clinic_session".to_string(),
            secure: true,
            max_age_secs: 3600,
        };

        let cookie = settings.session_cookie("abc");
        assert!(cookie.starts_with("clinic_session=abc;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.ends_with("; Secure"));

        let expired = settings.expired_cookie();
        assert!(expired.starts_with("clinic_session=;"));
        assert!(expired.contains("Max-Age=0"));
    }
}
