//! clinic-config - 配置加载库

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use serde::Deserialize;
use thiserror::Error;

use secrecy::{ExposeSecret, Secret};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Load(Box::new(e))
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// 启动时自动执行迁移
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    match std::env::var("APP_ENV").as_deref() {
        Ok("production") => 30,
        _ => 5,
    }
}

fn default_true() -> bool {
    true
}

/// 存储后端
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// 进程内存储，仅用于开发和测试
    Memory,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
}

/// 会话配置
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// 会话令牌签名密钥
    pub secret: Secret<String>,
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default)]
    pub secure_cookie: bool,
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

fn default_session_ttl() -> u64 {
    8 * 3600
}

fn default_cookie_name() -> String {
    "clinic_session".to_string()
}

fn default_issuer() -> String {
    "clinic-access".to_string()
}

/// 路由访问规则
#[derive(Debug, Clone, Deserialize)]
pub struct RouteConfig {
    /// 登录边界
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// 已登录用户的默认落地页
    #[serde(default = "default_landing_path")]
    pub landing_path: String,
    /// 仅限未登录访问的路径
    #[serde(default = "default_public_only")]
    pub public_only: Vec<String>,
    /// 完全绕过会话检查的路径
    #[serde(default = "default_exempt")]
    pub exempt: Vec<String>,
}

fn default_login_path() -> String {
    "/login".to_string()
}

fn default_landing_path() -> String {
    "/dashboard".to_string()
}

fn default_public_only() -> Vec<String> {
    vec![default_login_path()]
}

fn default_exempt() -> Vec<String> {
    vec!["/health".to_string(), "/metrics".to_string()]
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            landing_path: default_landing_path(),
            public_only: default_public_only(),
            exempt: default_exempt(),
        }
    }
}

impl RouteConfig {
    pub fn is_public_only(&self, path: &str) -> bool {
        self.public_only.iter().any(|p| path_matches(path, p))
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt.iter().any(|p| path_matches(path, p))
    }
}

/// 完全匹配或按路径段前缀匹配：`/login` 匹配 `/login/reset`，不匹配 `/loginx`
pub fn path_matches(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// 角色列表缓存配置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_role_list_ttl")]
    pub role_list_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub max_capacity: u64,
}

fn default_role_list_ttl() -> u64 {
    300
}

fn default_cache_capacity() -> u64 {
    1_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            role_list_ttl_secs: default_role_list_ttl(),
            max_capacity: default_cache_capacity(),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_enabled: true,
        }
    }
}

/// 仓库内置的占位值，生产环境一律拒绝
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-in-production",
    "change-me-now",
    "override-with-CLINIC_SESSION__SECRET",
];

/// 生产环境初始管理员密码的最小长度
const MIN_PRODUCTION_ADMIN_PASSWORD_LEN: usize = 12;

/// 初始管理员账号（仅在没有任何用户时创建）
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdminConfig {
    pub username: String,
    pub password: Secret<String>,
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub database: Option<DatabaseConfig>,
    pub session: SessionConfig,
    #[serde(default)]
    pub routes: RouteConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 顺序: `{dir}/default.toml` → `{dir}/{APP_ENV}.toml` → `CLINIC_*` 环境变量
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        let figment = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("CLINIC_").split("__"));

        Self::from_figment(figment)
    }

    /// 从任意 Figment 提取并校验
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.store.backend == StoreBackend::Postgres && self.database.is_none() {
            return Err(ConfigError::Invalid(
                "store.backend = \"postgres\" requires a [database] section".to_string(),
            ));
        }
        if self.session.ttl_secs == 0 {
            return Err(ConfigError::Invalid("session.ttl_secs must be positive".to_string()));
        }
        if let Some(db) = &self.database {
            if db.max_connections == 0 {
                return Err(ConfigError::Invalid(
                    "database.max_connections must be positive".to_string(),
                ));
            }
        }
        self.validate_routes()?;
        if self.is_production() {
            self.validate_production_secrets()?;
        }
        Ok(())
    }

    /// 登录页与落地页的分类必须互斥，否则会无限重定向
    fn validate_routes(&self) -> Result<(), ConfigError> {
        let routes = &self.routes;
        if !routes.login_path.starts_with('/') || !routes.landing_path.starts_with('/') {
            return Err(ConfigError::Invalid(
                "routes.login_path and routes.landing_path must be absolute paths".to_string(),
            ));
        }
        if !routes.is_public_only(&routes.login_path) {
            return Err(ConfigError::Invalid(format!(
                "routes.login_path '{}' must be listed in routes.public_only",
                routes.login_path
            )));
        }
        if routes.is_public_only(&routes.landing_path) {
            return Err(ConfigError::Invalid(format!(
                "routes.landing_path '{}' must not be public-only",
                routes.landing_path
            )));
        }
        Ok(())
    }

    fn validate_production_secrets(&self) -> Result<(), ConfigError> {
        let secret = self.session.secret.expose_secret();
        if secret.is_empty() || PLACEHOLDER_SECRETS.contains(&secret.as_str()) {
            return Err(ConfigError::Invalid(
                "session.secret must be set (CLINIC_SESSION__SECRET) in production".to_string(),
            ));
        }
        if let Some(admin) = &self.bootstrap_admin {
            let password = admin.password.expose_secret();
            if PLACEHOLDER_SECRETS.contains(&password.as_str())
                || password.chars().count() < MIN_PRODUCTION_ADMIN_PASSWORD_LEN
            {
                return Err(ConfigError::Invalid(format!(
                    "bootstrap_admin.password must be a real secret of at least {} characters in production",
                    MIN_PRODUCTION_ADMIN_PASSWORD_LEN
                )));
            }
        }
        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

#[cfg(test)]
mod tests;
