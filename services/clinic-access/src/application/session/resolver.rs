//! 会话解析

use std::sync::Arc;

use clinic_auth_core::SessionTokenService;
use metrics::counter;
use tracing::debug;

use crate::domain::session::{Session, SessionUser};
use crate::domain::user::UserRepository;
use crate::error::AccessResult;

/// 从客户端令牌解析会话
///
/// 令牌缺失、格式错误、签名错误或过期都解析为 `Anonymous`；
/// 合法令牌每次都重新读取用户，角色以存储为准。不续期令牌。
pub struct SessionResolver {
    tokens: Arc<SessionTokenService>,
    users: Arc<dyn UserRepository>,
}

impl SessionResolver {
    pub fn new(tokens: Arc<SessionTokenService>, users: Arc<dyn UserRepository>) -> Self {
        Self { tokens, users }
    }

    /// 只有存储故障才返回错误
    pub async fn resolve(&self, token: Option<&str>) -> AccessResult<Session> {
        let result = self.resolve_inner(token).await;

        let outcome = match &result {
            Ok(Session::Authenticated(_)) => "authenticated",
            Ok(Session::Anonymous) => "anonymous",
            Err(_) => "error",
        };
        counter!("session_resolutions_total", "outcome" => outcome).increment(1);

        result
    }

    async fn resolve_inner(&self, token: Option<&str>) -> AccessResult<Session> {
        let Some(token) = token.filter(|t| !t.is_empty()) else {
            return Ok(Session::Anonymous);
        };

        let claims = match self.tokens.verify(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "Session token rejected");
                return Ok(Session::Anonymous);
            }
        };

        let Ok(user_id) = claims.user_id() else {
            return Ok(Session::Anonymous);
        };

        match self.users.find_by_id(&user_id).await? {
            Some(user) => Ok(Session::Authenticated(SessionUser {
                user_id: user.id,
                username: user.username,
                role_id: user.role_id,
            })),
            None => {
                debug!(user_id = %user_id, "Session user no longer exists");
                Ok(Session::Anonymous)
            }
        }
    }
}
